pub mod sink;
pub mod sync;
pub mod types;

pub use sink::{LoggingSink, StateSink};
pub use sync::SyncScheduler;
pub use types::*;
