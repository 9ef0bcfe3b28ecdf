//! Zecwallet Sync
//!
//! Keeps a Zcash-style light wallet's observable state current against an
//! external wallet engine that exposes a command/response interface. The
//! crate is organized into three layers:
//!
//! - `engine`: The gateway to the wallet engine. Raw response types, the
//!   typed command client, an HTTP transport, and a scripted mock for tests.
//! - `wallet`: Normalized wallet entities, the `StateSink` observer trait,
//!   and the sync services (scheduler, reconciler, aggregator, send).
//! - `utils`: Zatoshi fixed-point conversion and formatting helpers.
//!
//! The entry point is [`wallet::sync::SyncScheduler`]: construct it over an
//! [`engine::EngineClient`] and a [`wallet::StateSink`], then either drive
//! refreshes directly or call `start()` to run the polling timers.

pub mod engine;
pub mod utils;
pub mod wallet;
