//!
//! Utility module for the wallet sync core.
//!
//! Re-exports amount conversion and formatting helpers for use throughout the codebase.
/// Zatoshi conversion and fixed-point formatting helpers
pub mod amounts;

pub use amounts::{ZATS_PER_ZEC, format_zats, parse_zats, zats_to_zec};
