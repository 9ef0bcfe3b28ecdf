//! Wallet Synchronization Module
//!
//! This module contains the logic that keeps wallet state current against the
//! engine. It is composed of several submodules, each responsible for a
//! specific aspect of the sync process:
//!
//! - `scheduler`: The main entry point. It owns the timer loops, the pass
//!   guard, and the full-refresh state machine, and pushes refreshed state
//!   into the sink.
//! - `reconciler`: Attributes raw notes and utxos to their owning addresses
//!   and derives per-address and total balances.
//! - `aggregator`: Normalizes raw transaction records, merges split records
//!   for the same txid, and reassembles multi-part memos.
//! - `send`: Dispatches sends and polls their progress to completion.
//!
//! The scheduler coordinates the others: each refresh pass fetches the raw
//! engine snapshots once, runs them through the reconciler and aggregator,
//! and pushes the derived state out through the `StateSink`.

/// Transaction normalization, merging, and memo reassembly
pub mod aggregator;
/// Note attribution and balance derivation
pub mod reconciler;
/// Timer loops and the refresh state machine
pub mod scheduler;
/// Send dispatch and progress tracking
pub mod send;

pub use scheduler::*;
