//! Wallet engine gateway module
//!
//! This module provides the client, transports, and raw types for talking to
//! the wallet engine's command/response interface. The engine owns keys,
//! chain scanning, and transaction construction; everything above it consumes
//! the typed client defined here.

/// Typed command facade and the engine transport trait
mod client;
/// HTTP transport for a wallet engine daemon
mod http;
/// Scripted engine for deterministic tests
mod mock;
/// Raw response schema for engine commands
mod types;

pub use client::{EngineClient, WalletEngine};
pub use http::HttpEngine;
pub use mock::MockEngine;
pub use types::*;
