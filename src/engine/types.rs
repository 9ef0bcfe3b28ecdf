//! Types for the wallet engine command/response boundary.
//!
//! Everything the engine returns is untrusted text. These structs are the
//! validated shapes the rest of the crate works with; any response that does
//! not parse into them is surfaced as [`EngineError::MalformedResponse`]
//! rather than an ambiguous failure deep in reconciliation logic.

use serde::{Deserialize, Serialize};

/// Chain metadata from the `info` command.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInfo {
    /// Chain identifier, `"main"` or `"test"`.
    pub chain_name: String,
    /// Latest block height known to the server.
    pub latest_block_height: u64,
    /// Server vendor string.
    #[serde(default)]
    pub vendor: String,
    /// Git commit the engine was built from.
    #[serde(default)]
    pub git_commit: String,
    /// Engine version string.
    #[serde(default)]
    pub version: String,
}

/// Wallet-synced height from the `height` command.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHeight {
    pub height: u64,
}

/// Per-pool balances from the `balance` command, all in zatoshis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBalance {
    #[serde(default)]
    pub orchard_balance: u64,
    #[serde(default)]
    pub sapling_balance: u64,
    #[serde(default)]
    pub verified_sapling_balance: u64,
    #[serde(default)]
    pub spendable_sapling_balance: u64,
    #[serde(default)]
    pub unverified_sapling_balance: u64,
    #[serde(default)]
    pub transparent_balance: u64,
}

/// Receiver descriptor attached to each address record.
///
/// A unified address bundles up to three receivers; which ones exist decides
/// the pools the address is classified into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReceivers {
    /// Whether the address carries an orchard receiver.
    #[serde(default)]
    pub orchard_exists: bool,
    /// The sapling receiver string, if present.
    #[serde(default)]
    pub sapling: Option<String>,
    /// The transparent receiver string, if present.
    #[serde(default)]
    pub transparent: Option<String>,
}

/// One entry of the `addresses` inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAddress {
    /// The unified address string the engine keys everything by.
    pub address: String,
    /// Which receivers the address exposes.
    pub receivers: RawReceivers,
}

/// A single note or UTXO as reported by the `notes` command.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNote {
    /// Owning address as the engine reports it (the unified address for
    /// sapling notes and transparent UTXOs).
    pub address: String,
    /// Value in zatoshis.
    pub value: u64,
    /// Whether the note is currently spendable.
    #[serde(default)]
    pub spendable: bool,
    /// Transaction id that created this note, when known.
    #[serde(default)]
    pub created_in_txid: Option<String>,
}

/// The full `notes` response: unspent and pending collections per pool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNotes {
    #[serde(default)]
    pub unspent_orchard_notes: Vec<RawNote>,
    #[serde(default)]
    pub pending_orchard_notes: Vec<RawNote>,
    #[serde(default)]
    pub unspent_sapling_notes: Vec<RawNote>,
    #[serde(default)]
    pub pending_sapling_notes: Vec<RawNote>,
    #[serde(default)]
    pub utxos: Vec<RawNote>,
    #[serde(default)]
    pub pending_utxos: Vec<RawNote>,
}

/// Outgoing recipient metadata attached to sent transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOutgoingMetadata {
    pub address: String,
    /// Value in zatoshis.
    pub value: u64,
    #[serde(default)]
    pub memo: Option<String>,
}

/// One flat entry of the `list` transaction response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub block_height: u64,
    /// Unix timestamp of the transaction.
    #[serde(default)]
    pub datetime: u64,
    /// Net amount in zatoshis; negative for outgoing transactions.
    #[serde(default)]
    pub amount: i64,
    /// ZEC price at transaction time, when the engine recorded one.
    #[serde(default)]
    pub zec_price: Option<f64>,
    #[serde(default)]
    pub unconfirmed: bool,
    /// Counterparty address; absent on some outgoing records.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    /// Ordering position within the block, when reported.
    #[serde(default)]
    pub position: Option<u64>,
    /// Present exactly when the transaction was sent by this wallet.
    #[serde(default)]
    pub outgoing_metadata: Option<Vec<RawOutgoingMetadata>>,
}

/// Current send status from the `sendprogress` command.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSendProgress {
    /// Monotonic send identifier; changes when the engine picks up a send.
    pub id: u64,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the `defaultfee` command, in zatoshis.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDefaultFee {
    pub defaultfee: u64,
}

/// Response of the `seed` command.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSeed {
    pub seed: String,
}

/// One entry of the `export` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExportedKey {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub viewing_key: Option<String>,
}

/// Plain status result returned by encrypt/decrypt/lock/unlock.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusResult {
    pub result: String,
}

/// One recipient of a send, serialized verbatim as the `send` argument.
#[derive(Debug, Clone, Serialize)]
pub struct SendRecipient {
    pub address: String,
    /// Amount in zatoshis.
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Error types for engine gateway calls
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine call failed: {0}")]
    CallFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed `{command}` response: {detail}")]
    MalformedResponse { command: String, detail: String },
}
