use crate::engine::{EngineError, RawBalance, RawInfo};
use crate::utils::zats_to_zec;

use serde::{Deserialize, Serialize};

/// Which value pool an address or note belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
	Unified,
	Sapling,
	Transparent,
}

/// Snapshot of chain and wallet metadata, rebuilt on every info fetch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletInfo {
	pub chain_name: String,
	pub testnet: bool,
	pub latest_block: u64,
	pub wallet_height: u64,
	pub version: String,
	pub encrypted: bool,
	pub locked: bool,
	pub price: Option<f64>,
	pub currency: String,
}

impl WalletInfo {
	pub fn from_raw(raw: &RawInfo, wallet_height: u64, price: Option<f64>) -> Self {
		let testnet = raw.chain_name == "test";
		let abbreviated_commit: String = raw.git_commit.chars().take(6).collect();
		Self {
			chain_name: raw.chain_name.clone(),
			testnet,
			latest_block: raw.latest_block_height,
			wallet_height,
			version: format!("{}/{}/{}", raw.vendor, abbreviated_commit, raw.version),
			// The engine exposes no encryption status query.
			encrypted: false,
			locked: false,
			price,
			currency: if testnet { "TAZ" } else { "ZEC" }.to_string(),
		}
	}
}

/// Per-pool wallet balances in whole coins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
	pub unified: f64,
	pub sapling: f64,
	pub transparent: f64,
	pub verified_sapling: f64,
	pub unverified_sapling: f64,
	pub spendable_sapling: f64,
	pub total: f64,
}

impl Balance {
	pub fn from_raw(raw: &RawBalance) -> Self {
		let unified = zats_to_zec(raw.orchard_balance as i64);
		let sapling = zats_to_zec(raw.sapling_balance as i64);
		let transparent = zats_to_zec(raw.transparent_balance as i64);
		Self {
			unified,
			sapling,
			transparent,
			verified_sapling: zats_to_zec(raw.verified_sapling_balance as i64),
			unverified_sapling: zats_to_zec(raw.unverified_sapling_balance as i64),
			spendable_sapling: zats_to_zec(raw.spendable_sapling_balance as i64),
			total: unified + sapling + transparent,
		}
	}
}

/// One address in one pool, with its attributed balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
	pub address: String,
	pub pool: PoolType,
	/// Serialized receiver descriptor, carried for unified records
	pub receivers: Option<String>,
	pub balance: f64,
	pub contains_pending: bool,
}

/// Pool-tagged note or UTXO after re-attribution to its receiver address
#[derive(Debug, Clone, PartialEq)]
pub struct NoteOrUtxo {
	pub address: String,
	pub pool: PoolType,
	pub value: u64,
	pub spendable: bool,
	pub pending: bool,
	pub created_in_txid: Option<String>,
}

/// Direction of a transaction from the wallet's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
	Sent,
	Received,
}

/// One recipient or source line within a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxDetail {
	pub address: String,
	/// Fixed-point coin amount with 8 decimals
	pub amount: String,
	pub memo: Option<String>,
}

/// A grouped, normalized wallet transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
	pub txid: String,
	pub kind: TransactionKind,
	pub address: String,
	pub amount: f64,
	pub confirmations: u64,
	pub time: u64,
	pub price: Option<f64>,
	pub position: Option<u64>,
	pub details: Vec<TxDetail>,
}

/// Progress of an in-flight send, rebuilt on every poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendProgress {
	pub id: u64,
	pub progress: u64,
	pub total: u64,
	pub eta_seconds: u64,
	pub sending: bool,
	pub txid: Option<String>,
	pub error: Option<String>,
}

/// Wallet-level options stored by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSettings {
	pub download_memos: String,
	pub spam_filter_threshold: i64,
}

/// Error types for the sync core
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("Engine error: {0}")]
	Engine(#[from] EngineError),

	#[error("Reconciliation error: {0}")]
	Reconciliation(String),

	#[error("Send failed: {0}")]
	SendFailed(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn balance_total_covers_all_pools() {
		let raw = RawBalance {
			orchard_balance: 100_000_000,
			sapling_balance: 50_000_000,
			verified_sapling_balance: 50_000_000,
			spendable_sapling_balance: 50_000_000,
			unverified_sapling_balance: 0,
			transparent_balance: 25_000_000,
		};
		let balance = Balance::from_raw(&raw);
		assert_eq!(balance.unified, 1.0);
		assert_eq!(balance.sapling, 0.5);
		assert_eq!(balance.transparent, 0.25);
		assert_eq!(balance.total, balance.unified + balance.sapling + balance.transparent);
	}

	#[test]
	fn info_derives_network_fields() {
		let raw = RawInfo {
			chain_name: "test".to_string(),
			latest_block_height: 1_900_000,
			vendor: "zingo".to_string(),
			git_commit: "0123456789abcdef".to_string(),
			version: "1.9.0".to_string(),
		};
		let info = WalletInfo::from_raw(&raw, 1_899_990, Some(30.0));
		assert!(info.testnet);
		assert_eq!(info.currency, "TAZ");
		assert_eq!(info.version, "zingo/012345/1.9.0");
		assert_eq!(info.wallet_height, 1_899_990);
		assert_eq!(info.price, Some(30.0));
	}

	#[test]
	fn info_mainnet_currency() {
		let raw = RawInfo {
			chain_name: "main".to_string(),
			latest_block_height: 2_000_000,
			vendor: "zingo".to_string(),
			git_commit: "ab".to_string(),
			version: "1.9.0".to_string(),
		};
		let info = WalletInfo::from_raw(&raw, 2_000_000, None);
		assert!(!info.testnet);
		assert_eq!(info.currency, "ZEC");
		assert_eq!(info.version, "zingo/ab/1.9.0");
	}
}
