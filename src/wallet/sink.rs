//! State sink for reconciled wallet data.
//!
//! This module defines the write-only observer that the sync services push
//! normalized snapshots into. The sink decouples the sync core from whatever
//! consumes the data (a UI bridge, a cache, a logger); every push replaces
//! the corresponding snapshot wholesale, so implementors never need to merge.

use crate::wallet::types::{AddressRecord, Balance, Transaction, WalletInfo, WalletSettings};
use tracing::info;

/// Receiver of normalized wallet state.
///
/// Implementors are called from timer tasks at arbitrary points, so methods
/// must be cheap and non-blocking. There is no read-back contract; the sync
/// core never asks the sink for data.
pub trait StateSink: Send + Sync {
    /// Replace the chain/wallet metadata snapshot.
    fn set_info(&self, info: WalletInfo);

    /// Replace the per-pool balance snapshot.
    fn set_total_balance(&self, balance: Balance);

    /// Replace the list of addresses holding funds.
    fn set_addresses_with_balance(&self, addresses: Vec<AddressRecord>);

    /// Replace the full address inventory.
    fn set_all_addresses(&self, addresses: Vec<AddressRecord>);

    /// Replace the transaction list.
    fn set_transactions(&self, transactions: Vec<Transaction>);

    /// Update the coin price. `None` means no quote is available.
    fn set_price(&self, price: Option<f64>);

    /// Replace the wallet settings snapshot.
    fn set_wallet_settings(&self, settings: WalletSettings);
}

/// Sink that logs every snapshot it receives.
///
/// Used by the demo binary; also handy as a placeholder while wiring a real
/// consumer.
pub struct LoggingSink;

impl StateSink for LoggingSink {
    fn set_info(&self, info: WalletInfo) {
        info!(
            "Info: chain={} latest_block={} wallet_height={} version={}",
            info.chain_name, info.latest_block, info.wallet_height, info.version
        );
    }

    fn set_total_balance(&self, balance: Balance) {
        info!(
            "Balance: total={} unified={} sapling={} transparent={}",
            balance.total, balance.unified, balance.sapling, balance.transparent
        );
    }

    fn set_addresses_with_balance(&self, addresses: Vec<AddressRecord>) {
        info!("Addresses with balance: {}", addresses.len());
    }

    fn set_all_addresses(&self, addresses: Vec<AddressRecord>) {
        info!("All addresses: {}", addresses.len());
    }

    fn set_transactions(&self, transactions: Vec<Transaction>) {
        info!("Transactions: {}", transactions.len());
    }

    fn set_price(&self, price: Option<f64>) {
        match price {
            Some(price) => info!("Price: {}", price),
            None => info!("Price: unavailable"),
        }
    }

    fn set_wallet_settings(&self, settings: WalletSettings) {
        info!(
            "Settings: download_memos={} spam_filter_threshold={}",
            settings.download_memos, settings.spam_filter_threshold
        );
    }
}
