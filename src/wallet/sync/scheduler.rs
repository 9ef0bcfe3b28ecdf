//! Polling scheduler that keeps the wallet state fresh.
//!
//! This module defines the `SyncScheduler`, the driver of the whole sync
//! pipeline. It owns the two timer cycles and the wallet-level operations
//! that sit on top of them:
//! - A fast cycle watching a cheap change-detection fingerprint (the id of
//!   the newest transaction) and rebuilding every snapshot when it moves
//! - A coarse cycle that triggers an engine sync towards the chain tip,
//!   waits for the wallet to catch up, and persists the result
//! - One-shot operations (rescan, send, settings, encryption) that reuse the
//!   same reconciliation passes
//!
//! A single pass guard serializes the cycles: timer ticks that find the
//! guard taken are dropped, forced refreshes wait for it.

use crate::engine::{EngineClient, EngineError, SendRecipient};
use crate::wallet::sink::StateSink;
use crate::wallet::sync::aggregator::aggregate_transactions;
use crate::wallet::sync::reconciler::reconcile;
use crate::wallet::sync::send::{ProgressCallback, SendConfig, SendCoordinator};
use crate::wallet::types::{SyncError, WalletInfo, WalletSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Timing configuration for the scheduler cycles
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
	/// Interval of the cheap change-detection poll
	pub fast_interval: Duration,
	/// Interval of the full sync-and-refresh cycle
	pub refresh_interval: Duration,
	/// Delay between wallet height polls while an engine sync runs
	pub sync_poll_interval: Duration,
	/// Height polls before a sync wait gives up
	pub sync_poll_attempts: u32,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			fast_interval: Duration::from_secs(3),
			refresh_interval: Duration::from_secs(180),
			sync_poll_interval: Duration::from_secs(1),
			sync_poll_attempts: 30,
		}
	}
}

/// Scheduler-owned state carried between passes. The mutex around it doubles
/// as the pass guard.
#[derive(Debug, Default)]
struct PassState {
	last_block_height: u64,
	last_txid: Option<String>,
}

/// Result of one fast change-detection poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastPollOutcome {
	/// Another pass holds the guard; the tick was dropped
	Skipped,
	/// Fingerprint unchanged; only the info snapshot was refreshed
	Unchanged,
	/// New transactions detected; every snapshot was rebuilt
	Refreshed { height: u64 },
}

/// Result of one coarse refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// Another pass holds the guard; the tick was dropped
	Skipped,
	/// The wallet already knows the chain tip; nothing to sync
	AlreadyCurrent,
	/// A sync ran and the snapshots were rebuilt
	Completed { height: u64, wait: WaitOutcome },
}

/// How the bounded post-sync wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
	/// The wallet height reached the target
	Reached { attempts: u32 },
	/// The attempt cap expired first; data is best-effort
	Exhausted { attempts: u32, wallet_height: u64 },
}

/// Coordinates the sync cycles and wallet operations for one session.
///
/// All engine reads funnel through one reconciliation pass at a time, so the
/// snapshots pushed into the sink are always mutually consistent.
pub struct SyncScheduler {
	client: EngineClient,
	sink: Arc<dyn StateSink>,
	config: SchedulerConfig,
	pass_state: Mutex<PassState>,
}

impl SyncScheduler {
	pub fn new(client: EngineClient, sink: Arc<dyn StateSink>, config: SchedulerConfig) -> Self {
		Self {
			client,
			sink,
			config,
			pass_state: Mutex::new(PassState::default()),
		}
	}

	/// Fast cycle: poll the transaction fingerprint and rebuild the snapshots
	/// when it moved. Ticks arriving while another pass runs are dropped.
	pub async fn update_data(&self) -> Result<FastPollOutcome, SyncError> {
		let Ok(mut state) = self.pass_state.try_lock() else {
			debug!("Skipping data poll, another pass holds the guard");
			return Ok(FastPollOutcome::Skipped);
		};

		let info = self.fetch_info().await?;
		let latest_txid = self.client.last_txid().await?;

		if state.last_txid == latest_txid {
			return Ok(FastPollOutcome::Unchanged);
		}

		info!(
			"New transactions detected: latest {:?}, previous {:?}",
			latest_txid, state.last_txid
		);

		state.last_block_height = info.latest_block;
		state.last_txid = latest_txid;

		self.refresh_snapshots(info.latest_block).await?;
		self.fetch_price().await?;
		self.fetch_wallet_settings().await?;

		Ok(FastPollOutcome::Refreshed {
			height: info.latest_block,
		})
	}

	/// Coarse cycle: sync the engine towards the chain tip and rebuild the
	/// snapshots. Timer runs skip when the guard is taken or the wallet is
	/// already at the tip; forced runs wait for the guard and always sync.
	pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, SyncError> {
		let mut state = if force {
			self.pass_state.lock().await
		} else {
			match self.pass_state.try_lock() {
				Ok(state) => state,
				Err(_) => {
					debug!("Skipping refresh, another pass holds the guard");
					return Ok(RefreshOutcome::Skipped);
				}
			}
		};

		let info = self.fetch_info().await?;
		let latest_height = info.latest_block;

		if !force && state.last_block_height != 0 && state.last_block_height >= latest_height {
			debug!("Already have block {}, waiting for the next refresh", latest_height);
			return Ok(RefreshOutcome::AlreadyCurrent);
		}

		// The sync command returns immediately; the engine scans in the
		// background while we poll its height.
		let status = self.client.start_sync().await?;
		info!("Sync started: {}", status);

		let wait = self.await_sync_completion(latest_height).await?;
		if let WaitOutcome::Exhausted {
			attempts,
			wallet_height,
		} = &wait
		{
			warn!(
				"Sync did not reach block {} after {} polls, wallet is at {}",
				latest_height, attempts, wallet_height
			);
		}

		self.refresh_snapshots(latest_height).await?;
		self.fetch_price().await?;

		state.last_block_height = latest_height;

		let status = self.client.save().await?;
		debug!("Save status: {}", status);

		info!("Finished full refresh at {}", latest_height);
		Ok(RefreshOutcome::Completed {
			height: latest_height,
			wait,
		})
	}

	/// Poll the wallet height until it reaches `target_height` or the
	/// attempt cap expires. Expiry is an outcome, not an error: the caller
	/// proceeds with whatever the wallet has.
	async fn await_sync_completion(&self, target_height: u64) -> Result<WaitOutcome, SyncError> {
		let mut attempts = 0;
		loop {
			tokio::time::sleep(self.config.sync_poll_interval).await;
			// The status report is informational; the height decides completion.
			match self.client.sync_status().await {
				Ok(status) => debug!("Sync status: {}", status),
				Err(e) => debug!("Sync status unavailable: {}", e),
			}
			let wallet_height = self.client.wallet_height().await?;
			attempts += 1;

			if wallet_height >= target_height {
				return Ok(WaitOutcome::Reached { attempts });
			}
			if attempts >= self.config.sync_poll_attempts {
				return Ok(WaitOutcome::Exhausted {
					attempts,
					wallet_height,
				});
			}
		}
	}

	/// Fetch and push the info snapshot. A malformed response degrades to a
	/// default snapshot so a flaky engine never blanks the whole pass; call
	/// failures propagate.
	pub async fn fetch_info(&self) -> Result<WalletInfo, SyncError> {
		let info = match self.build_info().await {
			Ok(info) => info,
			Err(err @ EngineError::MalformedResponse { .. }) => {
				warn!("Failed to parse info: {}", err);
				WalletInfo::default()
			}
			Err(other) => return Err(other.into()),
		};
		self.sink.set_info(info.clone());
		Ok(info)
	}

	async fn build_info(&self) -> Result<WalletInfo, EngineError> {
		let raw = self.client.info().await?;
		let price = self.client.update_current_price().await?;
		let wallet_height = self.client.wallet_height().await?;
		Ok(WalletInfo::from_raw(&raw, wallet_height, price))
	}

	/// Rebuild and push the balance, address, and transaction snapshots from
	/// one consistent set of engine reads.
	async fn refresh_snapshots(&self, latest_height: u64) -> Result<(), SyncError> {
		let balance = self.client.balance().await?;
		let addresses = self.client.addresses().await?;
		let notes = self.client.notes().await?;

		let reconciled = reconcile(&balance, &addresses, &notes)?;
		self.sink.set_total_balance(reconciled.balance);
		self.sink.set_addresses_with_balance(reconciled.with_balance);
		self.sink.set_all_addresses(reconciled.all_addresses);

		let list = self.client.transactions().await?;
		let transactions = aggregate_transactions(&list, &addresses, &notes, latest_height)?;
		self.sink.set_transactions(transactions);

		Ok(())
	}

	/// Push a fresh price quote. No quote means no push; the sink keeps
	/// whatever it had.
	pub async fn fetch_price(&self) -> Result<(), SyncError> {
		match self.client.update_current_price().await? {
			Some(price) => self.sink.set_price(Some(price)),
			None => debug!("No price available, keeping the previous quote"),
		}
		Ok(())
	}

	/// Fetch and push the wallet settings. A threshold stored as "-1" was
	/// never configured; it is rewritten to "50" and takes effect on the
	/// next fetch.
	pub async fn fetch_wallet_settings(&self) -> Result<WalletSettings, SyncError> {
		let download_memos = self.client.get_option("download_memos").await?;

		let mut spam_filter_threshold = "0".to_string();
		match self.client.get_option("transaction_filter_threshold").await {
			Ok(value) => {
				spam_filter_threshold = value;
				if spam_filter_threshold == "-1" {
					if let Err(e) = self
						.set_wallet_setting("transaction_filter_threshold", "50")
						.await
					{
						warn!("Failed to store the transaction filter threshold: {}", e);
					}
				}
			}
			Err(e) => warn!("Error getting spam filter threshold: {}", e),
		}

		let settings = WalletSettings {
			download_memos,
			spam_filter_threshold: spam_filter_threshold.parse().unwrap_or(0),
		};
		self.sink.set_wallet_settings(settings.clone());
		Ok(settings)
	}

	/// Write a wallet option and persist it.
	pub async fn set_wallet_setting(&self, name: &str, value: &str) -> Result<String, SyncError> {
		let result = self.client.set_option(name, value).await?;
		let status = self.client.save().await?;
		debug!("Save status: {}", status);
		Ok(result)
	}

	/// Encrypt the wallet, refresh the info snapshot, and persist.
	pub async fn encrypt_wallet(&self, password: &str) -> Result<bool, SyncError> {
		let success = self.client.encrypt(password).await?;
		self.fetch_info().await?;
		let status = self.client.save().await?;
		debug!("Save status: {}", status);
		Ok(success)
	}

	/// Decrypt the wallet, refresh the info snapshot, and persist.
	pub async fn decrypt_wallet(&self, password: &str) -> Result<bool, SyncError> {
		let success = self.client.decrypt(password).await?;
		self.fetch_info().await?;
		let status = self.client.save().await?;
		debug!("Save status: {}", status);
		Ok(success)
	}

	/// Lock the wallet and refresh the info snapshot.
	pub async fn lock_wallet(&self) -> Result<bool, SyncError> {
		let success = self.client.lock().await?;
		self.fetch_info().await?;
		Ok(success)
	}

	/// Unlock the wallet and refresh the info snapshot.
	pub async fn unlock_wallet(&self, password: &str) -> Result<bool, SyncError> {
		let success = self.client.unlock(password).await?;
		self.fetch_info().await?;
		Ok(success)
	}

	/// Trigger a full rescan and force a refresh behind it.
	pub async fn rescan(&self) -> Result<RefreshOutcome, SyncError> {
		let status = self.client.start_rescan().await?;
		info!("Rescan started: {}", status);
		self.refresh(true).await
	}

	/// Dispatch a send, track it to completion, then force a full refresh so
	/// the new transaction shows up immediately.
	pub async fn send_transaction(
		&self,
		recipients: &[SendRecipient],
		on_progress: &ProgressCallback,
	) -> Result<String, SyncError> {
		let coordinator = SendCoordinator::new(self.client.clone(), SendConfig::default());
		let txid = coordinator.send_and_track(recipients, on_progress).await?;
		self.refresh(true).await?;
		Ok(txid)
	}

	/// Start the two timer cycles. The coarse cycle fires immediately and
	/// forced, matching the refresh a session triggers right after setup;
	/// the fast cycle starts one interval later.
	pub fn start(self: Arc<Self>) -> SchedulerHandle {
		let (shutdown_tx, shutdown_rx) = watch::channel(false);

		let coarse = {
			let scheduler = self.clone();
			let mut shutdown = shutdown_rx.clone();
			tokio::spawn(async move {
				let mut ticker = tokio::time::interval(scheduler.config.refresh_interval);
				ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
				let mut force_next = true;
				loop {
					tokio::select! {
						biased;
						_ = shutdown.changed() => break,
						_ = ticker.tick() => {}
					}
					let force = std::mem::take(&mut force_next);
					if let Err(e) = scheduler.refresh(force).await {
						error!("Refresh failed: {}", e);
					}
				}
			})
		};

		let fast = {
			let scheduler = self;
			let mut shutdown = shutdown_rx;
			tokio::spawn(async move {
				let first_tick = tokio::time::Instant::now() + scheduler.config.fast_interval;
				let mut ticker =
					tokio::time::interval_at(first_tick, scheduler.config.fast_interval);
				ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
				loop {
					tokio::select! {
						biased;
						_ = shutdown.changed() => break,
						_ = ticker.tick() => {}
					}
					if let Err(e) = scheduler.update_data().await {
						error!("Data poll failed: {}", e);
					}
				}
			})
		};

		SchedulerHandle {
			shutdown: shutdown_tx,
			tasks: vec![coarse, fast],
		}
	}
}

/// Handle over a running scheduler's timer tasks.
pub struct SchedulerHandle {
	shutdown: watch::Sender<bool>,
	tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
	/// Stop both timers and wait for them to wind down. A pass already in
	/// flight finishes first; nothing is preempted.
	pub async fn stop(self) {
		let _ = self.shutdown.send(true);
		for task in self.tasks {
			let _ = task.await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::MockEngine;
	use crate::wallet::types::{AddressRecord, Balance, Transaction};

	struct NullSink;

	impl StateSink for NullSink {
		fn set_info(&self, _: WalletInfo) {}
		fn set_total_balance(&self, _: Balance) {}
		fn set_addresses_with_balance(&self, _: Vec<AddressRecord>) {}
		fn set_all_addresses(&self, _: Vec<AddressRecord>) {}
		fn set_transactions(&self, _: Vec<Transaction>) {}
		fn set_price(&self, _: Option<f64>) {}
		fn set_wallet_settings(&self, _: WalletSettings) {}
	}

	fn test_scheduler(mock: &MockEngine) -> SyncScheduler {
		SyncScheduler::new(
			EngineClient::new(Arc::new(mock.clone())),
			Arc::new(NullSink),
			SchedulerConfig::default(),
		)
	}

	fn script_info(mock: &MockEngine, latest_block: u64) {
		mock.script_repeat(
			"info",
			"",
			&format!(r#"{{"chain_name":"main","latest_block_height":{}}}"#, latest_block),
		);
		mock.script_repeat("updatecurrentprice", "", "Error: no price source");
		mock.script_repeat("height", "", &format!(r#"{{"height":{}}}"#, latest_block));
	}

	#[tokio::test]
	async fn fast_poll_skips_while_the_guard_is_held() {
		let mock = MockEngine::new();
		let scheduler = test_scheduler(&mock);

		let _guard = scheduler.pass_state.lock().await;
		let outcome = scheduler.update_data().await.unwrap();

		assert_eq!(outcome, FastPollOutcome::Skipped);
		assert!(mock.calls().is_empty());
	}

	#[tokio::test]
	async fn unchanged_fingerprint_stops_the_fast_poll() {
		let mock = MockEngine::new();
		script_info(&mock, 2_000_000);
		mock.script_repeat("list", "", r#"[{"txid":"aaa"}]"#);

		let scheduler = test_scheduler(&mock);
		scheduler.pass_state.try_lock().unwrap().last_txid = Some("aaa".to_string());

		let outcome = scheduler.update_data().await.unwrap();

		assert_eq!(outcome, FastPollOutcome::Unchanged);
		assert_eq!(mock.call_count("list"), 1);
		assert_eq!(mock.call_count("balance"), 0);
	}

	#[tokio::test]
	async fn changed_fingerprint_rebuilds_every_snapshot() {
		let mock = MockEngine::new();
		script_info(&mock, 2_000_000);
		mock.script_repeat("list", "", r#"[{"txid":"bbb"}]"#);
		mock.script_repeat("balance", "", "{}");
		mock.script_repeat("addresses", "", "[]");
		mock.script_repeat("notes", "", "{}");
		mock.script_repeat("getoption", "download_memos", r#"{"download_memos":"wallet"}"#);
		mock.script_repeat(
			"getoption",
			"transaction_filter_threshold",
			r#"{"transaction_filter_threshold":"50"}"#,
		);

		let scheduler = test_scheduler(&mock);
		let outcome = scheduler.update_data().await.unwrap();

		assert_eq!(outcome, FastPollOutcome::Refreshed { height: 2_000_000 });
		assert_eq!(mock.call_count("balance"), 1);
		let state = scheduler.pass_state.try_lock().unwrap();
		assert_eq!(state.last_txid.as_deref(), Some("bbb"));
		assert_eq!(state.last_block_height, 2_000_000);
	}

	#[tokio::test]
	async fn timer_refresh_skips_when_already_at_tip() {
		let mock = MockEngine::new();
		script_info(&mock, 2_000_000);

		let scheduler = test_scheduler(&mock);
		scheduler.pass_state.try_lock().unwrap().last_block_height = 2_000_000;

		let outcome = scheduler.refresh(false).await.unwrap();

		assert_eq!(outcome, RefreshOutcome::AlreadyCurrent);
		assert_eq!(mock.call_count("sync"), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn sync_wait_resolves_once_the_height_arrives() {
		let mock = MockEngine::new();
		mock.script("height", "", r#"{"height":95}"#);
		mock.script("height", "", r#"{"height":100}"#);

		let scheduler = test_scheduler(&mock);
		let outcome = scheduler.await_sync_completion(100).await.unwrap();

		assert_eq!(outcome, WaitOutcome::Reached { attempts: 2 });
	}

	#[tokio::test(start_paused = true)]
	async fn sync_wait_gives_up_after_the_attempt_cap() {
		let mock = MockEngine::new();
		mock.script_repeat("height", "", r#"{"height":50}"#);

		let scheduler = test_scheduler(&mock);
		let outcome = scheduler.await_sync_completion(100).await.unwrap();

		assert_eq!(
			outcome,
			WaitOutcome::Exhausted {
				attempts: 30,
				wallet_height: 50
			}
		);
		assert_eq!(mock.call_count("height"), 30);
	}

	#[tokio::test]
	async fn unset_spam_threshold_is_rewritten_once() {
		let mock = MockEngine::new();
		mock.script_repeat("getoption", "download_memos", r#"{"download_memos":"wallet"}"#);
		mock.script_repeat(
			"getoption",
			"transaction_filter_threshold",
			r#"{"transaction_filter_threshold":"-1"}"#,
		);
		mock.script_repeat("setoption", "transaction_filter_threshold=50", "success");
		mock.script_repeat("save", "", "saved");

		let scheduler = test_scheduler(&mock);
		let settings = scheduler.fetch_wallet_settings().await.unwrap();

		// The stored value was read before the rewrite; it flips next fetch.
		assert_eq!(settings.spam_filter_threshold, -1);
		assert_eq!(settings.download_memos, "wallet");
		assert_eq!(mock.call_count("setoption"), 1);
		assert_eq!(mock.call_count("save"), 1);
	}

	#[tokio::test]
	async fn threshold_read_failures_degrade_to_zero() {
		let mock = MockEngine::new();
		mock.script_repeat("getoption", "download_memos", r#"{"download_memos":"none"}"#);

		let scheduler = test_scheduler(&mock);
		let settings = scheduler.fetch_wallet_settings().await.unwrap();

		assert_eq!(settings.spam_filter_threshold, 0);
		assert_eq!(settings.download_memos, "none");
	}

	#[tokio::test]
	async fn encrypt_refreshes_info_and_saves() {
		let mock = MockEngine::new();
		script_info(&mock, 2_000_000);
		mock.script_repeat("encrypt", "hunter2", r#"{"result":"success"}"#);
		mock.script_repeat("save", "", "saved");

		let scheduler = test_scheduler(&mock);
		assert!(scheduler.encrypt_wallet("hunter2").await.unwrap());

		assert_eq!(mock.call_count("info"), 1);
		assert_eq!(mock.call_count("save"), 1);
	}

	#[tokio::test]
	async fn lock_refreshes_info_without_saving() {
		let mock = MockEngine::new();
		script_info(&mock, 2_000_000);
		mock.script_repeat("lock", "", r#"{"result":"success"}"#);

		let scheduler = test_scheduler(&mock);
		assert!(scheduler.lock_wallet().await.unwrap());

		assert_eq!(mock.call_count("info"), 1);
		assert_eq!(mock.call_count("save"), 0);
	}
}
