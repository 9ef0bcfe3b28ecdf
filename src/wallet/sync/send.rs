//! Send dispatch and progress tracking.
//!
//! Sends run asynchronously inside the engine: the `send` command returns at
//! once and the wallet polls `sendprogress` until a txid or an error shows
//! up. This module owns that polling loop and the ETA estimate derived from
//! the observed proving rate.

use crate::engine::{EngineClient, SendRecipient};
use crate::wallet::types::{SendProgress, SyncError};
use std::time::Duration;

/// Callback receiving progress snapshots; `None` signals the send finished.
pub type ProgressCallback = dyn Fn(Option<SendProgress>) + Send + Sync;

/// Timing configuration for send tracking
#[derive(Debug, Clone)]
pub struct SendConfig {
	/// Delay between progress polls
	pub poll_interval: Duration,
	/// Assumed seconds per proving step before real timing exists
	pub default_seconds_per_step: f64,
}

impl Default for SendConfig {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(2),
			default_seconds_per_step: 3.0,
		}
	}
}

/// Dispatches sends and tracks them to completion.
pub struct SendCoordinator {
	client: EngineClient,
	config: SendConfig,
}

impl SendCoordinator {
	pub fn new(client: EngineClient, config: SendConfig) -> Self {
		Self { client, config }
	}

	/// Dispatch a send and poll until the engine reports a txid or an error.
	///
	/// A dispatch failure surfaces immediately; after that the loop only ends
	/// on a terminal progress response. The engine keeps the previous send's
	/// progress around, so the id observed before dispatch tells a stale
	/// report from the new send.
	pub async fn send_and_track(
		&self,
		recipients: &[SendRecipient],
		on_progress: &ProgressCallback,
	) -> Result<String, SyncError> {
		let prior_id = self.client.send_progress().await?.id;

		let response = self.client.send(recipients).await?;
		log::info!("Send dispatched: {}", response);

		let started = tokio::time::Instant::now();

		loop {
			tokio::time::sleep(self.config.poll_interval).await;

			let progress = self.client.send_progress().await?;
			log::debug!(
				"Send progress: id={} {}/{}",
				progress.id,
				progress.progress,
				progress.total
			);

			if progress.id == prior_id {
				// The engine has not picked up the send yet.
				on_progress(Some(SendProgress {
					sending: true,
					..Default::default()
				}));
				continue;
			}

			let seconds_per_step = if progress.progress > 0 {
				started.elapsed().as_secs_f64() / progress.progress as f64
			} else {
				self.config.default_seconds_per_step
			};
			let remaining = progress.total as f64 - progress.progress as f64;
			let eta = (remaining * seconds_per_step).round();
			let eta_seconds = if eta <= 0.0 { 1 } else { eta as u64 };

			match (progress.txid, progress.error) {
				(None, None) => {
					on_progress(Some(SendProgress {
						id: progress.id,
						progress: progress.progress,
						// A change output can leave the reported total one short.
						total: progress.total.max(progress.progress),
						eta_seconds,
						sending: true,
						txid: None,
						error: None,
					}));
				}
				(Some(txid), _) => {
					on_progress(None);
					log::info!("Send completed: {}", txid);
					return Ok(txid);
				}
				(None, Some(message)) => {
					on_progress(None);
					log::error!("Send failed: {}", message);
					return Err(SyncError::SendFailed(message));
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::{EngineClient, MockEngine};
	use std::sync::{Arc, Mutex};

	fn recipients() -> Vec<SendRecipient> {
		vec![SendRecipient {
			address: "zs1dest".to_string(),
			amount: 50_000_000,
			memo: None,
		}]
	}

	fn coordinator(mock: &MockEngine) -> SendCoordinator {
		SendCoordinator::new(
			EngineClient::new(Arc::new(mock.clone())),
			SendConfig::default(),
		)
	}

	fn recording() -> (
		Arc<Mutex<Vec<Option<SendProgress>>>>,
		impl Fn(Option<SendProgress>) + Send + Sync,
	) {
		let updates: Arc<Mutex<Vec<Option<SendProgress>>>> = Arc::new(Mutex::new(Vec::new()));
		let sink = updates.clone();
		let callback = move |progress: Option<SendProgress>| {
			sink.lock().unwrap().push(progress);
		};
		(updates, callback)
	}

	#[tokio::test(start_paused = true)]
	async fn tracks_a_send_from_dispatch_to_txid() {
		let mock = MockEngine::new();
		mock.script("sendprogress", "", r#"{"id":1}"#);
		mock.script_repeat("send", r#"[{"address":"zs1dest","amount":50000000}]"#, "ok");
		mock.script("sendprogress", "", r#"{"id":1}"#);
		mock.script("sendprogress", "", r#"{"id":2,"progress":4,"total":10}"#);
		mock.script(
			"sendprogress",
			"",
			r#"{"id":2,"progress":10,"total":10,"txid":"txfinal"}"#,
		);

		let (updates, callback) = recording();
		let txid = coordinator(&mock)
			.send_and_track(&recipients(), &callback)
			.await
			.unwrap();
		assert_eq!(txid, "txfinal");

		let updates = updates.lock().unwrap();
		assert_eq!(updates.len(), 3);

		// Not picked up yet: zero counters but marked as sending.
		let waiting = updates[0].as_ref().unwrap();
		assert!(waiting.sending);
		assert_eq!(waiting.progress, 0);
		assert_eq!(waiting.total, 0);

		// Picked up: 4 steps over two 2 s polls, 6 remaining at 1 s each.
		let tracking = updates[1].as_ref().unwrap();
		assert_eq!(tracking.id, 2);
		assert_eq!(tracking.progress, 4);
		assert_eq!(tracking.total, 10);
		assert_eq!(tracking.eta_seconds, 6);

		assert!(updates[2].is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn eta_uses_the_default_rate_before_progress_starts() {
		let mock = MockEngine::new();
		mock.script("sendprogress", "", r#"{"id":5}"#);
		mock.script_repeat("send", r#"[{"address":"zs1dest","amount":50000000}]"#, "ok");
		mock.script("sendprogress", "", r#"{"id":6,"progress":0,"total":10}"#);
		mock.script(
			"sendprogress",
			"",
			r#"{"id":6,"progress":10,"total":10,"txid":"t"}"#,
		);

		let (updates, callback) = recording();
		coordinator(&mock)
			.send_and_track(&recipients(), &callback)
			.await
			.unwrap();

		let updates = updates.lock().unwrap();
		let first = updates[0].as_ref().unwrap();
		assert_eq!(first.progress, 0);
		assert_eq!(first.eta_seconds, 30);
	}

	#[tokio::test(start_paused = true)]
	async fn reported_total_never_trails_progress() {
		let mock = MockEngine::new();
		mock.script("sendprogress", "", r#"{"id":1}"#);
		mock.script_repeat("send", r#"[{"address":"zs1dest","amount":50000000}]"#, "ok");
		mock.script("sendprogress", "", r#"{"id":2,"progress":4,"total":3}"#);
		mock.script(
			"sendprogress",
			"",
			r#"{"id":2,"progress":4,"total":4,"txid":"t"}"#,
		);

		let (updates, callback) = recording();
		coordinator(&mock)
			.send_and_track(&recipients(), &callback)
			.await
			.unwrap();

		let updates = updates.lock().unwrap();
		let first = updates[0].as_ref().unwrap();
		assert_eq!(first.total, 4);
		assert_eq!(first.eta_seconds, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn engine_send_errors_surface_verbatim() {
		let mock = MockEngine::new();
		mock.script("sendprogress", "", r#"{"id":1}"#);
		mock.script_repeat("send", r#"[{"address":"zs1dest","amount":50000000}]"#, "ok");
		mock.script(
			"sendprogress",
			"",
			r#"{"id":2,"progress":3,"total":10,"error":"insufficient funds"}"#,
		);

		let (updates, callback) = recording();
		let err = coordinator(&mock)
			.send_and_track(&recipients(), &callback)
			.await
			.unwrap_err();

		match err {
			SyncError::SendFailed(message) => assert_eq!(message, "insufficient funds"),
			other => panic!("expected SendFailed, got {:?}", other),
		}
		assert_eq!(*updates.lock().unwrap().last().unwrap(), None);
	}

	#[tokio::test(start_paused = true)]
	async fn dispatch_failures_are_fatal() {
		let mock = MockEngine::new();
		mock.script("sendprogress", "", r#"{"id":1}"#);

		let (updates, callback) = recording();
		let err = coordinator(&mock)
			.send_and_track(&recipients(), &callback)
			.await
			.unwrap_err();

		assert!(matches!(err, SyncError::Engine(_)));
		assert!(updates.lock().unwrap().is_empty());
	}
}
