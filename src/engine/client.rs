//! Typed client for the wallet engine's command/response interface.
//!
//! The engine exposes a narrow gateway: a command name plus one opaque
//! argument string in, one response string out. This module wraps that
//! gateway in one typed method per consumed command, validating every
//! response at the boundary so malformed data becomes a distinguishable
//! [`EngineError::MalformedResponse`] instead of a failure deep inside the
//! sync pipeline.

use super::types::*;
use crate::wallet::types::PoolType;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// The engine gateway contract: one in-flight call at a time from this
/// crate's perspective, synchronous from the caller's viewpoint.
///
/// Responses are JSON except where documented otherwise (price queries may
/// return an error-marker string; sync/save return loggable status text).
#[async_trait::async_trait]
pub trait WalletEngine: Send + Sync {
	/// Execute a single engine command with an opaque argument string.
	async fn execute(&self, command: &str, argument: &str) -> Result<String, EngineError>;
}

/// Typed facade over a [`WalletEngine`] gateway.
#[derive(Clone)]
pub struct EngineClient {
	engine: Arc<dyn WalletEngine>,
}

impl EngineClient {
	/// Create a new client over any engine transport.
	pub fn new(engine: Arc<dyn WalletEngine>) -> Self {
		Self { engine }
	}

	async fn execute(&self, command: &str, argument: &str) -> Result<String, EngineError> {
		self.engine.execute(command, argument).await
	}

	fn parse<T: DeserializeOwned>(command: &str, response: &str) -> Result<T, EngineError> {
		serde_json::from_str(response).map_err(|e| EngineError::MalformedResponse {
			command: command.to_string(),
			detail: e.to_string(),
		})
	}

	fn malformed(command: &str, detail: impl Into<String>) -> EngineError {
		EngineError::MalformedResponse {
			command: command.to_string(),
			detail: detail.into(),
		}
	}

	/// Fetch chain metadata and the latest known block height.
	pub async fn info(&self) -> Result<RawInfo, EngineError> {
		let response = self.execute("info", "").await?;
		Self::parse("info", &response)
	}

	/// Fetch the height the wallet has synced to.
	pub async fn wallet_height(&self) -> Result<u64, EngineError> {
		let response = self.execute("height", "").await?;
		let height: RawHeight = Self::parse("height", &response)?;
		Ok(height.height)
	}

	/// Trigger an asynchronous engine sync; returns the engine's status text.
	pub async fn start_sync(&self) -> Result<String, EngineError> {
		self.execute("sync", "").await
	}

	/// Trigger a full rescan; returns the engine's status text.
	pub async fn start_rescan(&self) -> Result<String, EngineError> {
		self.execute("rescan", "").await
	}

	/// Fetch the engine's sync progress report as raw text.
	pub async fn sync_status(&self) -> Result<String, EngineError> {
		self.execute("syncstatus", "").await
	}

	/// Persist engine state; returns the engine's status text.
	pub async fn save(&self) -> Result<String, EngineError> {
		self.execute("save", "").await
	}

	/// Fetch per-pool balances in zatoshis.
	pub async fn balance(&self) -> Result<RawBalance, EngineError> {
		let response = self.execute("balance", "").await?;
		Self::parse("balance", &response)
	}

	/// Fetch unspent and pending notes/UTXOs per pool.
	pub async fn notes(&self) -> Result<RawNotes, EngineError> {
		let response = self.execute("notes", "").await?;
		Self::parse("notes", &response)
	}

	/// Fetch the address inventory with receiver descriptors.
	pub async fn addresses(&self) -> Result<Vec<RawAddress>, EngineError> {
		let response = self.execute("addresses", "").await?;
		Self::parse("addresses", &response)
	}

	/// Fetch the flat transaction list.
	pub async fn transactions(&self) -> Result<Vec<RawTransaction>, EngineError> {
		let response = self.execute("list", "").await?;
		Self::parse("list", &response)
	}

	/// Fetch the id of the most recent transaction, used as a cheap
	/// change-detection fingerprint. `None` when the wallet has no
	/// transactions yet.
	///
	/// The engine has no dedicated command for this, so the full list is
	/// fetched and its last entry inspected.
	pub async fn last_txid(&self) -> Result<Option<String>, EngineError> {
		let list = self.transactions().await?;
		Ok(list.last().map(|tx| tx.txid.clone()))
	}

	/// Dispatch a send with the serialized recipient list.
	///
	/// The send itself runs asynchronously inside the engine; callers poll
	/// [`EngineClient::send_progress`] for completion. A failure here means
	/// the dispatch itself was rejected and the send never started.
	pub async fn send(&self, recipients: &[SendRecipient]) -> Result<String, EngineError> {
		let argument = serde_json::to_string(recipients).map_err(|e| {
			EngineError::CallFailed(format!("failed to serialize send recipients: {}", e))
		})?;
		debug!("Dispatching send: {}", argument);
		self.execute("send", &argument).await
	}

	/// Fetch the current send status.
	pub async fn send_progress(&self) -> Result<RawSendProgress, EngineError> {
		let response = self.execute("sendprogress", "").await?;
		Self::parse("sendprogress", &response)
	}

	/// Read a wallet option; the response is keyed by the requested name.
	pub async fn get_option(&self, name: &str) -> Result<String, EngineError> {
		let response = self.execute("getoption", name).await?;
		let value: serde_json::Value = Self::parse("getoption", &response)?;
		match value.get(name) {
			Some(serde_json::Value::String(s)) => Ok(s.clone()),
			Some(other) => Ok(other.to_string()),
			None => Err(Self::malformed(
				"getoption",
				format!("missing `{}` field", name),
			)),
		}
	}

	/// Write a wallet option as `name=value`; returns the engine's status text.
	pub async fn set_option(&self, name: &str, value: &str) -> Result<String, EngineError> {
		self.execute("setoption", &format!("{}={}", name, value)).await
	}

	/// Fetch the current ZEC price.
	///
	/// Price failures are soft: the engine signals them with an error-marker
	/// string instead of JSON, so the marker is checked before parsing and
	/// any failure yields `None` rather than an error.
	pub async fn update_current_price(&self) -> Result<Option<f64>, EngineError> {
		let response = self.execute("updatecurrentprice", "").await?;
		if response.to_lowercase().starts_with("error") {
			warn!("Error fetching price: {}", response);
			return Ok(None);
		}
		match response.trim().parse::<f64>() {
			Ok(price) if price > 0.0 => Ok(Some(price)),
			Ok(_) => Ok(None),
			Err(e) => {
				warn!("Failed to parse price response `{}`: {}", response, e);
				Ok(None)
			}
		}
	}

	/// Export private/viewing key material for an address.
	pub async fn export_keys(&self, address: &str) -> Result<Vec<RawExportedKey>, EngineError> {
		let response = self.execute("export", address).await?;
		Self::parse("export", &response)
	}

	/// Create a new address in the given pool.
	pub async fn new_address(&self, pool: PoolType) -> Result<String, EngineError> {
		// The engine creates addresses by receiver combination: "ozt" is a
		// full unified address, "oz" orchard+sapling, "ot" orchard+transparent.
		// A transparent-only address cannot be created.
		let selector = match pool {
			PoolType::Unified => "ozt",
			PoolType::Sapling => "oz",
			PoolType::Transparent => "ot",
		};
		let response = self.execute("new", selector).await?;
		let mut addresses: Vec<String> = Self::parse("new", &response)?;
		if addresses.is_empty() {
			return Err(Self::malformed("new", "empty address list"));
		}
		Ok(addresses.remove(0))
	}

	/// Fetch the wallet's recovery seed phrase.
	pub async fn seed_phrase(&self) -> Result<String, EngineError> {
		let response = self.execute("seed", "").await?;
		let seed: RawSeed = Self::parse("seed", &response)?;
		Ok(seed.seed)
	}

	/// Import a private/viewing key with its birthday height; returns the
	/// resulting address text verbatim.
	pub async fn import_key(&self, key: &str, birthday: u64) -> Result<String, EngineError> {
		let argument = json!({ "key": key, "birthday": birthday }).to_string();
		self.execute("import", &argument).await
	}

	/// Encrypt the wallet with a password.
	pub async fn encrypt(&self, password: &str) -> Result<bool, EngineError> {
		self.status_command("encrypt", password).await
	}

	/// Decrypt the wallet with a password.
	pub async fn decrypt(&self, password: &str) -> Result<bool, EngineError> {
		self.status_command("decrypt", password).await
	}

	/// Lock the wallet.
	pub async fn lock(&self) -> Result<bool, EngineError> {
		self.status_command("lock", "").await
	}

	/// Unlock the wallet with a password.
	pub async fn unlock(&self, password: &str) -> Result<bool, EngineError> {
		self.status_command("unlock", password).await
	}

	async fn status_command(&self, command: &str, argument: &str) -> Result<bool, EngineError> {
		let response = self.execute(command, argument).await?;
		let status: RawStatusResult = Self::parse(command, &response)?;
		Ok(status.result == "success")
	}

	/// Fetch the network fee constant, in whole ZEC.
	pub async fn default_fee(&self) -> Result<f64, EngineError> {
		let response = self.execute("defaultfee", "").await?;
		let fee: RawDefaultFee = Self::parse("defaultfee", &response)?;
		Ok(crate::utils::zats_to_zec(fee.defaultfee as i64))
	}
}
