//!
//! HTTP transport for the wallet engine gateway.
//!
//! Commands are POSTed as a small JSON envelope and the response body is
//! returned verbatim; all interpretation happens in the typed client layer.

use super::client::WalletEngine;
use super::types::EngineError;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Engine transport that speaks to a wallet engine daemon over HTTP.
#[derive(Clone)]
pub struct HttpEngine {
	/// The underlying HTTP client for command requests.
	http_client: Client,
	/// The base URL of the engine's command endpoint.
	engine_url: String,
}

impl HttpEngine {
	/// Create a new HTTP transport for the given engine endpoint.
	pub fn new(engine_url: String) -> Self {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			engine_url,
		}
	}
}

#[async_trait::async_trait]
impl WalletEngine for HttpEngine {
	async fn execute(&self, command: &str, argument: &str) -> Result<String, EngineError> {
		debug!("Executing engine command: {}", command);

		let request_body = json!({
			"command": command,
			"argument": argument
		});

		let response = self
			.http_client
			.post(&self.engine_url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(EngineError::CallFailed(format!(
				"HTTP error: {}",
				response.status()
			)));
		}

		Ok(response.text().await?)
	}
}
