use std::sync::Arc;
use tracing::{error, info};

use zecwallet_sync::engine::{EngineClient, HttpEngine};
use zecwallet_sync::wallet::sync::{SchedulerConfig, SyncScheduler};
use zecwallet_sync::wallet::LoggingSink;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	// Initialize tracing subscriber with debug logging for the sync crate
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive("zecwallet_sync=debug".parse().unwrap())
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.init();

	info!("Starting wallet sync service");

	let engine_url = std::env::var("WALLET_ENGINE_URL")
		.unwrap_or_else(|_| "http://localhost:8237".to_string());

	let client = EngineClient::new(Arc::new(HttpEngine::new(engine_url.clone())));
	info!("Created engine client for {}", engine_url);

	let sink = Arc::new(LoggingSink);
	let scheduler = SyncScheduler::new(client, sink, SchedulerConfig::default());

	info!("Running a forced full refresh");

	match scheduler.refresh(true).await {
		Ok(outcome) => {
			info!("Refresh finished: {:?}", outcome);
		}
		Err(e) => {
			error!("Failed to refresh wallet: {:?}", e);
		}
	}
}
