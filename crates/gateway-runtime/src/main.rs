//! # Transaction Gateway Engine
//!
//! Runs block ingestion and double-spend detection against a remote chain
//! gateway.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`GW_CONFIG` file, then environment)
//! 2. Initialize logging and metrics
//! 3. Build the store (with retries) and chain gateway
//! 4. Start one worker per signal type and the maintenance sweep
//! 5. Run until Ctrl+C, then drain workers

use std::sync::Arc;

use anyhow::{Context, Result};
use gateway_runtime::{EngineConfig, EngineRuntime};
use gateway_telemetry::init_telemetry;
use shared_types::InMemoryChainGateway;
use tg_01_tx_store::{InMemoryTransactionStore, RetryingStore};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::load().context("Failed to load configuration")?;
    let _telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!(
        max_fork_depth = config.ingestion.max_fork_depth,
        delta_height = config.double_spend.delta_block_height_for_double_spend_check,
        channel_capacity = config.bus.channel_capacity,
        "Configuration loaded"
    );

    // Node RPC and SQL adapters live outside this engine; the in-memory
    // implementations stand in until they are plugged in.
    let store = Arc::new(RetryingStore::new(
        InMemoryTransactionStore::new(),
        config.retry.clone(),
    ));
    let gateway = Arc::new(InMemoryChainGateway::new());

    let runtime = EngineRuntime::start(&config, store, gateway);

    info!("Engine is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
