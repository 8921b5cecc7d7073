use clap::Parser;
use factorial_core::HttpFactorialClient;
use factorial_relay::{
    CliArgs, ConsoleSink, LogFailures, RelayConfig, run, shutdown_signal,
    relay::telemetry::init_telemetry,
};
use std::sync::Arc;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RelayConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let client = HttpFactorialClient::with_timeout(config.endpoint.clone(), config.request_timeout)?;
    let sink = ConsoleSink::stdout().shared();

    let outcome = run(
        &config,
        Arc::new(client),
        Arc::new(LogFailures),
        shutdown_signal(),
        &sink,
    )
    .await;

    providers.shutdown();
    outcome?;
    Ok(())
}

fn log_startup_info(_config: &RelayConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!("Starting factorial relay with full config: {:#?}", _config);
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting factorial relay in {:?} mode against {}",
            _config.mode,
            _config.endpoint
        );
    }
}
