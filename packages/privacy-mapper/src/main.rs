// packages/privacy-mapper/src/main.rs
//! Privacy Mapper
//!
//! Line-oriented front end for the privacy mapper interceptor. Reads one
//! JSON interception event per line from stdin and writes one JSON outcome
//! per line to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use privacy_mapper::interception::{CallContext, InterceptEvent, PrivacyMapper, RequestInterceptor};
use privacy_mapper::observability::{init_metrics, init_tracing};
use privacy_mapper::random::{self, RandomSource};
use privacy_mapper::store::InMemoryPrivacyStore;
use privacy_mapper::utils::config::MapperConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = MapperConfig::load()?;

    // Initialize observability (tracing, metrics)
    init_tracing(&config.logging)?;
    init_metrics(&config.metrics)?;

    info!("Starting privacy mapper v{}", env!("CARGO_PKG_VERSION"));
    debug!("Configuration loaded: {:?}", config);

    if config.randomness.seed.is_some() {
        warn!("Deterministic randomness enabled, pseudonym fuzzing is predictable");
    }
    let random: Arc<dyn RandomSource> = Arc::from(random::from_seed(config.randomness.seed));

    let store = Arc::new(InMemoryPrivacyStore::new());
    let mapper = Arc::new(PrivacyMapper::new(store, random));
    info!(
        "Interceptor {} registered for condition {}",
        mapper.name(),
        mapper.custom_condition()
    );

    // Graceful shutdown handler
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, cancelling in-flight calls...");
            shutdown.cancel();
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0u64;

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read event")?,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<InterceptEvent>(&line) {
            Ok(event) => {
                let ctx = CallContext::with_cancellation(shutdown.child_token());
                let mapper = Arc::clone(&mapper);

                // Store transactions block; keep them off the reactor.
                let result = tokio::task::spawn_blocking(move || mapper.intercept(&ctx, &event))
                    .await
                    .context("Interception task failed")?;

                match result {
                    Ok(outcome) => outcome.to_json(),
                    Err(e) => {
                        error!("Interception failed: {}", e);
                        serde_json::json!({
                            "outcome": "error",
                            "kind": e.kind(),
                            "error": e.to_string(),
                        })
                    }
                }
            }
            Err(e) => {
                warn!("Ignoring malformed event: {}", e);
                serde_json::json!({
                    "outcome": "error",
                    "kind": "malformed_event",
                    "error": e.to_string(),
                })
            }
        };

        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
        handled += 1;
    }

    info!("Privacy mapper stopped after {} events", handled);
    Ok(())
}
