//! Startup orchestration.
//!
//! Order: log the effective configuration, start the metrics exporter, bind
//! the listener, build the server, then serve under the supervisor until a
//! stop signal arrives. Any startup error is fatal.

use thiserror::Error;
use tokio::net::TcpListener;

use crate::api::OriginPolicy;
use crate::config::EdgeConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::signals::forward_signals;
use crate::lifecycle::supervisor::{supervise, Outcome};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Server(#[from] ServerError),
}

fn log_config(config: &EdgeConfig) {
    let presence = config.credentials.presence();
    let global = config.rate_limit.global_tier();
    let api = config.rate_limit.api_tier();

    tracing::info!(
        mode = config.mode.as_str(),
        bind_address = %config.listener.bind_address(),
        trust_proxy = config.proxy.trust_proxy,
        static_root = %config.static_files.root.display(),
        "Configuration loaded"
    );
    tracing::info!(
        preset = ?config.rate_limit.preset,
        global_max = global.max_requests,
        global_window_secs = global.window_secs,
        api_max = api.max_requests,
        api_window_secs = api.window_secs,
        "Rate limits"
    );
    tracing::info!(
        groq = presence.groq,
        perplexity = presence.perplexity,
        gemini = presence.gemini,
        "Provider credentials"
    );

    let origins = OriginPolicy::new(config.mode, &config.origins);
    tracing::info!(
        enforced = origins.enforced(),
        allowed = origins.allowed_count(),
        "Key endpoint origin allow-list"
    );

    if config.mode.is_production() && config.origins.frontend.is_none() {
        tracing::warn!("No FRONTEND_URL configured; /api/keys only accepts localhost origins");
    }
}

async fn serve(config: EdgeConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let address = config.listener.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

/// Start the edge server and block until it stops.
pub async fn run(config: EdgeConfig) -> Outcome {
    log_config(&config);

    let observability = &config.observability;
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let signals = forward_signals(shutdown.clone());

    let outcome = supervise("http-server", serve(config, shutdown)).await;

    signals.abort();
    outcome
}
