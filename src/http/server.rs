//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build per-component state from the validated config
//! - Create the Axum router (API routes, then SPA fallback)
//! - Wire the admission pipeline in its fixed order
//! - Serve with graceful shutdown and a rate-limit sweeper alongside
//!
//! # Pipeline (outermost first)
//! ```text
//! security headers → catch panic → request id → trace
//!     → body parser → body limit → client ip
//!     → global rate limit → api rate limit → compression → router
//! ```

use std::any::Any;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::from_fn_with_state, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::{
        predicate::{DefaultPredicate, Predicate, SizeAbove},
        CompressionLayer,
    },
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::api::{self, OriginPolicy};
use crate::config::EdgeConfig;
use crate::credentials::CredentialSet;
use crate::http::request::{MakeRequestUuidV4, RequestIdExt};
use crate::http::response::panic_response;
use crate::routing::spa;
use crate::security::{
    client_ip::client_ip_middleware,
    headers::{security_headers_middleware, PolicyError},
    limits::body_parser_middleware,
    rate_limit::{rate_limit_middleware, run_sweeper},
    BodyLimits, RateLimitTier, RateLimiter, SecurityPolicy,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid security policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] JoinError),
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EdgeConfig>,
    pub credentials: Arc<CredentialSet>,
    pub origins: Arc<OriginPolicy>,
    pub policy: Arc<SecurityPolicy>,
    pub global_limiter: Arc<RateLimiter>,
    pub api_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    /// Split the validated config into owned per-component state.
    pub fn new(mut config: EdgeConfig) -> Result<Self, ServerError> {
        let credentials = Arc::new(std::mem::take(&mut config.credentials));
        let origins = Arc::new(OriginPolicy::new(config.mode, &config.origins));
        let policy = Arc::new(SecurityPolicy::for_mode(config.mode)?);
        let global_limiter = Arc::new(RateLimiter::new(RateLimitTier::global(
            config.rate_limit.global_tier(),
        )));
        let api_limiter = Arc::new(RateLimiter::new(RateLimitTier::api(
            config.rate_limit.api_tier(),
        )));

        Ok(Self {
            config: Arc::new(config),
            credentials,
            origins,
            policy,
            global_limiter,
            api_limiter,
            started_at: Instant::now(),
        })
    }
}

/// HTTP server for the SPA edge.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let state = AppState::new(config)?;
        let router = build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Run until a shutdown signal arrives, then drain in-flight requests.
    ///
    /// Returns an error if serving fails or the sweeper task dies.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = self.state.config.mode.as_str(),
            "HTTP server starting"
        );

        let sweep_every = Duration::from_secs(self.state.config.rate_limit.sweep_interval_secs);
        let mut sweeper = tokio::spawn(run_sweeper(
            vec![
                self.state.global_limiter.clone(),
                self.state.api_limiter.clone(),
            ],
            sweep_every,
            shutdown.resubscribe(),
        ));

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .into_future();
        tokio::pin!(serve);

        let mut sweeper_done = false;
        loop {
            tokio::select! {
                result = &mut serve => {
                    result?;
                    break;
                }
                joined = &mut sweeper, if !sweeper_done => {
                    joined?;
                    sweeper_done = true;
                }
            }
        }

        if !sweeper_done {
            sweeper.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn wait_for(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
    tracing::info!("Shutdown signal received, draining connections");
}

/// Build the full application: API routes, SPA fallback, pipeline.
pub fn build_router(state: AppState) -> Router {
    let router = api::router().with_state(state.clone());
    let router = spa::attach(router, &state.config.static_files);
    apply_pipeline(router, &state)
}

/// Wrap `router` in the admission pipeline.
///
/// Layers added later run earlier, so they are listed innermost first.
pub fn apply_pipeline(router: Router, state: &AppState) -> Router {
    let config = &state.config;
    let production = config.mode.is_production();
    let compress_when =
        DefaultPredicate::new().and(SizeAbove::new(config.security.compression_threshold));

    router
        .layer(CompressionLayer::new().compress_when(compress_when))
        .layer(from_fn_with_state(state.api_limiter.clone(), rate_limit_middleware))
        .layer(from_fn_with_state(state.global_limiter.clone(), rate_limit_middleware))
        .layer(from_fn_with_state(config.proxy.trust_proxy, client_ip_middleware))
        // Caps streamed bodies the parser does not buffer.
        .layer(RequestBodyLimitLayer::new(config.security.max_body_bytes))
        .layer(from_fn_with_state(
            BodyLimits::new(config.security.max_body_bytes),
            body_parser_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request.request_id(),
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
        .layer(CatchPanicLayer::custom(
            move |payload: Box<dyn Any + Send + 'static>| panic_response(payload, production),
        ))
        // Response-only stage: wraps everything so rejections and caught
        // panics carry the policy too.
        .layer(from_fn_with_state(state.policy.clone(), security_headers_middleware))
}
