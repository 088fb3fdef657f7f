//! SPA edge server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                     EDGE SERVER                       │
//!                    │                                                       │
//!  Client Request    │  ┌────────┐  ┌─────────┐  ┌───────────┐  ┌─────────┐ │
//!  ──────────────────┼─▶│  body  │─▶│security │─▶│rate limit │─▶│compress │ │
//!                    │  │ parser │  │ headers │  │ global+api│  │         │ │
//!                    │  └────────┘  └─────────┘  └───────────┘  └────┬────┘ │
//!                    │                                               ▼      │
//!                    │                 ┌──────────────┐  ┌────────────────┐ │
//!  Client Response   │                 │ /api/health  │  │ static assets  │ │
//!  ◀─────────────────┼─────────────────│ /api/keys    │  │ + SPA fallback │ │
//!                    │                 └──────────────┘  └────────────────┘ │
//!                    │                                                       │
//!                    │  terminal error handler wraps everything (JSON 500)   │
//!                    │  security headers stamped on every response           │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use spa_edge::config::load_config;
use spa_edge::lifecycle::startup;
use spa_edge::observability::logging;

#[derive(Parser)]
#[command(name = "spa-edge")]
#[command(about = "Static SPA host with an admission pipeline and key distribution", long_about = None)]
struct Cli {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long, env = "EDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("spa-edge: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.mode, &config.observability);
    tracing::info!("spa-edge v{} starting", env!("CARGO_PKG_VERSION"));

    let outcome = startup::run(config).await;
    tracing::info!(?outcome, "Shutdown complete");
    outcome.exit_code()
}
