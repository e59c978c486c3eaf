//! # SASbot - Tenant Configuration Server
//!
//! The main binary for the SASbot chatbot configuration service.
//!
//! This application provides:
//! - HTTP REST API server for the workflow engine (axum-based)
//! - CLI interface for operators
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/sasbot (THE BINARY)                │
//! │                                                          │
//! │     ┌─────────────┐            ┌─────────────┐           │
//! │     │    CLI      │            │  HTTP API   │◄── n8n    │
//! │     │   (clap)    │            │   (axum)    │           │
//! │     └──────┬──────┘            └──────┬──────┘           │
//! │            └─────────────┬────────────┘                  │
//! │                          ▼                               │
//! │                  ┌───────────────┐                       │
//! │                  │  sasbot-core  │                       │
//! │                  │  (THE LOGIC)  │                       │
//! │                  └───────────────┘                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Load tenants and start the HTTP server
//! sasbot import -f clinic.toml
//! sasbot server --host 0.0.0.0 --port 8080
//!
//! # Inspect what the bot will be told
//! sasbot identify --number "+598 99 123 456"
//! sasbot prompt --tenant <tenant-id>
//! ```

use clap::Parser;
use sasbot::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SASBOT_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("SASBOT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sasbot=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ███████╗ █████╗ ███████╗██████╗  ██████╗ ████████╗
  ██╔════╝██╔══██╗██╔════╝██╔══██╗██╔═══██╗╚══██╔══╝
  ███████╗███████║███████╗██████╔╝██║   ██║   ██║
  ╚════██║██╔══██║╚════██║██╔══██╗██║   ██║   ██║
  ███████║██║  ██║███████║██████╔╝╚██████╔╝   ██║
  ╚══════╝╚═╝  ╚═╝╚══════╝╚═════╝  ╚═════╝    ╚═╝

  Tenant Configuration Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
