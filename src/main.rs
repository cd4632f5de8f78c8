//! Application entry point for the `bioreactor-sensorflow` service.
//!
//! This binary orchestrates the startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Checking that the configured source descriptor is recognized
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `SENSOR_SOURCE` (**required**) – file path, HTTP URL or `s3://` object
//! - `LISTEN_PORT` (optional) – HTTP port (default: 8080)
//! - `SENSORFLOW_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `SENSORFLOW_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the reader settings.
use std::{env, net::SocketAddr};

use anyhow::Result;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use bioreactor_sensorflow::{config, detect_source_kind, routes};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    // Fail fast on a descriptor no reader can handle
    let kind = detect_source_kind(&cfg.source)?;
    tracing::info!("Source '{}' will be read as {:?}", cfg.source, kind);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    let app = routes::router(cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Crates whose chatter is capped below the service's own level. Batch and
/// page progress is logged by this crate, so the transport layers only need
/// to surface problems.
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("hyper", "warn"),
    ("reqwest", "warn"),
    ("object_store", "info"),
];

/// Filter directives for `SENSORFLOW_LOG_LEVEL`. Unknown or missing levels
/// fall back to `info`, which still reports one line per fetched page or
/// object.
fn log_filter(level: Option<&str>) -> String {
    // ---
    let level = level.map(str::to_ascii_lowercase);
    let level = match level.as_deref() {
        Some(l @ ("trace" | "debug" | "info" | "warn" | "error")) => l,
        _ => "info",
    };

    QUIET_TARGETS
        .iter()
        .fold(level.to_string(), |acc, (target, cap)| format!("{acc},{target}={cap}"))
}

/// Install the stdout subscriber. `RUST_LOG` overrides [`log_filter`];
/// `SENSORFLOW_SPAN_EVENTS` (`full` or `enter_exit`) and `FORCE_COLOR` tune
/// the output.
fn init_tracing() {
    // ---
    let span_events = match env::var("SENSORFLOW_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(log_filter(env::var("SENSORFLOW_LOG_LEVEL").ok().as_deref())),
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
