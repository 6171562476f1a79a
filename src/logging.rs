//! # Structured Logging Module
//!
//! Environment-aware structured logging for the provider process. Output goes
//! to stderr because stdout belongs to the plugin protocol.
//!
//! - `FASTSSM_LOG` (then `RUST_LOG`) sets the filter directive
//! - otherwise the level follows `FASTSSM_ENV`: `production` logs at info,
//!   everything else at debug
//! - `FASTSSM_LOG_FORMAT=json` switches to JSON lines

use chrono::Utc;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::new(get_filter_directive(&environment));
        let json = matches!(
            std::env::var("FASTSSM_LOG_FORMAT").as_deref(),
            Ok("json")
        );

        let layer = if json {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_filter(filter)
                .boxed()
        };

        // A host or test harness may already have installed a subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Current environment from `FASTSSM_ENV`
fn get_environment() -> String {
    std::env::var("FASTSSM_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Explicit filter directive, falling back to the environment default level
fn get_filter_directive(environment: &str) -> String {
    std::env::var("FASTSSM_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| get_log_level(environment).to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log the outcome of a lifecycle operation on a parameter
pub fn log_parameter_operation(
    operation: &str,
    parameter: &str,
    status: &str,
    version: Option<i64>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        parameter = %parameter,
        status = %status,
        version = version,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 PARAMETER_OPERATION"
    );
}

/// Log one retry-governed remote call
pub fn log_remote_call(operation: &str, parameter: &str, elapsed: Duration, success: bool) {
    tracing::debug!(
        operation = %operation,
        parameter = %parameter,
        elapsed_ms = elapsed.as_millis() as u64,
        success,
        timestamp = %Utc::now().to_rfc3339(),
        "🌐 REMOTE_CALL"
    );
}

/// Log error with full context
pub fn log_error(component: &str, error: &str, parameter: Option<&str>) {
    tracing::error!(
        component = %component,
        error = %error,
        parameter = parameter,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
