//! Structured logging for Loki integration.
//!
//! Logs are formatted as JSON with consistent fields that Loki can parse:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `component`: Component identifier (lucid-08-session-pipeline, etc.)
//! - `message`: Log message
//! - `trace_id`: OpenTelemetry trace ID (for correlation with Tempo)
//! - Additional context fields

use crate::{TelemetryConfig, TelemetryError};

/// Structured logger handle
pub struct StructuredLogger {
    _initialized: bool,
}

/// Initialize Loki logging.
///
/// Note: Loki integration is handled via the tracing-subscriber JSON layer.
/// Logs are sent to Loki via a log shipping agent (Promtail) or direct push.
/// This function configures structured logging that's Loki-compatible.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    tracing::debug!(
        loki_endpoint = %config.loki_endpoint,
        json_logs = config.json_logs,
        "structured logging configured for Loki compatibility"
    );

    Ok(StructuredLogger { _initialized: true })
}

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with component
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with component
    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with component
    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with component
    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a session-related event with standard fields.
#[macro_export]
macro_rules! log_session_event {
    ($level:ident, $component:expr, $msg:expr, $session_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            session_id = %$session_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a chunk-related event with standard fields.
#[macro_export]
macro_rules! log_chunk_event {
    ($level:ident, $component:expr, $msg:expr, $session_id:expr, $chunk_index:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            session_id = %$session_id,
            chunk_index = $chunk_index,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a payment-related event with standard fields.
#[macro_export]
macro_rules! log_payment_event {
    ($level:ident, $component:expr, $msg:expr, $payment_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            payment_id = %$payment_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a block or anchor related event with standard fields.
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $component:expr, $msg:expr, $block_height:expr, $block_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            block_height = $block_height,
            block_id = %$block_id,
            $($($field)*,)?
            $msg
        )
    };
}
