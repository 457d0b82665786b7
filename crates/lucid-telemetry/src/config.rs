//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for the LGTM telemetry stack.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and logs.
    pub service_name: String,

    /// Component identifier, e.g. `lucid-10-payment-acceptor`.
    pub component_id: String,

    /// OpenTelemetry OTLP endpoint for Tempo.
    pub otlp_endpoint: String,

    /// Loki push endpoint.
    pub loki_endpoint: String,

    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Whether to enable console output (for development).
    pub console_output: bool,

    /// Whether to enable JSON formatted logs.
    pub json_logs: bool,

    /// Prometheus metrics port.
    pub metrics_port: u16,

    /// Network identifier (testnet, mainnet, devnet).
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "lucid".to_string(),
            component_id: "node".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            loki_endpoint: "http://localhost:3100".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            network: "testnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `OTEL_SERVICE_NAME`: service name (default: lucid)
    /// - `LUCID_COMPONENT_ID`: component id (default: node)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: Tempo endpoint (default: http://localhost:4317)
    /// - `LOKI_ENDPOINT`: Loki endpoint (default: http://localhost:3100)
    /// - `LUCID_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
    /// - `LUCID_CONSOLE_OUTPUT`: enable console output (default: true)
    /// - `LUCID_JSON_LOGS`: enable JSON logs (default: false in dev, true in containers)
    /// - `LUCID_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `LUCID_NETWORK`: network name (default: testnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "lucid".to_string()),

            component_id: env::var("LUCID_COMPONENT_ID").unwrap_or_else(|_| "node".to_string()),

            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),

            loki_endpoint: env::var("LOKI_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:3100".to_string()),

            log_level: env::var("LUCID_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("LUCID_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("LUCID_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("LUCID_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),

            network: env::var("LUCID_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
        }
    }

    /// Create configuration scoped to a specific component.
    pub fn for_component(component_id: &str) -> Self {
        let mut config = Self::from_env();
        config.component_id = component_id.to_string();
        config.service_name = component_id.to_string();
        config
    }

    /// Get the full service name including component.
    pub fn full_service_name(&self) -> String {
        if self.component_id == "node" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.component_id)
        }
    }
}
