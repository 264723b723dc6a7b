//! Prometheus metrics for facade operations.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Labels for per-command metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CommandLabels {
    pub command: String,
}

/// Labels for failed commands (command + error kind)
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub command: String,
    pub kind: String,
}

/// Metrics shared by a client and the script handles it creates.
pub struct CommandMetrics {
    /// Commands issued, successful or not
    pub commands_total: Family<CommandLabels, Counter>,
    /// Failed commands
    pub command_errors_total: Family<ErrorLabels, Counter>,
    /// Command duration histogram
    pub command_duration_seconds: Family<CommandLabels, Histogram>,
    /// Script handles created and not yet closed
    pub scripts_active: Gauge,
    registry: Registry,
}

impl Default for CommandMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let commands_total = Family::<CommandLabels, Counter>::default();
        registry.register(
            "valkey_client_commands",
            "Total number of commands issued",
            commands_total.clone(),
        );

        let command_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "valkey_client_command_errors",
            "Total number of failed commands",
            command_errors_total.clone(),
        );

        let command_duration_seconds =
            Family::<CommandLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.0005, 2.0, 16))
            });
        registry.register(
            "valkey_client_command_duration_seconds",
            "Duration of commands in seconds",
            command_duration_seconds.clone(),
        );

        let scripts_active = Gauge::default();
        registry.register(
            "valkey_client_scripts_active",
            "Number of open script handles",
            scripts_active.clone(),
        );

        Self {
            commands_total,
            command_errors_total,
            command_duration_seconds,
            scripts_active,
            registry,
        }
    }

    /// Record a finished command. `error_kind` is set when it failed.
    pub fn record(&self, command: &str, duration_secs: f64, error_kind: Option<&str>) {
        let labels = CommandLabels {
            command: command.to_string(),
        };
        self.commands_total.get_or_create(&labels).inc();
        self.command_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);

        if let Some(kind) = error_kind {
            let labels = ErrorLabels {
                command: command.to_string(),
                kind: kind.to_string(),
            };
            self.command_errors_total.get_or_create(&labels).inc();
        }
    }

    pub fn script_opened(&self) {
        self.scripts_active.inc();
    }

    pub fn script_closed(&self) {
        self.scripts_active.dec();
    }

    /// Encode metrics to Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if encode(&mut buffer, &self.registry).is_err() {
            tracing::error!("Failed to encode metrics");
            return "# Error encoding metrics".to_string();
        }
        buffer
    }
}
