use crate::metrics::collector::DiscoveryMetrics;
use crate::{PeerpingError, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::debug;

/// Renders discovery metrics in the Prometheus text exposition format.
pub struct PrometheusExporter {
    registry: Registry,
}

impl PrometheusExporter {
    pub fn new(metrics: &DiscoveryMetrics) -> Result<Self> {
        let registry = Registry::new();
        metrics.register(&registry)?;
        debug!("Registered discovery metrics");
        Ok(Self { registry })
    }

    pub fn format_current_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| PeerpingError::MetricsError(e.to_string()))
    }
}
