pub mod collector;
pub mod exporter;

pub use collector::DiscoveryMetrics;
pub use exporter::PrometheusExporter;
