use crate::Result;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts, Registry};

pub const METRICS_PREFIX: &str = "peerping";

/// `call_type` label for pod listings.
pub const CALL_TYPE_GET_PODS: &str = "get_pods";

/// `type` label for control-plane failures.
pub const ERROR_KUBERNETES_API: &str = "kubernetes_api";

/// Metrics for calls made to the Kubernetes control plane.
///
/// Prometheus metric handles are internally reference counted and atomic, so
/// this can be cloned and shared between concurrent callers.
#[derive(Clone)]
pub struct DiscoveryMetrics {
    kube_master_response_time: HistogramVec,
    errors: IntCounterVec,
}

impl DiscoveryMetrics {
    pub fn new() -> Result<Self> {
        let kube_master_response_time = HistogramVec::new(
            HistogramOpts::new(
                format!("{}_kube_master_response_time_s", METRICS_PREFIX),
                "Histogram of response times from the Kubernetes API server",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["call_type"],
        )?;

        let errors = IntCounterVec::new(
            Opts::new(
                format!("{}_errors_total", METRICS_PREFIX),
                "Statistics of errors per type",
            ),
            &["type"],
        )?;

        Ok(Self {
            kube_master_response_time,
            errors,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.kube_master_response_time.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }

    /// Starts timing a control-plane call. Dropping the timer records the
    /// sample; call `stop_and_discard` on failures.
    pub fn kubernetes_call_timer(&self, call_type: &str) -> HistogramTimer {
        self.kube_master_response_time
            .with_label_values(&[call_type])
            .start_timer()
    }

    pub fn count_error(&self, error_type: &str) {
        self.errors.with_label_values(&[error_type]).inc();
    }

    pub fn error_count(&self, error_type: &str) -> u64 {
        self.errors.with_label_values(&[error_type]).get()
    }

    pub fn kubernetes_call_count(&self, call_type: &str) -> u64 {
        self.kube_master_response_time
            .with_label_values(&[call_type])
            .get_sample_count()
    }
}
