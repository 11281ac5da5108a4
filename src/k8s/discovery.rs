//! Discovery of peer pods through the Kubernetes API.
//!
//! Discovery is best effort: a failed listing is logged and counted, and the
//! caller gets an empty directory. Polling and retries are left to the caller.

use crate::config::DiscoveryConfig;
use crate::k8s::client::PodLister;
use crate::k8s::types::{PeerDirectory, PeerRecord};
use crate::metrics::collector::{DiscoveryMetrics, CALL_TYPE_GET_PODS, ERROR_KUBERNETES_API};
use crate::{PeerpingError, Result};
use kube::api::ListParams;
use std::sync::Arc;
use tracing::{debug, error};

/// Only running pods have their IPs assigned.
pub const RUNNING_PHASE_SELECTOR: &str = "status.phase=Running";

pub struct PeerDirectoryClient<L: PodLister> {
    lister: Arc<L>,
    label_selector: String,
    namespace: String,
    metrics: DiscoveryMetrics,
}

impl<L: PodLister> PeerDirectoryClient<L> {
    pub fn new(lister: Arc<L>, config: &DiscoveryConfig, metrics: DiscoveryMetrics) -> Self {
        Self::with_namespace(lister, config, config.effective_namespace(), metrics)
    }

    pub fn with_namespace(
        lister: Arc<L>,
        config: &DiscoveryConfig,
        namespace: String,
        metrics: DiscoveryMetrics,
    ) -> Self {
        Self {
            lister,
            label_selector: config.label_selector.clone(),
            namespace,
            metrics,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn label_selector(&self) -> &str {
        &self.label_selector
    }

    pub fn list_params(&self) -> ListParams {
        ListParams::default()
            .labels(&self.label_selector)
            .fields(RUNNING_PHASE_SELECTOR)
    }

    /// Returns the running peers, or an empty directory if the API call fails.
    pub async fn list_peers(&self) -> PeerDirectory {
        match self.try_list_peers().await {
            Ok(directory) => directory,
            Err(e) => {
                error!(
                    selector = %self.label_selector,
                    namespace = %self.namespace,
                    error = %e,
                    "Error getting pods for selector"
                );
                self.metrics.count_error(ERROR_KUBERNETES_API);
                PeerDirectory::new()
            }
        }
    }

    pub async fn try_list_peers(&self) -> Result<PeerDirectory> {
        let timer = self.metrics.kubernetes_call_timer(CALL_TYPE_GET_PODS);

        let pods = match self
            .lister
            .list_pods(&self.namespace, &self.list_params())
            .await
        {
            Ok(pods) => {
                timer.observe_duration();
                pods
            }
            Err(e) => {
                timer.stop_and_discard();
                return Err(PeerpingError::PodListFailed {
                    selector: self.label_selector.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let mut directory = PeerDirectory::new();
        for pod in &pods {
            match PeerRecord::from_k8s_pod(pod) {
                Some(record) => {
                    // Only possible when listing across namespaces.
                    if let Some(previous) = directory.insert(record) {
                        debug!(
                            peer = %previous.identity,
                            replaced_pod_ip = %previous.data_address,
                            "Duplicate pod name, keeping the later pod"
                        );
                    }
                }
                None => debug!("Skipping pod without a name"),
            }
        }

        debug!(
            "Discovered {} peers in namespace {:?} for selector {}",
            directory.len(),
            self.namespace,
            self.label_selector
        );

        Ok(directory)
    }
}
