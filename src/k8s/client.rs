use crate::{PeerpingError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::{debug, info};

/// Read access to pods, the one control-plane call peer discovery needs.
#[async_trait]
pub trait PodLister: Send + Sync {
    /// Lists pods in `namespace`, or across all namespaces when it is empty.
    async fn list_pods(&self, namespace: &str, params: &ListParams) -> Result<Vec<Pod>>;
}

#[derive(Clone)]
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    pub async fn try_default() -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let client = Client::try_default().await.map_err(|e| {
            PeerpingError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn pods_all(&self) -> Api<Pod> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl PodLister for K8sClient {
    async fn list_pods(&self, namespace: &str, params: &ListParams) -> Result<Vec<Pod>> {
        let pods = if namespace.is_empty() {
            self.pods_all()
        } else {
            self.pods(namespace)
        };

        let pod_list = pods
            .list(params)
            .await
            .map_err(|e| PeerpingError::KubernetesError(format!("Failed to list pods: {}", e)))?;

        Ok(pod_list.items)
    }
}
