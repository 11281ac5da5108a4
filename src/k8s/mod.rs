pub mod client;
pub mod discovery;
pub mod namespace;
pub mod types;

pub use client::{K8sClient, PodLister};
pub use discovery::PeerDirectoryClient;
pub use namespace::pod_namespace;
pub use types::{PeerDirectory, PeerRecord};
