use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The minimal view of a peer pod needed to ping it and keep track of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Pod name, unique within a discovery snapshot.
    pub identity: String,
    /// Pod IP; empty if the kubelet has not reported one yet.
    pub data_address: String,
    /// IP of the node carrying the pod; empty if not reported yet.
    pub host_address: String,
}

impl PeerRecord {
    /// Projects a pod into a record. Returns `None` for pods without a name,
    /// since they cannot be keyed in a directory.
    pub fn from_k8s_pod(pod: &Pod) -> Option<Self> {
        let identity = pod.metadata.name.clone()?;
        let status = pod.status.as_ref();

        Some(Self {
            identity,
            data_address: status.and_then(|s| s.pod_ip.clone()).unwrap_or_default(),
            host_address: status.and_then(|s| s.host_ip.clone()).unwrap_or_default(),
        })
    }
}

/// Snapshot of discovered peers keyed by identity.
///
/// Records can only be added through [`PeerDirectory::insert`], which keys
/// them by their own identity, so every key matches its record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PeerDirectory {
    peers: HashMap<String, PeerRecord>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any previous record with the same identity.
    pub fn insert(&mut self, record: PeerRecord) -> Option<PeerRecord> {
        self.peers.insert(record.identity.clone(), record)
    }

    pub fn get(&self, identity: &str) -> Option<&PeerRecord> {
        self.peers.get(identity)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.peers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PeerRecord)> {
        self.peers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Records sorted by identity, for stable output.
    pub fn sorted(&self) -> Vec<&PeerRecord> {
        let mut records: Vec<&PeerRecord> = self.peers.values().collect();
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        records
    }
}

impl FromIterator<PeerRecord> for PeerDirectory {
    fn from_iter<I: IntoIterator<Item = PeerRecord>>(iter: I) -> Self {
        let mut directory = PeerDirectory::new();
        for record in iter {
            directory.insert(record);
        }
        directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn pod(name: Option<&str>, pod_ip: Option<&str>, host_ip: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: name.map(str::to_string),
                ..Default::default()
            },
            status: Some(PodStatus {
                pod_ip: pod_ip.map(str::to_string),
                host_ip: host_ip.map(str::to_string),
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_k8s_pod() {
        let record = PeerRecord::from_k8s_pod(&pod(
            Some("peerping-abc"),
            Some("10.0.0.1"),
            Some("192.168.1.1"),
        ))
        .expect("named pod should project");

        assert_eq!(record.identity, "peerping-abc");
        assert_eq!(record.data_address, "10.0.0.1");
        assert_eq!(record.host_address, "192.168.1.1");
    }

    #[test]
    fn test_from_k8s_pod_missing_addresses() {
        let record = PeerRecord::from_k8s_pod(&pod(Some("pending"), None, None))
            .expect("named pod should project");
        assert_eq!(record.data_address, "");
        assert_eq!(record.host_address, "");

        let mut bare = pod(Some("no-status"), None, None);
        bare.status = None;
        let record = PeerRecord::from_k8s_pod(&bare).expect("named pod should project");
        assert_eq!(record.data_address, "");
    }

    #[test]
    fn test_from_k8s_pod_without_name() {
        assert!(PeerRecord::from_k8s_pod(&pod(None, Some("10.0.0.1"), None)).is_none());
    }

    #[test]
    fn test_directory_keys_match_identity() {
        let directory: PeerDirectory = ["b", "a", "c"]
            .iter()
            .map(|name| PeerRecord {
                identity: name.to_string(),
                data_address: String::new(),
                host_address: String::new(),
            })
            .collect();

        assert_eq!(directory.len(), 3);
        for (key, record) in directory.iter() {
            assert_eq!(key, record.identity);
        }

        let order: Vec<&str> = directory.sorted().iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_directory_serializes_as_map() {
        let mut directory = PeerDirectory::new();
        directory.insert(PeerRecord {
            identity: "p1".to_string(),
            data_address: "10.0.0.1".to_string(),
            host_address: "192.168.1.1".to_string(),
        });

        let json = serde_json::to_value(&directory).expect("directory should serialize");
        assert_eq!(json["p1"]["data_address"], "10.0.0.1");
        assert_eq!(json["p1"]["identity"], "p1");
    }
}
