//! Detection of the namespace this process runs in.
//!
//! Kubernetes mounts the service account namespace into every pod. Outside a
//! cluster the file is absent and the namespace resolves to an empty string.

use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

static POD_NAMESPACE: OnceLock<String> = OnceLock::new();

/// Namespace of the current pod, read once per process.
pub fn pod_namespace() -> &'static str {
    POD_NAMESPACE.get_or_init(|| read_namespace(Path::new(SERVICE_ACCOUNT_NAMESPACE_PATH)))
}

/// Reads a namespace file, returning an empty string if it can't be read.
///
/// Trailing whitespace is trimmed; namespace names never contain it.
pub fn read_namespace(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let namespace = contents.trim_end().to_string();
            debug!(path = %path.display(), namespace = %namespace, "Detected pod namespace");
            namespace
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unable to determine namespace");
            String::new()
        }
    }
}
