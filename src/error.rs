use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeerpingError {
    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Pod listing failed for selector {selector}: {reason}")]
    PodListFailed { selector: String, reason: String },

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<prometheus::Error> for PeerpingError {
    fn from(e: prometheus::Error) -> Self {
        PeerpingError::MetricsError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PeerpingError>;
