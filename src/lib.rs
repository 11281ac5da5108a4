pub mod cli;
pub mod config;
pub mod error;
pub mod k8s;
pub mod metrics;

pub use error::{PeerpingError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
