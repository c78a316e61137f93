//! Kubeconfig document model for kubecfg.
//!
//! This crate defines the in-memory `Config` (name-keyed maps of contexts,
//! clusters and users plus the `current-context` pointer) and converts it to
//! and from the kubeconfig v1 YAML layout, where named entries are stored as
//! lists of `{name, <record>}` objects.

pub mod document;

pub use document::{parse_config_file, parse_config_str, Config, Context, API_VERSION, KIND};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read kubeconfig: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse kubeconfig: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("failed to serialize kubeconfig: {0}")]
    Serialize(#[source] serde_yaml::Error),
}
