use crate::SchemaError;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const API_VERSION: &str = "v1";
pub const KIND: &str = "Config";

/// A context record: which cluster and user to talk to, and the default namespace.
///
/// `location_of_origin` records the file the record was loaded from. It is
/// never serialized and does not take part in equality.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Context {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(skip)]
    pub location_of_origin: Option<PathBuf>,
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.user == other.user
            && self.namespace == other.namespace
            && self.extensions == other.extensions
    }
}

impl Context {
    pub fn new(cluster: &str, user: &str) -> Self {
        Self {
            cluster: cluster.to_owned(),
            user: user.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_owned());
        self
    }
}

/// In-memory kubeconfig document.
///
/// Clusters and users are kept as opaque YAML values: kubecfg only edits
/// contexts and the current-context pointer, and must write everything else
/// back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub preferences: Mapping,
    pub clusters: BTreeMap<String, Value>,
    pub auth_infos: BTreeMap<String, Value>,
    pub contexts: BTreeMap<String, Context>,
    pub current_context: String,
    pub extensions: Option<Value>,
}

impl Config {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
            && self.auth_infos.is_empty()
            && self.contexts.is_empty()
            && self.current_context.is_empty()
    }

    pub fn to_yaml_string(&self) -> Result<String, SchemaError> {
        serde_yaml::to_string(&RawConfig::from(self)).map_err(SchemaError::Serialize)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(rename = "apiVersion", default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    preferences: Option<Mapping>,
    #[serde(default)]
    clusters: Option<Vec<NamedCluster>>,
    #[serde(default)]
    users: Option<Vec<NamedAuthInfo>>,
    #[serde(default)]
    contexts: Option<Vec<NamedContext>>,
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extensions: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct NamedCluster {
    name: String,
    #[serde(default)]
    cluster: Value,
}

#[derive(Debug, Deserialize, Serialize)]
struct NamedAuthInfo {
    name: String,
    #[serde(default)]
    user: Value,
}

#[derive(Debug, Deserialize, Serialize)]
struct NamedContext {
    name: String,
    #[serde(default)]
    context: Context,
}

fn collect_named<T>(
    section: &str,
    entries: Option<Vec<(String, T)>>,
) -> BTreeMap<String, T> {
    let mut map = BTreeMap::new();
    for (name, value) in entries.unwrap_or_default() {
        match map.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(slot) => {
                warn!("ignoring duplicate {section} entry '{}'", slot.key());
            }
        }
    }
    map
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let clusters = collect_named(
            "cluster",
            raw.clusters
                .map(|v| v.into_iter().map(|c| (c.name, c.cluster)).collect()),
        );
        let auth_infos = collect_named(
            "user",
            raw.users
                .map(|v| v.into_iter().map(|u| (u.name, u.user)).collect()),
        );
        let contexts = collect_named(
            "context",
            raw.contexts
                .map(|v| v.into_iter().map(|c| (c.name, c.context)).collect()),
        );
        Self {
            preferences: raw.preferences.unwrap_or_default(),
            clusters,
            auth_infos,
            contexts,
            current_context: raw.current_context.unwrap_or_default(),
            extensions: raw.extensions,
        }
    }
}

impl From<&Config> for RawConfig {
    fn from(config: &Config) -> Self {
        let clusters = config
            .clusters
            .iter()
            .map(|(name, cluster)| NamedCluster {
                name: name.clone(),
                cluster: cluster.clone(),
            })
            .collect();
        let users = config
            .auth_infos
            .iter()
            .map(|(name, user)| NamedAuthInfo {
                name: name.clone(),
                user: user.clone(),
            })
            .collect();
        let contexts = config
            .contexts
            .iter()
            .map(|(name, context)| NamedContext {
                name: name.clone(),
                context: context.clone(),
            })
            .collect();
        Self {
            api_version: Some(API_VERSION.to_owned()),
            kind: Some(KIND.to_owned()),
            preferences: Some(config.preferences.clone()),
            clusters: non_empty(clusters),
            users: non_empty(users),
            contexts: non_empty(contexts),
            current_context: Some(config.current_context.clone()),
            extensions: config.extensions.clone(),
        }
    }
}

pub fn parse_config_str(input: &str) -> Result<Config, SchemaError> {
    if input.trim().is_empty() {
        return Ok(Config::default());
    }
    let raw: RawConfig = serde_yaml::from_str(input).map_err(SchemaError::Parse)?;
    Ok(raw.into())
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<Config, SchemaError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}
