use crate::persist::{load_file, modify_config};
use crate::StoreError;
use kubecfg_schema::Config;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the kubeconfig search list.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";
/// Default kubeconfig location, relative to the home directory.
pub const RECOMMENDED_HOME_FILE: &str = ".kube/config";

/// Resolves, loads, and persists the kubeconfig a command operates on.
///
/// Commands receive this as `&dyn ConfigAccess` instead of consulting the
/// environment themselves, so tests can substitute an in-memory double.
pub trait ConfigAccess {
    /// Files consulted when no explicit file is set, highest priority first.
    fn loading_precedence(&self) -> Vec<PathBuf>;

    /// The merged document as it currently exists on disk.
    fn starting_config(&self) -> Result<Config, StoreError>;

    /// File that receives new entries when no existing file owns them.
    fn default_filename(&self) -> PathBuf;

    fn is_explicit_file(&self) -> bool;

    fn explicit_file(&self) -> Option<PathBuf>;

    /// Persist `config` in full.
    fn modify(&self, config: &Config) -> Result<(), StoreError> {
        modify_config(self, config)
    }
}

/// Filesystem-backed [`ConfigAccess`]: `--kubeconfig`, then `KUBECONFIG`,
/// then `~/.kube/config`.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    explicit_file: Option<PathBuf>,
    env_files: Vec<PathBuf>,
    global_file: Option<PathBuf>,
}

impl PathOptions {
    pub fn new(
        explicit_file: Option<PathBuf>,
        kubeconfig_env: Option<&OsStr>,
        home: Option<&Path>,
    ) -> Self {
        let explicit_file = explicit_file.filter(|p| !p.as_os_str().is_empty());

        let mut env_files: Vec<PathBuf> = Vec::new();
        if let Some(value) = kubeconfig_env {
            for path in std::env::split_paths(value) {
                if path.as_os_str().is_empty() || env_files.contains(&path) {
                    continue;
                }
                env_files.push(path);
            }
        }

        Self {
            explicit_file,
            env_files,
            global_file: home.map(|h| h.join(RECOMMENDED_HOME_FILE)),
        }
    }

    /// Build from the process environment (`KUBECONFIG`, `HOME`).
    pub fn from_env(explicit_file: Option<PathBuf>) -> Self {
        let env = std::env::var_os(KUBECONFIG_ENV);
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::new(explicit_file, env.as_deref(), home.as_deref())
    }
}

impl ConfigAccess for PathOptions {
    fn loading_precedence(&self) -> Vec<PathBuf> {
        if let Some(explicit) = &self.explicit_file {
            return vec![explicit.clone()];
        }
        if !self.env_files.is_empty() {
            return self.env_files.clone();
        }
        self.global_file.iter().cloned().collect()
    }

    fn starting_config(&self) -> Result<Config, StoreError> {
        if let Some(explicit) = &self.explicit_file {
            if !explicit.exists() {
                return Err(StoreError::ExplicitFileMissing(explicit.clone()));
            }
            return load_file(explicit);
        }

        let precedence = self.loading_precedence();
        if precedence.is_empty() {
            return Err(StoreError::NoHomeDir);
        }

        let mut merged = Config::default();
        for path in &precedence {
            if !path.exists() {
                debug!("skipping missing kubeconfig {}", path.display());
                continue;
            }
            let config = load_file(path)?;
            merge_first_wins(&mut merged, config);
        }
        Ok(merged)
    }

    fn default_filename(&self) -> PathBuf {
        if let Some(explicit) = &self.explicit_file {
            return explicit.clone();
        }
        match self.env_files.as_slice() {
            [] => {}
            [only] => return only.clone(),
            files => {
                return files
                    .iter()
                    .find(|p| p.exists())
                    .or_else(|| files.last())
                    .cloned()
                    .unwrap_or_default();
            }
        }
        self.global_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(RECOMMENDED_HOME_FILE))
    }

    fn is_explicit_file(&self) -> bool {
        self.explicit_file.is_some()
    }

    fn explicit_file(&self) -> Option<PathBuf> {
        self.explicit_file.clone()
    }
}

/// Fold `next` into `merged`; values already present in `merged` win.
pub(crate) fn merge_first_wins(merged: &mut Config, next: Config) {
    for (name, cluster) in next.clusters {
        merged.clusters.entry(name).or_insert(cluster);
    }
    for (name, user) in next.auth_infos {
        merged.auth_infos.entry(name).or_insert(user);
    }
    for (name, context) in next.contexts {
        merged.contexts.entry(name).or_insert(context);
    }
    if merged.current_context.is_empty() {
        merged.current_context = next.current_context;
    }
    if merged.preferences.is_empty() {
        merged.preferences = next.preferences;
    }
    if merged.extensions.is_none() {
        merged.extensions = next.extensions;
    }
}
