//! Kubeconfig file discovery, loading, and persistence for kubecfg.
//!
//! This crate provides the `ConfigAccess` seam used by commands, its real
//! implementation `PathOptions` (explicit `--kubeconfig` file, `KUBECONFIG`
//! search list, or `~/.kube/config`), merged loading across the search list,
//! and `modify_config`, which writes changes back to the file that owns each
//! entry under an advisory lock with atomic replace.

pub mod access;
pub mod lock;
pub mod mock;
pub mod persist;

pub use access::{ConfigAccess, PathOptions, KUBECONFIG_ENV, RECOMMENDED_HOME_FILE};
pub use lock::{lock_path_for, ConfigLock};
pub use mock::MockAccess;
pub use persist::{load_file_or_default, modify_config, write_config_file};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` into it is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("kubeconfig I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error loading config file \"{path}\": {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: kubecfg_schema::SchemaError,
    },
    #[error(transparent)]
    Schema(#[from] kubecfg_schema::SchemaError),
    #[error("stat {0}: no such file or directory")]
    ExplicitFileMissing(PathBuf),
    #[error("unable to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot locate ~/.kube/config: HOME is not set")]
    NoHomeDir,
}
