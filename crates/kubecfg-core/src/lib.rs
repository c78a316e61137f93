//! Kubeconfig editing operations for kubecfg.
//!
//! Each operation follows the same three phases: `complete` turns raw
//! positional arguments into options, `validate` rejects bad input before any
//! I/O, and `run` loads the document through a [`ConfigAccess`], applies the
//! change, and persists it in one write.
//!
//! [`ConfigAccess`]: kubecfg_store::ConfigAccess

pub mod rename;

pub use rename::{rename_context, RenameContextOptions, RenameOutcome};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`RenameError`], for exit codes and callers
/// that need to branch without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Validation,
    NotFound,
    Collision,
    Io,
}

/// Positional arguments as the user typed them, rendered `[a b c]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args(pub Vec<String>);

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(" "))
    }
}

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Unexpected args: {args}")]
    Usage { args: Args },
    #[error("You must specify a new non-empty context name")]
    EmptyNewName,
    #[error("cannot rename the context {name:?}, it's not in {}", .file.display())]
    ContextNotFound { name: String, file: PathBuf },
    #[error(
        "cannot rename the context {name:?}, the context {new_name:?} already exists in {}",
        .file.display()
    )]
    ContextExists {
        name: String,
        new_name: String,
        file: PathBuf,
    },
    #[error(transparent)]
    Config(#[from] kubecfg_store::StoreError),
}

impl RenameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenameError::Usage { .. } => ErrorKind::Usage,
            RenameError::EmptyNewName => ErrorKind::Validation,
            RenameError::ContextNotFound { .. } => ErrorKind::NotFound,
            RenameError::ContextExists { .. } => ErrorKind::Collision,
            RenameError::Config(_) => ErrorKind::Io,
        }
    }
}
