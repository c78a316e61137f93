use crate::{Args, RenameError};
use kubecfg_schema::Config;
use kubecfg_store::ConfigAccess;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for `config rename-context CONTEXT_NAME NEW_NAME`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameContextOptions {
    pub context_name: String,
    pub new_name: String,
}

/// What a successful rename did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub context_name: String,
    pub new_name: String,
    pub file: PathBuf,
    pub current_context_updated: bool,
}

impl RenameContextOptions {
    /// Build options from exactly two positional arguments.
    pub fn complete<S: AsRef<str>>(args: &[S]) -> Result<Self, RenameError> {
        match args {
            [context_name, new_name] => Ok(Self {
                context_name: context_name.as_ref().to_owned(),
                new_name: new_name.as_ref().to_owned(),
            }),
            _ => Err(RenameError::Usage {
                args: Args(args.iter().map(|a| a.as_ref().to_owned()).collect()),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), RenameError> {
        if self.new_name.is_empty() {
            return Err(RenameError::EmptyNewName);
        }
        Ok(())
    }

    /// Move the entry in `config` from `context_name` to `new_name`.
    ///
    /// `config` is left untouched on error. Returns whether the
    /// current-context pointer was moved along with the entry.
    pub fn apply(&self, config: &mut Config, file: &Path) -> Result<bool, RenameError> {
        if !config.contexts.contains_key(&self.context_name) {
            return Err(RenameError::ContextNotFound {
                name: self.context_name.clone(),
                file: file.to_path_buf(),
            });
        }
        if config.contexts.contains_key(&self.new_name) {
            return Err(RenameError::ContextExists {
                name: self.context_name.clone(),
                new_name: self.new_name.clone(),
                file: file.to_path_buf(),
            });
        }

        if let Some(context) = config.contexts.remove(&self.context_name) {
            config.contexts.insert(self.new_name.clone(), context);
        }

        let moved_current = config.current_context == self.context_name;
        if moved_current {
            config.current_context.clone_from(&self.new_name);
        }
        Ok(moved_current)
    }

    pub fn run(&self, access: &dyn ConfigAccess) -> Result<RenameOutcome, RenameError> {
        let mut config = access.starting_config()?;

        let file = access
            .explicit_file()
            .filter(|_| access.is_explicit_file())
            .unwrap_or_else(|| access.default_filename());
        debug!(
            "renaming context in {} ({} contexts loaded)",
            file.display(),
            config.contexts.len()
        );

        let current_context_updated = self.apply(&mut config, &file)?;
        access.modify(&config)?;

        info!(
            "renamed context '{}' to '{}'",
            self.context_name, self.new_name
        );
        Ok(RenameOutcome {
            context_name: self.context_name.clone(),
            new_name: self.new_name.clone(),
            file,
            current_context_updated,
        })
    }
}

/// Parse, validate, and execute a rename from raw positional arguments.
pub fn rename_context<S: AsRef<str>>(
    access: &dyn ConfigAccess,
    args: &[S],
) -> Result<RenameOutcome, RenameError> {
    let options = RenameContextOptions::complete(args)?;
    options.validate()?;
    options.run(access)
}
