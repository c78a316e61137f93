use crate::access::ConfigAccess;
use crate::StoreError;
use kubecfg_schema::Config;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    config: Config,
    loads: usize,
    writes: usize,
    fail_writes: bool,
}

/// In-memory [`ConfigAccess`] that counts loads and writes.
pub struct MockAccess {
    state: Mutex<MockState>,
    file: PathBuf,
    explicit: bool,
}

impl MockAccess {
    pub fn new(config: Config) -> Self {
        Self {
            state: Mutex::new(MockState {
                config,
                ..MockState::default()
            }),
            file: PathBuf::from("/mock/.kube/config"),
            explicit: false,
        }
    }

    /// Report `file` as the explicit `--kubeconfig` file.
    #[must_use]
    pub fn with_explicit_file(mut self, file: &str) -> Self {
        self.file = PathBuf::from(file);
        self.explicit = true;
        self
    }

    /// Make every subsequent `modify` fail with an I/O error.
    #[must_use]
    pub fn failing_writes(self) -> Self {
        self.with_state(|s| s.fail_writes = true);
        self
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn config(&self) -> Config {
        self.with_state(|s| s.config.clone())
    }

    pub fn loads(&self) -> usize {
        self.with_state(|s| s.loads)
    }

    pub fn writes(&self) -> usize {
        self.with_state(|s| s.writes)
    }
}

impl ConfigAccess for MockAccess {
    fn loading_precedence(&self) -> Vec<PathBuf> {
        vec![self.file.clone()]
    }

    fn starting_config(&self) -> Result<Config, StoreError> {
        Ok(self.with_state(|s| {
            s.loads += 1;
            s.config.clone()
        }))
    }

    fn default_filename(&self) -> PathBuf {
        if self.explicit {
            PathBuf::from("/mock/.kube/config")
        } else {
            self.file.clone()
        }
    }

    fn is_explicit_file(&self) -> bool {
        self.explicit
    }

    fn explicit_file(&self) -> Option<PathBuf> {
        self.explicit.then(|| self.file.clone())
    }

    fn modify(&self, config: &Config) -> Result<(), StoreError> {
        self.with_state(|s| {
            if s.fail_writes {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only file system",
                )));
            }
            s.writes += 1;
            s.config = config.clone();
            Ok(())
        })
    }
}
