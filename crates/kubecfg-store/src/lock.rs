use crate::StoreError;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, Metadata, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Exclusive advisory lock guarding writes to one kubeconfig file.
///
/// The lock is taken on a sibling `<file>.lock` so the kubeconfig itself can
/// be replaced by rename while the lock is held. The lock file only exists
/// while the lock is held: it is unlinked on release, and a waiter that wakes
/// up holding an unlinked inode retries on a fresh file.
pub struct ConfigLock {
    lock_file: File,
    path: PathBuf,
}

pub fn lock_path_for(config_file: &Path) -> PathBuf {
    let mut name = OsString::from(config_file.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn open_lock_file(lock_path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|source| StoreError::Lock {
            path: lock_path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn same_inode(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_: &Metadata, _: &Metadata) -> bool {
    true
}

/// True if `file` is still the one linked at `path`.
fn still_linked(file: &File, path: &Path) -> bool {
    match (file.metadata(), std::fs::metadata(path)) {
        (Ok(held), Ok(current)) => same_inode(&held, &current),
        _ => false,
    }
}

impl ConfigLock {
    /// Block until the lock for `config_file` is held.
    pub fn acquire(config_file: &Path) -> Result<Self, StoreError> {
        let path = lock_path_for(config_file);
        loop {
            let file = open_lock_file(&path)?;
            file.lock_exclusive().map_err(|source| StoreError::Lock {
                path: path.clone(),
                source,
            })?;
            if still_linked(&file, &path) {
                trace!("locked {}", path.display());
                return Ok(Self {
                    lock_file: file,
                    path,
                });
            }
            trace!("{} was released and removed, retrying", path.display());
        }
    }
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        // Unlink before unlocking so a waiter never sees a linked, unlocked file.
        let _ = std::fs::remove_file(&self.path);
        let _ = self.lock_file.unlock();
        trace!("unlocked {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn is_locked(config: &Path) -> bool {
        match File::open(lock_path_for(config)) {
            Ok(file) => file.try_lock_exclusive().is_err(),
            Err(_) => false,
        }
    }

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("/home/u/.kube/config")),
            PathBuf::from("/home/u/.kube/config.lock")
        );
    }

    #[test]
    fn lock_file_exists_only_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config");

        let lock = ConfigLock::acquire(&config).unwrap();
        assert!(lock_path_for(&config).exists());
        assert!(!config.exists());

        drop(lock);
        assert!(!lock_path_for(&config).exists());
    }

    #[test]
    fn lock_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("nested").join(".kube").join("config");

        let _lock = ConfigLock::acquire(&config).unwrap();
        assert!(dir.path().join("nested/.kube/config.lock").exists());
    }

    #[test]
    fn held_lock_excludes_other_handles() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config");

        let _lock = ConfigLock::acquire(&config).unwrap();
        assert!(is_locked(&config));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config");

        {
            let _lock = ConfigLock::acquire(&config).unwrap();
        }

        assert!(!is_locked(&config));
        let _again = ConfigLock::acquire(&config).unwrap();
    }

    #[test]
    fn waiter_acquires_after_holder_releases() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config");

        let held = ConfigLock::acquire(&config).unwrap();
        let waiter_config = config.clone();
        let waiter = std::thread::spawn(move || {
            let lock = ConfigLock::acquire(&waiter_config).unwrap();
            let linked = lock_path_for(&waiter_config).exists();
            drop(lock);
            linked
        });

        std::thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap());
        assert!(!lock_path_for(&config).exists());
    }
}
