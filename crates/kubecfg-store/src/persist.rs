use crate::access::ConfigAccess;
use crate::lock::ConfigLock;
use crate::{fsync_dir, StoreError};
use kubecfg_schema::{parse_config_file, Config, Context};
use serde_yaml::Value;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Load one kubeconfig file, stamping every context with the file it came from.
pub(crate) fn load_file(path: &Path) -> Result<Config, StoreError> {
    debug!("loading kubeconfig {}", path.display());
    let mut config = parse_config_file(path).map_err(|source| StoreError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    for context in config.contexts.values_mut() {
        context.location_of_origin = Some(path.to_path_buf());
    }
    Ok(config)
}

/// Load `path`, treating a missing file as an empty document.
pub fn load_file_or_default(path: &Path) -> Result<Config, StoreError> {
    if path.exists() {
        load_file(path)
    } else {
        Ok(Config::default())
    }
}

/// Canonical spelling of `path`, following symlinks.
///
/// A file that does not exist yet is resolved through its directory, so two
/// spellings of one location always map to the same key.
pub(crate) fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(real) = fs::canonicalize(path) {
        return real;
    }
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(parent).map_or_else(|_| path.to_path_buf(), |dir| dir.join(name))
}

fn atomic_write(target: &Path, config: &Config) -> Result<(), StoreError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let content = config.to_yaml_string()?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| StoreError::Io(e.error))?;
    fsync_dir(&dir)?;

    debug!("wrote kubeconfig {} ({} bytes)", target.display(), content.len());
    Ok(())
}

/// Replace `path` with `config` under the file's advisory lock.
///
/// A symlinked kubeconfig is written through to its target.
pub fn write_config_file(path: &Path, config: &Config) -> Result<(), StoreError> {
    let target = resolve_path(path);
    let _lock = ConfigLock::acquire(&target)?;
    atomic_write(&target, config)
}

/// Files to lock before distributing a change, in one global order.
///
/// Missing files in the search list are never written unless they are the
/// default file, so only existing ones are included.
fn lock_targets(precedence: &[PathBuf], default_file: &Path) -> BTreeSet<PathBuf> {
    let mut targets: BTreeSet<PathBuf> = precedence
        .iter()
        .filter(|p| p.exists())
        .map(|p| resolve_path(p))
        .collect();
    targets.insert(resolve_path(default_file));
    targets
}

/// Per-file documents touched while distributing a change across the
/// loading precedence. Files are loaded lazily and written only if dirty.
#[derive(Default)]
struct FileSet {
    files: BTreeMap<PathBuf, Config>,
    dirty: BTreeSet<PathBuf>,
}

impl FileSet {
    fn load(&mut self, path: &Path) -> Result<&mut Config, StoreError> {
        match self.files.entry(path.to_path_buf()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(load_file_or_default(path)?)),
        }
    }

    fn edit(&mut self, path: &Path) -> Result<&mut Config, StoreError> {
        self.dirty.insert(path.to_path_buf());
        self.load(path)
    }

    fn flush(self) -> Result<(), StoreError> {
        for path in &self.dirty {
            if let Some(config) = self.files.get(path) {
                atomic_write(path, config)?;
            }
        }
        Ok(())
    }
}

type Section<T> = fn(&mut Config) -> &mut BTreeMap<String, T>;
type Origin<T> = fn(&T) -> Option<&Path>;

fn contexts(config: &mut Config) -> &mut BTreeMap<String, Context> {
    &mut config.contexts
}

fn clusters(config: &mut Config) -> &mut BTreeMap<String, Value> {
    &mut config.clusters
}

fn auth_infos(config: &mut Config) -> &mut BTreeMap<String, Value> {
    &mut config.auth_infos
}

fn context_origin(context: &Context) -> Option<&Path> {
    context.location_of_origin.as_deref()
}

fn no_origin(_: &Value) -> Option<&Path> {
    None
}

struct Layout<'a> {
    precedence: &'a [PathBuf],
    default_file: &'a Path,
}

fn sync_section<T: Clone + PartialEq>(
    files: &mut FileSet,
    layout: &Layout<'_>,
    starting: &BTreeMap<String, T>,
    wanted: &BTreeMap<String, T>,
    section: Section<T>,
    origin: Origin<T>,
) -> Result<(), StoreError> {
    for (name, value) in wanted {
        if starting.get(name) == Some(value) {
            continue;
        }
        // The file that defines the name wins, then the file the record was
        // loaded from, then the default file.
        let mut destination = None;
        for path in layout.precedence {
            if section(files.load(path)?).contains_key(name) {
                destination = Some(path.clone());
                break;
            }
        }
        let destination = destination
            .or_else(|| origin(value).map(resolve_path))
            .unwrap_or_else(|| layout.default_file.to_path_buf());
        section(files.edit(&destination)?).insert(name.clone(), value.clone());
    }

    for name in starting.keys().filter(|name| !wanted.contains_key(*name)) {
        for path in layout.precedence {
            if section(files.load(path)?).contains_key(name) {
                section(files.edit(path)?).remove(name);
            }
        }
    }
    Ok(())
}

/// Persist `new_config` through `access`.
///
/// With an explicit file the whole document is written there. Otherwise the
/// difference against the current on-disk state is distributed over the
/// loading precedence. A changed entry goes to the file that already defines
/// its name, else to the file it was loaded from, else to the default file.
/// Removed entries are deleted from every file that has them, and
/// `current-context` goes to the first file that sets one.
pub fn modify_config<A: ConfigAccess + ?Sized>(
    access: &A,
    new_config: &Config,
) -> Result<(), StoreError> {
    if let Some(explicit) = access.explicit_file() {
        return write_config_file(&explicit, new_config);
    }

    let mut precedence: Vec<PathBuf> = Vec::new();
    for path in access.loading_precedence() {
        let path = resolve_path(&path);
        if !precedence.contains(&path) {
            precedence.push(path);
        }
    }
    let default_file = resolve_path(&access.default_filename());

    let _locks = lock_targets(&precedence, &default_file)
        .iter()
        .map(|path| ConfigLock::acquire(path))
        .collect::<Result<Vec<_>, _>>()?;

    let starting = access.starting_config()?;
    let mut files = FileSet::default();

    if starting.current_context != new_config.current_context {
        let mut destination = default_file.clone();
        for path in &precedence {
            if !files.load(path)?.current_context.is_empty() {
                destination.clone_from(path);
                break;
            }
        }
        files
            .edit(&destination)?
            .current_context
            .clone_from(&new_config.current_context);
    }

    let layout = Layout {
        precedence: &precedence,
        default_file: &default_file,
    };
    sync_section(
        &mut files,
        &layout,
        &starting.contexts,
        &new_config.contexts,
        contexts,
        context_origin,
    )?;
    sync_section(
        &mut files,
        &layout,
        &starting.clusters,
        &new_config.clusters,
        clusters,
        no_origin,
    )?;
    sync_section(
        &mut files,
        &layout,
        &starting.auth_infos,
        &new_config.auth_infos,
        auth_infos,
        no_origin,
    )?;

    files.flush()
}
