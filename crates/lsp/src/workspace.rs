//! Script file discovery under a workspace root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::VeroConfig;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// All script files under `root`, sorted. `root` may itself be a script file.
/// Directories named in `workspace.exclude` are skipped.
pub fn find_script_files(root: &Path, config: &VeroConfig) -> Result<Vec<PathBuf>, WorkspaceError> {
    if !root.exists() {
        return Err(WorkspaceError::NotFound(root.to_path_buf()));
    }
    let mut files = Vec::new();
    if root.is_file() {
        if config.is_script(root) {
            files.push(root.to_path_buf());
        }
        return Ok(files);
    }
    walk(root, config, &mut files, &mut HashSet::new())?;
    files.sort();
    Ok(files)
}

/// Directories are visited once by canonical path, so symlink cycles end.
fn walk(
    dir: &Path,
    config: &VeroConfig,
    files: &mut Vec<PathBuf>,
    visited: &mut HashSet<PathBuf>,
) -> Result<(), WorkspaceError> {
    if !visited.insert(normalize_path(dir)) {
        tracing::debug!(dir = %dir.display(), "directory already visited");
        return Ok(());
    }
    let entries = std::fs::read_dir(dir).map_err(|source| WorkspaceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let skip = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| config.is_excluded(n));
            if !skip {
                walk(&path, config, files, visited)?;
            }
        } else if config.is_script(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Canonical form of `path`. A path that no longer exists keeps its file
/// name under the canonical parent, or is returned unchanged.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Read a script, mapping the I/O error to [`WorkspaceError`].
pub fn read_script(path: &Path) -> Result<String, WorkspaceError> {
    std::fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_sorted_and_skips_excluded_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("pages")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("pages/login.vero"), "PAGE Login {}\n").unwrap();
        std::fs::write(root.join("checkout.vero"), "").unwrap();
        std::fs::write(root.join("notes.md"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/x.vero"), "").unwrap();

        let files = find_script_files(root, &VeroConfig::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["checkout.vero", "pages/login.vero"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycles_are_walked_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("pages")).unwrap();
        std::fs::write(root.join("pages/login.vero"), "PAGE Login {}\n").unwrap();
        std::os::unix::fs::symlink(root, root.join("pages/back")).unwrap();

        let files = find_script_files(root, &VeroConfig::default()).unwrap();
        assert_eq!(files.len(), 1, "{:?}", files);
    }

    #[test]
    fn normalize_keeps_missing_file_under_canonical_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("gone.vero");
        let normalized = normalize_path(&missing);
        assert_eq!(normalized, dir.path().canonicalize().unwrap().join("gone.vero"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = find_script_files(Path::new("/definitely/not/here"), &VeroConfig::default());
        assert!(matches!(err, Err(WorkspaceError::NotFound(_))));
    }
}
