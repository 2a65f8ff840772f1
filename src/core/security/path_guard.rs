use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::config::SecurityConfig;

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Path '{path}' may not contain '..' below an existing directory")]
    ParentTraversal { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Resolves an existing path and checks it against the sandbox root.
///
/// Relative paths are resolved against the process working directory. When a
/// root is configured the canonical path must lie inside it; symlinks that
/// leave the root are rejected when `allow_symlinks` is false.
pub fn validate_path(input_path: &str, security: &SecurityConfig) -> Result<PathBuf, PathSecurityError> {
    let path = Path::new(input_path);

    let Some(root) = &security.root_path else {
        return canonicalize_path(path);
    };
    let canonical_root = canonical_root(root)?;

    if !path.exists() {
        return Err(PathSecurityError::PathNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_symlink() && !security.allow_symlinks {
        let target = path.read_link().map_err(|e| PathSecurityError::IoError {
            path: path.to_path_buf(),
            error: e,
        })?;
        let target = match (target.is_relative(), path.parent()) {
            (true, Some(parent)) => parent.join(target),
            _ => target,
        };
        let canonical_target =
            canonicalize_path(&target).map_err(|_| PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            })?;
        if !canonical_target.starts_with(&canonical_root) {
            return Err(PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            });
        }
    }

    let canonical_path = canonicalize_path(path)?;
    if !canonical_path.starts_with(&canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_path,
            root: canonical_root,
        });
    }

    Ok(canonical_path)
}

/// Resolves a path that may not exist yet, such as a write target.
///
/// The nearest existing ancestor is canonicalized and checked against the
/// root; the missing tail is appended as given and may not contain `..`.
pub fn validate_new_path(input_path: &str, security: &SecurityConfig) -> Result<PathBuf, PathSecurityError> {
    let path = Path::new(input_path);
    if path.exists() {
        return validate_path(input_path, security);
    }

    let absolute = std::path::absolute(path).map_err(|e| PathSecurityError::IoError {
        path: path.to_path_buf(),
        error: e,
    })?;

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        match existing.components().next_back() {
            Some(Component::Normal(name)) => tail.push(name.to_os_string()),
            Some(Component::ParentDir) => {
                return Err(PathSecurityError::ParentTraversal { path: absolute.clone() });
            }
            _ => return Err(PathSecurityError::PathNotFound { path: absolute.clone() }),
        }
        existing = existing
            .parent()
            .ok_or_else(|| PathSecurityError::PathNotFound { path: absolute.clone() })?;
    }

    let base = match existing.to_str() {
        Some(existing) => validate_path(existing, security)?,
        None => canonicalize_path(existing)?,
    };

    Ok(tail.into_iter().rev().fold(base, |acc, part| acc.join(part)))
}

fn canonical_root(root: &Path) -> Result<PathBuf, PathSecurityError> {
    root.canonicalize().map_err(|e| PathSecurityError::IoError {
        path: root.to_path_buf(),
        error: e,
    })
}

fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}
