// src/fsops.rs

//! Local filesystem helpers.
//!
//! Thin, logged wrappers over `std::fs` with the creation/removal policies
//! the submitters rely on (exclusive run directories, force-recreated
//! scratch directories, unique output paths).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::errors::{Error, Result};

/// Policy for [`create_directory`] when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Create if missing, leave an existing directory alone.
    Keep,
    /// Remove an existing directory tree first, then create.
    Force,
    /// Fail with [`Error::DirectoryExists`] if the directory is present.
    MustNotExist,
}

/// Create `dir` according to `mode`. Returns whether a directory was newly
/// created.
pub fn create_directory(dir: &Path, mode: CreateMode, dry: bool) -> Result<bool> {
    if dir.is_dir() {
        match mode {
            CreateMode::Force => {
                warn!("removing dir {}", dir.display());
                if !dry {
                    fs::remove_dir_all(dir)
                        .with_context(|| format!("removing {}", dir.display()))?;
                }
            }
            CreateMode::MustNotExist => {
                return Err(Error::DirectoryExists(dir.to_path_buf()));
            }
            CreateMode::Keep => {
                info!("already exists: {}", dir.display());
                return Ok(false);
            }
        }
    }

    warn!("creating {}", dir.display());
    if !dry {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(true)
}

/// Return `path` if nothing exists there, otherwise probe `path_1`,
/// `path_2`, ... and return the first free candidate.
pub fn unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }
    let base = path.to_string_lossy();
    for attempt in 1..999 {
        let candidate = PathBuf::from(format!("{base}_{attempt}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(Error::Other(anyhow::anyhow!(
        "could not make a unique path for {} (999 attempts)",
        path.display()
    )))
}

/// Remove a file only if it exists, and log either way.
pub fn remove_file(path: &Path) -> Result<()> {
    if path.is_file() {
        warn!("removing {}", path.display());
        fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
    } else {
        info!("no file {} to remove", path.display());
    }
    Ok(())
}

/// Remove a directory tree only if it exists, and log either way.
pub fn remove_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        warn!("removing dir {}", path.display());
        fs::remove_dir_all(path).with_context(|| format!("removing {}", path.display()))?;
    } else {
        info!("no directory {} to remove", path.display());
    }
    Ok(())
}

/// Logged file copy.
pub fn copy_file(src: &Path, dst: &Path, dry: bool) -> Result<()> {
    info!("copying {} to {}", src.display(), dst.display());
    if !dry {
        fs::copy(src, dst)
            .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    }
    Ok(())
}
