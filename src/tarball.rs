// src/tarball.rs

//! Git-based code tarballs.
//!
//! A "code tarball" is the committed state of a repository's top-level
//! directory, packaged with `git archive`. Dirty working trees are refused:
//! a tarball with half-committed changes is almost never what anyone wants
//! shipped to a few hundred batch jobs.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{error, info};

use crate::errors::{Error, Result};
use crate::exec::Cmd;

/// Top-level directory of the git repository containing `path`.
///
/// `path` may be a file; its parent directory is used in that case.
pub fn repo_toplevel(path: &Path) -> Result<PathBuf> {
    let dir = if path.is_file() {
        path.parent()
            .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?
    } else {
        path
    };
    let lines = Cmd::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .run()?;
    let toplevel = lines
        .first()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("git rev-parse --show-toplevel produced no output"))?;
    Ok(PathBuf::from(toplevel))
}

/// Fail with [`Error::DirtyWorkingTree`] if `toplevel` has uncommitted
/// changes.
pub fn ensure_clean(toplevel: &Path) -> Result<()> {
    let check = Cmd::new("git")
        .args(["diff-index", "--quiet", "HEAD", "--"])
        .current_dir(toplevel)
        .run();
    match check {
        Ok(_) => Ok(()),
        Err(Error::CommandFailed { .. }) => {
            error!(
                "uncommitted changes detected; it is unlikely you want a tarball \
                 with some changes not committed"
            );
            Err(Error::DirtyWorkingTree(toplevel.to_path_buf()))
        }
        Err(err) => Err(err),
    }
}

/// Archive the committed HEAD state of the repository containing `path`.
///
/// The default output file is `<toplevel basename>.tar` in the current
/// working directory. Returns the absolute path of the written tarball.
pub fn create_tarball(path: &Path, outfile: Option<&Path>, dry: bool) -> Result<PathBuf> {
    if dry {
        info!("dry mode: would create tarball for {}", path.display());
        return Ok(PathBuf::from("path/to/tarball.tar"));
    }
    if !path.exists() {
        return Err(anyhow!("{} is not a valid path", path.display()).into());
    }

    let toplevel = repo_toplevel(path)?;

    let outfile = match outfile {
        Some(f) => f.to_path_buf(),
        None => {
            let basename = toplevel
                .file_name()
                .ok_or_else(|| anyhow!("cannot name a tarball after {}", toplevel.display()))?;
            let mut name = basename.to_os_string();
            name.push(".tar");
            env::current_dir()?.join(name)
        }
    };
    let outfile = if outfile.is_absolute() {
        outfile
    } else {
        env::current_dir()?.join(outfile)
    };

    ensure_clean(&toplevel)?;

    Cmd::new("git")
        .arg("archive")
        .arg("-o")
        .arg(outfile.to_string_lossy())
        .arg("HEAD")
        .current_dir(&toplevel)
        .run()?;
    info!("created tarball {}", outfile.display());
    Ok(outfile)
}
