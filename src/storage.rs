// src/storage.rs

//! Storage-element access through the xrootd command-line tools.
//!
//! Remote paths have the shape `root://<mgm>//store/...`: a manager endpoint
//! (MGM) followed by a logical file name (LFN) that always starts with
//! `/store`. [`split_mgm`] takes such a path apart; [`SeClient`] resolves
//! user-supplied paths (with or without an mgm) and wraps `xrdfs` / `xrdcp`
//! for directory creation, existence checks, listing and copies.
//!
//! Every operation is one external call plus exit-code translation.
//! Existence checks treat a non-zero exit as "no"; everything else treats it
//! as a failure.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::exec::Cmd;

/// Required first segment of every logical file name.
pub const STORE_PREFIX: &str = "/store";

/// A storage path split into manager endpoint and logical file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SePath {
    pub mgm: String,
    pub lfn: String,
}

impl fmt::Display for SePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The canonical xrootd form keeps the LFN's leading slash after the
        // endpoint: root://host//store/...
        let sep = if self.mgm.ends_with('/') { "" } else { "/" };
        write!(f, "{}{}{}", self.mgm, sep, self.lfn)
    }
}

/// Split a `root://...` path at its `/store` segment.
pub fn split_mgm(path: &str) -> Result<SePath> {
    if !path.starts_with("root://") {
        return Err(Error::InvalidPath(format!(
            "cannot split mgm from '{path}': missing 'root://' prefix"
        )));
    }
    let Some(i) = path.find(STORE_PREFIX) else {
        return Err(Error::InvalidPath(format!(
            "no substring '{STORE_PREFIX}' in '{path}'"
        )));
    };
    Ok(SePath {
        mgm: path[..i].to_string(),
        lfn: path[i..].to_string(),
    })
}

/// Client for one storage element, wrapping `xrdfs` and `xrdcp`.
#[derive(Debug, Clone)]
pub struct SeClient {
    default_mgm: String,
}

impl SeClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            default_mgm: settings.storage.default_mgm.clone(),
        }
    }

    /// Resolve the mgm and lfn the caller most likely intended.
    ///
    /// - A path starting with `root://` carries its own mgm, which must not
    ///   conflict with an explicitly passed one.
    /// - A bare LFN takes the explicit mgm, or the configured default.
    ///
    /// The resulting LFN must start with `/store`.
    pub fn resolve(&self, path: &str, mgm: Option<&str>) -> Result<SePath> {
        let resolved = if path.starts_with("root://") {
            let parsed = split_mgm(path)?;
            if let Some(given) = mgm {
                if trim_mgm(given) != trim_mgm(&parsed.mgm) {
                    return Err(Error::MgmMismatch {
                        path_mgm: parsed.mgm,
                        given_mgm: given.to_string(),
                    });
                }
            }
            parsed
        } else {
            SePath {
                mgm: mgm.unwrap_or(&self.default_mgm).to_string(),
                lfn: path.to_string(),
            }
        };

        if trim_mgm(&resolved.mgm) != trim_mgm(&self.default_mgm) {
            warn!(
                "using mgm {}, which is not the default mgm {}",
                resolved.mgm, self.default_mgm
            );
        }
        if !resolved.lfn.starts_with(STORE_PREFIX) {
            return Err(Error::InvalidPath(format!(
                "LFN '{}' does not start with '{STORE_PREFIX}'",
                resolved.lfn
            )));
        }
        Ok(resolved)
    }

    /// Format a user-supplied path as a full `root://.../store/...` string.
    pub fn format(&self, path: &str, mgm: Option<&str>) -> Result<String> {
        Ok(self.resolve(path, mgm)?.to_string())
    }

    /// Create a directory on the storage element (`mkdir -p` semantics).
    pub fn create_directory(&self, directory: &str) -> Result<()> {
        let path = self.resolve(directory, None)?;
        warn!("creating directory on SE: {path}");
        self.mkdir(&path)
    }

    /// Whether `directory` exists on the storage element as a directory.
    pub fn is_directory(&self, directory: &str) -> Result<bool> {
        let path = self.resolve(directory, None)?;
        let (code, _) = Cmd::new("xrdfs")
            .arg(trim_mgm(&path.mgm))
            .args(["stat", "-q", "IsDir"])
            .arg(&path.lfn)
            .run_unchecked()?;
        if code != 0 {
            info!("directory {path} does not exist");
        }
        Ok(code == 0)
    }

    /// Whether `path` exists on the storage element at all.
    pub fn exists(&self, path: &str) -> Result<bool> {
        let path = self.resolve(path, None)?;
        let (code, _) = Cmd::new("xrdfs")
            .arg(trim_mgm(&path.mgm))
            .arg("stat")
            .arg(&path.lfn)
            .run_unchecked()?;
        Ok(code == 0)
    }

    /// Copy a local file to the storage element.
    pub fn copy_to_se(&self, src: &Path, dst: &str, create_parent_directory: bool) -> Result<()> {
        let dst = self.resolve(dst, None)?;
        if create_parent_directory {
            if let Some(parent) = Path::new(&dst.lfn).parent() {
                let parent = SePath {
                    mgm: dst.mgm.clone(),
                    lfn: parent.to_string_lossy().into_owned(),
                };
                self.mkdir(&parent)?;
            }
        }
        warn!("copying {} to {dst}", src.display());
        Cmd::new("xrdcp")
            .arg("-s")
            .arg(src.to_string_lossy())
            .arg(dst.to_string())
            .run()?;
        Ok(())
    }

    /// Copy a file from the storage element to a local path.
    pub fn copy_from_se(&self, src: &str, dst: &Path) -> Result<()> {
        let src = self.resolve(src, None)?;
        warn!("copying {src} to {}", dst.display());
        Cmd::new("xrdcp")
            .arg("-s")
            .arg(src.to_string())
            .arg(dst.to_string_lossy())
            .run()?;
        Ok(())
    }

    /// List all entries in a directory on the storage element.
    pub fn list_directory(&self, directory: &str) -> Result<Vec<String>> {
        let path = self.resolve(directory, None)?;
        let contents = Cmd::new("xrdfs")
            .arg(trim_mgm(&path.mgm))
            .arg("ls")
            .arg(&path.lfn)
            .run()?;
        Ok(contents
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// List all `.root` files in a directory, sorted.
    pub fn list_root_files(&self, directory: &str) -> Result<Vec<String>> {
        let mut root_files: Vec<String> = self
            .list_directory(directory)?
            .into_iter()
            .filter(|f| f.ends_with(".root"))
            .collect();
        root_files.sort();
        Ok(root_files)
    }

    fn mkdir(&self, path: &SePath) -> Result<()> {
        Cmd::new("xrdfs")
            .arg(trim_mgm(&path.mgm))
            .args(["mkdir", "-p"])
            .arg(&path.lfn)
            .run()?;
        Ok(())
    }
}

fn trim_mgm(mgm: &str) -> &str {
    mgm.trim_end_matches('/')
}
