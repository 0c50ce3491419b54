// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Almost everything this crate does is "run an external tool and check the
//! exit code", so most variants carry the command (or path) that failed.
//! Recoverable conditions are rejected up front (dirty working trees,
//! existing run directories, malformed storage paths) before any external
//! tool is invoked.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("command `{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("uncommitted changes in {0}; commit them before creating a tarball")]
    DirtyWorkingTree(PathBuf),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("conflicting mgms: `{path_mgm}` from path, `{given_mgm}` from argument")]
    MgmMismatch { path_mgm: String, given_mgm: String },

    #[error("directory already exists: {0}")]
    DirectoryExists(PathBuf),

    #[error("not a CMSSW src directory: {0}")]
    InvalidCmsswPath(PathBuf),

    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("invalid value `{value}` for preprocessing directive `{key}`")]
    Directive { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
