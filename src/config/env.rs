// src/config/env.rs

//! Environment variables that identify a running batch job.

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::config::model::Settings;
use crate::errors::{Error, Result};

/// Set (to anything) inside generated jobs to mark batch mode.
pub const BATCH_MODE_VAR: &str = "CMSBATCH_BATCH_MODE";

/// Scratch directory provided by HTCondor on the worker node.
pub const CONDOR_SCRATCH_VAR: &str = "_CONDOR_SCRATCH_DIR";

/// Names the CMSSW distribution tarball a job should extract.
pub const CMSSW_TARBALL_VAR: &str = "CMSBATCH_CMSSW_TARBALL";

/// Per-job random seed, exported by the generated shell script.
pub const SEED_VAR: &str = "CMSBATCH_SEED";

/// Number of events a production payload should generate.
pub const N_EVENTS_VAR: &str = "CMSBATCH_N_EVENTS";

/// Where a payload is allowed to run, derived from the environment.
#[derive(Debug, Clone)]
pub struct JobEnvironment {
    pub batch_mode: bool,
    pub scratch_dir: PathBuf,
}

impl JobEnvironment {
    /// Detect batch mode and pick the scratch directory.
    ///
    /// In batch mode (`CMSBATCH_BATCH_MODE` set) the scratch directory lives
    /// under the condor-provided `_CONDOR_SCRATCH_DIR`; its absence there is
    /// an error. Outside batch mode the configured scratch root is used.
    pub fn detect(settings: &Settings) -> Result<Self> {
        if env::var_os(BATCH_MODE_VAR).is_some() {
            let scratch = env::var_os(CONDOR_SCRATCH_VAR)
                .ok_or(Error::MissingEnv(CONDOR_SCRATCH_VAR))?;
            let scratch_dir = PathBuf::from(scratch).join("cmsbatch");
            info!("batch mode, scratch dir {}", scratch_dir.display());
            Ok(Self {
                batch_mode: true,
                scratch_dir,
            })
        } else {
            Ok(Self {
                batch_mode: false,
                scratch_dir: settings.job.scratch_root.clone(),
            })
        }
    }
}
