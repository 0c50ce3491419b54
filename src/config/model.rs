// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `Cmsbatch.toml`.
///
/// All sections are optional and have defaults matching the FNAL LPC setup:
///
/// ```toml
/// [storage]
/// default_mgm = "root://cmseos.fnal.gov"
///
/// [condor]
/// starting_seed = 1001
///
/// [cmssw]
/// default_scram_arch = "slc7_amd64_gcc493"
///
/// [job]
/// scratch_root = "/tmp/cmsbatch"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    /// Storage-element defaults from `[storage]`.
    #[serde(default)]
    pub storage: StorageSection,

    /// Submission defaults from `[condor]`.
    #[serde(default)]
    pub condor: CondorSection,

    /// CMSSW environment defaults from `[cmssw]`.
    #[serde(default)]
    pub cmssw: CmsswSection,

    /// In-job behaviour from `[job]`.
    #[serde(default)]
    pub job: JobSection,
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Manager endpoint used when a path carries no `root://...` prefix.
    #[serde(default = "default_mgm")]
    pub default_mgm: String,
}

fn default_mgm() -> String {
    "root://cmseos.fnal.gov".to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            default_mgm: default_mgm(),
        }
    }
}

/// `[condor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CondorSection {
    /// First random seed handed to production jobs; job `i` gets seed
    /// `starting_seed + i`.
    #[serde(default = "default_starting_seed")]
    pub starting_seed: u64,

    /// Default number of events per job.
    #[serde(default = "default_n_events")]
    pub n_events: u64,
}

fn default_starting_seed() -> u64 {
    1001
}

fn default_n_events() -> u64 {
    20
}

impl Default for CondorSection {
    fn default() -> Self {
        Self {
            starting_seed: default_starting_seed(),
            n_events: default_n_events(),
        }
    }
}

/// `[cmssw]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CmsswSection {
    /// `SCRAM_ARCH` exported when setting up or compiling a release.
    #[serde(default = "default_scram_arch")]
    pub default_scram_arch: String,

    /// Script sourced to obtain `cmsrel` / `cmsenv` / `scram`.
    #[serde(default = "default_setup_script")]
    pub setup_script: String,
}

fn default_scram_arch() -> String {
    "slc7_amd64_gcc493".to_string()
}

fn default_setup_script() -> String {
    "/cvmfs/cms.cern.ch/cmsset_default.sh".to_string()
}

impl Default for CmsswSection {
    fn default() -> Self {
        Self {
            default_scram_arch: default_scram_arch(),
            setup_script: default_setup_script(),
        }
    }
}

/// `[job]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    /// Scratch directory used outside batch mode. Inside a batch job the
    /// condor scratch directory is used instead.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
}

fn default_scratch_root() -> PathBuf {
    PathBuf::from("/tmp/cmsbatch")
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            scratch_root: default_scratch_root(),
        }
    }
}
