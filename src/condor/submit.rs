// src/condor/submit.rs

//! Submission orchestration.
//!
//! A submission is: check the grid proxy, create an exclusive run
//! directory, copy the payload and tarballs into it, render the `.sh` /
//! `.jdl` pair, and hand the description to the batch system.

use std::env;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info};

use crate::config::env::{CMSSW_TARBALL_VAR, N_EVENTS_VAR};
use crate::config::{Directives, Settings};
use crate::condor::jobfiles::{Jdl, JobFile, Sh, ShPayload, file_basename};
use crate::errors::Result;
use crate::exec::{Cmd, ScopedDir};
use crate::fsops::{self, CreateMode};
use crate::tarball;

/// Abort unless a grid proxy valid for at least a week is present.
pub fn check_proxy() -> Result<()> {
    match Cmd::new("grid-proxy-info")
        .args(["-exists", "-valid", "168:00"])
        .run()
    {
        Ok(_) => {
            info!("found a valid proxy");
            Ok(())
        }
        Err(err) => {
            error!(
                "grid proxy is not valid for at least 1 week; renew it using:\n\
                 voms-proxy-init -voms cms -valid 192:00"
            );
            Err(err)
        }
    }
}

/// Submit a job description, preferring the `cjm` queue manager when it is
/// installed and falling back to plain `condor_submit`.
pub fn submit_jdl(jdl_file: &Path, dry: bool) -> Result<()> {
    let have_cjm = Cmd::new("sh")
        .args(["-c", "command -v cjm"])
        .run_unchecked()
        .map(|(code, _)| code == 0)
        .unwrap_or(false);

    if have_cjm {
        info!("found an installation of cjm");
        Cmd::new("cjm")
            .arg("submit")
            .arg(jdl_file.to_string_lossy())
            .dry(dry)
            .run()?;
    } else {
        info!("submitting using plain condor_submit");
        Cmd::new("condor_submit")
            .arg(jdl_file.to_string_lossy())
            .dry(dry)
            .run()?;
    }
    Ok(())
}

/// Prepares and submits one payload script as an HTCondor job cluster.
///
/// Submission parameters come from (in increasing precedence) the config
/// defaults, `#$` preprocessing directives in the payload, and explicit
/// field assignments by the caller.
#[derive(Debug)]
pub struct Submitter {
    settings: Settings,
    payload: PathBuf,
    payload_basename: String,
    rundir: PathBuf,
    sh_file: PathBuf,
    jdl_file: PathBuf,

    pub n_jobs: usize,
    pub n_events: u64,
    pub seed: u64,
    /// Pre-built code tarball to transfer alongside the payload.
    pub code_tarball: Option<PathBuf>,
    /// CMSSW distribution tarball; when set the submission becomes a CMSSW
    /// payload job instead of a production job.
    pub cmssw_tarball: Option<PathBuf>,

    module_paths: Vec<PathBuf>,
    module_tarballs: Vec<PathBuf>,
    tarballs_created: bool,
    dry: bool,
}

impl Submitter {
    pub fn new(payload: impl AsRef<Path>, settings: Settings) -> Result<Self> {
        let payload = std::path::absolute(payload.as_ref())?;
        let payload_basename = file_basename(&payload);
        let stem = payload
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| payload_basename.clone());

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let rundir = env::current_dir()?.join(format!("{stem}_{stamp}"));
        let sh_file = rundir.join(format!("{stem}.sh"));
        let jdl_file = rundir.join(format!("{stem}.jdl"));

        let mut submitter = Self {
            n_jobs: 1,
            n_events: settings.condor.n_events,
            seed: settings.condor.starting_seed,
            code_tarball: None,
            cmssw_tarball: None,
            settings,
            payload,
            payload_basename,
            rundir,
            sh_file,
            jdl_file,
            module_paths: Vec::new(),
            module_tarballs: Vec::new(),
            tarballs_created: false,
            dry: false,
        };
        submitter.apply_directives()?;
        Ok(submitter)
    }

    fn apply_directives(&mut self) -> Result<()> {
        let directives = Directives::from_file(&self.payload)?;
        if let Some(n_jobs) = directives.get_parsed("n_jobs")? {
            info!("setting n_jobs {n_jobs} based on preprocessing directive");
            self.n_jobs = n_jobs;
        }
        if let Some(n_events) = directives.get_parsed("n_events")? {
            info!("setting n_events {n_events} based on preprocessing directive");
            self.n_events = n_events;
        }
        if let Some(seed) = directives.get_parsed("seed")? {
            info!("setting seed {seed} based on preprocessing directive");
            self.seed = seed;
        }
        if let Some(tarball) = directives.get("tarball") {
            info!("setting code tarball {tarball} based on preprocessing directive");
            self.code_tarball = Some(PathBuf::from(tarball));
        }
        if let Some(tarball) = directives.get("cmssw_tarball") {
            info!("setting cmssw tarball {tarball} based on preprocessing directive");
            self.cmssw_tarball = Some(PathBuf::from(tarball));
        }
        Ok(())
    }

    /// Register a repository whose committed state should be tarballed and
    /// shipped with the job.
    pub fn add_module(&mut self, path: impl Into<PathBuf>) {
        self.module_paths.push(path.into());
    }

    pub fn set_dry(&mut self, dry: bool) {
        self.dry = dry;
    }

    pub fn rundir(&self) -> &Path {
        &self.rundir
    }

    fn create_module_tarballs(&mut self) -> Result<()> {
        if self.tarballs_created {
            error!(
                "create_module_tarballs called twice, should not happen; \
                 not recreating the module tarballs"
            );
            return Ok(());
        }
        self.tarballs_created = true;
        for path in &self.module_paths {
            info!("creating tarball for {}", path.display());
            let tarball = tarball::create_tarball(path, None, self.dry)?;
            self.module_tarballs.push(tarball);
        }
        Ok(())
    }

    /// Run the full submission pipeline.
    pub fn submit(&mut self) -> Result<()> {
        if self.dry {
            info!("dry mode: skipping grid proxy check");
        } else {
            check_proxy()?;
        }

        if let Some(tarball) = &self.cmssw_tarball {
            self.cmssw_tarball = Some(std::path::absolute(tarball)?);
        }

        fsops::create_directory(&self.rundir, CreateMode::MustNotExist, self.dry)?;
        let _rundir = if self.dry {
            None
        } else {
            Some(ScopedDir::change(&self.rundir)?)
        };

        fsops::copy_file(
            &self.payload,
            &self.rundir.join(&self.payload_basename),
            self.dry,
        )?;
        self.create_module_tarballs()?;
        Sh::clean_script().write_to(&self.rundir.join("clean.sh"), self.dry)?;

        let mut sh = ShPayload::new(&self.payload);
        let mut jdl = match self.cmssw_tarball.clone() {
            Some(cmssw_tarball) => {
                let tarball_name = file_basename(&cmssw_tarball);
                fsops::copy_file(&cmssw_tarball, &self.rundir.join(&tarball_name), self.dry)?;
                let mut jdl = Jdl::for_payload(&self.sh_file, &self.payload);
                jdl.transfer_input_files.push(tarball_name.clone());
                jdl.environment.set(CMSSW_TARBALL_VAR, tarball_name);
                if self.n_jobs > 1 {
                    jdl.queue = format!("queue {}", self.n_jobs);
                }
                jdl
            }
            None => {
                let mut jdl = Jdl::for_production(
                    &self.sh_file,
                    &self.payload,
                    self.n_jobs,
                    self.seed,
                    self.settings.cmssw.default_scram_arch.clone(),
                );
                jdl.environment.set(N_EVENTS_VAR, self.n_events.to_string());
                if let Some(code_tarball) = &self.code_tarball {
                    jdl.transfer_input_files
                        .push(code_tarball.to_string_lossy().into_owned());
                }
                jdl
            }
        };

        for module_tarball in &self.module_tarballs {
            sh.add_code_tarball(module_tarball);
            jdl.transfer_input_files.push(file_basename(module_tarball));
        }

        sh.write_to(&self.sh_file, self.dry)?;
        jdl.write_to(&self.jdl_file, self.dry)?;
        submit_jdl(&self.jdl_file, self.dry)
    }
}
