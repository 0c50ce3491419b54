// src/lib.rs

pub mod cli;
pub mod cmssw;
pub mod condor;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fsops;
pub mod logging;
pub mod storage;
pub mod tarball;

use std::env;

use anyhow::Result;
use tracing::info;

use crate::cli::{CliArgs, CliCommand};
use crate::cmssw::CmsswTarball;
use crate::config::env::CMSSW_TARBALL_VAR;
use crate::config::{JobEnvironment, Settings};
use crate::condor::Submitter;
use crate::errors::Error;

/// High-level entry point used by `main.rs`.
pub fn run(args: CliArgs) -> Result<()> {
    let settings = config::load_or_default(&args.config)?;

    match args.command {
        CliCommand::Submit {
            payload,
            cmssw_tarball,
            n_jobs,
            seed,
            dry_run,
        } => {
            let mut submitter = Submitter::new(&payload, settings)?;
            // Explicit flags win over the payload's directives.
            if let Some(tarball) = cmssw_tarball {
                submitter.cmssw_tarball = Some(tarball);
            }
            if let Some(n_jobs) = n_jobs {
                submitter.n_jobs = n_jobs;
            }
            if let Some(seed) = seed {
                submitter.seed = seed;
            }
            submitter.set_dry(dry_run);
            submitter.submit()?;
            Ok(())
        }
        CliCommand::Job { payload_cmd } => run_job(&settings, &payload_cmd),
    }
}

/// In-job entry point: pick the scratch directory, extract the CMSSW
/// distribution named by the environment, and run the payload command
/// inside its environment.
fn run_job(settings: &Settings, payload_cmd: &[String]) -> Result<()> {
    cmssw::check_scram_arch(settings);
    let job_env = JobEnvironment::detect(settings)?;
    let tarball =
        env::var(CMSSW_TARBALL_VAR).map_err(|_| Error::MissingEnv(CMSSW_TARBALL_VAR))?;
    let arch = env::var(cmssw::SCRAM_ARCH_VAR)
        .unwrap_or_else(|_| settings.cmssw.default_scram_arch.clone());

    let mut cmssw_tarball =
        CmsswTarball::new(tarball, arch, job_env.scratch_dir.clone(), settings);
    cmssw_tarball.extract()?;

    let command = payload_cmd.join(" ");
    info!("running payload command: {command}");
    cmssw_tarball.run_in_env(&command)?;
    Ok(())
}
