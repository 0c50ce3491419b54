// src/cmssw.rs

//! CMSSW project helpers: setting up releases, compiling, and shipping
//! compiled release trees as tarballs.
//!
//! `cmsrel`, `cmsenv` and `scram` are aliases/functions defined by the CMS
//! setup script and they mutate shell state, so everything here runs through
//! a [`ShellSession`] rather than one process per command.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use regex::Regex;
use tracing::{info, warn};

use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::exec::{Cmd, ShellSession};
use crate::fsops::{self, CreateMode};

pub const SCRAM_ARCH_VAR: &str = "SCRAM_ARCH";

/// Shell preamble shared by every CMSSW session.
fn env_preamble(setup_script: &str, arch: &str) -> Vec<String> {
    vec![
        "shopt -s expand_aliases".to_string(),
        format!("source {setup_script}"),
        format!("export {SCRAM_ARCH_VAR}={arch}"),
    ]
}

/// Set up a fresh CMSSW release in `workdir`.
///
/// Skips silently when `workdir/version` already exists.
pub fn setup_release(settings: &Settings, workdir: &Path, version: &str, arch: &str) -> Result<()> {
    if workdir.join(version).is_dir() {
        info!("{version} already exists, skipping");
        return Ok(());
    }
    info!("setting up {version} {arch} in {}", workdir.display());
    ShellSession::new()
        .cmd(format!("cd {}", workdir.display()))
        .cmds(env_preamble(&settings.cmssw.setup_script, arch))
        .cmd(format!("cmsrel {version}"))
        .cmd(format!("cd {version}/src"))
        .cmd("cmsenv")
        .cmd("scram b")
        .run()?;
    info!("done setting up {version} {arch} in {}", workdir.display());
    Ok(())
}

/// (Re)compile an existing CMSSW `src` tree.
pub fn compile_src(settings: &Settings, cmssw_src: &Path, arch: &str) -> Result<()> {
    if cmssw_src.file_name().is_none_or(|n| n != "src") {
        return Err(Error::InvalidCmsswPath(cmssw_src.to_path_buf()));
    }
    info!("compiling {} with scram arch {arch}", cmssw_src.display());
    ShellSession::new()
        .cmds(env_preamble(&settings.cmssw.setup_script, arch))
        .cmd(format!("cd {}", cmssw_src.display()))
        .cmd("cmsenv")
        .cmd("scram b")
        .run()?;
    info!("done compiling {}", cmssw_src.display());
    Ok(())
}

/// Warn when the ambient `SCRAM_ARCH` does not match the configured
/// platform generation.
pub fn check_scram_arch(settings: &Settings) {
    let expected_prefix = settings
        .cmssw
        .default_scram_arch
        .split('_')
        .next()
        .unwrap_or_default();
    if let Ok(arch) = env::var(SCRAM_ARCH_VAR) {
        if !arch.starts_with(expected_prefix) {
            warn!(
                "detected {SCRAM_ARCH_VAR} = {arch}; there might be incompatibility \
                 issues later on by not using {expected_prefix}"
            );
        }
    }
}

/// Extract a CMSSW distribution tarball into `outdir` and return the path
/// of the `CMSSW_X_Y_Z` directory it contains.
pub fn extract_release(tarball: &Path, outdir: &Path) -> Result<PathBuf> {
    Cmd::new("tar")
        .arg("-xf")
        .arg(tarball.to_string_lossy())
        .arg("-C")
        .arg(outdir.to_string_lossy())
        .run()?;

    let release_re =
        Regex::new(r"^CMSSW_\d+_\d+_").context("compiling the release name pattern")?;
    for entry in fs::read_dir(outdir).with_context(|| format!("listing {}", outdir.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if entry.file_type()?.is_dir() && release_re.is_match(&name.to_string_lossy()) {
            return Ok(entry.path());
        }
    }
    Err(anyhow!("no CMSSW release directory found in {}", outdir.display()).into())
}

/// Package an installed `CMSSW_X_Y_Z` tree as a tarball.
pub fn archive_release(cmssw_dir: &Path, outfile: &Path) -> Result<()> {
    let basename = cmssw_dir
        .file_name()
        .ok_or_else(|| anyhow!("cannot archive {}", cmssw_dir.display()))?;
    let parent = cmssw_dir
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", cmssw_dir.display()))?;
    info!(
        "archiving {} to {}",
        cmssw_dir.display(),
        outfile.display()
    );
    Cmd::new("tar")
        .arg("-czf")
        .arg(outfile.to_string_lossy())
        .arg("-C")
        .arg(parent.to_string_lossy())
        .arg(basename.to_string_lossy())
        .run()?;
    Ok(())
}

/// A CMSSW distribution tarball and the scratch directory it is unpacked
/// into on the worker node.
///
/// A compiled release records absolute paths, so after relocation the
/// project has to be renamed (`scram b ProjectRename`) before `cmsenv`
/// works. That step runs at most once per instance.
#[derive(Debug)]
pub struct CmsswTarball {
    tarball: PathBuf,
    scram_arch: String,
    rundir: PathBuf,
    setup_script: String,
    cmssw_src: Option<PathBuf>,
    renamed: bool,
}

impl CmsswTarball {
    pub fn new(
        tarball: impl Into<PathBuf>,
        scram_arch: impl Into<String>,
        rundir: impl Into<PathBuf>,
        settings: &Settings,
    ) -> Self {
        Self {
            tarball: tarball.into(),
            scram_arch: scram_arch.into(),
            rundir: rundir.into(),
            setup_script: settings.cmssw.setup_script.clone(),
            cmssw_src: None,
            renamed: false,
        }
    }

    /// Force-recreate the rundir and extract the distribution into it.
    pub fn extract(&mut self) -> Result<()> {
        fsops::create_directory(&self.rundir, CreateMode::Force, false)?;
        let cmssw_dir = extract_release(&self.tarball, &self.rundir)?;
        let src = std::path::absolute(cmssw_dir.join("src"))?;
        self.cmssw_src = Some(src);
        Ok(())
    }

    /// The extracted `src` directory; available after [`extract`](Self::extract).
    pub fn cmssw_src(&self) -> Option<&Path> {
        self.cmssw_src.as_deref()
    }

    fn src_dir(&self) -> Result<PathBuf> {
        self.cmssw_src
            .clone()
            .ok_or_else(|| anyhow!("the tarball must be extracted first").into())
    }

    /// Relocate the compiled project; runs at most once.
    pub fn rename_project(&mut self) -> Result<()> {
        if self.renamed {
            return Ok(());
        }
        let src = self.src_dir()?;
        info!("renaming project {}", src.display());
        ShellSession::new()
            .cmd(format!("cd {}", src.display()))
            .cmds(env_preamble(&self.setup_script, &self.scram_arch))
            .cmd("scram b ProjectRename")
            .cmd("cmsenv")
            .run()?;
        self.renamed = true;
        Ok(())
    }

    /// Run `command` with the CMSSW environment set up inside `src`.
    pub fn run_in_env(&mut self, command: &str) -> Result<Vec<String>> {
        self.rename_project()?;
        let src = self.src_dir()?;
        ShellSession::new()
            .cmd(format!("cd {}", src.display()))
            .cmds(env_preamble(&self.setup_script, &self.scram_arch))
            .cmd("scram b ProjectRename")
            .cmd("cmsenv")
            .cmd(command)
            .run()
    }
}
