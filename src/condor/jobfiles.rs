// src/condor/jobfiles.rs

//! Builders for the two text artifacts of a submission: the HTCondor job
//! description (`.jdl`) and the shell script it executes (`.sh`).
//!
//! Rendering is deterministic: options keep their insertion order, so a
//! fixed configuration always produces the same text.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use tracing::{debug, info};

use crate::cmssw::SCRAM_ARCH_VAR;
use crate::config::env::{BATCH_MODE_VAR, SEED_VAR};
use crate::errors::Result;

/// A file related to a condor job, rendered from in-memory state.
pub trait JobFile {
    /// Finalize derived options before rendering.
    fn configure(&mut self) {}

    /// Produce the file contents.
    fn render(&self) -> String;

    /// Configure, render and write to `path` (log-only in dry mode).
    fn write_to(&mut self, path: &Path, dry: bool) -> Result<()> {
        self.configure();
        let contents = self.render();
        info!("writing to {}", path.display());
        debug!("contents:\n{contents}");
        if !dry {
            fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }
}

/// An insertion-ordered `key = value` list.
///
/// Updating an existing key keeps its position, matching how job options
/// are accumulated: defaults first, later refinements in place.
#[derive(Debug, Clone, Default)]
pub struct OptionList {
    entries: Vec<(String, String)>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (k, v) in iter {
            list.set(k, v);
        }
        list
    }
}

/// The job environment every generated JDL starts from: condor cluster and
/// process ids, the submitting user, submission timestamps and the
/// batch-mode marker.
pub fn default_environment() -> OptionList {
    let now = Local::now();
    let mut environment = OptionList::new();
    environment.set("CONDOR_CLUSTER_NUMBER", "$(Cluster)");
    environment.set("CONDOR_PROCESS_ID", "$(Process)");
    environment.set("USER", env::var("USER").unwrap_or_default());
    environment.set(
        "CLUSTER_SUBMISSION_TIMESTAMP",
        now.format("%Y%m%d_%H%M%S").to_string(),
    );
    environment.set(
        "CLUSTER_SUBMISSION_TIMESTAMP_SHORT",
        now.format("%Y-%m-%d").to_string(),
    );
    environment.set(
        "CLUSTER_SUBMISSION_TIMESTAMP_VERBOSE",
        now.format("%b %d %H:%M:%S (%Y)").to_string(),
    );
    environment.set(BATCH_MODE_VAR, "lpc");
    environment
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JdlKind {
    Plain,
    Payload,
    Production,
}

/// An HTCondor job description.
///
/// `options`, `environment`, `transfer_input_files` and `queue` are public
/// so callers can refine the description before writing it out.
#[derive(Debug, Clone)]
pub struct Jdl {
    sh_file: PathBuf,
    payload: Option<PathBuf>,
    kind: JdlKind,
    pub options: OptionList,
    pub environment: OptionList,
    pub transfer_input_files: Vec<String>,
    pub queue: String,
    n_jobs: usize,
    starting_seed: u64,
    scram_arch: Option<String>,
}

impl Jdl {
    /// A bare vanilla-universe description executing `sh_file`.
    pub fn new(sh_file: impl Into<PathBuf>) -> Self {
        let mut options = OptionList::new();
        options.set("universe", "vanilla");
        // Placeholder entry; render() substitutes the quoted environment
        // line at this position.
        options.set("environment", "");
        Self {
            sh_file: sh_file.into(),
            payload: None,
            kind: JdlKind::Plain,
            options,
            environment: default_environment(),
            transfer_input_files: Vec::new(),
            queue: "queue".to_string(),
            n_jobs: 1,
            starting_seed: 0,
            scram_arch: None,
        }
    }

    /// A description for a job that runs a payload script: the payload is
    /// transferred, failures hold the job, and per-job log files are named
    /// after the payload.
    pub fn for_payload(sh_file: impl Into<PathBuf>, payload: impl Into<PathBuf>) -> Self {
        let mut jdl = Self::new(sh_file);
        let payload = payload.into();
        jdl.transfer_input_files.push(file_basename(&payload));
        jdl.payload = Some(payload);
        jdl.kind = JdlKind::Payload;
        jdl
    }

    /// A production description queueing one job per seed.
    pub fn for_production(
        sh_file: impl Into<PathBuf>,
        payload: impl Into<PathBuf>,
        n_jobs: usize,
        starting_seed: u64,
        scram_arch: impl Into<String>,
    ) -> Self {
        let mut jdl = Self::for_payload(sh_file, payload);
        jdl.kind = JdlKind::Production;
        jdl.n_jobs = n_jobs;
        jdl.starting_seed = starting_seed;
        jdl.scram_arch = Some(scram_arch.into());
        jdl
    }
}

impl JobFile for Jdl {
    fn configure(&mut self) {
        self.options.set("executable", file_basename(&self.sh_file));

        if matches!(self.kind, JdlKind::Payload | JdlKind::Production) {
            if !self.transfer_input_files.is_empty() {
                let files: Vec<&str> = self
                    .transfer_input_files
                    .iter()
                    .map(String::as_str)
                    .filter(|f| !f.starts_with("root:"))
                    .collect();
                self.options.set("transfer_input_files", files.join(","));
            }
            // Hold the job on failure so it can be inspected and released.
            self.options
                .set("on_exit_hold", "(ExitBySignal == True) || (ExitCode != 0)");
            if let Some(payload) = &self.payload {
                let stem = file_stem(payload);
                self.options
                    .set("output", format!("{stem}_$(Cluster)_$(Process).stdout"));
                self.options
                    .set("error", format!("{stem}_$(Cluster)_$(Process).stderr"));
                self.options
                    .set("log", format!("{stem}_$(Cluster)_$(Process).log"));
            }
        }

        if self.kind == JdlKind::Production {
            if let Some(arch) = &self.scram_arch {
                self.environment.set(SCRAM_ARCH_VAR, arch.clone());
            }
            self.options.set("should_transfer_files", "YES");
            self.options.set("when_to_transfer_output", "ON_EXIT");
            // Matches the directory the generated .sh creates.
            self.options.set("transfer_output_files", "output");
            let seeds: Vec<String> = (0..self.n_jobs)
                .map(|i| (self.starting_seed + i as u64).to_string())
                .collect();
            self.queue = format!("queue 1 arguments in {}", seeds.join(", "));
        }
    }

    fn render(&self) -> String {
        let mut jdl = Vec::new();
        for (key, value) in self.options.iter() {
            if key == "environment" {
                let environment = self
                    .environment
                    .iter()
                    .map(|(k, v)| format!("{k}='{v}'"))
                    .collect::<Vec<_>>()
                    .join(" ");
                jdl.push(format!("environment = \"{environment}\""));
            } else {
                jdl.push(format!("{key} = {value}"));
            }
        }
        jdl.push(self.queue.clone());
        jdl.join("\n")
    }
}

/// A plain shell script assembled from lines.
#[derive(Debug, Clone, Default)]
pub struct Sh {
    pub lines: Vec<String>,
}

impl Sh {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `clean.sh` companion that clears job logs from a run directory.
    pub fn clean_script() -> Self {
        Self {
            lines: vec![
                "rm *.stdout > /dev/null 2>&1".to_string(),
                "rm *.stderr > /dev/null 2>&1".to_string(),
                "rm *.log > /dev/null 2>&1".to_string(),
            ],
        }
    }
}

impl JobFile for Sh {
    fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// The job-side script for a payload: host diagnostics, seed export, code
/// tarball staging, and finally the payload invocation.
#[derive(Debug, Clone)]
pub struct ShPayload {
    payload: PathBuf,
    code_tarballs: Vec<PathBuf>,
    env_script: Option<String>,
    lines: Vec<String>,
}

impl ShPayload {
    pub fn new(payload: impl Into<PathBuf>) -> Self {
        Self {
            payload: payload.into(),
            code_tarballs: Vec::new(),
            env_script: None,
            lines: Vec::new(),
        }
    }

    /// Stage a code tarball at job start; its `bin/` directory is put on
    /// `PATH`.
    pub fn add_code_tarball(&mut self, tarball: impl Into<PathBuf>) {
        self.code_tarballs.push(tarball.into());
    }

    /// Script sourced after the code tarballs are unpacked.
    pub fn source_env_script(&mut self, script: impl Into<String>) {
        self.env_script = Some(script.into());
    }

    fn staging_lines(&self) -> Vec<String> {
        let named: Vec<(String, String)> = self
            .code_tarballs
            .iter()
            .map(|t| {
                let tarball = file_basename(t);
                let name = tarball.split('.').next().unwrap_or_default().to_string();
                (tarball, name)
            })
            .collect();

        let mut sh = Vec::new();
        for (tarball, name) in &named {
            sh.push(format!("mkdir {name}"));
            sh.push(format!("tar xf {tarball} -C {name}"));
        }
        if let Some(script) = &self.env_script {
            sh.push(format!("source {script}"));
        }
        for (_, name) in &named {
            sh.push(format!("export PATH=\"${{PWD}}/{name}/bin:${{PATH}}\""));
        }
        sh
    }
}

impl JobFile for ShPayload {
    fn configure(&mut self) {
        let payload_basename = file_basename(&self.payload);
        let mut lines = vec!["#!/bin/bash".to_string(), "set -e".to_string()];
        lines.push(echo("##### HOST DETAILS #####"));
        lines.push(echo("hostname: $(hostname)"));
        lines.push(echo("date:     $(date)"));
        lines.push(echo("pwd:      $(pwd)"));
        lines.push(format!("export {SEED_VAR}=$1"));
        lines.push(echo(&format!("seed:     ${{{SEED_VAR}}}")));
        if !self.code_tarballs.is_empty() {
            lines.push(echo("Installing code tarballs"));
            lines.extend(self.staging_lines());
        }
        lines.push("mkdir output".to_string());
        lines.push(echo("ls -al:"));
        lines.push("ls -al".to_string());
        lines.push(echo(&format!("Starting payload {payload_basename}")));
        lines.push(format!("bash {payload_basename}"));
        self.lines = lines;
    }

    fn render(&self) -> String {
        self.lines.join("\n")
    }
}

fn echo(text: &str) -> String {
    format!("echo \"{text}\"")
}

pub(crate) fn file_basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
