// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `cmsbatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cmsbatch",
    version,
    about = "Submit CMSSW payloads to HTCondor and stage files to the storage element.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Cmsbatch.toml` in the current working directory. If the file
    /// does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Cmsbatch.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CMSBATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Submit a payload script to HTCondor.
    ///
    /// Preprocessing directives (`#$ key = value` lines) in the payload can
    /// override the job count, event count, seed and tarball paths.
    Submit {
        /// Payload script to run inside the job.
        payload: PathBuf,

        /// CMSSW distribution tarball to ship with the job.
        #[arg(long, value_name = "PATH")]
        cmssw_tarball: Option<PathBuf>,

        /// Number of job instances to queue.
        #[arg(long, value_name = "N")]
        n_jobs: Option<usize>,

        /// Starting random seed.
        #[arg(long, value_name = "N")]
        seed: Option<u64>,

        /// Log what would happen without writing files or running any tool.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a payload inside a batch job (the in-job entry point).
    ///
    /// Reads its inputs from the environment: `CMSBATCH_BATCH_MODE` selects
    /// the scratch directory under `_CONDOR_SCRATCH_DIR`, and
    /// `CMSBATCH_CMSSW_TARBALL` names the CMSSW distribution to extract.
    Job {
        /// Command to run inside the CMSSW environment.
        #[arg(trailing_var_arg = true, required = true, value_name = "CMD")]
        payload_cmd: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
