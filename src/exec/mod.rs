// src/exec/mod.rs

//! External process execution layer.
//!
//! Everything in this crate that talks to `git`, `tar`, `xrdcp`, `scram`,
//! `condor_submit` and friends goes through this module.
//!
//! - [`command`] runs a single command to completion and translates its exit
//!   code.
//! - [`shell`] feeds a sequence of commands through one persistent `bash`
//!   process, so `cd` / `source` / exported variables carry across commands.
//! - [`workdir`] provides a scoped working-directory switch.
//!
//! All execution is synchronous and blocking; there are no timeouts. A
//! long-running external step (compilation, remote copy) simply blocks until
//! the child exits.

pub mod command;
pub mod shell;
pub mod workdir;

pub use command::{Cmd, run_command};
pub use shell::ShellSession;
pub use workdir::ScopedDir;
