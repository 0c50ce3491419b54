// src/config/mod.rs

//! Configuration for cmsbatch.
//!
//! Three sources, in increasing order of specificity:
//! - Built-in defaults, optionally overridden by a `Cmsbatch.toml` file
//!   (`model.rs`, `loader.rs`).
//! - Preprocessing directives embedded in the payload script
//!   (`directives.rs`).
//! - Environment variables that identify a running batch job (`env.rs`).

pub mod directives;
pub mod env;
pub mod loader;
pub mod model;

pub use directives::Directives;
pub use env::JobEnvironment;
pub use loader::{load_from_path, load_or_default};
pub use model::{CmsswSection, CondorSection, JobSection, Settings, StorageSection};
