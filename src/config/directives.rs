// src/config/directives.rs

//! Preprocessing directives embedded in payload scripts.
//!
//! A payload can override submission parameters with comment lines of the
//! form:
//!
//! ```sh
//! #$ n_jobs = 50
//! #$ seed = 2001
//! #$ cmssw_tarball = /path/to/CMSSW_10_2_21.tar.gz
//! ```
//!
//! Directives are read once at submitter construction and never persisted.
//! Keys are case-folded; for duplicate keys the last occurrence wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use tracing::{info, warn};

use crate::errors::{Error, Result};

/// Comment marker introducing a directive line.
pub const DIRECTIVE_PREFIX: &str = "#$";

/// Parsed `#$ key = value` directives from a payload script.
#[derive(Debug, Clone, Default)]
pub struct Directives {
    values: BTreeMap<String, String>,
}

impl Directives {
    /// Read directives from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading preprocessing directives from {path:?}"))?;
        let directives = Self::parse(&contents);
        if !directives.values.is_empty() {
            info!(
                "read {} preprocessing directives from {}",
                directives.values.len(),
                path.display()
            );
        }
        Ok(directives)
    }

    /// Parse directives out of script text.
    ///
    /// Lines not starting with `#$` are ignored; `#$` lines without an `=`
    /// are skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            let Some(rest) = line.strip_prefix(DIRECTIVE_PREFIX) else {
                continue;
            };
            match rest.split_once('=') {
                Some((key, value)) => {
                    values.insert(key.trim().to_lowercase(), value.trim().to_string());
                }
                None => {
                    warn!("preprocessing directive does not contain '='; skipping: '{line}'");
                }
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Typed lookup; a present-but-unparsable value is an error naming the
    /// directive.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| Error::Directive {
                key: key.to_string(),
                value: value.clone(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
