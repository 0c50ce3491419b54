// src/exec/workdir.rs

use std::env;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::Result;

/// Scoped working-directory switch.
///
/// Changes the process working directory and restores the previous one when
/// the guard is dropped. The working directory is process-global state, so
/// this is only sound from a single thread; concurrent use is not supported.
#[derive(Debug)]
pub struct ScopedDir {
    previous: PathBuf,
}

impl ScopedDir {
    pub fn change(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let previous = env::current_dir()?;
        info!("chdir to {}", dir.display());
        env::set_current_dir(dir)?;
        Ok(Self { previous })
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        info!("chdir back to {}", self.previous.display());
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(
                error = %err,
                "failed to restore working directory to {}",
                self.previous.display()
            );
        }
    }
}
