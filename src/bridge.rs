//! The one privileged host action the UI may trigger.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub trait DesktopBridge: Send + Sync {
    /// Open the outputs folder in the native file browser.
    fn open_outputs_folder(&self) -> Result<PathBuf>;
}

pub struct NativeBridge {
    outputs_dir: PathBuf,
}

impl NativeBridge {
    pub fn new(outputs_dir: PathBuf) -> Self {
        Self { outputs_dir }
    }
}

/// Make sure `dir` exists and return its canonical form.
pub(crate) fn ensure_outputs_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create outputs folder {}", dir.display()))?;
    dir.canonicalize()
        .with_context(|| format!("resolve outputs folder {}", dir.display()))
}

impl DesktopBridge for NativeBridge {
    fn open_outputs_folder(&self) -> Result<PathBuf> {
        let dir = ensure_outputs_dir(&self.outputs_dir)?;
        open::that_detached(&dir).with_context(|| format!("open {}", dir.display()))?;
        Ok(dir)
    }
}
