use crate::domain::ports::Prerequisite;
use crate::utils::error::{LitmusError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOOL: &str = "sdb";

/// Checks that a command-line tool can be found on `PATH`.
#[derive(Debug, Clone)]
pub struct ToolProbe {
    tool: String,
    search_path: Option<OsString>,
}

impl ToolProbe {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            search_path: None,
        }
    }

    /// Search these directories instead of the process `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn locate(&self) -> Option<PathBuf> {
        let direct = Path::new(&self.tool);
        if direct.components().count() > 1 {
            return is_executable(direct).then(|| direct.to_path_buf());
        }

        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))?;

        std::env::split_paths(&search_path)
            .flat_map(|dir| candidates(&dir, &self.tool))
            .find(|candidate| is_executable(candidate))
    }
}

impl Default for ToolProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl Prerequisite for ToolProbe {
    fn check(&self) -> Result<()> {
        match self.locate() {
            Some(found) => {
                tracing::debug!("Found {} at {}", self.tool, found.display());
                Ok(())
            }
            None => {
                tracing::error!("❌ {} is not available on PATH", self.tool);
                Err(LitmusError::PrerequisiteMissing {
                    tool: self.tool.clone(),
                })
            }
        }
    }
}

/// Prerequisite that always passes, for `--skip-tool-check`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrerequisite;

impl Prerequisite for NoPrerequisite {
    fn check(&self) -> Result<()> {
        tracing::warn!("⚠️ Tool check skipped");
        Ok(())
    }
}

#[cfg(windows)]
fn candidates(dir: &Path, tool: &str) -> Vec<PathBuf> {
    vec![dir.join(tool), dir.join(format!("{}.exe", tool))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, tool: &str) -> Vec<PathBuf> {
    vec![dir.join(tool)]
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}
