use crate::domain::model::{InvocationParams, ProjectList};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Probe for an external tool that must exist before anything else runs.
pub trait Prerequisite: Send + Sync {
    fn check(&self) -> Result<()>;
}

/// Produces the ordered project list.
pub trait ProjectSource: Send + Sync {
    fn load(&self) -> Result<ProjectList>;
    fn describe(&self) -> String;
}

/// A loaded userscript exposing its `main` entry point.
#[async_trait]
pub trait UserScript: Send + Sync {
    async fn main(&self, params: InvocationParams) -> Result<()>;
}

/// Finds the `userscript` module in an explicit project directory.
pub trait ScriptLoader: Send + Sync {
    fn load(&self, project_dir: &Path) -> Result<Box<dyn UserScript>>;
}
