use crate::domain::model::InvocationParams;
use crate::domain::ports::{ScriptLoader, UserScript};
use crate::utils::error::{LitmusError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-process userscripts keyed by project directory.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: Arc<Mutex<HashMap<PathBuf, Arc<dyn UserScript>>>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S>(&self, project_dir: impl Into<PathBuf>, script: S)
    where
        S: UserScript + 'static,
    {
        let mut scripts = match self.scripts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        scripts.insert(project_dir.into(), Arc::new(script));
    }

    pub fn len(&self) -> usize {
        self.scripts.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScriptLoader for ScriptRegistry {
    fn load(&self, project_dir: &Path) -> Result<Box<dyn UserScript>> {
        let scripts = self.scripts.lock().map_err(|_| LitmusError::ConfigError {
            message: "script registry lock poisoned".to_string(),
        })?;

        scripts
            .get(project_dir)
            .map(|script| Box::new(SharedScript(script.clone())) as Box<dyn UserScript>)
            .ok_or_else(|| LitmusError::PluginLoadError {
                path: project_dir.display().to_string(),
            })
    }
}

struct SharedScript(Arc<dyn UserScript>);

#[async_trait]
impl UserScript for SharedScript {
    async fn main(&self, params: InvocationParams) -> Result<()> {
        self.0.main(params).await
    }
}

/// Userscript backed by a plain closure.
pub struct FnScript<F>
where
    F: Fn(InvocationParams) -> Result<()> + Send + Sync,
{
    entry: F,
}

impl<F> FnScript<F>
where
    F: Fn(InvocationParams) -> Result<()> + Send + Sync,
{
    pub fn new(entry: F) -> Self {
        Self { entry }
    }
}

#[async_trait]
impl<F> UserScript for FnScript<F>
where
    F: Fn(InvocationParams) -> Result<()> + Send + Sync,
{
    async fn main(&self, params: InvocationParams) -> Result<()> {
        (self.entry)(params)
    }
}
