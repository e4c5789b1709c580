use crate::domain::model::{InvocationParams, ProjectRecord};
use crate::domain::ports::ScriptLoader;
use crate::utils::error::Result;

/// Loads a project's userscript and calls its `main`.
pub struct ScriptInvoker<L: ScriptLoader> {
    loader: L,
}

impl<L: ScriptLoader> ScriptInvoker<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub async fn invoke(
        &self,
        record: &ProjectRecord,
        param: &str,
        working_directory: &str,
        topology: &str,
    ) -> Result<()> {
        let params = InvocationParams::new(record, param, working_directory, topology);
        self.invoke_with(params).await
    }

    /// Errors from the script itself are returned as-is.
    pub async fn invoke_with(&self, params: InvocationParams) -> Result<()> {
        tracing::debug!("Loading userscript from: {}", params.project_path);
        let script = self.loader.load(&params.project_dir())?;

        tracing::debug!(
            project = %params.project_name,
            workingdir = %params.working_directory,
            topology = %params.topology,
            "Calling userscript main"
        );
        script.main(params).await
    }
}
