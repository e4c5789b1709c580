use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A registered test project: a name and the directory holding its userscript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ProjectRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
            kind: None,
        }
    }
}

/// Ordered project records as loaded from a project list source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

impl ProjectList {
    pub fn new(projects: Vec<ProjectRecord>) -> Self {
        Self { projects }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Names that occur more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut duplicates: Vec<&str> = Vec::new();
        for (i, record) in self.projects.iter().enumerate() {
            let seen_before = self.projects[..i].iter().any(|p| p.name == record.name);
            if seen_before && !duplicates.contains(&record.name.as_str()) {
                duplicates.push(&record.name);
            }
        }
        duplicates
    }
}

/// Parameters handed to a userscript's `main`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationParams {
    pub project_name: String,
    pub project_path: String,
    pub param: String,
    #[serde(rename = "workingdir")]
    pub working_directory: String,
    pub topology: String,
}

impl InvocationParams {
    pub fn new(
        record: &ProjectRecord,
        param: &str,
        working_directory: &str,
        topology: &str,
    ) -> Self {
        Self {
            project_name: record.name.clone(),
            project_path: record.path.clone(),
            param: param.to_string(),
            working_directory: working_directory.to_string(),
            topology: topology.to_string(),
        }
    }

    /// Keyword arguments in the fixed order `main` receives them.
    pub fn keyword_args(&self) -> [(&'static str, &str); 5] {
        [
            ("project_name", self.project_name.as_str()),
            ("project_path", self.project_path.as_str()),
            ("param", self.param.as_str()),
            ("workingdir", self.working_directory.as_str()),
            ("topology", self.topology.as_str()),
        ]
    }

    pub fn project_dir(&self) -> PathBuf {
        PathBuf::from(&self.project_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationState {
    AwaitingResolution,
    Invoking,
    Succeeded,
    Failed,
}

impl InvocationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, InvocationState::Succeeded | InvocationState::Failed)
    }
}

/// Outcome of one `run` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub project_name: String,
    pub state: InvocationState,
    pub params: Option<InvocationParams>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
}
