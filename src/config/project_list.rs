use crate::config::cli::expand_home;
use crate::domain::model::ProjectList;
use crate::domain::ports::ProjectSource;
use crate::utils::error::{LitmusError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Project list stored as TOML:
///
/// ```toml
/// [[projects]]
/// name = "tw1"
/// path = "~/.litmus/tw1"
/// description = "smoke tests"
/// ```
#[derive(Debug, Clone)]
pub struct TomlProjectSource {
    path: PathBuf,
}

impl TomlProjectSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 從 TOML 字串解析專案列表，相對路徑以 `base_dir` 為基準
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<ProjectList> {
        let processed_content = substitute_env_vars(content)?;

        let mut list: ProjectList =
            toml::from_str(&processed_content).map_err(|e| LitmusError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        for record in &mut list.projects {
            record.path = normalize_project_path(&record.path, base_dir);
        }

        list.validate()?;

        let duplicates = list.duplicate_names();
        if !duplicates.is_empty() {
            tracing::warn!(
                "⚠️ Duplicate project names {:?}, the first entry of each is used",
                duplicates
            );
        }

        Ok(list)
    }
}

impl ProjectSource for TomlProjectSource {
    fn load(&self) -> Result<ProjectList> {
        if !self.path.exists() {
            tracing::warn!(
                "Project list {} does not exist, no projects registered",
                self.path.display()
            );
            return Ok(ProjectList::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base_dir)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl Validate for ProjectList {
    fn validate(&self) -> Result<()> {
        for (i, record) in self.projects.iter().enumerate() {
            validate_non_empty_string(&format!("projects[{}].name", i), &record.name)?;
            validate_path(&format!("projects[{}].path", i), &record.path)?;
        }
        Ok(())
    }
}

/// 替換環境變數 (例如 ${LITMUS_HOME})，未定義的變數保持原樣
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LitmusError::ConfigError {
        message: format!("invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

fn normalize_project_path(raw: &str, base_dir: &Path) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let expanded = expand_home(raw);
    if expanded.is_relative() {
        base_dir.join(expanded).display().to_string()
    } else {
        expanded.display().to_string()
    }
}
