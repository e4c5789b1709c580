use crate::domain::model::{ProjectList, ProjectRecord};
use crate::utils::error::{LitmusError, Result};
use crate::utils::validation::validate_non_empty_string;

/// Finds the first project whose name equals `name`.
///
/// Duplicate names are allowed in a project list; the earliest record wins.
pub fn resolve<'a>(projects: &'a ProjectList, name: &str) -> Result<&'a ProjectRecord> {
    validate_non_empty_string("project", name)?;

    projects
        .iter()
        .find(|record| record.name == name)
        .ok_or_else(|| LitmusError::ProjectNotFound {
            name: name.to_string(),
        })
}
