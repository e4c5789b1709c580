pub mod engine;
pub mod invoker;
pub mod resolver;

pub use crate::domain::model::{
    InvocationParams, InvocationState, ProjectList, ProjectRecord, RunReport,
};
pub use crate::domain::ports::{Prerequisite, ProjectSource, ScriptLoader, UserScript};
pub use crate::utils::error::Result;
