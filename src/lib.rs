pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::process_script::ProcessScriptLoader;
pub use adapters::registry::{FnScript, ScriptRegistry};
pub use adapters::tool_probe::{NoPrerequisite, ToolProbe};
pub use config::project_list::TomlProjectSource;
pub use core::engine::{RunEngine, RunRequest};
pub use core::resolver::resolve;
pub use utils::error::{LitmusError, Result};
