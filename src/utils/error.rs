use thiserror::Error;

#[derive(Error, Debug)]
pub enum LitmusError {
    #[error("Required tool '{tool}' is not available")]
    PrerequisiteMissing { tool: String },

    #[error("Project {name} does not exist")]
    ProjectNotFound { name: String },

    #[error("No userscript found in {path}")]
    PluginLoadError { path: String },

    #[error("Userscript at {path} has no callable main: {reason}")]
    PluginContractError { path: String, reason: String },

    #[error("Could not start userscript command '{program}': {reason}")]
    PluginLaunchError { program: String, reason: String },

    #[error("Userscript failed: {message}")]
    PluginRuntimeError {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Environment,
    Configuration,
    Plugin,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LitmusError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LitmusError::PrerequisiteMissing { .. } | LitmusError::PluginLaunchError { .. } => {
                ErrorCategory::Environment
            }
            LitmusError::ProjectNotFound { .. }
            | LitmusError::ConfigError { .. }
            | LitmusError::ConfigValidationError { .. }
            | LitmusError::InvalidConfigValueError { .. }
            | LitmusError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LitmusError::PluginLoadError { .. }
            | LitmusError::PluginContractError { .. }
            | LitmusError::PluginRuntimeError { .. } => ErrorCategory::Plugin,
            LitmusError::IoError(_) | LitmusError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Plugin => ErrorSeverity::High,
            ErrorCategory::Environment | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LitmusError::PrerequisiteMissing { tool } => {
                format!("{} is not installed or not on PATH", tool)
            }
            LitmusError::ProjectNotFound { name } => {
                format!("Project {} does not exist", name)
            }
            LitmusError::PluginLoadError { path } => {
                format!("Could not find a userscript in {}", path)
            }
            LitmusError::PluginContractError { path, reason } => {
                format!("Userscript in {} cannot be run: {}", path, reason)
            }
            LitmusError::PluginLaunchError { program, reason } => {
                format!("Could not start {} ({})", program, reason)
            }
            LitmusError::PluginRuntimeError { message, .. } => message.clone(),
            LitmusError::IoError(e) => format!("File system error: {}", e),
            LitmusError::SerializationError(e) => format!("Could not serialize output: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LitmusError::PrerequisiteMissing { tool } => format!(
                "Install {} and make sure it is on PATH, or pass --skip-tool-check",
                tool
            ),
            LitmusError::ProjectNotFound { .. } => {
                "Run `litmus list` to see the registered projects".to_string()
            }
            LitmusError::PluginLoadError { .. } => {
                "Add a userscript (manifest, python module or executable) to the project directory"
                    .to_string()
            }
            LitmusError::PluginContractError { .. } => {
                "Make sure the userscript defines a main entry point".to_string()
            }
            LitmusError::PluginLaunchError { program, .. } => format!(
                "Install {} or point litmus at it (--python, or main.command in userscript.toml)",
                program
            ),
            LitmusError::PluginRuntimeError { .. } => {
                "Check the userscript output above for details".to_string()
            }
            LitmusError::IoError(_) => "Check file paths and permissions".to_string(),
            LitmusError::SerializationError(_) => "Report this as a bug".to_string(),
            LitmusError::ConfigError { .. }
            | LitmusError::ConfigValidationError { .. }
            | LitmusError::InvalidConfigValueError { .. }
            | LitmusError::MissingConfigError { .. } => {
                "Check the project list file and command line arguments".to_string()
            }
        }
    }

    /// Exit code the CLI should terminate with.
    pub fn exit_code(&self) -> i32 {
        if let LitmusError::PluginRuntimeError { exit_code, .. } = self {
            return match exit_code {
                Some(code) if *code != 0 => *code,
                _ => 1,
            };
        }

        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, LitmusError>;
