use crate::adapters::tool_probe::is_executable;
use crate::domain::model::InvocationParams;
use crate::domain::ports::{ScriptLoader, UserScript};
use crate::utils::error::{LitmusError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub const MANIFEST_FILE: &str = "userscript.toml";
pub const PYTHON_MODULE: &str = "userscript.py";
pub const EXECUTABLE: &str = "userscript";
pub const DEFAULT_PYTHON: &str = "python3";

const ENV_PREFIX: &str = "LITMUS_";

// shim 保留的結束碼，main 本身以這些碼結束時改回 1
const SHIM_NO_MODULE: i32 = 120;
const SHIM_NO_MAIN: i32 = 121;

// 在子直譯器中匯入 userscript，確認 main 可呼叫後以關鍵字參數呼叫
const PYTHON_SHIM: &str = r#"import sys
kwargs = dict(arg.split("=", 1) for arg in sys.argv[1:])
sys.path.insert(0, kwargs["project_path"])
try:
    import userscript
except ModuleNotFoundError as e:
    if e.name != "userscript":
        raise
    sys.exit(120)
main = getattr(userscript, "main", None)
if not callable(main):
    sys.stderr.write("userscript has no callable main\n")
    sys.exit(121)
try:
    main(**kwargs)
except SystemExit as e:
    if e.code in (120, 121):
        sys.exit(1)
    raise
"#;

/// `userscript.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptManifest {
    pub main: Option<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Discovers `userscript` modules on disk and runs them as child processes.
#[derive(Debug, Clone)]
pub struct ProcessScriptLoader {
    python: String,
}

impl ProcessScriptLoader {
    pub fn new() -> Self {
        Self::with_python(DEFAULT_PYTHON)
    }

    pub fn with_python(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    fn load_manifest(&self, project_dir: &Path, manifest_path: &Path) -> Result<ProcessScript> {
        let content = std::fs::read_to_string(manifest_path)?;
        let manifest: ScriptManifest = toml::from_str(&content).map_err(|e| {
            contract_error(project_dir, format!("invalid {}: {}", MANIFEST_FILE, e))
        })?;

        let entry = validate_required_field("main", &manifest.main).map_err(|_| {
            contract_error(project_dir, format!("{} has no [main] table", MANIFEST_FILE))
        })?;

        if entry.command.trim().is_empty() {
            return Err(contract_error(project_dir, "main.command is empty".to_string()));
        }

        // 相對路徑的指令以專案目錄為基準
        let command = Path::new(&entry.command);
        let program = if command.is_relative() && command.components().count() > 1 {
            project_dir.join(command)
        } else {
            command.to_path_buf()
        };

        Ok(ProcessScript {
            launcher: Launcher::Manifest,
            program,
            args: entry.args.clone(),
            project_dir: project_dir.to_path_buf(),
        })
    }

    /// `main` is checked by the shim after import, not here.
    fn load_python(&self, project_dir: &Path) -> ProcessScript {
        ProcessScript {
            launcher: Launcher::Python,
            program: PathBuf::from(&self.python),
            args: vec!["-c".to_string(), PYTHON_SHIM.to_string()],
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn load_executable(&self, project_dir: &Path, path: &Path) -> Result<ProcessScript> {
        if !is_executable(path) {
            return Err(contract_error(
                project_dir,
                format!("{} is not executable", EXECUTABLE),
            ));
        }

        Ok(ProcessScript {
            launcher: Launcher::Executable,
            program: path.to_path_buf(),
            args: Vec::new(),
            project_dir: project_dir.to_path_buf(),
        })
    }
}

impl Default for ProcessScriptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptLoader for ProcessScriptLoader {
    fn load(&self, project_dir: &Path) -> Result<Box<dyn UserScript>> {
        if !project_dir.is_dir() {
            return Err(LitmusError::PluginLoadError {
                path: project_dir.display().to_string(),
            });
        }

        let manifest = project_dir.join(MANIFEST_FILE);
        let module = project_dir.join(PYTHON_MODULE);
        let executable = project_dir.join(EXECUTABLE);

        let script = if manifest.is_file() {
            tracing::debug!("Using userscript manifest {}", manifest.display());
            self.load_manifest(project_dir, &manifest)?
        } else if module.is_file() {
            tracing::debug!("Using python userscript {}", module.display());
            self.load_python(project_dir)
        } else if executable.is_file() {
            tracing::debug!("Using executable userscript {}", executable.display());
            self.load_executable(project_dir, &executable)?
        } else {
            return Err(LitmusError::PluginLoadError {
                path: project_dir.display().to_string(),
            });
        };

        Ok(Box::new(script))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Launcher {
    Manifest,
    Python,
    Executable,
}

/// A userscript whose `main` is a child process.
#[derive(Debug, Clone)]
pub struct ProcessScript {
    launcher: Launcher,
    program: PathBuf,
    args: Vec<String>,
    project_dir: PathBuf,
}

impl ProcessScript {
    fn command(&self, params: &InvocationParams) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.project_dir);

        for (key, value) in params.keyword_args() {
            cmd.arg(format!("{}={}", key, value));
            cmd.env(format!("{}{}", ENV_PREFIX, key.to_uppercase()), value);
        }
        cmd
    }
}

#[async_trait]
impl UserScript for ProcessScript {
    async fn main(&self, params: InvocationParams) -> Result<()> {
        tracing::info!(
            "▶️ Running userscript ({:?}): {}",
            self.launcher,
            self.program.display()
        );

        let mut cmd = self.command(&params);
        let status = cmd
            .status()
            .await
            .map_err(|e| LitmusError::PluginLaunchError {
                program: self.program.display().to_string(),
                reason: if e.kind() == ErrorKind::NotFound {
                    "command not found".to_string()
                } else {
                    e.to_string()
                },
            })?;

        if status.success() {
            tracing::info!("✅ Userscript finished");
            return Ok(());
        }

        if self.launcher == Launcher::Python {
            match status.code() {
                Some(SHIM_NO_MODULE) => {
                    return Err(LitmusError::PluginLoadError {
                        path: self.project_dir.display().to_string(),
                    })
                }
                Some(SHIM_NO_MAIN) => {
                    return Err(contract_error(
                        &self.project_dir,
                        format!("{} has no callable main", PYTHON_MODULE),
                    ))
                }
                _ => {}
            }
        }

        Err(LitmusError::PluginRuntimeError {
            message: format!("userscript exited with {}", status),
            exit_code: status.code(),
        })
    }
}

fn contract_error(project_dir: &Path, reason: String) -> LitmusError {
    LitmusError::PluginContractError {
        path: project_dir.display().to_string(),
        reason,
    }
}
