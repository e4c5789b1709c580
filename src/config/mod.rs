pub mod cli;
pub mod project_list;

#[cfg(feature = "cli")]
pub use args::{CliConfig, Commands, ListArgs, RunArgs};

#[cfg(feature = "cli")]
mod args {
    use super::cli::{current_dir_string, default_projects_path, default_topology};
    use crate::adapters::process_script::DEFAULT_PYTHON;
    use crate::adapters::tool_probe::DEFAULT_TOOL;
    use crate::core::engine::RunRequest;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
    use clap::{Args, Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "litmus")]
    #[command(about = "Run device test projects through their userscripts")]
    pub struct CliConfig {
        /// Project list file (default: ~/.litmus/projects.toml)
        #[arg(long, global = true)]
        pub projects: Option<PathBuf>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub log_json: bool,

        #[arg(long, global = true, help = "Report CPU and memory around the userscript")]
        pub monitor: bool,

        /// Device tool that must be installed
        #[arg(long, global = true, default_value = DEFAULT_TOOL)]
        pub tool: String,

        #[arg(long, global = true, help = "Do not check for the device tool")]
        pub skip_tool_check: bool,

        /// Interpreter for userscript.py modules
        #[arg(long, global = true, default_value = DEFAULT_PYTHON)]
        pub python: String,

        #[command(subcommand)]
        pub command: Commands,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Commands {
        /// Run a project's userscript
        Run(RunArgs),
        /// List registered projects
        List(ListArgs),
    }

    #[derive(Debug, Clone, Args)]
    pub struct RunArgs {
        /// Project name
        pub project: String,

        /// Free-form parameter passed to the userscript
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        pub param: String,

        /// Working directory for the userscript (default: current directory)
        #[arg(short = 'd', long)]
        pub workingdir: Option<String>,

        /// Topology descriptor (default: ~/.litmus/topology)
        #[arg(short, long)]
        pub topology: Option<String>,

        /// Resolve the project and print the invocation without running it
        #[arg(long)]
        pub dry_run: bool,
    }

    #[derive(Debug, Clone, Args)]
    pub struct ListArgs {
        /// Print the project list as JSON
        #[arg(long)]
        pub json: bool,
    }

    impl CliConfig {
        pub fn projects_path(&self) -> PathBuf {
            self.projects.clone().unwrap_or_else(default_projects_path)
        }
    }

    impl RunArgs {
        pub fn to_request(&self) -> RunRequest {
            RunRequest {
                project: self.project.clone(),
                param: self.param.clone(),
                working_directory: self.workingdir.clone().unwrap_or_else(current_dir_string),
                topology: self.topology.clone().unwrap_or_else(default_topology),
                dry_run: self.dry_run,
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("projects", &self.projects_path().display().to_string())?;
            if !self.skip_tool_check {
                validate_non_empty_string("tool", &self.tool)?;
            }
            validate_non_empty_string("python", &self.python)?;

            if let Commands::Run(run) = &self.command {
                validate_non_empty_string("project", &run.project)?;
                if let Some(workingdir) = &run.workingdir {
                    validate_path("workingdir", workingdir)?;
                }
            }
            Ok(())
        }
    }

}
