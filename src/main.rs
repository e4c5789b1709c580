use clap::Parser;
use litmus::config::{Commands, ListArgs, RunArgs};
use litmus::core::{Prerequisite, ProjectSource};
use litmus::utils::{error::LitmusError, logger, validation::Validate};
use litmus::{
    CliConfig, NoPrerequisite, ProcessScriptLoader, RunEngine, TomlProjectSource, ToolProbe,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let result = match &config.command {
        Commands::Run(args) => {
            if config.skip_tool_check {
                run_project(&config, args, NoPrerequisite).await
            } else {
                run_project(&config, args, ToolProbe::new(config.tool.clone())).await
            }
        }
        Commands::List(args) => list_projects(&config, args),
    };

    if let Err(e) = result {
        report_failure(&e);
        std::process::exit(e.exit_code());
    }
}

async fn run_project<P: Prerequisite>(
    config: &CliConfig,
    args: &RunArgs,
    prerequisite: P,
) -> Result<(), LitmusError> {
    let request = args.to_request();
    tracing::info!("🚀 Running project {}", request.project);

    let source = TomlProjectSource::new(config.projects_path());
    let loader = ProcessScriptLoader::with_python(config.python.clone());
    let engine = RunEngine::new_with_monitoring(prerequisite, source, loader, config.monitor);

    let report = engine.run(&request).await?;

    if report.dry_run {
        println!("{}", serde_json::to_string_pretty(&report.params)?);
    } else {
        tracing::info!(
            "✅ Project {} finished in {}ms",
            report.project_name,
            (report.finished_at - report.started_at).num_milliseconds()
        );
    }
    Ok(())
}

fn list_projects(config: &CliConfig, args: &ListArgs) -> Result<(), LitmusError> {
    let source = TomlProjectSource::new(config.projects_path());
    let projects = source.load()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&projects.projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects registered in {}", source.describe());
        return Ok(());
    }

    for project in projects.iter() {
        let line = format!(
            "{:<20} {:<12} {:<40} {}",
            project.name,
            project.kind.as_deref().unwrap_or("-"),
            project.path,
            project.description.as_deref().unwrap_or("")
        );
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn report_failure(e: &LitmusError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ litmus failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}
