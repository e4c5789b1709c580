#![cfg(unix)]

use anyhow::Result;
use litmus::core::{InvocationState, ProjectSource};
use litmus::{
    LitmusError, ProcessScriptLoader, RunEngine, RunRequest, TomlProjectSource, ToolProbe,
};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

// 記錄參數與環境變數的 userscript
const RECORDING_SCRIPT: &str = r#"#!/bin/sh
for arg in "$@"; do
    echo "$arg" >> "$LITMUS_WORKINGDIR/args.txt"
done
env | grep '^LITMUS_' | sort > "$LITMUS_WORKINGDIR/env.txt"
pwd > "$LITMUS_WORKINGDIR/pwd.txt"
"#;

// 將收到的關鍵字參數寫到 workingdir/kwargs.json
const RECORDING_PY: &str = r#"import json
import os
import sys


def main(**kwargs):
    record = {"kwargs": kwargs, "first_on_path": sys.path[0] == kwargs["project_path"]}
    with open(os.path.join(kwargs["workingdir"], "kwargs.json"), "w") as f:
        json.dump(record, f)
"#;

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn write_executable(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("bin")).unwrap();
        std::fs::create_dir_all(root.path().join("work")).unwrap();
        write_executable(&root.path().join("bin/sdb"), "#!/bin/sh\nexit 0\n");
        Self { root }
    }

    fn path(&self, rel: &str) -> String {
        self.root.path().join(rel).display().to_string()
    }

    fn project_dir(&self, name: &str) -> String {
        let dir = self.root.path().join("projects").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir.display().to_string()
    }

    fn write_project_list(&self, entries: &[(&str, &str)]) -> String {
        let mut content = String::new();
        for (name, path) in entries {
            content.push_str(&format!(
                "[[projects]]\nname = \"{}\"\npath = \"{}\"\n\n",
                name, path
            ));
        }
        let list_path = self.path("projects.toml");
        std::fs::write(&list_path, content).unwrap();
        list_path
    }

    fn engine(
        &self,
        list_path: &str,
    ) -> RunEngine<ToolProbe, TomlProjectSource, ProcessScriptLoader> {
        RunEngine::new(
            ToolProbe::new("sdb").with_search_path(self.path("bin")),
            TomlProjectSource::new(list_path),
            ProcessScriptLoader::new(),
        )
    }

    fn request(&self, project: &str) -> RunRequest {
        RunRequest {
            project: project.to_string(),
            param: "--iterations 3".to_string(),
            working_directory: self.path("work"),
            topology: "tv-topology.yaml".to_string(),
            dry_run: false,
        }
    }
}

#[tokio::test]
async fn test_scenario_a_resolves_and_runs() -> Result<()> {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    write_executable(&Path::new(&alpha).join("userscript"), RECORDING_SCRIPT);
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let report = assert_ok!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert_eq!(report.state, InvocationState::Succeeded);
    assert_eq!(report.params.as_ref().unwrap().project_path, alpha);

    let args = std::fs::read_to_string(fx.path("work/args.txt"))?;
    let lines: Vec<&str> = args.lines().collect();
    assert_eq!(
        lines,
        vec![
            "project_name=alpha".to_string(),
            format!("project_path={}", alpha),
            "param=--iterations 3".to_string(),
            format!("workingdir={}", fx.path("work")),
            "topology=tv-topology.yaml".to_string(),
        ]
    );

    let env = std::fs::read_to_string(fx.path("work/env.txt"))?;
    assert!(env.contains("LITMUS_PROJECT_NAME=alpha"));
    assert!(env.contains("LITMUS_PARAM=--iterations 3"));
    assert!(env.contains("LITMUS_TOPOLOGY=tv-topology.yaml"));

    // userscript 在專案目錄中執行
    let pwd = std::fs::read_to_string(fx.path("work/pwd.txt"))?;
    assert_eq!(
        Path::new(pwd.trim()).canonicalize()?,
        Path::new(&alpha).canonicalize()?
    );
    Ok(())
}

#[tokio::test]
async fn test_scenario_b_unknown_project() {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    write_executable(&Path::new(&alpha).join("userscript"), RECORDING_SCRIPT);
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("beta")).await);
    assert!(matches!(err, LitmusError::ProjectNotFound { ref name } if name == "beta"));
    assert!(!Path::new(&fx.path("work/args.txt")).exists());
}

#[tokio::test]
async fn test_scenario_c_no_userscript() {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(err, LitmusError::PluginLoadError { .. }));
}

#[tokio::test]
async fn test_scenario_d_userscript_without_main() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(
        Path::new(&alpha).join("userscript.py"),
        "import os\n\ndef prepare():\n    pass\n",
    )
    .unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(err, LitmusError::PluginContractError { .. }));
}

#[tokio::test]
async fn test_python_userscript_receives_keyword_args() -> Result<()> {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return Ok(());
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(Path::new(&alpha).join("userscript.py"), RECORDING_PY)?;
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let mut request = fx.request("alpha");
    request.param = "a=b c".to_string();
    let report = assert_ok!(fx.engine(&list).run(&request).await);
    assert_eq!(report.state, InvocationState::Succeeded);

    let recorded: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fx.path("work/kwargs.json"))?)?;
    let kwargs = recorded["kwargs"].as_object().unwrap();
    assert_eq!(kwargs.len(), 5);
    assert_eq!(kwargs["project_name"], "alpha");
    assert_eq!(kwargs["project_path"], alpha.as_str());
    assert_eq!(kwargs["param"], "a=b c");
    assert_eq!(kwargs["workingdir"], fx.path("work").as_str());
    assert_eq!(kwargs["topology"], "tv-topology.yaml");
    assert_eq!(recorded["first_on_path"], true);
    Ok(())
}

#[tokio::test]
async fn test_python_main_imported_from_sibling_module() -> Result<()> {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return Ok(());
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(Path::new(&alpha).join("helpers.py"), RECORDING_PY)?;
    std::fs::write(
        Path::new(&alpha).join("userscript.py"),
        "from helpers import main
",
    )?;
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    assert_ok!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(Path::new(&fx.path("work/kwargs.json")).exists());
    Ok(())
}

#[tokio::test]
async fn test_python_main_only_in_docstring() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(
        Path::new(&alpha).join("userscript.py"),
        "\"\"\"\ndef main(\n\"\"\"\n",
    )
    .unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(err, LitmusError::PluginContractError { .. }));
}

#[tokio::test]
async fn test_python_main_not_callable() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(Path::new(&alpha).join("userscript.py"), "main = 3
").unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(err, LitmusError::PluginContractError { .. }));
}

#[tokio::test]
async fn test_scenario_e_python_main_raises() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(
        Path::new(&alpha).join("userscript.py"),
        "def main(**kwargs):\n    raise RuntimeError('device not attached')\n",
    )
    .unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    match err {
        LitmusError::PluginRuntimeError { exit_code, .. } => assert_eq!(exit_code, Some(1)),
        other => panic!("expected PluginRuntimeError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_python_main_exit_code_passes_through() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(
        Path::new(&alpha).join("userscript.py"),
        "import sys\n\ndef main(**kwargs):\n    sys.exit(4)\n",
    )
    .unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(
        err,
        LitmusError::PluginRuntimeError {
            exit_code: Some(4),
            ..
        }
    ));
}

#[tokio::test]
async fn test_python_userscript_broken_import_is_runtime_error() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(
        Path::new(&alpha).join("userscript.py"),
        "import litmus_missing_dependency\n\ndef main(**kwargs):\n    pass\n",
    )
    .unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(err, LitmusError::PluginRuntimeError { .. }));
}

#[tokio::test]
async fn test_scenario_d_non_executable_userscript() {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::write(Path::new(&alpha).join("userscript"), RECORDING_SCRIPT).unwrap();
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert!(matches!(err, LitmusError::PluginContractError { .. }));
    assert!(!Path::new(&fx.path("work/args.txt")).exists());
}

#[tokio::test]
async fn test_scenario_e_script_failure_propagates() {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    write_executable(
        &Path::new(&alpha).join("userscript"),
        "#!/bin/sh\necho 'device not attached' >&2\nexit 7\n",
    );
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let err = assert_err!(fx.engine(&list).run(&fx.request("alpha")).await);
    match err {
        LitmusError::PluginRuntimeError { exit_code, .. } => assert_eq!(exit_code, Some(7)),
        other => panic!("expected PluginRuntimeError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_tool_stops_before_project_list() {
    let fx = Fixture::new();
    std::fs::remove_file(fx.path("bin/sdb")).unwrap();
    // 專案列表格式錯誤，若被讀取會回報設定錯誤
    std::fs::write(fx.path("projects.toml"), "[[projects]\n").unwrap();

    let err = assert_err!(
        fx.engine(&fx.path("projects.toml"))
            .run(&fx.request("alpha"))
            .await
    );
    assert!(matches!(err, LitmusError::PrerequisiteMissing { .. }));
}

#[tokio::test]
async fn test_manifest_userscript_receives_manifest_args_first() -> Result<()> {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    std::fs::create_dir_all(Path::new(&alpha).join("bin"))?;
    write_executable(&Path::new(&alpha).join("bin/run.sh"), RECORDING_SCRIPT);
    std::fs::write(
        Path::new(&alpha).join("userscript.toml"),
        "[main]\ncommand = \"./bin/run.sh\"\nargs = [\"--suite\", \"smoke\"]\n",
    )?;
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    assert_ok!(fx.engine(&list).run(&fx.request("alpha")).await);

    let args = std::fs::read_to_string(fx.path("work/args.txt"))?;
    let lines: Vec<&str> = args.lines().collect();
    assert_eq!(lines[0], "--suite");
    assert_eq!(lines[1], "smoke");
    assert_eq!(lines[2], "project_name=alpha");
    assert_eq!(lines.len(), 7);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_projects_use_first_entry() -> Result<()> {
    let fx = Fixture::new();
    let first = fx.project_dir("first");
    let second = fx.project_dir("second");
    write_executable(&Path::new(&first).join("userscript"), RECORDING_SCRIPT);
    write_executable(&Path::new(&second).join("userscript"), "#!/bin/sh\nexit 9\n");
    let list = fx.write_project_list(&[("alpha", first.as_str()), ("alpha", second.as_str())]);

    let loaded = TomlProjectSource::new(&list).load()?;
    assert_eq!(loaded.len(), 2);

    let report = assert_ok!(fx.engine(&list).run(&fx.request("alpha")).await);
    assert_eq!(report.params.unwrap().project_path, first);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_does_not_touch_userscript() {
    let fx = Fixture::new();
    let alpha = fx.project_dir("alpha");
    let list = fx.write_project_list(&[("alpha", alpha.as_str())]);

    let mut request = fx.request("alpha");
    request.dry_run = true;

    // 沒有 userscript，但 dry run 不會載入
    let report = assert_ok!(fx.engine(&list).run(&request).await);
    assert!(report.dry_run);
    assert_eq!(report.params.unwrap().topology, "tv-topology.yaml");
}
