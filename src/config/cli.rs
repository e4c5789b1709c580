use std::path::PathBuf;

pub const LITMUS_DIR: &str = ".litmus";
pub const PROJECTS_FILE: &str = "projects.toml";
pub const TOPOLOGY_FILE: &str = "topology";

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// `~/` 開頭的路徑展開為家目錄
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn litmus_home() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from(".")).join(LITMUS_DIR)
}

pub fn default_projects_path() -> PathBuf {
    litmus_home().join(PROJECTS_FILE)
}

pub fn default_topology() -> String {
    litmus_home().join(TOPOLOGY_FILE).display().to_string()
}

pub fn current_dir_string() -> String {
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| ".".to_string())
}
