pub mod error;
pub mod parser;

pub use error::*;
pub use parser::{
    ProjectConfig, ProviderSettings, TOKEN_ENV, parse_config_file, parse_config_string,
    parse_duration,
};

use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SCYLLA_CLOUD_CONFIG";
const CONFIG_CANDIDATES: [&str; 3] = ["scylla.local.kdl", "scylla.kdl", ".scylla.kdl"];

/// Locate the project file
///
/// Search order:
/// 1. `SCYLLA_CLOUD_CONFIG` (direct path)
/// 2. current directory: scylla.local.kdl, scylla.kdl, .scylla.kdl
/// 3. `./.scylla-cloud/` with the same names
/// 4. `~/.config/scylla-cloud/scylla.kdl`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points at missing file {}, searching defaults",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    if let Some(path) = find_in(&current_dir) {
        return Ok(path);
    }

    let project_dir = current_dir.join(scylla_cloud::state::STATE_DIR);
    if project_dir.is_dir()
        && let Some(path) = find_in(&project_dir)
    {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("scylla-cloud").join("scylla.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find and parse the project file
pub fn load_project() -> Result<(PathBuf, ProjectConfig)> {
    let path = find_config_file()?;
    let config = parse_config_file(&path)?;
    Ok((path, config))
}
