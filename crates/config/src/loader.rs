use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::DonnaConfig};

/// Config file name, checked project-local then user-global.
const CONFIG_FILENAME: &str = "donna.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<DonnaConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./donna.toml` (project-local)
/// 2. `~/.config/donna/donna.toml` (user-global)
///
/// Returns `DonnaConfig::default()` if no config file is found or the file
/// fails to parse (the parse failure is logged, not fatal).
pub fn discover_and_load() -> DonnaConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    DonnaConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    let global = config_dir()?.join(CONFIG_FILENAME);
    global.exists().then_some(global)
}

/// The user-global config directory (`~/.config/donna` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "donna").map(|d| d.config_dir().to_path_buf())
}
