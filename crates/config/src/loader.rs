use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env_subst::substitute_env;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "chanbridge.toml",
    "chanbridge.yaml",
    "chanbridge.yml",
    "chanbridge.json",
];

/// Load the config from `path`, or discover one when `path` is `None`.
///
/// Returns an empty object when nothing is found, so collaborators report a
/// missing section rather than a missing file.
pub fn load(path: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    if let Some(path) = path {
        return load_config_value(path);
    }
    match discover_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config_value(&path)
        },
        None => {
            debug!("no config file found, using empty config");
            Ok(serde_json::Value::Object(serde_json::Map::new()))
        },
    }
}

/// Read and parse a config file (any supported format) with env substitution.
pub fn load_config_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config_value(&raw, path)
}

/// Find the first config file in `./` then the user config dir.
pub fn discover_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/chanbridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chanbridge").map(|d| d.config_dir().to_path_buf())
}

fn parse_config_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
