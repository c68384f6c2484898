//! Config file discovery and parsing

use crate::domain::ContextConfig;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File names looked up at the repository root, in order.
pub const CONFIG_CANDIDATES: &[&str] =
    &["repo-map.toml", ".repo-map.toml", "repo-map.yml", "repo-map.yaml"];

/// Settings may also live under this table/key.
const NESTED_KEY: &str = "repo-map";

/// Load the build configuration for `repo_root`.
///
/// An explicit `config_path` must parse. An auto-discovered file that fails
/// to parse is reported with a warning and defaults are used instead.
pub fn load_config(repo_root: &Path, config_path: Option<&Path>) -> Result<ContextConfig> {
    let explicit = config_path.is_some();
    let Some(config_file) = config_path.map(Path::to_path_buf).or_else(|| discover_config(repo_root))
    else {
        return Ok(ContextConfig::default());
    };

    match parse_config_file(&config_file) {
        Ok(cfg) => {
            tracing::debug!("loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::warn!("ignoring config {}: {e:#}", config_file.display());
            Ok(ContextConfig::default())
        }
    }
}

fn parse_config_file(config_file: &Path) -> Result<ContextConfig> {
    let content = fs::read_to_string(config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => parse_toml_config(&content, config_file),
        "yaml" | "yml" => parse_yaml_config(&content, config_file),
        other => Err(anyhow!(
            "Unsupported config extension '.{other}' for file {}",
            config_file.display()
        )),
    }
}

/// Parse TOML, reading a `[repo-map]` table when present.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<ContextConfig> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;
    let value = match raw.get(NESTED_KEY) {
        Some(nested) => nested.clone(),
        None => raw,
    };
    value.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML, reading a `repo-map:` mapping when present.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<ContextConfig> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;
    // An empty document means "all defaults".
    if raw.is_null() {
        return Ok(ContextConfig::default());
    }
    let value = match raw.get(NESTED_KEY) {
        Some(nested) => nested.clone(),
        None => raw,
    };
    serde_yaml::from_value(value)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(repo_root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|name| repo_root.join(name)).find(|path| path.is_file())
}
