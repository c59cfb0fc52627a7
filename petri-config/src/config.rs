use anyhow::{Context, Result};
use petri_types::WorldConfig;
use std::path::{Path, PathBuf};

const DEFAULT_WORLD_CONFIG_REL_PATH: &str = "../config/default.toml";

/// Parses a world config, filling any omitted top-level keys from the
/// embedded defaults so override files only need the values they change.
pub fn world_config_from_toml_str(raw: &str) -> Result<WorldConfig, toml::de::Error> {
    let mut value: toml::Value = toml::from_str(raw)?;
    merge_with_defaults(&mut value);
    value.try_into()
}

pub fn default_world_config() -> WorldConfig {
    WorldConfig::default()
}

pub fn default_world_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_WORLD_CONFIG_REL_PATH)
}

pub fn load_default_world_config() -> Result<WorldConfig> {
    load_world_config_from_path(&default_world_config_path())
}

pub fn load_world_config_from_path(path: &Path) -> Result<WorldConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read world config from {}", path.display()))?;
    world_config_from_toml_str(&raw)
        .context("world config TOML failed schema deserialization")
        .with_context(|| format!("failed to parse world config from {}", path.display()))
}

pub fn load_world_config(path: Option<&Path>) -> Result<WorldConfig> {
    match path {
        Some(path) => load_world_config_from_path(path),
        None => Ok(default_world_config()),
    }
}

fn merge_with_defaults(value: &mut toml::Value) {
    let Ok(defaults) = toml::Value::try_from(default_world_config()) else {
        return;
    };
    fill_missing(value, defaults);
}

/// Copies every key of `defaults` that `value` lacks, descending into tables
/// present on both sides.
fn fill_missing(value: &mut toml::Value, defaults: toml::Value) {
    let (Some(table), toml::Value::Table(defaults)) = (value.as_table_mut(), defaults) else {
        return;
    };
    for (key, default_value) in defaults {
        match table.get_mut(&key) {
            Some(existing) => fill_missing(existing, default_value),
            None => {
                table.insert(key, default_value);
            }
        }
    }
}
