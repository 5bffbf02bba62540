/// Config file loading and creation for the powerpair CLI.
///
/// Config lives at ~/.config/powerpair/config.toml.
/// All fields are optional; CLI args override config values.
use powerpair_core::DrawOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct PowerpairConfig {
    /// "power_paired" or "random".
    pub kind: Option<String>,
    pub seed: Option<u64>,
    pub json: Option<bool>,
    /// Draw option overrides, passed through to the engine by name.
    #[serde(default)]
    pub draw: BTreeMap<String, toml::Value>,
    /// Defaults with the `[draw]` table applied, filled in by `load_config`.
    #[serde(skip)]
    pub options: DrawOptions,
}

impl PowerpairConfig {
    /// The `[draw]` table as `(name, value)` strings for `DrawOptions::set`.
    pub fn draw_overrides(&self) -> Result<Vec<(String, String)>, String> {
        self.draw
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    other => return Err(format!("Unsupported value for draw option {key}: {other}")),
                };
                Ok((key.clone(), value))
            })
            .collect()
    }

    /// Default draw options with every `[draw]` entry applied.
    pub fn draw_options(&self) -> Result<DrawOptions, String> {
        let overrides = self.draw_overrides()?;
        DrawOptions::from_overrides(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map_err(|e| e.to_string())
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# powerpair configuration
# All values here can be overridden by CLI flags.

# Draw type: \"power_paired\" or \"random\" (first round)
# kind = \"power_paired\"

# Fixed random seed for reproducible draws
# seed = 42

# Print JSON instead of a table
# json = false

[draw]
# Give the affirmative to the team that has affirmed less (off: random sides)
# balance_sides = true

# Conflict detection and swap costs
# avoid_history = true
# avoid_institution = true
# history_penalty = 100
# institution_penalty = 1

# pullup_top | pullup_bottom | pullup_random | intermediate
# odd_bracket = \"pullup_top\"

# slide | fold | random
# pairing_method = \"slide\"

# one_up_one_down | none
# avoid_conflicts = \"one_up_one_down\"
";

/// Returns the default config path: ~/.config/powerpair/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("powerpair").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
///
/// The `[draw]` table is checked here, so a bad option name or value fails
/// before any standings are read.
pub fn load_config(path: &Path) -> PowerpairConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Invalid config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PowerpairConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<PowerpairConfig, String> {
    let mut cfg: PowerpairConfig = toml::from_str(content).map_err(|e| e.to_string())?;
    cfg.options = cfg.draw_options()?;
    if let Some(ref kind) = cfg.kind {
        kind.parse::<powerpair_core::DrawKind>().map_err(|e| e.to_string())?;
    }
    Ok(cfg)
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> PathBuf {
    let path = config_path();

    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));

    path
}
