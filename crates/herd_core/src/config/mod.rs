use crate::error::AppError;
use crate::schedule::DEFAULT_HORIZON;
use crate::storage::json_store::data_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "HERD_CONFIG_PATH";

/// Terminal colours for calendar output. Empty strings mean plain text.
#[derive(Debug, Clone)]
pub struct Palette {
    pub due: &'static str,
    pub done: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn due(&self, text: &str) -> String {
        paint(self.due, self.reset, text)
    }

    pub fn done(&self, text: &str) -> String {
        paint(self.done, self.reset, text)
    }
}

fn paint(colour: &str, reset: &str, text: &str) -> String {
    if colour.is_empty() {
        text.to_string()
    } else {
        format!("{colour}{text}{reset}")
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            due: "\x1b[38;5;208m",
            done: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            due: "\x1b[38;5;160m",
            done: "\x1b[38;5;108m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            due: "",
            done: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    match cleaned.trim_matches('_') {
        "" | "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        other => Some(other.to_string()),
    }
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    /// Repeats generated after the first occurrence of a recurring event.
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    /// Tracing filter directive, e.g. `herd_core=debug`.
    #[serde(default)]
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: None,
            horizon: DEFAULT_HORIZON,
            log: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub horizon: Option<u32>,
    pub log: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(data_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::invalid_data(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    if config.horizon == 0 {
        return Err(AppError::invalid_data(format!(
            "horizon in {} must be at least 1",
            path.display()
        )));
    }
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref().and_then(canonical_theme_name) {
        merged.theme = Some(theme);
    }
    if let Some(horizon) = overrides.horizon.filter(|horizon| *horizon > 0) {
        merged.horizon = horizon;
    }
    if let Some(log) = overrides.log.as_ref() {
        merged.log = Some(log.clone());
    }

    merged
}
