//! CLI settings – reads `~/.sdfgraph/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Unit used when printing pose angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl std::str::FromStr for AngleUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "radians" | "rad" => Ok(AngleUnit::Radians),
            "degrees" | "deg" => Ok(AngleUnit::Degrees),
            other => Err(format!("unknown angle unit '{other}'")),
        }
    }
}

impl std::fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AngleUnit::Radians => write!(f, "radians"),
            AngleUnit::Degrees => write!(f, "degrees"),
        }
    }
}

/// User configuration stored in `~/.sdfgraph/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log_format: LogFormat,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Decimal places for printed poses.
    #[serde(default = "default_precision")]
    pub precision: usize,

    #[serde(default)]
    pub angle_unit: AngleUnit,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_precision() -> usize {
    6
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            precision: default_precision(),
            angle_unit: AngleUnit::default(),
        }
    }
}

/// Return the path to `~/.sdfgraph/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".sdfgraph").join("config.toml")
}

/// Load the config from `path` (or the default location), apply environment
/// overrides, and fall back to defaults when the file does not exist.
pub fn load(path: Option<&Path>) -> Result<Config, String> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let mut cfg = load_from(&path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config at {}: {}", path.display(), e))?;
    Ok(Some(cfg))
}

/// Apply `SDFGRAPH_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SDFGRAPH_LOG_FORMAT` | `log_format` |
/// | `SDFGRAPH_LOG_LEVEL` | `log_level` |
/// | `SDFGRAPH_PRECISION` | `precision` |
/// | `SDFGRAPH_ANGLE_UNIT` | `angle_unit` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary variable source.  Values that do not
/// parse are ignored.
pub(crate) fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SDFGRAPH_LOG_FORMAT")
        && let Ok(format) = v.parse() {
            cfg.log_format = format;
        }
    if let Some(v) = var("SDFGRAPH_LOG_LEVEL")
        && !v.trim().is_empty() {
            cfg.log_level = v;
        }
    if let Some(v) = var("SDFGRAPH_PRECISION")
        && let Ok(precision) = v.trim().parse::<usize>() {
            cfg.precision = precision;
        }
    if let Some(v) = var("SDFGRAPH_ANGLE_UNIT")
        && let Ok(unit) = v.parse() {
            cfg.angle_unit = unit;
        }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_path_points_to_sdfgraph_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".sdfgraph"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let result = load_from(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "precision = 3\nangle_unit = \"degrees\"\n").expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.precision, 3);
        assert_eq!(cfg.angle_unit, AngleUnit::Degrees);
        assert_eq!(cfg.log_format, LogFormat::Compact);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "precision = \"many\"\n").expect("write");
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }

    #[test]
    fn overrides_change_every_field() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("SDFGRAPH_LOG_FORMAT", "json"),
                ("SDFGRAPH_LOG_LEVEL", "sdfgraph_frames=debug"),
                ("SDFGRAPH_PRECISION", "2"),
                ("SDFGRAPH_ANGLE_UNIT", "deg"),
            ]),
        );
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.log_level, "sdfgraph_frames=debug");
        assert_eq!(cfg.precision, 2);
        assert_eq!(cfg.angle_unit, AngleUnit::Degrees);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("SDFGRAPH_LOG_FORMAT", "xml"),
                ("SDFGRAPH_LOG_LEVEL", "  "),
                ("SDFGRAPH_PRECISION", "-1"),
                ("SDFGRAPH_ANGLE_UNIT", "gradians"),
            ]),
        );
        assert_eq!(cfg, Config::default());
    }
}
