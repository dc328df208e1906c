//! Configuration loader: built-in label defaults with optional TOML overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Label geometry defaults, all in millimetres.
///
/// Mirrors the `[default]` table of the config file. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub font_size: f64,
    pub border_width: f64,
    pub corner_radius: f64,
    /// Minimum clear space between the text and the border.
    pub min_padding: f64,
    pub min_width: f64,
    pub min_height: f64,
    /// Distance from the label edge to the magnet pocket.
    pub magnet_inset: f64,
    pub magnet_diameter: f64,
    /// Reserve room for an icon left of the text when sizing.
    pub use_icon: bool,
    pub icon_size: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            border_width: 2.0,
            corner_radius: 8.0,
            min_padding: 4.0,
            min_width: 30.0,
            min_height: 15.0,
            magnet_inset: 10.0,
            magnet_diameter: 6.0,
            use_icon: false,
            icon_size: 10.0,
        }
    }
}

impl Defaults {
    /// Narrowest label that still fits both magnet pockets.
    pub fn min_width_for_magnets(&self) -> f64 {
        2.0 * self.magnet_inset + self.magnet_diameter
    }
}

/// Where to find the rendering engine and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Explicit engine executable; skips the built-in search.
    pub path: Option<PathBuf>,
    /// Explicit geometry template; skips the built-in search.
    pub template: Option<PathBuf>,
    /// Where measurement renders put their scratch files. Sandboxed engine
    /// builds may not see the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub measure_timeout_secs: u64,
    /// Zero waits forever.
    pub export_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: None,
            template: None,
            scratch_dir: None,
            measure_timeout_secs: 30,
            export_timeout_secs: 600,
        }
    }
}

/// Font selection plus the empirical constants tied to that face.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontSettings {
    pub family: String,
    pub style: String,
    /// Multiplier applied to widths from local font metrics.
    pub width_correction: f64,
    /// Average advance width as a fraction of the font size.
    pub advance_ratio: f64,
    /// Capital glyph whose cap height calibrates millimetres.
    pub reference_glyph: char,
    pub reference_px: f32,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            style: "Bold".to_string(),
            width_correction: 1.4,
            advance_ratio: 0.87,
            reference_glyph: 'H',
            reference_px: 100.0,
        }
    }
}

impl FontSettings {
    /// Font name in the engine's `Family:style=Style` syntax.
    pub fn engine_font_name(&self) -> String {
        if self.style.is_empty() {
            self.family.clone()
        } else {
            format!("{}:style={}", self.family, self.style)
        }
    }
}

/// All settings for one run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub default: Defaults,
    pub engine: EngineSettings,
    pub font: FontSettings,
}

impl Config {
    /// Parse a TOML document; absent fields keep their defaults.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make sizing meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.default;
        let positive = [
            ("default.font_size", d.font_size),
            ("default.min_width", d.min_width),
            ("default.min_height", d.min_height),
            ("default.icon_size", d.icon_size),
            ("font.width_correction", self.font.width_correction),
            ("font.advance_ratio", self.font.advance_ratio),
            ("font.reference_px", f64::from(self.font.reference_px)),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }

        let non_negative = [
            ("default.border_width", d.border_width),
            ("default.corner_radius", d.corner_radius),
            ("default.min_padding", d.min_padding),
            ("default.magnet_inset", d.magnet_inset),
            ("default.magnet_diameter", d.magnet_diameter),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }

        if self.font.family.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "font.family",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn measure_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.engine.measure_timeout_secs)
    }

    pub fn export_timeout(&self) -> Option<std::time::Duration> {
        match self.engine.export_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

/// Resolve the path to the config file.
///
/// Tries in order:
/// 1. `MAGNETIC_LABEL_CONFIG` environment variable
/// 2. `magnetic_label.toml` in the current directory
/// 3. `magnetic-label/config.toml` in the user config directory
///
/// Returns `None` when no candidate exists.
fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MAGNETIC_LABEL_CONFIG") {
        return Some(PathBuf::from(p));
    }

    let local = PathBuf::from("magnetic_label.toml");
    if local.exists() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("magnetic-label").join("config.toml");
    user.exists().then_some(user)
}

/// Load a config file from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&content, path)
}

/// Load the project configuration, or the built-in defaults when no file exists.
pub fn load_config() -> Result<Config, ConfigError> {
    match resolve_config_path() {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            load_config_from(&path)
        }
        None => {
            tracing::debug!("no config file found, using built-in defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_label_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.default.font_size, 12.0);
        assert_eq!(cfg.default.border_width, 2.0);
        assert_eq!(cfg.default.min_padding, 4.0);
        assert_eq!(cfg.default.min_width, 30.0);
        assert_eq!(cfg.default.min_height, 15.0);
        assert_eq!(cfg.default.min_width_for_magnets(), 26.0);
        assert_eq!(cfg.font.engine_font_name(), "Arial:style=Bold");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let toml = r#"
[default]
min_width = 40

[engine]
export_timeout_secs = 0

[font]
family = "Helvetica"
style = ""
"#;
        let cfg = Config::from_toml_str(toml, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.default.min_width, 40.0);
        assert_eq!(cfg.default.min_height, 15.0);
        assert_eq!(cfg.export_timeout(), None);
        assert_eq!(cfg.measure_timeout().as_secs(), 30);
        assert_eq!(cfg.font.engine_font_name(), "Helvetica");
        assert_eq!(cfg.font.advance_ratio, 0.87);
    }

    #[test]
    fn example_file_matches_defaults() {
        let example = include_str!("../magnetic_label.example.toml");
        let cfg = Config::from_toml_str(example, Path::new("magnetic_label.example.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Config::from_toml_str("[default]\nfontsize = 3\n", Path::new("x.toml"));
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn negative_padding_is_rejected() {
        let err = Config::from_toml_str("[default]\nmin_padding = -1.0\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(format!("{err}").contains("default.min_padding"));
    }

    #[test]
    fn zero_spacing_values_are_accepted() {
        let toml = "[default]\nborder_width = 0\ncorner_radius = 0\nmin_padding = 0\nmagnet_inset = 0\nmagnet_diameter = 0\n";
        let cfg = Config::from_toml_str(toml, Path::new("x.toml")).unwrap();
        assert_eq!(cfg.default.border_width, 0.0);
        assert_eq!(cfg.default.min_width_for_magnets(), 0.0);
    }

    #[test]
    fn zero_or_infinite_sizes_are_rejected() {
        for toml in ["[default]\nmin_width = 0\n", "[default]\nfont_size = inf\n", "[default]\nborder_width = nan\n"] {
            assert!(
                matches!(Config::from_toml_str(toml, Path::new("x.toml")), Err(ConfigError::Invalid { .. })),
                "{toml}"
            );
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nmeasure_timeout_secs = 5\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.measure_timeout().as_secs(), 5);

        let missing = load_config_from(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
