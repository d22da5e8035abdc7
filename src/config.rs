//! Preset configuration.
//!
//! Handles loading, validating, and merging `thumbsmith.toml`. Stock defaults
//! are overridden by the user file placed in the source directory.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "webp"           # avif | webp | png | jpeg
//! quality = 90              # Lossy encoding quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [[presets]]
//! name = "grid"             # Unique preset name
//! width = 400               # Thumbnail box
//! height = 500
//! method = "crop"           # crop | resize (default resize)
//! horizontal = "center"     # left | center | right (crop only)
//! vertical = "middle"       # top | middle | bottom (crop only)
//! sharpen = true            # Light unsharp mask (default true)
//! ```
//!
//! ## Partial Configuration
//!
//! Tables merge key by key, so overriding one value keeps the rest:
//!
//! ```toml
//! [output]
//! format = "avif"
//! ```
//!
//! Arrays replace: a file that declares any `[[presets]]` replaces the whole
//! stock preset list.
//!
//! Unknown keys are rejected to catch typos early. Anchors on a `resize`
//! preset are rejected too, since they would have no effect.

use crate::imaging::{OutputFormat, Quality, Sharpening, ThumbnailConfig};
use crate::transform::{TransformDescriptor, TransformError, TransformMethod};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the source directory.
pub const CONFIG_FILENAME: &str = "thumbsmith.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Preset \"{name}\": {source}")]
    Preset {
        name: String,
        #[source]
        source: TransformError,
    },
}

/// Tool configuration loaded from `thumbsmith.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Encoding settings shared by every preset.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Thumbnail renditions generated for every source image.
    pub presets: Vec<PresetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            processing: ProcessingConfig::default(),
            presets: default_presets(),
        }
    }
}

fn default_presets() -> Vec<PresetConfig> {
    vec![
        PresetConfig {
            name: "grid".into(),
            width: 400,
            height: 500,
            method: TransformMethod::Crop,
            horizontal: None,
            vertical: None,
            sharpen: true,
        },
        PresetConfig {
            name: "square".into(),
            width: 200,
            height: 200,
            method: TransformMethod::Crop,
            horizontal: None,
            vertical: Some("top".into()),
            sharpen: true,
        },
        PresetConfig {
            name: "preview".into(),
            width: 1200,
            height: 1200,
            method: TransformMethod::Resize,
            horizontal: None,
            vertical: None,
            sharpen: false,
        },
    ]
}

impl Config {
    /// Validate config values are within acceptable ranges and every preset
    /// describes a buildable transformation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.presets.is_empty() {
            return Err(ConfigError::Validation(
                "at least one preset is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        // Presets share the output format, so box + token determine the file name.
        let mut outputs: HashMap<(u32, u32, String), &str> = HashMap::new();
        for preset in &self.presets {
            if preset.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "presets.name must not be empty".into(),
                ));
            }
            if !seen.insert(preset.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate preset name \"{}\"",
                    preset.name
                )));
            }
            if preset.width == 0 || preset.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "preset \"{}\": width and height must be non-zero",
                    preset.name
                )));
            }
            let token = preset.transform()?.encode();
            if let Some(other) = outputs.insert((preset.width, preset.height, token), &preset.name) {
                return Err(ConfigError::Validation(format!(
                    "presets \"{}\" and \"{}\" would write the same file",
                    other, preset.name
                )));
            }
        }
        Ok(())
    }

    /// Resolve every preset into the parameters the imaging layer consumes.
    pub fn thumbnail_configs(&self) -> Result<Vec<(String, ThumbnailConfig)>, ConfigError> {
        self.presets
            .iter()
            .map(|p| Ok((p.name.clone(), p.thumbnail_config(&self.output)?)))
            .collect()
    }
}

/// Encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Lossy encoding quality (1 = worst, 100 = best). Ignored by lossless formats.
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            quality: 90,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// One named thumbnail rendition.
///
/// Anchors are kept as the words the user wrote so that a misplaced or
/// misspelled anchor is reported against its preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_method")]
    pub method: TransformMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    #[serde(default = "default_sharpen")]
    pub sharpen: bool,
}

fn default_method() -> TransformMethod {
    crate::transform::DEFAULT_METHOD
}

fn default_sharpen() -> bool {
    true
}

impl PresetConfig {
    /// Build the preset's descriptor through the fluent setters.
    pub fn transform(&self) -> Result<TransformDescriptor, ConfigError> {
        self.build_transform().map_err(|source| ConfigError::Preset {
            name: self.name.clone(),
            source,
        })
    }

    fn build_transform(&self) -> Result<TransformDescriptor, TransformError> {
        let mut transform = match self.method {
            TransformMethod::Crop => TransformDescriptor::crop(),
            TransformMethod::Resize => TransformDescriptor::resize(),
        };
        if let Some(horizontal) = &self.horizontal {
            transform = transform.with_horizontal_anchor_named(horizontal)?;
        }
        if let Some(vertical) = &self.vertical {
            transform = transform.with_vertical_anchor_named(vertical)?;
        }
        Ok(transform)
    }

    pub fn thumbnail_config(&self, output: &OutputConfig) -> Result<ThumbnailConfig, ConfigError> {
        Ok(ThumbnailConfig {
            width: self.width,
            height: self.height,
            transform: self.transform()?,
            format: output.format,
            quality: Quality::new(output.quality),
            sharpening: self.sharpen.then(Sharpening::light),
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `thumbsmith.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using stock defaults");
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    tracing::debug!(path = %config_path.display(), "loaded config file");
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `thumbsmith.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `thumbsmith.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbsmith configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as thumbsmith.toml in the source directory.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[output]
# File format of every thumbnail: avif, webp, png or jpeg.
format = "webp"

# Lossy encoding quality (1 = worst, 100 = best). WebP and PNG are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
# Every preset is rendered for every source image. Declaring any preset
# replaces this whole list.
#
#   method      resize: fit inside width x height, keeping the aspect ratio
#               crop:   fill width x height exactly, cutting the overflow
#   horizontal  left | center | right   (crop only, default center)
#   vertical    top | middle | bottom   (crop only, default middle)
#
# Output files are named {stem}-{width}x{height}{token}.{ext}, where the
# token lists the non-default fields, e.g. dawn-200x200-crop-top.webp.

[[presets]]
name = "grid"
width = 400
height = 500
method = "crop"
sharpen = true

[[presets]]
name = "square"
width = 200
height = 200
method = "crop"
vertical = "top"
sharpen = true

[[presets]]
name = "preview"
width = 1200
height = 1200
method = "resize"
sharpen = false
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{HorizontalAnchor, VerticalAnchor};
    use tempfile::TempDir;

    fn preset(name: &str) -> PresetConfig {
        PresetConfig {
            name: name.into(),
            width: 100,
            height: 100,
            method: TransformMethod::Crop,
            horizontal: None,
            vertical: None,
            sharpen: false,
        }
    }

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.output.format, OutputFormat::Webp);
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.processing.max_processes, None);
        let names: Vec<&str> = config.presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["grid", "square", "preview"]);
    }

    #[test]
    fn default_presets_tokens() {
        let tokens: Vec<String> = Config::default()
            .presets
            .iter()
            .map(|p| p.transform().unwrap().encode())
            .collect();
        assert_eq!(tokens, ["-crop", "-crop-top", ""]);
    }

    #[test]
    fn parse_preset_with_anchors() {
        let config: Config = toml::from_str(
            r#"
[[presets]]
name = "banner"
width = 1200
height = 300
method = "crop"
horizontal = "left"
vertical = "bottom"
"#,
        )
        .unwrap();
        let p = &config.presets[0];
        assert!(p.sharpen);
        let t = p.transform().unwrap();
        assert_eq!(t.horizontal_anchor(), HorizontalAnchor::Left);
        assert_eq!(t.vertical_anchor(), VerticalAnchor::Bottom);
        // Untouched sections keep their defaults
        assert_eq!(config.output.quality, 90);
    }

    #[test]
    fn preset_method_defaults_to_resize() {
        let config: Config = toml::from_str(
            r#"
[[presets]]
name = "fit"
width = 300
height = 300
"#,
        )
        .unwrap();
        assert_eq!(config.presets[0].method, TransformMethod::Resize);
    }

    #[test]
    fn thumbnail_configs_carry_output_settings() {
        let mut config = Config::default();
        config.output.format = OutputFormat::Avif;
        config.output.quality = 70;
        let resolved = config.thumbnail_configs().unwrap();
        assert_eq!(resolved.len(), 3);
        let (name, grid) = &resolved[0];
        assert_eq!(name, "grid");
        assert_eq!(grid.format, OutputFormat::Avif);
        assert_eq!(grid.quality.value(), 70);
        assert_eq!(grid.sharpening, Some(Sharpening::light()));
        assert_eq!(resolved[2].1.sharpening, None);
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_boundary() {
        let mut config = Config::default();
        config.output.quality = 100;
        assert!(config.validate().is_ok());

        config.output.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));

        config.output.quality = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_quality() {
        let mut config = Config::default();
        config.output.quality = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Config validation error: output.quality must be 1-100");
    }

    #[test]
    fn validate_rejects_presets_sharing_a_file_name() {
        let soft = PresetConfig {
            width: 40,
            height: 50,
            ..preset("soft")
        };
        let sharp = PresetConfig {
            sharpen: true,
            ..soft.clone()
        };
        let mut config = Config::default();
        config.presets = vec![
            soft,
            PresetConfig {
                name: "sharp".into(),
                ..sharp
            },
        ];

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("\"soft\" and \"sharp\""));
    }

    #[test]
    fn validate_allows_same_box_with_different_tokens() {
        let top = PresetConfig {
            vertical: Some("top".into()),
            ..preset("top")
        };
        let mut config = Config::default();
        config.presets = vec![preset("center"), top];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_presets() {
        let mut config = Config::default();
        config.presets.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut config = Config::default();
        config.presets = vec![preset("a"), preset("a")];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate preset name \"a\""));
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut config = Config::default();
        config.presets = vec![preset("  ")];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        let mut config = Config::default();
        let mut p = preset("flat");
        p.height = 0;
        config.presets = vec![p];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn anchor_on_resize_preset_is_invalid_state() {
        let mut config = Config::default();
        let mut p = preset("fit");
        p.method = TransformMethod::Resize;
        p.horizontal = Some("left".into());
        config.presets = vec![p];

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Preset {
                ref name,
                source: TransformError::InvalidState { .. },
            } if name == "fit"
        ));
    }

    #[test]
    fn unknown_anchor_word_is_invalid_argument() {
        let mut config = Config::default();
        let mut p = preset("odd");
        p.vertical = Some("center".into());
        config.presets = vec![p];

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Preset {
                source: TransformError::InvalidArgument { .. },
                ..
            }
        ));
        assert!(err.to_string().starts_with("Preset \"odd\": "));
    }

    // =========================================================================
    // Threads
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[output]\nformat = \"webp\"\nquality = 90\n").unwrap();
        let overlay: toml::Value = toml::from_str("[output]\nquality = 60\n").unwrap();
        let merged = merge_toml(base, overlay);
        let output = merged.get("output").unwrap();
        assert_eq!(output.get("format").unwrap().as_str(), Some("webp"));
        assert_eq!(output.get("quality").unwrap().as_integer(), Some(60));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[[presets]]
name = "only"
width = 64
height = 64
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let presets = merged.get("presets").unwrap().as_array().unwrap();
        assert_eq!(presets.len(), 1);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.presets.len(), 3);
        assert_eq!(config.output.format, OutputFormat::Webp);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[output]
format = "png"

[[presets]]
name = "avatar"
width = 96
height = 96
method = "crop"
vertical = "top"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Png);
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.presets.len(), 1);
        assert_eq!(config.presets[0].transform().unwrap().encode(), "-crop-top");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[output\nformat = ").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[output]\nqualty = 90\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_preset_key_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
[[presets]]
name = "x"
width = 1
height = 1
anchor = "left"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_method_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
[[presets]]
name = "x"
width = 1
height = 1
method = "stretch"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn load_config_validates_presets() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[[presets]]
name = "fit"
width = 300
height = 300
method = "resize"
vertical = "top"
"#,
        )
        .unwrap();

        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Preset { .. })
        ));
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.presets.len(), 3);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.output.format, defaults.output.format);
        assert_eq!(config.output.quality, defaults.output.quality);
        assert_eq!(config.presets.len(), defaults.presets.len());
        for (a, b) in config.presets.iter().zip(&defaults.presets) {
            assert_eq!(a.name, b.name);
            assert_eq!((a.width, a.height), (b.width, b.height));
            assert_eq!(a.transform().unwrap(), b.transform().unwrap());
            assert_eq!(a.sharpen, b.sharpen);
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        assert!(val.get("output").is_some());
        assert!(val.get("processing").is_some());
        assert!(val.get("presets").is_some());
    }
}
