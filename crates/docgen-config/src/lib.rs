//! Configuration management for docgen.
//!
//! Parses `docgen.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! The file only carries overrides. [`Config::resolve`] merges them with the
//! built-in defaults exactly once and produces the immutable [`RenderConfig`]
//! the renderer is constructed with.
//!
//! ## Defaults
//!
//! Lengths default to millimetre values (indent 10, bullet indent 5, cell
//! margin 2, line height 5, page margin 10). When `page.unit = "in"` the
//! defaults are converted to inches; explicit values are always taken in the
//! configured unit. Any size left out or set to `0` reverts to its default.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docgen.toml";

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

const DEFAULT_NOMINAL_INDENT: f64 = 10.0;
const DEFAULT_BULLET_INDENT: f64 = 5.0;
const DEFAULT_NOMINAL_FONT_SIZE: f64 = 12.0;
const DEFAULT_HEADING_FONT_SIZES: [f64; 6] = [24.0, 22.0, 20.0, 18.0, 16.0, 14.0];
const DEFAULT_CELL_MARGIN: f64 = 2.0;
const DEFAULT_LINE_HEIGHT: f64 = 5.0;
const DEFAULT_PAGE_MARGIN: f64 = 10.0;

/// Application configuration as read from `docgen.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page geometry.
    pub page: PageConfig,
    /// Indent and font size overrides.
    pub sizes: SizesConfig,
    /// Font settings.
    pub font: FontConfig,
    /// Text normalisation settings.
    pub text: TextConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Page orientation.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Unit of measurement for every length in the document.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Millimetres.
    #[default]
    Mm,
    /// Inches.
    In,
}

impl Unit {
    /// Convert a length given in millimetres into this unit.
    #[must_use]
    pub fn from_mm(self, mm: f64) -> f64 {
        match self {
            Self::Mm => mm,
            Self::In => mm / MM_PER_INCH,
        }
    }

    /// Typographic points in one unit; font sizes are always in points.
    #[must_use]
    pub fn points_per_unit(self) -> f64 {
        match self {
            Self::Mm => POINTS_PER_INCH / MM_PER_INCH,
            Self::In => POINTS_PER_INCH,
        }
    }
}

/// Paper size. Unrecognised names fall back to A4.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum Paper {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl From<String> for Paper {
    fn from(name: String) -> Self {
        match name.as_str() {
            "A3" => Self::A3,
            "A5" => Self::A5,
            "Letter" => Self::Letter,
            "Legal" => Self::Legal,
            _ => Self::A4,
        }
    }
}

impl Paper {
    /// Portrait width and height in millimetres.
    #[must_use]
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            Self::A3 => (297.0, 420.0),
            Self::A4 => (210.0, 297.0),
            Self::A5 => (148.0, 210.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
        }
    }
}

/// Page configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Portrait or landscape.
    pub orientation: Orientation,
    /// Unit used for all lengths.
    pub unit: Unit,
    /// Paper size.
    pub paper: Paper,
    /// Page margin on all four sides (default: 10mm).
    pub margin: Option<f64>,
}

/// Size overrides. Zero or missing values revert to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SizesConfig {
    /// Indent used for blockquotes, lists and code blocks.
    pub nominal_indent: Option<f64>,
    /// Additional indent for each list item.
    pub bullet_indent: Option<f64>,
    /// Base font size in points.
    pub nominal_font_size: Option<f64>,
    /// Font sizes for heading levels 1 to 6.
    pub heading_font_sizes: Option<Vec<f64>>,
    /// Top/bottom margin of table cells.
    pub cell_margin: Option<f64>,
}

/// Font configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font family name.
    pub family: Option<String>,
    /// Base line height.
    pub line_height: Option<f64>,
}

/// Text normalisation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Marker expanded to four spaces in text, like a literal tab.
    pub visual_tab: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            visual_tab: "~".to_owned(),
        }
    }
}

/// Resolved page geometry in the configured unit.
#[derive(Clone, Debug, PartialEq)]
pub struct PageGeometry {
    /// Page width.
    pub width: f64,
    /// Page height.
    pub height: f64,
    /// Margin on all sides.
    pub margin: f64,
    /// Unit of all lengths.
    pub unit: Unit,
}

/// Resolved size table.
#[derive(Clone, Debug, PartialEq)]
pub struct Sizes {
    /// Indent used for blockquotes, lists and code blocks.
    pub nominal_indent: f64,
    /// Additional indent for each list item.
    pub bullet_indent: f64,
    /// Base font size in points.
    pub nominal_font_size: f64,
    /// Font sizes for heading levels 1 to 6.
    pub heading_font_sizes: [f64; 6],
    /// Top/bottom margin of table cells.
    pub cell_margin: f64,
}

impl Sizes {
    /// Font size for a heading level (1-6). Out of range levels clamp.
    #[must_use]
    pub fn heading_font_size(&self, level: u8) -> f64 {
        let idx = usize::from(level.clamp(1, 6)) - 1;
        self.heading_font_sizes[idx]
    }
}

/// Immutable configuration handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Page geometry.
    pub page: PageGeometry,
    /// Size table.
    pub sizes: Sizes,
    /// Font family.
    pub font_family: String,
    /// Base line height.
    pub line_height: f64,
    /// Marker expanded to four spaces in text.
    pub visual_tab: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Config::default().resolve()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Treat missing and zero values as "use the default".
fn or_default(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => v,
        _ => default,
    }
}

/// Require an optional length or size to be non-negative.
fn require_non_negative(value: Option<f64>, field: &str) -> Result<(), ConfigError> {
    if let Some(v) = value
        && (v < 0.0 || !v.is_finite())
    {
        return Err(ConfigError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docgen.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge overrides with defaults into the renderer's configuration.
    #[must_use]
    pub fn resolve(&self) -> RenderConfig {
        let unit = self.page.unit;
        let (w, h) = self.page.paper.dimensions_mm();
        let (w, h) = match self.page.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };

        let mut heading_font_sizes = DEFAULT_HEADING_FONT_SIZES;
        if let Some(overrides) = &self.sizes.heading_font_sizes {
            for (slot, value) in heading_font_sizes.iter_mut().zip(overrides) {
                *slot = or_default(Some(*value), *slot);
            }
        }

        RenderConfig {
            page: PageGeometry {
                width: unit.from_mm(w),
                height: unit.from_mm(h),
                margin: or_default(self.page.margin, unit.from_mm(DEFAULT_PAGE_MARGIN)),
                unit,
            },
            sizes: Sizes {
                nominal_indent: or_default(
                    self.sizes.nominal_indent,
                    unit.from_mm(DEFAULT_NOMINAL_INDENT),
                ),
                bullet_indent: or_default(
                    self.sizes.bullet_indent,
                    unit.from_mm(DEFAULT_BULLET_INDENT),
                ),
                nominal_font_size: or_default(
                    self.sizes.nominal_font_size,
                    DEFAULT_NOMINAL_FONT_SIZE,
                ),
                heading_font_sizes,
                cell_margin: or_default(self.sizes.cell_margin, unit.from_mm(DEFAULT_CELL_MARGIN)),
            },
            font_family: self
                .font
                .family
                .clone()
                .unwrap_or_else(|| "Arial".to_owned()),
            line_height: or_default(self.font.line_height, unit.from_mm(DEFAULT_LINE_HEIGHT)),
            visual_tab: self.text.visual_tab.clone(),
        }
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative(self.page.margin, "page.margin")?;
        require_non_negative(self.sizes.nominal_indent, "sizes.nominal_indent")?;
        require_non_negative(self.sizes.bullet_indent, "sizes.bullet_indent")?;
        require_non_negative(self.sizes.nominal_font_size, "sizes.nominal_font_size")?;
        require_non_negative(self.sizes.cell_margin, "sizes.cell_margin")?;
        require_non_negative(self.font.line_height, "font.line_height")?;

        if let Some(sizes) = &self.sizes.heading_font_sizes {
            if sizes.len() > 6 {
                return Err(ConfigError::Validation(
                    "sizes.heading_font_sizes accepts at most 6 values".to_owned(),
                ));
            }
            for size in sizes {
                require_non_negative(Some(*size), "sizes.heading_font_sizes")?;
            }
        }

        if let Some(family) = &self.font.family
            && family.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "font.family cannot be empty".to_owned(),
            ));
        }

        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file starting at `start` and walking up.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default().resolve();
        assert_eq!(config.page.width, 210.0);
        assert_eq!(config.page.height, 297.0);
        assert_eq!(config.page.margin, 10.0);
        assert_eq!(config.sizes.nominal_indent, 10.0);
        assert_eq!(config.sizes.bullet_indent, 5.0);
        assert_eq!(config.sizes.nominal_font_size, 12.0);
        assert_eq!(
            config.sizes.heading_font_sizes,
            [24.0, 22.0, 20.0, 18.0, 16.0, 14.0]
        );
        assert_eq!(config.sizes.cell_margin, 2.0);
        assert_eq!(config.font_family, "Arial");
        assert_eq!(config.line_height, 5.0);
        assert_eq!(config.visual_tab, "~");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.page.paper, Paper::A4);
        assert_eq!(config.page.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_parse_page_config() {
        let toml = r#"
[page]
orientation = "landscape"
paper = "A3"
"#;
        let config = Config::from_toml_str(toml).unwrap().resolve();
        assert_eq!(config.page.width, 420.0);
        assert_eq!(config.page.height, 297.0);
    }

    #[test]
    fn test_unknown_paper_falls_back_to_a4() {
        let toml = r#"
[page]
paper = "B7"
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.page.paper, Paper::A4);
    }

    #[test]
    fn test_inch_unit_converts_defaults() {
        let toml = r#"
[page]
unit = "in"
paper = "Letter"
"#;
        let config = Config::from_toml_str(toml).unwrap().resolve();
        assert!((config.page.width - 8.5).abs() < 1e-9);
        assert!((config.page.height - 11.0).abs() < 1e-9);
        assert!((config.sizes.nominal_indent - 10.0 / 25.4).abs() < 1e-9);
        // Font sizes are points regardless of unit
        assert_eq!(config.sizes.nominal_font_size, 12.0);
    }

    #[test]
    fn test_zero_sizes_revert_to_defaults() {
        let toml = r"
[sizes]
nominal_indent = 0
bullet_indent = 7
heading_font_sizes = [30, 0]
";
        let config = Config::from_toml_str(toml).unwrap().resolve();
        assert_eq!(config.sizes.nominal_indent, 10.0);
        assert_eq!(config.sizes.bullet_indent, 7.0);
        assert_eq!(config.sizes.heading_font_size(1), 30.0);
        assert_eq!(config.sizes.heading_font_size(2), 22.0);
        assert_eq!(config.sizes.heading_font_size(6), 14.0);
    }

    #[test]
    fn test_heading_font_size_clamps_level() {
        let sizes = Config::default().resolve().sizes;
        assert_eq!(sizes.heading_font_size(0), 24.0);
        assert_eq!(sizes.heading_font_size(9), 14.0);
    }

    #[test]
    fn test_negative_size_rejected() {
        let toml = r"
[sizes]
cell_margin = -1
";
        let result = Config::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_too_many_heading_sizes_rejected() {
        let toml = r"
[sizes]
heading_font_sizes = [1, 2, 3, 4, 5, 6, 7]
";
        let result = Config::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_font_family_rejected() {
        let toml = r#"
[font]
family = "  "
"#;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: font.family cannot be empty"
        );
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_toml_str("[page\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = Config::load(Some(Path::new("/nonexistent/docgen.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docgen.toml");
        std::fs::write(
            &path,
            "[font]\nfamily = \"Courier\"\nline_height = 6\n\n[text]\nvisual_tab = \"^\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.config_path, Some(path));

        let resolved = config.resolve();
        assert_eq!(resolved.font_family, "Courier");
        assert_eq!(resolved.line_height, 6.0);
        assert_eq!(resolved.visual_tab, "^");
    }

    #[test]
    fn test_discover_from_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        let found = Config::discover_from(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILENAME));
    }
}
