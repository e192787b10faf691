//! Lumen configuration system
//!
//! Settings for the `lumen` renderer, loaded from `lumen.toml`. Every
//! section falls back to its defaults, so a file only needs the keys it
//! changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "lumen.toml";

/// Main configuration structure for Lumen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LumenConfig {
    /// Text and font settings
    pub text: TextConfig,
    /// Layout box and alignment
    pub layout: LayoutConfig,
    /// Decorations drawn around the text
    pub style: StyleConfig,
    /// Output image settings
    pub render: RenderConfig,
}

/// An RGBA color with channels in `[0, 1]`.
pub type Rgba = [f32; 4];

/// Text and font configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Path to a font file (.ttf/.otf); a system font is used when unset
    pub font: Option<PathBuf>,
    /// Font family looked up among system fonts when no path is given
    pub family: Option<String>,
    /// Text size in points
    pub size: f32,
    /// Dots per inch used to convert points to pixels
    pub dpi: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Begin,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Wrap {
    None,
    #[default]
    Word,
    All,
}

/// Layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of the layout box and of the output image in pixels
    pub width: f32,
    /// Height of the layout box and of the output image in pixels
    pub height: f32,
    pub horizontal_alignment: HorizontalAlign,
    pub vertical_alignment: VerticalAlign,
    pub wrap: Wrap,
    /// Extra space between lines in pixels
    pub line_spacing: f32,
    /// Force right-to-left paragraphs instead of detecting the direction
    pub right_to_left: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnderlineKind {
    #[default]
    Solid,
    Dashed,
    Double,
}

/// Decoration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub underline: bool,
    pub underline_kind: UnderlineKind,
    pub underline_color: Rgba,
    /// Underline thickness in pixels; 0 uses the font's thickness
    pub underline_height: f32,
    pub dash_width: f32,
    pub dash_gap: f32,
    pub strikethrough: bool,
    pub strikethrough_color: Rgba,
    pub strikethrough_height: f32,
    /// Shadow offset in pixels; no shadow when zero
    pub shadow_offset: [f32; 2],
    pub shadow_color: Rgba,
    /// Outline width in pixels; no outline when zero
    pub outline_width: u16,
    pub outline_color: Rgba,
    pub background: bool,
    pub background_color: Rgba,
    /// Cut the text out of the background
    pub cutout: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Behaviour {
    #[default]
    TextAndStyles,
    NoText,
    NoStyles,
    Mask,
    OverlayStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    A8,
    #[default]
    Rgba8888,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub behaviour: Behaviour,
    pub pixel_format: Format,
    /// Draw every line from the left edge regardless of its alignment
    pub ignore_horizontal_alignment: bool,
    /// Output PNG path
    pub output: PathBuf,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: None,
            family: None,
            size: 16.0,
            dpi: 72.0,
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl TextConfig {
    /// Text size in pixels.
    pub fn pixel_size(&self) -> f32 {
        self.size * self.dpi / 72.0
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 200.0,
            horizontal_alignment: HorizontalAlign::Begin,
            vertical_alignment: VerticalAlign::Top,
            wrap: Wrap::Word,
            line_spacing: 0.0,
            right_to_left: None,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            underline: false,
            underline_kind: UnderlineKind::Solid,
            underline_color: [0.0, 0.0, 0.0, 1.0],
            underline_height: 0.0,
            dash_width: 2.0,
            dash_gap: 1.0,
            strikethrough: false,
            strikethrough_color: [0.0, 0.0, 0.0, 1.0],
            strikethrough_height: 0.0,
            shadow_offset: [0.0, 0.0],
            shadow_color: [0.0, 0.0, 0.0, 1.0],
            outline_width: 0,
            outline_color: [1.0, 1.0, 1.0, 1.0],
            background: false,
            background_color: [1.0, 1.0, 1.0, 1.0],
            cutout: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            behaviour: Behaviour::TextAndStyles,
            pixel_format: Format::Rgba8888,
            ignore_horizontal_alignment: false,
            output: PathBuf::from("lumen.png"),
        }
    }
}

impl LumenConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the lumen.toml configuration file
    ///
    /// # Returns
    /// * `Ok(LumenConfig)` - Successfully loaded configuration
    /// * `Err(String)` - Error message if loading failed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Load configuration from the default location (lumen.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => config,
            Err(err) => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    tracing::warn!(%err, "ignoring unreadable {}", DEFAULT_CONFIG_FILE);
                }
                Self::default()
            }
        }
    }

    /// Write configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path.as_ref(), content).map_err(|e| format!("Failed to write config file: {}", e))
    }

    /// Load configuration for the renderer
    ///
    /// An explicit path must load; without one, lumen.toml is used when
    /// present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_or_default(),
        };
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}
