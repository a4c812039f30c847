use crate::catalog::CellMask;
use crate::error::{IdiconError, Result};
use crate::gradient::GradientMode;
use crate::patch::PatchColors;
use image::Rgba;
use palette::Srgb;
use serde::{Deserialize, Serialize};

/// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
pub fn parse_hex_color(value: &str) -> Result<Srgb<u8>> {
    value
        .parse::<Srgb<u8>>()
        .map_err(|e| IdiconError::InvalidColor {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn opaque(color: Srgb<u8>) -> Rgba<u8> {
    Rgba([color.red, color.green, color.blue, 255])
}

/// Patch colours as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchPalette {
    pub foreground: String,
    pub background: String,
}

impl Default for PatchPalette {
    fn default() -> Self {
        Self {
            foreground: "#000000".to_string(),
            background: "#ffffff".to_string(),
        }
    }
}

impl PatchPalette {
    pub fn resolve(&self) -> Result<PatchColors> {
        Ok(PatchColors {
            foreground: opaque(parse_hex_color(&self.foreground)?),
            background: opaque(parse_hex_color(&self.background)?),
        })
    }
}

/// Per-render settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Side of the square the pattern layers occupy. `None` or 0 uses the
    /// shorter canvas side.
    pub size: Option<u32>,
    pub cells: CellMask,
    pub gradient: GradientMode,
    pub palette: PatchPalette,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: None,
            cells: CellMask::ALL,
            gradient: GradientMode::Auto,
            palette: PatchPalette::default(),
        }
    }
}

impl RenderOptions {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| IdiconError::Config(e.to_string()))
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_cells(mut self, cells: CellMask) -> Self {
        self.cells = cells;
        self
    }

    pub fn with_gradient(mut self, gradient: GradientMode) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn layer_size(&self, width: u32, height: u32) -> u32 {
        match self.size {
            Some(size) if size > 0 => size,
            _ => width.min(height),
        }
    }
}
