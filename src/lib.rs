//! Deterministic identicons: a string is hashed, the digest picks five
//! pattern layers and four background colours, and the result is painted
//! onto an RGBA canvas.

mod canvas;
mod catalog;
mod decoder;
mod digest;
mod dither;
mod error;
mod gradient;
mod identicon;
mod layer;
mod options;
mod patch;

pub use canvas::{BlendMode, Canvas, Path, Point, RectF, CURVE_SEGMENTS};
pub use catalog::{CellMask, CellRole, CENTER_PATCH_TYPES, GRID_STEPS, PATCH_TYPES};
pub use decoder::{
    Extra, PatchConfiguration, PatchGroup, INITIAL_LAYER_BLEND_MODE, LAYER_BLEND_MODES,
};
pub use digest::{DigestSource, HashDigest, Sha256Source};
pub use dither::{diffuse_error, DitheredRadialGradient, GradientColorStop};
pub use error::{IdiconError, Result};
pub use gradient::{
    paint_background, painter_for, sample_stops, BackgroundPainter, ColorStop, ColorStops,
    DitheredGradientPainter, GradientMode, NativeGradientPainter, RadialGradient,
};
pub use identicon::{render_png, DebugInfo, Idicon};
pub use layer::{composite_layers, render_layer, LAYER_COUNT};
pub use options::{parse_hex_color, PatchPalette, RenderOptions};
pub use patch::{patch_path, render_patch, resolve_shape, PatchColors};
