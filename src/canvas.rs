//! Software drawing surface.
//!
//! Stores straight (non-premultiplied) RGBA8 pixels and samples coverage at
//! pixel centres, so shapes that share an edge never overlap and nothing is
//! painted outside a shape's clip rectangle.

use crate::error::{IdiconError, Result};
use crate::gradient::RadialGradient;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Line segments used to flatten each cubic curve.
pub const CURVE_SEGMENTS: usize = 16;

pub type Point = (f64, f64);

/// How a source colour combines with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlendMode {
    SourceOver,
    Overlay,
    Multiply,
    /// Porter-Duff plus.
    Lighter,
}

impl BlendMode {
    fn blend(self, backdrop: f32, source: f32) -> f32 {
        match self {
            BlendMode::SourceOver | BlendMode::Lighter => source,
            BlendMode::Multiply => backdrop * source,
            BlendMode::Overlay => {
                if backdrop <= 0.5 {
                    source * 2.0 * backdrop
                } else {
                    let b = 2.0 * backdrop - 1.0;
                    source + b - source * b
                }
            }
        }
    }

    /// Composites straight-alpha `source` onto `backdrop`, both in `[0, 1]`.
    pub fn composite(self, source: [f32; 4], backdrop: [f32; 4]) -> [f32; 4] {
        let alpha_s = source[3];
        let alpha_b = backdrop[3];

        if self == BlendMode::Lighter {
            let alpha_o = (alpha_s + alpha_b).min(1.0);
            if alpha_o <= 0.0 {
                return [0.0; 4];
            }
            let mut out = [0.0, 0.0, 0.0, alpha_o];
            for c in 0..3 {
                let premul = source[c] * alpha_s + backdrop[c] * alpha_b;
                out[c] = (premul / alpha_o).min(1.0);
            }
            return out;
        }

        let alpha_o = alpha_s + alpha_b * (1.0 - alpha_s);
        if alpha_o <= 0.0 {
            return [0.0; 4];
        }
        let mut out = [0.0, 0.0, 0.0, alpha_o];
        for c in 0..3 {
            let mixed =
                (1.0 - alpha_b) * source[c] + alpha_b * self.blend(backdrop[c], source[c]);
            let premul = alpha_s * mixed + (1.0 - alpha_s) * alpha_b * backdrop[c];
            out[c] = (premul / alpha_o).clamp(0.0, 1.0);
        }
        out
    }
}

fn unit(px: &[u8]) -> [f32; 4] {
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
        px[3] as f32 / 255.0,
    ]
}

fn store(px: &mut [u8], color: [f32; 4]) {
    if color[3] <= 0.0 {
        px.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    for (dst, value) in px.iter_mut().zip(color) {
        *dst = (value * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Half-open range of pixel indices whose centres fall in `[start, start + len)`.
fn pixel_span(start: f64, len: f64, limit: u32) -> (u32, u32) {
    let lo = (start - 0.5).ceil().clamp(0.0, limit as f64);
    let hi = (start + len - 0.5).ceil().clamp(0.0, limit as f64);
    (lo as u32, hi.max(lo) as u32)
}

/// Closed polygons built from lines and flattened cubic curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<Point>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.subpaths.push(vec![(x, y)]);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        match self.subpaths.last_mut() {
            Some(points) => points.push((x, y)),
            None => self.move_to(x, y),
        }
    }

    pub fn bezier_curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        let last = self.subpaths.last().and_then(|p| p.last()).copied();
        let start = match last {
            Some(p) => p,
            None => {
                self.move_to(c1.0, c1.1);
                c1
            }
        };
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            self.line_to(
                a * start.0 + b * c1.0 + c * c2.0 + d * end.0,
                a * start.1 + b * c1.1 + c * c2.1 + d * end.1,
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|p| p.len() < 3)
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.subpaths.iter().flatten()
    }

    /// Maps every point through `f`.
    pub fn transformed(&self, f: impl Fn(Point) -> Point) -> Path {
        Path {
            subpaths: self
                .subpaths
                .iter()
                .map(|points| points.iter().map(|p| f(*p)).collect())
                .collect(),
        }
    }

    /// Rotates by whole quarter turns (clockwise on screen) about the origin.
    /// Exact, so equal turns modulo 4 produce identical paths.
    pub fn rotated_quarter_turns(&self, turns: u32) -> Path {
        match turns % 4 {
            0 => self.clone(),
            1 => self.transformed(|(x, y)| (-y, x)),
            2 => self.transformed(|(x, y)| (-x, -y)),
            _ => self.transformed(|(x, y)| (y, -x)),
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Path {
        self.transformed(|(x, y)| (x + dx, y + dy))
    }

    /// Non-zero winding crossings of the horizontal line at `y`, sorted by x.
    fn crossings(&self, y: f64) -> Vec<(f64, i32)> {
        let mut hits = Vec::new();
        for points in &self.subpaths {
            if points.len() < 2 {
                continue;
            }
            for i in 0..points.len() {
                let p0 = points[i];
                let p1 = points[(i + 1) % points.len()];
                let winding = if p0.1 <= y && y < p1.1 {
                    1
                } else if p1.1 <= y && y < p0.1 {
                    -1
                } else {
                    continue;
                };
                let x = p0.0 + (y - p0.1) * (p1.0 - p0.0) / (p1.1 - p0.1);
                hits.push((x, winding));
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits
    }
}

/// RGBA raster that the identicon pipeline draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
    native_gradients: bool,
}

impl Canvas {
    /// A transparent canvas with native radial gradient support.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            native_gradients: true,
        }
    }

    /// A transparent canvas that only offers pixel access for gradients.
    pub fn without_native_gradients(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            native_gradients: false,
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            native_gradients: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn supports_native_gradients(&self) -> bool {
        self.native_gradients
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn clear(&mut self) {
        self.image.fill(0);
    }

    /// Replaces every pixel whose centre lies inside `rect`.
    pub fn fill_rect(&mut self, rect: RectF, color: Rgba<u8>) {
        let (x0, x1) = pixel_span(rect.x, rect.width, self.width());
        let (y0, y1) = pixel_span(rect.y, rect.height, self.height());
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        draw_filled_rect_mut(
            &mut self.image,
            Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0),
            color,
        );
    }

    /// Fills `path` with the non-zero rule, touching only pixels inside `clip`.
    pub fn fill_path(&mut self, path: &Path, color: Rgba<u8>, clip: RectF) {
        if path.is_empty() {
            return;
        }
        let (x0, x1) = pixel_span(clip.x, clip.width, self.width());
        let (y0, y1) = pixel_span(clip.y, clip.height, self.height());
        let source = unit(&color.0);

        for py in y0..y1 {
            let crossings = path.crossings(py as f64 + 0.5);
            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let (start, end) = pixel_span(pair[0].0, pair[1].0 - pair[0].0, self.width());
                for px in start.max(x0)..end.min(x1) {
                    let dst = self.image.get_pixel_mut(px, py);
                    let out = BlendMode::SourceOver.composite(source, unit(&dst.0));
                    store(&mut dst.0, out);
                }
            }
        }
    }

    /// Composites `source` with its top-left corner at `(dx, dy)`, scaling
    /// its alpha by `alpha`.
    pub fn draw_canvas(&mut self, source: &Canvas, dx: i64, dy: i64, mode: BlendMode, alpha: f32) {
        if self.is_empty() || source.is_empty() {
            return;
        }
        let width = self.width() as usize;
        let src_w = source.width() as i64;
        let src_h = source.height() as i64;
        let src_raw = source.image.as_raw();
        let pixels: &mut [u8] = &mut self.image;

        pixels
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = y as i64 - dy;
                if sy < 0 || sy >= src_h {
                    return;
                }
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let sx = x as i64 - dx;
                    if sx < 0 || sx >= src_w {
                        continue;
                    }
                    let offset = ((sy * src_w + sx) * 4) as usize;
                    let mut color = unit(&src_raw[offset..offset + 4]);
                    color[3] *= alpha;
                    if color[3] <= 0.0 {
                        continue;
                    }
                    let out = mode.composite(color, unit(px));
                    store(px, out);
                }
            });
    }

    /// Evaluates `gradient` at every pixel centre and composites it with `mode`.
    pub fn fill_radial_gradient(
        &mut self,
        gradient: &RadialGradient,
        mode: BlendMode,
    ) -> Result<()> {
        if !self.native_gradients {
            return Err(IdiconError::UnsupportedSurface("native radial gradients"));
        }
        let stops = gradient.stops().completed();
        if self.is_empty() || stops.is_empty() {
            return Ok(());
        }
        let width = self.width() as usize;
        let pixels: &mut [u8] = &mut self.image;

        pixels
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                    if let Some(color) = gradient.color_at(cx, cy, &stops) {
                        let out = mode.composite(color, unit(px));
                        store(px, out);
                    }
                }
            });
        Ok(())
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| IdiconError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}
