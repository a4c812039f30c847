//! Four-quadrant radial gradient background.
//!
//! Each quadrant anchor (top-left, top-right, bottom-left, bottom-right, in
//! that order) contributes its colour fading from a large circle around the
//! anchor down to a point at the opposite corner, composited with overlay.
//! Two painters produce this: one through the canvas' native gradient
//! primitive, one through a dithered coverage mask for canvases without it.

use crate::canvas::{BlendMode, Canvas};
use crate::dither::DitheredRadialGradient;
use crate::error::{IdiconError, Result};
use image::RgbaImage;
use palette::Srgb;
use serde::{Deserialize, Serialize};

/// One interpolation anchor with `N` channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop<const N: usize> {
    pub ratio: f64,
    pub channels: [f64; N],
}

/// Stops kept sorted by ratio, one stop per ratio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorStops<const N: usize> {
    stops: Vec<ColorStop<N>>,
}

impl<const N: usize> ColorStops<N> {
    pub fn new() -> Self {
        Self { stops: Vec::new() }
    }

    /// Inserts in ratio order; an equal ratio replaces the existing stop.
    /// Ratios outside `[0, 1]` are discarded and `false` is returned.
    pub fn add(&mut self, ratio: f64, channels: [f64; N]) -> bool {
        if !(0.0..=1.0).contains(&ratio) {
            return false;
        }
        let stop = ColorStop { ratio, channels };
        match self.stops.iter().position(|s| ratio <= s.ratio) {
            Some(i) if self.stops[i].ratio == ratio => self.stops[i] = stop,
            Some(i) => self.stops.insert(i, stop),
            None => self.stops.push(stop),
        }
        true
    }

    pub fn as_slice(&self) -> &[ColorStop<N>] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// The stops with boundary stops at 0 and 1 copied from their nearest
    /// neighbours when missing.
    pub fn completed(&self) -> Vec<ColorStop<N>> {
        let mut stops = self.stops.clone();
        if let Some(first) = stops.first().copied() {
            if first.ratio != 0.0 {
                stops.insert(0, ColorStop { ratio: 0.0, ..first });
            }
        }
        if let Some(last) = stops.last().copied() {
            if last.ratio != 1.0 {
                stops.push(ColorStop { ratio: 1.0, ..last });
            }
        }
        stops
    }
}

/// Linear interpolation between the stops bracketing `ratio`. Expects the
/// output of [`ColorStops::completed`].
pub fn sample_stops<const N: usize>(stops: &[ColorStop<N>], ratio: f64) -> [f64; N] {
    match stops.len() {
        0 => return [0.0; N],
        1 => return stops[0].channels,
        _ => {}
    }
    let ratio = ratio.clamp(0.0, 1.0);
    let upper = stops
        .iter()
        .position(|s| ratio < s.ratio)
        .unwrap_or(stops.len() - 1)
        .max(1);
    let (lo, hi) = (stops[upper - 1], stops[upper]);
    let span = hi.ratio - lo.ratio;
    let f = if span > 0.0 {
        (ratio - lo.ratio) / span
    } else {
        1.0
    };
    let mut out = [0.0; N];
    for (c, value) in out.iter_mut().enumerate() {
        *value = lo.channels[c] + (hi.channels[c] - lo.channels[c]) * f;
    }
    out
}

/// Radial gradient evaluated the way a 2D canvas does: the colour at a point
/// comes from the largest ω whose interpolated circle passes through it with
/// a non-negative radius. Colours interpolate in premultiplied RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    x0: f64,
    y0: f64,
    r0: f64,
    x1: f64,
    y1: f64,
    r1: f64,
    stops: ColorStops<4>,
}

impl RadialGradient {
    pub fn new(x0: f64, y0: f64, r0: f64, x1: f64, y1: f64, r1: f64) -> Self {
        Self {
            x0,
            y0,
            r0,
            x1,
            y1,
            r1,
            stops: ColorStops::new(),
        }
    }

    /// `rgb` in 0..=255 and `alpha` in `[0, 1]`.
    pub fn add_color_stop(&mut self, ratio: f64, rgb: Srgb<u8>, alpha: f64) -> bool {
        let a = alpha.clamp(0.0, 1.0);
        self.stops.add(
            ratio,
            [
                rgb.red as f64 / 255.0 * a,
                rgb.green as f64 / 255.0 * a,
                rgb.blue as f64 / 255.0 * a,
                a,
            ],
        )
    }

    pub fn stops(&self) -> &ColorStops<4> {
        &self.stops
    }

    pub fn ratio_at(&self, x: f64, y: f64) -> Option<f64> {
        let (xd, yd, rd) = (self.x1 - self.x0, self.y1 - self.y0, self.r1 - self.r0);
        let (dx, dy) = (x - self.x0, y - self.y0);
        let a = rd * rd - xd * xd - yd * yd;
        let b = 2.0 * self.r0 * rd + 2.0 * (dx * xd + dy * yd);
        let c = self.r0 * self.r0 - dx * dx - dy * dy;

        let roots: [Option<f64>; 2] = if a.abs() < f64::EPSILON {
            if b.abs() < f64::EPSILON {
                return None;
            }
            [Some(-c / b), None]
        } else {
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return None;
            }
            let root = discriminant.sqrt();
            [Some((-b + root) / (2.0 * a)), Some((-b - root) / (2.0 * a))]
        };

        roots
            .into_iter()
            .flatten()
            .filter(|w| self.r0 + w * rd >= 0.0)
            .reduce(f64::max)
    }

    /// Straight-alpha colour at a point, or `None` where the gradient does
    /// not paint.
    pub fn color_at(&self, x: f64, y: f64, stops: &[ColorStop<4>]) -> Option<[f32; 4]> {
        if stops.is_empty() {
            return None;
        }
        let ratio = self.ratio_at(x, y)?;
        let [r, g, b, a] = sample_stops(stops, ratio);
        if a <= 0.0 {
            return Some([0.0; 4]);
        }
        Some([
            (r / a) as f32,
            (g / a) as f32,
            (b / a) as f32,
            a as f32,
        ])
    }
}

/// Which painter draws the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GradientMode {
    /// Native when the canvas supports it, dithered otherwise.
    #[default]
    Auto,
    Native,
    Dithered,
}

/// Paints the four quadrant gradients onto a canvas.
pub trait BackgroundPainter {
    fn name(&self) -> &'static str;

    fn supports(&self, _canvas: &Canvas) -> bool {
        true
    }

    fn paint(&self, colors: &[Srgb<u8>; 4], canvas: &mut Canvas) -> Result<()>;
}

/// Anchor and opposite corner of each quadrant, top row first.
fn quadrants(width: f64, height: f64) -> [((f64, f64), (f64, f64)); 4] {
    let mut out = [((0.0, 0.0), (0.0, 0.0)); 4];
    for y in 0..2 {
        for x in 0..2 {
            let (fx, fy) = (x as f64, y as f64);
            out[y * 2 + x] = (
                (fx * width, fy * height),
                (width * (1.0 - fx), height * (1.0 - fy)),
            );
        }
    }
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGradientPainter;

impl BackgroundPainter for NativeGradientPainter {
    fn name(&self) -> &'static str {
        "native"
    }

    fn supports(&self, canvas: &Canvas) -> bool {
        canvas.supports_native_gradients()
    }

    fn paint(&self, colors: &[Srgb<u8>; 4], canvas: &mut Canvas) -> Result<()> {
        let (width, height) = (canvas.width() as f64, canvas.height() as f64);
        let radius = width.max(height);

        for (color, (anchor, opposite)) in colors.iter().zip(quadrants(width, height)) {
            let mut gradient =
                RadialGradient::new(anchor.0, anchor.1, radius, opposite.0, opposite.1, 0.0);
            gradient.add_color_stop(0.0, *color, 1.0);
            gradient.add_color_stop(1.0, *color, 0.0);
            canvas.fill_radial_gradient(&gradient, BlendMode::Overlay)?;
        }
        Ok(())
    }
}

/// Draws each quadrant as a solid colour whose alpha is a dithered coverage
/// ramp: 0 at the opposite corner, 255 on the circle around the anchor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DitheredGradientPainter;

impl BackgroundPainter for DitheredGradientPainter {
    fn name(&self) -> &'static str {
        "dithered"
    }

    fn paint(&self, colors: &[Srgb<u8>; 4], canvas: &mut Canvas) -> Result<()> {
        let (w, h) = (canvas.width(), canvas.height());
        let (width, height) = (w as f64, h as f64);
        let radius = width.max(height);
        let mut coverage = RgbaImage::new(w, h);

        for (color, (anchor, opposite)) in colors.iter().zip(quadrants(width, height)) {
            let mut gradient = DitheredRadialGradient::new(
                opposite.0, opposite.1, 0.0, anchor.0, anchor.1, radius,
            );
            gradient.add_color_stop(0.0, 0.0, 0.0, 0.0);
            gradient.add_color_stop(1.0, 255.0, 255.0, 255.0);
            gradient.fill_rect(&mut coverage, 0, 0, w, h);

            let mut layer = Canvas::new(w, h);
            for (src, dst) in coverage.pixels().zip(layer.image_mut().pixels_mut()) {
                dst.0 = [color.red, color.green, color.blue, src.0[0]];
            }
            canvas.draw_canvas(&layer, 0, 0, BlendMode::Overlay, 1.0);
        }
        Ok(())
    }
}

/// Picks the painter for `mode`, falling back on canvas capability for `Auto`.
pub fn painter_for(canvas: &Canvas, mode: GradientMode) -> Box<dyn BackgroundPainter> {
    match mode {
        GradientMode::Native => Box::new(NativeGradientPainter),
        GradientMode::Dithered => Box::new(DitheredGradientPainter),
        GradientMode::Auto if canvas.supports_native_gradients() => Box::new(NativeGradientPainter),
        GradientMode::Auto => Box::new(DitheredGradientPainter),
    }
}

/// Clears `canvas` and paints the background from four colours. Fails
/// before touching any pixel when the chosen painter cannot draw on `canvas`.
pub fn paint_background(
    colors: &[Srgb<u8>; 4],
    canvas: &mut Canvas,
    mode: GradientMode,
) -> Result<()> {
    let painter = painter_for(canvas, mode);
    if !painter.supports(canvas) {
        return Err(IdiconError::UnsupportedSurface("native radial gradients"));
    }
    canvas.clear();
    if canvas.is_empty() {
        return Ok(());
    }
    log::debug!(
        "Painting {}x{} background with {} gradients",
        canvas.width(),
        canvas.height(),
        painter.name()
    );
    painter.paint(colors, canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> [Srgb<u8>; 4] {
        [
            Srgb::new(0x9c, 0x7a, 0x17),
            Srgb::new(0x96, 0x61, 0xff),
            Srgb::new(0x10, 0xb4, 0xad),
            Srgb::new(0x15, 0x00, 0xf2),
        ]
    }

    #[test]
    fn stops_stay_sorted_and_unique() {
        let mut stops = ColorStops::<3>::new();
        assert!(stops.add(0.5, [1.0, 1.0, 1.0]));
        assert!(stops.add(0.2, [2.0, 2.0, 2.0]));
        assert!(stops.add(0.8, [3.0, 3.0, 3.0]));
        assert!(stops.add(0.5, [4.0, 4.0, 4.0]));
        assert!(!stops.add(1.2, [5.0, 5.0, 5.0]));
        assert!(!stops.add(-0.1, [5.0, 5.0, 5.0]));
        assert!(!stops.add(f64::NAN, [5.0, 5.0, 5.0]));

        let ratios: Vec<f64> = stops.as_slice().iter().map(|s| s.ratio).collect();
        assert_eq!(ratios, vec![0.2, 0.5, 0.8]);
        assert_eq!(stops.as_slice()[1].channels, [4.0, 4.0, 4.0]);
    }

    #[test]
    fn completed_adds_boundaries() {
        let mut stops = ColorStops::<1>::new();
        assert!(stops.completed().is_empty());
        stops.add(0.4, [10.0]);
        let done = stops.completed();
        assert_eq!(done.len(), 3);
        assert_eq!((done[0].ratio, done[0].channels), (0.0, [10.0]));
        assert_eq!((done[2].ratio, done[2].channels), (1.0, [10.0]));

        stops.add(0.0, [0.0]);
        stops.add(1.0, [20.0]);
        assert_eq!(stops.completed().len(), 3);
    }

    #[test]
    fn sampling_interpolates() {
        let mut stops = ColorStops::<1>::new();
        stops.add(0.0, [0.0]);
        stops.add(0.5, [100.0]);
        stops.add(1.0, [0.0]);
        let done = stops.completed();
        assert_eq!(sample_stops(&done, 0.25), [50.0]);
        assert_eq!(sample_stops(&done, 0.5), [100.0]);
        assert_eq!(sample_stops(&done, 1.0), [0.0]);
        assert_eq!(sample_stops(&done, 7.0), [0.0]);
    }

    #[test]
    fn native_ratio_picks_largest_valid_root() {
        let gradient = RadialGradient::new(0.0, 0.0, 1.0, 1.0, 1.0, 0.0);
        let w = gradient.ratio_at(0.0, 0.0).unwrap();
        assert!((w - (2f64.sqrt() - 1.0)).abs() < 1e-12);
        assert!((gradient.ratio_at(1.0, 1.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn native_fades_towards_opposite_corner() {
        let mut canvas = Canvas::new(16, 16);
        let mut gradient = RadialGradient::new(0.0, 0.0, 16.0, 16.0, 16.0, 0.0);
        gradient.add_color_stop(0.0, Srgb::new(255, 0, 0), 1.0);
        gradient.add_color_stop(1.0, Srgb::new(255, 0, 0), 0.0);
        canvas
            .fill_radial_gradient(&gradient, BlendMode::SourceOver)
            .unwrap();

        let near = canvas.pixel(0, 0);
        let far = canvas.pixel(15, 15);
        assert_eq!(near.0[0], 255);
        assert!(near.0[3] > far.0[3]);
        assert!(far.0[3] < 16);
    }

    #[test]
    fn auto_mode_follows_capability() {
        let native = Canvas::new(4, 4);
        let plain = Canvas::without_native_gradients(4, 4);
        assert_eq!(painter_for(&native, GradientMode::Auto).name(), "native");
        assert_eq!(painter_for(&plain, GradientMode::Auto).name(), "dithered");
        assert_eq!(painter_for(&native, GradientMode::Dithered).name(), "dithered");
    }

    #[test]
    fn forced_native_on_plain_canvas_fails_untouched() {
        let mut plain = Canvas::without_native_gradients(4, 4);
        plain.image_mut().put_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        let before = plain.clone();
        assert!(matches!(
            paint_background(&colors(), &mut plain, GradientMode::Native),
            Err(IdiconError::UnsupportedSurface(_))
        ));
        assert_eq!(plain, before);
    }

    #[test]
    fn both_painters_cover_the_canvas() {
        for mode in [GradientMode::Native, GradientMode::Dithered] {
            let mut canvas = Canvas::new(24, 24);
            paint_background(&colors(), &mut canvas, mode).unwrap();
            let painted = canvas.image().pixels().filter(|p| p.0[3] > 0).count();
            assert!(painted > 24 * 24 / 2, "{:?} painted {}", mode, painted);
        }
    }

    #[test]
    fn painters_roughly_agree() {
        let mut native = Canvas::new(32, 32);
        let mut dithered = Canvas::new(32, 32);
        paint_background(&colors(), &mut native, GradientMode::Native).unwrap();
        paint_background(&colors(), &mut dithered, GradientMode::Dithered).unwrap();

        let mean_alpha = |c: &Canvas| {
            c.image().pixels().map(|p| p.0[3] as f64).sum::<f64>() / (32.0 * 32.0)
        };
        assert!((mean_alpha(&native) - mean_alpha(&dithered)).abs() < 24.0);
    }

    #[test]
    fn empty_canvas_is_untouched() {
        let mut canvas = Canvas::new(0, 5);
        paint_background(&colors(), &mut canvas, GradientMode::Auto).unwrap();
        assert!(canvas.is_empty());
    }
}
