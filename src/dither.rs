//! Radial gradient rendered by hand with Floyd–Steinberg dithering.
//!
//! Used where the canvas has no gradient primitive of its own. The float
//! colour field is computed per pixel, then quantized channel by channel
//! while the truncation error is pushed onto unvisited neighbours.

use crate::gradient::{sample_stops, ColorStop, ColorStops};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

pub type GradientColorStop = ColorStop<3>;

/// Gradient between the circles `(x0, y0, r0)` and `(x1, y1, r1)` with RGB
/// stops in 0..=255.
#[derive(Debug, Clone, PartialEq)]
pub struct DitheredRadialGradient {
    x0: f64,
    y0: f64,
    r0: f64,
    x1: f64,
    y1: f64,
    r1: f64,
    stops: ColorStops<3>,
}

impl DitheredRadialGradient {
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

    pub fn add_color_stop(&mut self, ratio: f64, r: f64, g: f64, b: f64) -> bool {
        self.stops.add(ratio, [r, g, b])
    }

    pub fn stops(&self) -> &[GradientColorStop] {
        self.stops.as_slice()
    }

    /// Root `(-b + sqrt(b² - 4ac)) / 2a` of the circle interpolation
    /// quadratic, clamped to `[0, 1]`. `None` when the discriminant is
    /// negative.
    pub fn ratio_at(&self, x: f64, y: f64) -> Option<f64> {
        let x_diff = self.x1 - self.x0;
        let y_diff = self.y1 - self.y0;
        let r_diff = self.r1 - self.r0;
        let dx = x - self.x0;
        let dy = y - self.y0;

        let a = r_diff * r_diff - x_diff * x_diff - y_diff * y_diff;
        let b = 2.0 * self.r0 * r_diff + 2.0 * (dx * x_diff + dy * y_diff);
        let c = self.r0 * self.r0 - dx * dx - dy * dy;

        let ratio = if a == 0.0 {
            // Degenerates to a linear equation.
            if b == 0.0 {
                return None;
            }
            -c / b
        } else {
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return None;
            }
            (-b + discriminant.sqrt()) / (2.0 * a)
        };
        Some(ratio.clamp(0.0, 1.0))
    }

    /// Unquantized colours for the `width` x `height` block at `(x, y)`, row
    /// major. Pixels with no solution repeat the previous solved colour, or
    /// the first stop if none has been solved yet.
    pub fn float_field(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<[f64; 3]> {
        let stops = self.stops.completed();
        if stops.is_empty() {
            return Vec::new();
        }
        let w = width as usize;
        let solved: Vec<Option<[f64; 3]>> = (0..w * height as usize)
            .into_par_iter()
            .map(|i| {
                let px = x as f64 + (i % w) as f64;
                let py = y as f64 + (i / w) as f64;
                self.ratio_at(px, py).map(|r| sample_stops(&stops, r))
            })
            .collect();

        let mut last = stops[0].channels;
        solved
            .into_iter()
            .map(|color| {
                if let Some(c) = color {
                    last = c;
                }
                last
            })
            .collect()
    }

    /// Writes the dithered gradient into `image` over the given block, which
    /// is clipped to the image bounds. Alpha is set opaque. Does nothing
    /// without stops.
    pub fn fill_rect(&self, image: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32) {
        let width = width.min(image.width().saturating_sub(x));
        let height = height.min(image.height().saturating_sub(y));
        if width == 0 || height == 0 || self.stops.is_empty() {
            return;
        }

        let field = self.float_field(x, y, width, height);
        let w = width as usize;
        let mut channels: Vec<Vec<u8>> = (0..3)
            .map(|c| {
                let mut buffer: Vec<f64> = field.iter().map(|px| px[c]).collect();
                diffuse_error(&mut buffer, w)
            })
            .collect();
        let blue = channels.pop().unwrap_or_default();
        let green = channels.pop().unwrap_or_default();
        let red = channels.pop().unwrap_or_default();

        for i in 0..field.len() {
            let px = x + (i % w) as u32;
            let py = y + (i / w) as u32;
            image.put_pixel(px, py, Rgba([red[i], green[i], blue[i], 255]));
        }
    }
}

/// Quantizes a row-major channel by truncation, spreading each pixel's error
/// 7/16 right, 3/16 down-left, 5/16 down and 1/16 down-right. Neighbours past
/// the end of the buffer or either edge column are skipped, so a ragged last
/// row is quantized like any other.
pub fn diffuse_error(buffer: &mut [f64], width: usize) -> Vec<u8> {
    if width == 0 {
        return Vec::new();
    }
    let len = buffer.len();
    let mut out = vec![0u8; len];

    for i in 0..len {
        let x = i % width;
        let nearest = buffer[i].trunc();
        let error = buffer[i] - nearest;
        out[i] = nearest.clamp(0.0, 255.0) as u8;

        let has_right = x + 1 < width;
        let below = i + width;
        if has_right && i + 1 < len {
            buffer[i + 1] += 7.0 / 16.0 * error;
        }
        if x > 0 && below - 1 < len {
            buffer[below - 1] += 3.0 / 16.0 * error;
        }
        if below < len {
            buffer[below] += 5.0 / 16.0 * error;
        }
        if has_right && below + 1 < len {
            buffer[below + 1] += 1.0 / 16.0 * error;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_runs_from_inner_to_outer_circle() {
        let gradient = DitheredRadialGradient::new(10.0, 10.0, 0.0, 10.0, 10.0, 10.0);
        assert_eq!(gradient.ratio_at(10.0, 10.0), Some(0.0));
        let mid = gradient.ratio_at(15.0, 10.0).unwrap();
        assert!((mid - 0.5).abs() < 1e-12);
        assert_eq!(gradient.ratio_at(40.0, 10.0), Some(1.0));
    }

    #[test]
    fn negative_discriminant_reuses_previous_color() {
        let mut gradient = DitheredRadialGradient::new(0.0, 0.0, 1.0, 10.0, 0.0, 1.0);
        gradient.add_color_stop(0.0, 0.0, 0.0, 0.0);
        gradient.add_color_stop(1.0, 200.0, 100.0, 50.0);
        assert_eq!(gradient.ratio_at(5.0, 5.0), None);

        let field = gradient.float_field(0, 0, 11, 6);
        let row = 5 * 11;
        assert!(gradient.ratio_at(4.0, 5.0).is_none());
        assert_eq!(field[row + 5], field[row + 4]);
        assert!(gradient.ratio_at(0.0, 0.0).is_some());
    }

    #[test]
    fn first_stop_before_any_solution() {
        let mut gradient = DitheredRadialGradient::new(0.0, 0.0, 1.0, 10.0, 0.0, 1.0);
        gradient.add_color_stop(0.3, 7.0, 8.0, 9.0);
        gradient.add_color_stop(0.9, 70.0, 80.0, 90.0);
        // Row 5 of the cone is entirely unsolvable.
        let field = gradient.float_field(0, 5, 11, 1);
        assert!(field.iter().all(|c| *c == [7.0, 8.0, 9.0]));
    }

    #[test]
    fn dither_preserves_mean() {
        let mut gradient = DitheredRadialGradient::new(32.0, 32.0, 0.0, 32.0, 32.0, 64.0);
        gradient.add_color_stop(0.0, 100.4, 0.5, 254.9);
        gradient.add_color_stop(1.0, 100.4, 0.5, 254.9);

        let mut image = RgbaImage::new(64, 64);
        gradient.fill_rect(&mut image, 0, 0, 64, 64);

        let n = 64.0 * 64.0;
        let mean = |c: usize| image.pixels().map(|p| p.0[c] as f64).sum::<f64>() / n;
        assert!((mean(0) - 100.4).abs() < 0.05);
        assert!((mean(1) - 0.5).abs() < 0.05);
        assert!((mean(2) - 254.9).abs() < 0.05);
        assert!(image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn diffusion_stays_in_bounds() {
        let mut buffer = vec![0.9; 7];
        let out = diffuse_error(&mut buffer, 7);
        assert_eq!(out.len(), 7);

        let mut column = vec![0.75; 5];
        let out = diffuse_error(&mut column, 1);
        assert_eq!(out.len(), 5);
        assert!(out.iter().any(|&v| v == 1));
    }

    #[test]
    fn diffusion_handles_ragged_last_row() {
        let mut buffer = vec![0.5; 7];
        assert_eq!(diffuse_error(&mut buffer, 3), vec![0, 0, 0, 0, 1, 0, 0]);

        let mut single = vec![0.9; 2];
        assert_eq!(diffuse_error(&mut single, 5), vec![0, 1]);
    }

    #[test]
    fn fill_rect_clips_and_skips_without_stops() {
        let mut image = RgbaImage::new(4, 4);
        let bare = DitheredRadialGradient::new(0.0, 0.0, 0.0, 0.0, 0.0, 4.0);
        bare.fill_rect(&mut image, 0, 0, 4, 4);
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 0]));

        let mut gradient = bare.clone();
        gradient.add_color_stop(0.5, 10.0, 20.0, 30.0);
        gradient.fill_rect(&mut image, 2, 2, 10, 10);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(3, 3).0, [10, 20, 30, 255]);
    }
}
