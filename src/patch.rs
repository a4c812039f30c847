//! Draws one catalog shape into one cell of the 3x3 grid.

use crate::canvas::{Canvas, Path, RectF};
use crate::catalog::{CellMask, GRID_STEPS, PATCH_TYPES};
use crate::decoder::PatchGroup;
use image::Rgba;

/// The two colours a patch is drawn with; inversion swaps their roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchColors {
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
}

impl Default for PatchColors {
    fn default() -> Self {
        Self {
            foreground: Rgba([0, 0, 0, 255]),
            background: Rgba([255, 255, 255, 255]),
        }
    }
}

/// Catalog index and effective inversion after the special cases: shape 15
/// flips inversion, and shape 6 draws the triforce of shape 11.
pub fn resolve_shape(group: &PatchGroup) -> (u8, bool) {
    let mut shape = group.shape % PATCH_TYPES.len() as u8;
    let mut invert = group.invert;
    if shape == 15 {
        invert = !invert;
    }
    if shape == 6 {
        shape = 11;
    }
    (shape, invert)
}

/// Closed outline of `shape` centred on the origin, spanning one cell.
/// Curved outlines bend every edge towards the origin.
pub fn patch_path(shape: u8, curve: bool, cell_size: f64) -> Path {
    let vertices = PATCH_TYPES[(shape as usize) % PATCH_TYPES.len()];
    let offset = cell_size / 2.0;
    let step = cell_size / 4.0;
    let point = |v: u8| {
        (
            (v % GRID_STEPS) as f64 * step - offset,
            (v / GRID_STEPS) as f64 * step - offset,
        )
    };

    let mut path = Path::new();
    let mut current = point(vertices[0]);
    path.move_to(current.0, current.1);
    for i in 1..=vertices.len() {
        let next = point(vertices[i % vertices.len()]);
        if curve {
            path.bezier_curve_to((0.0, 0.0), current, next);
        } else {
            path.line_to(next.0, next.1);
        }
        current = next;
    }
    path
}

/// Fills `cell` with the background and draws the group's shape over it,
/// rotated by `group.turn` quarter turns about the cell centre.
pub fn render_patch(
    canvas: &mut Canvas,
    cell: CellMask,
    group: &PatchGroup,
    cell_size: f64,
    colors: &PatchColors,
) {
    let (shape, invert) = resolve_shape(group);
    let (cell_fill, shape_fill) = if invert {
        (colors.foreground, colors.background)
    } else {
        (colors.background, colors.foreground)
    };

    let x = cell_size * cell.column() as f64;
    let y = cell_size * cell.row() as f64;
    let bounds = RectF::new(x, y, cell_size, cell_size);
    canvas.fill_rect(bounds, cell_fill);

    let half = cell_size / 2.0;
    let path = patch_path(shape, group.curve, cell_size)
        .rotated_quarter_turns(group.turn as u32)
        .translated(x + half, y + half);
    canvas.fill_path(&path, shape_fill, bounds);
}
