//! Tiles patches over the 3x3 grid and stacks the layers.

use crate::canvas::Canvas;
use crate::catalog::CellMask;
use crate::decoder::{PatchConfiguration, PatchGroup, INITIAL_LAYER_BLEND_MODE};
use crate::patch::{render_patch, PatchColors};

/// Number of pattern layers drawn per identicon.
pub const LAYER_COUNT: usize = 5;

/// Clears `layer` and draws every cell in `cells` from `config`. Each of the
/// four cells sharing a role is turned one quarter further than the previous
/// one, clockwise.
pub fn render_layer(
    layer: &mut Canvas,
    config: &PatchConfiguration,
    cells: CellMask,
    colors: &PatchColors,
) {
    layer.clear();
    if layer.is_empty() {
        return;
    }
    let cell_size = layer.width().min(layer.height()) as f64 / 3.0;

    for cell in cells.cells() {
        let group = config.group_for(cell);
        let turned = PatchGroup {
            turn: group.turn.wrapping_add(cell.turn_offset()),
            ..*group
        };
        render_patch(layer, cell, &turned, cell_size, colors);
    }
}

/// Draws each configuration into a `size` x `size` scratch layer and
/// composites it, centred, onto `dest` in order. A layer without a blend mode
/// of its own reuses the one before it.
pub fn composite_layers(
    dest: &mut Canvas,
    configs: &[PatchConfiguration],
    cells: CellMask,
    size: u32,
    colors: &PatchColors,
) {
    if size == 0 || dest.is_empty() {
        return;
    }
    let dx = (dest.width() as i64 - size as i64) / 2;
    let dy = (dest.height() as i64 - size as i64) / 2;
    let mut layer = Canvas::new(size, size);
    let mut mode = INITIAL_LAYER_BLEND_MODE;

    for (index, config) in configs.iter().enumerate() {
        render_layer(&mut layer, config, cells, colors);
        mode = config.blend_mode_after(mode);
        let alpha = config.layer_alpha();
        log::trace!(
            "Layer {}: {} blended {:?} at {:.3}",
            index,
            config,
            mode,
            alpha
        );
        dest.draw_canvas(&layer, dx, dy, mode, alpha);
    }
}
