//! Decoding of one digest word into a layer's shape parameters.

use crate::canvas::BlendMode;
use crate::catalog::{CellMask, CellRole, CENTER_PATCH_TYPES};
use std::fmt;

/// Blend modes a layer may use, indexed by the low two bits of `extra.red`.
/// `None` keeps whatever mode the previous layer was drawn with.
pub const LAYER_BLEND_MODES: [Option<BlendMode>; 4] = [
    Some(BlendMode::Overlay),
    Some(BlendMode::Multiply),
    None,
    Some(BlendMode::Lighter),
];

/// Mode in effect before the first layer is drawn.
pub const INITIAL_LAYER_BLEND_MODE: BlendMode = BlendMode::Overlay;

const TURN_LETTERS: [char; 4] = ['U', 'R', 'D', 'L'];

/// Shape parameters shared by every cell of one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGroup {
    pub shape: u8,
    pub invert: bool,
    pub turn: u8,
    pub curve: bool,
    pub scale: u8,
}

/// Auxiliary 5-bit fields driving layer blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extra {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchConfiguration {
    pub middle: PatchGroup,
    pub corner: PatchGroup,
    pub side: PatchGroup,
    pub extra: Extra,
}

fn bits(code: u32, shift: u32, mask: u32) -> u8 {
    ((code >> shift) & mask) as u8
}

fn both_set(code: u32, shift: u32) -> bool {
    (code >> shift) & 3 == 3
}

impl PatchConfiguration {
    /// Total over every `u32`. Several fields share bits on purpose: the
    /// middle group takes its invert flag from bit 14, and the side group's
    /// invert, turn, curve and scale all overlap in bits 14..=17.
    pub fn decode(code: u32) -> Self {
        let middle = PatchGroup {
            shape: CENTER_PATCH_TYPES[(code & 0b11) as usize],
            invert: bits(code, 14, 1) != 0,
            turn: 0,
            curve: both_set(code, 27),
            scale: bits(code, 25, 7),
        };
        let corner = PatchGroup {
            shape: bits(code, 3, 0b1111),
            invert: bits(code, 7, 1) != 0,
            turn: bits(code, 8, 3),
            curve: both_set(code, 21),
            scale: bits(code, 19, 7),
        };
        let side = PatchGroup {
            shape: bits(code, 10, 0b1111),
            invert: bits(code, 14, 1) != 0,
            turn: bits(code, 15, 3),
            curve: both_set(code, 16),
            scale: bits(code, 14, 7),
        };
        let extra = Extra {
            red: bits(code, 27, 31),
            green: bits(code, 21, 31),
            blue: bits(code, 16, 31),
        };
        Self {
            middle,
            corner,
            side,
            extra,
        }
    }

    pub fn group(&self, role: CellRole) -> &PatchGroup {
        match role {
            CellRole::Middle => &self.middle,
            CellRole::Side => &self.side,
            CellRole::Corner => &self.corner,
        }
    }

    pub fn group_for(&self, cell: CellMask) -> &PatchGroup {
        self.group(cell.role())
    }

    /// The layer's own blend mode, or `None` when it inherits one.
    pub fn blend_mode(&self) -> Option<BlendMode> {
        LAYER_BLEND_MODES[(self.extra.red & 3) as usize]
    }

    /// Blend mode for this layer when the previous layer used `previous`.
    pub fn blend_mode_after(&self, previous: BlendMode) -> BlendMode {
        self.blend_mode().unwrap_or(previous)
    }

    /// Linear ramp over the green field, 0.1 at 0 up to 0.3 at 31.
    pub fn layer_alpha(&self) -> f32 {
        0.1 + (0.2 / 31.0) * self.extra.green as f32
    }
}

impl fmt::Display for PatchGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:X}{}",
            if self.invert { '-' } else { '+' },
            self.shape,
            TURN_LETTERS[(self.turn & 3) as usize]
        )
    }
}

impl fmt::Display for PatchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M:{} S:{} C:{} X:{:02x}{:02x}{:02x}",
            self.middle,
            self.side,
            self.corner,
            self.extra.red,
            self.extra.green,
            self.extra.blue
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ranges(config: &PatchConfiguration) {
        assert!(CENTER_PATCH_TYPES.contains(&config.middle.shape));
        for group in [&config.middle, &config.corner, &config.side] {
            assert!(group.shape <= 15);
            assert!(group.turn <= 3);
            assert!(group.scale <= 7);
        }
        assert!(config.extra.red <= 31);
        assert!(config.extra.green <= 31);
        assert!(config.extra.blue <= 31);
    }

    #[test]
    fn decode_is_total_and_in_range() {
        let mut code = 0u32;
        loop {
            assert_ranges(&PatchConfiguration::decode(code));
            match code.checked_add(65_521) {
                Some(next) => code = next,
                None => break,
            }
        }
        assert_ranges(&PatchConfiguration::decode(u32::MAX));
    }

    #[test]
    fn decodes_all_ones() {
        let config = PatchConfiguration::decode(u32::MAX);
        assert_eq!(config.to_string(), "M:-FU S:-FL C:-FL X:1f1f1f");
        assert!(config.middle.curve && config.side.curve && config.corner.curve);
        assert_eq!(config.side.scale, 7);
    }

    #[test]
    fn middle_shares_side_invert_bit() {
        let config = PatchConfiguration::decode(1 << 14);
        assert!(config.middle.invert);
        assert!(config.side.invert);
        assert_eq!(config.side.scale, 1);
        assert!(!config.corner.invert);

        let config = PatchConfiguration::decode(1 << 2);
        assert!(!config.middle.invert);
    }

    #[test]
    fn side_fields_overlap() {
        // Bits 16 and 17 set: curve on, high turn bit set, high scale bit set.
        let config = PatchConfiguration::decode(0b11 << 16);
        assert!(config.side.curve);
        assert_eq!(config.side.turn, 2);
        assert_eq!(config.side.scale, 0b100);
        assert_eq!(config.extra.blue, 0b11);
    }

    #[test]
    fn known_layer_strings() {
        assert_eq!(
            PatchConfiguration::decode(0xbf16_78ba).to_string(),
            "M:-8U S:-EU C:-7U X:171816"
        );
        assert_eq!(
            PatchConfiguration::decode(0xa361_03b0).to_string(),
            "M:+0U S:+0D C:-6L X:141b01"
        );
    }

    #[test]
    fn zero_extra_blends_overlay_at_tenth() {
        let config = PatchConfiguration::decode(0);
        assert_eq!(config.extra.red, 0);
        assert_eq!(config.extra.green, 0);
        assert_eq!(config.blend_mode(), Some(BlendMode::Overlay));
        assert_eq!(config.layer_alpha(), 0.1);

        let config = PatchConfiguration::decode(31 << 21);
        assert!((config.layer_alpha() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn third_blend_entry_inherits() {
        let inherit = PatchConfiguration::decode(2 << 27);
        assert_eq!(inherit.extra.red, 2);
        assert_eq!(inherit.blend_mode(), None);
        assert_eq!(inherit.blend_mode_after(BlendMode::Multiply), BlendMode::Multiply);
        assert_eq!(inherit.blend_mode_after(INITIAL_LAYER_BLEND_MODE), BlendMode::Overlay);

        let lighter = PatchConfiguration::decode(3 << 27);
        assert_eq!(lighter.blend_mode_after(BlendMode::Multiply), BlendMode::Lighter);
    }

    #[test]
    fn role_dispatch() {
        let config = PatchConfiguration::decode(0xde40_4141);
        assert_eq!(config.group_for(CellMask::MID_CENTER), &config.middle);
        assert_eq!(config.group_for(CellMask::BOT_CENTER), &config.side);
        assert_eq!(config.group_for(CellMask::BOT_RIGHT), &config.corner);
    }
}
