//! Static patch shapes and the 3x3 cell mask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Vertex paths over a 5x5 grid; vertex `v` sits at `(v % 5, v / 5)`.
pub const PATCH_TYPES: [&[u8]; 16] = [
    &[0, 4, 24, 20],
    &[0, 4, 20],
    &[2, 24, 20],
    &[0, 2, 20, 22],
    &[2, 14, 22, 10],
    &[0, 14, 24, 22],
    &[2, 24, 22, 13, 11, 22, 20],
    &[0, 14, 22],
    &[6, 8, 18, 16],
    &[4, 20, 10, 12, 2],
    &[0, 2, 12, 10],
    &[10, 14, 22],
    &[20, 12, 24],
    &[10, 2, 12],
    &[0, 2, 10],
    &[0, 4, 24, 20],
];

/// Shapes the center cell may take, indexed by the two lowest code bits.
pub const CENTER_PATCH_TYPES: [u8; 4] = [0, 4, 8, 15];

/// Side length of the vertex grid.
pub const GRID_STEPS: u8 = 5;

bitflags! {
    /// One bit per cell of the 3x3 grid, row-major from the top-left.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CellMask: u16 {
        const TOP_LEFT = 1 << 0;
        const TOP_CENTER = 1 << 1;
        const TOP_RIGHT = 1 << 2;
        const MID_LEFT = 1 << 3;
        const MID_CENTER = 1 << 4;
        const MID_RIGHT = 1 << 5;
        const BOT_LEFT = 1 << 6;
        const BOT_CENTER = 1 << 7;
        const BOT_RIGHT = 1 << 8;

        const TOP = Self::TOP_LEFT.bits() | Self::TOP_CENTER.bits() | Self::TOP_RIGHT.bits();
        const MID = Self::MID_LEFT.bits() | Self::MID_CENTER.bits() | Self::MID_RIGHT.bits();
        const BOT = Self::BOT_LEFT.bits() | Self::BOT_CENTER.bits() | Self::BOT_RIGHT.bits();

        const LEFT = Self::TOP_LEFT.bits() | Self::MID_LEFT.bits() | Self::BOT_LEFT.bits();
        const CENTER = Self::TOP_CENTER.bits() | Self::MID_CENTER.bits() | Self::BOT_CENTER.bits();
        const RIGHT = Self::TOP_RIGHT.bits() | Self::MID_RIGHT.bits() | Self::BOT_RIGHT.bits();

        const SIDE = Self::TOP_CENTER.bits()
            | Self::MID_RIGHT.bits()
            | Self::BOT_CENTER.bits()
            | Self::MID_LEFT.bits();
        const CORNER = Self::TOP_LEFT.bits()
            | Self::TOP_RIGHT.bits()
            | Self::BOT_RIGHT.bits()
            | Self::BOT_LEFT.bits();

        const ALL = Self::TOP.bits() | Self::MID.bits() | Self::BOT.bits();
    }
}

impl Default for CellMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Which patch group a cell draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRole {
    Middle,
    Side,
    Corner,
}

impl CellMask {
    /// Single-cell masks selected by `self`, in bit order.
    pub fn cells(self) -> impl Iterator<Item = CellMask> {
        (0..9)
            .map(|i| CellMask::from_bits_retain(1 << i))
            .filter(move |cell| self.contains(*cell))
    }

    pub fn column(self) -> u32 {
        if self.intersects(Self::RIGHT) {
            2
        } else if self.intersects(Self::CENTER) {
            1
        } else {
            0
        }
    }

    pub fn row(self) -> u32 {
        if self.intersects(Self::BOT) {
            2
        } else if self.intersects(Self::MID) {
            1
        } else {
            0
        }
    }

    pub fn role(self) -> CellRole {
        if self.intersects(Self::CORNER) {
            CellRole::Corner
        } else if self.intersects(Self::SIDE) {
            CellRole::Side
        } else {
            CellRole::Middle
        }
    }

    /// Extra quarter turns for a cell, counted clockwise from the top
    /// (sides) or the top-left (corners).
    pub fn turn_offset(self) -> u8 {
        if self.intersects(Self::MID_RIGHT | Self::TOP_RIGHT) {
            1
        } else if self.intersects(Self::BOT_CENTER | Self::BOT_RIGHT) {
            2
        } else if self.intersects(Self::MID_LEFT | Self::BOT_LEFT) {
            3
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_partition_the_grid() {
        let center = CellMask::MID_CENTER;
        assert!((CellMask::SIDE & CellMask::CORNER).is_empty());
        assert!((CellMask::SIDE & center).is_empty());
        assert!((CellMask::CORNER & center).is_empty());
        assert_eq!(CellMask::SIDE | CellMask::CORNER | center, CellMask::ALL);
        assert_eq!(CellMask::ALL.bits(), 0x1ff);
    }

    #[test]
    fn rows_and_columns_cover_all() {
        assert_eq!(CellMask::TOP | CellMask::MID | CellMask::BOT, CellMask::ALL);
        assert_eq!(
            CellMask::LEFT | CellMask::CENTER | CellMask::RIGHT,
            CellMask::ALL
        );
        for (i, cell) in CellMask::ALL.cells().enumerate() {
            assert_eq!(cell.column(), i as u32 % 3);
            assert_eq!(cell.row(), i as u32 / 3);
        }
    }

    #[test]
    fn turn_offsets_run_clockwise() {
        let sides = [
            CellMask::TOP_CENTER,
            CellMask::MID_RIGHT,
            CellMask::BOT_CENTER,
            CellMask::MID_LEFT,
        ];
        let corners = [
            CellMask::TOP_LEFT,
            CellMask::TOP_RIGHT,
            CellMask::BOT_RIGHT,
            CellMask::BOT_LEFT,
        ];
        for (i, (side, corner)) in sides.iter().zip(corners.iter()).enumerate() {
            assert_eq!(side.turn_offset(), i as u8);
            assert_eq!(corner.turn_offset(), i as u8);
            assert_eq!(side.role(), CellRole::Side);
            assert_eq!(corner.role(), CellRole::Corner);
        }
        assert_eq!(CellMask::MID_CENTER.turn_offset(), 0);
        assert_eq!(CellMask::MID_CENTER.role(), CellRole::Middle);
    }

    #[test]
    fn catalog_vertices_stay_on_grid() {
        let limit = GRID_STEPS * GRID_STEPS;
        for path in PATCH_TYPES {
            assert!(path.len() >= 3);
            assert!(path.iter().all(|&v| v < limit));
        }
        assert_eq!(PATCH_TYPES[0], PATCH_TYPES[15]);
    }

    #[test]
    fn cells_yields_selected_only() {
        let corners: Vec<_> = CellMask::CORNER.cells().collect();
        assert_eq!(
            corners,
            vec![
                CellMask::TOP_LEFT,
                CellMask::TOP_RIGHT,
                CellMask::BOT_LEFT,
                CellMask::BOT_RIGHT
            ]
        );
        assert_eq!(CellMask::empty().cells().count(), 0);
    }
}
