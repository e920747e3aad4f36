//! Tetromino definitions and shapes
//!
//! All 7 tetrominoes with their four rotations. Offsets are `(row, col)` with
//! row growing downward, relative to the piece anchor.

use serde::{Deserialize, Serialize};

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TetrominoType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

/// Number of distinct tetromino types
pub const TETROMINO_COUNT: usize = 7;

/// A fixed tetromino shape: four `(row, col)` offsets from the anchor
pub type Shape = [(i32, i32); 4];

/// Rotation table indexed by `[TetrominoType::index()][Rotation::index()]`
static SHAPES: [[Shape; 4]; TETROMINO_COUNT] = [
    // I
    [
        [(1, 0), (1, 1), (1, 2), (1, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
    ],
    // J
    [
        [(0, 0), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 0), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (0, 2), (1, 1), (2, 1)],
    ],
    // L
    [
        [(1, 0), (1, 1), (1, 2), (0, 2)],
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 0)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
    ],
    // O - identical in every rotation
    [
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
    ],
    // S
    //  .SS    S.    ...    .S
    //  SS.    SS    .SS    .SS
    //         .S    SS.    ..S
    [
        [(0, 1), (0, 2), (1, 0), (1, 1)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(1, 1), (1, 2), (2, 0), (2, 1)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
    ],
    // T
    [
        [(0, 1), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (1, 0)],
        [(1, 0), (1, 1), (1, 2), (2, 1)],
        [(0, 1), (1, 1), (2, 1), (1, 2)],
    ],
    // Z
    [
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(0, 1), (1, 0), (1, 1), (2, 0)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(0, 2), (1, 1), (1, 2), (2, 1)],
    ],
];

impl TetrominoType {
    /// Get all tetromino types for bag randomization
    pub fn all() -> [TetrominoType; TETROMINO_COUNT] {
        [
            TetrominoType::I,
            TetrominoType::J,
            TetrominoType::L,
            TetrominoType::O,
            TetrominoType::S,
            TetrominoType::T,
            TetrominoType::Z,
        ]
    }

    fn index(self) -> usize {
        match self {
            TetrominoType::I => 0,
            TetrominoType::J => 1,
            TetrominoType::L => 2,
            TetrominoType::O => 3,
            TetrominoType::S => 4,
            TetrominoType::T => 5,
            TetrominoType::Z => 6,
        }
    }

    /// Get the shape offsets for this tetromino at a given rotation
    pub fn shape(self, rotation: Rotation) -> &'static Shape {
        &SHAPES[self.index()][rotation.index()]
    }

    /// Spawn anchor `(row, col)`: the O sits one column further right
    pub fn spawn_position(self) -> (i32, i32) {
        match self {
            TetrominoType::O => (0, 4),
            _ => (0, 3),
        }
    }

    /// Cells of the spawn rotation inside a 2x4 preview box.
    ///
    /// Every spawn shape occupies at most two rows once shifted to the top of
    /// its bounding box, which is all the "next piece" box has room for.
    pub fn preview_cells(self) -> [[bool; 4]; 2] {
        let shape = self.shape(Rotation::Deg0);
        let top = shape.iter().map(|&(r, _)| r).min().unwrap_or(0);
        let mut preview = [[false; 4]; 2];
        for &(r, c) in shape {
            preview[(r - top) as usize][c as usize] = true;
        }
        preview
    }
}

/// Rotation states, clockwise from spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Advance by 90 degrees: 0 → 90 → 180 → 270 → 0
    pub fn cw(self) -> Rotation {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    fn index(self) -> usize {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// All rotation states in clockwise order
    pub fn all() -> [Rotation; 4] {
        [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270]
    }

    pub fn degrees(self) -> u16 {
        self.index() as u16 * 90
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_shape_has_four_distinct_cells() {
        for kind in TetrominoType::all() {
            for rotation in Rotation::all() {
                let cells: HashSet<_> = kind.shape(rotation).iter().collect();
                assert_eq!(cells.len(), 4, "{kind:?} {rotation:?}");
            }
        }
    }

    #[test]
    fn test_offsets_fit_in_four_by_four_box() {
        for kind in TetrominoType::all() {
            for rotation in Rotation::all() {
                for &(r, c) in kind.shape(rotation) {
                    assert!((0..4).contains(&r) && (0..4).contains(&c));
                }
            }
        }
    }

    #[test]
    fn test_rotation_cycles_back() {
        let mut rotation = Rotation::Deg0;
        for expected in [90, 180, 270, 0] {
            rotation = rotation.cw();
            assert_eq!(rotation.degrees(), expected);
        }
    }

    #[test]
    fn test_spawn_columns() {
        assert_eq!(TetrominoType::O.spawn_position(), (0, 4));
        for kind in TetrominoType::all() {
            if kind != TetrominoType::O {
                assert_eq!(kind.spawn_position(), (0, 3));
            }
        }
    }

    #[test]
    fn test_preview_cells() {
        assert_eq!(
            TetrominoType::I.preview_cells(),
            [[true, true, true, true], [false; 4]]
        );
        assert_eq!(
            TetrominoType::T.preview_cells(),
            [[false, true, false, false], [true, true, true, false]]
        );
        for kind in TetrominoType::all() {
            let filled = kind.preview_cells().iter().flatten().filter(|&&c| c).count();
            assert_eq!(filled, 4);
        }
    }
}
