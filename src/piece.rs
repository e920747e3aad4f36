//! Active falling piece logic

use crate::board::{Board, BOARD_HEIGHT, BOARD_WIDTH};
use crate::tetromino::{Rotation, TetrominoType};

/// Most horizontal shifts a rotation may apply to get back inside the walls
const MAX_WALL_KICKS: usize = 2;

/// The active falling piece.
///
/// Only reads the board for validity checks; locking the piece into the grid
/// is the game's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// The type of tetromino, `None` while hidden during a merge
    kind: Option<TetrominoType>,
    /// Current rotation state
    rotation: Rotation,
    /// Anchor (row, col), added to the shape offsets
    row: i32,
    col: i32,
}

impl Piece {
    /// Create a new piece at its spawn position
    pub fn new(kind: TetrominoType) -> Self {
        let (row, col) = kind.spawn_position();
        Self {
            kind: Some(kind),
            rotation: Rotation::Deg0,
            row,
            col,
        }
    }

    pub fn kind(&self) -> Option<TetrominoType> {
        self.kind
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Anchor position (row, col)
    pub fn anchor(&self) -> (i32, i32) {
        (self.row, self.col)
    }

    pub fn is_hidden(&self) -> bool {
        self.kind.is_none()
    }

    /// Absolute positions of the occupied cells; empty while hidden
    pub fn cells(&self) -> Vec<(i32, i32)> {
        match self.kind {
            Some(kind) => place(kind, self.rotation, self.row, self.col).to_vec(),
            None => Vec::new(),
        }
    }

    /// Try to move left, returns true if successful
    pub fn move_left(&mut self, board: &Board) -> bool {
        self.shift(board, -1)
    }

    /// Try to move right, returns true if successful
    pub fn move_right(&mut self, board: &Board) -> bool {
        self.shift(board, 1)
    }

    fn shift(&mut self, board: &Board, dc: i32) -> bool {
        let Some(kind) = self.kind else {
            return false;
        };
        let edge = if dc < 0 { 0 } else { BOARD_WIDTH as i32 - 1 };
        let cells = place(kind, self.rotation, self.row, self.col);
        let blocked = cells
            .iter()
            .any(|&(r, c)| c == edge || board.is_filled(r, c + dc));
        if blocked {
            return false;
        }
        self.col += dc;
        true
    }

    /// Move down one row without checking the board.
    ///
    /// Callers check `Board::can_move_down` first, so that "landed" can be told
    /// apart from "moved".
    pub fn move_down(&mut self) {
        if self.kind.is_some() {
            self.row += 1;
        }
    }

    /// Rotate by 90 degrees with horizontal wall kicks only.
    ///
    /// A shape poking out of the left wall is pushed right, one poking out of
    /// the right wall is pushed left, at most `MAX_WALL_KICKS` columns each
    /// way. The rotation is rejected (and nothing changes) when the shape is
    /// still outside the walls, reaches below the floor, or overlaps a filled
    /// cell.
    pub fn rotate(&mut self, board: &Board) -> bool {
        let Some(kind) = self.kind else {
            return false;
        };
        let next = self.rotation.cw();
        let mut col = self.col;

        let mut kicks = 0;
        while min_col(kind, next, col) < 0 {
            if kicks == MAX_WALL_KICKS {
                return false;
            }
            col += 1;
            kicks += 1;
        }

        let mut kicks = 0;
        while max_col(kind, next, col) >= BOARD_WIDTH as i32 {
            if kicks == MAX_WALL_KICKS {
                return false;
            }
            col -= 1;
            kicks += 1;
        }

        let cells = place(kind, next, self.row, col);
        if cells.iter().any(|&(r, _)| r >= BOARD_HEIGHT as i32) {
            return false;
        }
        if !board.fits(&cells) {
            return false;
        }

        self.rotation = next;
        self.col = col;
        true
    }

    /// Reinitialize as a freshly spawned piece of the given type
    pub fn reset(&mut self, kind: TetrominoType) {
        *self = Self::new(kind);
    }

    /// Hide the piece while it is merged into the board
    pub fn hide(&mut self) {
        self.kind = None;
        self.rotation = Rotation::Deg0;
        self.row = 0;
        self.col = 0;
    }

    /// Row offset the piece would fall before landing
    pub fn landing_distance(&self, board: &Board) -> i32 {
        let mut cells = self.cells();
        if cells.is_empty() {
            return 0;
        }
        let mut distance = 0;
        while board.can_move_down(&cells) {
            for cell in &mut cells {
                cell.0 += 1;
            }
            distance += 1;
        }
        distance
    }
}

fn place(kind: TetrominoType, rotation: Rotation, row: i32, col: i32) -> [(i32, i32); 4] {
    kind.shape(rotation).map(|(dr, dc)| (row + dr, col + dc))
}

fn min_col(kind: TetrominoType, rotation: Rotation, col: i32) -> i32 {
    kind.shape(rotation).iter().map(|&(_, dc)| col + dc).min().unwrap_or(col)
}

fn max_col(kind: TetrominoType, rotation: Rotation, col: i32) -> i32 {
    kind.shape(rotation).iter().map(|&(_, dc)| col + dc).max().unwrap_or(col)
}
