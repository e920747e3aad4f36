//! Game board representation and collision detection

/// Board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// A cell on the board - either empty or filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled)
    }
}

/// One board row
pub type Row = [Cell; BOARD_WIDTH];

/// The game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is the top
    cells: [Row; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    /// Build a board from 20 row strings, `#` filled and anything else empty.
    /// Short rows are padded with empty cells.
    pub fn from_rows(rows: &[&str]) -> Self {
        let mut board = Self::new();
        for (r, line) in rows.iter().take(BOARD_HEIGHT).enumerate() {
            for (c, ch) in line.chars().take(BOARD_WIDTH).enumerate() {
                if ch == '#' {
                    board.cells[r][c] = Cell::Filled;
                }
            }
        }
        board
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= BOARD_HEIGHT || col >= BOARD_WIDTH {
            return None;
        }
        Some(self.cells[row][col])
    }

    /// Set a cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= BOARD_HEIGHT || col >= BOARD_WIDTH {
            return false;
        }
        self.cells[row][col] = cell;
        true
    }

    /// True if the position is inside the board and filled
    pub fn is_filled(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(|cell| cell.is_filled())
    }

    /// Check if a position is valid (within bounds and empty)
    pub fn is_valid_position(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(|cell| cell.is_empty())
    }

    /// Check if a set of cells can all be occupied
    pub fn fits(&self, positions: &[(i32, i32)]) -> bool {
        positions
            .iter()
            .all(|&(row, col)| self.is_valid_position(row, col))
    }

    /// True iff every cell sits above the floor row and has an empty cell below it
    pub fn can_move_down(&self, positions: &[(i32, i32)]) -> bool {
        positions.iter().all(|&(row, col)| {
            row < BOARD_HEIGHT as i32 - 1 && self.is_valid_position(row + 1, col)
        })
    }

    /// Write a locked piece into the grid
    pub fn merge(&mut self, positions: &[(i32, i32)]) {
        for &(row, col) in positions {
            self.set(row, col, Cell::Filled);
        }
    }

    /// Indices of every completely filled row, top to bottom
    pub fn full_rows(&self) -> Vec<usize> {
        (0..BOARD_HEIGHT)
            .filter(|&row| self.is_line_full(row))
            .collect()
    }

    /// Remove every full row, shift the rest down and refill the top with
    /// empty rows. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut write_row = BOARD_HEIGHT;

        for read_row in (0..BOARD_HEIGHT).rev() {
            if !self.is_line_full(read_row) {
                write_row -= 1;
                if write_row != read_row {
                    self.cells[write_row] = self.cells[read_row];
                }
            }
        }

        for row in 0..write_row {
            self.cells[row] = [Cell::Empty; BOARD_WIDTH];
        }

        write_row
    }

    /// Check if a line is completely filled
    fn is_line_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|cell| cell.is_filled())
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Rows from top to bottom
    pub fn rows(&self) -> &[Row; BOARD_HEIGHT] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FULL: &str = "##########";

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.rows().len(), BOARD_HEIGHT);
        assert!(board.rows().iter().all(|row| row.len() == BOARD_WIDTH));
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::new();
        assert!(board.set(5, 5, Cell::Filled));
        assert_eq!(board.get(5, 5), Some(Cell::Filled));
        assert!(board.is_filled(5, 5));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut board = Board::new();
        assert_eq!(board.get(-1, 0), None);
        assert_eq!(board.get(0, -1), None);
        assert_eq!(board.get(BOARD_HEIGHT as i32, 0), None);
        assert_eq!(board.get(0, BOARD_WIDTH as i32), None);
        assert!(!board.set(20, 0, Cell::Filled));
        assert!(!board.is_valid_position(0, 10));
    }

    #[test]
    fn test_can_move_down_stops_at_floor_and_blocks() {
        let mut board = Board::new();
        assert!(board.can_move_down(&[(18, 0)]));
        assert!(!board.can_move_down(&[(19, 0)]));

        board.set(10, 3, Cell::Filled);
        assert!(!board.can_move_down(&[(9, 3), (9, 4)]));
        assert!(board.can_move_down(&[(9, 4)]));
    }

    #[test]
    fn test_merge_fills_cells() {
        let mut board = Board::new();
        board.merge(&[(18, 4), (18, 5), (19, 4), (19, 5)]);
        assert!(board.is_filled(18, 4));
        assert!(board.is_filled(19, 5));
        assert!(!board.is_filled(17, 4));
    }

    #[test]
    fn test_clear_single_line() {
        let mut rows = [""; BOARD_HEIGHT];
        rows[18] = "#";
        rows[19] = FULL;
        let mut board = Board::from_rows(&rows);

        assert_eq!(board.full_rows(), vec![19]);
        assert_eq!(board.clear_full_rows(), 1);
        // The block from row 18 drops onto the floor
        assert!(board.is_filled(19, 0));
        assert!(!board.is_filled(18, 0));
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn test_clear_non_adjacent_lines() {
        let mut rows = [""; BOARD_HEIGHT];
        rows[15] = FULL;
        rows[16] = "#";
        rows[17] = FULL;
        rows[18] = "##";
        rows[19] = FULL;
        let mut board = Board::from_rows(&rows);

        assert_eq!(board.full_rows(), vec![15, 17, 19]);
        assert_eq!(board.clear_full_rows(), 3);

        let mut expected = [""; BOARD_HEIGHT];
        expected[18] = "#";
        expected[19] = "##";
        assert_eq!(board, Board::from_rows(&expected));
    }

    #[test]
    fn test_clear_whole_board() {
        let mut board = Board::from_rows(&[FULL; BOARD_HEIGHT]);
        assert_eq!(board.clear_full_rows(), BOARD_HEIGHT);
        assert!(board.is_empty());
    }

    fn arb_board() -> impl Strategy<Value = Board> {
        // Each row is either full or a random pattern with at least one hole
        prop::collection::vec(
            prop_oneof![
                Just(None::<([bool; BOARD_WIDTH], usize)>),
                (prop::array::uniform10(any::<bool>()), 0..BOARD_WIDTH).prop_map(Some),
            ],
            BOARD_HEIGHT,
        )
        .prop_map(|rows| {
            let mut board = Board::new();
            for (r, row) in rows.into_iter().enumerate() {
                for c in 0..BOARD_WIDTH {
                    let filled = match row {
                        None => true,
                        Some((pattern, hole)) => c != hole && pattern[c],
                    };
                    if filled {
                        board.set(r as i32, c as i32, Cell::Filled);
                    }
                }
            }
            board
        })
    }

    proptest! {
        #[test]
        fn prop_clear_preserves_shape_and_order(board in arb_board()) {
            let full = board.full_rows();
            let kept: Vec<Row> = board
                .rows()
                .iter()
                .enumerate()
                .filter(|(r, _)| !full.contains(r))
                .map(|(_, row)| *row)
                .collect();

            let mut cleared = board.clone();
            let removed = cleared.clear_full_rows();

            prop_assert_eq!(removed, full.len());
            prop_assert_eq!(cleared.rows().len(), BOARD_HEIGHT);
            for row in &cleared.rows()[..removed] {
                prop_assert!(row.iter().all(|cell| cell.is_empty()));
            }
            prop_assert_eq!(&cleared.rows()[removed..], &kept[..]);
        }

        #[test]
        fn prop_cannot_move_down_means_shifted_cells_do_not_fit(
            board in arb_board(),
            cells in prop::collection::vec((0..BOARD_HEIGHT as i32, 0..BOARD_WIDTH as i32), 1..5),
        ) {
            let shifted: Vec<_> = cells.iter().map(|&(r, c)| (r + 1, c)).collect();
            if !board.can_move_down(&cells) {
                prop_assert!(!board.fits(&shifted));
            } else {
                prop_assert!(board.fits(&shifted));
            }
        }
    }
}
