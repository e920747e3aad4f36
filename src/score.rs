//! Scoring for line clears

/// Points and cleared lines for the current round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total lines cleared
    pub lines: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points awarded for clearing `rows` rows at once
    pub fn points_for(rows: u32) -> u64 {
        match rows {
            0 => 0,
            1 => 100,
            n => n as u64 * 200,
        }
    }

    /// Record a clear of `rows` rows, returns the points it earned
    pub fn add_clear(&mut self, rows: u32) -> u64 {
        let earned = Self::points_for(rows);
        self.points += earned;
        self.lines += rows;
        earned
    }
}
