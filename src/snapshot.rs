//! Read-only view of the engine for renderers

use crate::board::{Row, BOARD_HEIGHT};
use crate::game::{Collision, Phase, Running, Side};
use crate::tetromino::TetrominoType;

/// Coarse phase as seen from outside the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseView {
    Initial,
    Idle,
    LeftHeld,
    RightHeld,
    DownHeld,
    Dropping,
    Merging,
    /// Full rows waiting to be removed, top to bottom
    LineClearFlash(Vec<usize>),
    SettingNewShape,
    Paused,
    Finished,
}

impl From<&Phase> for PhaseView {
    fn from(phase: &Phase) -> Self {
        match phase {
            Phase::Initial => PhaseView::Initial,
            Phase::Paused => PhaseView::Paused,
            Phase::Finished => PhaseView::Finished,
            Phase::Running(running) => match running {
                Running::MetaIdle(None) => PhaseView::Idle,
                Running::MetaIdle(Some(Side::Left)) => PhaseView::LeftHeld,
                Running::MetaIdle(Some(Side::Right)) => PhaseView::RightHeld,
                Running::DownHeld => PhaseView::DownHeld,
                Running::Dropping => PhaseView::Dropping,
                Running::BottomCollision(Collision::Merging) => PhaseView::Merging,
                Running::BottomCollision(Collision::HandlingStrike(rows)) => {
                    PhaseView::LineClearFlash(rows.clone())
                }
                Running::BottomCollision(Collision::SettingNewShape) => {
                    PhaseView::SettingNewShape
                }
            },
        }
    }
}

impl PhaseView {
    /// Whether a piece is under player control
    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            PhaseView::Idle
                | PhaseView::LeftHeld
                | PhaseView::RightHeld
                | PhaseView::DownHeld
                | PhaseView::Dropping
        )
    }

    /// Rows currently flashing before removal
    pub fn struck_rows(&self) -> &[usize] {
        match self {
            PhaseView::LineClearFlash(rows) => rows,
            _ => &[],
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Locked cells, row 0 at the top
    pub grid: [Row; BOARD_HEIGHT],
    /// Cells of the active piece; empty while it is hidden
    pub active: Vec<(i32, i32)>,
    pub active_kind: Option<TetrominoType>,
    /// Where the active piece would land
    pub ghost: Vec<(i32, i32)>,
    pub phase: PhaseView,
    pub points: u64,
    pub lines: u32,
    pub next: TetrominoType,
    /// The next piece inside a 2x4 box
    pub next_preview: [[bool; 4]; 2],
}

impl Snapshot {
    /// True if (row, col) belongs to the active piece
    pub fn is_active(&self, row: i32, col: i32) -> bool {
        self.active.contains(&(row, col))
    }

    pub fn is_ghost(&self, row: i32, col: i32) -> bool {
        self.ghost.contains(&(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, Timing};

    #[test]
    fn test_initial_snapshot() {
        let game = Game::new(Timing::default(), 11);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, PhaseView::Initial);
        assert!(!snapshot.phase.is_playing());
        assert_eq!(snapshot.active.len(), 4);
        assert_eq!(snapshot.points, 0);
        assert_eq!(snapshot.lines, 0);
        assert_eq!(snapshot.next_preview, snapshot.next.preview_cells());
        assert!(snapshot.grid.iter().flatten().all(|cell| cell.is_empty()));
        // Ghost sits on the floor of the empty board
        assert!(snapshot.ghost.iter().any(|&(r, _)| r == BOARD_HEIGHT as i32 - 1));
    }

    #[test]
    fn test_phase_view_mapping() {
        let flash = Phase::Running(Running::BottomCollision(Collision::HandlingStrike(vec![18, 19])));
        let view = PhaseView::from(&flash);
        assert_eq!(view.struck_rows(), &[18, 19]);
        assert_eq!(
            PhaseView::from(&Phase::Running(Running::MetaIdle(Some(Side::Left)))),
            PhaseView::LeftHeld
        );
        assert!(PhaseView::from(&Phase::Running(Running::Dropping)).is_playing());
        assert!(PhaseView::Paused.struck_rows().is_empty());
    }
}
