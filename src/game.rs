//! Core game state and logic
//!
//! The engine is a reducer over [`Event`]s. Commands from the player and
//! timers from the [`Scheduler`] are both events; a handler may raise
//! follow-up events, which are queued and handled before anything else is
//! looked at.

use crate::bag::Bag;
use crate::board::Board;
use crate::piece::Piece;
use crate::scheduler::Scheduler;
use crate::score::Score;
use crate::snapshot::{PhaseView, Snapshot};
use crate::tetromino::TetrominoType;
use derive_more::IsVariant;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Delays driving the game, all measured on the virtual clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Interval between automatic one-row falls
    pub gravity: Duration,
    /// Interval between repeated moves while a direction is held
    pub repeat_move: Duration,
    /// Interval between rows during a hard drop
    pub drop_step: Duration,
    /// Line-clear flash before full rows are removed
    pub clear_delay: Duration,
    /// Pause before the next piece spawns
    pub spawn_delay: Duration,
    /// Time spent on the game over screen
    pub auto_reset: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            gravity: Duration::from_millis(500),
            repeat_move: Duration::from_millis(40),
            drop_step: Duration::from_millis(5),
            clear_delay: Duration::from_millis(300),
            spawn_delay: Duration::from_millis(300),
            auto_reset: Duration::from_millis(5000),
        }
    }
}

/// Input commands the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Reset,
    MoveLeftPressed,
    MoveLeftReleased,
    MoveLeftLongPressed,
    MoveRightPressed,
    MoveRightReleased,
    MoveRightLongPressed,
    MoveDownPressed,
    MoveDownReleased,
    MoveDownLongPressed,
    Rotate,
    Drop,
}

/// Horizontal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Top-level game phase
#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum Phase {
    /// Fresh round waiting for `Start`
    Initial,
    Running(Running),
    Paused,
    /// Game over, waiting for `Reset` or the auto reset
    Finished,
}

/// Sub-phases of a running round
#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum Running {
    /// Gravity is active; `Some` while a horizontal direction is held
    MetaIdle(Option<Side>),
    /// Soft drop held, gravity replaced by the repeat timer
    DownHeld,
    /// Hard drop in progress
    Dropping,
    BottomCollision(Collision),
}

/// Steps of handling a landed piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collision {
    Merging,
    /// Full rows, top to bottom, shown until they are removed
    HandlingStrike(Vec<usize>),
    SettingNewShape,
}

/// Names of the delayed events; arming a name again replaces its timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerId {
    Gravity,
    RepeatMove,
    DownRepeat,
    DropStep,
    ClearRows,
    SpawnNext,
    AutoReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Command(Command),
    Gravity,
    RepeatMove(Side),
    DownRepeat,
    DropStep,
    HandleCollision,
    CheckStrike,
    ClearRows,
    SpawnNext,
    AutoReset,
}

/// The main game struct
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    /// Current falling piece, hidden while a landed piece is handled
    piece: Piece,
    /// Type that spawns after the current piece
    next: TetrominoType,
    bag: Bag,
    score: Score,
    phase: Phase,
    timing: Timing,
    scheduler: Scheduler<TimerId, Event>,
    /// Follow-up events raised by the handler currently running
    queue: VecDeque<Event>,
}

impl Game {
    /// Create a game in the `Initial` phase; `seed` fixes the piece sequence
    pub fn new(timing: Timing, seed: u64) -> Self {
        let mut bag = Bag::with_seed(seed);
        let first = bag.pick_first();
        let next = bag.draw();
        info!("New game, seed={}, first piece {:?}", seed, first);
        Self {
            board: Board::new(),
            piece: Piece::new(first),
            next,
            bag,
            score: Score::new(),
            phase: Phase::Initial,
            timing,
            scheduler: Scheduler::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    pub fn next(&self) -> TetrominoType {
        self.next
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Time until the earliest pending timer fires
    pub fn time_to_next_event(&self) -> Option<Duration> {
        self.scheduler
            .next_due()
            .map(|due| due.saturating_sub(self.scheduler.now()))
    }

    /// Process a command at the current instant
    pub fn handle(&mut self, command: Command) {
        self.process(Event::Command(command));
    }

    /// Move the clock forward, firing every timer that falls due on the way
    pub fn advance(&mut self, dt: Duration) {
        let until = self.scheduler.now() + dt;
        while let Some((id, event)) = self.scheduler.pop_due(until) {
            trace!("Timer {:?} fired at {:?}", id, self.scheduler.now());
            self.process(event);
        }
        self.scheduler.finish_advance(until);
    }

    pub fn snapshot(&self) -> Snapshot {
        let active = self.piece.cells();
        let distance = self.piece.landing_distance(&self.board);
        let ghost = active.iter().map(|&(r, c)| (r + distance, c)).collect();
        Snapshot {
            grid: *self.board.rows(),
            active,
            active_kind: self.piece.kind(),
            ghost,
            phase: PhaseView::from(&self.phase),
            points: self.score.points,
            lines: self.score.lines,
            next: self.next,
            next_preview: self.next.preview_cells(),
        }
    }

    /// Handle one event, then everything it raised, in order
    fn process(&mut self, event: Event) {
        self.queue.push_back(event);
        while let Some(event) = self.queue.pop_front() {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        if event == Event::Command(Command::Reset) {
            info!("Reset requested in {:?}", self.phase);
            self.enter_initial();
            return;
        }

        match (self.phase.clone(), event) {
            (Phase::Initial, Event::Command(Command::Start)) => {
                info!("Round started");
                self.enter_idle();
            }
            (Phase::Running(running), event) => self.on_running(running, event),
            (Phase::Paused, Event::Command(Command::Resume)) => {
                debug!("Resumed");
                self.enter_idle();
            }
            (Phase::Finished, Event::AutoReset) => {
                info!("Auto reset after game over");
                self.enter_initial();
            }
            (phase, event) => trace!("Ignored {:?} in {:?}", event, phase),
        }
    }

    fn on_running(&mut self, running: Running, event: Event) {
        match (running, event) {
            (Running::BottomCollision(_), Event::Command(Command::Pause)) => {
                trace!("Pause ignored while a landed piece is handled");
            }
            (Running::BottomCollision(stage), event) => self.on_collision(stage, event),
            (_, Event::Command(Command::Pause)) => {
                self.cancel_running_timers();
                self.set_phase(Phase::Paused);
            }
            (_, Event::HandleCollision) => self.merge_piece(),
            (Running::MetaIdle(held), event) => self.on_meta_idle(held, event),
            (Running::DownHeld, Event::DownRepeat) => {
                let delay = self.timing.repeat_move;
                self.step_down(TimerId::DownRepeat, delay, Event::DownRepeat);
            }
            (Running::DownHeld, Event::Command(Command::MoveDownReleased)) => {
                self.scheduler.cancel(TimerId::DownRepeat);
                self.enter_idle();
            }
            (Running::Dropping, Event::DropStep) => {
                let delay = self.timing.drop_step;
                self.step_down(TimerId::DropStep, delay, Event::DropStep);
            }
            (running, event) => trace!("Ignored {:?} in {:?}", event, running),
        }
    }

    fn on_meta_idle(&mut self, held: Option<Side>, event: Event) {
        match event {
            Event::Gravity => {
                let delay = self.timing.gravity;
                self.scheduler.arm(TimerId::Gravity, delay, Event::Gravity);
                self.fall_or_land();
            }
            Event::Command(Command::MoveLeftPressed) => {
                self.piece.move_left(&self.board);
            }
            Event::Command(Command::MoveRightPressed) => {
                self.piece.move_right(&self.board);
            }
            Event::Command(Command::MoveDownPressed) => self.fall_or_land(),
            Event::Command(Command::Rotate) => {
                self.piece.rotate(&self.board);
            }
            Event::Command(Command::MoveLeftLongPressed) => self.hold(Side::Left),
            Event::Command(Command::MoveRightLongPressed) => self.hold(Side::Right),
            Event::Command(Command::MoveLeftReleased) if held == Some(Side::Left) => {
                self.release()
            }
            Event::Command(Command::MoveRightReleased) if held == Some(Side::Right) => {
                self.release()
            }
            Event::RepeatMove(side) if held == Some(side) => {
                self.shift(side);
                let delay = self.timing.repeat_move;
                self.scheduler
                    .arm(TimerId::RepeatMove, delay, Event::RepeatMove(side));
            }
            Event::Command(Command::MoveDownLongPressed) => {
                self.scheduler.cancel(TimerId::Gravity);
                self.scheduler.cancel(TimerId::RepeatMove);
                self.set_phase(Phase::Running(Running::DownHeld));
                let delay = self.timing.repeat_move;
                self.step_down(TimerId::DownRepeat, delay, Event::DownRepeat);
            }
            Event::Command(Command::Drop) => {
                self.scheduler.cancel(TimerId::Gravity);
                self.scheduler.cancel(TimerId::RepeatMove);
                self.set_phase(Phase::Running(Running::Dropping));
                let delay = self.timing.drop_step;
                self.scheduler.arm(TimerId::DropStep, delay, Event::DropStep);
            }
            event => trace!("Ignored {:?} in MetaIdle({:?})", event, held),
        }
    }

    fn on_collision(&mut self, stage: Collision, event: Event) {
        match (stage, event) {
            (Collision::Merging, Event::CheckStrike) => {
                let rows = self.board.full_rows();
                if rows.is_empty() {
                    self.enter_setting_new_shape();
                } else {
                    debug!("Rows {:?} complete", rows);
                    self.set_phase(Phase::Running(Running::BottomCollision(
                        Collision::HandlingStrike(rows),
                    )));
                    let delay = self.timing.clear_delay;
                    self.scheduler.arm(TimerId::ClearRows, delay, Event::ClearRows);
                }
            }
            (Collision::HandlingStrike(_), Event::ClearRows) => {
                let cleared = self.board.clear_full_rows() as u32;
                let earned = self.score.add_clear(cleared);
                debug!(
                    "Cleared {} rows for {} points, total {}",
                    cleared, earned, self.score.points
                );
                self.enter_setting_new_shape();
            }
            (Collision::SettingNewShape, Event::SpawnNext) => self.spawn_next(),
            (stage, event) => trace!("Ignored {:?} in {:?}", event, stage),
        }
    }

    /// Move down one row, or raise a collision if the piece has landed
    fn fall_or_land(&mut self) {
        if self.board.can_move_down(&self.piece.cells()) {
            self.piece.move_down();
        } else {
            self.queue.push_back(Event::HandleCollision);
        }
    }

    /// One step of a repeating downward move; stops repeating on landing
    fn step_down(&mut self, timer: TimerId, delay: Duration, event: Event) {
        if self.board.can_move_down(&self.piece.cells()) {
            self.piece.move_down();
            self.scheduler.arm(timer, delay, event);
        } else {
            self.queue.push_back(Event::HandleCollision);
        }
    }

    fn shift(&mut self, side: Side) -> bool {
        match side {
            Side::Left => self.piece.move_left(&self.board),
            Side::Right => self.piece.move_right(&self.board),
        }
    }

    fn hold(&mut self, side: Side) {
        self.set_phase(Phase::Running(Running::MetaIdle(Some(side))));
        self.shift(side);
        let delay = self.timing.repeat_move;
        self.scheduler
            .arm(TimerId::RepeatMove, delay, Event::RepeatMove(side));
    }

    fn release(&mut self) {
        self.scheduler.cancel(TimerId::RepeatMove);
        self.set_phase(Phase::Running(Running::MetaIdle(None)));
    }

    fn merge_piece(&mut self) {
        self.cancel_running_timers();
        self.set_phase(Phase::Running(Running::BottomCollision(Collision::Merging)));
        let cells = self.piece.cells();
        self.board.merge(&cells);
        debug!("Merged {:?} at {:?}", self.piece.kind(), cells);
        self.piece.hide();
        self.queue.push_back(Event::CheckStrike);
    }

    fn enter_setting_new_shape(&mut self) {
        self.set_phase(Phase::Running(Running::BottomCollision(
            Collision::SettingNewShape,
        )));
        let delay = self.timing.spawn_delay;
        self.scheduler.arm(TimerId::SpawnNext, delay, Event::SpawnNext);
    }

    fn spawn_next(&mut self) {
        self.piece.reset(self.next);
        self.next = self.bag.draw();
        if self.board.fits(&self.piece.cells()) {
            self.enter_idle();
        } else {
            info!(
                "Game over: {:?} cannot spawn, points={}, lines={}",
                self.piece.kind(),
                self.score.points,
                self.score.lines
            );
            self.set_phase(Phase::Finished);
            let delay = self.timing.auto_reset;
            self.scheduler.arm(TimerId::AutoReset, delay, Event::AutoReset);
        }
    }

    /// Enter `MetaIdle` with a full gravity interval ahead
    fn enter_idle(&mut self) {
        self.set_phase(Phase::Running(Running::MetaIdle(None)));
        let delay = self.timing.gravity;
        self.scheduler.arm(TimerId::Gravity, delay, Event::Gravity);
    }

    fn enter_initial(&mut self) {
        self.scheduler.cancel_all();
        self.queue.clear();
        self.board = Board::new();
        self.score = Score::new();
        let first = self.bag.pick_first();
        self.piece.reset(first);
        self.next = self.bag.draw();
        self.set_phase(Phase::Initial);
    }

    fn cancel_running_timers(&mut self) {
        for id in [
            TimerId::Gravity,
            TimerId::RepeatMove,
            TimerId::DownRepeat,
            TimerId::DropStep,
        ] {
            self.scheduler.cancel(id);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("Phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
    }
}
