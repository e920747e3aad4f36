//! Keyboard input to engine commands, with long-press detection
//!
//! Terminals that report key releases get a hold threshold: a direction held
//! for `long_press` becomes a long press. Everywhere else a key counts as
//! held once the OS starts auto-repeating it, and as released when the
//! repeats stop arriving.

use blockfall::game::Command;
use blockfall::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What a key means to the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Game(Command),
    /// Pause while playing, resume while paused
    TogglePause,
    Quit,
}

/// Repeatable directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
    Down,
}

impl Dir {
    fn pressed(self) -> Command {
        match self {
            Dir::Left => Command::MoveLeftPressed,
            Dir::Right => Command::MoveRightPressed,
            Dir::Down => Command::MoveDownPressed,
        }
    }

    fn long_pressed(self) -> Command {
        match self {
            Dir::Left => Command::MoveLeftLongPressed,
            Dir::Right => Command::MoveRightLongPressed,
            Dir::Down => Command::MoveDownLongPressed,
        }
    }

    fn released(self) -> Command {
        match self {
            Dir::Left => Command::MoveLeftReleased,
            Dir::Right => Command::MoveRightReleased,
            Dir::Down => Command::MoveDownReleased,
        }
    }
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    /// LongPressed has been sent, so a Released is owed
    long: bool,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            long: false,
        }
    }
}

/// Key bindings configuration - supports multiple keys per command
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub move_down: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub drop: Vec<KeyCode>,
    pub start: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub reset: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("Unknown key name {:?} in bindings", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            move_left: Self::parse_keys(&settings.keys.move_left),
            move_right: Self::parse_keys(&settings.keys.move_right),
            move_down: Self::parse_keys(&settings.keys.move_down),
            rotate: Self::parse_keys(&settings.keys.rotate),
            drop: Self::parse_keys(&settings.keys.drop),
            start: Self::parse_keys(&settings.keys.start),
            pause: Self::parse_keys(&settings.keys.pause),
            reset: Self::parse_keys(&settings.keys.reset),
            quit: Self::parse_keys(&settings.keys.quit),
        }
    }

    fn direction(&self, code: KeyCode) -> Option<Dir> {
        if self.move_left.contains(&code) {
            Some(Dir::Left)
        } else if self.move_right.contains(&code) {
            Some(Dir::Right)
        } else if self.move_down.contains(&code) {
            Some(Dir::Down)
        } else {
            None
        }
    }
}

/// Turns key events into [`Action`]s
pub struct InputHandler {
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    down_state: Option<KeyPressState>,
    bindings: KeyBindings,
    /// Hold time before a direction becomes a long press
    long_press: Duration,
    /// The terminal sends release events, so holds are timed instead of
    /// inferred from auto-repeat
    release_events: bool,
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings, release_events: bool) -> Self {
        Self {
            left_state: None,
            right_state: None,
            down_state: None,
            bindings: KeyBindings::from_settings(settings),
            long_press: settings.timing.long_press(),
            release_events,
        }
    }

    fn state_mut(&mut self, dir: Dir) -> &mut Option<KeyPressState> {
        match dir {
            Dir::Left => &mut self.left_state,
            Dir::Right => &mut self.right_state,
            Dir::Down => &mut self.down_state,
        }
    }

    /// Handle a key press (or auto-repeat) event
    pub fn key_down(&mut self, key: KeyEvent, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();

        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            actions.push(Action::Quit);
            return actions;
        }

        let code = normalize_key(key.code);

        if let Some(dir) = self.bindings.direction(code) {
            // Only one horizontal direction at a time
            let opposite = match dir {
                Dir::Left => Some(Dir::Right),
                Dir::Right => Some(Dir::Left),
                Dir::Down => None,
            };
            if let Some(opposite) = opposite {
                if let Some(state) = self.state_mut(opposite).take() {
                    if state.long {
                        actions.push(Action::Game(opposite.released()));
                    }
                }
            }

            let release_events = self.release_events;
            let slot = self.state_mut(dir);
            match slot {
                None => {
                    actions.push(Action::Game(dir.pressed()));
                    *slot = Some(KeyPressState::new(now));
                }
                Some(state) => {
                    state.last_seen = now;
                    // Without release events, auto-repeat is the only sign of a hold
                    if !state.long && !release_events {
                        state.long = true;
                        actions.push(Action::Game(dir.long_pressed()));
                    }
                }
            }
        } else if self.bindings.rotate.contains(&code) {
            actions.push(Action::Game(Command::Rotate));
        } else if self.bindings.drop.contains(&code) {
            actions.push(Action::Game(Command::Drop));
        } else if self.bindings.start.contains(&code) {
            actions.push(Action::Game(Command::Start));
        } else if self.bindings.pause.contains(&code) {
            actions.push(Action::TogglePause);
        } else if self.bindings.reset.contains(&code) {
            actions.push(Action::Game(Command::Reset));
        } else if self.bindings.quit.contains(&code) {
            actions.push(Action::Quit);
        }

        actions
    }

    /// Handle a key release event (only sent by some terminals)
    pub fn key_up(&mut self, key: KeyEvent) -> Vec<Action> {
        let code = normalize_key(key.code);
        let Some(dir) = self.bindings.direction(code) else {
            return Vec::new();
        };
        match self.state_mut(dir).take() {
            Some(state) if state.long => vec![Action::Game(dir.released())],
            _ => Vec::new(),
        }
    }

    /// Update held keys and return long-press and release actions (call every frame)
    pub fn update(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        let long_press = self.long_press;
        let release_events = self.release_events;

        for dir in [Dir::Left, Dir::Right, Dir::Down] {
            let slot = self.state_mut(dir);
            let Some(state) = slot.as_mut() else {
                continue;
            };

            if release_events {
                if !state.long && now.duration_since(state.first_press) >= long_press {
                    state.long = true;
                    actions.push(Action::Game(dir.long_pressed()));
                }
            } else if now.duration_since(state.last_seen) > KEY_TIMEOUT {
                // No recent key event = released
                if state.long {
                    actions.push(Action::Game(dir.released()));
                }
                *slot = None;
            }
        }

        actions
    }

    /// Forget held keys, returning the releases still owed
    pub fn clear(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        for dir in [Dir::Left, Dir::Right, Dir::Down] {
            if let Some(state) = self.state_mut(dir).take() {
                if state.long {
                    actions.push(Action::Game(dir.released()));
                }
            }
        }
        actions
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
