//! Falling-block puzzle engine
//!
//! A discrete-event state machine: [`game::Game`] reacts to player
//! [`game::Command`]s and to named, cancelable timers on a virtual clock, and
//! exposes everything a renderer needs through [`snapshot::Snapshot`].

pub mod bag;
pub mod board;
pub mod game;
pub mod piece;
pub mod scheduler;
pub mod score;
pub mod settings;
pub mod snapshot;
pub mod tetromino;
