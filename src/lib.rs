//! Falling-block puzzle engine for the arcade portal.
//!
//! Every transition borrows a [`GameState`] and returns a new one; rejected
//! moves come back unchanged and topping out is a state flag, not an error.

pub mod game;
pub mod grid;
pub mod piece;
pub mod submit;

pub use game::{
    create_initial_state, drop_interval, events_between, Direction, GameEvent, GameState, Phase,
};
pub use grid::{create_empty_grid, Cell, Grid, Position, GRID_HEIGHT, GRID_WIDTH};
pub use piece::{Piece, PieceProvider, RandomPieceProvider, SequencePieceProvider, TetrominoType};
pub use submit::{FileScoreSubmitter, GameMode, ScoreSubmission, ScoreSubmitter, SubmitError};
