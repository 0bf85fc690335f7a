//! Final-score hand-off. The engine never calls this; the driver submits
//! once when a session tops out and ignores the outcome beyond logging it.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum GameMode {
    Snake,
    Minesweeper,
    SpaceInvaders,
    Tetris,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Snake,
        GameMode::Minesweeper,
        GameMode::SpaceInvaders,
        GameMode::Tetris,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Snake => "snake",
            GameMode::Minesweeper => "minesweeper",
            GameMode::SpaceInvaders => "space_invaders",
            GameMode::Tetris => "tetris",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == tag)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScoreSubmission {
    pub score: u32,
    pub game_mode: GameMode,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait ScoreSubmitter {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError>;
}

/// Appends `<mode> <score>` lines to a local file.
pub struct FileScoreSubmitter {
    path: PathBuf,
}

impl FileScoreSubmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best recorded score for `mode`. A missing file means no scores yet.
    pub fn best_score(&self, mode: GameMode) -> Result<Option<u32>, SubmitError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        let best = content
            .lines()
            .filter_map(|line| match parse_line(line) {
                Some(entry) => Some(entry),
                None => {
                    if !line.trim().is_empty() {
                        warn!("skipping malformed score line {:?}", line);
                    }
                    None
                }
            })
            .filter(|entry| entry.game_mode == mode)
            .map(|entry| entry.score)
            .max();
        Ok(best)
    }

    fn io_error(&self, source: io::Error) -> SubmitError {
        SubmitError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreSubmitter for FileScoreSubmitter {
    fn submit(&mut self, submission: &ScoreSubmission) -> Result<(), SubmitError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{} {}", submission.game_mode, submission.score)
            .map_err(|source| self.io_error(source))
    }
}

fn parse_line(line: &str) -> Option<ScoreSubmission> {
    let mut parts = line.split_whitespace();
    let game_mode = GameMode::from_tag(parts.next()?)?;
    let score = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ScoreSubmission { score, game_mode })
}
