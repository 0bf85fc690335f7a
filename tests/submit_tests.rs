//! File-backed score submission. Tests share a scratch file, so they run
//! serially.

use std::fs;
use std::path::PathBuf;

use arcade_tetris::game::{events_between, test_helpers::*, GameEvent};
use arcade_tetris::grid::{Cell, GRID_HEIGHT};
use arcade_tetris::piece::{SequencePieceProvider, TetrominoType};
use arcade_tetris::submit::{
    FileScoreSubmitter, GameMode, ScoreSubmission, ScoreSubmitter, SubmitError,
};
use serial_test::serial;

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join("arcade-tetris-submit-tests.txt")
}

fn fresh_submitter() -> FileScoreSubmitter {
    let path = scratch_path();
    let _ = fs::remove_file(&path);
    FileScoreSubmitter::new(path)
}

fn tetris(score: u32) -> ScoreSubmission {
    ScoreSubmission {
        score,
        game_mode: GameMode::Tetris,
    }
}

#[test]
#[serial]
fn missing_file_has_no_best_score() {
    let submitter = fresh_submitter();
    assert_eq!(submitter.best_score(GameMode::Tetris).unwrap(), None);
}

#[test]
#[serial]
fn submissions_are_appended() {
    let mut submitter = fresh_submitter();
    submitter.submit(&tetris(120)).unwrap();
    submitter.submit(&tetris(40)).unwrap();

    let content = fs::read_to_string(submitter.path()).unwrap();
    assert_eq!(content, "tetris 120\ntetris 40\n");
}

#[test]
#[serial]
fn best_score_is_per_mode() {
    let mut submitter = fresh_submitter();
    submitter.submit(&tetris(300)).unwrap();
    submitter
        .submit(&ScoreSubmission {
            score: 9000,
            game_mode: GameMode::Snake,
        })
        .unwrap();
    submitter.submit(&tetris(800)).unwrap();

    assert_eq!(submitter.best_score(GameMode::Tetris).unwrap(), Some(800));
    assert_eq!(submitter.best_score(GameMode::Snake).unwrap(), Some(9000));
    assert_eq!(submitter.best_score(GameMode::Minesweeper).unwrap(), None);
}

#[test]
#[serial]
fn malformed_lines_are_skipped() {
    let submitter = fresh_submitter();
    fs::write(
        submitter.path(),
        "tetris 50\ngarbage\n\ntetris lots\nspace_invaders 70\ntetris 65\n",
    )
    .unwrap();

    assert_eq!(submitter.best_score(GameMode::Tetris).unwrap(), Some(65));
    assert_eq!(submitter.best_score(GameMode::SpaceInvaders).unwrap(), Some(70));
}

#[test]
#[serial]
fn unwritable_path_reports_io_error() {
    let dir = std::env::temp_dir().join("arcade-tetris-submit-dir");
    fs::create_dir_all(&dir).unwrap();
    let mut submitter = FileScoreSubmitter::new(&dir);

    let err = submitter.submit(&tetris(10)).unwrap_err();
    let SubmitError::Io { path, .. } = err;
    assert_eq!(path, dir);
}

#[test]
#[serial]
fn final_score_submitted_on_game_over_edge() {
    let mut submitter = fresh_submitter();
    let mut pieces = SequencePieceProvider::new(vec![TetrominoType::O]);

    let mut grid = empty_grid();
    grid[1][4] = Cell::Filled(FILLER);
    let game = state_with(grid, TetrominoType::O, 0, 0);
    let over = game.hard_drop(&mut pieces);

    for event in events_between(&game, &over) {
        if event == GameEvent::GameOver {
            submitter.submit(&tetris(over.score)).unwrap();
        }
    }

    let expected = (GRID_HEIGHT as u32 - 2) * 2;
    assert_eq!(submitter.best_score(GameMode::Tetris).unwrap(), Some(expected));
}
