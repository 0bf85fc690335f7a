use std::fs::{File, OpenOptions};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::{error, info, LevelFilter, Log, Metadata, Record};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use arcade_tetris::game::{events_between, BoardView, GameEvent, Phase, ViewCell};
use arcade_tetris::piece::{self, Piece, PieceProvider, RandomPieceProvider};
use arcade_tetris::submit::{FileScoreSubmitter, GameMode, ScoreSubmission, ScoreSubmitter};
use arcade_tetris::{drop_interval, Direction, GameState, GRID_HEIGHT, GRID_WIDTH};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const GHOST_CHAR: &str = "░░";
const EMPTY_CHAR: &str = "  ";

// ============================================================================
// Command Line
// ============================================================================

/// Falling-block puzzle from the arcade portal, in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "arcade-tetris",
    version,
    about = "Falling-block puzzle in the terminal.",
    long_about = "Falling-block puzzle in the terminal.\n\n\
        CONTROLS:\n  Left/Right  Move    Down   Move down   Up      Rotate\n  \
        Space       Hard drop   P      Pause       R       Restart   Q / Esc  Quit"
)]
struct Args {
    /// Seed for the piece sequence. Random when not set.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// File that final scores are appended to.
    #[arg(long, default_value = "scores.txt", value_name = "FILE")]
    scores_file: PathBuf,

    /// Do not record the final score.
    #[arg(long)]
    no_submit: bool,

    /// Append log records to this file. Nothing is logged when unset.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

// ============================================================================
// Logging
// ============================================================================

struct FileLogger {
    file: Mutex<File>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    log::set_boxed_logger(Box::new(FileLogger {
        file: Mutex::new(file),
    }))
    .context("installing logger")?;
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}

// ============================================================================
// Color Mapping
// ============================================================================

fn term_color(color: piece::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &GameState, best: Option<u32>) {
    let area = frame.size();
    render_game(frame, game, best, area);

    match game.phase() {
        Phase::Playing => {}
        Phase::Paused => render_paused(frame, area),
        Phase::GameOver => render_game_over(frame, game, area),
    }
}

fn render_game(frame: &mut Frame, game: &GameState, best: Option<u32>, area: Rect) {
    let grid_display_width = (GRID_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = GRID_HEIGHT as u16 + 2;
    let side_width = 14;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height + 2;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);
    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).split(horizontal[1]);

    render_board(frame, &game.board_view(), horizontal[0]);
    render_next(frame, &game.next_piece, side[0]);
    render_info(frame, game, best, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 1,
    };
    if controls_area.y < area.y + area.height {
        let controls = Paragraph::new(Line::from(
            "←→: Move | ↓: Down | ↑: Rotate | Space: Drop | P: Pause | R: Restart | Q: Quit",
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_board(frame: &mut Frame, view: &BoardView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetris ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = view
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match *cell {
                    ViewCell::Empty => Span::raw(EMPTY_CHAR),
                    ViewCell::Locked(color) | ViewCell::Active(color) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(term_color(color)))
                    }
                    ViewCell::Ghost(color) => Span::styled(
                        GHOST_CHAR,
                        Style::default()
                            .fg(term_color(color))
                            .add_modifier(Modifier::DIM),
                    ),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_next(frame: &mut Frame, next: &Piece, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let style = Style::default().fg(term_color(next.color));
    let size = next.shape.size();
    let lines: Vec<Line> = (0..size)
        .filter(|&row| (0..size).any(|col| next.shape.is_filled(col, row)))
        .map(|row| {
            let mut spans = vec![Span::raw(" ")];
            spans.extend((0..size).map(|col| {
                if next.shape.is_filled(col, row) {
                    Span::styled(BLOCK_CHAR, style)
                } else {
                    Span::raw(EMPTY_CHAR)
                }
            }));
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &GameState, best: Option<u32>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(game.score.to_string()),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(game.lines.to_string()),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(game.level.to_string()),
    ];
    if let Some(best) = best {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Best", Style::default().fg(Color::Magenta))));
        lines.push(Line::from(best.to_string()));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_game_over(frame: &mut Frame, game: &GameState, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", game.score)),
        Line::from(format!("Lines: {}", game.lines)),
        Line::from(format!("Level: {}", game.level)),
        Line::from(""),
        Line::from(Span::styled(
            "R: play again | Q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    render_popup(frame, " Game Over ", text, 26, 12, area);
}

fn render_paused(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "Press P to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    render_popup(frame, " Paused ", text, 24, 8, area);
}

fn render_popup(frame: &mut Frame, title: &str, text: Vec<Line>, width: u16, height: u16, area: Rect) {
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );
    let popup_area = centered_rect(width, height, area);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Session
// ============================================================================

struct Session {
    game: GameState,
    provider: Box<dyn PieceProvider>,
    submitter: Option<FileScoreSubmitter>,
    best: Option<u32>,
}

impl Session {
    fn new(args: &Args) -> Self {
        let mut provider: Box<dyn PieceProvider> = match args.seed {
            Some(seed) => Box::new(RandomPieceProvider::seeded(seed)),
            None => Box::new(RandomPieceProvider::new()),
        };
        let game = GameState::new(provider.as_mut());
        let submitter = (!args.no_submit).then(|| FileScoreSubmitter::new(&args.scores_file));
        let best = submitter.as_ref().and_then(|s| match s.best_score(GameMode::Tetris) {
            Ok(best) => best,
            Err(err) => {
                error!("reading best score: {}", err);
                None
            }
        });
        Self {
            game,
            provider,
            submitter,
            best,
        }
    }

    /// Swaps in the next snapshot and reacts to the edges it crossed.
    fn advance(&mut self, next: GameState) {
        for event in events_between(&self.game, &next) {
            match event {
                GameEvent::GameOver => self.submit(next.score),
                GameEvent::LevelUp(level) => info!("reached level {}", level),
                _ => {}
            }
        }
        self.game = next;
    }

    fn submit(&mut self, score: u32) {
        let Some(submitter) = self.submitter.as_mut() else {
            return;
        };
        let submission = ScoreSubmission {
            score,
            game_mode: GameMode::Tetris,
        };
        match submitter.submit(&submission) {
            Ok(()) => {
                info!("submitted {} score {}", submission.game_mode, score);
                self.best = Some(self.best.map_or(score, |best| best.max(score)));
            }
            Err(err) => error!("score submission failed: {}", err),
        }
    }

    fn restart(&mut self) {
        self.game = GameState::new(self.provider.as_mut());
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    enable_raw_mode().context("enabling raw mode")?;
    stdout()
        .execute(EnterAlternateScreen)
        .context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout());
    let result = Terminal::new(backend)
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| run(&mut terminal, &args));

    disable_raw_mode().context("disabling raw mode")?;
    stdout()
        .execute(LeaveAlternateScreen)
        .context("leaving alternate screen")?;
    log::logger().flush();

    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, args: &Args) -> Result<()> {
    let mut session = Session::new(args);
    let mut last_drop = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, &session.game, session.best))?;

        let interval = Duration::from_millis(drop_interval(session.game.level));
        let timeout = interval
            .checked_sub(last_drop.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let game = &session.game;
                    let next = match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            session.restart();
                            last_drop = Instant::now();
                            continue;
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') => Some(game.toggle_pause()),
                        KeyCode::Left => Some(game.move_piece(Direction::Left)),
                        KeyCode::Right => Some(game.move_piece(Direction::Right)),
                        KeyCode::Down => Some(game.move_piece(Direction::Down)),
                        KeyCode::Up => Some(game.rotate()),
                        KeyCode::Char(' ') => Some(game.hard_drop(session.provider.as_mut())),
                        _ => None,
                    };
                    if let Some(next) = next {
                        session.advance(next);
                    }
                }
            }
        }

        if session.game.phase() != Phase::Playing {
            last_drop = Instant::now();
        } else if last_drop.elapsed() >= interval {
            let next = session.game.drop_piece(session.provider.as_mut());
            session.advance(next);
            last_drop = Instant::now();
        }
    }

    Ok(())
}
