use log::{debug, info};

use crate::grid::{Cell, Grid, LineClear, Position, GRID_HEIGHT, GRID_WIDTH};
use crate::piece::{Color, Piece, PieceProvider};

// ============================================================================
// Configuration
// ============================================================================

// Timing (in milliseconds)
pub const BASE_INTERVAL_MS: u64 = 1000;
pub const MIN_INTERVAL_MS: u64 = 100;
pub const INTERVAL_STEP_MS: u64 = 100;
pub const LINES_PER_LEVEL: u32 = 10;

// Scoring, indexed by lines cleared in one lock
pub const SCORE_TABLE: [u32; 5] = [0, 100, 300, 500, 800];
pub const HARD_DROP_BONUS_PER_ROW: u32 = 2;

pub const SPAWN_POSITION: Position = Position::new(GRID_WIDTH as i16 / 2 - 1, 0);

/// Offsets tried in order when a rotation collides in place.
pub const WALL_KICKS: [(i16, i16); 4] = [(0, 0), (-1, 0), (1, 0), (0, -1)];

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
    Down,
}

impl Direction {
    fn offset(self) -> (i16, i16) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Paused,
    GameOver,
}

/// Edges a driver reacts to, derived by comparing two snapshots.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    LinesCleared(u32),
    LevelUp(u32),
    Paused,
    Unpaused,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewCell {
    Empty,
    Locked(Color),
    Ghost(Color),
    Active(Color),
}

pub type BoardView = [[ViewCell; GRID_WIDTH]; GRID_HEIGHT];

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GameState {
    pub grid: Grid,
    pub current_piece: Piece,
    pub current_position: Position,
    pub next_piece: Piece,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub is_game_over: bool,
    pub is_paused: bool,
}

// ============================================================================
// Timing & Scoring Policy
// ============================================================================

/// Gravity interval for a level, in milliseconds.
pub fn drop_interval(level: u32) -> u64 {
    let reduction = u64::from(level.saturating_sub(1)) * INTERVAL_STEP_MS;
    BASE_INTERVAL_MS.saturating_sub(reduction).max(MIN_INTERVAL_MS)
}

pub fn level_for_lines(lines: u32) -> u32 {
    lines / LINES_PER_LEVEL + 1
}

pub fn score_for_lines(lines_cleared: u32, level: u32) -> u32 {
    let base = SCORE_TABLE
        .get(lines_cleared as usize)
        .copied()
        .unwrap_or(0);
    base.saturating_mul(level)
}

// ============================================================================
// Transition Engine
// ============================================================================

pub fn create_initial_state(provider: &mut dyn PieceProvider) -> GameState {
    GameState::new(provider)
}

impl GameState {
    /// Empty grid, two fresh pieces, level 1.
    pub fn new(provider: &mut dyn PieceProvider) -> Self {
        let current_piece = provider.draw();
        let next_piece = provider.draw();
        Self::with_grid(Grid::empty(), current_piece, SPAWN_POSITION, next_piece)
    }

    pub fn with_grid(
        grid: Grid,
        current_piece: Piece,
        current_position: Position,
        next_piece: Piece,
    ) -> Self {
        Self {
            grid,
            current_piece,
            current_position,
            next_piece,
            score: 0,
            level: 1,
            lines: 0,
            is_game_over: false,
            is_paused: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_game_over {
            Phase::GameOver
        } else if self.is_paused {
            Phase::Paused
        } else {
            Phase::Playing
        }
    }

    fn is_frozen(&self) -> bool {
        self.is_game_over || self.is_paused
    }

    fn fits(&self, piece: &Piece, position: Position) -> bool {
        !self.grid.has_collision(piece, position)
    }

    pub fn move_piece(&self, direction: Direction) -> Self {
        if self.is_frozen() {
            return self.clone();
        }
        let (dx, dy) = direction.offset();
        let candidate = self.current_position.offset(dx, dy);
        if !self.fits(&self.current_piece, candidate) {
            return self.clone();
        }
        Self {
            current_position: candidate,
            ..self.clone()
        }
    }

    pub fn rotate(&self) -> Self {
        if self.is_frozen() {
            return self.clone();
        }
        let rotated = self.current_piece.rotated();
        let kicked = WALL_KICKS
            .iter()
            .map(|&(dx, dy)| self.current_position.offset(dx, dy))
            .find(|&candidate| self.fits(&rotated, candidate));

        match kicked {
            Some(position) => Self {
                current_piece: rotated,
                current_position: position,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Gravity tick: one row down, or lock when the row below is blocked.
    pub fn drop_piece(&self, provider: &mut dyn PieceProvider) -> Self {
        if self.is_frozen() {
            return self.clone();
        }
        let below = self.current_position.offset(0, 1);
        if self.fits(&self.current_piece, below) {
            return Self {
                current_position: below,
                ..self.clone()
            };
        }
        self.lock_at(self.current_position, 0, provider)
    }

    pub fn hard_drop(&self, provider: &mut dyn PieceProvider) -> Self {
        if self.is_frozen() {
            return self.clone();
        }
        let (resting, rows) = self.drop_target();
        let bonus = rows.saturating_mul(HARD_DROP_BONUS_PER_ROW);
        self.lock_at(resting, bonus, provider)
    }

    pub fn toggle_pause(&self) -> Self {
        if self.is_game_over {
            return self.clone();
        }
        Self {
            is_paused: !self.is_paused,
            ..self.clone()
        }
    }

    /// Where the active piece would rest if hard-dropped now. Ignores pause
    /// and game over.
    pub fn ghost_position(&self) -> Position {
        self.drop_target().0
    }

    fn drop_target(&self) -> (Position, u32) {
        let mut position = self.current_position;
        let mut rows = 0;
        while self.fits(&self.current_piece, position.offset(0, 1)) {
            position = position.offset(0, 1);
            rows += 1;
        }
        (position, rows)
    }

    fn lock_at(&self, position: Position, bonus: u32, provider: &mut dyn PieceProvider) -> Self {
        let locked = self.grid.lock_piece(&self.current_piece, position);
        let LineClear {
            grid,
            lines_cleared,
        } = locked.clear_completed_lines();

        let gained = score_for_lines(lines_cleared, self.level);
        let score = self.score.saturating_add(bonus).saturating_add(gained);
        let lines = self.lines.saturating_add(lines_cleared);
        let level = level_for_lines(lines);

        let current_piece = self.next_piece;
        let next_piece = provider.draw();
        let is_game_over = grid.has_collision(&current_piece, SPAWN_POSITION);

        debug!(
            "locked {:?} at ({}, {}): {} lines, +{} score",
            self.current_piece.kind,
            position.x,
            position.y,
            lines_cleared,
            gained.saturating_add(bonus)
        );
        if level > self.level {
            info!("level up: {}", level);
        }
        if is_game_over {
            info!("topped out with score {}", score);
        }

        Self {
            grid,
            current_piece,
            current_position: SPAWN_POSITION,
            next_piece,
            score,
            level,
            lines,
            is_game_over,
            is_paused: self.is_paused,
        }
    }

    /// Absolute coordinates of the active piece's cells.
    pub fn active_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.current_piece
            .cells()
            .map(move |(px, py)| self.current_position.offset(px, py))
    }

    /// Locked cells with the ghost and the active piece overlaid.
    pub fn board_view(&self) -> BoardView {
        let mut view = [[ViewCell::Empty; GRID_WIDTH]; GRID_HEIGHT];
        for (y, row) in self.grid.rows().iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Cell::Filled(color) = *cell {
                    view[y][x] = ViewCell::Locked(color);
                }
            }
        }

        let color = self.current_piece.color;
        let ghost = self.ghost_position();
        for (px, py) in self.current_piece.cells() {
            if let Some((x, y)) = view_index(ghost.offset(px, py)) {
                if view[y][x] == ViewCell::Empty {
                    view[y][x] = ViewCell::Ghost(color);
                }
            }
        }
        for cell in self.active_cells() {
            if let Some((x, y)) = view_index(cell) {
                view[y][x] = ViewCell::Active(color);
            }
        }
        view
    }
}

fn view_index(position: Position) -> Option<(usize, usize)> {
    let x = usize::try_from(position.x).ok().filter(|&x| x < GRID_WIDTH)?;
    let y = usize::try_from(position.y).ok().filter(|&y| y < GRID_HEIGHT)?;
    Some((x, y))
}

/// Events implied by moving from `prev` to `next`.
pub fn events_between(prev: &GameState, next: &GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if next.lines > prev.lines {
        events.push(GameEvent::LinesCleared(next.lines - prev.lines));
    }
    if next.level > prev.level {
        events.push(GameEvent::LevelUp(next.level));
    }
    match (prev.is_paused, next.is_paused) {
        (false, true) => events.push(GameEvent::Paused),
        (true, false) => events.push(GameEvent::Unpaused),
        _ => {}
    }
    if next.is_game_over && !prev.is_game_over {
        events.push(GameEvent::GameOver);
    }

    events
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::piece::TetrominoType;

    pub const FILLER: Color = Color::rgb(0x80, 0x80, 0x80);

    pub fn empty_grid() -> Grid {
        Grid::empty()
    }

    pub fn fill_row(grid: &mut Grid, y: usize) {
        for x in 0..GRID_WIDTH {
            grid[y][x] = Cell::Filled(FILLER);
        }
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: usize, gap_x: usize) {
        for x in 0..GRID_WIDTH {
            if x != gap_x {
                grid[y][x] = Cell::Filled(FILLER);
            }
        }
    }

    /// Playing state with `kind` at `(x, y)` and an O-piece queued next.
    pub fn state_with(grid: Grid, kind: TetrominoType, x: i16, y: i16) -> GameState {
        GameState::with_grid(
            grid,
            Piece::new(kind),
            Position::new(x, y),
            Piece::new(TetrominoType::O),
        )
    }
}
