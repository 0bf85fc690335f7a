use std::ops::{Index, IndexMut};

use crate::piece::{Color, Piece};

// ============================================================================
// Configuration
// ============================================================================

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

// ============================================================================
// Types
// ============================================================================

/// Grid coordinate. For a piece this is the top-left corner of its shape
/// matrix; `y` grows downward and may be negative while spawning.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i16, dy: i16) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Color),
}

impl Cell {
    pub fn is_filled(self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(color),
        }
    }
}

pub type Row = [Cell; GRID_WIDTH];

const EMPTY_ROW: Row = [Cell::Empty; GRID_WIDTH];

/// Fixed-size occupancy matrix, rows top to bottom. Every mutating
/// operation returns a new grid and leaves `self` untouched.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Grid {
    rows: [Row; GRID_HEIGHT],
}

/// Result of [`Grid::clear_completed_lines`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LineClear {
    pub grid: Grid,
    pub lines_cleared: u32,
}

pub fn create_empty_grid() -> Grid {
    Grid::empty()
}

// ============================================================================
// Grid Logic
// ============================================================================

impl Grid {
    pub fn empty() -> Self {
        Self {
            rows: [EMPTY_ROW; GRID_HEIGHT],
        }
    }

    pub fn rows(&self) -> &[Row; GRID_HEIGHT] {
        &self.rows
    }

    /// Cell at a signed coordinate, `None` when off-grid.
    pub fn cell(&self, x: i16, y: i16) -> Option<Cell> {
        let (x, y) = in_bounds(x, y)?;
        Some(self.rows[y][x])
    }

    /// Collision test used by every transition. Cells above the top edge
    /// are exempt from the occupancy check but not from the side walls.
    pub fn has_collision(&self, piece: &Piece, position: Position) -> bool {
        piece.cells().any(|(px, py)| {
            let x = position.x + px;
            let y = position.y + py;

            if x < 0 || x >= GRID_WIDTH as i16 || y >= GRID_HEIGHT as i16 {
                return true;
            }
            y >= 0 && self.rows[y as usize][x as usize].is_filled()
        })
    }

    /// Writes the piece's cells as filled. Off-grid cells are skipped.
    pub fn lock_piece(&self, piece: &Piece, position: Position) -> Grid {
        let mut next = *self;
        for (px, py) in piece.cells() {
            if let Some((x, y)) = in_bounds(position.x + px, position.y + py) {
                next.rows[y][x] = Cell::Filled(piece.color);
            }
        }
        next
    }

    /// Removes every complete row, keeps the rest in order, and pads the
    /// top with empty rows.
    pub fn clear_completed_lines(&self) -> LineClear {
        let mut rows = [EMPTY_ROW; GRID_HEIGHT];
        let mut write = GRID_HEIGHT;
        let mut lines_cleared = 0;

        for y in (0..GRID_HEIGHT).rev() {
            if self.is_row_complete(y) {
                lines_cleared += 1;
            } else {
                write -= 1;
                rows[write] = self.rows[y];
            }
        }

        LineClear {
            grid: Grid { rows },
            lines_cleared,
        }
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.rows[y].iter().all(|cell| cell.is_filled())
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows[y].iter().filter(|cell| cell.is_filled()).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| cell.is_filled())
            .count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<usize> for Grid {
    type Output = Row;

    fn index(&self, y: usize) -> &Row {
        &self.rows[y]
    }
}

impl IndexMut<usize> for Grid {
    fn index_mut(&mut self, y: usize) -> &mut Row {
        &mut self.rows[y]
    }
}

fn in_bounds(x: i16, y: i16) -> Option<(usize, usize)> {
    if x < 0 || y < 0 || x >= GRID_WIDTH as i16 || y >= GRID_HEIGHT as i16 {
        return None;
    }
    Some((x as usize, y as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_bounds_rejects_every_edge() {
        assert_eq!(in_bounds(0, 0), Some((0, 0)));
        assert_eq!(in_bounds(-1, 0), None);
        assert_eq!(in_bounds(0, -1), None);
        assert_eq!(in_bounds(GRID_WIDTH as i16, 0), None);
        assert_eq!(in_bounds(0, GRID_HEIGHT as i16), None);
    }

    #[test]
    fn cell_reads_signed_coordinates() {
        let grid = Grid::empty();
        assert_eq!(grid.cell(3, 4), Some(Cell::Empty));
        assert_eq!(grid.cell(-1, 4), None);
    }
}
