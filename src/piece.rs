use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Configuration
// ============================================================================

/// Largest shape matrix in the catalog (the I-piece).
pub const MAX_SHAPE_SIZE: usize = 4;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TetrominoType {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::O,
        TetrominoType::T,
        TetrominoType::S,
        TetrominoType::Z,
        TetrominoType::J,
        TetrominoType::L,
    ];

    pub fn color(self) -> Color {
        match self {
            TetrominoType::I => Color::rgb(0x00, 0xf0, 0xf0),
            TetrominoType::O => Color::rgb(0xf0, 0xf0, 0x00),
            TetrominoType::T => Color::rgb(0xa0, 0x00, 0xf0),
            TetrominoType::S => Color::rgb(0x00, 0xf0, 0x00),
            TetrominoType::Z => Color::rgb(0xf0, 0x00, 0x00),
            TetrominoType::J => Color::rgb(0x00, 0x00, 0xf0),
            TetrominoType::L => Color::rgb(0xf0, 0xa0, 0x00),
        }
    }

    /// Spawn orientation of this piece.
    pub fn shape(self) -> Shape {
        match self {
            TetrominoType::I => Shape::from_rows(&[
                &[0, 0, 0, 0],
                &[1, 1, 1, 1],
                &[0, 0, 0, 0],
                &[0, 0, 0, 0],
            ]),
            TetrominoType::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
            TetrominoType::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]]),
            TetrominoType::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]]),
            TetrominoType::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]]),
            TetrominoType::J => Shape::from_rows(&[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]]),
            TetrominoType::L => Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]]),
        }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Square occupancy matrix, indexed `[row][col]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Shape {
    size: usize,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    /// Builds a shape from square rows of 0/1. Rows beyond `MAX_SHAPE_SIZE`
    /// are ignored.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let size = rows.len().min(MAX_SHAPE_SIZE);
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in rows.iter().take(size).enumerate() {
            for (x, &bit) in row.iter().take(size).enumerate() {
                cells[y][x] = bit != 0;
            }
        }
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_filled(&self, col: usize, row: usize) -> bool {
        col < self.size && row < self.size && self.cells[row][col]
    }

    /// Offsets `(col, row)` of every set cell, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        (0..self.size).flat_map(move |row| {
            (0..self.size)
                .filter(move |&col| self.cells[row][col])
                .map(move |col| (col as i16, row as i16))
        })
    }

    /// 90° clockwise: transpose, then reverse each row.
    pub fn rotated_clockwise(&self) -> Self {
        let n = self.size;
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for y in 0..n {
            for x in 0..n {
                cells[x][n - 1 - y] = self.cells[y][x];
            }
        }
        Self { size: n, cells }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Piece {
    pub kind: TetrominoType,
    pub shape: Shape,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: TetrominoType) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            color: kind.color(),
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_clockwise(),
            ..*self
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        self.shape.cells()
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> TetrominoType;

    fn draw(&mut self) -> Piece {
        Piece::new(self.next_piece())
    }
}

/// Independent uniform draw over the seven types. Repeats are possible.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        TetrominoType::random(&mut self.rng)
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        if self.pieces.is_empty() {
            return TetrominoType::I;
        }
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_sizes_match_catalog() {
        assert_eq!(TetrominoType::O.shape().size(), 2);
        assert_eq!(TetrominoType::I.shape().size(), 4);
        for kind in [
            TetrominoType::T,
            TetrominoType::S,
            TetrominoType::Z,
            TetrominoType::J,
            TetrominoType::L,
        ] {
            assert_eq!(kind.shape().size(), 3);
        }
    }

    #[test]
    fn every_piece_has_four_cells() {
        for kind in TetrominoType::ALL {
            assert_eq!(kind.shape().cells().count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn t_rotates_clockwise() {
        let rotated = TetrominoType::T.shape().rotated_clockwise();
        let expected = Shape::from_rows(&[&[0, 1, 0], &[0, 1, 1], &[0, 1, 0]]);
        assert_eq!(rotated, expected);
    }

    #[test]
    fn i_becomes_vertical_in_third_column() {
        let rotated = TetrominoType::I.shape().rotated_clockwise();
        let cells: Vec<_> = rotated.cells().collect();
        assert_eq!(cells, vec![(2, 0), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn four_rotations_restore_every_shape() {
        for kind in TetrominoType::ALL {
            let piece = Piece::new(kind);
            let back = piece.rotated().rotated().rotated().rotated();
            assert_eq!(back, piece, "{kind:?}");
        }
    }

    #[test]
    fn sequence_provider_cycles() {
        let mut provider =
            SequencePieceProvider::new(vec![TetrominoType::S, TetrominoType::Z]);
        assert_eq!(provider.next_piece(), TetrominoType::S);
        assert_eq!(provider.next_piece(), TetrominoType::Z);
        assert_eq!(provider.next_piece(), TetrominoType::S);
    }

    #[test]
    fn empty_sequence_falls_back_to_i() {
        let mut provider = SequencePieceProvider::new(Vec::new());
        assert_eq!(provider.next_piece(), TetrominoType::I);
    }

    #[test]
    fn seeded_provider_is_reproducible() {
        let mut a = RandomPieceProvider::seeded(7);
        let mut b = RandomPieceProvider::seeded(7);
        let left: Vec<_> = (0..32).map(|_| a.next_piece()).collect();
        let right: Vec<_> = (0..32).map(|_| b.next_piece()).collect();
        assert_eq!(left, right);
    }
}
