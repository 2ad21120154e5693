use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const BOARD_SIZE: usize = 8;
const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;
const SETUP_ROWS: usize = 3;

/// All four diagonals, in the order kings scan them.
pub const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const RED_FORWARD: [(i8, i8); 2] = [(-1, -1), (-1, 1)];
const BLACK_FORWARD: [(i8, i8); 2] = [(1, -1), (1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }

    /// Row a man of this color promotes on.
    pub fn promotion_row(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Black => (BOARD_SIZE - 1) as u8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Man,
    King,
}

impl Rank {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Man => "man",
            Self::King => "king",
        }
    }
}

/// A piece on the board. Color never changes; rank only goes man -> king.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub rank: Rank,
}

impl Piece {
    pub const fn man(color: Color) -> Self {
        Self {
            color,
            rank: Rank::Man,
        }
    }

    pub const fn king(color: Color) -> Self {
        Self {
            color,
            rank: Rank::King,
        }
    }

    pub fn is_king(self) -> bool {
        self.rank == Rank::King
    }

    /// True when a man of this color landing on `row` becomes a king.
    pub fn would_promote(self, row: u8) -> bool {
        self.rank == Rank::Man && row == self.color.promotion_row()
    }

    pub fn promoted(self) -> Self {
        Self::king(self.color)
    }

    /// Directions this piece may step or capture along.
    /// Men only ever go forward, for moves and captures alike.
    pub fn directions(self) -> &'static [(i8, i8)] {
        match (self.rank, self.color) {
            (Rank::King, _) => &DIAGONALS,
            (Rank::Man, Color::Red) => &RED_FORWARD,
            (Rank::Man, Color::Black) => &BLACK_FORWARD,
        }
    }

    /// Wire cell code: 1 red man, 2 red king, -1 black man, -2 black king.
    pub fn code(self) -> i8 {
        let magnitude = match self.rank {
            Rank::Man => 1,
            Rank::King => 2,
        };
        match self.color {
            Color::Red => magnitude,
            Color::Black => -magnitude,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(Self::man(Color::Red)),
            2 => Some(Self::king(Color::Red)),
            -1 => Some(Self::man(Color::Black)),
            -2 => Some(Self::king(Color::Black)),
            _ => None,
        }
    }
}

/// Color of a cell's content, `None` for an empty cell.
pub fn color_of(cell: Option<Piece>) -> Option<Color> {
    cell.map(|piece| piece.color)
}

pub fn is_king(cell: Option<Piece>) -> bool {
    cell.is_some_and(Piece::is_king)
}

/// A board coordinate, 0-indexed from the black side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    #[serde(rename = "r")]
    pub row: u8,
    #[serde(rename = "c")]
    pub col: u8,
}

impl Coord {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    /// Playable squares are the ones where row + col is odd.
    pub fn is_dark(self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// The square `(dr, dc)` away, if it is still on the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        in_bounds(row, col).then(|| Self::new(row as u8, col as u8))
    }

    /// Map key used for move maps: `"row,col"`.
    pub fn key(self) -> String {
        self.to_string()
    }

    fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    fn from_index(index: usize) -> Self {
        Self::new((index / BOARD_SIZE) as u8, (index % BOARD_SIZE) as u8)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Checkers board held as three bitboards. `Copy`, so every capture
/// branch works on its own snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<i8>>", try_from = "Vec<Vec<i8>>")]
pub struct Board {
    red: u64,
    black: u64,
    kings: u64,
}

impl Board {
    /// Creates the opening position: black men on the dark squares of
    /// rows 0-2, red men on the dark squares of rows 5-7.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for index in 0..NUM_SQUARES {
            let coord = Coord::from_index(index);
            if !coord.is_dark() {
                continue;
            }
            let row = coord.row as usize;
            if row < SETUP_ROWS {
                board.place(coord, Piece::man(Color::Black));
            } else if row >= BOARD_SIZE - SETUP_ROWS {
                board.place(coord, Piece::man(Color::Red));
            }
        }
        board
    }

    pub const fn empty() -> Self {
        Self {
            red: 0,
            black: 0,
            kings: 0,
        }
    }

    /// Builds a board from explicit placements. Later entries overwrite earlier ones.
    pub fn from_pieces(pieces: &[(Coord, Piece)]) -> Self {
        let mut board = Self::empty();
        for &(coord, piece) in pieces {
            board.place(coord, piece);
        }
        board
    }

    pub fn get(&self, coord: Coord) -> Option<Piece> {
        if !coord.in_bounds() {
            return None;
        }
        let square = bit(coord.index());
        let rank = if (self.kings & square) != 0 {
            Rank::King
        } else {
            Rank::Man
        };
        if (self.red & square) != 0 {
            Some(Piece {
                color: Color::Red,
                rank,
            })
        } else if (self.black & square) != 0 {
            Some(Piece {
                color: Color::Black,
                rank,
            })
        } else {
            None
        }
    }

    pub fn is_empty(&self, coord: Coord) -> bool {
        coord.in_bounds() && self.get(coord).is_none()
    }

    /// Puts `piece` on `coord`, replacing whatever was there.
    pub fn place(&mut self, coord: Coord, piece: Piece) {
        self.clear(coord);
        let square = bit(coord.index());
        match piece.color {
            Color::Red => self.red |= square,
            Color::Black => self.black |= square,
        }
        if piece.is_king() {
            self.kings |= square;
        }
    }

    /// Empties `coord`. Returns the piece that was removed, if any.
    pub fn clear(&mut self, coord: Coord) -> Option<Piece> {
        let removed = self.get(coord)?;
        let mask = !bit(coord.index());
        self.red &= mask;
        self.black &= mask;
        self.kings &= mask;
        Some(removed)
    }

    pub fn count(&self, color: Color) -> u8 {
        self.side(color).count_ones() as u8
    }

    /// Returns `(red_count, black_count)`.
    pub fn counts(&self) -> (u8, u8) {
        (self.count(Color::Red), self.count(Color::Black))
    }

    pub fn has_any_pieces(&self, color: Color) -> bool {
        self.side(color) != 0
    }

    /// Pieces of `color` in row-major order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        let mut bits = self.side(color);
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            let coord = Coord::from_index(index);
            self.get(coord).map(|piece| (coord, piece))
        })
    }

    /// Converts the board to rows of wire cell codes.
    pub fn to_rows(&self) -> [[i8; BOARD_SIZE]; BOARD_SIZE] {
        let mut rows = [[0i8; BOARD_SIZE]; BOARD_SIZE];
        for (row, cells) in rows.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = self
                    .get(Coord::new(row as u8, col as u8))
                    .map_or(0, Piece::code);
            }
        }
        rows
    }

    fn side(&self, color: Color) -> u64 {
        match color {
            Color::Red => self.red,
            Color::Black => self.black,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh opening position.
pub fn initial_board() -> Board {
    Board::new()
}

impl From<Board> for Vec<Vec<i8>> {
    fn from(board: Board) -> Self {
        board.to_rows().iter().map(|row| row.to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<i8>>> for Board {
    type Error = Error;

    fn try_from(rows: Vec<Vec<i8>>) -> Result<Self, Self::Error> {
        if rows.len() != BOARD_SIZE {
            return Err(Error::BadBoard(format!(
                "expected {BOARD_SIZE} rows, got {}",
                rows.len()
            )));
        }

        let mut board = Self::empty();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != BOARD_SIZE {
                return Err(Error::BadBoard(format!(
                    "row {row} has {} cells, expected {BOARD_SIZE}",
                    cells.len()
                )));
            }
            for (col, &code) in cells.iter().enumerate() {
                if code == 0 {
                    continue;
                }
                let piece = Piece::from_code(code).ok_or_else(|| {
                    Error::BadBoard(format!("invalid cell code {code} at {row},{col}"))
                })?;
                board.place(Coord::new(row as u8, col as u8), piece);
            }
        }
        Ok(board)
    }
}

fn bit(index: usize) -> u64 {
    if index < NUM_SQUARES { 1u64 << index } else { 0 }
}

fn in_bounds(row: i8, col: i8) -> bool {
    (0..BOARD_SIZE as i8).contains(&row) && (0..BOARD_SIZE as i8).contains(&col)
}
