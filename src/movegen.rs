//! Move generation: plain steps and capture sequences.
//!
//! Capture search is a depth-first walk over jump continuations. Every
//! jump produces a fresh `Board` copy with the jumper moved and the
//! victim removed, so sibling branches never see each other's captures.

use crate::board::{Board, Color, Coord, DIAGONALS, Piece};
use crate::types::{CapturedPiece, Move};

/// One node of the capture search.
struct Jump {
    at: Coord,
    board: Board,
    path: Vec<Coord>,
    captures: Vec<CapturedPiece>,
}

impl Jump {
    fn start(board: &Board, from: Coord) -> Self {
        Self {
            at: from,
            board: *board,
            path: vec![from],
            captures: Vec::new(),
        }
    }

    /// Continuation after `piece` jumps over `over` and lands on `land`.
    fn jump(&self, piece: Piece, over: Coord, victim: Piece, land: Coord) -> Self {
        let mut board = self.board;
        board.clear(self.at);
        board.clear(over);
        board.place(land, piece);

        let mut path = self.path.clone();
        path.push(land);
        let mut captures = self.captures.clone();
        captures.push(CapturedPiece {
            coord: over,
            rank: victim.rank,
            color: victim.color,
        });

        Self {
            at: land,
            board,
            path,
            captures,
        }
    }

    fn finish(&self, piece: Piece) -> Move {
        Move::build(piece, self.path.clone(), self.captures.clone())
    }
}

/// All non-capturing moves for `color`: one forward step for men, a
/// slide up to the first obstruction along every diagonal for kings.
pub fn normal_moves(board: &Board, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();

    for (from, piece) in board.pieces(color) {
        for &(dr, dc) in piece.directions() {
            let mut cursor = from;
            while let Some(to) = cursor.offset(dr, dc) {
                if !board.is_empty(to) {
                    break;
                }
                moves.push(Move::build(piece, vec![from, to], Vec::new()));
                if !piece.is_king() {
                    break;
                }
                cursor = to;
            }
        }
    }

    moves
}

/// Completed capture sequences for the man standing on `from`.
///
/// A jump that lands on the promotion row ends its branch there: the new
/// king does not keep capturing in the same turn.
pub fn man_capture_sequences(board: &Board, from: Coord) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    extend_man(piece, &Jump::start(board, from), &mut results);
    results
}

fn extend_man(piece: Piece, node: &Jump, results: &mut Vec<Move>) {
    let mut extended = false;

    for &(dr, dc) in piece.directions() {
        let Some(over) = node.at.offset(dr, dc) else {
            continue;
        };
        let Some(land) = over.offset(dr, dc) else {
            continue;
        };
        let Some(victim) = node.board.get(over) else {
            continue;
        };
        if victim.color == piece.color || !node.board.is_empty(land) {
            continue;
        }

        let next = node.jump(piece, over, victim, land);
        extended = true;

        if piece.would_promote(land.row) {
            results.push(next.finish(piece));
            continue;
        }
        extend_man(piece, &next, results);
    }

    if !extended && !node.captures.is_empty() {
        results.push(node.finish(piece));
    }
}

/// Completed capture sequences for the king standing on `from`.
///
/// Along each diagonal the king flies over empty squares to the first
/// occupied one. An own piece blocks the line. An enemy piece becomes the
/// pivot, and every empty square behind it is a separate landing that
/// continues the search. A second piece behind the pivot ends the line.
pub fn king_capture_sequences(board: &Board, from: Coord) -> Vec<Move> {
    let Some(piece) = board.get(from).filter(|piece| piece.is_king()) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    extend_king(piece, &Jump::start(board, from), &mut results);
    results
}

fn extend_king(piece: Piece, node: &Jump, results: &mut Vec<Move>) {
    let mut extended = false;

    for (dr, dc) in DIAGONALS {
        let mut pivot: Option<(Coord, Piece)> = None;
        let mut cursor = node.at;

        while let Some(square) = cursor.offset(dr, dc) {
            cursor = square;
            match node.board.get(square) {
                None => {
                    if let Some((over, victim)) = pivot {
                        let next = node.jump(piece, over, victim, square);
                        extend_king(piece, &next, results);
                        extended = true;
                    }
                }
                Some(other) if other.color == piece.color => break,
                Some(enemy) => {
                    if pivot.is_some() {
                        break;
                    }
                    pivot = Some((square, enemy));
                }
            }
        }
    }

    if !extended && !node.captures.is_empty() {
        results.push(node.finish(piece));
    }
}

/// Every completed capture sequence for `color`, pooled across pieces in
/// row-major order of their origin squares.
pub fn all_captures(board: &Board, color: Color) -> Vec<Move> {
    let mut captures = Vec::new();

    for (from, piece) in board.pieces(color) {
        if piece.is_king() {
            captures.extend(king_capture_sequences(board, from));
        } else {
            captures.extend(man_capture_sequences(board, from));
        }
    }

    captures
}
