//! Mandatory-capture selection, move application and terminal detection.

use crate::board::{Board, Color, Coord};
use crate::movegen;
use crate::types::{EndReason, GeneratedMoves, Move, MoveMap, Outcome};

/// Recommended captures: keep the longest sequences, then among those the
/// ones taking the most kings.
pub fn filter_by_quantity_and_quality(captures: &[Move]) -> Vec<Move> {
    let Some(max_len) = captures.iter().map(Move::capture_len).max() else {
        return Vec::new();
    };
    let longest: Vec<&Move> = captures
        .iter()
        .filter(|mv| mv.capture_len() == max_len)
        .collect();

    let max_kings = longest
        .iter()
        .map(|mv| mv.kings_captured())
        .max()
        .unwrap_or(0);

    longest
        .into_iter()
        .filter(|mv| mv.kings_captured() == max_kings)
        .cloned()
        .collect()
}

/// Distinct capture origins, one per piece, in first-seen order.
pub fn pieces_with_capture(captures: &[Move]) -> Vec<Coord> {
    let mut pieces: Vec<Coord> = Vec::new();
    for mv in captures {
        if !pieces.contains(&mv.from) {
            pieces.push(mv.from);
        }
    }
    pieces
}

pub fn pieces_that_can_capture(board: &Board, color: Color) -> Vec<Coord> {
    pieces_with_capture(&movegen::all_captures(board, color))
}

/// Generates everything the side to move needs.
///
/// The recommended subset never narrows `moves`: every capture and every
/// plain step stays legal, and skipping a capture is punished by a blow.
pub fn compute_moves(board: &Board, color: Color) -> GeneratedMoves {
    let all_captures = movegen::all_captures(board, color);
    let pieces_with_capture = pieces_with_capture(&all_captures);
    let captures = filter_by_quantity_and_quality(&all_captures);
    let normals = movegen::normal_moves(board, color);

    let mut moves = Vec::with_capacity(all_captures.len() + normals.len());
    moves.extend(all_captures.iter().cloned());
    moves.extend(normals.iter().cloned());

    GeneratedMoves {
        forced: !all_captures.is_empty(),
        moves,
        captures,
        normals,
        all_captures,
        pieces_with_capture,
    }
}

/// Returns the board after `mv`: origin cleared, every captured square
/// cleared, the piece placed on the destination and promoted if it landed
/// on its promotion row.
///
/// Caller contract: `mv` was generated for `board`.
pub fn apply_move(board: &Board, mv: &Move) -> Board {
    let mut next = *board;
    let Some(mut piece) = next.clear(mv.from) else {
        return next;
    };

    for cap in &mv.captures {
        next.clear(cap.coord);
    }

    if mv.promotes || piece.would_promote(mv.to.row) {
        piece = piece.promoted();
    }
    next.place(mv.to, piece);
    next
}

/// Groups moves by origin key (`"row,col"`).
pub fn serialize_move_map(moves: &[Move]) -> MoveMap {
    let mut map = MoveMap::new();
    for mv in moves {
        map.entry(mv.from.key()).or_default().push(mv.clone());
    }
    map
}

pub fn has_any_pieces(board: &Board, color: Color) -> bool {
    board.has_any_pieces(color)
}

/// Terminal check, in fixed order: the side to move without legal moves
/// loses, then a side without pieces loses.
pub fn check_terminal(board: &Board, turn: Color, generated: &GeneratedMoves) -> Option<Outcome> {
    if generated.is_empty() {
        return Some(Outcome {
            winner: Some(turn.opponent()),
            reason: EndReason::NoMoves,
        });
    }
    for color in [Color::Red, Color::Black] {
        if !has_any_pieces(board, color) {
            return Some(Outcome {
                winner: Some(color.opponent()),
                reason: EndReason::NoPieces,
            });
        }
    }
    None
}
