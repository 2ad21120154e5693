use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Color, Coord, Piece, Rank};
use crate::error::{Error, Result};

/// A piece removed by a capture, as it was when taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapturedPiece {
    pub coord: Coord,
    #[serde(rename = "pieceType")]
    pub rank: Rank,
    pub color: Color,
}

/// A candidate or chosen move.
///
/// Contract:
/// - `path` starts at `from`, ends at `to` and has at least two entries.
/// - `captures` is empty for a plain step, otherwise one entry per jump
///   in path order.
///
/// Serialized with a derived `isCapture` flag, which is ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", into = "MoveWire")]
pub struct Move {
    #[serde(rename = "pieceFrom")]
    pub from: Coord,
    #[serde(rename = "pieceTo")]
    pub to: Coord,
    pub path: Vec<Coord>,
    pub captures: Vec<CapturedPiece>,
    pub promotes: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveWire {
    piece_from: Coord,
    piece_to: Coord,
    path: Vec<Coord>,
    captures: Vec<CapturedPiece>,
    promotes: bool,
    is_capture: bool,
}

impl From<Move> for MoveWire {
    fn from(mv: Move) -> Self {
        Self {
            is_capture: mv.is_capture(),
            piece_from: mv.from,
            piece_to: mv.to,
            path: mv.path,
            captures: mv.captures,
            promotes: mv.promotes,
        }
    }
}

impl Move {
    /// Builds a move for `piece` along `path`, deriving the promotion flag
    /// from the final landing square.
    pub(crate) fn build(piece: Piece, path: Vec<Coord>, captures: Vec<CapturedPiece>) -> Self {
        let from = path[0];
        let to = path[path.len() - 1];
        Self {
            from,
            to,
            promotes: piece.would_promote(to.row),
            path,
            captures,
        }
    }

    pub fn is_capture(&self) -> bool {
        !self.captures.is_empty()
    }

    /// Number of pieces this move removes.
    pub fn capture_len(&self) -> usize {
        self.captures.len()
    }

    /// Number of kings among the removed pieces.
    pub fn kings_captured(&self) -> usize {
        self.captures
            .iter()
            .filter(|cap| cap.rank == Rank::King)
            .count()
    }

    pub fn signature(&self) -> MoveSignature {
        MoveSignature {
            path: self.path.clone(),
            captures: self.captures.clone(),
        }
    }

    /// Two moves are the same route when their paths and capture lists match.
    /// `promotes` is derived, so it does not take part.
    pub fn same_route(&self, other: &Move) -> bool {
        self.path == other.path && self.captures == other.captures
    }
}

/// Identity of a move for validation: the full path plus the full capture list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveSignature {
    pub path: Vec<Coord>,
    pub captures: Vec<CapturedPiece>,
}

impl fmt::Display for MoveSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{step}")?;
        }
        f.write_str("#")?;
        for (i, cap) in self.captures.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{},{},{}", cap.coord, cap.rank.as_str(), cap.color)?;
        }
        Ok(())
    }
}

/// Moves grouped by origin key (`"row,col"`).
pub type MoveMap = BTreeMap<String, Vec<Move>>;

/// Everything the engine derives for one side to move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMoves {
    /// At least one capture is available.
    pub forced: bool,
    /// Every legal move: all captures followed by all normal moves.
    pub moves: Vec<Move>,
    /// Recommended subset of captures after the quantity/quality filter.
    pub captures: Vec<Move>,
    pub normals: Vec<Move>,
    pub all_captures: Vec<Move>,
    /// Distinct origins with at least one capture, in discovery order.
    pub pieces_with_capture: Vec<Coord>,
}

impl GeneratedMoves {
    /// Looks up the generated move with the same route as `candidate`.
    pub fn find(&self, candidate: &Move) -> Option<&Move> {
        self.moves.iter().find(|mv| mv.same_route(candidate))
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// A move as submitted by a client. Only trusted after it is matched
/// against a freshly generated legal set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovePayload {
    pub path: Vec<Coord>,
    #[serde(default)]
    pub captures: Vec<CapturedPiece>,
    #[serde(default)]
    pub promotes: bool,
}

impl MovePayload {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Checks the payload's shape and turns it into a lookup key.
    pub fn into_move(self) -> Result<Move> {
        if self.path.len() < 2 {
            return Err(Error::BadMove(format!(
                "path needs at least 2 squares, got {}",
                self.path.len()
            )));
        }
        if let Some(bad) = self
            .path
            .iter()
            .chain(self.captures.iter().map(|cap| &cap.coord))
            .find(|coord| !coord.in_bounds())
        {
            return Err(Error::BadMove(format!("square {bad} is off the board")));
        }

        Ok(Move {
            from: self.path[0],
            to: self.path[self.path.len() - 1],
            path: self.path,
            captures: self.captures,
            promotes: self.promotes,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    NoMoves,
    NoPieces,
    Draw,
    Resign,
    Blown,
}

/// Final result of a match. `winner` is `None` for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Option<Color>,
    pub reason: EndReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(row: u8, col: u8, rank: Rank) -> CapturedPiece {
        CapturedPiece {
            coord: Coord::new(row, col),
            rank,
            color: Color::Black,
        }
    }

    #[test]
    fn build_sets_endpoints_and_promotion() {
        let mv = Move::build(
            Piece::man(Color::Red),
            vec![Coord::new(2, 1), Coord::new(0, 3)],
            vec![capture(1, 2, Rank::Man)],
        );

        assert_eq!(mv.from, Coord::new(2, 1));
        assert_eq!(mv.to, Coord::new(0, 3));
        assert!(mv.promotes);
        assert!(mv.is_capture());
    }

    #[test]
    fn same_route_ignores_promotes_but_not_captures() {
        let path = vec![Coord::new(5, 2), Coord::new(3, 4)];
        let mv = Move::build(
            Piece::man(Color::Red),
            path.clone(),
            vec![capture(4, 3, Rank::King)],
        );

        let mut flagged = mv.clone();
        flagged.promotes = true;
        assert!(mv.same_route(&flagged));

        let mut wrong_rank = mv.clone();
        wrong_rank.captures = vec![capture(4, 3, Rank::Man)];
        assert!(!mv.same_route(&wrong_rank));
        assert_ne!(mv.signature(), wrong_rank.signature());
    }

    #[test]
    fn signature_renders_path_and_captures() {
        let mv = Move::build(
            Piece::king(Color::Red),
            vec![Coord::new(6, 0), Coord::new(3, 3)],
            vec![capture(4, 2, Rank::King)],
        );

        assert_eq!(mv.signature().to_string(), "6,0|3,3#4,2,king,black");
    }

    #[test]
    fn capture_counters_split_kings_from_men() {
        let mv = Move::build(
            Piece::king(Color::Red),
            vec![Coord::new(7, 0), Coord::new(5, 2), Coord::new(3, 4)],
            vec![capture(6, 1, Rank::Man), capture(4, 3, Rank::King)],
        );

        assert_eq!(mv.capture_len(), 2);
        assert_eq!(mv.kings_captured(), 1);
    }

    #[test]
    fn move_json_carries_is_capture() {
        let mv = Move::build(
            Piece::man(Color::Red),
            vec![Coord::new(5, 2), Coord::new(3, 4)],
            vec![capture(4, 3, Rank::Man)],
        );

        let value = serde_json::to_value(&mv).unwrap();
        assert_eq!(value["isCapture"], true);
        assert_eq!(value["pieceFrom"]["r"], 5);
        assert_eq!(value["captures"][0]["pieceType"], "man");

        let parsed: Move = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, mv);
    }

    #[test]
    fn payload_parses_client_json() {
        let payload = MovePayload::from_json(
            r#"{"path":[{"r":5,"c":2},{"r":3,"c":4}],
                "captures":[{"coord":{"r":4,"c":3},"pieceType":"king","color":"black"}]}"#,
        )
        .unwrap();

        let mv = payload.into_move().unwrap();

        assert_eq!(mv.from, Coord::new(5, 2));
        assert_eq!(mv.to, Coord::new(3, 4));
        assert_eq!(mv.captures, vec![capture(4, 3, Rank::King)]);
        assert!(!mv.promotes);
    }

    #[test]
    fn payload_with_short_or_off_board_path_is_rejected() {
        let short = MovePayload {
            path: vec![Coord::new(5, 2)],
            captures: vec![],
            promotes: false,
        };
        assert!(matches!(short.into_move(), Err(Error::BadMove(_))));

        let off_board = MovePayload {
            path: vec![Coord::new(5, 2), Coord::new(8, 3)],
            captures: vec![],
            promotes: false,
        };
        assert!(matches!(off_board.into_move(), Err(Error::BadMove(_))));

        assert!(matches!(
            MovePayload::from_json(r#"{"path":"5,2"}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn outcome_serializes_snake_case_reason() {
        let outcome = Outcome {
            winner: Some(Color::Black),
            reason: EndReason::NoPieces,
        };

        let json = serde_json::to_string(&outcome).unwrap();

        assert_eq!(json, r#"{"winner":"black","reason":"no_pieces"}"#);
    }
}
