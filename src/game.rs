use serde::Serialize;
use tracing::{debug, warn};
use web_time::SystemTime;

use crate::board::{Board, Color, Coord};
use crate::error::{Error, Result};
use crate::rules;
use crate::types::{EndReason, GeneratedMoves, Move, MoveMap, Outcome};

pub trait MoveSelector: Send {
    fn select_move(&mut self, generated: &GeneratedMoves) -> Option<Move>;
}

/// Moves an automatic player draws from: recommended captures, else any
/// capture, else plain steps, else whatever is legal.
pub fn candidate_pool(generated: &GeneratedMoves) -> &[Move] {
    let pool = if !generated.all_captures.is_empty() {
        if generated.captures.is_empty() {
            &generated.all_captures
        } else {
            &generated.captures
        }
    } else {
        &generated.normals
    };

    if pool.is_empty() {
        &generated.moves
    } else {
        pool
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalMoveSelector;

impl MoveSelector for FirstLegalMoveSelector {
    fn select_move(&mut self, generated: &GeneratedMoves) -> Option<Move> {
        candidate_pool(generated).first().cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    pub color: Color,
    #[serde(rename = "move")]
    pub mv: Move,
    pub missed_capture: bool,
}

/// A capture the mover had available but did not take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedCapture {
    pub by_color: Color,
    pub blowable_pieces: Vec<Coord>,
    pub turn_number: u32,
    pub ts: u64,
}

/// One-shot option for `offered_to` to remove one of `blowable_pieces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBlow {
    pub blowable_pieces: Vec<Coord>,
    pub piece_color: Color,
    pub offered_to: Color,
    pub turn_number: u32,
    pub ts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingDraw {
    pub by: Color,
    pub ts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub applied: Move,
    pub missed_capture: bool,
    /// Pieces the next side may blow, when a capture was skipped.
    pub blow_offer: Option<Vec<Coord>>,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlowReport {
    pub target: Coord,
    /// False when the target had already left the square.
    pub removed: bool,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiTurn {
    pub blow: Option<BlowReport>,
    pub turn: Option<TurnReport>,
}

/// Public match state pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub board: Board,
    pub turn: Color,
    pub turn_count: u32,
    pub forced: bool,
    pub move_map: MoveMap,
    pub capture_map: MoveMap,
    pub recommended_capture_map: MoveMap,
    pub legal_moves: Vec<Move>,
    pub last_move: Option<LastMove>,
    pub missed_capture: Option<MissedCapture>,
    pub pending_blow: Option<PendingBlow>,
    pub pending_draw: Option<PendingDraw>,
    pub outcome: Option<Outcome>,
    pub over: bool,
}

/// Turn state for one match. The engine functions it calls are pure; this
/// type owns the board and serializes every transition through `&mut self`.
#[derive(Debug, Clone)]
pub struct Match {
    board: Board,
    turn: Color,
    turn_count: u32,
    generated: GeneratedMoves,
    last_move: Option<LastMove>,
    missed_capture: Option<MissedCapture>,
    pending_blow: Option<PendingBlow>,
    pending_draw: Option<PendingDraw>,
    outcome: Option<Outcome>,
}

impl Match {
    pub fn new(starting: Color) -> Self {
        Self::from_position(Board::new(), starting)
    }

    /// Starts from an arbitrary position. A position that is already
    /// terminal is reported through `outcome()` right away.
    pub fn from_position(board: Board, turn: Color) -> Self {
        let mut game = Self {
            board,
            turn,
            turn_count: 1,
            generated: GeneratedMoves::default(),
            last_move: None,
            missed_capture: None,
            pending_blow: None,
            pending_draw: None,
            outcome: None,
        };
        game.recompute(false);
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn generated(&self) -> &GeneratedMoves {
        &self.generated
    }

    pub fn last_move(&self) -> Option<&LastMove> {
        self.last_move.as_ref()
    }

    pub fn missed_capture(&self) -> Option<&MissedCapture> {
        self.missed_capture.as_ref()
    }

    pub fn pending_blow(&self) -> Option<&PendingBlow> {
        self.pending_blow.as_ref()
    }

    pub fn pending_draw(&self) -> Option<&PendingDraw> {
        self.pending_draw.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Validates `candidate` against a freshly generated legal set and
    /// applies the generated move.
    pub fn play(&mut self, color: Color, candidate: &Move) -> Result<TurnReport> {
        self.ensure_active()?;
        if color != self.turn {
            return Err(Error::NotYourTurn);
        }

        let generated = rules::compute_moves(&self.board, color);
        let mv = generated.find(candidate).cloned().ok_or(Error::IllegalMove)?;

        // Moving instead of blowing lets the offer lapse.
        if self
            .pending_blow
            .as_ref()
            .is_some_and(|blow| blow.offered_to == color)
        {
            self.pending_blow = None;
            self.missed_capture = None;
        }
        let skipped = !generated.pieces_with_capture.is_empty() && !mv.is_capture();

        self.board = rules::apply_move(&self.board, &mv);
        let blowable = if skipped {
            blowable_pieces(&self.board, &generated.pieces_with_capture, &mv, color)
        } else {
            Vec::new()
        };

        let ts = now_millis();
        self.last_move = Some(LastMove {
            color,
            mv: mv.clone(),
            missed_capture: skipped,
        });
        self.missed_capture = skipped.then(|| MissedCapture {
            by_color: color,
            blowable_pieces: blowable.clone(),
            turn_number: self.turn_count,
            ts,
        });

        self.turn = color.opponent();
        self.turn_count += 1;
        self.pending_blow = (!blowable.is_empty()).then(|| PendingBlow {
            blowable_pieces: blowable,
            piece_color: color,
            offered_to: self.turn,
            turn_number: self.turn_count - 1,
            ts,
        });
        self.pending_draw = None;

        let outcome = self.recompute(false);
        debug!(
            %color,
            signature = %mv.signature(),
            captured = mv.capture_len(),
            skipped,
            "move applied"
        );

        Ok(TurnReport {
            applied: mv,
            missed_capture: skipped,
            blow_offer: self
                .pending_blow
                .as_ref()
                .map(|blow| blow.blowable_pieces.clone()),
            outcome,
        })
    }

    /// Removes one blowable piece. The turn does not advance: the blower
    /// still has to move afterwards.
    ///
    /// `target` may be omitted when exactly one piece is blowable.
    pub fn blow(&mut self, color: Color, target: Option<Coord>) -> Result<BlowReport> {
        self.ensure_active()?;
        let pending = self.pending_blow.as_ref().ok_or(Error::NoPendingBlow)?;
        if color != self.turn {
            return Err(Error::NotYourTurn);
        }
        if pending.offered_to != color {
            return Err(Error::BlowNotOffered);
        }

        let target = match (target, pending.blowable_pieces.as_slice()) {
            (Some(target), _) => target,
            (None, [only]) => *only,
            (None, _) => return Err(Error::InvalidBlowTarget),
        };
        if !pending.blowable_pieces.contains(&target) {
            return Err(Error::InvalidBlowTarget);
        }

        let piece_color = pending.piece_color;
        let removed = self
            .board
            .get(target)
            .is_some_and(|piece| piece.color == piece_color);
        if removed {
            self.board.clear(target);
        }
        self.pending_blow = None;
        self.missed_capture = None;

        let outcome = self.recompute(true);
        debug!(%color, %target, removed, "blow exercised");

        Ok(BlowReport {
            target,
            removed,
            outcome,
        })
    }

    pub fn request_draw(&mut self, color: Color) -> Result<()> {
        self.ensure_active()?;
        if self.pending_draw.is_some() {
            return Err(Error::DrawPending);
        }
        self.pending_draw = Some(PendingDraw {
            by: color,
            ts: now_millis(),
        });
        Ok(())
    }

    /// Answers the other side's draw offer. Returns the outcome when accepted.
    pub fn respond_draw(&mut self, color: Color, accept: bool) -> Result<Option<Outcome>> {
        self.ensure_active()?;
        let pending = self.pending_draw.ok_or(Error::NoPendingDraw)?;
        if pending.by == color {
            return Err(Error::CannotAnswerOwnDraw);
        }

        self.pending_draw = None;
        if !accept {
            return Ok(None);
        }
        Ok(Some(self.finish(Outcome {
            winner: None,
            reason: EndReason::Draw,
        })))
    }

    pub fn resign(&mut self, color: Color) -> Result<Outcome> {
        self.ensure_active()?;
        Ok(self.finish(Outcome {
            winner: Some(color.opponent()),
            reason: EndReason::Resign,
        }))
    }

    /// Plays one automatic turn for the side to move: exercises a blow
    /// offered to it, then plays the selector's move.
    pub fn play_ai(&mut self, selector: &mut dyn MoveSelector) -> Result<AiTurn> {
        self.ensure_active()?;
        let color = self.turn;

        let blow_target = self
            .pending_blow
            .as_ref()
            .filter(|blow| blow.offered_to == color)
            .and_then(|blow| blow.blowable_pieces.first().copied());
        let blow = match blow_target {
            Some(target) => {
                let report = self.blow(color, Some(target))?;
                if report.outcome.is_some() {
                    return Ok(AiTurn {
                        blow: Some(report),
                        turn: None,
                    });
                }
                Some(report)
            }
            None => None,
        };

        self.pending_draw = None;
        self.missed_capture = None;

        let mv = match selector.select_move(&self.generated) {
            Some(mv) if self.generated.find(&mv).is_some() => mv,
            selected => {
                if selected.is_some() {
                    warn!(%color, "selector chose an illegal move, using the first legal move");
                }
                self.generated
                    .moves
                    .first()
                    .cloned()
                    .ok_or(Error::NoLegalMoves)?
            }
        };

        let turn = self.play(color, &mv)?;
        Ok(AiTurn {
            blow,
            turn: Some(turn),
        })
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            board: self.board,
            turn: self.turn,
            turn_count: self.turn_count,
            forced: self.generated.forced,
            move_map: rules::serialize_move_map(&self.generated.moves),
            capture_map: rules::serialize_move_map(&self.generated.all_captures),
            recommended_capture_map: rules::serialize_move_map(&self.generated.captures),
            legal_moves: self.generated.moves.clone(),
            last_move: self.last_move.clone(),
            missed_capture: self.missed_capture.clone(),
            pending_blow: self.pending_blow.clone(),
            pending_draw: self.pending_draw,
            outcome: self.outcome,
            over: self.is_over(),
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_over() {
            Err(Error::GameOver)
        } else {
            Ok(())
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        debug!(winner = ?outcome.winner, reason = ?outcome.reason, "match finished");
        self.pending_blow = None;
        self.pending_draw = None;
        self.outcome = Some(outcome);
        outcome
    }

    /// Regenerates moves for the side to move and runs terminal detection.
    fn recompute(&mut self, after_blow: bool) -> Option<Outcome> {
        self.generated = rules::compute_moves(&self.board, self.turn);
        let mut outcome = rules::check_terminal(&self.board, self.turn, &self.generated)?;
        if after_blow {
            outcome.reason = EndReason::Blown;
        }
        Some(self.finish(outcome))
    }

    #[cfg(test)]
    fn set_board_for_test(&mut self, board: Board, turn: Color) {
        *self = Self::from_position(board, turn);
    }
}

/// Pieces that had a capture and are still on the board after `mv`. The
/// moved piece is tracked to its landing square.
fn blowable_pieces(board: &Board, pieces_with_capture: &[Coord], mv: &Move, color: Color) -> Vec<Coord> {
    pieces_with_capture
        .iter()
        .map(|&at| if at == mv.from { mv.to } else { at })
        .filter(|&at| board.get(at).is_some_and(|piece| piece.color == color))
        .collect()
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
