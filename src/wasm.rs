//! JavaScript bindings. Values cross the boundary as plain JSON-shaped
//! objects; errors surface as thrown `Error`s.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use crate::ai::RandomMoveSelector;
use crate::board::{self, Board, Color, Coord};
use crate::game::Match;
use crate::rules;
use crate::types::{Move, MovePayload};

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    Ok(value.serialize(&Serializer::json_compatible())?)
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsError> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

fn move_from_js(value: JsValue) -> Result<Move, JsError> {
    Ok(from_js::<MovePayload>(value)?.into_move()?)
}

#[wasm_bindgen(js_name = initialBoard)]
pub fn initial_board() -> Result<JsValue, JsError> {
    to_js(&board::initial_board())
}

#[wasm_bindgen(js_name = computeMoves)]
pub fn compute_moves(board: JsValue, color: JsValue) -> Result<JsValue, JsError> {
    let board: Board = from_js(board)?;
    let color: Color = from_js(color)?;
    to_js(&rules::compute_moves(&board, color))
}

/// Applies `mv` without legality checks; the caller picks it from
/// `computeMoves`.
#[wasm_bindgen(js_name = applyMove)]
pub fn apply_move(board: JsValue, mv: JsValue) -> Result<JsValue, JsError> {
    let board: Board = from_js(board)?;
    let mv = move_from_js(mv)?;
    to_js(&rules::apply_move(&board, &mv))
}

#[wasm_bindgen(js_name = serializeMoveMap)]
pub fn serialize_move_map(moves: JsValue) -> Result<JsValue, JsError> {
    let moves: Vec<Move> = from_js(moves)?;
    to_js(&rules::serialize_move_map(&moves))
}

#[wasm_bindgen(js_name = hasAnyPieces)]
pub fn has_any_pieces(board: JsValue, color: JsValue) -> Result<bool, JsError> {
    let board: Board = from_js(board)?;
    let color: Color = from_js(color)?;
    Ok(rules::has_any_pieces(&board, color))
}

#[wasm_bindgen(js_name = moveSignature)]
pub fn move_signature(mv: JsValue) -> Result<String, JsError> {
    Ok(move_from_js(mv)?.signature().to_string())
}

/// A local match, for hot-seat play or a game against the random player.
#[wasm_bindgen]
pub struct WasmMatch {
    game: Match,
    selector: RandomMoveSelector,
}

#[wasm_bindgen]
impl WasmMatch {
    #[wasm_bindgen(constructor)]
    pub fn new(starting: JsValue, seed: u32) -> Result<WasmMatch, JsError> {
        let starting: Color = from_js(starting)?;
        Ok(Self {
            game: Match::new(starting),
            selector: RandomMoveSelector::new(u64::from(seed)),
        })
    }

    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(&self.game.snapshot())
    }

    /// Plays `mv` for the side to move and returns the new state.
    pub fn play(&mut self, mv: JsValue) -> Result<JsValue, JsError> {
        let mv = move_from_js(mv)?;
        self.game.play(self.game.turn(), &mv)?;
        self.state()
    }

    /// `target` may be `null` when only one piece is blowable.
    pub fn blow(&mut self, target: JsValue) -> Result<JsValue, JsError> {
        let target: Option<Coord> = from_js(target)?;
        self.game.blow(self.game.turn(), target)?;
        self.state()
    }

    #[wasm_bindgen(js_name = playAi)]
    pub fn play_ai(&mut self) -> Result<JsValue, JsError> {
        self.game.play_ai(&mut self.selector)?;
        self.state()
    }

    pub fn resign(&mut self) -> Result<JsValue, JsError> {
        self.game.resign(self.game.turn())?;
        self.state()
    }
}
