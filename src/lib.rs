use wasm_bindgen::prelude::*;

pub mod ai;
pub mod board;
pub mod chat;
pub mod config;
pub mod error;
pub mod game;
pub mod movegen;
pub mod rating;
pub mod room;
pub mod rules;
pub mod types;
pub mod wasm;

pub use board::{Board, Color, Coord, Piece, Rank};
pub use error::{Error, Result};
pub use game::{Match, MoveSelector};
pub use types::{GeneratedMoves, Move, MovePayload, Outcome};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
