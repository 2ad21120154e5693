//! Elo ratings and the persistence interface behind them

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::Color;
use crate::error::Result;
use crate::room::{RoomMode, UserId};
use crate::types::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games: u32,
    pub last_played: Option<u64>,
}

impl Rating {
    pub fn new(initial: i32) -> Self {
        Self {
            rating: initial,
            wins: 0,
            losses: 0,
            draws: 0,
            games: 0,
            last_played: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Red,
    Black,
    Draw,
}

impl GameResult {
    pub fn from_winner(winner: Option<Color>) -> Self {
        match winner {
            Some(Color::Red) => Self::Red,
            Some(Color::Black) => Self::Black,
            None => Self::Draw,
        }
    }

    /// Score from red's point of view: 1 win, 0.5 draw, 0 loss.
    pub fn red_score(self) -> f64 {
        match self {
            Self::Red => 1.0,
            Self::Black => 0.0,
            Self::Draw => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub room_code: String,
    pub rated: bool,
    pub player_red: UserId,
    pub player_black: UserId,
    pub winner: Option<UserId>,
    pub result: GameResult,
    pub last_move: Option<Move>,
    pub played_at: u64,
}

/// Storage for accounts' ratings, finished games and color preferences.
pub trait PlayerStore {
    fn rating(&self, user: UserId) -> Result<Option<Rating>>;
    fn save_rating(&mut self, user: UserId, rating: Rating) -> Result<()>;
    fn record_game(&mut self, record: GameRecord) -> Result<()>;
    fn last_color(&self, user: UserId, mode: RoomMode) -> Result<Option<Color>>;
    fn set_last_color(&mut self, user: UserId, mode: RoomMode, color: Color) -> Result<()>;
}

/// In-process `PlayerStore`, used for tests and single-node hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ratings: HashMap<UserId, Rating>,
    games: Vec<GameRecord>,
    colors: HashMap<(UserId, RoomMode), Color>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }
}

impl PlayerStore for MemoryStore {
    fn rating(&self, user: UserId) -> Result<Option<Rating>> {
        Ok(self.ratings.get(&user).copied())
    }

    fn save_rating(&mut self, user: UserId, rating: Rating) -> Result<()> {
        self.ratings.insert(user, rating);
        Ok(())
    }

    fn record_game(&mut self, record: GameRecord) -> Result<()> {
        self.games.push(record);
        Ok(())
    }

    fn last_color(&self, user: UserId, mode: RoomMode) -> Result<Option<Color>> {
        Ok(self.colors.get(&(user, mode)).copied())
    }

    fn set_last_color(&mut self, user: UserId, mode: RoomMode, color: Color) -> Result<()> {
        self.colors.insert((user, mode), color);
        Ok(())
    }
}

/// Standard Elo update. Returns the rounded new ratings of A and B.
pub fn elo_update(rating_a: i32, rating_b: i32, score_a: f64, k: f64) -> (i32, i32) {
    let expected_a = 1.0 / (1.0 + 10f64.powf(f64::from(rating_b - rating_a) / 400.0));
    let expected_b = 1.0 - expected_a;
    let score_b = 1.0 - score_a;
    (
        (f64::from(rating_a) + k * (score_a - expected_a)).round() as i32,
        (f64::from(rating_b) + k * (score_b - expected_b)).round() as i32,
    )
}

/// Applies one finished game to both players' ratings and records it.
/// Returns the updated `(red, black)` ratings.
pub fn settle_game<S: PlayerStore + ?Sized>(
    store: &mut S,
    mut record: GameRecord,
    initial_rating: i32,
    k: f64,
) -> Result<(Rating, Rating)> {
    let red_id = record.player_red;
    let black_id = record.player_black;
    let mut red = store.rating(red_id)?.unwrap_or(Rating::new(initial_rating));
    let mut black = store.rating(black_id)?.unwrap_or(Rating::new(initial_rating));

    let (new_red, new_black) = elo_update(red.rating, black.rating, record.result.red_score(), k);
    red.rating = new_red;
    black.rating = new_black;

    match record.result {
        GameResult::Red => {
            red.wins += 1;
            black.losses += 1;
        }
        GameResult::Black => {
            red.losses += 1;
            black.wins += 1;
        }
        GameResult::Draw => {
            red.draws += 1;
            black.draws += 1;
        }
    }
    for side in [&mut red, &mut black] {
        side.games += 1;
        side.last_played = Some(record.played_at);
    }

    record.winner = match record.result {
        GameResult::Red => Some(red_id),
        GameResult::Black => Some(black_id),
        GameResult::Draw => None,
    };

    store.save_rating(red_id, red)?;
    store.save_rating(black_id, black)?;
    store.record_game(record)?;
    Ok((red, black))
}
