use serde::Deserialize;

use crate::board::Color;
use crate::error::{Error, Result};

/// Room and rating tunables. Every field has a default, so hosts can
/// pass a partial JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Chat messages kept per room.
    pub max_room_messages: usize,
    /// Longest chat message, in characters, after trimming.
    pub max_chat_len: usize,
    pub elo_k: f64,
    pub initial_rating: i32,
    pub room_code_len: usize,
    pub starting_color: Color,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_room_messages: 100,
            max_chat_len: 240,
            elo_k: 32.0,
            initial_rating: 1200,
            room_code_len: 6,
            starting_color: Color::Red,
        }
    }
}

impl RoomConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.room_code_len == 0 {
            return Err(Error::BadConfig("room_code_len must be at least 1".into()));
        }
        Ok(())
    }
}
