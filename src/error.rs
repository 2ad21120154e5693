//! Error types for the damas engine and room layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("move is not in the legal move set")]
    IllegalMove,

    #[error("malformed move: {0}")]
    BadMove(String),

    #[error("malformed board: {0}")]
    BadBoard(String),

    #[error("it is not this side's turn")]
    NotYourTurn,

    #[error("the game is already over")]
    GameOver,

    #[error("the game is still in progress")]
    GameInProgress,

    #[error("user is not a player in this room")]
    NotPlayer,

    #[error("no blow is pending")]
    NoPendingBlow,

    #[error("the pending blow was not offered to this side")]
    BlowNotOffered,

    #[error("target is not a blowable piece")]
    InvalidBlowTarget,

    #[error("a draw offer is already pending")]
    DrawPending,

    #[error("no draw offer is pending")]
    NoPendingDraw,

    #[error("a player cannot answer their own draw offer")]
    CannotAnswerOwnDraw,

    #[error("side to move has no legal moves")]
    NoLegalMoves,

    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("room is full")]
    RoomFull,

    #[error("user already sits in this room")]
    SameUser,

    #[error("room cannot be joined")]
    RoomNotJoinable,

    #[error("room cannot be observed")]
    RoomNotObservable,

    #[error("user already has an active room {0}")]
    ActiveRoomExists(String),

    #[error("no free room code after {0} attempts")]
    RoomCodeUnavailable(usize),

    #[error("invalid configuration: {0}")]
    BadConfig(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable code sent to clients in `err` events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::IllegalMove => "illegal_move",
            Self::BadMove(_) => "bad_move",
            Self::BadBoard(_) => "bad_board",
            Self::NotYourTurn => "not_your_turn",
            Self::GameOver => "game_over",
            Self::GameInProgress => "game_in_progress",
            Self::NotPlayer => "not_player",
            Self::NoPendingBlow => "no_pending_blow",
            Self::BlowNotOffered => "not_allowed",
            Self::InvalidBlowTarget => "invalid_blow_target",
            Self::DrawPending => "draw_pending",
            Self::NoPendingDraw => "no_pending_draw",
            Self::CannotAnswerOwnDraw => "cannot_answer_own",
            Self::NoLegalMoves => "no_legal_moves",
            Self::RoomNotFound(_) => "room_not_found",
            Self::RoomFull => "room_full",
            Self::SameUser => "same_user",
            Self::RoomNotJoinable => "room_not_joinable",
            Self::RoomNotObservable => "room_not_observable",
            Self::ActiveRoomExists(_) => "active_room_exists",
            Self::RoomCodeUnavailable(_) => "room_code_unavailable",
            Self::BadConfig(_) => "bad_config",
            Self::Storage(_) => "storage_error",
            Self::Json(_) => "bad_input",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
