//! Room orchestration: seats, observers, chat and the match itself.
//!
//! The registry is an explicit store handed to whoever serves clients.
//! It holds no transport; callers broadcast the snapshots and reports it
//! returns.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::RandomMoveSelector;
use crate::board::{Color, Coord};
use crate::chat::{ChatLog, ChatMessage};
use crate::config::RoomConfig;
use crate::error::{Error, Result};
use crate::game::{AiTurn, BlowReport, Match, MatchSnapshot, MoveSelector, TurnReport, now_millis};
use crate::rating::{self, GameRecord, GameResult, PlayerStore};
use crate::types::{MovePayload, Outcome};

pub type UserId = i64;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const AI_NAME: &str = "AI";
const MAX_CODE_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: UserId,
    pub username: String,
}

impl Player {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    Pvp,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seat {
    Human(Player),
    Ai,
}

impl Seat {
    fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Human(player) => Some(player.id),
            Self::Ai => None,
        }
    }

    fn view(&self) -> SeatView {
        match self {
            Self::Human(player) => SeatView {
                id: Some(player.id),
                username: player.username.clone(),
            },
            Self::Ai => SeatView {
                id: None,
                username: AI_NAME.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub id: Option<UserId>,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatsView {
    pub red: Option<SeatView>,
    pub black: Option<SeatView>,
}

/// Room state pushed to everyone in the room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: String,
    pub name: String,
    pub mode: RoomMode,
    pub status: RoomStatus,
    pub players: SeatsView,
    pub ai_color: Option<Color>,
    pub observers: usize,
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub game: MatchSnapshot,
}

#[derive(Debug, Clone)]
pub struct Room {
    code: String,
    name: String,
    mode: RoomMode,
    red: Option<Seat>,
    black: Option<Seat>,
    /// Connection id -> display name.
    observers: BTreeMap<String, String>,
    chat: ChatLog,
    game: Match,
    created_at: u64,
}

impl Room {
    /// Opens a room with `host` seated on `host_color`. In AI mode the
    /// other seat is taken by the automatic player.
    pub fn new(
        code: impl Into<String>,
        name: Option<String>,
        mode: RoomMode,
        host: Player,
        host_color: Color,
        config: &RoomConfig,
    ) -> Self {
        let code = code.into();
        let name = name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Room {code}"));

        let mut room = Self {
            code,
            name,
            mode,
            red: None,
            black: None,
            observers: BTreeMap::new(),
            chat: ChatLog::new(config.max_room_messages, config.max_chat_len),
            game: Match::new(config.starting_color),
            created_at: now_millis(),
        };
        *room.seat_mut(host_color) = Some(Seat::Human(host));
        if mode == RoomMode::Ai {
            *room.seat_mut(host_color.opponent()) = Some(Seat::Ai);
        }
        room
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> RoomMode {
        self.mode
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn game(&self) -> &Match {
        &self.game
    }

    pub fn chat_log(&self) -> &ChatLog {
        &self.chat
    }

    pub fn seat(&self, color: Color) -> Option<&Seat> {
        match color {
            Color::Red => self.red.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Option<Seat> {
        match color {
            Color::Red => &mut self.red,
            Color::Black => &mut self.black,
        }
    }

    pub fn ai_color(&self) -> Option<Color> {
        [Color::Red, Color::Black]
            .into_iter()
            .find(|&color| self.seat(color) == Some(&Seat::Ai))
    }

    pub fn status(&self) -> RoomStatus {
        if self.game.is_over() {
            RoomStatus::Finished
        } else if self.red.is_some() && self.black.is_some() {
            RoomStatus::InGame
        } else {
            RoomStatus::Waiting
        }
    }

    /// Seat color of `user`, if they play in this room.
    pub fn color_of(&self, user: UserId) -> Option<Color> {
        [Color::Red, Color::Black]
            .into_iter()
            .find(|&color| self.seat(color).and_then(Seat::user_id) == Some(user))
    }

    fn player(&self, color: Color) -> Option<&Player> {
        match self.seat(color)? {
            Seat::Human(player) => Some(player),
            Seat::Ai => None,
        }
    }

    /// Seats `player` on `preferred`, or on the other seat if that one is taken.
    pub fn join(&mut self, player: Player, preferred: Color) -> Result<Color> {
        if self.mode == RoomMode::Ai {
            return Err(Error::RoomNotJoinable);
        }
        if self.color_of(player.id).is_some() {
            return Err(Error::SameUser);
        }

        let color = if self.seat(preferred).is_none() {
            preferred
        } else {
            preferred.opponent()
        };
        let seat = self.seat_mut(color);
        if seat.is_some() {
            return Err(Error::RoomFull);
        }
        *seat = Some(Seat::Human(player));
        Ok(color)
    }

    pub fn observe(&mut self, connection: impl Into<String>, name: impl Into<String>) -> Result<()> {
        if self.mode == RoomMode::Ai {
            return Err(Error::RoomNotObservable);
        }
        self.observers.insert(connection.into(), name.into());
        Ok(())
    }

    pub fn leave_observer(&mut self, connection: &str) -> bool {
        self.observers.remove(connection).is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn seated_color(&self, user: UserId) -> Result<Color> {
        self.color_of(user).ok_or(Error::NotPlayer)
    }

    /// Parses an untrusted move and plays it for `user`.
    pub fn submit_move(&mut self, user: UserId, payload: MovePayload) -> Result<TurnReport> {
        let color = self.seated_color(user)?;
        if self.game.is_over() {
            return Err(Error::GameOver);
        }
        if color != self.game.turn() {
            return Err(Error::NotYourTurn);
        }

        let candidate = payload.into_move()?;
        let report = self.game.play(color, &candidate)?;
        debug!(room = %self.code, %color, turn = self.game.turn_count(), "turn complete");
        Ok(report)
    }

    pub fn blow(&mut self, user: UserId, target: Option<Coord>) -> Result<BlowReport> {
        let color = self.seated_color(user)?;
        let report = self.game.blow(color, target)?;
        debug!(room = %self.code, %color, target = %report.target, "blow");
        Ok(report)
    }

    /// Appends a chat line from a seated player. Returns `None` for blank text.
    pub fn chat(&mut self, user: UserId, text: &str) -> Result<Option<ChatMessage>> {
        let color = self.seated_color(user)?;
        if self.game.is_over() {
            return Err(Error::GameOver);
        }
        let username = self
            .player(color)
            .map(|player| player.username.clone())
            .unwrap_or_default();
        Ok(self.chat.push(user, &username, text))
    }

    pub fn request_draw(&mut self, user: UserId) -> Result<()> {
        let color = self.seated_color(user)?;
        self.game.request_draw(color)
    }

    pub fn respond_draw(&mut self, user: UserId, accept: bool) -> Result<Option<Outcome>> {
        let color = self.seated_color(user)?;
        self.game.respond_draw(color, accept)
    }

    pub fn resign(&mut self, user: UserId) -> Result<Outcome> {
        let color = self.seated_color(user)?;
        self.game.resign(color)
    }

    /// Plays the automatic side if it is its turn. `None` when there is
    /// nothing to do.
    pub fn play_ai_turn(&mut self, selector: &mut dyn MoveSelector) -> Result<Option<AiTurn>> {
        let Some(ai_color) = self.ai_color() else {
            return Ok(None);
        };
        if self.game.is_over() || self.game.turn() != ai_color {
            return Ok(None);
        }
        self.game.play_ai(selector).map(Some)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            mode: self.mode,
            status: self.status(),
            players: SeatsView {
                red: self.red.as_ref().map(Seat::view),
                black: self.black.as_ref().map(Seat::view),
            },
            ai_color: self.ai_color(),
            observers: self.observers.len(),
            messages: self.chat.messages().cloned().collect(),
            game: self.game.snapshot(),
        }
    }

    #[cfg(test)]
    fn game_mut(&mut self) -> &mut Match {
        &mut self.game
    }
}

/// Where a user currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRef {
    pub code: String,
    pub color: Color,
}

/// Live rooms plus the user -> room index, with persistence behind `S`.
pub struct RoomRegistry<S: PlayerStore> {
    config: RoomConfig,
    store: S,
    rooms: HashMap<String, Room>,
    user_rooms: HashMap<UserId, RoomRef>,
    rng: StdRng,
    /// Plays the automatic seat of AI rooms.
    selector: Box<dyn MoveSelector>,
}

impl<S: PlayerStore> RoomRegistry<S> {
    pub fn new(config: RoomConfig, store: S, seed: u64) -> Self {
        Self {
            config,
            store,
            rooms: HashMap::new(),
            user_rooms: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            selector: Box::new(RandomMoveSelector::new(seed)),
        }
    }

    pub fn with_selector(mut self, selector: impl MoveSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn room(&self, code: &str) -> Option<&Room> {
        self.rooms.get(&normalize_code(code))
    }

    pub fn room_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(&normalize_code(code))
    }

    pub fn room_of_user(&self, user: UserId) -> Option<&RoomRef> {
        self.user_rooms.get(&user)
    }

    /// Opens a room for `host`. The host alternates colors between games of
    /// the same mode, starting with red. In an AI room where the automatic
    /// seat moves first, its opening move is already played on return.
    pub fn create_room(&mut self, host: Player, mode: RoomMode, name: Option<String>) -> Result<String> {
        self.ensure_free(host.id)?;

        let host_color = self.next_color(host.id, mode)?;
        let code = self.fresh_code()?;
        let room = Room::new(code.clone(), name, mode, host.clone(), host_color, &self.config);

        self.store.set_last_color(host.id, mode, host_color)?;
        self.user_rooms.insert(
            host.id,
            RoomRef {
                code: code.clone(),
                color: host_color,
            },
        );
        self.rooms.insert(code.clone(), room);
        info!(room = %code, ?mode, host = host.id, color = %host_color, "room created");

        self.play_ai_turn(&code)?;
        Ok(code)
    }

    /// Plays the automatic seat of room `code` if it is its turn.
    pub fn play_ai_turn(&mut self, code: &str) -> Result<Option<AiTurn>> {
        let code = normalize_code(code);
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        let turn = room.play_ai_turn(self.selector.as_mut())?;
        if let Some(played) = turn.as_ref().and_then(|turn| turn.turn.as_ref()) {
            debug!(room = %code, signature = %played.applied.signature(), "ai moved");
        }
        Ok(turn)
    }

    pub fn join_room(&mut self, code: &str, player: Player) -> Result<Color> {
        let code = normalize_code(code);
        let room = self
            .rooms
            .get(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        if room.mode() == RoomMode::Ai {
            return Err(Error::RoomNotJoinable);
        }
        if room.color_of(player.id).is_some() {
            return Err(Error::SameUser);
        }
        if room.status() != RoomStatus::Waiting {
            return Err(Error::RoomFull);
        }
        self.ensure_free(player.id)?;

        let preferred = self.next_color(player.id, RoomMode::Pvp)?;
        let user = player.id;
        let color = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?
            .join(player, preferred)?;

        self.store.set_last_color(user, RoomMode::Pvp, color)?;
        self.user_rooms.insert(
            user,
            RoomRef {
                code: code.clone(),
                color,
            },
        );
        info!(room = %code, user, %color, "player joined");
        Ok(color)
    }

    /// Closes a room at a player's request, whatever its state.
    pub fn close_room(&mut self, code: &str, requested_by: UserId) -> Result<Room> {
        let code = normalize_code(code);
        let room = self
            .rooms
            .get(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        if room.color_of(requested_by).is_none() {
            return Err(Error::NotPlayer);
        }
        self.remove(&code, "closed")
    }

    /// Settles a finished room: rates PvP games between two humans and
    /// removes the room.
    pub fn finish(&mut self, code: &str) -> Result<Room> {
        let code = normalize_code(code);
        let room = self
            .rooms
            .get(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        let outcome = room.game().outcome().ok_or(Error::GameInProgress)?;

        if room.mode() == RoomMode::Pvp
            && let (Some(red), Some(black)) = (room.player(Color::Red), room.player(Color::Black))
        {
            let record = GameRecord {
                room_code: code.clone(),
                rated: true,
                player_red: red.id,
                player_black: black.id,
                winner: None,
                result: GameResult::from_winner(outcome.winner),
                last_move: room.game().last_move().map(|last| last.mv.clone()),
                played_at: now_millis(),
            };
            let (red_rating, black_rating) = rating::settle_game(
                &mut self.store,
                record,
                self.config.initial_rating,
                self.config.elo_k,
            )?;
            info!(
                room = %code,
                red = red_rating.rating,
                black = black_rating.rating,
                "ratings updated"
            );
        }

        self.remove(&code, "finished")
    }

    fn remove(&mut self, code: &str, reason: &str) -> Result<Room> {
        let room = self
            .rooms
            .remove(code)
            .ok_or_else(|| Error::RoomNotFound(code.to_string()))?;
        for color in [Color::Red, Color::Black] {
            if let Some(user) = room.seat(color).and_then(Seat::user_id) {
                self.user_rooms.remove(&user);
            }
        }
        info!(room = %code, reason, "room closed");
        Ok(room)
    }

    /// A user may sit in one live room at a time. Stale index entries are dropped.
    fn ensure_free(&mut self, user: UserId) -> Result<()> {
        if let Some(active) = self.user_rooms.get(&user) {
            if self.rooms.contains_key(&active.code) {
                return Err(Error::ActiveRoomExists(active.code.clone()));
            }
            self.user_rooms.remove(&user);
        }
        Ok(())
    }

    fn next_color(&self, user: UserId, mode: RoomMode) -> Result<Color> {
        Ok(match self.store.last_color(user, mode)? {
            Some(Color::Red) => Color::Black,
            _ => Color::Red,
        })
    }

    fn fresh_code(&mut self) -> Result<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code: String = (0..self.config.room_code_len)
                .map(|_| CODE_ALPHABET[self.rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(Error::RoomCodeUnavailable(MAX_CODE_ATTEMPTS))
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Piece};
    use crate::game::FirstLegalMoveSelector;
    use crate::rating::MemoryStore;
    use crate::types::EndReason;

    fn ana() -> Player {
        Player::new(1, "ana")
    }

    fn beto() -> Player {
        Player::new(2, "beto")
    }

    fn registry() -> RoomRegistry<MemoryStore> {
        RoomRegistry::new(RoomConfig::default(), MemoryStore::new(), 11)
    }

    fn payload(json: &str) -> MovePayload {
        MovePayload::from_json(json).unwrap()
    }

    fn pvp_room() -> (RoomRegistry<MemoryStore>, String) {
        let mut rooms = registry();
        let code = rooms.create_room(ana(), RoomMode::Pvp, None).unwrap();
        rooms.join_room(&code, beto()).unwrap();
        (rooms, code)
    }

    #[test]
    fn create_room_seats_host_on_red_then_alternates() {
        let mut rooms = registry();

        let code = rooms.create_room(ana(), RoomMode::Pvp, Some("  ".into())).unwrap();
        let room = rooms.room(&code).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(room.name(), format!("Room {code}"));
        assert_eq!(room.color_of(1), Some(Color::Red));
        assert_eq!(room.status(), RoomStatus::Waiting);

        rooms.close_room(&code.to_lowercase(), 1).unwrap();
        assert!(rooms.room_of_user(1).is_none());

        let code = rooms.create_room(ana(), RoomMode::Pvp, None).unwrap();
        assert_eq!(rooms.room(&code).unwrap().color_of(1), Some(Color::Black));
    }

    #[test]
    fn ai_opens_when_it_sits_on_red() {
        let mut store = MemoryStore::new();
        store.set_last_color(1, RoomMode::Ai, Color::Red).unwrap();
        let mut rooms =
            RoomRegistry::new(RoomConfig::default(), store, 11).with_selector(FirstLegalMoveSelector);

        let code = rooms.create_room(ana(), RoomMode::Ai, None).unwrap();

        let room = rooms.room(&code).unwrap();
        assert_eq!(room.color_of(1), Some(Color::Black));
        assert_eq!(room.ai_color(), Some(Color::Red));
        assert_eq!(room.game().turn(), Color::Black);
        assert_eq!(room.game().turn_count(), 2);
        assert_eq!(room.game().last_move().unwrap().color, Color::Red);
    }

    #[test]
    fn ai_waits_when_the_host_opens() {
        let mut rooms = registry();

        let code = rooms.create_room(ana(), RoomMode::Ai, None).unwrap();

        assert_eq!(rooms.play_ai_turn(&code).unwrap(), None);
        assert_eq!(rooms.room(&code).unwrap().game().turn_count(), 1);
    }

    #[test]
    fn exhausted_code_space_is_an_error() {
        let config = RoomConfig {
            room_code_len: 0,
            ..RoomConfig::default()
        };
        let mut rooms = RoomRegistry::new(config, MemoryStore::new(), 11);
        rooms.create_room(ana(), RoomMode::Pvp, None).unwrap();

        let err = rooms.create_room(beto(), RoomMode::Pvp, None).unwrap_err();

        assert!(matches!(err, Error::RoomCodeUnavailable(_)));
        assert!(rooms.room_of_user(2).is_none());
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn one_live_room_per_user() {
        let mut rooms = registry();
        let code = rooms.create_room(ana(), RoomMode::Pvp, None).unwrap();

        let err = rooms.create_room(ana(), RoomMode::Ai, None).unwrap_err();

        assert!(matches!(err, Error::ActiveRoomExists(active) if active == code));
    }

    #[test]
    fn join_fills_the_free_seat() {
        let (rooms, code) = pvp_room();

        let room = rooms.room(&code).unwrap();
        assert_eq!(room.color_of(2), Some(Color::Black));
        assert_eq!(room.status(), RoomStatus::InGame);
        assert_eq!(
            rooms.room_of_user(2),
            Some(&RoomRef {
                code: code.clone(),
                color: Color::Black,
            })
        );
    }

    #[test]
    fn join_rejections() {
        let (mut rooms, code) = pvp_room();

        assert!(matches!(rooms.join_room(&code, ana()), Err(Error::SameUser)));
        assert!(matches!(
            rooms.join_room(&code, Player::new(3, "caro")),
            Err(Error::RoomFull)
        ));
        assert!(matches!(
            rooms.join_room("NOPE00", Player::new(3, "caro")),
            Err(Error::RoomNotFound(_))
        ));

        let ai_code = rooms.create_room(Player::new(4, "dani"), RoomMode::Ai, None).unwrap();
        assert!(matches!(
            rooms.join_room(&ai_code, Player::new(3, "caro")),
            Err(Error::RoomNotJoinable)
        ));
    }

    #[test]
    fn ai_room_is_full_and_not_observable() {
        let mut rooms = registry();
        let code = rooms.create_room(ana(), RoomMode::Ai, None).unwrap();
        let room = rooms.room_mut(&code).unwrap();

        assert_eq!(room.status(), RoomStatus::InGame);
        assert_eq!(room.ai_color(), Some(Color::Black));
        assert!(matches!(room.observe("sock-1", "eva"), Err(Error::RoomNotObservable)));
        assert_eq!(room.snapshot().players.black.unwrap().username, "AI");
    }

    #[test]
    fn observers_are_counted() {
        let (mut rooms, code) = pvp_room();
        let room = rooms.room_mut(&code).unwrap();

        room.observe("sock-1", "eva").unwrap();
        room.observe("sock-2", "fede").unwrap();
        assert!(room.leave_observer("sock-1"));
        assert!(!room.leave_observer("sock-9"));

        assert_eq!(room.snapshot().observers, 1);
    }

    #[test]
    fn submit_move_checks_seat_turn_and_shape() {
        let (mut rooms, code) = pvp_room();
        let room = rooms.room_mut(&code).unwrap();
        let opening = r#"{"path":[{"r":5,"c":2},{"r":4,"c":3}]}"#;

        assert!(matches!(room.submit_move(9, payload(opening)), Err(Error::NotPlayer)));
        assert!(matches!(room.submit_move(2, payload(opening)), Err(Error::NotYourTurn)));
        assert!(matches!(
            room.submit_move(1, payload(r#"{"path":[{"r":5,"c":2}]}"#)),
            Err(Error::BadMove(_))
        ));
        assert!(matches!(
            room.submit_move(1, payload(r#"{"path":[{"r":5,"c":2},{"r":3,"c":4}]}"#)),
            Err(Error::IllegalMove)
        ));

        let report = room.submit_move(1, payload(opening)).unwrap();
        assert_eq!(report.applied.to, Coord::new(4, 3));
        assert_eq!(room.game().turn(), Color::Black);
    }

    #[test]
    fn skipped_capture_can_be_blown_by_the_opponent() {
        let (mut rooms, code) = pvp_room();
        let room = rooms.room_mut(&code).unwrap();
        let board = Board::from_pieces(&[
            (Coord::new(5, 2), Piece::man(Color::Red)),
            (Coord::new(6, 7), Piece::man(Color::Red)),
            (Coord::new(4, 3), Piece::man(Color::Black)),
            (Coord::new(1, 0), Piece::man(Color::Black)),
        ]);
        *room.game_mut() = Match::from_position(board, Color::Red);

        let report = room
            .submit_move(1, payload(r#"{"path":[{"r":6,"c":7},{"r":5,"c":6}]}"#))
            .unwrap();
        assert_eq!(report.blow_offer, Some(vec![Coord::new(5, 2)]));
        assert_eq!(room.game().pending_blow().unwrap().offered_to, Color::Black);

        assert!(matches!(room.blow(1, None), Err(Error::NotYourTurn)));
        let blow = room.blow(2, Some(Coord::new(5, 2))).unwrap();
        assert!(blow.removed);
        assert_eq!(room.game().turn(), Color::Black);
    }

    #[test]
    fn chat_is_for_seated_players_only() {
        let (mut rooms, code) = pvp_room();
        let room = rooms.room_mut(&code).unwrap();

        let msg = room.chat(2, "  buena partida ").unwrap().unwrap();
        assert_eq!(msg.username, "beto");
        assert_eq!(msg.text, "buena partida");
        assert_eq!(room.chat(1, "   ").unwrap(), None);
        assert!(matches!(room.chat(9, "hola"), Err(Error::NotPlayer)));

        room.resign(1).unwrap();
        assert!(matches!(room.chat(2, "gg"), Err(Error::GameOver)));
        assert_eq!(room.snapshot().messages.len(), 1);
    }

    #[test]
    fn finished_pvp_game_is_rated_and_closed() {
        let (mut rooms, code) = pvp_room();
        let room = rooms.room_mut(&code).unwrap();
        let outcome = room.resign(2).unwrap();
        assert_eq!(outcome.winner, Some(Color::Red));
        assert_eq!(room.status(), RoomStatus::Finished);

        let closed = rooms.finish(&code).unwrap();

        assert_eq!(closed.code(), code);
        assert!(rooms.is_empty());
        assert!(rooms.room_of_user(1).is_none());
        assert!(rooms.room_of_user(2).is_none());
        assert_eq!(rooms.store().rating(1).unwrap().unwrap().rating, 1216);
        assert_eq!(rooms.store().rating(2).unwrap().unwrap().rating, 1184);
        assert_eq!(rooms.store().games()[0].result, GameResult::Red);
    }

    #[test]
    fn unfinished_rooms_cannot_be_settled() {
        let (mut rooms, code) = pvp_room();

        assert!(matches!(rooms.finish(&code), Err(Error::GameInProgress)));
        assert!(matches!(rooms.close_room(&code, 9), Err(Error::NotPlayer)));
    }

    #[test]
    fn ai_games_are_not_rated() {
        let mut rooms = registry();
        let code = rooms.create_room(ana(), RoomMode::Ai, None).unwrap();
        rooms.room_mut(&code).unwrap().resign(1).unwrap();

        rooms.finish(&code).unwrap();

        assert_eq!(rooms.store().rating(1).unwrap(), None);
        assert!(rooms.store().games().is_empty());
    }

    #[test]
    fn ai_plays_only_on_its_turn() {
        let mut rooms = registry();
        let code = rooms.create_room(ana(), RoomMode::Ai, None).unwrap();
        let room = rooms.room_mut(&code).unwrap();
        let mut selector = FirstLegalMoveSelector;

        assert_eq!(room.play_ai_turn(&mut selector).unwrap(), None);

        room.submit_move(1, payload(r#"{"path":[{"r":5,"c":2},{"r":4,"c":3}]}"#))
            .unwrap();
        let turn = room.play_ai_turn(&mut selector).unwrap().unwrap();

        assert!(turn.turn.is_some());
        assert_eq!(room.game().turn(), Color::Red);
        assert_eq!(room.game().turn_count(), 3);
    }

    #[test]
    fn draw_between_players_finishes_the_room() {
        let (mut rooms, code) = pvp_room();
        let room = rooms.room_mut(&code).unwrap();

        room.request_draw(1).unwrap();
        let outcome = room.respond_draw(2, true).unwrap().unwrap();

        assert_eq!(outcome.reason, EndReason::Draw);
        rooms.finish(&code).unwrap();
        assert_eq!(rooms.store().games()[0].result, GameResult::Draw);
    }

    #[test]
    fn snapshot_serializes_flat_camel_case_state() {
        let (rooms, code) = pvp_room();

        let value = serde_json::to_value(rooms.room(&code).unwrap().snapshot()).unwrap();

        assert_eq!(value["status"], "in_game");
        assert_eq!(value["turn"], "red");
        assert_eq!(value["turnCount"], 1);
        assert_eq!(value["players"]["black"]["username"], "beto");
        assert_eq!(value["moveMap"]["5,2"].as_array().unwrap().len(), 2);
        assert_eq!(value["board"][0][1], -1);
        assert!(value["pendingBlow"].is_null());
    }
}
