use std::collections::VecDeque;

use serde::Serialize;

use crate::game::now_millis;
use crate::room::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: u64,
    #[serde(skip)]
    pub user_id: UserId,
    #[serde(rename = "user")]
    pub username: String,
    pub text: String,
    pub ts: u64,
}

/// Bounded room chat. Oldest messages drop off once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
    max_len: usize,
    next_id: u64,
}

impl ChatLog {
    pub fn new(capacity: usize, max_len: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity,
            max_len,
            next_id: 1,
        }
    }

    /// Trims and truncates `text`, then appends it. Blank text is dropped.
    pub fn push(&mut self, user_id: UserId, username: &str, text: &str) -> Option<ChatMessage> {
        let text: String = text.trim().chars().take(self.max_len).collect();
        if text.is_empty() || self.capacity == 0 {
            return None;
        }

        let message = ChatMessage {
            id: self.next_id,
            user_id,
            username: username.to_string(),
            text,
            ts: now_millis(),
        };
        self.next_id += 1;

        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message.clone());
        Some(message)
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
