use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered turns of one model's conversation.
pub struct ConversationHistory {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns: 0,
        }
    }

    /// Cap the history; 0 means unbounded.
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self.trim_if_needed();
        self
    }

    pub fn add_user_turn(&mut self, text: impl Into<String>) {
        self.push(Turn::user(text));
    }

    pub fn add_assistant_turn(&mut self, text: impl Into<String>) {
        self.push(Turn::assistant(text));
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        self.trim_if_needed();
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.back()
    }

    fn trim_if_needed(&mut self) {
        if self.max_turns == 0 {
            return;
        }
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
        // Never start on a reply whose user turn was dropped.
        while self
            .turns
            .front()
            .is_some_and(|t| t.role == Role::Assistant)
        {
            self.turns.pop_front();
        }
    }

    /// Rough size of the rendered history, four characters per token.
    pub fn estimate_tokens(&self) -> usize {
        self.turns.iter().map(|t| t.text.len() / 4).sum()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}
