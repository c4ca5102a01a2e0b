use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque ID types for type safety
pub type PollId = String;
pub type UserId = String;
pub type ClientId = String;

/// A single answer option within a poll.
///
/// Option identity inside a poll is its answer text; the vote count only
/// ever moves upward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollOption {
    pub answer: String,
    pub votes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub options: Vec<PollOption>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Build a fresh poll with every option at zero votes.
    pub fn new(question: impl Into<String>, answers: Vec<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            question: question.into(),
            options: answers
                .into_iter()
                .map(|answer| PollOption { answer, votes: 0 })
                .collect(),
            created_at: Utc::now(),
        }
    }

    /// Look up an option by exact answer text.
    pub fn option(&self, answer: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.answer == answer)
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Argon2 hash string, never the plaintext.
    pub password_hash: String,
    /// Polls this user has voted on. Set semantics: a poll id appears at
    /// most once no matter how often the user votes on it.
    #[serde(default)]
    pub participated_polls: HashSet<PollId>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            username: username.into(),
            password_hash: password_hash.into(),
            participated_polls: HashSet::new(),
        }
    }
}
