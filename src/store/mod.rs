//! Persistence seam for polls and users
//!
//! The application talks to its stores only through these traits; the
//! bundled implementation keeps everything in process memory.

mod memory;

pub use memory::{MemoryPollStore, MemoryUserStore};

use crate::types::{Poll, PollId, User, UserId};
use async_trait::async_trait;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a store backend may surface
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Durable CRUD over poll documents.
#[async_trait]
pub trait PollStore: Send + Sync {
    async fn insert_poll(&self, poll: Poll) -> StoreResult<()>;

    async fn get_poll(&self, id: &PollId) -> StoreResult<Option<Poll>>;

    /// All polls, oldest first.
    async fn list_polls(&self) -> StoreResult<Vec<Poll>>;

    /// Atomically add one vote to the named option.
    ///
    /// This is the only way a counter moves; callers must never read a poll,
    /// bump a count, and write the document back. Returns the new count, or
    /// `None` when the poll or option is absent.
    async fn increment_vote(&self, id: &PollId, answer: &str) -> StoreResult<Option<u64>>;
}

/// Durable CRUD over user credentials and participation records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Add-to-set: record that `user` voted on `poll`.
    ///
    /// Returns true when the poll id was newly added, false when it was
    /// already present. Never duplicates.
    async fn add_participated(&self, user: &UserId, poll: &PollId) -> StoreResult<bool>;
}
