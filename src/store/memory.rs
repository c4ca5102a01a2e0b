use super::{PollStore, StoreError, StoreResult, UserStore};
use crate::types::{Poll, PollId, User, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process poll store.
///
/// The write lock is held for the whole of `increment_vote`, so a counter
/// bump never interleaves with another task's read-modify-write.
#[derive(Default)]
pub struct MemoryPollStore {
    polls: RwLock<HashMap<PollId, Poll>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollStore for MemoryPollStore {
    async fn insert_poll(&self, poll: Poll) -> StoreResult<()> {
        self.polls.write().await.insert(poll.id.clone(), poll);
        Ok(())
    }

    async fn get_poll(&self, id: &PollId) -> StoreResult<Option<Poll>> {
        Ok(self.polls.read().await.get(id).cloned())
    }

    async fn list_polls(&self) -> StoreResult<Vec<Poll>> {
        let mut polls: Vec<Poll> = self.polls.read().await.values().cloned().collect();
        polls.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(polls)
    }

    async fn increment_vote(&self, id: &PollId, answer: &str) -> StoreResult<Option<u64>> {
        let mut polls = self.polls.write().await;

        let Some(poll) = polls.get_mut(id) else {
            return Ok(None);
        };
        let Some(option) = poll.options.iter_mut().find(|o| o.answer == answer) else {
            return Ok(None);
        };

        option.votes += 1;
        Ok(Some(option.votes))
    }
}

/// In-process user store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        self.users.write().await.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn add_participated(&self, user: &UserId, poll: &PollId) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user)
            .ok_or_else(|| StoreError::WriteFailed(format!("no such user: {user}")))?;

        Ok(user.participated_polls.insert(poll.clone()))
    }
}
