//! Vote mutation engine
//!
//! All poll mutations go through here: validate, persist, then fan the
//! result out through the live-update registry. Handlers never touch the
//! poll store's counters directly.

use crate::protocol::ServerMessage;
use crate::registry::LiveRegistry;
use crate::store::{PollStore, StoreError, UserStore};
use crate::types::{Poll, PollId, UserId};
use std::collections::HashSet;
use std::sync::Arc;

/// What happens when a user votes again on a poll they already voted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatVotePolicy {
    /// Counters keep incrementing; the participation record stays unique.
    Allowed,
    /// The repeat vote is refused and no counter moves.
    Rejected,
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("Poll not found")]
    PollNotFound,

    #[error("no option with that answer")]
    OptionNotFound,

    #[error("already voted on this poll")]
    AlreadyVoted,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum CreatePollError {
    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("A poll needs at least one option")]
    NoOptions,

    #[error("Options must not be empty")]
    EmptyOption,

    #[error("Duplicate option: {0}")]
    DuplicateOption(String),

    #[error("Error creating the poll, please try again")]
    Storage(#[source] StoreError),
}

/// A successfully applied vote, ready for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    pub poll_id: PollId,
    pub selected_option: String,
    pub votes: u64,
}

pub struct PollEngine {
    polls: Arc<dyn PollStore>,
    users: Arc<dyn UserStore>,
    registry: Arc<LiveRegistry>,
    repeat_voting: RepeatVotePolicy,
}

impl PollEngine {
    pub fn new(
        polls: Arc<dyn PollStore>,
        users: Arc<dyn UserStore>,
        registry: Arc<LiveRegistry>,
        repeat_voting: RepeatVotePolicy,
    ) -> Self {
        Self {
            polls,
            users,
            registry,
            repeat_voting,
        }
    }

    /// Validate and persist a new poll, then announce it to all live clients.
    pub async fn create_poll(
        &self,
        question: &str,
        answers: Vec<String>,
    ) -> Result<Poll, CreatePollError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CreatePollError::EmptyQuestion);
        }

        let answers: Vec<String> = answers.into_iter().map(|a| a.trim().to_string()).collect();
        if answers.is_empty() {
            return Err(CreatePollError::NoOptions);
        }

        let mut seen = HashSet::new();
        for answer in &answers {
            if answer.is_empty() {
                return Err(CreatePollError::EmptyOption);
            }
            if !seen.insert(answer.clone()) {
                return Err(CreatePollError::DuplicateOption(answer.clone()));
            }
        }

        let poll = Poll::new(question, answers);
        self.polls
            .insert_poll(poll.clone())
            .await
            .map_err(CreatePollError::Storage)?;

        tracing::info!("created poll {} ({:?})", poll.id, poll.question);

        self.registry
            .broadcast(ServerMessage::NewPoll { poll: poll.clone() })
            .await;

        Ok(poll)
    }

    /// Apply one vote and broadcast the new count.
    ///
    /// `voter` is the authenticated identity whose participation gets
    /// recorded; `None` means an anonymous vote (only reachable when the
    /// deployment explicitly allows it), which moves the counter without a
    /// participation record.
    pub async fn apply_vote(
        &self,
        poll_id: &PollId,
        selected_option: &str,
        voter: Option<&UserId>,
    ) -> Result<VoteOutcome, VoteError> {
        let poll = self
            .polls
            .get_poll(poll_id)
            .await?
            .ok_or(VoteError::PollNotFound)?;

        if poll.option(selected_option).is_none() {
            return Err(VoteError::OptionNotFound);
        }

        // Participation first: the add-to-set result doubles as the
        // has-voted check when repeats are rejected.
        if let Some(user_id) = voter {
            let newly_added = self.users.add_participated(user_id, poll_id).await?;
            if !newly_added && self.repeat_voting == RepeatVotePolicy::Rejected {
                return Err(VoteError::AlreadyVoted);
            }
        }

        let votes = self
            .polls
            .increment_vote(poll_id, selected_option)
            .await?
            .ok_or(VoteError::OptionNotFound)?;

        let outcome = VoteOutcome {
            poll_id: poll_id.clone(),
            selected_option: selected_option.to_string(),
            votes,
        };

        self.registry
            .broadcast(ServerMessage::Vote {
                poll_id: outcome.poll_id.clone(),
                selected_option: outcome.selected_option.clone(),
                votes: outcome.votes,
            })
            .await;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryPollStore, MemoryUserStore};
    use crate::types::User;
    use tokio::sync::mpsc;

    struct Fixture {
        engine: PollEngine,
        polls: Arc<MemoryPollStore>,
        users: Arc<MemoryUserStore>,
        registry: Arc<LiveRegistry>,
    }

    fn fixture(repeat_voting: RepeatVotePolicy) -> Fixture {
        let polls = Arc::new(MemoryPollStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let registry = Arc::new(LiveRegistry::new());
        let engine = PollEngine::new(
            polls.clone(),
            users.clone(),
            registry.clone(),
            repeat_voting,
        );
        Fixture {
            engine,
            polls,
            users,
            registry,
        }
    }

    async fn new_user(f: &Fixture, name: &str) -> UserId {
        let user = User::new(name, "$argon2id$stub");
        let id = user.id.clone();
        f.users.insert_user(user).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_vote_increments_exactly_one_option() {
        let f = fixture(RepeatVotePolicy::Allowed);
        let user = new_user(&f, "alice").await;
        let poll = f
            .engine
            .create_poll("Best color?", vec!["Red".to_string(), "Blue".to_string()])
            .await
            .unwrap();

        let outcome = f
            .engine
            .apply_vote(&poll.id, "Red", Some(&user))
            .await
            .unwrap();
        assert_eq!(outcome.votes, 1);

        let poll = f.polls.get_poll(&poll.id).await.unwrap().unwrap();
        assert_eq!(poll.option("Red").unwrap().votes, 1);
        assert_eq!(poll.option("Blue").unwrap().votes, 0);
    }

    #[tokio::test]
    async fn test_repeat_votes_keep_participation_unique() {
        let f = fixture(RepeatVotePolicy::Allowed);
        let user = new_user(&f, "alice").await;
        let poll = f
            .engine
            .create_poll("Best color?", vec!["Red".to_string(), "Blue".to_string()])
            .await
            .unwrap();

        for _ in 0..3 {
            f.engine
                .apply_vote(&poll.id, "Red", Some(&user))
                .await
                .unwrap();
        }

        let stored = f.users.get_user(&user).await.unwrap().unwrap();
        assert_eq!(stored.participated_polls.len(), 1);

        let poll = f.polls.get_poll(&poll.id).await.unwrap().unwrap();
        assert_eq!(poll.option("Red").unwrap().votes, 3);
    }

    #[tokio::test]
    async fn test_rejected_policy_refuses_second_vote() {
        let f = fixture(RepeatVotePolicy::Rejected);
        let user = new_user(&f, "alice").await;
        let poll = f
            .engine
            .create_poll("Best color?", vec!["Red".to_string(), "Blue".to_string()])
            .await
            .unwrap();

        f.engine
            .apply_vote(&poll.id, "Red", Some(&user))
            .await
            .unwrap();
        let second = f.engine.apply_vote(&poll.id, "Blue", Some(&user)).await;

        assert!(matches!(second, Err(VoteError::AlreadyVoted)));
        let poll = f.polls.get_poll(&poll.id).await.unwrap().unwrap();
        assert_eq!(poll.option("Red").unwrap().votes, 1);
        assert_eq!(poll.option("Blue").unwrap().votes, 0);
    }

    #[tokio::test]
    async fn test_unknown_option_moves_nothing() {
        let f = fixture(RepeatVotePolicy::Allowed);
        let user = new_user(&f, "alice").await;
        let poll = f
            .engine
            .create_poll("Best color?", vec!["Red".to_string(), "Blue".to_string()])
            .await
            .unwrap();

        let result = f.engine.apply_vote(&poll.id, "Green", Some(&user)).await;
        assert!(matches!(result, Err(VoteError::OptionNotFound)));

        let poll = f.polls.get_poll(&poll.id).await.unwrap().unwrap();
        assert_eq!(poll.total_votes(), 0);
        // Nothing was recorded against the voter either
        let stored = f.users.get_user(&user).await.unwrap().unwrap();
        assert!(stored.participated_polls.is_empty());
    }

    #[tokio::test]
    async fn test_vote_on_missing_poll() {
        let f = fixture(RepeatVotePolicy::Allowed);
        let user = new_user(&f, "alice").await;

        let result = f
            .engine
            .apply_vote(&"missing".to_string(), "Red", Some(&user))
            .await;
        assert!(matches!(result, Err(VoteError::PollNotFound)));
    }

    #[tokio::test]
    async fn test_create_poll_validation() {
        let f = fixture(RepeatVotePolicy::Allowed);

        assert!(matches!(
            f.engine.create_poll("  ", vec!["Red".to_string()]).await,
            Err(CreatePollError::EmptyQuestion)
        ));
        assert!(matches!(
            f.engine.create_poll("Best color?", vec![]).await,
            Err(CreatePollError::NoOptions)
        ));
        assert!(matches!(
            f.engine
                .create_poll("Best color?", vec!["Red".to_string(), " ".to_string()])
                .await,
            Err(CreatePollError::EmptyOption)
        ));
        assert!(matches!(
            f.engine
                .create_poll("Best color?", vec!["Red".to_string(), "Red".to_string()])
                .await,
            Err(CreatePollError::DuplicateOption(_))
        ));
    }

    #[tokio::test]
    async fn test_create_poll_broadcasts_to_every_client() {
        let f = fixture(RepeatVotePolicy::Allowed);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        f.registry.register(tx_a).await;
        f.registry.register(tx_b).await;

        let poll = f
            .engine
            .create_poll("Best color?", vec!["Red".to_string(), "Blue".to_string()])
            .await
            .unwrap();

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.recv().await {
                Some(ServerMessage::NewPoll { poll: announced }) => {
                    assert_eq!(announced.id, poll.id);
                    assert!(announced.options.iter().all(|o| o.votes == 0));
                }
                other => panic!("expected NewPoll, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_vote_broadcast_carries_new_count() {
        let f = fixture(RepeatVotePolicy::Allowed);
        let user = new_user(&f, "alice").await;
        let poll = f
            .engine
            .create_poll("Best color?", vec!["Red".to_string()])
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        f.registry.register(tx).await;

        f.engine
            .apply_vote(&poll.id, "Red", Some(&user))
            .await
            .unwrap();
        f.engine
            .apply_vote(&poll.id, "Red", Some(&user))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::Vote {
                poll_id: poll.id.clone(),
                selected_option: "Red".to_string(),
                votes: 1,
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::Vote {
                poll_id: poll.id,
                selected_option: "Red".to_string(),
                votes: 2,
            })
        );
    }
}
