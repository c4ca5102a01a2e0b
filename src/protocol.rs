//! Live-update channel wire protocol
//!
//! Both directions carry JSON text messages tagged by a `type` field.

use crate::types::{Poll, PollId};
use serde::{Deserialize, Serialize};

/// Messages a live-update client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Vote {
        poll_id: PollId,
        selected_option: String,
    },
}

/// Events fanned out to every connected live-update client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// A vote landed; carries the new count for the affected option.
    #[serde(rename_all = "camelCase")]
    Vote {
        poll_id: PollId,
        selected_option: String,
        votes: u64,
    },
    /// A poll was created; carries the full poll so open dashboards can
    /// render it without a page reload.
    NewPoll { poll: Poll },
}
