//! Runtime configuration, loaded from environment variables

use crate::engine::RepeatVotePolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// What happens when a user votes again on the same poll
    pub repeat_voting: RepeatVotePolicy,
    /// Whether sessionless WebSocket connections may cast votes.
    /// Off by default; anonymous votes move counters but leave no
    /// participation record.
    pub anonymous_live_votes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            repeat_voting: RepeatVotePolicy::Allowed,
            anonymous_live_votes: false,
        }
    }
}

impl AppConfig {
    /// Load config from environment variables, falling back to defaults
    /// (with a logged warning) on anything unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = match std::env::var("POLLS_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid POLLS_PORT {:?}, using {}", raw, defaults.port);
                defaults.port
            }),
            Err(_) => defaults.port,
        };

        let repeat_voting = match std::env::var("POLLS_REPEAT_VOTING") {
            Ok(raw) => parse_repeat_policy(&raw).unwrap_or_else(|| {
                tracing::warn!("Invalid POLLS_REPEAT_VOTING {:?}, allowing repeats", raw);
                defaults.repeat_voting
            }),
            Err(_) => defaults.repeat_voting,
        };

        let anonymous_live_votes = std::env::var("POLLS_ANONYMOUS_LIVE_VOTES")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(defaults.anonymous_live_votes);

        if anonymous_live_votes {
            tracing::warn!("Anonymous live voting enabled - votes without a session will count");
        }

        Self {
            port,
            repeat_voting,
            anonymous_live_votes,
        }
    }
}

fn parse_repeat_policy(raw: &str) -> Option<RepeatVotePolicy> {
    match raw.trim().to_lowercase().as_str() {
        "allowed" => Some(RepeatVotePolicy::Allowed),
        "rejected" => Some(RepeatVotePolicy::Rejected),
        _ => None,
    }
}
