use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Poll;

const SECONDS_PER_MINUTE: i128 = 60;
const SECONDS_PER_HOUR: i128 = 3_600;
const SECONDS_PER_DAY: i128 = 86_400;

/// Lifecycle of a poll as seen by this client.
///
/// Expiry is derived locally from the deadline and the caller's clock; the
/// contract's own `is-poll-expired` is never consulted, so two clients with
/// skewed clocks can disagree until the creator closes the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollStatus {
    Active,
    Closed,
    Expired,
}

impl PollStatus {
    pub fn derive(poll: &Poll, now: u64) -> Self {
        Self::classify(poll.is_closed, poll.deadline, now)
    }

    pub fn classify(is_closed: bool, deadline: u64, now: u64) -> Self {
        if is_closed {
            PollStatus::Closed
        } else if now >= deadline {
            PollStatus::Expired
        } else {
            PollStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PollStatus::Active => "Active",
            PollStatus::Closed => "Closed",
            PollStatus::Expired => "Expired",
        }
    }

    pub fn accepts_votes(&self) -> bool {
        matches!(self, PollStatus::Active)
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-only countdown such as `"42m left"`.
pub fn format_time_left(deadline: u64, now: u64) -> String {
    let diff = deadline as i128 - now as i128;
    if diff <= 0 {
        "Ended".to_string()
    } else if diff < SECONDS_PER_HOUR {
        format!("{}m left", diff / SECONDS_PER_MINUTE)
    } else if diff < SECONDS_PER_DAY {
        format!("{}h left", diff / SECONDS_PER_HOUR)
    } else {
        format!("{}d left", diff / SECONDS_PER_DAY)
    }
}
