use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{Round, Vault};

/// Remaining time split for display. Negative durations clamp to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn from_remaining(remaining: i64) -> Self {
        let total = remaining.max(0);
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}h:{:02}m:{:02}s",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Everything the presentation layer derives from a round at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStatus {
    /// Raw signed remaining time in seconds.
    pub remaining: i64,
    pub countdown: Countdown,
    pub is_started: bool,
    pub is_ended: bool,
    pub is_leader: bool,
}

/// Position of an existing round in its lifecycle, as observed by a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Created, nobody clicked yet.
    WaitingForFirstClick,
    /// Countdown running.
    Active,
    /// Timed out or finalized; the leader may claim the pool.
    Ended,
    /// The leader withdrew the pool.
    Claimed,
}

impl RoundPhase {
    pub fn derive(round: &Round, vault: Option<&Vault>, now: i64) -> Self {
        if round.is_ended(now) {
            match vault {
                Some(vault) if vault.is_claimed(round, now) => Self::Claimed,
                _ => Self::Ended,
            }
        } else if round.is_started() {
            Self::Active
        } else {
            Self::WaitingForFirstClick
        }
    }

    pub fn accepts_clicks(&self) -> bool {
        matches!(self, Self::WaitingForFirstClick | Self::Active)
    }
}
