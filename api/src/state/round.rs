use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_program::{pubkey::Pubkey, system_program};

use crate::status::{Countdown, RoundStatus};

use super::{round_pda, vault_pda, ButtonAccount};

/// A single click-and-win round.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Round {
    /// The account credited with the most recent click.
    /// Holds the system program id until the first click.
    pub last_clicker: Pubkey,

    /// The round number.
    pub round_id: u64,

    /// The number of accepted clicks.
    pub click_count: u64,

    /// Whether the round currently accepts clicks.
    pub is_active: bool,

    /// Authoritative end flag, set by the program on timeout checks.
    pub has_ended: bool,

    /// Unix timestamp of the most recent click.
    pub last_click_timestamp: Option<i64>,

    /// The countdown each click resets to, in seconds.
    pub round_duration_seconds: i64,
}

impl Round {
    /// Sentinel clicker of a round nobody has clicked yet.
    pub const NO_CLICKER: Pubkey = system_program::ID;

    pub fn pda(&self) -> (Pubkey, u8) {
        round_pda(self.round_id)
    }

    pub fn vault_pda(&self) -> (Pubkey, u8) {
        vault_pda(self.round_id)
    }

    /// Seconds left before the round times out, negative once it has.
    ///
    /// A round without clicks counts from `now`, so it always reports its
    /// full duration instead of appearing expired before anyone played.
    pub fn remaining_time(&self, now: i64) -> i64 {
        let last_click = self.last_click_timestamp.unwrap_or(now);
        self.round_duration_seconds
            .saturating_sub(now.saturating_sub(last_click))
    }

    /// Unix timestamp at which the countdown reaches zero.
    pub fn deadline(&self) -> Option<i64> {
        self.last_click_timestamp
            .map(|t| t.saturating_add(self.round_duration_seconds))
    }

    pub fn is_started(&self) -> bool {
        self.last_clicker != Self::NO_CLICKER
    }

    pub fn is_ended(&self, now: i64) -> bool {
        self.has_ended || self.remaining_time(now) <= 0
    }

    /// Whether `user` made the latest click. Nobody leads a round without clicks.
    pub fn is_leader(&self, user: &Pubkey) -> bool {
        self.is_started() && self.last_clicker == *user
    }

    /// Snapshot of every derived flag at `now`, from the point of view of `user`.
    pub fn status(&self, now: i64, user: Option<&Pubkey>) -> RoundStatus {
        let remaining = self.remaining_time(now);
        RoundStatus {
            remaining,
            countdown: Countdown::from_remaining(remaining),
            is_started: self.is_started(),
            is_ended: self.has_ended || remaining <= 0,
            is_leader: user.is_some_and(|user| self.is_leader(user)),
        }
    }
}

impl ButtonAccount for Round {
    const NAME: &'static str = "GameState";
    const DISCRIMINATOR: [u8; 8] = [144, 94, 208, 172, 248, 99, 134, 120];
    const SIZE: usize = 8 + 32 + 8 + 8 + 1 + 1 + (1 + 8) + 8;
}
