use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use super::{global_pda, round_pda, vault_pda, ButtonAccount};

/// Singleton tracking the round creation sequence and the currently active round.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Registry {
    /// The administrator that deployed the program.
    pub authority: Pubkey,

    /// The id the next created round will receive.
    pub next_round_id: u64,

    /// The round currently accepting clicks, if any.
    pub active_round_id: Option<u64>,
}

impl Registry {
    pub fn pda() -> (Pubkey, u8) {
        global_pda()
    }

    /// Addresses of the active round and its vault.
    pub fn active_round_addresses(&self) -> Option<(Pubkey, Pubkey)> {
        self.active_round_id
            .map(|id| (round_pda(id).0, vault_pda(id).0))
    }

    /// Ids of every round created so far.
    pub fn round_ids(&self) -> std::ops::Range<u64> {
        0..self.next_round_id
    }
}

impl ButtonAccount for Registry {
    const NAME: &'static str = "GlobalState";
    const DISCRIMINATOR: [u8; 8] = [163, 46, 74, 168, 216, 123, 133, 98];
    const SIZE: usize = 8 + 32 + 8 + (1 + 8);
}
