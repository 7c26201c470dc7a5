use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::consts::LAMPORTS_PER_SOL;

use super::{vault_pda, ButtonAccount, Round};

/// The pooled deposits of a round.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Vault {
    /// The round this vault belongs to.
    pub round_id: u64,

    /// The lamports currently pooled.
    pub balance: u64,

    /// The stake each click must deposit.
    pub deposit_amount: u64,
}

impl Vault {
    pub fn pda(&self) -> (Pubkey, u8) {
        vault_pda(self.round_id)
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0
    }

    /// The reward of a round that was played and has ended is claimed once its vault is drained.
    pub fn is_claimed(&self, round: &Round, now: i64) -> bool {
        round.is_started() && round.is_ended(now) && self.is_empty()
    }

    pub fn balance_in_sol(&self) -> f64 {
        self.balance as f64 / LAMPORTS_PER_SOL as f64
    }
}

impl ButtonAccount for Vault {
    const NAME: &'static str = "Vault";
    const DISCRIMINATOR: [u8; 8] = [211, 8, 232, 43, 2, 152, 117, 119];
    const SIZE: usize = 8 + 8 + 8 + 8;
}
