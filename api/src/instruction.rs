use borsh::{BorshDeserialize, BorshSerialize};

use crate::consts::DISCRIMINATOR_LEN;

/// Instructions of the button program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonInstruction {
    InitializeGlobalState,
    CreateNewGame,
    ClickButton,
    ClaimReward,
    VerifyGameState,
}

impl ButtonInstruction {
    pub const ALL: [Self; 5] = [
        Self::InitializeGlobalState,
        Self::CreateNewGame,
        Self::ClickButton,
        Self::ClaimReward,
        Self::VerifyGameState,
    ];

    /// `sha256("global:<name>")[..8]`.
    pub const fn discriminator(&self) -> [u8; 8] {
        match self {
            Self::InitializeGlobalState => [232, 254, 209, 244, 123, 89, 154, 207],
            Self::CreateNewGame => [125, 123, 146, 199, 15, 252, 11, 68],
            Self::ClickButton => [50, 74, 85, 148, 119, 56, 246, 125],
            Self::ClaimReward => [149, 95, 181, 242, 94, 90, 158, 162],
            Self::VerifyGameState => [246, 86, 135, 195, 12, 39, 128, 55],
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitializeGlobalState => "initialize_global_state",
            Self::CreateNewGame => "create_new_game",
            Self::ClickButton => "click_button",
            Self::ClaimReward => "claim_reward",
            Self::VerifyGameState => "verify_game_state",
        }
    }

    pub fn from_data(data: &[u8]) -> Option<Self> {
        let discriminator = data.get(..DISCRIMINATOR_LEN)?;
        Self::ALL
            .into_iter()
            .find(|ix| ix.discriminator() == discriminator)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateNewGame {
    /// Lamports each click deposits into the vault.
    pub deposit_amount: u64,
    /// Countdown length in seconds.
    pub game_time_sec: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ClickButton {
    /// Must equal the vault's deposit amount.
    pub amount: u64,
}
