use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::{
    consts::GLOBAL_ADDRESS,
    instruction::{ButtonInstruction, ClickButton, CreateNewGame},
    state::{round_pda, vault_pda},
};

pub fn initialize_global_state(authority: Pubkey) -> Instruction {
    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(GLOBAL_ADDRESS, false),
            AccountMeta::new(authority, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: ButtonInstruction::InitializeGlobalState
            .discriminator()
            .to_vec(),
    }
}

/// Creates round `next_round_id`, which must be the registry's current `next_round_id`.
pub fn create_new_game(
    signer: Pubkey,
    next_round_id: u64,
    deposit_amount: u64,
    game_time_sec: i64,
) -> Instruction {
    let args = CreateNewGame {
        deposit_amount,
        game_time_sec,
    };
    Instruction::new_with_borsh(
        crate::ID,
        &(ButtonInstruction::CreateNewGame.discriminator(), args),
        vec![
            AccountMeta::new(GLOBAL_ADDRESS, false),
            AccountMeta::new(round_pda(next_round_id).0, false),
            AccountMeta::new(vault_pda(next_round_id).0, false),
            AccountMeta::new(signer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
    )
}

pub fn click_button(signer: Pubkey, round_id: u64, amount: u64) -> Instruction {
    Instruction::new_with_borsh(
        crate::ID,
        &(
            ButtonInstruction::ClickButton.discriminator(),
            ClickButton { amount },
        ),
        vec![
            AccountMeta::new(GLOBAL_ADDRESS, false),
            AccountMeta::new(round_pda(round_id).0, false),
            AccountMeta::new(vault_pda(round_id).0, false),
            AccountMeta::new(signer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
    )
}

pub fn claim_reward(signer: Pubkey, round_id: u64) -> Instruction {
    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(round_pda(round_id).0, false),
            AccountMeta::new(vault_pda(round_id).0, false),
            AccountMeta::new(signer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: ButtonInstruction::ClaimReward.discriminator().to_vec(),
    }
}

/// Asks the program to re-evaluate the round's timeout and persist `has_ended`.
pub fn verify_game_state(round_id: u64) -> Instruction {
    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(round_pda(round_id).0, false),
            AccountMeta::new(GLOBAL_ADDRESS, false),
        ],
        data: ButtonInstruction::VerifyGameState.discriminator().to_vec(),
    }
}
