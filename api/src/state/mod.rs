mod registry;
mod round;
mod vault;

pub use registry::*;
pub use round::*;
pub use vault::*;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::consts::*;
use crate::error::DecodeError;

/// A record owned by the button program, stored as an Anchor account:
/// an 8-byte discriminator followed by the borsh-encoded fields.
pub trait ButtonAccount: BorshSerialize + BorshDeserialize {
    /// Account name as declared by the program.
    const NAME: &'static str;

    /// `sha256("account:<NAME>")[..8]`.
    const DISCRIMINATOR: [u8; 8];

    /// Allocated size of the account, discriminator included.
    const SIZE: usize;

    /// Decodes an account from its raw data. Bytes past the encoded fields are ignored.
    fn try_from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(DecodeError::TooShort { len: data.len() });
        }
        let (discriminator, mut fields) = data.split_at(DISCRIMINATOR_LEN);
        if discriminator != Self::DISCRIMINATOR {
            let mut found = [0u8; 8];
            found.copy_from_slice(discriminator);
            return Err(DecodeError::InvalidDiscriminator {
                account: Self::NAME,
                expected: Self::DISCRIMINATOR,
                found,
            });
        }
        Self::deserialize(&mut fields).map_err(|source| DecodeError::Malformed {
            account: Self::NAME,
            source,
        })
    }

    /// Encodes the account the way the program stores it.
    fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(Self::SIZE);
        data.extend_from_slice(&Self::DISCRIMINATOR);
        self.serialize(&mut data)?;
        Ok(data)
    }
}

pub fn global_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[GLOBAL], &crate::ID)
}

pub fn round_pda(round_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[GAME, &round_id.to_le_bytes()], &crate::ID)
}

pub fn vault_pda(round_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT, &round_id.to_le_bytes()], &crate::ID)
}
