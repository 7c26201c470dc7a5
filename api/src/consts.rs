use const_crypto::ed25519;
use solana_program::pubkey::Pubkey;

/// The seed of the global registry account PDA.
pub const GLOBAL: &[u8] = b"global";

/// The seed of the round (game state) account PDA.
pub const GAME: &[u8] = b"game";

/// The seed of the vault account PDA.
pub const VAULT: &[u8] = b"vault";

/// Program id for const pda derivations.
const PROGRAM_ID: [u8; 32] =
    const_crypto::bs58::decode_pubkey("EGMzXToSqdq8PfSDergoQNEphopAF4EVsBzSapKU9JLi");

/// The address of the global registry account.
pub const GLOBAL_ADDRESS: Pubkey =
    Pubkey::new_from_array(ed25519::derive_program_address(&[GLOBAL], &PROGRAM_ID).0);

/// The number of lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Length of an Anchor account or instruction discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;
