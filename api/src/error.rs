use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Custom error codes returned by the button program.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum ButtonError {
    #[error("Incorrect deposit amount")]
    IncorrectDepositAmount = 6000,
    #[error("Insufficient funds in user account")]
    InsufficientFunds = 6001,
    #[error("Game not active")]
    GameNotActive = 6002,
    #[error("Already the last clicker")]
    AlreadyLastClicker = 6003,
    #[error("Game has ended")]
    GameEnded = 6004,
}

/// Failure to decode an account record from raw bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("account data too short: {len} bytes")]
    TooShort { len: usize },
    #[error("invalid discriminator for {account}: expected {expected:?}, found {found:?}")]
    InvalidDiscriminator {
        account: &'static str,
        expected: [u8; 8],
        found: [u8; 8],
    },
    #[error("malformed {account} data: {source}")]
    Malformed {
        account: &'static str,
        #[source]
        source: std::io::Error,
    },
}
