use button_api::{ButtonError, DecodeError};
use solana_client::{client_error::ClientError, pubsub_client::PubsubClientError};
use solana_sdk::{
    instruction::InstructionError, pubkey::Pubkey, signature::Signature,
    transaction::TransactionError,
};

/// Error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The record does not exist yet.
    #[error("account not found: {0}")]
    NotFound(Pubkey),
    /// The record bytes do not match the expected layout.
    #[error("decode {address}: {source}")]
    Decode {
        address: Pubkey,
        #[source]
        source: DecodeError,
    },
    /// The wallet refused to sign.
    #[error("authorization: {0}")]
    Authorization(String),
    /// The action was refused, either by a local precondition or by the program.
    #[error("rejected: {0}")]
    Rejected(RejectReason),
    /// The transaction could not be delivered.
    #[error("submission: {0}")]
    Submission(String),
    /// Confirmation was not observed in time.
    #[error("confirmation timed out: {0}")]
    TimedOut(Signature),
    /// The account subscription ended.
    #[error("subscription closed: {0}")]
    SubscriptionClosed(Pubkey),
    /// RPC client error.
    #[error("rpc: {0}")]
    Rpc(#[from] Box<ClientError>),
    /// Pubsub client error.
    #[error("pubsub: {0}")]
    Pubsub(#[from] Box<PubsubClientError>),
    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    pub fn decode(address: Pubkey, source: DecodeError) -> Self {
        Self::Decode { address, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<RejectReason> for Error {
    fn from(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("round is not active")]
    RoundNotActive,
    #[error("round is still running")]
    RoundInProgress,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("already the last clicker")]
    AlreadyLastClicker,
    #[error("not the round winner")]
    NotWinner,
    #[error("reward already claimed")]
    AlreadyClaimed,
    #[error("incorrect deposit amount")]
    IncorrectDepositAmount,
    /// Custom program error code not known to this client.
    #[error("program error {0}")]
    Program(u32),
    #[error("transaction error: {0}")]
    Transaction(TransactionError),
}

/// `SystemError::ResultWithNegativeLamports`, raised when the clicker cannot cover the deposit transfer.
const SYSTEM_NEGATIVE_LAMPORTS: u32 = 1;

impl From<ButtonError> for RejectReason {
    fn from(err: ButtonError) -> Self {
        match err {
            ButtonError::IncorrectDepositAmount => Self::IncorrectDepositAmount,
            ButtonError::InsufficientFunds => Self::InsufficientFunds,
            ButtonError::GameNotActive | ButtonError::GameEnded => Self::RoundNotActive,
            ButtonError::AlreadyLastClicker => Self::AlreadyLastClicker,
        }
    }
}

impl From<&TransactionError> for RejectReason {
    fn from(err: &TransactionError) -> Self {
        match err {
            TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
                match ButtonError::try_from(*code) {
                    Ok(err) => err.into(),
                    Err(_) if *code == SYSTEM_NEGATIVE_LAMPORTS => Self::InsufficientFunds,
                    Err(_) => Self::Program(*code),
                }
            }
            TransactionError::InstructionError(_, InstructionError::InsufficientFunds)
            | TransactionError::InsufficientFundsForFee
            | TransactionError::InsufficientFundsForRent { .. } => Self::InsufficientFunds,
            other => Self::Transaction(other.clone()),
        }
    }
}
