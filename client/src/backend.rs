//! Seams to the external collaborators: account storage, change
//! notifications, transaction confirmation and the signing wallet.

use std::future::Future;

use futures_util::stream::BoxStream;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::{Transaction, TransactionError},
};

use crate::Result;

/// Raw account snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawAccount {
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl From<Account> for RawAccount {
    fn from(account: Account) -> Self {
        Self {
            lamports: account.lamports,
            data: account.data,
        }
    }
}

/// Stream of raw account data, one item per observed change, in ledger order.
pub type AccountStream = BoxStream<'static, Vec<u8>>;

/// Read access to program accounts.
pub trait AccountSource: Send + Sync {
    /// Fetch an account. Returns `None` if it does not exist.
    fn fetch(&self, address: &Pubkey) -> impl Future<Output = Result<Option<RawAccount>>> + Send;

    /// Fetch every account of the button program whose data starts with `discriminator`.
    fn fetch_program_accounts(
        &self,
        discriminator: [u8; 8],
    ) -> impl Future<Output = Result<Vec<(Pubkey, RawAccount)>>> + Send;
}

/// Account change notifications.
pub trait AccountSubscriber: Send + Sync {
    fn subscribe(&self, address: Pubkey) -> impl Future<Output = Result<AccountStream>> + Send;
}

/// Outcome of waiting for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Failed(TransactionError),
    TimedOut,
}

/// Transaction lifecycle on the ledger side.
pub trait Confirmer: Send + Sync {
    fn latest_blockhash(&self) -> impl Future<Output = Result<Hash>> + Send;

    /// Waits for `signature` within the collaborator's own confirmation window.
    fn confirm(&self, signature: &Signature) -> impl Future<Output = Result<Confirmation>> + Send;
}

/// The user's wallet.
pub trait Wallet: Send + Sync {
    fn identity(&self) -> Pubkey;

    /// Signs and submits the transaction.
    ///
    /// Fails with [`Error::Authorization`](crate::Error::Authorization) when signing is
    /// refused and [`Error::Rejected`](crate::Error::Rejected) or
    /// [`Error::Submission`](crate::Error::Submission) when delivery fails.
    fn sign_and_send(
        &self,
        transaction: Transaction,
    ) -> impl Future<Output = Result<Signature>> + Send;
}
