use std::sync::Arc;

use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

use crate::{backend::Wallet, error::RejectReason, Error, Result};

/// A [`Wallet`] holding a local keypair and submitting through an RPC node.
pub struct KeypairWallet {
    keypair: Keypair,
    client: Arc<RpcClient>,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair, client: Arc<RpcClient>) -> Self {
        Self { keypair, client }
    }
}

impl Wallet for KeypairWallet {
    fn identity(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_and_send(&self, mut transaction: Transaction) -> Result<Signature> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|err| Error::Authorization(err.to_string()))?;
        self.client
            .send_transaction(&transaction)
            .await
            .map_err(classify_send_error)
    }
}

/// Preflight failures carry the program's verdict; anything else is a delivery problem.
fn classify_send_error(err: ClientError) -> Error {
    match err.get_transaction_error() {
        Some(tx_err) => {
            tracing::debug!(%tx_err, "transaction rejected in preflight");
            Error::Rejected(RejectReason::from(&tx_err))
        }
        None => Error::Submission(err.to_string()),
    }
}
