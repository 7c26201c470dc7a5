use std::{sync::Arc, time::Duration};

use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
};
use tokio::time::Instant;

use crate::{
    backend::{AccountSource, Confirmation, Confirmer, RawAccount},
    config::ClientConfig,
    Result,
};

/// [`AccountSource`] and [`Confirmer`] backed by a Solana JSON-RPC node.
#[derive(Clone)]
pub struct RpcBackend {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcBackend {
    pub fn new(client: Arc<RpcClient>, config: &ClientConfig) -> Self {
        Self {
            client,
            commitment: config.commitment(),
            confirm_timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment());
        Self::new(Arc::new(client), config)
    }

    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }
}

impl AccountSource for RpcBackend {
    async fn fetch(&self, address: &Pubkey) -> Result<Option<RawAccount>> {
        tracing::debug!(%address, "fetching account");
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(Box::new)?;
        Ok(response.value.map(RawAccount::from))
    }

    async fn fetch_program_accounts(
        &self,
        discriminator: [u8; 8],
    ) -> Result<Vec<(Pubkey, RawAccount)>> {
        tracing::debug!(?discriminator, "fetching program accounts");
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                0,
                &discriminator,
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(&button_api::ID, config)
            .await
            .map_err(Box::new)?;
        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, RawAccount::from(account)))
            .collect())
    }
}

impl Confirmer for RpcBackend {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.client.get_latest_blockhash().await.map_err(Box::new)?)
    }

    async fn confirm(&self, signature: &Signature) -> Result<Confirmation> {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await
                .map_err(Box::new)?;
            match status {
                Some(Ok(())) => return Ok(Confirmation::Confirmed),
                Some(Err(err)) => return Ok(Confirmation::Failed(err)),
                None if Instant::now() >= deadline => return Ok(Confirmation::TimedOut),
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}
