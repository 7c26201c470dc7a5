use std::sync::Arc;

use futures_util::StreamExt;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{nonblocking::pubsub_client::PubsubClient, rpc_config::RpcAccountInfoConfig};
use solana_sdk::{account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    backend::{AccountStream, AccountSubscriber},
    config::ClientConfig,
    Result,
};

/// [`AccountSubscriber`] backed by a Solana websocket endpoint.
#[derive(Clone)]
pub struct PubsubBackend {
    client: Arc<PubsubClient>,
    commitment: CommitmentConfig,
}

impl PubsubBackend {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let url = config.ws_url();
        tracing::debug!(%url, "connecting to pubsub endpoint");
        let client = PubsubClient::new(&url).await.map_err(Box::new)?;
        Ok(Self {
            client: Arc::new(client),
            commitment: config.commitment(),
        })
    }
}

impl AccountSubscriber for PubsubBackend {
    async fn subscribe(&self, address: Pubkey) -> Result<AccountStream> {
        let client = self.client.clone();
        let config = RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            commitment: Some(self.commitment),
            ..Default::default()
        };
        let (ready_tx, ready_rx) = oneshot::channel();
        let (tx, rx) = mpsc::unbounded_channel();

        // The notification stream borrows the client, so it is driven from a task owning it.
        tokio::spawn(async move {
            let (mut notifications, unsubscribe) =
                match client.account_subscribe(&address, Some(config)).await {
                    Ok(subscription) => {
                        let _ = ready_tx.send(Ok(()));
                        subscription
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
            tracing::debug!(%address, "account subscription started");
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    notification = notifications.next() => {
                        let Some(notification) = notification else {
                            break;
                        };
                        let Some(account) = notification.value.decode::<Account>() else {
                            tracing::warn!(%address, "undecodable account notification");
                            continue;
                        };
                        if tx.send(account.data).is_err() {
                            break;
                        }
                    }
                }
            }
            unsubscribe().await;
            tracing::debug!(%address, "account subscription ended");
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            Ok(Err(err)) => Err(Box::new(err).into()),
            Err(_) => Err(crate::Error::SubscriptionClosed(address)),
        }
    }
}
