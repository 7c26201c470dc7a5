//! Live copies of program accounts kept current by change notifications.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, Weak},
};

use button_api::prelude::*;
use futures_util::StreamExt;
use solana_sdk::pubkey::Pubkey;
use tokio::{
    sync::{watch, Mutex},
    task::AbortHandle,
};

use crate::{
    backend::{AccountSource, AccountStream, AccountSubscriber},
    Error, Result,
};

/// Latest state of a watched account.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Last successfully decoded record. `None` until the account exists.
    pub value: Option<T>,
    /// Error of the most recent update, cleared by the next good one.
    pub error: Option<Arc<Error>>,
    /// Number of change notifications received.
    pub updates: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            updates: 0,
        }
    }
}

impl<T: Clone> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error: self.error.clone(),
            updates: self.updates,
        }
    }
}

impl<T: ButtonAccount> Snapshot<T> {
    fn decoded(address: Pubkey, data: &[u8]) -> Self {
        let mut snapshot = Self::default();
        snapshot.replace(address, data);
        snapshot
    }

    fn apply(&mut self, address: Pubkey, data: &[u8]) {
        self.updates += 1;
        self.replace(address, data);
    }

    /// A record that fails to decode keeps the previous value.
    fn replace(&mut self, address: Pubkey, data: &[u8]) {
        match T::try_from_bytes(data) {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(%address, account = T::NAME, %err, "keeping last good record");
                self.error = Some(Arc::new(Error::decode(address, err)));
            }
        }
    }
}

/// Handle to a watched account.
///
/// The underlying subscription lives as long as any handle for the address does.
#[derive(Debug)]
pub struct Watched<T> {
    address: Pubkey,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T> Clone for Watched<T> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            receiver: self.receiver.clone(),
        }
    }
}

impl<T: Clone> Watched<T> {
    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn current(&self) -> Option<T> {
        self.receiver.borrow().value.clone()
    }

    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.receiver.borrow().error.clone()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next update.
    ///
    /// Fails with [`Error::SubscriptionClosed`] once the subscription has ended
    /// and every update has been seen.
    pub async fn changed(&mut self) -> Result<()> {
        self.receiver
            .changed()
            .await
            .map_err(|_| Error::SubscriptionClosed(self.address))
    }
}

struct Entry {
    sender: Box<dyn Any + Send + Sync>,
    task: AbortHandle,
}

impl Entry {
    fn shared<T: Send + Sync + 'static>(&self) -> Option<Arc<watch::Sender<Snapshot<T>>>> {
        if self.task.is_finished() {
            return None;
        }
        self.sender
            .downcast_ref::<Channel<T>>()
            .and_then(Weak::upgrade)
            .filter(|sender| !sender.is_closed())
    }
}

type Channel<T> = Weak<watch::Sender<Snapshot<T>>>;

/// One address watched as one record type.
type Key = (Pubkey, TypeId);

/// Guards the set up of a single subscription.
type Slot = Arc<Mutex<Option<Entry>>>;

/// Subscription manager shared by every view.
///
/// Watching the same address twice hands out another handle to the existing
/// subscription instead of opening a second one. Subscriptions of different
/// addresses are set up independently of each other.
pub struct LiveSync<S, P> {
    source: Arc<S>,
    subscriber: Arc<P>,
    slots: Mutex<HashMap<Key, Slot>>,
}

impl<S, P> LiveSync<S, P>
where
    S: AccountSource,
    P: AccountSubscriber,
{
    pub fn new(source: Arc<S>, subscriber: Arc<P>) -> Self {
        Self {
            source,
            subscriber,
            slots: Mutex::default(),
        }
    }

    /// Watches `address`, decoding it as `T`.
    ///
    /// The handle starts with the current ledger state. A missing account is
    /// an empty snapshot, not an error.
    pub async fn watch<T>(&self, address: Pubkey) -> Result<Watched<T>>
    where
        T: ButtonAccount + Clone + Send + Sync + 'static,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            prune(&mut slots);
            slots
                .entry((address, TypeId::of::<T>()))
                .or_default()
                .clone()
        };
        let mut entry = slot.lock().await;

        if let Some(sender) = entry.as_ref().and_then(Entry::shared::<T>) {
            tracing::debug!(%address, "sharing subscription");
            return Ok(Watched {
                address,
                receiver: sender.subscribe(),
            });
        }
        if let Some(stale) = entry.take() {
            stale.task.abort();
        }

        // Subscribe before the initial fetch so that no change is missed in between.
        let stream = self.subscriber.subscribe(address).await?;
        let initial = match self.source.fetch(&address).await? {
            Some(account) => Snapshot::decoded(address, &account.data),
            None => {
                tracing::debug!(%address, account = T::NAME, "account does not exist yet");
                Snapshot::default()
            }
        };

        let (sender, receiver) = watch::channel(initial);
        let sender = Arc::new(sender);
        let channel: Channel<T> = Arc::downgrade(&sender);
        let task = tokio::spawn(forward(address, sender, stream)).abort_handle();
        *entry = Some(Entry {
            sender: Box::new(channel),
            task,
        });
        tracing::info!(%address, account = T::NAME, "watching account");

        Ok(Watched { address, receiver })
    }

    pub async fn watch_registry(&self) -> Result<Watched<Registry>> {
        self.watch(GLOBAL_ADDRESS).await
    }

    pub async fn watch_round(&self, round_id: u64) -> Result<Watched<Round>> {
        self.watch(round_pda(round_id).0).await
    }

    pub async fn watch_vault(&self, round_id: u64) -> Result<Watched<Vault>> {
        self.watch(vault_pda(round_id).0).await
    }

    /// Ends every subscription to `address`. Returns whether one existed.
    pub async fn unwatch(&self, address: &Pubkey) -> bool {
        let removed: Vec<Slot> = {
            let mut slots = self.slots.lock().await;
            let keys: Vec<Key> = slots
                .keys()
                .filter(|(watched, _)| watched == address)
                .copied()
                .collect();
            keys.iter().filter_map(|key| slots.remove(key)).collect()
        };
        let mut found = false;
        for slot in removed {
            if let Some(entry) = slot.lock().await.take() {
                entry.task.abort();
                found = true;
            }
        }
        if found {
            tracing::info!(%address, "unwatched account");
        }
        found
    }

    /// Number of subscriptions still forwarding updates.
    pub async fn active(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| {
                slot.try_lock()
                    .is_ok_and(|entry| entry.as_ref().is_some_and(|e| !e.task.is_finished()))
            })
            .count()
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.slots.lock().await.len()
    }
}

/// Drops slots whose subscription has ended and that no `watch` is using.
fn prune(slots: &mut HashMap<Key, Slot>) {
    slots.retain(|_, slot| {
        if Arc::strong_count(slot) > 1 {
            return true;
        }
        match slot.try_lock() {
            Ok(entry) => entry.as_ref().is_some_and(|e| !e.task.is_finished()),
            Err(_) => true,
        }
    });
}

async fn forward<T: ButtonAccount>(
    address: Pubkey,
    sender: Arc<watch::Sender<Snapshot<T>>>,
    mut stream: AccountStream,
) {
    loop {
        tokio::select! {
            _ = sender.closed() => {
                tracing::debug!(%address, "no handles left");
                break;
            }
            data = stream.next() => match data {
                Some(data) => sender.send_modify(|snapshot| snapshot.apply(address, &data)),
                None => {
                    tracing::warn!(%address, "subscription closed");
                    sender.send_modify(|snapshot| {
                        snapshot.error = Some(Arc::new(Error::SubscriptionClosed(address)));
                    });
                    break;
                }
            },
        }
    }
}
