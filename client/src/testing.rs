//! In-memory collaborators for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
};

use button_api::prelude::*;
use futures_util::StreamExt;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    backend::{
        AccountSource, AccountStream, AccountSubscriber, Confirmation, Confirmer, RawAccount,
        Wallet,
    },
    clock::Clock,
    error::RejectReason,
    Error, Result,
};

pub(crate) fn fresh_round(round_id: u64) -> Round {
    Round {
        last_clicker: Round::NO_CLICKER,
        round_id,
        click_count: 0,
        is_active: true,
        has_ended: false,
        last_click_timestamp: None,
        round_duration_seconds: 600,
    }
}

pub(crate) fn clicked_round(round_id: u64, clicker: Pubkey, at: i64) -> Round {
    Round {
        last_clicker: clicker,
        click_count: 1,
        last_click_timestamp: Some(at),
        ..fresh_round(round_id)
    }
}

pub(crate) fn vault(round_id: u64, balance: u64, deposit_amount: u64) -> Vault {
    Vault {
        round_id,
        balance,
        deposit_amount,
    }
}

fn encode<T: ButtonAccount>(account: &T) -> Vec<u8> {
    let mut data = account.to_bytes().unwrap();
    data.resize(T::SIZE, 0);
    data
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, RawAccount>,
    subscribers: HashMap<Pubkey, Vec<mpsc::UnboundedSender<Vec<u8>>>>,
    subscribe_calls: usize,
    stalled: HashSet<Pubkey>,
    confirmation: Option<Confirmation>,
    confirm_calls: usize,
}

/// Account storage, notifications and confirmations held in memory.
#[derive(Default)]
pub(crate) struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub(crate) fn put_raw(&self, address: Pubkey, data: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.accounts.entry(address).or_default().data = data;
    }

    pub(crate) fn put_registry(&self, registry: &Registry) {
        self.put_raw(GLOBAL_ADDRESS, encode(registry));
    }

    pub(crate) fn put_round(&self, round: &Round) {
        self.put_raw(round.pda().0, encode(round));
    }

    pub(crate) fn put_vault(&self, vault: &Vault) {
        self.put_raw(vault.pda().0, encode(vault));
    }

    pub(crate) fn set_lamports(&self, address: Pubkey, lamports: u64) {
        let mut state = self.state.lock().unwrap();
        state.accounts.entry(address).or_default().lamports = lamports;
    }

    /// Stores `data` and pushes it to every live subscriber of `address`.
    pub(crate) fn notify(&self, address: Pubkey, data: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.accounts.entry(address).or_default().data = data.clone();
        if let Some(senders) = state.subscribers.get_mut(&address) {
            senders.retain(|sender| sender.send(data.clone()).is_ok());
        }
    }

    /// Pushes `data` to subscribers without touching stored state.
    pub(crate) fn notify_raw(&self, address: Pubkey, data: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        if let Some(senders) = state.subscribers.get_mut(&address) {
            senders.retain(|sender| sender.send(data.clone()).is_ok());
        }
    }

    /// Ends every subscription to `address`.
    pub(crate) fn close(&self, address: Pubkey) {
        self.state.lock().unwrap().subscribers.remove(&address);
    }

    pub(crate) fn live_subscribers(&self, address: &Pubkey) -> usize {
        let state = self.state.lock().unwrap();
        state
            .subscribers
            .get(address)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    /// Makes every later subscription to `address` hang forever.
    pub(crate) fn stall_subscriptions(&self, address: Pubkey) {
        self.state.lock().unwrap().stalled.insert(address);
    }

    pub(crate) fn subscribe_calls(&self) -> usize {
        self.state.lock().unwrap().subscribe_calls
    }

    pub(crate) fn set_confirmation(&self, confirmation: Confirmation) {
        self.state.lock().unwrap().confirmation = Some(confirmation);
    }

    pub(crate) fn confirm_calls(&self) -> usize {
        self.state.lock().unwrap().confirm_calls
    }
}

impl AccountSource for MockLedger {
    async fn fetch(&self, address: &Pubkey) -> Result<Option<RawAccount>> {
        Ok(self.state.lock().unwrap().accounts.get(address).cloned())
    }

    async fn fetch_program_accounts(
        &self,
        discriminator: [u8; 8],
    ) -> Result<Vec<(Pubkey, RawAccount)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .filter(|(_, account)| account.data.starts_with(&discriminator))
            .map(|(address, account)| (*address, account.clone()))
            .collect())
    }
}

impl AccountSubscriber for MockLedger {
    async fn subscribe(&self, address: Pubkey) -> Result<AccountStream> {
        let stalled = self.state.lock().unwrap().stalled.contains(&address);
        if stalled {
            std::future::pending::<()>().await;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        state.subscribe_calls += 1;
        state.subscribers.entry(address).or_default().push(tx);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

impl Confirmer for MockLedger {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_from_array([7; 32]))
    }

    async fn confirm(&self, _signature: &Signature) -> Result<Confirmation> {
        let mut state = self.state.lock().unwrap();
        state.confirm_calls += 1;
        Ok(state
            .confirmation
            .clone()
            .unwrap_or(Confirmation::Confirmed))
    }
}

/// How [`MockWallet`] answers a signing request.
#[derive(Debug, Clone)]
pub(crate) enum WalletBehavior {
    Approve,
    Refuse,
    Reject(RejectReason),
}

pub(crate) struct MockWallet {
    identity: Pubkey,
    behavior: Mutex<WalletBehavior>,
    sent: Mutex<Vec<Transaction>>,
}

impl MockWallet {
    pub(crate) fn new(identity: Pubkey) -> Self {
        Self {
            identity,
            behavior: Mutex::new(WalletBehavior::Approve),
            sent: Mutex::default(),
        }
    }

    pub(crate) fn set_behavior(&self, behavior: WalletBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub(crate) fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }
}

impl Wallet for MockWallet {
    fn identity(&self) -> Pubkey {
        self.identity
    }

    async fn sign_and_send(&self, transaction: Transaction) -> Result<Signature> {
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            WalletBehavior::Approve => {
                let mut sent = self.sent.lock().unwrap();
                sent.push(transaction);
                Ok(Signature::from([sent.len() as u8; 64]))
            }
            WalletBehavior::Refuse => Err(Error::Authorization("user declined".to_string())),
            WalletBehavior::Reject(reason) => Err(Error::Rejected(reason)),
        }
    }
}

/// A clock that only moves when told to.
pub(crate) struct FixedClock(AtomicI64);

impl FixedClock {
    pub(crate) fn new(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub(crate) fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
