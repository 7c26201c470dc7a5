use button_api::prelude::*;
use solana_sdk::pubkey::Pubkey;

use crate::{backend::AccountSource, Error, Result};

/// Fetches and decodes a button account. Fails with [`Error::NotFound`] if it does not exist.
pub async fn fetch_account<T: ButtonAccount>(
    source: &impl AccountSource,
    address: &Pubkey,
) -> Result<T> {
    let account = source
        .fetch(address)
        .await?
        .ok_or(Error::NotFound(*address))?;
    T::try_from_bytes(&account.data).map_err(|err| {
        tracing::warn!(%address, account = T::NAME, %err, "failed to decode account");
        Error::decode(*address, err)
    })
}

pub async fn fetch_registry(source: &impl AccountSource) -> Result<Registry> {
    fetch_account(source, &GLOBAL_ADDRESS).await
}

pub async fn fetch_round(source: &impl AccountSource, round_id: u64) -> Result<Round> {
    fetch_account(source, &round_pda(round_id).0).await
}

pub async fn fetch_vault(source: &impl AccountSource, round_id: u64) -> Result<Vault> {
    fetch_account(source, &vault_pda(round_id).0).await
}

/// Fetches a round and its vault.
pub async fn fetch_round_and_vault(
    source: &impl AccountSource,
    round_id: u64,
) -> Result<(Round, Vault)> {
    let round = fetch_round(source, round_id).await?;
    let vault = fetch_vault(source, round_id).await?;
    Ok((round, vault))
}

/// Which rounds a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundFilter {
    pub include_ended: bool,
}

impl RoundFilter {
    pub fn matches(&self, round: &Round, now: i64) -> bool {
        self.include_ended || !round.is_ended(now)
    }
}

/// Lists every round of the program ordered by id.
///
/// Accounts that fail to decode are logged and skipped so that one bad
/// record does not hide the others.
pub async fn fetch_rounds(
    source: &impl AccountSource,
    filter: RoundFilter,
    now: i64,
) -> Result<Vec<(Pubkey, Round)>> {
    let accounts = source.fetch_program_accounts(Round::DISCRIMINATOR).await?;
    let mut rounds = accounts
        .into_iter()
        .filter_map(|(address, account)| match Round::try_from_bytes(&account.data) {
            Ok(round) => Some((address, round)),
            Err(err) => {
                tracing::warn!(%address, %err, "skipping undecodable round");
                None
            }
        })
        .filter(|(_, round)| filter.matches(round, now))
        .collect::<Vec<_>>();
    rounds.sort_by_key(|(_, round)| round.round_id);
    Ok(rounds)
}
