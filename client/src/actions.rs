use std::sync::Arc;

use button_api::prelude::*;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction, instruction::Instruction, message::Message,
    pubkey::Pubkey, signature::Signature, transaction::Transaction,
};

use crate::{
    accounts::{fetch_registry, fetch_round, fetch_round_and_vault},
    backend::{AccountSource, Confirmation, Confirmer, Wallet},
    clock::{Clock, SystemClock},
    config::ClientConfig,
    error::RejectReason,
    Error, Result,
};

/// Checks whether `user` may click `round` at `now`.
pub fn check_click(round: &Round, user: &Pubkey, now: i64) -> std::result::Result<(), RejectReason> {
    if !round.is_active || round.is_ended(now) {
        return Err(RejectReason::RoundNotActive);
    }
    if round.is_leader(user) {
        return Err(RejectReason::AlreadyLastClicker);
    }
    Ok(())
}

/// Checks whether `user` may claim the pool of `round` at `now`.
pub fn check_claim(
    round: &Round,
    vault: &Vault,
    user: &Pubkey,
    now: i64,
) -> std::result::Result<(), RejectReason> {
    if !round.is_leader(user) {
        return Err(RejectReason::NotWinner);
    }
    if !round.is_ended(now) {
        return Err(RejectReason::RoundInProgress);
    }
    if vault.is_empty() {
        return Err(RejectReason::AlreadyClaimed);
    }
    Ok(())
}

/// Builds, signs and confirms the state-changing actions of a round.
///
/// Nothing is cached here: every action reads fresh records, and the new
/// on-chain state only reaches the client through [`LiveSync`](crate::LiveSync).
pub struct ActionSubmitter<L, W, C = SystemClock> {
    ledger: Arc<L>,
    wallet: Arc<W>,
    clock: C,
    compute_unit_limit: Option<u32>,
    compute_unit_price: Option<u64>,
}

impl<L, W> ActionSubmitter<L, W> {
    pub fn new(ledger: Arc<L>, wallet: Arc<W>) -> Self {
        Self::with_clock(ledger, wallet, SystemClock)
    }
}

impl<L, W, C> ActionSubmitter<L, W, C> {
    pub fn with_clock(ledger: Arc<L>, wallet: Arc<W>, clock: C) -> Self {
        Self {
            ledger,
            wallet,
            clock,
            compute_unit_limit: None,
            compute_unit_price: None,
        }
    }

    /// Applies the compute budget settings of `config`.
    pub fn configure(mut self, config: &ClientConfig) -> Self {
        self.compute_unit_limit = config.compute_unit_limit;
        self.compute_unit_price = config.compute_unit_price;
        self
    }

    fn compute_budget_instructions(&self) -> Vec<Instruction> {
        let mut instructions = Vec::with_capacity(3);
        if let Some(limit) = self.compute_unit_limit {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
        }
        if let Some(price) = self.compute_unit_price {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
        }
        instructions
    }
}

impl<L, W, C> ActionSubmitter<L, W, C>
where
    L: AccountSource + Confirmer,
    W: Wallet,
    C: Clock,
{
    pub fn identity(&self) -> Pubkey {
        self.wallet.identity()
    }

    /// Clicks the button of round `round_id`, depositing the vault's stake.
    pub async fn click(&self, round_id: u64) -> Result<Signature> {
        let (round, vault) = fetch_round_and_vault(self.ledger.as_ref(), round_id).await?;
        let user = self.wallet.identity();
        check_click(&round, &user, self.clock.unix_timestamp())?;

        let balance = self
            .ledger
            .fetch(&user)
            .await?
            .map(|account| account.lamports)
            .unwrap_or_default();
        if balance < vault.deposit_amount {
            return Err(RejectReason::InsufficientFunds.into());
        }

        let ix = click_button(user, round_id, vault.deposit_amount);
        self.submit("click", ix).await
    }

    /// Clicks the round the registry currently marks as active.
    pub async fn click_active(&self) -> Result<Signature> {
        let registry = fetch_registry(self.ledger.as_ref()).await?;
        let round_id = registry
            .active_round_id
            .ok_or(RejectReason::RoundNotActive)?;
        self.click(round_id).await
    }

    /// Withdraws the pool of an ended round to its leader.
    pub async fn claim_reward(&self, round_id: u64) -> Result<Signature> {
        let (round, vault) = fetch_round_and_vault(self.ledger.as_ref(), round_id).await?;
        let user = self.wallet.identity();
        check_claim(&round, &vault, &user, self.clock.unix_timestamp())?;

        let ix = claim_reward(user, round_id);
        self.submit("claim_reward", ix).await
    }

    /// Asks the program to persist the end of a timed out round.
    ///
    /// Returns `None` without submitting when the round is already marked as ended.
    pub async fn verify_round_state(&self, round_id: u64) -> Result<Option<Signature>> {
        let round = fetch_round(self.ledger.as_ref(), round_id).await?;
        if round.has_ended {
            tracing::debug!(round_id, "round already marked as ended");
            return Ok(None);
        }
        let ix = verify_game_state(round_id);
        self.submit("verify_round_state", ix).await.map(Some)
    }

    async fn submit(&self, action: &'static str, instruction: Instruction) -> Result<Signature> {
        let payer = self.wallet.identity();
        let mut instructions = self.compute_budget_instructions();
        instructions.push(instruction);

        let blockhash = self.ledger.latest_blockhash().await?;
        let message = Message::new_with_blockhash(&instructions, Some(&payer), &blockhash);
        let transaction = Transaction::new_unsigned(message);

        let signature = match self.wallet.sign_and_send(transaction).await {
            Ok(signature) => signature,
            Err(err) => {
                tracing::warn!(action, %err, "transaction not submitted");
                return Err(err);
            }
        };
        tracing::info!(action, %signature, "transaction submitted");

        match self.ledger.confirm(&signature).await? {
            Confirmation::Confirmed => {
                tracing::info!(action, %signature, "transaction confirmed");
                Ok(signature)
            }
            Confirmation::Failed(err) => {
                tracing::warn!(action, %signature, %err, "transaction failed");
                Err(Error::Rejected(RejectReason::from(&err)))
            }
            Confirmation::TimedOut => {
                tracing::warn!(action, %signature, "confirmation timed out");
                Err(Error::TimedOut(signature))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::{instruction::InstructionError, transaction::TransactionError};

    use super::*;
    use crate::testing::*;

    const NOW: i64 = 1_700_000_000;
    const DEPOSIT: u64 = 100_000_000;

    struct Setup {
        ledger: Arc<MockLedger>,
        wallet: Arc<MockWallet>,
        submitter: ActionSubmitter<MockLedger, MockWallet, Arc<FixedClock>>,
        clock: Arc<FixedClock>,
        user: Pubkey,
    }

    fn setup() -> Setup {
        let user = Pubkey::new_unique();
        let ledger = Arc::new(MockLedger::default());
        let wallet = Arc::new(MockWallet::new(user));
        let clock = Arc::new(FixedClock::new(NOW));
        ledger.set_lamports(user, 10 * DEPOSIT);
        let submitter = ActionSubmitter::with_clock(ledger.clone(), wallet.clone(), clock.clone());
        Setup {
            ledger,
            wallet,
            submitter,
            clock,
            user,
        }
    }

    fn program_ix(transaction: &Transaction) -> Instruction {
        let message = &transaction.message;
        let compiled = message
            .instructions
            .iter()
            .find(|ix| message.account_keys[ix.program_id_index as usize] == button_api::ID)
            .expect("button instruction");
        Instruction {
            program_id: button_api::ID,
            accounts: vec![],
            data: compiled.data.clone(),
        }
    }

    #[tokio::test]
    async fn test_click() -> anyhow::Result<()> {
        let s = setup();
        let round = clicked_round(1, Pubkey::new_unique(), NOW - 30);
        s.ledger.put_round(&round);
        s.ledger.put_vault(&vault(1, DEPOSIT, DEPOSIT));

        s.submitter.click(1).await?;

        let sent = s.wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.account_keys[0], s.user);
        let ix = program_ix(&sent[0]);
        assert_eq!(
            ButtonInstruction::from_data(&ix.data),
            Some(ButtonInstruction::ClickButton)
        );
        assert_eq!(&ix.data[8..], &DEPOSIT.to_le_bytes());
        assert!(sent[0].message.account_keys.contains(&round_pda(1).0));

        // No optimistic update: the cached view only changes through sync.
        let (after, _) = fetch_round_and_vault(s.ledger.as_ref(), 1).await?;
        assert_eq!(after, round);
        Ok(())
    }

    #[tokio::test]
    async fn test_first_click() -> anyhow::Result<()> {
        let s = setup();
        s.ledger.put_round(&fresh_round(0));
        s.ledger.put_vault(&vault(0, 0, DEPOSIT));
        s.submitter.click(0).await?;
        assert_eq!(s.wallet.sent().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_click_ended_round() {
        let s = setup();
        s.ledger
            .put_round(&clicked_round(1, Pubkey::new_unique(), NOW - 700));
        s.ledger.put_vault(&vault(1, DEPOSIT, DEPOSIT));

        let err = s.submitter.click(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::RoundNotActive));
        assert!(s.wallet.sent().is_empty());

        let mut finalized = clicked_round(1, Pubkey::new_unique(), NOW);
        finalized.has_ended = true;
        s.ledger.put_round(&finalized);
        let err = s.submitter.click(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::RoundNotActive));
    }

    #[tokio::test]
    async fn test_click_as_leader() {
        let s = setup();
        s.ledger.put_round(&clicked_round(1, s.user, NOW - 5));
        s.ledger.put_vault(&vault(1, DEPOSIT, DEPOSIT));
        let err = s.submitter.click(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::AlreadyLastClicker));
        assert!(s.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn test_click_insufficient_funds() {
        let s = setup();
        s.ledger.put_round(&fresh_round(2));
        s.ledger.put_vault(&vault(2, 0, DEPOSIT));
        s.ledger.set_lamports(s.user, DEPOSIT - 1);
        let err = s.submitter.click(2).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::InsufficientFunds));
        assert!(s.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn test_click_missing_round() {
        let s = setup();
        let err = s.submitter.click(5).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_click_rejected_by_program() {
        let s = setup();
        s.ledger.put_round(&fresh_round(1));
        s.ledger.put_vault(&vault(1, 0, DEPOSIT));
        s.ledger.set_confirmation(Confirmation::Failed(
            TransactionError::InstructionError(0, InstructionError::Custom(6004)),
        ));
        let err = s.submitter.click(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::RoundNotActive));
    }

    #[tokio::test]
    async fn test_click_active() -> anyhow::Result<()> {
        let s = setup();
        let mut registry = Registry {
            authority: Pubkey::new_unique(),
            next_round_id: 4,
            active_round_id: None,
        };
        s.ledger.put_registry(&registry);
        let err = s.submitter.click_active().await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::RoundNotActive));

        registry.active_round_id = Some(3);
        s.ledger.put_registry(&registry);
        s.ledger.put_round(&fresh_round(3));
        s.ledger.put_vault(&vault(3, 0, DEPOSIT));
        s.submitter.click_active().await?;
        let sent = s.wallet.sent();
        assert!(sent[0].message.account_keys.contains(&vault_pda(3).0));
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_by_other_user() {
        let s = setup();
        s.ledger
            .put_round(&clicked_round(1, Pubkey::new_unique(), NOW - 700));
        s.ledger.put_vault(&vault(1, 5 * DEPOSIT, DEPOSIT));
        let err = s.submitter.claim_reward(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::NotWinner));
        assert!(s.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn test_claim_while_running() {
        let s = setup();
        s.ledger.put_round(&clicked_round(1, s.user, NOW - 10));
        s.ledger.put_vault(&vault(1, DEPOSIT, DEPOSIT));
        let err = s.submitter.claim_reward(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::RoundInProgress));

        // Once the countdown is over the leader may claim.
        s.clock.set(NOW + 600);
        assert!(s.submitter.claim_reward(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_claim_once() -> anyhow::Result<()> {
        let s = setup();
        s.ledger.put_round(&clicked_round(1, s.user, NOW - 700));
        s.ledger.put_vault(&vault(1, 3 * DEPOSIT, DEPOSIT));

        s.submitter.claim_reward(1).await?;
        let sent = s.wallet.sent();
        assert_eq!(
            ButtonInstruction::from_data(&program_ix(&sent[0]).data),
            Some(ButtonInstruction::ClaimReward)
        );

        // The program drained the vault.
        s.ledger.put_vault(&vault(1, 0, DEPOSIT));
        let err = s.submitter.claim_reward(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::AlreadyClaimed));
        assert_eq!(s.wallet.sent().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_round_state() -> anyhow::Result<()> {
        let s = setup();
        s.ledger
            .put_round(&clicked_round(1, Pubkey::new_unique(), NOW - 700));
        let signature = s.submitter.verify_round_state(1).await?;
        assert!(signature.is_some());
        let sent = s.wallet.sent();
        assert_eq!(
            ButtonInstruction::from_data(&program_ix(&sent[0]).data),
            Some(ButtonInstruction::VerifyGameState)
        );

        let mut ended = clicked_round(1, Pubkey::new_unique(), NOW - 700);
        ended.has_ended = true;
        s.ledger.put_round(&ended);
        assert_eq!(s.submitter.verify_round_state(1).await?, None);
        assert_eq!(s.submitter.verify_round_state(1).await?, None);
        assert_eq!(s.wallet.sent().len(), 1);

        assert!(s.submitter.verify_round_state(8).await.unwrap_err().is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_wallet_refusal() {
        let s = setup();
        s.ledger.put_round(&fresh_round(1));
        s.ledger.put_vault(&vault(1, 0, DEPOSIT));
        s.wallet.set_behavior(WalletBehavior::Refuse);
        let err = s.submitter.click(1).await.unwrap_err();
        assert!(matches!(err, Error::Authorization(_)));
        assert_eq!(s.ledger.confirm_calls(), 0);

        s.wallet
            .set_behavior(WalletBehavior::Reject(RejectReason::InsufficientFunds));
        let err = s.submitter.click(1).await.unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::InsufficientFunds));
        assert_eq!(s.ledger.confirm_calls(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_timeout() {
        let s = setup();
        s.ledger.put_round(&fresh_round(1));
        s.ledger.put_vault(&vault(1, 0, DEPOSIT));
        s.ledger.set_confirmation(Confirmation::TimedOut);
        let err = s.submitter.click(1).await.unwrap_err();
        assert!(matches!(err, Error::TimedOut(_)));
        assert_eq!(s.ledger.confirm_calls(), 1);
    }

    #[tokio::test]
    async fn test_compute_budget() -> anyhow::Result<()> {
        let user = Pubkey::new_unique();
        let ledger = Arc::new(MockLedger::default());
        let wallet = Arc::new(MockWallet::new(user));
        ledger.set_lamports(user, DEPOSIT);
        ledger.put_round(&fresh_round(1));
        ledger.put_vault(&vault(1, 0, DEPOSIT));
        let config = ClientConfig {
            compute_unit_limit: Some(200_000),
            compute_unit_price: Some(1_000),
            ..Default::default()
        };
        let submitter =
            ActionSubmitter::with_clock(ledger, wallet.clone(), FixedClock::new(NOW))
                .configure(&config);
        submitter.click(1).await?;
        assert_eq!(wallet.sent()[0].message.instructions.len(), 3);
        Ok(())
    }

    #[test]
    fn test_preconditions() {
        let user = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let round = clicked_round(1, other, NOW);
        assert_eq!(check_click(&round, &user, NOW + 10), Ok(()));
        assert_eq!(
            check_click(&round, &other, NOW + 10),
            Err(RejectReason::AlreadyLastClicker)
        );
        assert_eq!(
            check_click(&round, &user, NOW + 600),
            Err(RejectReason::RoundNotActive)
        );
        let inactive = Round {
            is_active: false,
            ..round
        };
        assert_eq!(
            check_click(&inactive, &user, NOW + 10),
            Err(RejectReason::RoundNotActive)
        );

        let full = vault(1, 10, 10);
        assert_eq!(
            check_claim(&round, &full, &user, NOW + 600),
            Err(RejectReason::NotWinner)
        );
        assert_eq!(check_claim(&round, &full, &other, NOW + 600), Ok(()));
        assert_eq!(
            check_claim(&fresh_round(1), &full, &Round::NO_CLICKER, NOW),
            Err(RejectReason::NotWinner)
        );
    }
}
