use std::time::Duration;

use button_api::prelude::*;
use solana_sdk::pubkey::Pubkey;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{clock::Clock, sync::Watched};

/// Once-per-second countdown over a watched round.
///
/// Ticks are derived from the cached record and never hit the network. The
/// ticker stops by itself after reporting an ended round and is aborted when
/// dropped, so a torn down view cannot leak it.
pub struct CountdownTicker {
    task: JoinHandle<()>,
}

impl CountdownTicker {
    pub const PERIOD: Duration = Duration::from_secs(1);

    /// Starts ticking. `user` decides the leader flag of each reported status.
    pub fn spawn<C, F>(
        round: Watched<Round>,
        clock: C,
        user: Option<Pubkey>,
        mut on_tick: F,
    ) -> Self
    where
        C: Clock + 'static,
        F: FnMut(RoundStatus) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Self::PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(current) = round.current() else {
                    continue;
                };
                let status = current.status(clock.unix_timestamp(), user.as_ref());
                let ended = status.is_ended;
                on_tick(status);
                if ended {
                    tracing::debug!(round_id = current.round_id, "countdown finished");
                    break;
                }
            }
        });
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops ticking.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
