use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};

use crate::{Error, Result};

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    /// Websocket endpoint for account subscriptions. Derived from `rpc_url` when unset.
    pub ws_url: Option<String>,
    pub commitment: CommitmentLevel,
    pub confirm_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub compute_unit_limit: Option<u32>,
    /// Priority fee in micro-lamports per compute unit.
    pub compute_unit_price: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            ws_url: None,
            commitment: CommitmentLevel::Confirmed,
            confirm_timeout_secs: 60,
            poll_interval_ms: 500,
            compute_unit_limit: None,
            compute_unit_price: None,
        }
    }
}

impl ClientConfig {
    /// Reads `BUTTON_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("BUTTON_RPC_URL") {
            config.rpc_url = url;
        }
        config.ws_url = lookup("BUTTON_WS_URL");
        if let Some(commitment) = lookup("BUTTON_COMMITMENT") {
            config.commitment = CommitmentLevel::from_str(&commitment)
                .map_err(|err| Error::Config(format!("BUTTON_COMMITMENT: {err}")))?;
        }
        if let Some(timeout) = lookup("BUTTON_CONFIRM_TIMEOUT_SECS") {
            config.confirm_timeout_secs = parse_number("BUTTON_CONFIRM_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(interval) = lookup("BUTTON_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_number("BUTTON_POLL_INTERVAL_MS", &interval)?;
        }
        if let Some(limit) = lookup("BUTTON_COMPUTE_UNIT_LIMIT") {
            config.compute_unit_limit = Some(parse_number("BUTTON_COMPUTE_UNIT_LIMIT", &limit)?);
        }
        if let Some(price) = lookup("BUTTON_PRIORITY_FEE") {
            config.compute_unit_price = Some(parse_number("BUTTON_PRIORITY_FEE", &price)?);
        }
        Ok(config)
    }

    pub fn commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ws_url(&self) -> String {
        match &self.ws_url {
            Some(url) => url.clone(),
            None => derive_ws_url(&self.rpc_url),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| Error::Config(format!("{key}: {err}")))
}

fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        rpc_url.to_string()
    }
}
