//! Client for the button game: account access, live sync, countdown and
//! transaction submission.

pub mod accounts;
pub mod actions;
pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod pubsub;
pub mod rpc;
pub mod sync;
pub mod ticker;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use accounts::{fetch_rounds, RoundFilter};
pub use actions::ActionSubmitter;
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use error::{Error, RejectReason};
pub use pubsub::PubsubBackend;
pub use rpc::RpcBackend;
pub use sync::{LiveSync, Snapshot, Watched};
pub use ticker::CountdownTicker;
pub use wallet::KeypairWallet;

pub use button_api;

/// Result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
