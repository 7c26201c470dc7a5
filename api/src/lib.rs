pub mod consts;
pub mod error;
pub mod instruction;
pub mod sdk;
pub mod state;
pub mod status;

pub use error::{ButtonError, DecodeError};

pub mod prelude {
    pub use crate::consts::*;
    pub use crate::error::*;
    pub use crate::instruction::*;
    pub use crate::sdk::*;
    pub use crate::state::*;
    pub use crate::status::*;
}

solana_program::declare_id!("EGMzXToSqdq8PfSDergoQNEphopAF4EVsBzSapKU9JLi");
