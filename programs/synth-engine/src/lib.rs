// Over-collateralized synthetic USD engine
// Collateral/debt ledgers, health factor and liquidation over external token capabilities

pub mod engine;
pub mod error;
pub mod events;
pub mod guard;
pub mod health;
pub mod instructions;
pub mod math;
pub mod oracle;
pub mod processor;
pub mod stage;
pub mod state;
pub mod token;

pub use engine::SynthEngine;
pub use error::{CapabilityError, ErrorKind, SynthEngineError};
