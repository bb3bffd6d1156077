//! Application layer hosting the confirmation actor.
//!
//! `ConfirmationActor` owns all confirmation state and serves commands from an
//! unbounded `tokio` channel one at a time, interleaved with its periodic batch
//! dispatch. `ConfirmationProducer` is the stateless handle callers use to reach it.

pub mod actor;
pub mod producer;

pub use actor::{ConfirmationActor, spawn};
pub use producer::ConfirmationProducer;
