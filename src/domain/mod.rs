//! Confirmation state and the ports it depends on.

pub mod confirmation;
pub mod ports;
pub mod registry;
