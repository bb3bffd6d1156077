//! Delivery collaborators the confirmation actor can be wired to.

pub mod log_mailer;
#[cfg(feature = "smtp")]
pub mod smtp;
