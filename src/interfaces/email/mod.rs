//! Rendering of the outbound confirmation message.

pub mod template;

pub use template::{ConfirmationEmail, EmailTemplate};
