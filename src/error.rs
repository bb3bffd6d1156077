use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("confirmation actor is unavailable")]
    ActorUnavailable,
    #[error("Delivery error: {0}")]
    Delivery(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConfirmError>;
