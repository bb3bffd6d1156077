use super::actor::Command;
use crate::domain::confirmation::{StatusSnapshot, Token};
use crate::error::{ConfirmError, Result};
use tokio::sync::{mpsc, oneshot};

/// Caller-side handle to the confirmation actor.
///
/// Holds no state of its own: every call is one round trip through the actor's
/// queue. Cheap to clone and share between tasks.
#[derive(Debug, Clone)]
pub struct ConfirmationProducer {
    sender: mpsc::UnboundedSender<Command>,
}

impl ConfirmationProducer {
    pub(crate) fn new(sender: mpsc::UnboundedSender<Command>) -> Self {
        Self { sender }
    }

    /// Starts a confirmation cycle for `address`.
    ///
    /// Returns `false` when the previous email went out less than the resend
    /// window ago. An address that is already confirmed reports `true`.
    pub async fn request_confirmation(&self, address: impl Into<String>) -> Result<bool> {
        let address = address.into();
        self.call(|reply| Command::Request { address, reply }).await
    }

    /// Returns `None` if `address` was never requested (or was already reported confirmed).
    pub async fn check_status(&self, address: impl Into<String>) -> Result<Option<StatusSnapshot>> {
        let address = address.into();
        self.call(|reply| Command::Status { address, reply }).await
    }

    /// Redeems a token from a confirmation link. `false` for unknown or spent tokens.
    pub async fn confirm_token(&self, token: impl Into<Token>) -> Result<bool> {
        let token = token.into();
        self.call(|reply| Command::Confirm { token, reply }).await
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .map_err(|_| ConfirmError::ActorUnavailable)?;
        response.await.map_err(|_| ConfirmError::ActorUnavailable)
    }
}
