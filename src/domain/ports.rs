use super::confirmation::Dispatch;
use crate::error::Result;
use async_trait::async_trait;

/// A single item the mailer could not deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub address: String,
    pub reason: String,
}

/// Per-item outcome of one batch delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn record_failure(&mut self, address: impl Into<String>, reason: impl ToString) {
        self.failures.push(DeliveryFailure {
            address: address.into(),
            reason: reason.to_string(),
        });
    }
}

/// Sends confirmation links for a batch of `(address, token)` pairs.
///
/// An `Err` means the whole batch could not be attempted (for example the
/// transport refused the connection). Individual failures go in the report.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, batch: &[Dispatch]) -> Result<DeliveryReport>;
}

pub type MailerBox = Box<dyn Mailer>;
