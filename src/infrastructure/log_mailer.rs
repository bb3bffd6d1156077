use crate::domain::confirmation::Dispatch;
use crate::domain::ports::{DeliveryReport, Mailer};
use crate::error::Result;
use crate::interfaces::email::{ConfirmationEmail, EmailTemplate};
use async_trait::async_trait;
use tracing::info;

/// A mailer that renders each message and logs its link instead of sending it.
///
/// Used for local development and as the fallback when no SMTP transport is compiled in.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    template: EmailTemplate,
}

impl LogMailer {
    pub fn new(template: EmailTemplate) -> Self {
        Self { template }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, batch: &[Dispatch]) -> Result<DeliveryReport> {
        for dispatch in batch {
            let email = ConfirmationEmail::render(&self.template, dispatch);
            info!(to = %email.to, link = %email.link, "confirmation email (not sent)");
        }
        Ok(DeliveryReport {
            delivered: batch.len(),
            failures: Vec::new(),
        })
    }
}
