use crate::config::SmtpConfig;
use crate::domain::confirmation::Dispatch;
use crate::domain::ports::{DeliveryReport, Mailer};
use crate::error::{ConfirmError, Result};
use crate::interfaces::email::{ConfirmationEmail, EmailTemplate};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

/// Delivers confirmation emails through an authenticated STARTTLS relay.
///
/// A transport is built and dropped per batch, so no connection outlives a
/// dispatch cycle.
pub struct SmtpMailer {
    config: SmtpConfig,
    template: EmailTemplate,
    from: Mailbox,
}

impl SmtpMailer {
    /// Fails if the template's sender is not a valid mailbox.
    pub fn new(config: SmtpConfig, template: EmailTemplate) -> Result<Self> {
        let from = template
            .from
            .parse()
            .map_err(|e| ConfirmError::Config(format!("invalid sender {}: {e}", template.from)))?;
        Ok(Self {
            config,
            template,
            from,
        })
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| ConfirmError::Delivery(e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();
        Ok(transport)
    }

    fn build_message(&self, email: &ConfirmationEmail) -> Result<Message> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| ConfirmError::Delivery(format!("invalid recipient: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| ConfirmError::Delivery(e.to_string()))
    }

    /// Renders every item; the ones that cannot become a message go straight into `report`.
    fn prepare(&self, batch: &[Dispatch], report: &mut DeliveryReport) -> Vec<(String, Message)> {
        let mut messages = Vec::with_capacity(batch.len());
        for dispatch in batch {
            let email = ConfirmationEmail::render(&self.template, dispatch);
            match self.build_message(&email) {
                Ok(message) => messages.push((email.to, message)),
                Err(e) => {
                    warn!(to = %email.to, error = %e, "could not build confirmation email");
                    report.record_failure(&email.to, e);
                }
            }
        }
        messages
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, batch: &[Dispatch]) -> Result<DeliveryReport> {
        let transport = self.transport()?;
        match transport.test_connection().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(ConfirmError::Delivery(format!(
                    "relay {}:{} rejected the connection",
                    self.config.host, self.config.port
                )));
            }
            Err(e) => return Err(ConfirmError::Delivery(e.to_string())),
        }

        let mut report = DeliveryReport::default();
        for (to, message) in self.prepare(batch, &mut report) {
            match transport.send(message).await {
                Ok(_) => {
                    debug!(%to, "confirmation email sent");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(%to, error = %e, "SMTP error");
                    report.record_failure(to, e);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::confirmation::Token;

    fn template() -> EmailTemplate {
        EmailTemplate {
            link_base: "https://confirm.test/?token=".to_string(),
            ..Default::default()
        }
    }

    fn dispatch(address: &str, token: &str) -> Dispatch {
        Dispatch {
            address: address.to_string(),
            token: Token::from(token),
        }
    }

    #[test]
    fn test_invalid_sender_fails_at_construction() {
        let template = EmailTemplate {
            from: "not a mailbox".to_string(),
            ..template()
        };
        let result = SmtpMailer::new(SmtpConfig::default(), template);
        assert!(matches!(result, Err(ConfirmError::Config(_))));
    }

    #[test]
    fn test_invalid_recipient_is_a_per_item_failure() {
        let mailer = SmtpMailer::new(SmtpConfig::default(), template()).unwrap();
        let batch = vec![
            dispatch("a@x.com", "good"),
            dispatch("not an address", "bad"),
        ];
        let mut report = DeliveryReport::default();

        let messages = mailer.prepare(&batch, &mut report);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "a@x.com");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].address, "not an address");
        assert!(report.failures[0].reason.contains("invalid recipient"));
    }

    #[test]
    fn test_message_carries_confirmation_link() {
        let mailer = SmtpMailer::new(SmtpConfig::default(), template()).unwrap();
        let email = ConfirmationEmail::render(&mailer.template, &dispatch("a@x.com", "abc123"));

        let message = mailer.build_message(&email).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("https://confirm.test/?token=abc123"));
        assert!(raw.contains("To: a@x.com"));
    }

    #[tokio::test]
    async fn test_unreachable_relay_fails_whole_batch() {
        let config = SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            username: "sender@example.com".to_string(),
            password: "secret".to_string(),
        };
        let mailer = SmtpMailer::new(config, template()).unwrap();

        let result = mailer
            .deliver(&[dispatch("a@x.com", "t1"), dispatch("b@x.com", "t2")])
            .await;

        assert!(matches!(result, Err(ConfirmError::Delivery(_))));
    }
}
