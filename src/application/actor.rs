use super::producer::ConfirmationProducer;
use crate::config::ServiceConfig;
use crate::domain::confirmation::{Dispatch, StatusSnapshot, Token};
use crate::domain::ports::{DeliveryReport, MailerBox};
use crate::domain::registry::ConfirmationRegistry;
use crate::error::{ConfirmError, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, info, instrument, warn};

/// Messages understood by the confirmation actor. Each carries its own reply slot.
#[derive(Debug)]
pub(crate) enum Command {
    Request {
        address: String,
        reply: oneshot::Sender<bool>,
    },
    Status {
        address: String,
        reply: oneshot::Sender<Option<StatusSnapshot>>,
    },
    Confirm {
        token: Token,
        reply: oneshot::Sender<bool>,
    },
}

/// The single owner of confirmation state.
///
/// Commands are served one at a time in arrival order. The periodic dispatch
/// cycle runs on the same task, so a batch scan and its `sent` marking never
/// interleave with a command.
pub struct ConfirmationActor {
    receiver: mpsc::UnboundedReceiver<Command>,
    registry: ConfirmationRegistry,
    mailer: MailerBox,
    config: ServiceConfig,
}

impl ConfirmationActor {
    /// Creates the actor and the producer handle that talks to it.
    pub fn new(config: ServiceConfig, mailer: MailerBox) -> Result<(Self, ConfirmationProducer)> {
        config.validate()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Self {
            receiver,
            registry: ConfirmationRegistry::new(config.resend_window),
            mailer,
            config,
        };
        Ok((actor, ConfirmationProducer::new(sender)))
    }

    /// Runs until every producer handle has been dropped.
    #[instrument(name = "confirmation_actor", skip(self))]
    pub async fn run(mut self) {
        info!(
            dispatch_interval = ?self.config.dispatch_interval,
            resend_window = ?self.config.resend_window,
            "confirmation actor starting"
        );

        let period = self.config.dispatch_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = ticker.tick() => self.dispatch().await,
            }
        }

        info!(live_records = self.registry.len(), "confirmation actor stopped");
    }

    fn handle(&mut self, command: Command) {
        let now = Instant::now();
        match command {
            Command::Request { address, reply } => {
                let accepted = self.registry.request(&address, now);
                debug!(%address, accepted, "confirmation requested");
                let _ = reply.send(accepted);
            }
            Command::Status { address, reply } => {
                let status = self.registry.status(&address, now);
                debug!(%address, ?status, "status checked");
                let _ = reply.send(status);
            }
            Command::Confirm { token, reply } => {
                let confirmed = self.registry.confirm(&token);
                debug!(confirmed, "token redeemed");
                let _ = reply.send(confirmed);
            }
        }
    }

    /// One dispatch cycle: collect unsent records, hand them to the mailer,
    /// then mark every one of them attempted whatever the outcome.
    async fn dispatch(&mut self) {
        let batch = self.registry.pending_batch();
        if batch.is_empty() {
            return;
        }
        info!(size = batch.len(), "dispatching confirmation batch");

        match self.deliver(&batch).await {
            Ok(report) => {
                for failure in &report.failures {
                    warn!(address = %failure.address, reason = %failure.reason, "delivery failed");
                }
                info!(
                    delivered = report.delivered,
                    failed = report.failures.len(),
                    "confirmation batch delivered"
                );
            }
            Err(e) => warn!(size = batch.len(), error = %e, "confirmation batch failed"),
        }

        self.registry.mark_attempted(&batch, Instant::now());
    }

    async fn deliver(&self, batch: &[Dispatch]) -> Result<DeliveryReport> {
        let delivery = self.mailer.deliver(batch);
        match self.config.delivery_timeout {
            Some(limit) => timeout(limit, delivery).await.unwrap_or_else(|_| {
                Err(ConfirmError::Delivery(format!(
                    "batch delivery timed out after {limit:?}"
                )))
            }),
            None => delivery.await,
        }
    }
}

/// Starts a confirmation actor on the current runtime.
pub fn spawn(
    config: ServiceConfig,
    mailer: MailerBox,
) -> Result<(ConfirmationProducer, JoinHandle<()>)> {
    let (actor, producer) = ConfirmationActor::new(config, mailer)?;
    Ok((producer, tokio::spawn(actor.run())))
}
