#![allow(dead_code)]

use async_trait::async_trait;
use mailconfirm::config::ServiceConfig;
use mailconfirm::domain::confirmation::{Dispatch, Token};
use mailconfirm::domain::ports::{DeliveryReport, Mailer};
use mailconfirm::error::{ConfirmError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const INTERVAL: Duration = Duration::from_secs(10);
pub const WINDOW: Duration = Duration::from_secs(30);

pub fn config() -> ServiceConfig {
    ServiceConfig {
        dispatch_interval: INTERVAL,
        resend_window: WINDOW,
        delivery_timeout: None,
    }
}

/// Remembers every batch it was handed; can fail chosen items by position.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    batches: Arc<Mutex<Vec<Vec<Dispatch>>>>,
    fail_positions: Vec<usize>,
}

impl RecordingMailer {
    pub fn failing_at(positions: &[usize]) -> Self {
        Self {
            fail_positions: positions.to_vec(),
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<Dispatch>> {
        self.batches.lock().unwrap().clone()
    }

    /// The token most recently mailed to `address`.
    pub fn last_token(&self, address: &str) -> Option<Token> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .filter(|d| d.address == address)
            .last()
            .map(|d| d.token.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, batch: &[Dispatch]) -> Result<DeliveryReport> {
        self.batches.lock().unwrap().push(batch.to_vec());
        let mut report = DeliveryReport::default();
        for (position, dispatch) in batch.iter().enumerate() {
            if self.fail_positions.contains(&position) {
                report.record_failure(&dispatch.address, "mailbox unavailable");
            } else {
                report.delivered += 1;
            }
        }
        Ok(report)
    }
}

/// Fails every batch as a whole, as if the relay refused the connection.
#[derive(Clone, Default)]
pub struct UnreachableMailer {
    pub attempts: Arc<Mutex<usize>>,
}

#[async_trait]
impl Mailer for UnreachableMailer {
    async fn deliver(&self, _batch: &[Dispatch]) -> Result<DeliveryReport> {
        *self.attempts.lock().unwrap() += 1;
        Err(ConfirmError::Delivery("connection refused".to_string()))
    }
}

/// Never returns from a delivery.
#[derive(Clone, Default)]
pub struct StalledMailer;

#[async_trait]
impl Mailer for StalledMailer {
    async fn deliver(&self, _batch: &[Dispatch]) -> Result<DeliveryReport> {
        std::future::pending().await
    }
}
