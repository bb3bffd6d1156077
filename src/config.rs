use crate::error::{ConfirmError, Result};
use std::time::Duration;

pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_RESEND_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_LINK_BASE: &str = "https://example.com/confirm?token=";

/// Everything the confirmation service needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How often unsent records are collected into a batch.
    pub dispatch_interval: Duration,
    /// Minimum time after a delivery attempt before a new request is honored.
    pub resend_window: Duration,
    /// Upper bound on one batch delivery. `None` waits indefinitely.
    pub delivery_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
            resend_window: DEFAULT_RESEND_WINDOW,
            delivery_timeout: Some(DEFAULT_DELIVERY_TIMEOUT),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dispatch_interval.is_zero() {
            return Err(ConfirmError::Config(
                "dispatch interval must be greater than zero".to_string(),
            ));
        }
        if self.delivery_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfirmError::Config(
                "delivery timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outbound mail relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl SmtpConfig {
    /// True when enough is set to authenticate against the relay.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatch_interval, Duration::from_secs(10));
        assert_eq!(config.resend_window, Duration::from_secs(30));
        assert!(!SmtpConfig::default().has_credentials());
    }

    #[test]
    fn test_zero_delivery_timeout_is_rejected() {
        let config = ServiceConfig {
            delivery_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfirmError::Config(_))));
    }
}
