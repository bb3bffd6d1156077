use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Number of random bytes behind every token (256 bits).
const TOKEN_BYTES: usize = 32;

/// An unguessable, single-use credential embedded in the confirmation link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Draws a fresh token from the operating system's CSPRNG.
    ///
    /// The encoding is URL-safe base64 without padding, so the token can be
    /// appended to a query string as-is.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-address confirmation state, owned exclusively by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRecord {
    pub token: Token,
    /// Time of the last delivery attempt; `None` until a dispatch cycle picks the record up.
    pub sent_at: Option<Instant>,
    pub confirmed: bool,
}

impl ConfirmationRecord {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            sent_at: None,
            confirmed: false,
        }
    }

    pub fn sent(&self) -> bool {
        self.sent_at.is_some()
    }

    /// Whole seconds left before a resend is honored. Zero once elapsed or never sent.
    pub fn remaining_secs(&self, resend_window: Duration, now: Instant) -> u64 {
        match self.sent_at {
            Some(sent_at) => {
                let elapsed = now.saturating_duration_since(sent_at).as_secs();
                resend_window.as_secs().saturating_sub(elapsed)
            }
            None => 0,
        }
    }

    /// True while a previous attempt is still inside the resend window.
    pub fn too_soon(&self, resend_window: Duration, now: Instant) -> bool {
        match self.sent_at {
            Some(sent_at) => now.saturating_duration_since(sent_at) < resend_window,
            None => false,
        }
    }

    pub fn snapshot(&self, resend_window: Duration, now: Instant) -> StatusSnapshot {
        StatusSnapshot {
            sent: self.sent(),
            remaining_secs: self.remaining_secs(resend_window, now),
            confirmed: self.confirmed,
        }
    }
}

/// What a status check reports for a known address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub sent: bool,
    pub remaining_secs: u64,
    pub confirmed: bool,
}

/// One item of a delivery batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub address: String,
    pub token: Token,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_url_safe_and_distinct() {
        let a = Token::generate();
        let b = Token::generate();

        assert_eq!(a.as_str().len(), 43);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_unsent_record_has_no_remaining_time() {
        let record = ConfirmationRecord::new(Token::generate());
        let now = Instant::now();

        assert!(!record.sent());
        assert_eq!(record.remaining_secs(Duration::from_secs(30), now), 0);
        assert!(!record.too_soon(Duration::from_secs(30), now));
    }

    #[test]
    fn test_remaining_truncates_elapsed_seconds() {
        let start = Instant::now();
        let mut record = ConfirmationRecord::new(Token::generate());
        record.sent_at = Some(start);
        let window = Duration::from_secs(30);

        assert_eq!(record.remaining_secs(window, start), 30);
        assert_eq!(
            record.remaining_secs(window, start + Duration::from_millis(1500)),
            29
        );
        assert_eq!(
            record.remaining_secs(window, start + Duration::from_secs(45)),
            0
        );
        assert!(record.too_soon(window, start + Duration::from_secs(29)));
        assert!(!record.too_soon(window, start + window));
    }
}
