use super::confirmation::{ConfirmationRecord, Dispatch, StatusSnapshot, Token};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// The authoritative map of per-address confirmation state.
///
/// Holds every live record keyed by address plus the inverse `token -> address`
/// index. Every key in `tokens` is the current token of exactly one live record.
/// Time is always passed in, so the state machine is independent of the clock
/// and of the actor that drives it.
#[derive(Debug)]
pub struct ConfirmationRegistry {
    records: HashMap<String, ConfirmationRecord>,
    tokens: HashMap<Token, String>,
    resend_window: Duration,
}

impl ConfirmationRegistry {
    pub fn new(resend_window: Duration) -> Self {
        Self {
            records: HashMap::new(),
            tokens: HashMap::new(),
            resend_window,
        }
    }

    /// Starts (or restarts) a confirmation cycle for `address`.
    ///
    /// Returns `false` only when the last delivery attempt is still inside the
    /// resend window. An already confirmed record reports `true` untouched.
    pub fn request(&mut self, address: &str, now: Instant) -> bool {
        if let Some(record) = self.records.get(address) {
            if record.confirmed {
                return true;
            }
            if record.too_soon(self.resend_window, now) {
                return false;
            }
            self.tokens.remove(&record.token);
        }

        let token = self.fresh_token();
        self.tokens.insert(token.clone(), address.to_string());
        self.records
            .insert(address.to_string(), ConfirmationRecord::new(token));
        true
    }

    /// Reports the state of `address`, purging the record once it has been
    /// observed as confirmed.
    pub fn status(&mut self, address: &str, now: Instant) -> Option<StatusSnapshot> {
        let record = self.records.get(address)?;
        let snapshot = record.snapshot(self.resend_window, now);
        if snapshot.confirmed {
            self.cleanup(address);
        }
        Some(snapshot)
    }

    /// Redeems `token`. The index entry is consumed whether or not a record is found.
    pub fn confirm(&mut self, token: &Token) -> bool {
        let Some(address) = self.tokens.remove(token) else {
            return false;
        };
        match self.records.get_mut(&address) {
            Some(record) => {
                record.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Records that still need a delivery attempt.
    pub fn pending_batch(&self) -> Vec<Dispatch> {
        self.records
            .iter()
            .filter(|(_, record)| !record.sent() && !record.confirmed)
            .map(|(address, record)| Dispatch {
                address: address.clone(),
                token: record.token.clone(),
            })
            .collect()
    }

    /// Marks every dispatched item as attempted at `now`, regardless of outcome.
    ///
    /// Items whose record has since been rotated or purged are skipped.
    pub fn mark_attempted(&mut self, batch: &[Dispatch], now: Instant) {
        for item in batch {
            if let Some(record) = self.records.get_mut(&item.address)
                && record.token == item.token
            {
                record.sent_at = Some(now);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn cleanup(&mut self, address: &str) {
        if let Some(record) = self.records.remove(address) {
            self.tokens.remove(&record.token);
        }
    }

    fn fresh_token(&self) -> Token {
        loop {
            let token = Token::generate();
            if !self.tokens.contains_key(&token) {
                return token;
            }
        }
    }

    #[cfg(test)]
    fn token_of(&self, address: &str) -> Option<Token> {
        self.records.get(address).map(|r| r.token.clone())
    }
}
