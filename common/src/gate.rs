//! Time-distance authorization gate.
//!
//! Mutations on items more than [`GATE_THRESHOLD_DAYS`] days from expiry need
//! the shared admin secret. Everything closer to expiry, including items
//! already past it, goes through without one. The same policy runs on both
//! sides of the wire; only the server's verdict is binding.

use std::fmt;

use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha256};

use crate::countdown::gate_days;
use crate::error::TrackerError;
use crate::item::FoodItem;

/// Strict upper bound on days-until-expiry for ungated mutations.
pub const GATE_THRESHOLD_DAYS: i64 = 15;

pub const MSG_NOT_CONFIGURED: &str = "Admin password not configured";
pub const MSG_INVALID_PASSWORD: &str = "Invalid admin password";

/// What a caller must supply to mutate an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRequirement {
    Open,
    SecretRequired,
}

impl GateRequirement {
    pub fn for_days(days: i64) -> Self {
        if days > GATE_THRESHOLD_DAYS {
            GateRequirement::SecretRequired
        } else {
            GateRequirement::Open
        }
    }

    /// Evaluated against the item's stored expiry, never a proposed new one,
    /// using the full-precision day count.
    pub fn for_item<Tz: TimeZone>(item: &FoodItem, now: &DateTime<Tz>) -> Self {
        Self::for_days(gate_days(&item.expiry_date, now))
    }

    pub fn is_required(self) -> bool {
        self == GateRequirement::SecretRequired
    }
}

/// The configured admin secret. Only its SHA-256 digest is retained.
#[derive(Clone)]
pub struct AdminSecret {
    digest: [u8; 32],
}

impl AdminSecret {
    /// An empty string counts as "not configured".
    pub fn from_config(raw: Option<&str>) -> Option<Self> {
        raw.filter(|s| !s.is_empty()).map(|s| AdminSecret {
            digest: digest(s),
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let other = digest(candidate);
        self.digest
            .iter()
            .zip(other.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

fn digest(s: &str) -> [u8; 32] {
    Sha256::digest(s.as_bytes()).into()
}

/// Server-side enforcement of the gate. Holds the secret read from config at
/// startup; it never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    secret: Option<AdminSecret>,
}

impl AuthorizationGate {
    pub fn new(secret: Option<AdminSecret>) -> Self {
        AuthorizationGate { secret }
    }

    pub fn from_config(raw: Option<&str>) -> Self {
        Self::new(AdminSecret::from_config(raw))
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Check a candidate secret without revealing anything about the real one.
    pub fn verify(&self, candidate: &str) -> Result<bool, TrackerError> {
        let secret = self.configured()?;
        Ok(secret.matches(candidate))
    }

    /// Allow or refuse a gated mutation on `item`.
    pub fn authorize<Tz: TimeZone>(
        &self,
        item: &FoodItem,
        supplied: Option<&str>,
        now: &DateTime<Tz>,
    ) -> Result<(), TrackerError> {
        if !GateRequirement::for_item(item, now).is_required() {
            return Ok(());
        }
        let secret = self.configured()?;
        match supplied {
            Some(candidate) if !candidate.is_empty() && secret.matches(candidate) => Ok(()),
            _ => Err(TrackerError::Authorization(MSG_INVALID_PASSWORD.to_string())),
        }
    }

    fn configured(&self) -> Result<&AdminSecret, TrackerError> {
        self.secret
            .as_ref()
            .ok_or_else(|| TrackerError::Configuration(MSG_NOT_CONFIGURED.to_string()))
    }
}
