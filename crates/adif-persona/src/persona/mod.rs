//! Persona entity — one operator identity.
//!
//! A *persona* wraps a callsign plus an optional inclusive active date
//! range, and may carry references to provider accounts (LoTW, eQSL, QRZ,
//! Club Log). Only non-secret metadata (username, callsign, dates) is ever
//! persisted; secrets live in the platform secret store and are addressed
//! through the username recorded here.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, Result};

// ── Provider identifiers ──────────────────────────────────────────────────────

/// Canonical identifier for an external logging-confirmation provider.
///
/// The vocabulary is fixed lower-case ids; unknown ids are preserved (and
/// lower-cased) through the `Other` variant so the registry format stays
/// open to new providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    Lotw,
    Eqsl,
    Qrz,
    Clublog,
    Other(String),
}

impl Provider {
    /// The four providers the project ships support for.
    pub const KNOWN: [&'static str; 4] = ["lotw", "eqsl", "qrz", "clublog"];

    /// Parse a provider id, case-insensitively, into its canonical form.
    pub fn parse(s: &str) -> Provider {
        match s.to_ascii_lowercase().as_str() {
            "lotw" => Provider::Lotw,
            "eqsl" => Provider::Eqsl,
            "qrz" => Provider::Qrz,
            "clublog" => Provider::Clublog,
            other => Provider::Other(other.to_string()),
        }
    }

    /// The canonical lower-case id used as the registry map key and in
    /// secret-store keys.
    pub fn id(&self) -> &str {
        match self {
            Provider::Lotw => "lotw",
            Provider::Eqsl => "eqsl",
            Provider::Qrz => "qrz",
            Provider::Clublog => "clublog",
            Provider::Other(id) => id,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ── Credential reference ──────────────────────────────────────────────────────

/// Non-secret binding between a persona and a provider account.
///
/// Holds only the account username. The matching secret is stored in the
/// platform secret store under a key derived from (persona, provider,
/// username) and is never written to the registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRef {
    /// Account username at the provider.
    pub username: String,
}

// ── Persona ───────────────────────────────────────────────────────────────────

/// One operator identity: a name, a callsign, an optional active span, and
/// the provider accounts linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique registry key, case-sensitive.
    pub name: String,
    /// Callsign, normalized to upper-case.
    pub callsign: String,
    /// First day the persona is active (inclusive), if bounded.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last day the persona is active (inclusive), if bounded.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Provider id → non-secret credential reference.
    #[serde(default)]
    pub providers: BTreeMap<String, CredentialRef>,
}

impl Persona {
    /// Create a persona with an empty provider map.
    ///
    /// The callsign is upper-cased; the span is validated.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::Validation` if both dates are present and
    /// `end` is earlier than `start`.
    pub fn new(
        name: impl Into<String>,
        callsign: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        validate_span(start, end)?;
        Ok(Self {
            name: name.into(),
            callsign: callsign.to_ascii_uppercase(),
            start,
            end,
            providers: BTreeMap::new(),
        })
    }

    /// Look up the credential reference for a provider.
    pub fn provider_ref(&self, provider: &Provider) -> Option<&CredentialRef> {
        self.providers.get(provider.id())
    }

    /// Render the active span for display.
    ///
    /// `"—"` when unbounded on both ends, otherwise the bounded ends as
    /// `YYYY-MM-DD` with `…` standing in for an open end, e.g.
    /// `2024-01-01 – …`.
    pub fn active_span(&self) -> String {
        match (self.start, self.end) {
            (None, None) => "—".to_string(),
            (start, end) => {
                let fmt_end = |d: Option<NaiveDate>| match d {
                    Some(d) => d.format("%Y-%m-%d").to_string(),
                    None => "…".to_string(),
                };
                format!("{} – {}", fmt_end(start), fmt_end(end))
            }
        }
    }
}

// ── Date helpers ──────────────────────────────────────────────────────────────

/// Check that a (start, end) pair forms a valid inclusive span.
///
/// # Errors
///
/// Returns `PersonaError::Validation` when both ends are present and
/// `end < start`.
fn validate_span(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(PersonaError::Validation(format!(
                "end date {e} is earlier than start date {s}"
            )));
        }
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date literal.
///
/// An empty or whitespace-only string is rejected: "no date" must be passed
/// as a genuinely absent value, never as an empty string.
///
/// # Errors
///
/// Returns `PersonaError::Validation` for anything that is not a valid
/// ISO-8601 calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(PersonaError::Validation(
            "empty string is not a valid date (omit the field instead)".to_string(),
        ));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| PersonaError::Validation(format!("invalid date '{s}': {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
