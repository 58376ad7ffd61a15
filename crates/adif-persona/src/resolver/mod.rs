//! Lookup resolver — disambiguate a user-supplied identifier into a
//! persona.
//!
//! Callsigns are not unique (a special-event callsign can back several
//! personas over the years), so identifier lookup runs callsign-first with
//! a name fallback:
//!
//! 1. Case-insensitive exact match against every persona's callsign. One
//!    hit wins; several hits is terminal — the caller must re-query by
//!    exact name; zero hits falls through.
//! 2. Case-sensitive exact match against persona names; no hit is "not
//!    found".
//!
//! The forced modes run only their own step and never fall through.

use crate::persona::Persona;
use crate::store::PersonaStore;

// ── Modes and outcomes ────────────────────────────────────────────────────────

/// How an identifier is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Callsign first, then exact name.
    #[default]
    Auto,
    /// Callsign matching only.
    Callsign,
    /// Exact name matching only.
    Name,
}

/// Result of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one persona matched.
    Match(Persona),
    /// Several personas share the callsign; none is picked. The caller
    /// must re-query by exact name.
    Ambiguous(Vec<Persona>),
    /// Nothing matched.
    NotFound,
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Resolve `ident` against the registry under the given mode.
pub fn resolve(store: &PersonaStore, ident: &str, mode: LookupMode) -> Resolution {
    match mode {
        LookupMode::Name => by_name(store, ident),
        LookupMode::Callsign => by_callsign(store, ident),
        LookupMode::Auto => match by_callsign(store, ident) {
            // Zero callsign hits falls through to the name step; ambiguity
            // is terminal and never falls through.
            Resolution::NotFound => by_name(store, ident),
            hit => hit,
        },
    }
}

/// Case-insensitive substring search over persona names and callsigns,
/// in registry (name) order.
pub fn find(store: &PersonaStore, query: &str) -> Vec<Persona> {
    let q = query.to_lowercase();
    store
        .list()
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&q) || p.callsign.to_lowercase().contains(&q))
        .collect()
}

fn by_name(store: &PersonaStore, ident: &str) -> Resolution {
    match store.get(ident) {
        Some(p) => Resolution::Match(p.clone()),
        None => Resolution::NotFound,
    }
}

fn by_callsign(store: &PersonaStore, ident: &str) -> Resolution {
    let hits: Vec<Persona> = store
        .list()
        .into_iter()
        .filter(|p| p.callsign.eq_ignore_ascii_case(ident))
        .collect();

    match hits.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Match(hits.into_iter().next().expect("one hit")),
        _ => Resolution::Ambiguous(hits),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
