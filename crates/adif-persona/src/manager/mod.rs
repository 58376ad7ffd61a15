//! Persona manager — the façade over the index store and the secret
//! backend.
//!
//! Non-secret provider refs (usernames) live in the JSON personas index;
//! secrets live in the secret backend under the fixed service
//! [`crate::secret::SERVICE`] and the deterministic key
//!
//! ```text
//! "<persona>:<provider>:<username>"
//! ```
//!
//! The index is the single source of truth for which usernames exist: the
//! backend is only ever addressed through a username resolved from the
//! index. Changing a ref's username therefore orphans the old backend
//! entry — the manager does not cascade-delete on username change or
//! persona rename, an accepted tradeoff for a local single-operator tool.
//!
//! The manager owns no persisted state of its own and is constructed once
//! at process start; there is no ambient singleton.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::persona::{CredentialRef, Persona, Provider};
use crate::secret::{select_secret_store, SecretResult, SecretStore};
use crate::store::{paths, PersonaStore};

// ── Secret addressing ─────────────────────────────────────────────────────────

/// Immutable compound identifier for one provider credential binding.
///
/// Ties a stored secret to a specific (persona, provider, username) triple;
/// the provider id is canonical lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey {
    pub persona: String,
    pub provider: String,
    pub username: String,
}

impl SecretKey {
    /// Build a key for a persona/provider/username triple.
    pub fn new(persona: &str, provider: &Provider, username: &str) -> Self {
        Self {
            persona: persona.to_string(),
            provider: provider.id().to_string(),
            username: username.to_string(),
        }
    }

    /// Compose the deterministic backend key:
    /// `"<persona>:<provider>:<username>"`.
    pub fn backend_key(&self) -> String {
        format!("{}:{}:{}", self.persona, self.provider, self.username)
    }
}

// ── Secret lookup outcome ─────────────────────────────────────────────────────

/// Outcome of a secret lookup, with each failure mode distinct so probes
/// can report "persona absent", "provider not configured", and "secret
/// absent or backend unavailable" as three different conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretLookup {
    /// A secret is stored for the currently configured username.
    Found(String),
    /// The provider ref exists but no secret is stored (or the backend is
    /// unavailable — indistinguishable on the read path).
    Missing,
    /// The persona exists but has no ref for this provider.
    Unconfigured,
    /// No persona with that name.
    UnknownPersona,
}

// ── PersonaManager ────────────────────────────────────────────────────────────

/// High-level persona/credential manager.
///
/// All operations are name-based (persona name, not callsign); callsign
/// disambiguation is the resolver's job.
pub struct PersonaManager {
    store: PersonaStore,
    secrets: Arc<dyn SecretStore>,
}

impl PersonaManager {
    /// Compose a manager from an already-open store and a secret backend.
    pub fn new(store: PersonaStore, secrets: Arc<dyn SecretStore>) -> Self {
        Self { store, secrets }
    }

    /// Open the manager over the resolved default index path and the
    /// startup-selected secret backend.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::CorruptIndex` or `PersonaError::Io` from
    /// loading the index.
    pub fn open_default() -> Result<Self> {
        let store = PersonaStore::open(paths::personas_index_path())?;
        Ok(Self::new(store, select_secret_store()))
    }

    /// The underlying index store (read access for resolvers and display).
    pub fn store(&self) -> &PersonaStore {
        &self.store
    }

    // ── Persona CRUD (passthrough) ────────────────────────────────────────────

    /// All personas, ordered by name.
    pub fn list(&self) -> Vec<Persona> {
        self.store.list()
    }

    /// Look up a persona by exact name.
    pub fn get(&self, name: &str) -> Option<&Persona> {
        self.store.get(name)
    }

    /// Create or update a persona. See [`PersonaStore::upsert`].
    pub fn upsert(
        &mut self,
        name: &str,
        callsign: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Persona> {
        self.store.upsert(name, callsign, start, end)
    }

    /// Remove a persona from the index only; stored secrets are untouched.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        self.store.remove(name)
    }

    // ── Provider refs (non-secret) ────────────────────────────────────────────

    /// Set or replace the non-secret ref for (persona, provider).
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::NotFound` for an unknown persona.
    pub fn set_provider(
        &mut self,
        persona: &str,
        provider: &Provider,
        username: &str,
    ) -> Result<Persona> {
        self.store.set_provider_ref(persona, provider, username)
    }

    /// The configured username for (persona, provider), if any.
    pub fn get_provider_username(&self, persona: &str, provider: &Provider) -> Option<String> {
        self.store
            .get(persona)
            .and_then(|p| p.provider_ref(provider))
            .map(|r| r.username.clone())
    }

    /// The full non-secret provider map for a persona, for masked display.
    /// Empty when the persona does not exist.
    pub fn provider_refs(&self, persona: &str) -> BTreeMap<String, CredentialRef> {
        self.store
            .get(persona)
            .map(|p| p.providers.clone())
            .unwrap_or_default()
    }

    // ── Secrets ───────────────────────────────────────────────────────────────

    /// Store a secret for (persona, provider, username) in the backend.
    ///
    /// The username is caller-supplied, not resolved from the index: the
    /// "attach credential" flow binds ref and secret in two explicit steps,
    /// and a failed secret write must leave the already-written ref intact.
    ///
    /// # Errors
    ///
    /// Returns the backend error so the caller can render "secret NOT
    /// stored" distinctly from success.
    pub fn set_secret(
        &self,
        persona: &str,
        provider: &Provider,
        username: &str,
        secret: &str,
    ) -> SecretResult<()> {
        let key = SecretKey::new(persona, provider, username).backend_key();
        self.secrets.set(&key, secret)
    }

    /// Look up the secret for (persona, provider) via the *currently*
    /// configured username.
    ///
    /// A failing backend degrades to [`SecretLookup::Missing`] with a
    /// warning log; it never escalates to an error on the read path.
    pub fn get_secret(&self, persona: &str, provider: &Provider) -> SecretLookup {
        let Some(p) = self.store.get(persona) else {
            return SecretLookup::UnknownPersona;
        };
        let Some(r) = p.provider_ref(provider) else {
            return SecretLookup::Unconfigured;
        };

        let key = SecretKey::new(persona, provider, &r.username).backend_key();
        match self.secrets.get(&key) {
            Ok(Some(secret)) => SecretLookup::Found(secret),
            Ok(None) => SecretLookup::Missing,
            Err(e) => {
                log::warn!("secret lookup for {persona}/{provider} degraded to absent: {e}");
                SecretLookup::Missing
            }
        }
    }

    /// Delete the secret for (persona, provider) via the currently
    /// configured username.
    ///
    /// Returns `false` without touching the backend when no ref exists,
    /// and `false` when the backend is unavailable or held no entry.
    pub fn delete_secret(&self, persona: &str, provider: &Provider) -> bool {
        let Some(username) = self.get_provider_username(persona, provider) else {
            return false;
        };

        let key = SecretKey::new(persona, provider, &username).backend_key();
        match self.secrets.delete(&key) {
            Ok(deleted) => deleted,
            Err(e) => {
                log::warn!("secret delete for {persona}/{provider} failed: {e}");
                false
            }
        }
    }

    // ── Bulk teardown ─────────────────────────────────────────────────────────

    /// Remove every persona: delete the index file (idempotent) and start
    /// empty, then — only when `delete_secrets` is set — best-effort delete
    /// the backend entry for every (persona, provider, username) triple
    /// known at the time of the call, optionally restricted to
    /// `provider_filter`.
    ///
    /// Returns `(personas_removed, secrets_deleted)`. The two are separate
    /// failure domains: the index wipe always completes no matter how many
    /// secret deletions fail.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::Io` only from the index-file removal itself.
    pub fn remove_all(
        &mut self,
        delete_secrets: bool,
        provider_filter: Option<&[Provider]>,
    ) -> Result<(usize, usize)> {
        // Snapshot before the wipe; the triples must reflect the registry
        // as it was, not the empty one.
        let snapshot = self.store.list();
        let persona_count = snapshot.len();

        let mut targets: Vec<SecretKey> = Vec::new();
        if delete_secrets {
            let allowed: Option<Vec<&str>> =
                provider_filter.map(|ps| ps.iter().map(Provider::id).collect());
            for persona in &snapshot {
                for (prov_id, r) in &persona.providers {
                    if let Some(ref allowed) = allowed {
                        if !allowed.contains(&prov_id.as_str()) {
                            continue;
                        }
                    }
                    targets.push(SecretKey::new(
                        &persona.name,
                        &Provider::parse(prov_id),
                        &r.username,
                    ));
                }
            }
        }

        self.store.destroy()?;

        let mut deleted = 0usize;
        for target in &targets {
            match self.secrets.delete(&target.backend_key()) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!(
                        "secret delete for {}/{} failed during remove-all: {e}",
                        target.persona,
                        target.provider
                    );
                }
            }
        }

        Ok((persona_count, deleted))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
