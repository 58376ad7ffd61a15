//! Personas index persistence.
//!
//! The whole registry is one JSON document, held in memory and rewritten to
//! the backing file on every mutating call:
//!
//! ```json
//! {
//!     "personas": {
//!         "Primary": {
//!             "name": "Primary",
//!             "callsign": "KI7MT",
//!             "start": null,
//!             "end": null,
//!             "providers": { "lotw": { "username": "ki7mt" } }
//!         }
//!     }
//! }
//! ```
//!
//! Writes are atomic (sibling temp file, then rename) so a mid-write crash
//! never corrupts the existing document. A missing file on load means an
//! empty registry; a present-but-malformed file is a fatal
//! [`PersonaError::CorruptIndex`], never silently discarded.

pub mod paths;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, Result};
use crate::persona::{CredentialRef, Persona, Provider};

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Top-level structure of the personas index file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    /// Persona name → record. `BTreeMap` keeps the document name-ordered.
    #[serde(default)]
    personas: BTreeMap<String, Persona>,
}

// ── PersonaStore ──────────────────────────────────────────────────────────────

/// JSON-file-backed store owning the personas index.
///
/// The store is the single source of truth for which provider usernames
/// exist. It never touches the secret backend; removing a persona leaves
/// any stored secrets behind.
pub struct PersonaStore {
    path: PathBuf,
    personas: BTreeMap<String, Persona>,
}

impl PersonaStore {
    /// Open the store backed by `path`, loading the document if it exists.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::CorruptIndex` if the file exists but cannot
    /// be parsed, or `PersonaError::Io` for other filesystem errors. A
    /// missing file is not an error and yields an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let personas = match std::fs::read(&path) {
            Ok(bytes) => {
                let doc: IndexDocument = serde_json::from_slice(&bytes).map_err(|e| {
                    PersonaError::CorruptIndex {
                        path: path.clone(),
                        message: e.to_string(),
                    }
                })?;
                doc.personas
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::debug!(
            "opened personas index {} ({} persona(s))",
            path.display(),
            personas.len()
        );
        Ok(Self { path, personas })
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All personas, ordered by name.
    pub fn list(&self) -> Vec<Persona> {
        self.personas.values().cloned().collect()
    }

    /// Look up a persona by exact (case-sensitive) name.
    pub fn get(&self, name: &str) -> Option<&Persona> {
        self.personas.get(name)
    }

    /// Create or update a persona.
    ///
    /// On update the callsign and active span are replaced while the
    /// existing provider map is preserved. The document is rewritten before
    /// the call returns; a failed write leaves the in-memory registry on
    /// the last persisted state.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::Validation` for an inverted span (rejected
    /// before any mutation), or a write error from persisting the document.
    pub fn upsert(
        &mut self,
        name: &str,
        callsign: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Persona> {
        let mut persona = Persona::new(name, callsign, start, end)?;
        if let Some(existing) = self.personas.get(name) {
            persona.providers = existing.providers.clone();
        }

        let mut next = self.personas.clone();
        next.insert(name.to_string(), persona.clone());
        self.commit(next)?;
        Ok(persona)
    }

    /// Remove a persona from the index. Secrets are untouched.
    ///
    /// Returns `false` for an unknown name, in which case the document is
    /// not rewritten.
    ///
    /// # Errors
    ///
    /// Returns a write error from persisting the document.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if !self.personas.contains_key(name) {
            return Ok(false);
        }

        let mut next = self.personas.clone();
        next.remove(name);
        self.commit(next)?;
        Ok(true)
    }

    /// Set or replace the non-secret credential reference for a provider.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::NotFound` if the persona does not exist (the
    /// document is left unchanged), or a write error from persisting it.
    pub fn set_provider_ref(
        &mut self,
        persona: &str,
        provider: &Provider,
        username: &str,
    ) -> Result<Persona> {
        let mut updated = self
            .personas
            .get(persona)
            .cloned()
            .ok_or_else(|| PersonaError::NotFound(persona.to_string()))?;
        updated.providers.insert(
            provider.id().to_string(),
            CredentialRef {
                username: username.to_string(),
            },
        );

        let mut next = self.personas.clone();
        next.insert(persona.to_string(), updated.clone());
        self.commit(next)?;
        Ok(updated)
    }

    /// Delete the backing file and clear the in-memory registry.
    ///
    /// Idempotent: an already-absent file is not an error. Used by the
    /// manager's bulk teardown; the next mutation recreates the file.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::Io` for filesystem errors other than the
    /// file being absent.
    pub fn destroy(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.personas.clear();
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Persist `next` and, only on success, adopt it as the in-memory
    /// registry. A failed write leaves `self.personas` on the last
    /// persisted state, so memory and disk never diverge.
    fn commit(&mut self, next: BTreeMap<String, Persona>) -> Result<()> {
        let doc = IndexDocument {
            personas: next.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| PersonaError::Serialization(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes())?;

        self.personas = next;
        Ok(())
    }
}

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist. The write uses a
/// sibling temp file and `std::fs::rename` so that a crash during the write
/// cannot leave a partially-written file visible to readers.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
