//! Secret backend abstraction.
//!
//! Secrets (provider passwords, API tokens) never touch the registry file;
//! they live in the platform secret store, addressed by a fixed service
//! name and a caller-composed key. The backend is a three-operation
//! capability behind the [`SecretStore`] trait:
//!
//! - [`KeyringSecretStore`] — the real platform store via the `keyring`
//!   crate.
//! - [`NullSecretStore`] — always reports unavailable; selected when the
//!   platform store is disabled.
//! - [`MemorySecretStore`] — in-process map for tests and front-end
//!   harnesses, so exercising credential flows never touches the platform
//!   keyring.
//!
//! The implementation is selected once at startup ([`select_secret_store`]);
//! call sites never probe availability themselves. Failures are typed
//! ([`SecretError`]) so callers can tell "no secret" apart from "backend
//! errored".

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Service identifier under which all secrets are stored.
pub const SERVICE: &str = "adif-persona";

/// Environment variable controlling backend selection. Set to `disabled`
/// to force the null backend (useful on headless machines and in CI).
pub const KEYRING_ENV: &str = "ADIF_PERSONA_KEYRING";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Secret backend failure, never fatal to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// The platform store is missing, locked, or disabled.
    #[error("secret backend unavailable")]
    Unavailable,

    /// The platform store is present but the call failed.
    #[error("secret backend error: {0}")]
    Backend(String),
}

/// Convenience Result alias for backend operations.
pub type SecretResult<T> = std::result::Result<T, SecretError>;

// ── Capability trait ──────────────────────────────────────────────────────────

/// Three-operation capability over a (service, key)-addressed secret store.
///
/// `get` distinguishes a present value, an absent value, and a failing
/// backend; read paths in the manager degrade the latter to absent, write
/// paths surface it as a warning.
pub trait SecretStore: Send + Sync {
    /// Store `secret` under `key`, replacing any previous value.
    fn set(&self, key: &str, secret: &str) -> SecretResult<()>;

    /// Fetch the secret stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> SecretResult<Option<String>>;

    /// Delete the secret stored under `key`.
    ///
    /// Returns `false` when no entry existed.
    fn delete(&self, key: &str) -> SecretResult<bool>;
}

/// Select the process-wide secret store.
///
/// Returns the platform-backed store unless [`KEYRING_ENV`] is set to
/// `disabled`, in which case the null store is returned and every operation
/// reports unavailable.
pub fn select_secret_store() -> Arc<dyn SecretStore> {
    match std::env::var(KEYRING_ENV) {
        Ok(v) if v.eq_ignore_ascii_case("disabled") => {
            log::debug!("{KEYRING_ENV}=disabled, using null secret store");
            Arc::new(NullSecretStore)
        }
        _ => Arc::new(KeyringSecretStore::new()),
    }
}

// ── Platform keyring ──────────────────────────────────────────────────────────

/// Secret store backed by the OS keyring (`keyring` crate).
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// Store under the fixed [`SERVICE`] name.
    pub fn new() -> Self {
        Self::with_service(SERVICE)
    }

    /// Store under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> SecretResult<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(map_keyring_error)
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeyringSecretStore {
    fn set(&self, key: &str, secret: &str) -> SecretResult<()> {
        self.entry(key)?
            .set_password(secret)
            .map_err(map_keyring_error)
    }

    fn get(&self, key: &str) -> SecretResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn delete(&self, key: &str) -> SecretResult<bool> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}

/// Map `keyring` errors onto the two-way taxonomy: store-not-there versus
/// call-failed.
fn map_keyring_error(e: keyring::Error) -> SecretError {
    match e {
        keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_) => {
            log::debug!("platform keyring unavailable: {e}");
            SecretError::Unavailable
        }
        other => SecretError::Backend(other.to_string()),
    }
}

// ── Null store ────────────────────────────────────────────────────────────────

/// Secret store that always reports unavailable.
///
/// Selected when the platform keyring is disabled; lets every call site run
/// the same code path with reads degrading to absent and writes to a
/// "not stored" warning.
pub struct NullSecretStore;

impl SecretStore for NullSecretStore {
    fn set(&self, _key: &str, _secret: &str) -> SecretResult<()> {
        Err(SecretError::Unavailable)
    }

    fn get(&self, _key: &str) -> SecretResult<Option<String>> {
        Err(SecretError::Unavailable)
    }

    fn delete(&self, _key: &str) -> SecretResult<bool> {
        Err(SecretError::Unavailable)
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// In-process secret store for tests and front-end harnesses.
///
/// Behaves like the platform store, including an access-rejected mode
/// (`set_available(false)`) for exercising degraded paths.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
    rejected: AtomicBool,
}

impl MemorySecretStore {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability; when unavailable every operation returns
    /// [`SecretError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.rejected.store(!available, Ordering::SeqCst);
    }

    /// Number of secrets currently held.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("secret store lock").len()
    }

    /// `true` when no secrets are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when a secret is stored under `key` (ignores availability).
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .expect("secret store lock")
            .contains_key(key)
    }

    fn check_available(&self) -> SecretResult<()> {
        if self.rejected.load(Ordering::SeqCst) {
            Err(SecretError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl SecretStore for MemorySecretStore {
    fn set(&self, key: &str, secret: &str) -> SecretResult<()> {
        self.check_available()?;
        self.entries
            .lock()
            .expect("secret store lock")
            .insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> SecretResult<Option<String>> {
        self.check_available()?;
        Ok(self
            .entries
            .lock()
            .expect("secret store lock")
            .get(key)
            .cloned())
    }

    fn delete(&self, key: &str) -> SecretResult<bool> {
        self.check_available()?;
        Ok(self
            .entries
            .lock()
            .expect("secret store lock")
            .remove(key)
            .is_some())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
