//! adif-persona — local persona/credential registry for amateur-radio
//! logging providers.
//!
//! One operator, several named *personas* (alternate callsigns with
//! optional validity windows), each linkable to accounts at external
//! logging-confirmation providers (LoTW, eQSL, QRZ, Club Log). Non-secret
//! state lives in a JSON index file; secrets live in the platform secret
//! store and are addressed only through usernames resolved from the index.

pub mod error;
pub mod manager;
pub mod persona;
pub mod resolver;
pub mod secret;
pub mod store;

// Re-export primary types
pub use error::{PersonaError, Result};
pub use manager::{PersonaManager, SecretKey, SecretLookup};
pub use persona::{CredentialRef, Persona, Provider};
pub use resolver::{LookupMode, Resolution};
pub use secret::{
    KeyringSecretStore, MemorySecretStore, NullSecretStore, SecretError, SecretStore,
};
pub use store::PersonaStore;
