//! Per-handle credential persistence with an OS-keyring-first, file-
//! fallback storage strategy (§4.3).

mod backend;
mod store;

pub use backend::{Backend, FileBackend, KeyringBackend};
pub use store::CredentialStore;

