//! Backend selection: OS keyring when available, otherwise the
//! restricted-permission file fallback. The choice is fixed at
//! construction for the lifetime of the process (§4.3).

use ar_domain::{Config, Credentials, Result};

use crate::backend::{Backend, FileBackend, KeyringBackend};

pub struct CredentialStore {
    backend: Box<dyn Backend>,
}

impl CredentialStore {
    pub fn new(config: &Config) -> Self {
        let keyring = KeyringBackend::new(config.credentials.service.clone());
        let backend: Box<dyn Backend> = if !config.credentials.force_file_backend
            && keyring.is_available()
        {
            tracing::info!("using OS-native keyring for credential storage");
            Box::new(keyring)
        } else {
            let path = config
                .credentials
                .path_override
                .clone()
                .map(std::path::PathBuf::from)
                .unwrap_or_else(default_credentials_path);
            tracing::info!(path = %path.display(), "using file-backed credential storage");
            Box::new(FileBackend::new(path))
        };
        Self { backend }
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn save(&self, handle: &str, creds: &Credentials) -> Result<()> {
        self.backend.save(handle, creds)
    }

    pub fn load(&self, handle: &str) -> Result<Credentials> {
        self.backend.load(handle)
    }

    pub fn delete(&self, handle: &str) -> Result<()> {
        self.backend.delete(handle)
    }

    pub fn set_default(&self, handle: &str) -> Result<()> {
        self.backend.set_default(handle)
    }

    pub fn get_default(&self) -> Result<String> {
        self.backend.get_default()
    }

    pub fn list_handles(&self) -> Result<Vec<String>> {
        self.backend.list_handles()
    }
}

fn default_credentials_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("autoreply")
        .join("credentials.json")
}
