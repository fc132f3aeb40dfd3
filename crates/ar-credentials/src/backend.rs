//! Backend trait and its two implementations: OS-native keyring, and a
//! restricted-permission file fallback (§4.3).

use ar_domain::{Credentials, Error, Result};

pub trait Backend: Send + Sync {
    fn save(&self, handle: &str, creds: &Credentials) -> Result<()>;
    fn load(&self, handle: &str) -> Result<Credentials>;
    fn delete(&self, handle: &str) -> Result<()>;
    fn set_default(&self, handle: &str) -> Result<()>;
    fn get_default(&self) -> Result<String>;
    fn list_handles(&self) -> Result<Vec<String>>;
}

const DEFAULT_HANDLE_ACCOUNT: &str = "default_handle";
const HANDLE_INDEX_ACCOUNT: &str = "handle_index";

/// OS-native secret store (macOS Keychain / Windows Credential Manager /
/// Linux kernel keyring via `linux-keyutils`). Keyring has no native
/// enumeration API, so a small JSON index of known handles is kept
/// alongside the per-handle entries under a reserved account name.
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new(service: String) -> Self {
        Self { service }
    }

    /// Probe the backend by round-tripping a throwaway entry. Used at
    /// startup to decide whether to fall back to the file backend.
    pub fn is_available(&self) -> bool {
        let probe_account = "__autoreply_probe__";
        let entry = match keyring::Entry::new(&self.service, probe_account) {
            Ok(e) => e,
            Err(_) => return false,
        };
        if entry.set_password("probe").is_err() {
            return false;
        }
        let ok = entry.get_password().is_ok();
        let _ = entry.delete_credential();
        ok
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, account)
            .map_err(|e| Error::Authentication(format!("keyring entry creation failed: {e}")))
    }

    fn key_for(handle: &str) -> String {
        format!("user:{handle}")
    }

    fn read_index(&self) -> Result<Vec<String>> {
        let entry = self.entry(HANDLE_INDEX_ACCOUNT)?;
        match entry.get_password() {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Internal(format!("corrupt handle index: {e}"))),
            Err(keyring::Error::NoEntry) => Ok(Vec::new()),
            Err(e) => Err(Error::Authentication(format!("reading handle index: {e}"))),
        }
    }

    fn write_index(&self, handles: &[String]) -> Result<()> {
        let entry = self.entry(HANDLE_INDEX_ACCOUNT)?;
        let json = serde_json::to_string(handles)
            .map_err(|e| Error::Internal(format!("serializing handle index: {e}")))?;
        entry
            .set_password(&json)
            .map_err(|e| Error::Authentication(format!("writing handle index: {e}")))
    }
}

impl Backend for KeyringBackend {
    fn save(&self, handle: &str, creds: &Credentials) -> Result<()> {
        let json = serde_json::to_string(creds)
            .map_err(|e| Error::Internal(format!("serializing credentials: {e}")))?;
        let entry = self.entry(&Self::key_for(handle))?;
        entry
            .set_password(&json)
            .map_err(|e| Error::Authentication(format!("storing credentials: {e}")))?;

        let mut handles = self.read_index()?;
        if !handles.iter().any(|h| h == handle) {
            handles.push(handle.to_string());
            self.write_index(&handles)?;
        }
        Ok(())
    }

    fn load(&self, handle: &str) -> Result<Credentials> {
        let entry = self.entry(&Self::key_for(handle))?;
        match entry.get_password() {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Internal(format!("corrupt stored credentials: {e}"))),
            Err(keyring::Error::NoEntry) => {
                Err(Error::NotFound(format!("no credentials for handle \"{handle}\"")))
            }
            Err(e) => Err(Error::Authentication(format!("loading credentials: {e}"))),
        }
    }

    fn delete(&self, handle: &str) -> Result<()> {
        let entry = self.entry(&Self::key_for(handle))?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(Error::Authentication(format!("deleting credentials: {e}"))),
        }
        let mut handles = self.read_index()?;
        handles.retain(|h| h != handle);
        self.write_index(&handles)
    }

    fn set_default(&self, handle: &str) -> Result<()> {
        let entry = self.entry(DEFAULT_HANDLE_ACCOUNT)?;
        entry
            .set_password(handle)
            .map_err(|e| Error::Authentication(format!("setting default handle: {e}")))
    }

    fn get_default(&self) -> Result<String> {
        let entry = self.entry(DEFAULT_HANDLE_ACCOUNT)?;
        match entry.get_password() {
            Ok(handle) => Ok(handle),
            Err(keyring::Error::NoEntry) => {
                Err(Error::NotFound("no default handle set".into()))
            }
            Err(e) => Err(Error::Authentication(format!("reading default handle: {e}"))),
        }
    }

    fn list_handles(&self) -> Result<Vec<String>> {
        self.read_index()
    }
}

/// File-backed fallback: one JSON object under the user's config
/// directory, `0600` permissions.
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct FileStore {
    handles: std::collections::BTreeMap<String, Credentials>,
    default_handle: Option<String>,
}

pub struct FileBackend {
    path: std::path::PathBuf,
}

impl FileBackend {
    pub fn new(path: std::path::PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<FileStore> {
        match std::fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| Error::Internal(format!("corrupt credentials file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileStore::default()),
            Err(e) => Err(Error::CacheError(e.to_string())),
        }
    }

    fn write(&self, store: &FileStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::CacheError(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(store)
            .map_err(|e| Error::Internal(format!("serializing credentials file: {e}")))?;

        let dir = self
            .path
            .parent()
            .expect("credentials path always has a parent");
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::CacheError(e.to_string()))?;
        std::io::Write::write_all(&mut tmp, &json).map_err(|e| Error::CacheError(e.to_string()))?;
        set_restrictive_permissions(tmp.path())?;
        tmp.persist(&self.path)
            .map_err(|e| Error::CacheError(e.error.to_string()))?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| Error::CacheError(e.to_string()))
}

#[cfg(not(unix))]
fn set_restrictive_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

impl Backend for FileBackend {
    fn save(&self, handle: &str, creds: &Credentials) -> Result<()> {
        let mut store = self.read()?;
        store.handles.insert(handle.to_string(), creds.clone());
        self.write(&store)
    }

    fn load(&self, handle: &str) -> Result<Credentials> {
        let store = self.read()?;
        store
            .handles
            .get(handle)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no credentials for handle \"{handle}\"")))
    }

    fn delete(&self, handle: &str) -> Result<()> {
        let mut store = self.read()?;
        store.handles.remove(handle);
        if store.default_handle.as_deref() == Some(handle) {
            store.default_handle = None;
        }
        self.write(&store)
    }

    fn set_default(&self, handle: &str) -> Result<()> {
        let mut store = self.read()?;
        store.default_handle = Some(handle.to_string());
        self.write(&store)
    }

    fn get_default(&self) -> Result<String> {
        let store = self.read()?;
        store
            .default_handle
            .ok_or_else(|| Error::NotFound("no default handle set".into()))
    }

    fn list_handles(&self) -> Result<Vec<String>> {
        let store = self.read()?;
        Ok(store.handles.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_creds(handle: &str) -> Credentials {
        Credentials {
            handle: handle.to_string(),
            sid: "did:plc:5cajdgeo6qz32kptlpg4c3lv".into(),
            access_token: "access-xyz".into(),
            refresh_token: "refresh-xyz".into(),
            expires_at: 9999999999,
            scope: "atproto".into(),
            dpop_key_pem: None,
        }
    }

    #[test]
    fn file_backend_save_load_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("credentials.json"));

        backend.save("alice.example", &sample_creds("alice.example")).unwrap();
        let loaded = backend.load("alice.example").unwrap();
        assert_eq!(loaded.access_token, "access-xyz");

        backend.delete("alice.example").unwrap();
        assert!(backend.load("alice.example").is_err());
    }

    #[test]
    fn file_backend_tracks_default_handle() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("credentials.json"));
        assert!(backend.get_default().is_err());

        backend.save("alice.example", &sample_creds("alice.example")).unwrap();
        backend.set_default("alice.example").unwrap();
        assert_eq!(backend.get_default().unwrap(), "alice.example");
    }

    #[test]
    fn file_backend_clears_default_on_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("credentials.json"));
        backend.save("alice.example", &sample_creds("alice.example")).unwrap();
        backend.set_default("alice.example").unwrap();
        backend.delete("alice.example").unwrap();
        assert!(backend.get_default().is_err());
    }

    #[test]
    fn file_backend_lists_handles() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("credentials.json"));
        backend.save("alice.example", &sample_creds("alice.example")).unwrap();
        backend.save("bob.example", &sample_creds("bob.example")).unwrap();
        let mut handles = backend.list_handles().unwrap();
        handles.sort();
        assert_eq!(handles, vec!["alice.example".to_string(), "bob.example".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn file_backend_sets_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let backend = FileBackend::new(path.clone());
        backend.save("alice.example", &sample_creds("alice.example")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
