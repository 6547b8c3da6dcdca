//! Bearer-token storage.
//!
//! A [`CredentialStore`] holds at most one access token. Backends differ
//! only in durability: [`FileStore`] (the default) and [`KeychainStore`]
//! survive restarts, [`MemoryStore`] lives as long as the process. Components never talk to a
//! backend directly; they receive a [`SessionContext`] at construction.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::CredentialBackend;
use crate::{Result, TradexError};

/// Keychain service name used for the stored token.
const SERVICE: &str = "tradex";

/// Keychain entry identifier for the bearer token.
const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage for the single live bearer token.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored token, or `None` if there is none.
    fn get(&self) -> Result<Option<Zeroizing<String>>>;

    /// Replaces the stored token.
    fn set(&self, token: &str) -> Result<()>;

    /// Removes the stored token. Removing an absent token succeeds.
    fn clear(&self) -> Result<()>;
}

/// Volatile in-process store.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<Zeroizing<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Result<Option<Zeroizing<String>>> {
        Ok(lock(&self.token).clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        *lock(&self.token) = Some(Zeroizing::new(token.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        lock(&self.token).take();
        Ok(())
    }
}

/// Durable store backed by the system keychain.
#[derive(Default)]
pub struct KeychainStore;

impl KeychainStore {
    pub fn new() -> Self {
        Self
    }

    fn entry() -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE, ACCESS_TOKEN_KEY)
            .map_err(|e| TradexError::Credential(format!("keyring entry error: {e}")))
    }
}

impl CredentialStore for KeychainStore {
    fn get(&self) -> Result<Option<Zeroizing<String>>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(Zeroizing::new(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TradexError::Credential(format!(
                "failed to read keychain entry: {e}"
            ))),
        }
    }

    /// Stores `token`, then reads it back through a fresh entry so a keychain
    /// that does not persist is reported instead of silently dropping it.
    fn set(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .map_err(|e| TradexError::Credential(format!("failed to save to keychain: {e}")))?;

        match self.get()? {
            Some(stored) if stored.as_str() == token => Ok(()),
            _ => Err(TradexError::Credential(
                "keychain did not retain the token; set TRADEX_CREDENTIAL_STORE=file".into(),
            )),
        }
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(TradexError::Credential(format!(
                "failed to delete keychain entry: {e}"
            ))),
        }
    }
}

/// Durable store holding the token in a single file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Result<Option<Zeroizing<String>>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let contents = Zeroizing::new(contents);
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| Zeroizing::new(token.to_string())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TradexError::Credential(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TradexError::Credential(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| {
            TradexError::Credential(format!("failed to open {}: {e}", self.path.display()))
        })?;
        file.write_all(token.as_bytes()).map_err(|e| {
            TradexError::Credential(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TradexError::Credential(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Shared handle to the credential store, injected into the gateway,
/// the session guard, and the refresh controllers.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// A context over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// A context over the durable backend selected by configuration.
    pub fn from_backend(backend: &CredentialBackend) -> Self {
        match backend {
            CredentialBackend::Keychain => Self::new(Arc::new(KeychainStore::new())),
            CredentialBackend::File(path) => Self::new(Arc::new(FileStore::new(path.clone()))),
        }
    }

    /// Returns the current token. Backend read failures are logged and
    /// read as "no token".
    pub fn get(&self) -> Option<Zeroizing<String>> {
        match self.store.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read stored credential");
                None
            }
        }
    }

    /// Stores `token` as the live credential.
    pub fn set(&self, token: &str) -> Result<()> {
        self.store.set(token)?;
        debug!("stored access token");
        Ok(())
    }

    /// Erases the live credential. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        debug!("cleared access token");
        Ok(())
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_clear() {
        let store = MemoryStore::new();
        assert!(store.get().unwrap().is_none());

        store.set("tok-1").unwrap();
        assert_eq!(store.get().unwrap().as_deref().map(String::as_str), Some("tok-1"));

        store.set("tok-2").unwrap();
        assert_eq!(store.get().unwrap().as_deref().map(String::as_str), Some("tok-2"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn session_context_shares_one_store() {
        let session = SessionContext::in_memory();
        let other = session.clone();

        session.set("shared").unwrap();
        assert!(other.is_present());

        other.clear().unwrap();
        assert!(!session.is_present());
    }

    #[test]
    fn file_backend_selected_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        let session = SessionContext::from_backend(&CredentialBackend::File(path.clone()));

        session.set("from-config").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "from-config");
    }
}
