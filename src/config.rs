//! Application configuration loaded from environment variables.
//!
//! - `TRADEX_API_URL`: base URL of the prediction service
//!   (default `http://localhost:8000`)
//! - `TRADEX_CA_BUNDLE`: optional PEM bundle; when set, only these CAs are trusted
//! - `TRADEX_TOKEN_FILE`: where the bearer token is stored
//!   (default `$XDG_CONFIG_HOME/tradex/token`, else `$HOME/.config/tradex/token`)
//! - `TRADEX_CREDENTIAL_STORE`: `file` (default) or `keychain` to keep the token
//!   in the OS keychain instead

use std::path::PathBuf;

use reqwest::Url;

/// Default service endpoint for a locally running backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub credentials: CredentialBackend,
}

/// Remote service connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub ca_bundle: Option<PathBuf>,
}

impl ApiConfig {
    /// Builds settings for `base_url` with the default trust roots.
    ///
    /// # Errors
    ///
    /// Returns [`TradexError::Config`](crate::TradexError::Config) if the URL
    /// does not parse or is not `http`/`https`.
    pub fn new(base_url: &str) -> crate::Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ca_bundle: None,
        })
    }
}

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialBackend {
    Keychain,
    File(PathBuf),
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`TradexError::Config`](crate::TradexError::Config) if
/// `TRADEX_API_URL` is not a valid `http`/`https` URL, the credential store
/// is unknown, or no token file location can be determined.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let base_url = non_empty_var("TRADEX_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let base_url = parse_base_url(&base_url)?;
    let ca_bundle = non_empty_var("TRADEX_CA_BUNDLE").map(PathBuf::from);
    let credentials = match non_empty_var("TRADEX_CREDENTIAL_STORE").as_deref() {
        None | Some("file") => CredentialBackend::File(token_file()?),
        Some("keychain") => CredentialBackend::Keychain,
        Some(other) => {
            return Err(crate::TradexError::Config(format!(
                "TRADEX_CREDENTIAL_STORE must be \"file\" or \"keychain\", got {other:?}"
            )));
        }
    };

    Ok(AppConfig {
        api: ApiConfig {
            base_url,
            ca_bundle,
        },
        credentials,
    })
}

fn parse_base_url(raw: &str) -> crate::Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| crate::TradexError::Config(format!("invalid TRADEX_API_URL {raw:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        scheme => Err(crate::TradexError::Config(format!(
            "TRADEX_API_URL must be an http or https URL, got scheme {scheme:?}"
        ))),
    }
}

/// Resolves the token file location for the file backend.
fn token_file() -> crate::Result<PathBuf> {
    if let Some(path) = non_empty_var("TRADEX_TOKEN_FILE") {
        return Ok(PathBuf::from(path));
    }
    let config_dir = non_empty_var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty_var("HOME").map(|home| PathBuf::from(home).join(".config")))
        .ok_or_else(|| {
            crate::TradexError::Config(
                "cannot locate a config directory; set TRADEX_TOKEN_FILE".into(),
            )
        })?;
    Ok(config_dir.join("tradex").join("token"))
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
