//! FRED API key lookup.
//!
//! The key comes from the `FRED_API_KEY` environment variable (a `.env`
//! file works too) or, failing that, the OS keychain. It is never written
//! to the config or preference files.

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "FRED_API_KEY";

const SERVICE_NAME: &str = "fredboard";
const KEYCHAIN_USER: &str = "fred-api-key";

pub struct CredentialStore;

impl CredentialStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, KEYCHAIN_USER).context("Failed to create keyring entry")
    }

    /// Store the API key in the OS keychain
    pub fn store(api_key: &str) -> Result<()> {
        Self::entry()?
            .set_password(api_key.trim())
            .context("Failed to store API key in keychain")
    }

    /// Retrieve the API key from the OS keychain
    pub fn get() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve API key from keychain")
    }

    /// Delete the stored API key
    pub fn delete() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete API key from keychain")
    }

    /// Resolve the key: environment first, then keychain.
    pub fn resolve() -> Result<String> {
        if let Some(key) = from_env_value(std::env::var(API_KEY_ENV).ok()) {
            debug!("Using API key from environment");
            return Ok(key);
        }
        let key = Self::get().with_context(|| {
            format!(
                "No FRED API key found. Set {} or run `fredboard key set`",
                API_KEY_ENV
            )
        })?;
        debug!("Using API key from keychain");
        Ok(key)
    }
}

fn from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
