use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;

/// File-backed access token, one file per bridge host.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

/// First eight characters of the URL-safe base64 encoding of `host`.
pub fn host_key(host: &str) -> String {
    let encoded = base64::engine::general_purpose::URL_SAFE.encode(host.as_bytes());
    encoded.chars().take(8).collect()
}

impl TokenStore {
    /// Store under the user's home directory.
    pub fn for_host(host: &str) -> Result<Self> {
        let home = dirs::home_dir().context("Cannot locate home directory")?;
        Ok(Self::in_dir(&home, host))
    }

    pub fn in_dir(dir: &Path, host: &str) -> Self {
        let path = dir.join(format!(".ewelink_cube_{}_access_token", host_key(host)));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored token, or `None` when the file is missing or blank.
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!("Access token saved to {}", self.path.display());
        Ok(())
    }
}
