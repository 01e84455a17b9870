//! Session cookies and their on-disk copy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Cookie name/value pairs for the forum's domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect cookies from `Set-Cookie` header values.
    pub fn from_set_cookie_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for header in headers {
            jar.add_set_cookie(header);
        }
        jar
    }

    /// Store the name/value pair of one `Set-Cookie` header; attributes are
    /// ignored.
    pub fn add_set_cookie(&mut self, header: &str) {
        let pair = header.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.cookies.insert(name.to_string(), value.trim().to_string());
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Value for a `Cookie` request header, `None` when the jar is empty.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Persisted copy of the session cookies.
///
/// The file holds the jar as JSON. An empty file means "logged out".
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved cookies.
    ///
    /// Returns `None` when the file is missing, empty, holds an empty jar, or
    /// cannot be parsed (a corrupt file just means logging in again).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn load(&self) -> Result<Option<CookieJar>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<CookieJar>(&contents) {
            Ok(jar) if !jar.is_empty() => {
                debug!(path = %self.path.display(), cookies = jar.len(), "Loaded saved session");
                Ok(Some(jar))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable cookie file: {e}");
                Ok(None)
            }
        }
    }

    /// Overwrite the file with the given jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, jar: &CookieJar) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(jar)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Empty the file, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be truncated.
    pub async fn truncate(&self) -> Result<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => {
                tokio::fs::write(&self.path, b"").await?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
