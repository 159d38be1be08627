//! Persisted login session.
//!
//! Stored in `<base>/session.json` as a keyed document (`{"user": {...}}`) with
//! restricted permissions (0600). Tokens are never logged.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::paths;

/// Key the session record is stored under.
pub const SESSION_KEY: &str = "user";

/// Proof that a user completed OTP verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Opaque user fields returned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Map<String, Value>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(mobile: impl Into<String>) -> Self {
        Self {
            mobile: mobile.into(),
            token: None,
            user: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: Option<Map<String, Value>>) -> Self {
        self.user = user;
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// A display name from the server payload, if it sent one.
    pub fn display_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        ["name", "full_name", "username"]
            .iter()
            .find_map(|key| user.get(*key).and_then(Value::as_str))
            .filter(|name| !name.trim().is_empty())
    }
}

/// On-disk document: key -> stored value.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(flatten)]
    entries: BTreeMap<String, Value>,
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the otpgate home directory.
    pub fn default_location() -> Self {
        Self::at(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session.
    /// Returns `None` if the file or the session key doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or holds malformed JSON.
    pub fn load(&self) -> Result<Option<Session>> {
        let file = self.read_file()?;
        let Some(value) = file.entries.get(SESSION_KEY) else {
            return Ok(None);
        };
        let session = serde_json::from_value(value.clone()).with_context(|| {
            format!(
                "Failed to parse session '{SESSION_KEY}' in {}",
                self.path.display()
            )
        })?;
        Ok(Some(session))
    }

    /// Saves the session, keeping any other keys in the file.
    ///
    /// A malformed file is replaced.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or written.
    pub fn save(&self, session: &Session) -> Result<()> {
        let mut file = self.read_file_or_reset()?;
        let value = serde_json::to_value(session).context("Failed to serialize session")?;
        file.entries.insert(SESSION_KEY.to_string(), value);
        self.write_file(&file)?;
        tracing::info!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Removes the session. Returns whether one was stored.
    ///
    /// The file is deleted once it holds no keys. A malformed file is deleted
    /// and counts as a stored session.
    ///
    /// # Errors
    /// Returns an error if the file can't be read, written, or removed.
    pub fn clear(&self) -> Result<bool> {
        let mut file = match self.read_file() {
            Ok(file) => file,
            Err(e) if e.is::<serde_json::Error>() => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %format!("{e:#}"),
                    "removing malformed session file"
                );
                fs::remove_file(&self.path)
                    .with_context(|| format!("Failed to remove {}", self.path.display()))?;
                return Ok(true);
            }
            Err(e) => return Err(e),
        };
        let existed = file.entries.remove(SESSION_KEY).is_some();
        if file.entries.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)
                    .with_context(|| format!("Failed to remove {}", self.path.display()))?;
            }
        } else if existed {
            self.write_file(&file)?;
        }
        if existed {
            tracing::info!(path = %self.path.display(), "session cleared");
        }
        Ok(existed)
    }

    fn read_file(&self) -> Result<SessionFile> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(SessionFile::default());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session file {}", self.path.display()))
    }

    /// Like `read_file`, but a malformed file yields an empty document.
    fn read_file_or_reset(&self) -> Result<SessionFile> {
        match self.read_file() {
            Err(e) if e.is::<serde_json::Error>() => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %format!("{e:#}"),
                    "replacing malformed session file"
                );
                Ok(SessionFile::default())
            }
            other => other,
        }
    }

    /// Writes the file with restricted permissions (0600 on Unix).
    ///
    /// Goes through a temp file + rename so a crash never leaves a partial file.
    fn write_file(&self, file: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(file).context("Failed to serialize session")?;
        let tmp_path = self.path.with_extension("json.tmp");

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut out = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            out.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut out = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            out.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
