use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::parser::parse_session;
use crate::types::RawSession;

/// File name prefix of session records, as written by PHP's file session handler.
/// Record contents may be PHP-serialized or JSON, see [`crate::parser::decode_session`].
pub const DEFAULT_PREFIX: &str = "sess_";

/// A record that could not be decoded.
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub error: String,
}

/// Result of loading a whole session directory.
#[derive(Debug, Default)]
pub struct LoadedSessions {
    pub sessions: Vec<RawSession>,
    pub skipped: Vec<SkippedRecord>,
}

/// Provides access to session files on disk.
pub struct SessionStore {
    sessions_dir: PathBuf,
    prefix: String,
}

impl SessionStore {
    /// Create a SessionStore over `sessions_dir` using the default `sess_` prefix.
    pub fn with_dir(sessions_dir: PathBuf) -> Self {
        Self {
            sessions_dir,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Only files starting with `prefix` are treated as session records.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Paths of all session record files, sorted by file name.
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.sessions_dir)
            .with_context(|| format!("Failed to read sessions dir: {:?}", self.sessions_dir))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_record = path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| name.starts_with(&self.prefix));
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths)
    }

    /// Get a single session by id.
    pub fn get(&self, id: &str) -> Result<RawSession> {
        let path = self.sessions_dir.join(format!("{}{}", self.prefix, id));
        parse_session(&path, &self.prefix)
    }

    /// Decode every record in the directory. Records that fail to decode are
    /// logged and reported in `skipped`; only a directory read failure is an error.
    pub fn load_all(&self) -> Result<LoadedSessions> {
        let mut loaded = LoadedSessions::default();

        for path in self.paths()? {
            match parse_session(&path, &self.prefix) {
                Ok(session) => loaded.sessions.push(session),
                Err(e) => {
                    tracing::warn!("Failed to parse session {:?}: {:#}", path, e);
                    loaded.skipped.push(SkippedRecord {
                        path,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        tracing::debug!(
            dir = ?self.sessions_dir,
            loaded = loaded.sessions.len(),
            skipped = loaded.skipped.len(),
            "Loaded session directory"
        );

        Ok(loaded)
    }
}
