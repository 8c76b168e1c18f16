use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use directories::ProjectDirs;
use tracing::debug;

/// Persists the single opaque session token across process restarts.
///
/// A missing or unreadable file reads as "no token"; the store is cleared
/// only by logout or when the server rejects the token on a profile fetch.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store under the platform data directory.
    pub fn open() -> anyhow::Result<Self> {
        let dirs = ProjectDirs::from("", "", "mealtrack")
            .context("could not resolve a platform data directory")?;
        let dir = dirs.data_dir();
        fs::create_dir_all(dir)
            .with_context(|| format!("create data directory {}", dir.display()))?;
        Ok(Self {
            path: dir.join("session-token"),
        })
    }

    /// Store at an explicit path. Used by tests and overridable setups.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }
        debug!(path = %self.path.display(), "session token restored");
        Some(token.to_string())
    }

    pub fn save(&self, token: &str) -> anyhow::Result<()> {
        fs::write(&self.path, token)
            .with_context(|| format!("write session token to {}", self.path.display()))
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("remove session token {}", self.path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TokenStore {
        TokenStore::at(dir.path().join("session-token"))
    }

    #[test]
    fn save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        assert_eq!(store.load(), None);
        store.save("tok-abc").expect("save");
        assert_eq!(store.load(), Some("tok-abc".to_string()));
        store.clear().expect("clear");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.clear().expect("clear missing file");
        store.clear().expect("clear again");
    }

    #[test]
    fn whitespace_only_file_reads_as_no_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(dir.path().join("session-token"), "  \n").expect("write");
        assert_eq!(store.load(), None);
    }
}
