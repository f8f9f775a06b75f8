//! High-score persistence: a single integer kept in a small JSON document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Serialize, Deserialize, Default)]
struct HighScoreDoc {
    #[serde(default)]
    highscore: u32,
}

#[derive(Clone, Debug)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.invaders_score.json`, or the working directory without `HOME`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".invaders_score.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best score on record. Anything unreadable counts as no record.
    pub fn load(&self) -> u32 {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "no high score file");
                return 0;
            }
        };
        match serde_json::from_str::<HighScoreDoc>(&text) {
            Ok(doc) => doc.highscore,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt high score file");
                0
            }
        }
    }

    pub fn save(&self, score: u32) -> Result<(), StoreError> {
        let body =
            serde_json::to_string(&HighScoreDoc { highscore: score }).map_err(StoreError::Encode)?;
        fs::write(&self.path, body).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(score, path = %self.path.display(), "saved high score");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("invaders-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let store = HighScoreStore::new(scratch("missing"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn save_then_load() {
        let path = scratch("roundtrip");
        let store = HighScoreStore::new(&path);
        store.save(1234).unwrap();
        assert_eq!(store.load(), 1234);
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"highscore":1234}"#);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_reads_as_zero() {
        let path = scratch("corrupt");
        fs::write(&path, "not json").unwrap();
        assert_eq!(HighScoreStore::new(&path).load(), 0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let store = HighScoreStore::new(std::env::temp_dir().join("no-such-dir-invaders/score.json"));
        assert!(matches!(store.save(1), Err(StoreError::Io { .. })));
    }
}
