//! File-based store backend.
//!
//! One JSON document per key:
//! ```text
//! {root}/
//!   links.json
//!   admin%3A<token>.json
//!   rate%3A<session>.json
//!   convo%3A<session>.json
//! ```
//!
//! Writes go to a temp file first and are renamed into place.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::error::{StorageError, StorageResult};
use super::kv::KvStore;

/// File-based implementation of `KvStore`.
///
/// The root directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", escape_key(key)))
    }
}

/// Map a key to a portable file stem.
///
/// ASCII alphanumerics, `_`, `.` and `-` pass through; every other byte is
/// written as `%XX`. A leading `.` is escaped so keys never become hidden
/// files or `..`.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, b) in key.bytes().enumerate() {
        let keep = b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || (b == b'.' && i > 0);
        if keep {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let path = self.key_path(key);
        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StorageError::file_deserialization(&path, e.to_string()))
    }

    async fn put(&self, key: &str, value: Value) -> StorageResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::file_io(&self.root, e))?;

        let final_path = self.key_path(key);
        let temp_path = final_path.with_extension("json.tmp");

        let json = serde_json::to_vec(&value)
            .map_err(|e| StorageError::serialization(e.to_string()))?;

        fs::write(&temp_path, &json)
            .await
            .map_err(|e| StorageError::file_io(&temp_path, e))?;

        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StorageError::file_io(&final_path, e))?;

        Ok(())
    }
}
