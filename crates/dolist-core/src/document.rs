//! Per-user document storage.
//!
//! Each API key owns one JSON document holding two lists and the time of the
//! last write. The document lives at `<data_dir>/<sha256(key)>.json`. The
//! hash only turns an arbitrary key into a fixed-length, filesystem-safe file
//! name; the key itself stays the secret.
//!
//! A missing file means "never written" and reads as
//! [`UserDocument::empty`]. A file that exists but cannot be read or parsed
//! is an error, never an empty document.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::DocumentError;

/// File extension for stored documents.
const DOCUMENT_EXTENSION: &str = "json";

/// The persisted per-user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    pub dolist: Vec<Value>,
    pub downlist: Vec<Value>,
    /// RFC 3339 UTC timestamp of the last write, `None` before the first one.
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

impl UserDocument {
    /// The document returned for a key that has never written anything.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            dolist: Vec::new(),
            downlist: Vec::new(),
            updated_at: None,
        }
    }
}

/// The list fields a client submits in a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub dolist: Vec<Value>,
    pub downlist: Vec<Value>,
}

impl DocumentUpdate {
    /// Parse a request body.
    ///
    /// An empty body, or a JSON value that is not an object, carries no
    /// fields. Each field independently falls back to an empty list when it
    /// is absent or falsy (`null`, `false`, `0`, `""`).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidUpdate`] if the body is not JSON or a
    /// field holds a truthy value that is not an array.
    pub fn from_json_body(body: &[u8]) -> Result<Self, DocumentError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|e| DocumentError::InvalidUpdate {
                reason: format!("body is not valid JSON: {e}"),
            })?;

        let Value::Object(fields) = value else {
            return Ok(Self::default());
        };

        Ok(Self {
            dolist: list_field(fields.get("dolist"), "dolist")?,
            downlist: list_field(fields.get("downlist"), "downlist")?,
        })
    }
}

fn list_field(value: Option<&Value>, name: &str) -> Result<Vec<Value>, DocumentError> {
    match value {
        None => Ok(Vec::new()),
        Some(v) if is_falsy(v) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(DocumentError::InvalidUpdate {
            reason: format!("'{name}' must be an array"),
        }),
    }
}

#[allow(clippy::float_cmp)]
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Derive the storage file stem for an API key: lowercase hex SHA-256.
#[must_use]
pub fn document_id(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads and writes user documents under a data directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    /// Use `data_dir` without touching the filesystem.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Use `data_dir`, creating it (and parents) if missing.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::DataDir`] if the directory cannot be created.
    pub async fn initialize(data_dir: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let store = Self::new(data_dir);
        tokio::fs::create_dir_all(&store.data_dir)
            .await
            .map_err(|e| DocumentError::DataDir {
                path: store.data_dir.display().to_string(),
                reason: e.to_string(),
            })?;
        info!(path = %store.data_dir.display(), "data directory ready");
        Ok(store)
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the document owned by `api_key`. Pure; does no I/O.
    #[must_use]
    pub fn user_data_path(&self, api_key: &str) -> PathBuf {
        self.data_dir
            .join(document_id(api_key))
            .with_extension(DOCUMENT_EXTENSION)
    }

    /// Read the document for `api_key`, verbatim as stored.
    ///
    /// Returns the canonical empty document if nothing has been written.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Read`] for any I/O failure other than "not found".
    /// - [`DocumentError::Corrupt`] if the file is not valid JSON.
    pub async fn read(&self, api_key: &str) -> Result<Value, DocumentError> {
        let path = self.user_data_path(api_key);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no document yet, returning empty document");
                return empty_document_value(&path);
            }
            Err(e) => {
                return Err(DocumentError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_slice(&raw).map_err(|e| DocumentError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Overwrite the document for `api_key` and return its new `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Write`] if the file cannot be written.
    pub async fn write(
        &self,
        api_key: &str,
        update: DocumentUpdate,
    ) -> Result<String, DocumentError> {
        let path = self.user_data_path(api_key);
        let updated_at = timestamp_now();
        let document = UserDocument {
            dolist: update.dolist,
            downlist: update.downlist,
            updated_at: Some(updated_at.clone()),
        };

        let bytes = serde_json::to_vec_pretty(&document).map_err(|e| DocumentError::Write {
            path: path.display().to_string(),
            reason: format!("serialization failed: {e}"),
        })?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DocumentError::Write {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            dolist = document.dolist.len(),
            downlist = document.downlist.len(),
            "document written"
        );

        Ok(updated_at)
    }
}

fn empty_document_value(path: &Path) -> Result<Value, DocumentError> {
    serde_json::to_value(UserDocument::empty()).map_err(|e| DocumentError::Read {
        path: path.display().to_string(),
        reason: format!("serialization failed: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_document_serializes_canonically() {
        let value = serde_json::to_value(UserDocument::empty()).unwrap();
        assert_eq!(value, json!({"dolist": [], "downlist": [], "updatedAt": null}));
    }

    #[test]
    fn document_id_is_deterministic_hex() {
        let a = document_id("abc123");
        assert_eq!(a, document_id("abc123"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            a,
            "6ca13d52ca70c883e0f0bb101e425a89e8624de51db2d2392593af6a84118090"
        );
    }

    #[test]
    fn distinct_keys_map_to_distinct_paths() {
        let store = DocumentStore::new("/data");
        let keys: Vec<String> = (0..256).map(|i| format!("key-{i}")).collect();
        let mut paths: Vec<PathBuf> = keys.iter().map(|k| store.user_data_path(k)).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), keys.len());
    }

    #[test]
    fn user_data_path_is_under_data_dir() {
        let store = DocumentStore::new("/srv/dolist/data");
        let path = store.user_data_path("../../etc/passwd");
        assert_eq!(path.parent(), Some(Path::new("/srv/dolist/data")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }

    #[test]
    fn timestamp_has_millis_and_z_suffix() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), "2024-05-01T12:00:00.000Z".len());
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn update_from_empty_body_defaults() {
        assert_eq!(DocumentUpdate::from_json_body(b"").unwrap(), DocumentUpdate::default());
        assert_eq!(DocumentUpdate::from_json_body(b"  \n").unwrap(), DocumentUpdate::default());
    }

    #[test]
    fn update_fields_default_independently() {
        let update = DocumentUpdate::from_json_body(br#"{"dolist":["x"]}"#).unwrap();
        assert_eq!(update.dolist, vec![json!("x")]);
        assert!(update.downlist.is_empty());
    }

    #[test]
    fn update_falsy_values_become_empty() {
        for falsy in ["null", "false", "0", "0.0", "\"\""] {
            let body = format!(r#"{{"dolist":{falsy},"downlist":{falsy}}}"#);
            let update = DocumentUpdate::from_json_body(body.as_bytes()).unwrap();
            assert_eq!(update, DocumentUpdate::default(), "{falsy} should be falsy");
        }
    }

    #[test]
    fn update_keeps_arbitrary_items() {
        let body = br#"{"dolist":[1,{"a":true},null],"downlist":[["nested"]]}"#;
        let update = DocumentUpdate::from_json_body(body).unwrap();
        assert_eq!(update.dolist, vec![json!(1), json!({"a": true}), Value::Null]);
        assert_eq!(update.downlist, vec![json!(["nested"])]);
    }

    #[test]
    fn update_non_object_body_has_no_fields() {
        let update = DocumentUpdate::from_json_body(b"[1,2,3]").unwrap();
        assert_eq!(update, DocumentUpdate::default());
    }

    #[test]
    fn update_rejects_invalid_json_and_truthy_non_arrays() {
        assert!(DocumentUpdate::from_json_body(b"{oops").is_err());
        assert!(DocumentUpdate::from_json_body(br#"{"dolist":"text"}"#).is_err());
        assert!(DocumentUpdate::from_json_body(br#"{"downlist":{"a":1}}"#).is_err());
        assert!(DocumentUpdate::from_json_body(br#"{"dolist":true}"#).is_err());
    }

    #[tokio::test]
    async fn read_before_write_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let doc = store.read("abc123").await.unwrap();
        assert_eq!(doc, json!({"dolist": [], "downlist": [], "updatedAt": null}));
        assert!(!store.user_data_path("abc123").exists());
    }

    #[tokio::test]
    async fn write_then_read_returns_written_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let update = DocumentUpdate {
            dolist: vec![json!("x")],
            downlist: Vec::new(),
        };
        let ts = store.write("abc123", update).await.unwrap();

        let doc = store.read("abc123").await.unwrap();
        assert_eq!(doc, json!({"dolist": ["x"], "downlist": [], "updatedAt": ts}));
    }

    #[tokio::test]
    async fn write_fully_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let first = DocumentUpdate {
            dolist: vec![json!("a"), json!("b")],
            downlist: vec![json!("c")],
        };
        store.write("k", first).await.unwrap();
        let ts = store.write("k", DocumentUpdate::default()).await.unwrap();

        let doc = store.read("k").await.unwrap();
        assert_eq!(doc, json!({"dolist": [], "downlist": [], "updatedAt": ts}));
    }

    #[tokio::test]
    async fn sequential_writes_have_non_decreasing_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let mut previous = String::new();
        for _ in 0..5 {
            let ts = store.write("k", DocumentUpdate::default()).await.unwrap();
            assert!(ts >= previous, "{ts} < {previous}");
            previous = ts;
        }
    }

    #[tokio::test]
    async fn documents_are_isolated_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let update = DocumentUpdate {
            dolist: vec![json!("mine")],
            downlist: Vec::new(),
        };
        store.write("alice", update).await.unwrap();

        let other = store.read("bob").await.unwrap();
        assert_eq!(other, serde_json::to_value(UserDocument::empty()).unwrap());
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        std::fs::write(store.user_data_path("k"), "{truncated").unwrap();

        let err = store.read("k").await.unwrap_err();
        assert!(matches!(err, DocumentError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn stored_document_is_returned_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        std::fs::write(store.user_data_path("k"), r#"{"dolist":[1],"extra":"kept"}"#).unwrap();

        let doc = store.read("k").await.unwrap();
        assert_eq!(doc, json!({"dolist": [1], "extra": "kept"}));
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("missing"));

        let err = store.write("k", DocumentUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DocumentError::Write { .. }));
    }

    #[tokio::test]
    async fn initialize_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("a").join("b");

        let store = DocumentStore::initialize(&data_dir).await.unwrap();
        assert!(data_dir.is_dir());
        store.write("k", DocumentUpdate::default()).await.unwrap();
    }
}
