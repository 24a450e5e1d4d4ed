use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use relative_path::RelativePathBuf;
use uuid::Uuid;

use crate::editing::EditBatch;
use crate::providers::DocumentProvider;
use crate::tree::Snapshot;
use crate::wire::WireDocument;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid document id: {0:?}")]
    InvalidDocumentId(String),
}

/// Documents stored as `<id>.json` files in one directory.
///
/// Files hold the remote JSON shape. Applied batches are not replayed onto
/// the document; each is appended as one JSON line to `<id>.batches.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    root: PathBuf,
}

impl JsonDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, document_id: &str) -> Result<PathBuf, IoError> {
        self.file_path(document_id, "json")
    }

    pub fn batches_path(&self, document_id: &str) -> Result<PathBuf, IoError> {
        self.file_path(document_id, "batches.jsonl")
    }

    fn file_path(&self, document_id: &str, extension: &str) -> Result<PathBuf, IoError> {
        validate_document_id(document_id)?;
        Ok(RelativePathBuf::from(format!("{document_id}.{extension}")).to_path(&self.root))
    }

    pub fn read_document(&self, document_id: &str) -> Result<WireDocument, IoError> {
        let path = self.document_path(document_id)?;
        if !path.exists() {
            return Err(IoError::NotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| IoError::Json { path, source })
    }

    pub fn write_document(&self, document: &WireDocument) -> Result<PathBuf, IoError> {
        let path = self.document_path(&document.document_id)?;
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(document).map_err(|source| IoError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Ids of every document in the directory, sorted.
    pub fn list_documents(&self) -> Result<Vec<String>, IoError> {
        if !self.root.is_dir() {
            return Err(IoError::NotFound(self.root.clone()));
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && let Some(id) = name.strip_suffix(".json")
                && validate_document_id(id).is_ok()
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn append_batch(&self, document_id: &str, batch: &EditBatch) -> Result<PathBuf, IoError> {
        let path = self.batches_path(document_id)?;
        let line = serde_json::to_string(batch).map_err(|source| IoError::Json {
            path: path.clone(),
            source,
        })?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;
        Ok(path)
    }
}

/// Ids become file names, so only ASCII letters, digits, `-` and `_` pass.
fn validate_document_id(document_id: &str) -> Result<(), IoError> {
    let valid = !document_id.is_empty()
        && document_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(IoError::InvalidDocumentId(document_id.to_string()))
    }
}

impl DocumentProvider for JsonDirectory {
    fn get(&self, document_id: &str, tab_id: Option<&str>) -> anyhow::Result<Snapshot> {
        let document = self.read_document(document_id)?;
        Ok(document.into_snapshot(tab_id)?)
    }

    fn apply_batch(&self, document_id: &str, batch: EditBatch) -> anyhow::Result<()> {
        let path = self.document_path(document_id)?;
        if !path.exists() {
            return Err(IoError::NotFound(path).into());
        }
        let written = self.append_batch(document_id, &batch)?;
        log::debug!(
            "Recorded {} intents for {document_id} in {}",
            batch.len(),
            written.display()
        );
        Ok(())
    }

    fn create(&self, title: &str) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.write_document(&WireDocument::blank(id.clone(), title))?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{EditIntent, sequence};
    use crate::tree::extract::extract;
    use crate::wire::{WireBody, WireElement};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn directory_with(id: &str, body: &str) -> (TempDir, JsonDirectory) {
        let temp_dir = TempDir::new().unwrap();
        let directory = JsonDirectory::new(temp_dir.path());
        let mut document = WireDocument::blank(id, "Notes");
        document.body = Some(WireBody {
            content: vec![WireElement::text(body)],
        });
        directory.write_document(&document).unwrap();
        (temp_dir, directory)
    }

    #[test]
    fn test_read_written_document() {
        // Given a directory holding one document
        let (_temp_dir, directory) = directory_with("notes", "Hello\n");

        // When reading it back through the provider
        let snapshot = directory.get("notes", None).unwrap();

        // Then the body converts to the same text
        assert_eq!(snapshot.document_id(), "notes");
        assert_eq!(snapshot.title(), Some("Notes"));
        assert_eq!(extract(&snapshot, None).text, "Hello\n");
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let directory = JsonDirectory::new(temp_dir.path());

        let result = directory.read_document("absent");
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_invalid_json_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();
        let directory = JsonDirectory::new(temp_dir.path());

        let err = directory.read_document("broken").unwrap_err();
        assert!(matches!(err, IoError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_ids_cannot_escape_the_directory() {
        let temp_dir = TempDir::new().unwrap();
        let directory = JsonDirectory::new(temp_dir.path());

        for id in ["", "../secret", "a/b", "dot.ted"] {
            assert!(
                matches!(
                    directory.document_path(id),
                    Err(IoError::InvalidDocumentId(_))
                ),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_applied_batches_are_appended_as_json_lines() {
        // Given a document and two batches against it
        let (_temp_dir, directory) = directory_with("notes", "Hello\n");
        let snapshot = directory.get("notes", None).unwrap();

        // When both are applied
        for text in ["A", "B"] {
            let batch = sequence(
                &snapshot,
                [EditIntent::InsertText {
                    at: 1,
                    text: text.into(),
                }],
            )
            .unwrap();
            directory.apply_batch("notes", batch).unwrap();
        }

        // Then each is one line naming the document
        let log = std::fs::read_to_string(directory.batches_path("notes").unwrap()).unwrap();
        let lines: Vec<serde_json::Value> = log
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["documentId"], "notes");
        assert_eq!(lines[1]["intents"][0]["text"], "B");
    }

    #[test]
    fn test_batches_need_an_existing_document() {
        let (_temp_dir, directory) = directory_with("notes", "Hello\n");
        let snapshot = directory.get("notes", None).unwrap();
        let batch = sequence(&snapshot, [EditIntent::InsertPageBreak { at: 1 }]).unwrap();

        assert!(directory.apply_batch("other", batch).is_err());
        assert!(!directory.batches_path("other").unwrap().exists());
    }

    #[test]
    fn test_create_and_list() {
        let (_temp_dir, directory) = directory_with("notes", "Hello\n");
        let id = directory.create("Fresh").unwrap();

        let mut expected = vec![id.clone(), "notes".to_string()];
        expected.sort();
        assert_eq!(directory.list_documents().unwrap(), expected);
        assert_eq!(
            extract(&directory.get(&id, None).unwrap(), None).text,
            "\n"
        );
    }
}
