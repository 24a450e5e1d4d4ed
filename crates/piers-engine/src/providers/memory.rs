//! In-memory providers.
//!
//! `seeded()` constructors reproduce the fixed data served by the offline
//! mock client; `default()` starts empty. Documents keep their body as the
//! remote JSON shape so reads go through the same conversion as real ones.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, anyhow, bail};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::{
    Comment, CommentReply, DocumentProvider, FileOrder, FileOwner, FileProvider, FileQuery,
    FileRecord, FileUpdate, SheetProperties, Spreadsheet, UpdateSummary, ValueRange,
    ValuesProvider,
};
use crate::editing::EditBatch;
use crate::tree::Snapshot;
use crate::wire::WireDocument;

pub const MOCK_DOCUMENT_ID: &str = "mock-doc-id-123";
pub const MOCK_SPREADSHEET_ID: &str = "mock-sheet-id-456";

const DOCUMENT_MIME: &str = "application/vnd.google-apps.document";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Documents held in memory. Applied batches are recorded, not replayed.
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    documents: RwLock<HashMap<String, WireDocument>>,
    applied: Mutex<Vec<EditBatch>>,
}

impl MemoryDocuments {
    pub fn seeded() -> Self {
        let mut doc = WireDocument::blank(MOCK_DOCUMENT_ID, "Mock Document");
        doc.body = Some(crate::wire::WireBody {
            content: vec![crate::wire::WireElement::text(
                "Hello from the mock document.\n",
            )],
        });
        Self::default().with_document(doc)
    }

    pub fn with_document(self, document: WireDocument) -> Self {
        self.documents
            .write()
            .insert(document.document_id.clone(), document);
        self
    }

    /// Drains every batch applied so far.
    pub fn take_applied(&self) -> Vec<EditBatch> {
        std::mem::take(&mut *self.applied.lock())
    }
}

impl DocumentProvider for MemoryDocuments {
    fn get(&self, document_id: &str, tab_id: Option<&str>) -> anyhow::Result<Snapshot> {
        let document = self
            .documents
            .read()
            .get(document_id)
            .cloned()
            .ok_or_else(|| anyhow!("document {document_id} not found"))?;
        let snapshot = document
            .into_snapshot(tab_id)
            .with_context(|| format!("failed to convert document {document_id}"))?;
        Ok(snapshot)
    }

    fn apply_batch(&self, document_id: &str, batch: EditBatch) -> anyhow::Result<()> {
        if !self.documents.read().contains_key(document_id) {
            bail!("document {document_id} not found");
        }
        if batch.document_id() != document_id {
            bail!(
                "batch was sequenced for document {}, not {document_id}",
                batch.document_id()
            );
        }
        self.applied.lock().push(batch);
        Ok(())
    }

    fn create(&self, title: &str) -> anyhow::Result<String> {
        let id = new_id();
        self.documents
            .write()
            .insert(id.clone(), WireDocument::blank(id.clone(), title));
        Ok(id)
    }
}

/// Files and comment threads held in memory.
#[derive(Debug, Default)]
pub struct MemoryFiles {
    files: RwLock<Vec<FileRecord>>,
    comments: RwLock<HashMap<String, Vec<Comment>>>,
}

impl MemoryFiles {
    pub fn seeded() -> Self {
        let owner = FileOwner {
            display_name: "Test User".into(),
            email_address: "test@example.com".into(),
        };
        let files = vec![
            FileRecord {
                id: MOCK_DOCUMENT_ID.into(),
                name: "Mock Document".into(),
                mime_type: Some(DOCUMENT_MIME.into()),
                created_time: Some("2025-01-01T08:00:00.000Z".into()),
                modified_time: Some("2025-01-15T10:30:00.000Z".into()),
                web_view_link: Some(format!(
                    "https://docs.google.com/document/d/{MOCK_DOCUMENT_ID}/edit"
                )),
                owners: vec![owner.clone()],
                parents: vec![],
            },
            FileRecord {
                id: MOCK_SPREADSHEET_ID.into(),
                name: "Mock Spreadsheet".into(),
                mime_type: Some(SPREADSHEET_MIME.into()),
                created_time: Some("2025-01-02T08:00:00.000Z".into()),
                modified_time: Some("2025-01-14T09:00:00.000Z".into()),
                web_view_link: Some(format!(
                    "https://docs.google.com/spreadsheets/d/{MOCK_SPREADSHEET_ID}/edit"
                )),
                owners: vec![owner],
                parents: vec![],
            },
        ];
        Self {
            files: RwLock::new(files),
            comments: RwLock::default(),
        }
    }

    fn comment_mut<T>(
        &self,
        file_id: &str,
        comment_id: &str,
        f: impl FnOnce(&mut Comment) -> T,
    ) -> anyhow::Result<T> {
        let mut comments = self.comments.write();
        let comment = comments
            .get_mut(file_id)
            .and_then(|thread| thread.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| anyhow!("comment {comment_id} not found on file {file_id}"))?;
        Ok(f(comment))
    }
}

impl FileProvider for MemoryFiles {
    fn list_files(&self, query: &FileQuery) -> anyhow::Result<Vec<FileRecord>> {
        let needle = query.name_contains.as_deref().map(str::to_lowercase);
        let mut files: Vec<FileRecord> = self
            .files
            .read()
            .iter()
            .filter(|f| {
                needle
                    .as_deref()
                    .is_none_or(|n| f.name.to_lowercase().contains(n))
            })
            .filter(|f| {
                query
                    .mime_type
                    .as_deref()
                    .is_none_or(|m| f.mime_type.as_deref() == Some(m))
            })
            .cloned()
            .collect();
        match query.order {
            FileOrder::Name => files.sort_by(|a, b| a.name.cmp(&b.name)),
            FileOrder::ModifiedDescending => {
                files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time))
            }
        }
        files.truncate(query.page_size);
        Ok(files)
    }

    fn get_file(&self, file_id: &str) -> anyhow::Result<FileRecord> {
        self.files
            .read()
            .iter()
            .find(|f| f.id == file_id)
            .cloned()
            .ok_or_else(|| anyhow!("file {file_id} not found"))
    }

    fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> anyhow::Result<FileRecord> {
        let record = FileRecord {
            id: new_id(),
            name: name.to_string(),
            mime_type: Some(mime_type.to_string()),
            parents: parent_id.map(str::to_string).into_iter().collect(),
            ..FileRecord::default()
        };
        self.files.write().push(record.clone());
        Ok(record)
    }

    fn update_file(&self, file_id: &str, update: &FileUpdate) -> anyhow::Result<FileRecord> {
        let mut files = self.files.write();
        let file = files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| anyhow!("file {file_id} not found"))?;
        if let Some(name) = &update.name {
            file.name = name.clone();
        }
        file.parents.retain(|p| !update.remove_parents.contains(p));
        for parent in &update.add_parents {
            if !file.parents.contains(parent) {
                file.parents.push(parent.clone());
            }
        }
        Ok(file.clone())
    }

    fn copy_file(&self, file_id: &str, name: Option<&str>) -> anyhow::Result<FileRecord> {
        let original = self.get_file(file_id)?;
        let copy = FileRecord {
            id: new_id(),
            name: name.map_or_else(|| format!("Copy of {}", original.name), str::to_string),
            web_view_link: None,
            ..original
        };
        self.files.write().push(copy.clone());
        Ok(copy)
    }

    fn delete_file(&self, file_id: &str) -> anyhow::Result<()> {
        let mut files = self.files.write();
        let before = files.len();
        files.retain(|f| f.id != file_id);
        if files.len() == before {
            bail!("file {file_id} not found");
        }
        self.comments.write().remove(file_id);
        Ok(())
    }

    fn list_comments(&self, file_id: &str) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .comments
            .read()
            .get(file_id)
            .cloned()
            .unwrap_or_default())
    }

    fn get_comment(&self, file_id: &str, comment_id: &str) -> anyhow::Result<Comment> {
        self.comment_mut(file_id, comment_id, |c| c.clone())
    }

    fn create_comment(
        &self,
        file_id: &str,
        content: &str,
        quoted_content: Option<&str>,
    ) -> anyhow::Result<Comment> {
        self.get_file(file_id)?;
        let comment = Comment {
            id: new_id(),
            content: content.to_string(),
            quoted_content: quoted_content.map(str::to_string),
            ..Comment::default()
        };
        self.comments
            .write()
            .entry(file_id.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    fn reply_to_comment(
        &self,
        file_id: &str,
        comment_id: &str,
        content: &str,
    ) -> anyhow::Result<CommentReply> {
        let reply = CommentReply {
            id: new_id(),
            content: content.to_string(),
        };
        self.comment_mut(file_id, comment_id, |c| c.replies.push(reply.clone()))?;
        Ok(reply)
    }

    fn resolve_comment(&self, file_id: &str, comment_id: &str) -> anyhow::Result<()> {
        self.comment_mut(file_id, comment_id, |c| c.resolved = true)
    }

    fn delete_comment(&self, file_id: &str, comment_id: &str) -> anyhow::Result<()> {
        let mut comments = self.comments.write();
        let thread = comments.get_mut(file_id);
        match thread {
            Some(thread) if thread.iter().any(|c| c.id == comment_id) => {
                thread.retain(|c| c.id != comment_id);
                Ok(())
            }
            _ => bail!("comment {comment_id} not found on file {file_id}"),
        }
    }
}

#[derive(Debug, Default)]
struct SheetBook {
    title: String,
    sheets: Vec<SheetProperties>,
    /// Cell blocks keyed by the exact range string they were written to.
    ranges: BTreeMap<String, Vec<Vec<serde_json::Value>>>,
}

/// Spreadsheets held in memory.
#[derive(Debug, Default)]
pub struct MemoryValues {
    books: RwLock<HashMap<String, SheetBook>>,
}

impl MemoryValues {
    pub fn seeded() -> Self {
        let mut ranges = BTreeMap::new();
        ranges.insert(
            "Sheet1!A1:B3".to_string(),
            vec![
                vec!["Name".into(), "Score".into()],
                vec!["Alice".into(), "95".into()],
                vec!["Bob".into(), "87".into()],
            ],
        );
        let book = SheetBook {
            title: "Mock Spreadsheet".into(),
            sheets: vec![SheetProperties {
                sheet_id: 0,
                title: "Sheet1".into(),
                index: 0,
            }],
            ranges,
        };
        let values = Self::default();
        values.books.write().insert(MOCK_SPREADSHEET_ID.into(), book);
        values
    }

    fn with_book<T>(
        &self,
        spreadsheet_id: &str,
        f: impl FnOnce(&mut SheetBook) -> T,
    ) -> anyhow::Result<T> {
        let mut books = self.books.write();
        let book = books
            .get_mut(spreadsheet_id)
            .ok_or_else(|| anyhow!("spreadsheet {spreadsheet_id} not found"))?;
        Ok(f(book))
    }
}

impl ValuesProvider for MemoryValues {
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> anyhow::Result<ValueRange> {
        self.with_book(spreadsheet_id, |book| ValueRange {
            range: range.to_string(),
            values: book.ranges.get(range).cloned().unwrap_or_default(),
        })
    }

    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<serde_json::Value>>,
    ) -> anyhow::Result<UpdateSummary> {
        let summary = UpdateSummary::of(&values);
        self.with_book(spreadsheet_id, |book| {
            book.ranges.insert(range.to_string(), values);
        })?;
        Ok(summary)
    }

    fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<serde_json::Value>>,
    ) -> anyhow::Result<UpdateSummary> {
        let summary = UpdateSummary::of(&values);
        self.with_book(spreadsheet_id, |book| {
            book.ranges
                .entry(range.to_string())
                .or_default()
                .extend(values);
        })?;
        Ok(summary)
    }

    fn clear_values(&self, spreadsheet_id: &str, range: &str) -> anyhow::Result<String> {
        self.with_book(spreadsheet_id, |book| {
            book.ranges.remove(range);
            range.to_string()
        })
    }

    fn get_spreadsheet(&self, spreadsheet_id: &str) -> anyhow::Result<Spreadsheet> {
        self.with_book(spreadsheet_id, |book| Spreadsheet {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: book.title.clone(),
            sheets: book.sheets.clone(),
        })
    }

    fn create_spreadsheet(&self, title: &str) -> anyhow::Result<Spreadsheet> {
        let id = new_id();
        let sheet = SheetProperties {
            sheet_id: 0,
            title: "Sheet1".into(),
            index: 0,
        };
        self.books.write().insert(
            id.clone(),
            SheetBook {
                title: title.to_string(),
                sheets: vec![sheet.clone()],
                ranges: BTreeMap::new(),
            },
        );
        Ok(Spreadsheet {
            spreadsheet_id: id,
            title: title.to_string(),
            sheets: vec![sheet],
        })
    }

    fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> anyhow::Result<SheetProperties> {
        self.with_book(spreadsheet_id, |book| {
            if book.sheets.iter().any(|s| s.title == title) {
                return Err(anyhow!("sheet {title:?} already exists"));
            }
            let sheet = SheetProperties {
                sheet_id: book.sheets.iter().map(|s| s.sheet_id + 1).max().unwrap_or(0),
                title: title.to_string(),
                index: book.sheets.len(),
            };
            book.sheets.push(sheet.clone());
            Ok(sheet)
        })?
    }
}
