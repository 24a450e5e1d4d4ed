//! # Providers
//!
//! Capability traits through which the engine reaches external systems.
//! Every method returns `anyhow::Result`: provider failures are opaque to the
//! engine and are passed through to the caller untouched.
//!
//! ## Modules
//!
//! - **`memory`**: in-memory implementations of all three traits, seeded the
//!   same way as the offline mock client

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::editing::EditBatch;
use crate::tree::Snapshot;

/// Reads document bodies and applies edit batches to them.
pub trait DocumentProvider {
    /// Reads the body of `tab_id`, or of the first tab when `None`.
    fn get(&self, document_id: &str, tab_id: Option<&str>) -> anyhow::Result<Snapshot>;

    /// Applies every intent of `batch`, in order, as one remote request.
    fn apply_batch(&self, document_id: &str, batch: EditBatch) -> anyhow::Result<()>;

    /// Creates an empty document and returns its id.
    fn create(&self, title: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOwner {
    pub display_name: String,
    pub email_address: String,
}

/// File metadata as reported by the storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<FileOwner>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Ordering for [`FileQuery`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileOrder {
    #[default]
    ModifiedDescending,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    /// Case-insensitive substring of the file name.
    #[serde(default)]
    pub name_contains: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub page_size: usize,
    #[serde(default)]
    pub order: FileOrder,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            name_contains: None,
            mime_type: None,
            page_size: 10,
            order: FileOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub add_parents: Vec<String>,
    #[serde(default)]
    pub remove_parents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    /// The document text the comment is anchored to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_content: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentReply>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentReply {
    pub id: String,
    pub content: String,
}

/// File storage and comment threads.
pub trait FileProvider {
    fn list_files(&self, query: &FileQuery) -> anyhow::Result<Vec<FileRecord>>;
    fn get_file(&self, file_id: &str) -> anyhow::Result<FileRecord>;
    fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parent_id: Option<&str>,
    ) -> anyhow::Result<FileRecord>;
    fn update_file(&self, file_id: &str, update: &FileUpdate) -> anyhow::Result<FileRecord>;
    /// Copies a file, naming the copy `name` or "Copy of ..." when `None`.
    fn copy_file(&self, file_id: &str, name: Option<&str>) -> anyhow::Result<FileRecord>;
    fn delete_file(&self, file_id: &str) -> anyhow::Result<()>;

    fn list_comments(&self, file_id: &str) -> anyhow::Result<Vec<Comment>>;
    fn get_comment(&self, file_id: &str, comment_id: &str) -> anyhow::Result<Comment>;
    fn create_comment(
        &self,
        file_id: &str,
        content: &str,
        quoted_content: Option<&str>,
    ) -> anyhow::Result<Comment>;
    fn reply_to_comment(
        &self,
        file_id: &str,
        comment_id: &str,
        content: &str,
    ) -> anyhow::Result<CommentReply>;
    fn resolve_comment(&self, file_id: &str, comment_id: &str) -> anyhow::Result<()>;
    fn delete_comment(&self, file_id: &str, comment_id: &str) -> anyhow::Result<()>;
}

/// A block of cells addressed by an A1 range such as `Sheet1!A1:B3`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub range: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub updated_cells: usize,
    pub updated_rows: usize,
}

impl UpdateSummary {
    pub fn of(values: &[Vec<serde_json::Value>]) -> Self {
        Self {
            updated_cells: values.iter().map(Vec::len).sum(),
            updated_rows: values.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: u32,
    pub title: String,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub spreadsheet_id: String,
    pub title: String,
    #[serde(default)]
    pub sheets: Vec<SheetProperties>,
}

/// Tabular values in spreadsheets.
pub trait ValuesProvider {
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> anyhow::Result<ValueRange>;
    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<serde_json::Value>>,
    ) -> anyhow::Result<UpdateSummary>;
    fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<serde_json::Value>>,
    ) -> anyhow::Result<UpdateSummary>;
    /// Clears a range and returns the range actually cleared.
    fn clear_values(&self, spreadsheet_id: &str, range: &str) -> anyhow::Result<String>;
    fn get_spreadsheet(&self, spreadsheet_id: &str) -> anyhow::Result<Spreadsheet>;
    fn create_spreadsheet(&self, title: &str) -> anyhow::Result<Spreadsheet>;
    fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> anyhow::Result<SheetProperties>;
}
