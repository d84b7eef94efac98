//! Upload page bookkeeping: selection previews, the rendered file list and
//! the per-row delete control.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Endpoints, Icons, Messages};
use crate::PortalError;

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

fn ext_from_name(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileIcon {
    Photo,
    Document,
}

impl FileIcon {
    pub fn from_file_name(name: &str) -> Self {
        match ext_from_name(name) {
            Some(ext) if PHOTO_EXTENSIONS.contains(&ext.as_str()) => FileIcon::Photo,
            _ => FileIcon::Document,
        }
    }

    pub fn path(self, icons: &Icons) -> &str {
        match self {
            FileIcon::Photo => &icons.photo,
            FileIcon::Document => &icons.document,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub icon: FileIcon,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let icon = FileIcon::from_file_name(&name);
        Self { name, icon }
    }
}

/// Server-confirmed metadata for one uploaded file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub file_name: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl FileRecord {
    /// Where the file name links to. The server's URL wins; otherwise the
    /// download route is derived from the id.
    pub fn href(&self, endpoints: &Endpoints) -> Option<String> {
        match (&self.download_url, self.id) {
            (Some(url), _) if !url.is_empty() => Some(url.clone()),
            (_, Some(id)) => Some(format!("{}/{id}", endpoints.download)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// One entry of the rendered file list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRow {
    pub file_id: Option<u64>,
    pub file_name: String,
    pub href: Option<String>,
}

impl FileRow {
    pub const ID_PREFIX: &'static str = "file-";

    pub fn from_record(record: &FileRecord, endpoints: &Endpoints) -> Self {
        Self {
            file_id: record.id,
            file_name: record.file_name.clone(),
            href: record.href(endpoints),
        }
    }

    pub fn element_id(&self) -> Option<String> {
        self.file_id.map(row_element_id)
    }

    /// Rows without a server id cannot be addressed, so they get no delete
    /// control.
    pub fn deletable(&self) -> bool {
        self.file_id.is_some()
    }

    /// Inverse of [`row_element_id`].
    pub fn parse_element_id(element_id: &str) -> Option<u64> {
        element_id.strip_prefix(Self::ID_PREFIX)?.parse().ok()
    }
}

pub fn row_element_id(file_id: u64) -> String {
    format!("{}{file_id}", FileRow::ID_PREFIX)
}

/// Client-side projection of the server's file list, keyed by file id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileList {
    rows: Vec<FileRow>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = FileRow>) -> Self {
        let mut list = Self::new();
        for row in rows {
            list.upsert(row);
        }
        list
    }

    pub fn rows(&self) -> &[FileRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// An empty list is rendered as the "no files" placeholder.
    pub fn needs_placeholder(&self) -> bool {
        self.is_empty()
    }

    pub fn contains(&self, file_id: u64) -> bool {
        self.rows.iter().any(|r| r.file_id == Some(file_id))
    }

    /// Insert or replace by id. Returns `true` when the row is new.
    pub fn upsert(&mut self, row: FileRow) -> bool {
        if let Some(id) = row.file_id {
            if let Some(existing) = self.rows.iter_mut().find(|r| r.file_id == Some(id)) {
                *existing = row;
                return false;
            }
        }
        self.rows.push(row);
        true
    }

    /// Append the records of a successful upload; returns the rows that
    /// have to be rendered.
    pub fn extend_from_records(
        &mut self,
        records: &[FileRecord],
        endpoints: &Endpoints,
    ) -> Vec<FileRow> {
        let mut added = Vec::with_capacity(records.len());
        for record in records {
            let row = FileRow::from_record(record, endpoints);
            if self.upsert(row.clone()) {
                added.push(row);
            } else {
                debug!(file_id = ?row.file_id, "file row already listed, replaced in place");
            }
        }
        added
    }

    /// The list as it would be after adding `records`, together with the
    /// rows to render. `self` is untouched until the caller commits.
    pub fn staged(&self, records: &[FileRecord], endpoints: &Endpoints) -> (Self, Vec<FileRow>) {
        let mut next = self.clone();
        let added = next.extend_from_records(records, endpoints);
        (next, added)
    }

    pub fn remove(&mut self, file_id: u64) -> Option<FileRow> {
        let idx = self.rows.iter().position(|r| r.file_id == Some(file_id))?;
        Some(self.rows.remove(idx))
    }
}

/// Lifecycle of one upload form submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Previewing(Vec<SelectedFile>),
    Uploading,
    Error(String),
}

impl UploadPhase {
    pub fn name(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Previewing(_) => "previewing",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Error(_) => "showing an error",
        }
    }

    fn reject(&self, action: &'static str) -> PortalError {
        PortalError::InvalidTransition {
            action,
            phase: self.name(),
        }
    }

    /// A new file selection replaces any previous preview or error.
    pub fn select<I, S>(&self, names: I) -> Result<Self, PortalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if matches!(self, UploadPhase::Uploading) {
            return Err(self.reject("change the selection"));
        }
        let files: Vec<SelectedFile> = names.into_iter().map(SelectedFile::new).collect();
        if files.is_empty() {
            return Ok(UploadPhase::Idle);
        }
        Ok(UploadPhase::Previewing(files))
    }

    /// Only one upload may be in flight. An empty form is still sent; the
    /// server answers with its own validation detail.
    pub fn submit(&self) -> Result<Self, PortalError> {
        match self {
            UploadPhase::Uploading => Err(self.reject("upload")),
            _ => Ok(UploadPhase::Uploading),
        }
    }

    pub fn succeed(&self) -> Result<Self, PortalError> {
        match self {
            UploadPhase::Uploading => Ok(UploadPhase::Idle),
            other => Err(other.reject("finish an upload")),
        }
    }

    pub fn fail(&self, message: impl Into<String>) -> Result<Self, PortalError> {
        match self {
            UploadPhase::Uploading => Ok(UploadPhase::Error(message.into())),
            other => Err(other.reject("fail an upload")),
        }
    }

    pub fn preview(&self) -> &[SelectedFile] {
        match self {
            UploadPhase::Previewing(files) => files,
            _ => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeleteState {
    Ready,
    Deleting,
}

/// The delete button of one file row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteControl {
    file_id: u64,
    original_label: String,
    state: DeleteState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Drop the row; `show_placeholder` is set when it was the last one.
    Removed { show_placeholder: bool },
    /// Keep the row and put the button back the way it was.
    Restored {
        label: String,
        error: PortalError,
    },
}

impl DeleteControl {
    pub fn new(file_id: u64, original_label: impl Into<String>) -> Self {
        Self {
            file_id,
            original_label: original_label.into(),
            state: DeleteState::Ready,
        }
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    /// Label to display right now.
    pub fn label<'a>(&'a self, messages: &'a Messages) -> &'a str {
        match self.state {
            DeleteState::Ready => &self.original_label,
            DeleteState::Deleting => &messages.deleting_label,
        }
    }

    pub fn begin(&mut self) -> Result<(), PortalError> {
        if self.state == DeleteState::Deleting {
            return Err(PortalError::InvalidTransition {
                action: "delete",
                phase: "deleting",
            });
        }
        self.state = DeleteState::Deleting;
        Ok(())
    }

    /// Settle the request and update `list` accordingly.
    pub fn finish(mut self, result: Result<(), PortalError>, list: &mut FileList) -> DeleteOutcome {
        self.state = DeleteState::Ready;
        match result {
            Ok(()) => {
                list.remove(self.file_id);
                DeleteOutcome::Removed {
                    show_placeholder: list.needs_placeholder(),
                }
            }
            Err(error) => DeleteOutcome::Restored {
                label: self.original_label,
                error,
            },
        }
    }
}
