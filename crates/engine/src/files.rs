//! Attachments in file cells.
//!
//! Uploads are optimistic: accepted files appear at once as placeholders
//! (no `url`) in the open editor's draft, and are swapped for the host's
//! descriptors when the upload hook resolves. Removal is optimistic too and
//! is rolled back if the delete hook fails.

use cellgrid_core::{CellPosition, CellValue, CellVariant, ColumnDescriptor, FileDescriptor};

use crate::collaborators::{CellUpdate, FileDeleteRequest, FileUploadRequest, PendingFile};
use crate::editing::EditBuffer;
use crate::error::GridError;
use crate::events::{count_noun, Notice};
use crate::grid::GridEngine;

fn files_of(value: &CellValue) -> Vec<FileDescriptor> {
    match value {
        CellValue::Files(files) => files.clone(),
        _ => Vec::new(),
    }
}

impl GridEngine {
    fn file_column(&self, position: &CellPosition) -> Result<ColumnDescriptor, GridError> {
        let column = self.validate_position(position)?;
        match column.variant {
            CellVariant::File { .. } => Ok(column),
            _ => Err(GridError::WrongVariant { column: column.id, expected: "file" }),
        }
    }

    /// Files shown for a cell: the open draft if this cell is being edited,
    /// else the stored value.
    pub fn cell_files(&self, position: &CellPosition) -> Vec<FileDescriptor> {
        let draft = self.edit.borrow().as_ref().filter(|s| s.position == *position).map(|s| match &s.buffer {
            EditBuffer::Value(value) => files_of(value),
            EditBuffer::Text(_) => Vec::new(),
        });
        draft.unwrap_or_else(|| files_of(&self.cell_value(position)))
    }

    /// True while `file_id` is a placeholder awaiting its upload.
    pub fn is_uploading(&self, file_id: &str) -> bool {
        self.uploading.borrow().contains(file_id)
    }

    fn set_draft_files(&self, generation: Option<u64>, files: Vec<FileDescriptor>) {
        if let Some(generation) = generation {
            self.with_session(generation, |session| session.buffer = EditBuffer::Value(CellValue::Files(files)));
        }
    }

    /// Validate and upload files into a file cell. Rejected files are
    /// reported through the notifier; the accepted ones are uploaded in one
    /// hook call. Returns the descriptors the host issued.
    pub async fn add_files(
        &self,
        position: CellPosition,
        files: Vec<PendingFile>,
    ) -> Result<Vec<FileDescriptor>, GridError> {
        self.ensure_mounted()?;
        let column = self.file_column(&position)?;
        if !self.is_column_writable(&column) {
            return Ok(Vec::new());
        }
        let Some(upload) = self.hooks.files_upload.as_ref() else {
            log::debug!("no upload hook; ignoring {} file(s)", files.len());
            return Ok(Vec::new());
        };

        let existing = self.cell_files(&position);
        let mut accepted = Vec::new();
        for file in files {
            match column.variant.accepts_file(&file.name, file.size, &file.mime_type, existing.len() + accepted.len()) {
                Ok(()) => accepted.push(file),
                Err(rejection) => self.notify(Notice::error(rejection.to_string())),
            }
        }
        if accepted.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<FileDescriptor> = accepted
            .iter()
            .map(|file| FileDescriptor {
                id: uuid::Uuid::new_v4().to_string(),
                name: file.name.clone(),
                size: file.size,
                mime_type: file.mime_type.clone(),
                url: None,
            })
            .collect();
        let placeholder_ids: Vec<String> = placeholders.iter().map(|f| f.id.clone()).collect();
        self.uploading.borrow_mut().extend(placeholder_ids.iter().cloned());

        let generation = self.session_generation(&position);
        self.set_draft_files(generation, existing.iter().chain(&placeholders).cloned().collect());

        let request = FileUploadRequest {
            files: accepted,
            row_index: position.row_index,
            column_id: position.column_id.clone(),
        };
        let result = upload(request).await;

        {
            let mut uploading = self.uploading.borrow_mut();
            for id in &placeholder_ids {
                uploading.remove(id);
            }
        }
        if !self.is_mounted() {
            return Ok(Vec::new());
        }

        // The draft may have changed while uploading; only swap our own
        // placeholders.
        let without_placeholders: Vec<FileDescriptor> = self
            .cell_files(&position)
            .into_iter()
            .filter(|f| !placeholder_ids.contains(&f.id))
            .collect();

        match result {
            Ok(uploaded) => {
                let stored: Vec<FileDescriptor> =
                    files_of(&self.cell_value(&position)).into_iter().chain(uploaded.iter().cloned()).collect();
                self.emit(vec![CellUpdate::new(
                    position.row_index,
                    position.column_id.clone(),
                    CellValue::Files(stored),
                )]);
                self.set_draft_files(generation, without_placeholders.into_iter().chain(uploaded.iter().cloned()).collect());
                self.notify(Notice::success(format!("{} uploaded", count_noun(uploaded.len(), "file"))));
                Ok(uploaded)
            }
            Err(e) => {
                log::warn!("upload to {} failed: {}", position, e);
                self.set_draft_files(generation, without_placeholders);
                self.notify(Notice::error(format!("Upload failed: {}", e)));
                Ok(Vec::new())
            }
        }
    }

    /// Remove files from a file cell. The cell updates immediately and is
    /// restored if the delete hook fails. Returns whether anything was
    /// removed.
    pub async fn remove_files(&self, position: CellPosition, file_ids: Vec<String>) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        let column = self.file_column(&position)?;
        if !self.is_column_writable(&column) {
            return Ok(false);
        }

        let original = self.cell_files(&position);
        let (removed, remaining): (Vec<FileDescriptor>, Vec<FileDescriptor>) =
            original.iter().cloned().partition(|f| file_ids.contains(&f.id));
        if removed.is_empty() {
            return Ok(false);
        }

        let generation = self.session_generation(&position);
        let stored = files_of(&self.cell_value(&position));
        let stored_remaining: Vec<FileDescriptor> =
            stored.iter().filter(|f| !file_ids.contains(&f.id)).cloned().collect();
        if stored_remaining.len() != stored.len() {
            self.emit(vec![CellUpdate::new(
                position.row_index,
                position.column_id.clone(),
                CellValue::Files(stored_remaining),
            )]);
        }
        self.set_draft_files(generation, remaining);

        // Placeholders never reached the host
        let hosted: Vec<String> = removed.iter().filter(|f| !self.is_uploading(&f.id)).map(|f| f.id.clone()).collect();
        let Some(delete) = self.hooks.files_delete.as_ref().filter(|_| !hosted.is_empty()) else {
            return Ok(true);
        };

        let request = FileDeleteRequest {
            file_ids: hosted,
            row_index: position.row_index,
            column_id: position.column_id.clone(),
        };
        if let Err(e) = delete(request).await {
            log::warn!("file delete in {} failed: {}", position, e);
            if !self.is_mounted() {
                return Ok(false);
            }
            if files_of(&self.cell_value(&position)) != stored {
                self.emit(vec![CellUpdate::new(
                    position.row_index,
                    position.column_id.clone(),
                    CellValue::Files(stored),
                )]);
            }
            self.set_draft_files(generation, original);
            self.notify(Notice::error(format!("Failed to delete files: {}", e)));
            return Ok(false);
        }
        Ok(true)
    }
}
