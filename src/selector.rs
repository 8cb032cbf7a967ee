//! File selection: validate and stage one candidate PDF before upload.
//!
//! A candidate arrives either from a drop onto the drop target or from the
//! manual file picker. Only a candidate whose declared media type is exactly
//! `application/pdf` is staged; anything else is refused with a warning and
//! the previously staged file (if any) stays as it was.
//!
//! The selector never talks to the network. Submission is a separate action:
//! the caller [`FileSelector::take`]s the staged file and hands it to the
//! workflow controller.

use crate::error::SelectionError;
use crate::model::{StagedFile, PDF_MEDIA_TYPE};
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, warn};

/// Where a candidate came from. Exactly one is active per interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Drop,
    Picker,
}

/// Drag events over the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
}

/// A file reference that has not been validated yet.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub media_type: String,
    pub content: Bytes,
}

impl Candidate {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: content.into(),
        }
    }

    /// Read a local file, declaring its media type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| SelectionError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, media_type_for(path), content))
    }
}

/// Media type a file picker would declare for this path.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Accept a candidate only if its media type is exactly `application/pdf`.
pub fn validate(candidate: Candidate) -> Result<StagedFile, SelectionError> {
    if candidate.media_type != PDF_MEDIA_TYPE {
        return Err(SelectionError::NotAPdf {
            name: candidate.name,
            media_type: candidate.media_type,
        });
    }
    Ok(StagedFile {
        name: candidate.name,
        media_type: candidate.media_type,
        content: candidate.content,
    })
}

/// Local state of the upload widget.
#[derive(Debug, Default)]
pub struct FileSelector {
    staged: Option<StagedFile>,
    drag_active: bool,
}

impl FileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged(&self) -> Option<&StagedFile> {
        self.staged.as_ref()
    }

    /// Visual affordance only: is a drag currently over the drop target?
    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn on_drag(&mut self, event: DragEvent) {
        self.drag_active = matches!(event, DragEvent::Enter | DragEvent::Over);
    }

    /// Handle a drop. The drag flag is reset before the item is looked at;
    /// a drop carrying no file only resets the flag.
    pub fn on_drop(&mut self, candidate: Option<Candidate>) -> Result<(), SelectionError> {
        self.drag_active = false;
        match candidate {
            Some(c) => self.select(SelectionSource::Drop, c),
            None => Ok(()),
        }
    }

    /// Validate and stage a candidate, replacing any earlier selection.
    ///
    /// On rejection the warning is logged and the staged state is untouched.
    pub fn select(
        &mut self,
        source: SelectionSource,
        candidate: Candidate,
    ) -> Result<(), SelectionError> {
        match validate(candidate) {
            Ok(file) => {
                debug!(?source, name = file.name(), size = file.size(), "staged file");
                self.staged = Some(file);
                Ok(())
            }
            Err(e) => {
                warn!(?source, "{}", e);
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.staged = None;
    }

    /// Hand the staged file over for submission, clearing staged state.
    pub fn take(&mut self) -> Option<StagedFile> {
        self.staged.take()
    }
}
