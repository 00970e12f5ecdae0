//! Report acquisition
//!
//! A session takes its microbiology report either as typed text or as a
//! single uploaded file. Both end up as one `report_text` string; files go
//! through a [`TextExtractor`], which can be swapped for a real PDF/OCR
//! backend without touching the session.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ReportError;

pub const TEXT_REQUIRED_MESSAGE: &str = "Please provide a microbiology report text.";
pub const FILE_REQUIRED_MESSAGE: &str = "Please select a microbiology report file.";
pub const FILE_EMPTY_MESSAGE: &str = "The selected report file contains no text.";

/// Which entry surface a session uses. Fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    #[default]
    Text,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Pdf,
    Image,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileKind::PlainText => "text",
            FileKind::Pdf => "PDF",
            FileKind::Image => "image",
        };
        f.write_str(label)
    }
}

/// An accepted report file, held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ReportFile {
    name: String,
    media_type: String,
    kind: FileKind,
    bytes: Vec<u8>,
}

impl fmt::Debug for ReportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("kind", &self.kind)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl ReportFile {
    /// Classifies the file by extension. Accepts .txt, .pdf, .png, .jpg and .jpeg.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ReportError> {
        let name = name.into();
        let extension = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let kind = match extension.as_str() {
            "txt" => FileKind::PlainText,
            "pdf" => FileKind::Pdf,
            "png" | "jpg" | "jpeg" => FileKind::Image,
            _ => return Err(ReportError::UnsupportedType { name }),
        };
        let media_type = mime_guess::from_ext(&extension)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            name,
            media_type,
            kind,
            bytes,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, ReportError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(path).await.map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Turns a report file into report text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, file: &ReportFile) -> Result<String, ReportError>;
}

/// Reads plain text files; every other accepted type becomes a placeholder
/// naming the file so submission can still proceed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, file: &ReportFile) -> Result<String, ReportError> {
        match file.kind() {
            FileKind::PlainText => {
                let text = std::str::from_utf8(file.bytes()).map_err(|_| ReportError::Encoding {
                    name: file.name().to_string(),
                })?;
                Ok(text.trim_start_matches('\u{feff}').to_string())
            }
            FileKind::Pdf | FileKind::Image => {
                debug!(
                    file = %file.name(),
                    media_type = %file.media_type(),
                    "No text extraction, using placeholder"
                );
                Ok(placeholder_text(file))
            }
        }
    }
}

pub fn placeholder_text(file: &ReportFile) -> String {
    format!(
        "[Attached {} report: {} ({}). Text extraction is not available for this file type.]",
        file.kind(),
        file.name(),
        file.media_type()
    )
}

/// File held by a file-mode session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileSlot {
    /// Nothing selected yet.
    #[default]
    Empty,
    Held(ReportFile),
    /// A file was held and then explicitly discarded.
    Discarded,
}

/// The session's report source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportInput {
    Text(String),
    File(FileSlot),
}

impl ReportInput {
    pub fn new(mode: EntryMode) -> Self {
        match mode {
            EntryMode::Text => ReportInput::Text(String::new()),
            EntryMode::File => ReportInput::File(FileSlot::Empty),
        }
    }

    pub fn mode(&self) -> EntryMode {
        match self {
            ReportInput::Text(_) => EntryMode::Text,
            ReportInput::File(_) => EntryMode::File,
        }
    }

    /// Replaces the typed text. Returns false in file mode.
    pub fn set_text(&mut self, text: String) -> bool {
        match self {
            ReportInput::Text(current) => {
                *current = text;
                true
            }
            ReportInput::File(_) => false,
        }
    }

    /// Holds `file`, dropping any previously held one. Returns false in text mode.
    pub fn select_file(&mut self, file: ReportFile) -> bool {
        match self {
            ReportInput::File(slot) => {
                if let FileSlot::Held(previous) = slot {
                    info!(
                        previous = %previous.name(),
                        next = %file.name(),
                        "Replacing held report file"
                    );
                }
                *slot = FileSlot::Held(file);
                true
            }
            ReportInput::Text(_) => false,
        }
    }

    /// Clears a held file. Returns false when nothing was held.
    pub fn discard_file(&mut self) -> bool {
        match self {
            ReportInput::File(slot @ FileSlot::Held(_)) => {
                *slot = FileSlot::Discarded;
                true
            }
            _ => false,
        }
    }

    pub fn held_file(&self) -> Option<&ReportFile> {
        match self {
            ReportInput::File(FileSlot::Held(file)) => Some(file),
            _ => None,
        }
    }

    /// The report text to submit, or `None` when there is nothing usable.
    pub fn payload(&self, extractor: &dyn TextExtractor) -> Result<Option<String>, ReportError> {
        let text = match self {
            ReportInput::Text(text) => text.clone(),
            ReportInput::File(FileSlot::Held(file)) => extractor.extract(file)?,
            ReportInput::File(_) => return Ok(None),
        };

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    pub fn validation_message(&self) -> &'static str {
        match self {
            ReportInput::Text(_) => TEXT_REQUIRED_MESSAGE,
            ReportInput::File(FileSlot::Held(_)) => FILE_EMPTY_MESSAGE,
            ReportInput::File(_) => FILE_REQUIRED_MESSAGE,
        }
    }
}
