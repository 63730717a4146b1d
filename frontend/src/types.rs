//! Common types used across the frontend application.
//!
//! This module centralizes type definitions shared by controllers,
//! services and components.
//!
//! # Categories
//!
//! - **Staging Types** - files chosen for upload
//! - **Session Types** - upload and preview session status
//! - **Folder Types** - folder protection state
//! - **Error Types** - transport and application errors

use std::fmt;

use thiserror::Error;

// =============================================================================
// Staging Types
// =============================================================================

/// A file chosen by the user but not yet uploaded.
///
/// `F` is the platform handle; in the browser it is a [`web_sys::File`].
#[derive(Clone, Debug, PartialEq)]
pub struct StagedFile<F = web_sys::File> {
    /// File name as reported by the browser
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Declared MIME type, possibly empty
    pub mime_type: String,
    /// Platform handle used for upload and thumbnails
    pub raw: F,
}

impl<F> StagedFile<F> {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>, raw: F) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            raw,
        }
    }

    /// Whether the declared type is an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

impl StagedFile<web_sys::File> {
    /// Wrap a browser file handle.
    pub fn from_web(file: web_sys::File) -> Self {
        let size = file.size().max(0.0) as u64;
        Self::new(file.name(), size, file.type_(), file)
    }
}

// =============================================================================
// Session Types
// =============================================================================

/// Lifecycle of one upload session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl UploadStatus {
    /// Whether the session reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Succeeded | UploadStatus::Failed)
    }
}

/// Upload progress as last reported by the transport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress {
    /// Completed fraction in `0.0..=1.0`
    Fraction(f64),
    /// The transport does not know the total size
    Indeterminate,
}

/// Raw progress notification from an upload transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    pub loaded: u64,
    /// `None` when the total is not computable
    pub total: Option<u64>,
}

/// Status of a preview session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewStatus {
    Loading,
    Ready,
    Error,
}

/// Rendering strategy chosen from a response's content type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Text,
    Embed,
    Unsupported,
}

impl PreviewKind {
    /// Pick a strategy from a content type, in precedence order.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.starts_with("image/") {
            PreviewKind::Image
        } else if ct.starts_with("text/")
            || ct.contains("json")
            || ct.contains("xml")
            || ct.contains("javascript")
        {
            PreviewKind::Text
        } else if ct.contains("pdf") || ct.starts_with("video/") || ct.starts_with("audio/") {
            PreviewKind::Embed
        } else {
            PreviewKind::Unsupported
        }
    }
}

// =============================================================================
// Folder Types
// =============================================================================

/// Protection state of the uploader's folder.
///
/// The id is resolved lazily and kept for the page lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderPinState {
    pub folder_id: Option<String>,
    pub has_pin: bool,
}

// =============================================================================
// Error Types
// =============================================================================

/// A request that produced no HTTP response.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be built.
    #[error("Failed to build request: {0}")]
    Request(String),

    /// The network call failed before a response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Frontend application errors.
///
/// Used by the start-up glue where only a message needs to be surfaced.
#[derive(Clone, Debug)]
pub enum AppError {
    /// Host document is missing something the app needs.
    Page(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Page(msg) => write!(f, "Page error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_kind_precedence() {
        assert_eq!(PreviewKind::from_content_type("image/png"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("Text/Plain; charset=utf-8"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/json"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("image/svg+xml"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("application/xhtml+xml"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/x-javascript"), PreviewKind::Text);
        assert_eq!(PreviewKind::from_content_type("application/pdf"), PreviewKind::Embed);
        assert_eq!(PreviewKind::from_content_type("video/mp4"), PreviewKind::Embed);
        assert_eq!(PreviewKind::from_content_type("audio/mpeg"), PreviewKind::Embed);
        assert_eq!(PreviewKind::from_content_type("application/zip"), PreviewKind::Unsupported);
        assert_eq!(PreviewKind::from_content_type(""), PreviewKind::Unsupported);
    }

    #[test]
    fn test_staged_file_image_detection() {
        assert!(StagedFile::new("a.png", 1, "image/png", ()).is_image());
        assert!(!StagedFile::new("a.txt", 1, "text/plain", ()).is_image());
        assert!(!StagedFile::new("noext", 1, "", ()).is_image());
    }

    #[test]
    fn test_upload_status_terminal() {
        assert!(!UploadStatus::Idle.is_terminal());
        assert!(!UploadStatus::InFlight.is_terminal());
        assert!(UploadStatus::Succeeded.is_terminal());
        assert!(UploadStatus::Failed.is_terminal());
    }
}
