//! Application configuration.
//!
//! Centralized constants for the filedrop frontend. Everything that varies
//! per page (uploader folder, upload target, file rows) is read from the
//! host document instead, see [`crate::page`].

use std::time::Duration;

/// Endpoint answering `{has_folder: bool}` for the current uploader.
pub const HAS_FOLDER_URL: &str = "/api/uploader-has-folder";

/// Endpoint answering `{folder: string|null}` for the current uploader.
pub const FOLDER_LOOKUP_URL: &str = "/api/uploader-folder";

/// Upload target used when the host page does not declare one.
pub const DEFAULT_UPLOAD_ACTION: &str = "/";

/// Multipart field name shared by every uploaded file part.
pub const UPLOAD_FIELD: &str = "file";

/// Where the browser goes once an upload succeeded.
pub const LANDING_URL: &str = "/";

/// Pause on the "Done!" state before navigating away.
pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_millis(600);

/// Pause on the "Upload failed" state before the overlay is dismissed.
pub const FAILURE_RESET_DELAY: Duration = Duration::from_millis(2000);

/// Minimum PIN length accepted client-side.
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum number of characters rendered for a textual preview.
pub const MAX_PREVIEW_CHARS: usize = 200_000;

/// Query appended to a download URL when a row declares no preview URL.
pub const PREVIEW_QUERY: &str = "preview=1";

/// Default text for a confirmation dialog.
pub const DEFAULT_CONFIRM_MESSAGE: &str = "Delete?";

/// User-facing messages.
pub mod messages {
    pub const SET_PIN_FAILED: &str = "Failed to set PIN";
    pub const REMOVE_PIN_FAILED: &str = "Failed to remove PIN";
    pub const NETWORK_ERROR: &str = "Network error";

    pub const UPLOADING: &str = "Uploading...";
    pub const UPLOAD_DONE: &str = "Done!";
    pub const UPLOAD_FAILED: &str = "Upload failed";
    pub const PROGRESS_INDETERMINATE: &str = "...";

    pub const PREVIEW_LOADING: &str = "Loading preview...";
    pub const PREVIEW_UNSUPPORTED: &str =
        "Preview is not available for this file type. Use Download.";
    pub const PREVIEW_FAILED: &str = "Could not load preview. You can still download the file.";
}
