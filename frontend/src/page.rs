//! Data the host document declares before any network round trip.
//!
//! The server renders the page with a handful of `data-*` attributes; they
//! are read once at start-up into [`PageData`] and the app never queries
//! the document for them again.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use crate::controllers::PreviewTarget;
use crate::DEFAULT_UPLOAD_ACTION;

/// A file listed on the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRow {
    pub target: PreviewTarget,
    /// Form target deleting the file, when the viewer may delete it
    pub delete_url: Option<String>,
    pub confirm_message: Option<String>,
}

/// A folder listed on the page with a PIN menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderRow {
    pub folder: String,
    pub has_pin: bool,
}

/// Everything read from the host document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageData {
    /// Uploader folder id, when the server already knows it
    pub uploader_folder: Option<String>,
    /// Upload form target
    pub upload_action: String,
    pub files: Vec<FileRow>,
    pub folders: Vec<FolderRow>,
}

impl Default for PageData {
    fn default() -> Self {
        Self {
            uploader_folder: None,
            upload_action: DEFAULT_UPLOAD_ACTION.to_string(),
            files: Vec::new(),
            folders: Vec::new(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl FileRow {
    /// Build a row from its attributes; rows without any URL are skipped.
    pub fn from_attributes(row: usize, attr: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let download_url = non_empty(attr("data-download-url")).or_else(|| non_empty(attr("href")))?;
        Some(Self {
            target: PreviewTarget {
                row,
                file_name: non_empty(attr("data-file-name")),
                download_url,
                preview_url: non_empty(attr("data-preview-url")),
            },
            delete_url: non_empty(attr("data-delete-url")),
            confirm_message: non_empty(attr("data-confirm-message")),
        })
    }
}

impl FolderRow {
    pub fn from_attributes(attr: impl Fn(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            folder: non_empty(attr("data-folder"))?,
            has_pin: attr("data-has-pin").as_deref() == Some("true"),
        })
    }
}

fn elements(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(selector) else {
        log::warn!("Invalid selector {}", selector);
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl PageData {
    /// Read the page contract from `document`.
    pub fn from_document(document: &Document) -> Self {
        let body = document.body();
        let body_attr = |name: &str| body.as_ref().and_then(|b| b.get_attribute(name));

        // Row numbers count only usable rows.
        let files = elements(document, ".js-file-row")
            .iter()
            .filter_map(|el| FileRow::from_attributes(0, |name| el.get_attribute(name)))
            .enumerate()
            .map(|(row, mut file)| {
                file.target.row = row;
                file
            })
            .collect();

        let folders = elements(document, ".js-folder-row")
            .iter()
            .filter_map(|el| FolderRow::from_attributes(|name| el.get_attribute(name)))
            .collect();

        let data = Self {
            uploader_folder: non_empty(body_attr("data-uploader-folder")),
            upload_action: non_empty(body_attr("data-upload-action"))
                .unwrap_or_else(|| DEFAULT_UPLOAD_ACTION.to_string()),
            files,
            folders,
        };
        log::debug!(
            "Page data: {} file(s), {} folder(s), uploader folder {:?}",
            data.files.len(),
            data.folders.len(),
            data.uploader_folder
        );
        data
    }
}
