//! Files staged for upload.
//!
//! The store owns one object URL per image entry and is the only place
//! that creates or revokes them: entries leaving the store give theirs back
//! immediately, and dropping the store releases the rest.

use crate::services::Browser;
use crate::StagedFile;

/// Thumbnail shown next to a staged file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Badge {
    /// Object URL of the image itself
    Thumbnail(String),
    /// Uppercased extension, or `FILE`
    Generic(String),
}

/// Display data for one staged entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryView {
    pub index: usize,
    pub name: String,
    pub size_label: String,
    pub badge: Badge,
    pub remove_label: String,
}

/// Ordered selection of files awaiting upload.
pub struct SelectionStore<B: Browser> {
    browser: B,
    files: Vec<StagedFile<B::File>>,
    // Parallel to `files`.
    thumbnails: Vec<Option<String>>,
}

impl<B: Browser> SelectionStore<B> {
    pub fn new(browser: B) -> Self {
        Self {
            browser,
            files: Vec::new(),
            thumbnails: Vec::new(),
        }
    }

    /// Discard the current selection and stage `files` instead.
    pub fn replace_all(&mut self, files: Vec<StagedFile<B::File>>) {
        self.release_all();
        self.thumbnails = vec![None; files.len()];
        self.files = files;
        self.render();
        log::debug!("Staged {} file(s)", self.files.len());
    }

    /// Remove the entry at `index`; out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.files.len() {
            return false;
        }
        let removed = self.files.remove(index);
        if let Some(url) = self.thumbnails.remove(index) {
            self.browser.revoke_object_url(&url);
        }
        self.render();
        log::debug!("Unstaged {}", removed.name);
        true
    }

    /// Staged files in user-visible order.
    pub fn current(&self) -> &[StagedFile<B::File>] {
        &self.files
    }

    /// Raw handles for the upload transport.
    pub fn raw_files(&self) -> Vec<B::File> {
        self.files.iter().map(|f| f.raw.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether the upload trigger is enabled.
    pub fn can_upload(&self) -> bool {
        !self.is_empty()
    }

    /// `"N file(s) selected"`, empty when nothing is staged.
    pub fn count_label(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("{} file(s) selected", self.files.len())
        }
    }

    /// Number of object URLs currently held.
    pub fn live_handles(&self) -> usize {
        self.thumbnails.iter().filter(|t| t.is_some()).count()
    }

    pub fn entries(&self) -> Vec<EntryView> {
        self.files
            .iter()
            .zip(&self.thumbnails)
            .enumerate()
            .map(|(index, (file, thumbnail))| EntryView {
                index,
                name: file.name.clone(),
                size_label: format_size(file.size),
                badge: match thumbnail {
                    Some(url) => Badge::Thumbnail(url.clone()),
                    None => Badge::Generic(extension_badge(&file.name)),
                },
                remove_label: format!("Remove {}", file.name),
            })
            .collect()
    }

    /// Acquire object URLs for image entries that lack one.
    fn render(&mut self) {
        for (file, thumbnail) in self.files.iter().zip(self.thumbnails.iter_mut()) {
            if thumbnail.is_none() && file.is_image() {
                *thumbnail = self.browser.create_object_url(&file.raw);
            }
        }
    }

    fn release_all(&mut self) {
        for url in self.thumbnails.iter_mut().filter_map(Option::take) {
            self.browser.revoke_object_url(&url);
        }
    }
}

impl<B: Browser> Drop for SelectionStore<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Human-readable size: bytes, then KB and MB with one decimal.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format!("{:.1} KB", kb);
    }
    format!("{:.1} MB", kb / 1024.0)
}

/// Up to four uppercased extension characters, or `FILE`.
pub fn extension_badge(name: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => {
            name[dot + 1..].chars().take(4).collect::<String>().to_uppercase()
        }
        _ => "FILE".to_string(),
    }
}
