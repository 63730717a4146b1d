//! Filedrop - Frontend Rust/Leptos Application
//!
//! A WebAssembly controller for the filedrop upload and browse pages:
//! staging files, gating uploads behind an optional folder PIN, streaming
//! multipart uploads with progress, inline file previews and delete
//! confirmation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host page (server-rendered, data-* attributes)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  App (#filedrop-app)                                         │
//! │  ├── UploadSection / EncryptPrompt / ProgressOverlay         │
//! │  ├── PinDialogs / FolderMenus                                │
//! │  └── FileList (inline preview) / ConfirmModal                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  controllers  (plain state machines, no DOM)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  services     (Browser, Backend, Uploader seams)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] - endpoints, delays and user-facing messages
//! - [`types`] - Common types (StagedFile, UploadStatus, PreviewKind, etc.)
//! - [`page`] - data read from the host document
//! - [`controllers`] - selection, gate, PIN, upload, preview, confirm
//! - [`services`] - browser, JSON API and upload transport
//! - [`components`] - UI components bound to the controllers

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// =============================================================================
// Module declarations
// =============================================================================

pub mod components;
pub mod config;
pub mod controllers;
pub mod page;
pub mod services;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

// Configuration
pub use config::*;

// Types
pub use types::{
    // Staging
    StagedFile,
    // Sessions
    PreviewKind, PreviewStatus, Progress, TransferProgress, UploadStatus,
    // Folders
    FolderPinState,
    // Errors
    AppError, AppResult, TransportError,
};

// Page contract
pub use page::{FileRow, FolderRow, PageData};

// Components
pub use components::*;

// =============================================================================
// Application Entry Point
// =============================================================================

fn document() -> AppResult<web_sys::Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| AppError::Page("no document".to_string()))
}

/// `#filedrop-app`, or the body when the page has no mount point.
fn mount_point(document: &web_sys::Document) -> AppResult<web_sys::HtmlElement> {
    document
        .get_element_by_id("filedrop-app")
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body())
        .ok_or_else(|| AppError::Page("no mount point".to_string()))
}

/// WASM entry point - called by the host page once the module loaded.
#[wasm_bindgen(js_name = start)]
pub fn start() {
    // Setup panic hook for better error messages
    console_error_panic_hook::set_once();

    // Setup console logging
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("🦀 Filedrop - Starting Leptos App");

    let mounted = document().and_then(|document| {
        let page = PageData::from_document(&document);
        let target = mount_point(&document)?;
        mount_to(target, move || view! { <App page=page/> });
        Ok(())
    });
    if let Err(e) = mounted {
        log::error!("❌ Failed to start: {}", e);
    }
}

#[component]
pub fn App(page: PageData) -> impl IntoView {
    provide_context(PageState::new(&page));

    view! {
        <UploadSection/>
        <EncryptPrompt/>
        <ProgressOverlay/>
        <PinDialogs/>
        <FolderMenus folders=page.folders/>
        <FileList files=page.files/>
        <ConfirmModal/>
    }
}
