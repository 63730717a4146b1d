//! UI Components for the filedrop page.
//!
//! This module contains the Leptos components and the [`PageState`] context
//! they share:
//!
//! # Feature Components
//! - [`UploadSection`] - drop zone, staged file list and upload trigger
//! - [`EncryptPrompt`] - encryption offer for a brand new folder
//! - [`ProgressOverlay`] - upload progress and terminal state
//! - [`PinDialogs`] - PIN set / change / remove dialogs
//! - [`FolderMenus`] - per-folder PIN menu buttons
//! - [`FileList`] - file rows with the inline preview panel
//! - [`ConfirmModal`] - confirmation before deleting a file

mod confirm;
mod files;
mod pin;
mod progress;
mod upload;

pub use confirm::*;
pub use files::*;
pub use pin::*;
pub use progress::*;
pub use upload::*;

use gloo_timers::future::TimeoutFuture;
use leptos::*;

use crate::controllers::{
    ConfirmDialog, DropZone, FlowStep, Followup, PinAction, PinManager, PreviewController, SelectionStore,
    UploadFlow, UploadGate, UploadSession,
};
use crate::services::{Browser, HttpBackend, WebBrowser, XhrUploader};
use crate::{PageData, UploadStatus};

/// Controllers of one page, shared through Leptos context.
#[derive(Clone, Copy)]
pub struct PageState {
    pub selection: RwSignal<SelectionStore<WebBrowser>>,
    pub dropzone: RwSignal<DropZone>,
    pub gate: RwSignal<UploadGate>,
    pub pins: RwSignal<PinManager>,
    pub session: RwSignal<Option<UploadSession>>,
    pub preview: RwSignal<PreviewController>,
    /// Pending delete, bound to the id of the form to submit
    pub confirm: RwSignal<ConfirmDialog<String>>,
    pub upload_action: StoredValue<String>,
}

impl PageState {
    pub fn new(page: &PageData) -> Self {
        Self {
            selection: create_rw_signal(SelectionStore::new(WebBrowser)),
            dropzone: create_rw_signal(DropZone::default()),
            gate: create_rw_signal(UploadGate::new(page.uploader_folder.clone())),
            pins: create_rw_signal(PinManager::default()),
            session: create_rw_signal(None),
            preview: create_rw_signal(PreviewController::default()),
            confirm: create_rw_signal(ConfirmDialog::default()),
            upload_action: store_value(page.upload_action.clone()),
        }
    }

    pub fn uploading(&self) -> bool {
        self.session
            .with(|s| s.as_ref().is_some_and(|s| s.status() == UploadStatus::InFlight))
    }

    fn flow<'a>(
        self,
        backend: &'a HttpBackend,
        uploader: &'a XhrUploader,
    ) -> UploadFlow<
        'a,
        RwSignal<UploadGate>,
        RwSignal<PinManager>,
        RwSignal<Option<UploadSession>>,
        impl Fn() -> Vec<web_sys::File>,
        HttpBackend,
        XhrUploader,
    > {
        let selection = self.selection;
        UploadFlow {
            gate: self.gate,
            pins: self.pins,
            session: self.session,
            files: move || selection.with_untracked(|s| s.raw_files()),
            backend,
            uploader,
            action: self.upload_action.get_value(),
        }
    }

    /// Upload trigger.
    pub fn start_upload(self) {
        spawn_local(async move {
            let step = self.flow(&HttpBackend, &XhrUploader).trigger().await;
            self.follow(step).await;
        });
    }

    /// "No" on the encryption offer.
    pub fn decline_encryption(self) {
        spawn_local(async move {
            let step = self.flow(&HttpBackend, &XhrUploader).decline().await;
            self.follow(step).await;
        });
    }

    /// "Yes" on the encryption offer.
    pub fn accept_encryption(self) {
        self.flow(&HttpBackend, &XhrUploader).accept();
    }

    pub fn submit_pin(self, action: PinAction) {
        spawn_local(async move {
            let step = self.flow(&HttpBackend, &XhrUploader).submit_pin(action).await;
            self.follow(step).await;
        });
    }

    pub fn cancel_pin(self) {
        spawn_local(async move {
            let step = self.flow(&HttpBackend, &XhrUploader).cancel_pin().await;
            self.follow(step).await;
        });
    }

    async fn follow(self, step: FlowStep) {
        match step {
            FlowStep::Idle => {}
            FlowStep::Reload => WebBrowser.reload(),
            FlowStep::Abandoned => self.flow(&HttpBackend, &XhrUploader).dismiss(),
            FlowStep::Finished(scheduled) => {
                TimeoutFuture::new(scheduled.delay.as_millis() as u32).await;
                match scheduled.followup {
                    Followup::Navigate(href) => WebBrowser.navigate(&href),
                    Followup::Dismiss => self.flow(&HttpBackend, &XhrUploader).dismiss(),
                }
            }
        }
    }
}

/// Whether a click landed on the element carrying the handler itself,
/// i.e. on a modal's backdrop rather than its dialog.
pub(crate) fn on_backdrop(ev: &ev::MouseEvent) -> bool {
    ev.target().is_some() && ev.target() == ev.current_target()
}
