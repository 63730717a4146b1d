//! Multipart upload with progress reporting.
//!
//! `fetch` does not expose upload progress, so the browser implementation
//! uses `XMLHttpRequest` and bridges its callbacks into a future through a
//! one-shot channel.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, FormData, ProgressEvent, XmlHttpRequest};

use crate::{TransferProgress, TransportError, UPLOAD_FIELD};

/// Sends a batch of files as one multipart request.
#[async_trait(?Send)]
pub trait Uploader {
    /// Platform file handle.
    type File: Clone + 'static;

    /// POST every file under [`UPLOAD_FIELD`] to `action`.
    ///
    /// Resolves with the HTTP status once the response arrived, or with a
    /// [`TransportError`] when none did.
    async fn upload(
        &self,
        action: &str,
        files: &[Self::File],
        on_progress: Box<dyn Fn(TransferProgress)>,
    ) -> Result<u16, TransportError>;
}

/// [`Uploader`] over `XMLHttpRequest`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XhrUploader;

type Completion = Rc<RefCell<Option<oneshot::Sender<Result<u16, TransportError>>>>>;

fn js_err(context: &str, err: JsValue) -> TransportError {
    TransportError::Request(format!("{}: {:?}", context, err))
}

#[async_trait(?Send)]
impl Uploader for XhrUploader {
    type File = web_sys::File;

    async fn upload(
        &self,
        action: &str,
        files: &[web_sys::File],
        on_progress: Box<dyn Fn(TransferProgress)>,
    ) -> Result<u16, TransportError> {
        let form = FormData::new().map_err(|e| js_err("Failed to create FormData", e))?;
        for file in files {
            form.append_with_blob(UPLOAD_FIELD, file)
                .map_err(|e| js_err("Failed to append file", e))?;
        }

        let xhr = XmlHttpRequest::new().map_err(|e| js_err("Failed to create XMLHttpRequest", e))?;
        let (tx, rx) = oneshot::channel();
        let completion: Completion = Rc::new(RefCell::new(Some(tx)));

        let progress = Closure::<dyn FnMut(ProgressEvent)>::new(move |ev: ProgressEvent| {
            let total = ev.length_computable().then(|| ev.total() as u64);
            on_progress(TransferProgress {
                loaded: ev.loaded() as u64,
                total,
            });
        });
        xhr.upload()
            .map_err(|e| js_err("Upload channel unavailable", e))?
            .set_onprogress(Some(progress.as_ref().unchecked_ref()));

        let load = {
            let completion = completion.clone();
            let xhr = xhr.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                if let Some(tx) = completion.borrow_mut().take() {
                    let status = xhr
                        .status()
                        .map_err(|e| TransportError::Network(format!("{:?}", e)));
                    let _ = tx.send(status);
                }
            })
        };
        xhr.set_onload(Some(load.as_ref().unchecked_ref()));

        let failed = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            if let Some(tx) = completion.borrow_mut().take() {
                let _ = tx.send(Err(TransportError::Network(format!(
                    "upload {}",
                    ev.type_()
                ))));
            }
        });
        xhr.set_onerror(Some(failed.as_ref().unchecked_ref()));
        xhr.set_onabort(Some(failed.as_ref().unchecked_ref()));

        xhr.open("POST", action)
            .map_err(|e| js_err("Failed to open request", e))?;
        xhr.send_with_opt_form_data(Some(&form))
            .map_err(|e| js_err("Failed to send request", e))?;

        log::info!("📤 Uploading {} file(s) to {}", files.len(), action);

        let result = rx
            .await
            .unwrap_or_else(|_| Err(TransportError::Network("upload dropped".to_string())));

        // Detach the callbacks before their closures are dropped.
        xhr.set_onload(None);
        xhr.set_onerror(None);
        xhr.set_onabort(None);
        if let Ok(upload) = xhr.upload() {
            upload.set_onprogress(None);
        }
        drop((progress, load, failed));

        result
    }
}
