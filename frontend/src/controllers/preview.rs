//! Inline preview of a single remote file.
//!
//! One preview panel exists at a time, attached after the active row.
//! Every activation and every close bumps a token; a response carrying an
//! older token is dropped before it can touch the panel. Requests are never
//! cancelled, only ignored.

use super::StateCell;
use crate::config::messages;
use crate::services::{ApiResponse, Backend, Browser};
use crate::{PreviewKind, PreviewStatus, TransportError, MAX_PREVIEW_CHARS, PREVIEW_QUERY};

/// A previewable file row as declared by the host page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewTarget {
    /// Position of the row in the file list
    pub row: usize,
    pub file_name: Option<String>,
    pub download_url: String,
    /// Explicit preview endpoint, if the row declares one
    pub preview_url: Option<String>,
}

fn with_query(url: &str, query: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, query)
}

impl PreviewTarget {
    pub fn preview_url(&self) -> String {
        match &self.preview_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => with_query(&self.download_url, PREVIEW_QUERY),
        }
    }

    pub fn display_name(&self) -> &str {
        match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "File",
        }
    }
}

/// Mouse button and modifier state of a trigger click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Click {
    pub button: i16,
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Click {
    /// Only plain primary clicks open previews; anything else keeps the
    /// link's default behaviour.
    pub fn is_plain(&self) -> bool {
        self.button == 0 && !(self.meta || self.ctrl || self.shift || self.alt)
    }
}

/// What the preview panel shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewContent {
    Message(String),
    Image { src: String, alt: String },
    Text(String),
    Embed { src: String },
}

/// The current preview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewSession {
    pub token: u64,
    pub target: PreviewTarget,
    pub status: PreviewStatus,
    pub kind: Option<PreviewKind>,
    pub content: PreviewContent,
}

/// A fetch the caller has to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewRequest {
    pub token: u64,
    pub url: String,
}

/// Result of [`PreviewController::activate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    /// The active row was clicked again.
    Closed,
    Fetch(PreviewRequest),
}

/// Status line and declared type of a preview response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_type: Option<String>,
}

impl ResponseHead {
    pub fn of(response: &impl ApiResponse) -> Self {
        Self {
            status: response.status(),
            content_type: response.content_type(),
        }
    }

    fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Next step after [`PreviewController::on_response`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStep {
    /// Superseded; nothing changed.
    Stale,
    /// The panel shows its final content.
    Done,
    /// Read the body and pass it to [`PreviewController::on_text`].
    ReadText,
}

/// Owner of the preview token and panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewController {
    token: u64,
    session: Option<PreviewSession>,
    last_stamp: u64,
}

impl PreviewController {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn session(&self) -> Option<&PreviewSession> {
        self.session.as_ref()
    }

    /// Row the panel is attached after, if open.
    pub fn active_row(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.target.row)
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.session.is_some() && self.token == token
    }

    /// Open the preview for `target`, or close it if `target` is active.
    pub fn activate(&mut self, target: PreviewTarget) -> Activation {
        if self.active_row() == Some(target.row) {
            self.close();
            return Activation::Closed;
        }

        self.token += 1;
        let url = target.preview_url();
        log::debug!("Preview #{} for {}", self.token, target.display_name());
        self.session = Some(PreviewSession {
            token: self.token,
            target,
            status: PreviewStatus::Loading,
            kind: None,
            content: PreviewContent::Message(messages::PREVIEW_LOADING.to_string()),
        });
        Activation::Fetch(PreviewRequest {
            token: self.token,
            url,
        })
    }

    /// Detach the panel and invalidate any outstanding response.
    pub fn close(&mut self) {
        self.token += 1;
        self.session = None;
    }

    fn current_mut(&mut self, token: u64) -> Option<&mut PreviewSession> {
        if self.token != token {
            return None;
        }
        self.session.as_mut()
    }

    fn cache_busted(&mut self, url: &str, now_ms: u64) -> String {
        let stamp = now_ms.max(self.last_stamp + 1);
        self.last_stamp = stamp;
        with_query(url, &format!("t={}", stamp))
    }

    /// Apply a response head for the fetch started with `token`.
    pub fn on_response(
        &mut self,
        token: u64,
        head: Result<ResponseHead, TransportError>,
        now_ms: u64,
    ) -> ResponseStep {
        if !self.is_current(token) {
            log::debug!("Dropping stale preview response #{}", token);
            return ResponseStep::Stale;
        }

        let head = match head {
            Ok(head) if head.ok() => head,
            Ok(head) => {
                log::warn!("Preview fetch returned {}", head.status);
                self.fail(token);
                return ResponseStep::Done;
            }
            Err(e) => {
                log::warn!("Preview fetch failed: {}", e);
                self.fail(token);
                return ResponseStep::Done;
            }
        };

        let kind = PreviewKind::from_content_type(head.content_type.as_deref().unwrap_or(""));
        let content = match kind {
            PreviewKind::Text => None,
            PreviewKind::Image | PreviewKind::Embed => {
                let url = match &self.session {
                    Some(session) => session.target.preview_url(),
                    None => return ResponseStep::Stale,
                };
                let src = self.cache_busted(&url, now_ms);
                Some(match kind {
                    PreviewKind::Image => PreviewContent::Image {
                        src,
                        alt: self
                            .session
                            .as_ref()
                            .map(|s| s.target.display_name().to_string())
                            .unwrap_or_default(),
                    },
                    _ => PreviewContent::Embed { src },
                })
            }
            PreviewKind::Unsupported => Some(PreviewContent::Message(
                messages::PREVIEW_UNSUPPORTED.to_string(),
            )),
        };

        let Some(session) = self.current_mut(token) else {
            return ResponseStep::Stale;
        };
        session.kind = Some(kind);
        match content {
            Some(content) => {
                session.content = content;
                session.status = PreviewStatus::Ready;
                ResponseStep::Done
            }
            None => ResponseStep::ReadText,
        }
    }

    /// Apply the body of a textual preview.
    pub fn on_text(&mut self, token: u64, body: Result<String, TransportError>) {
        if !self.is_current(token) {
            return;
        }
        match body {
            Ok(mut text) => {
                if let Some((cut, _)) = text.char_indices().nth(MAX_PREVIEW_CHARS) {
                    text.truncate(cut);
                }
                if let Some(session) = self.current_mut(token) {
                    session.content = PreviewContent::Text(text);
                    session.status = PreviewStatus::Ready;
                }
            }
            Err(e) => {
                log::warn!("Preview body unreadable: {}", e);
                self.fail(token);
            }
        }
    }

    fn fail(&mut self, token: u64) {
        if let Some(session) = self.current_mut(token) {
            session.status = PreviewStatus::Error;
            session.content = PreviewContent::Message(messages::PREVIEW_FAILED.to_string());
        }
    }
}

/// Activate `target` and render whatever its preview endpoint returns.
pub async fn open<B: Backend, W: Browser>(
    preview: &impl StateCell<PreviewController>,
    backend: &B,
    browser: &W,
    target: PreviewTarget,
) {
    let request = match preview.with_mut(|p| p.activate(target)) {
        Some(Activation::Fetch(request)) => request,
        _ => return,
    };

    let response = match backend.get(&request.url).await {
        Ok(response) => response,
        Err(e) => {
            preview.with_mut(|p| p.on_response(request.token, Err(e), browser.now_millis()));
            return;
        }
    };

    let head = ResponseHead::of(&response);
    let step = preview.with_mut(|p| p.on_response(request.token, Ok(head), browser.now_millis()));
    if step == Some(ResponseStep::ReadText) {
        let body = response.text().await;
        preview.with_mut(|p| p.on_text(request.token, body));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use serde_json::Value;

    use super::*;
    use crate::services::api::fake::{FakeBackend, FakeResponse};
    use crate::services::browser::fake::FakeBrowser;

    fn target(row: usize, name: &str) -> PreviewTarget {
        PreviewTarget {
            row,
            file_name: Some(name.to_string()),
            download_url: format!("/uploads/f/{}", name),
            preview_url: None,
        }
    }

    fn head(content_type: &str) -> Result<ResponseHead, TransportError> {
        Ok(ResponseHead {
            status: 200,
            content_type: Some(content_type.to_string()),
        })
    }

    fn fetch(activation: Activation) -> PreviewRequest {
        match activation {
            Activation::Fetch(request) => request,
            Activation::Closed => panic!("expected a fetch"),
        }
    }

    #[test]
    fn test_preview_url_defaults_to_download() {
        assert_eq!(target(0, "a.txt").preview_url(), "/uploads/f/a.txt?preview=1");
        let explicit = PreviewTarget {
            preview_url: Some("/p/a.txt".into()),
            ..target(0, "a.txt")
        };
        assert_eq!(explicit.preview_url(), "/p/a.txt");
        let unnamed = PreviewTarget {
            file_name: None,
            ..target(0, "a.txt")
        };
        assert_eq!(unnamed.display_name(), "File");
    }

    #[test]
    fn test_loading_then_image() {
        let mut preview = PreviewController::default();
        let request = fetch(preview.activate(target(3, "cat.png")));
        assert_eq!(request.url, "/uploads/f/cat.png?preview=1");
        assert_eq!(preview.active_row(), Some(3));
        let session = preview.session().unwrap();
        assert_eq!(session.status, PreviewStatus::Loading);
        assert_eq!(session.content, PreviewContent::Message("Loading preview...".into()));

        let step = preview.on_response(request.token, head("image/png"), 1_700_000_000_000);
        assert_eq!(step, ResponseStep::Done);
        let session = preview.session().unwrap();
        assert_eq!(session.kind, Some(PreviewKind::Image));
        assert_eq!(
            session.content,
            PreviewContent::Image {
                src: "/uploads/f/cat.png?preview=1&t=1700000000000".into(),
                alt: "cat.png".into(),
            }
        );
    }

    #[test]
    fn test_cache_bust_distinct_per_activation() {
        let mut preview = PreviewController::default();
        let mut sources = Vec::new();
        for row in [0, 1, 0] {
            let request = fetch(preview.activate(target(row, "img.png")));
            preview.on_response(request.token, head("image/png"), 42);
            match &preview.session().unwrap().content {
                PreviewContent::Image { src, .. } => sources.push(src.clone()),
                other => panic!("unexpected content {other:?}"),
            }
        }
        assert_eq!(sources.len(), 3);
        assert_ne!(sources[0], sources[1]);
        assert_ne!(sources[1], sources[2]);
        assert_ne!(sources[0], sources[2]);
    }

    #[test]
    fn test_text_truncated_to_budget() {
        let mut preview = PreviewController::default();
        let request = fetch(preview.activate(target(0, "big.txt")));
        assert_eq!(preview.on_response(request.token, head("text/plain"), 0), ResponseStep::ReadText);

        preview.on_text(request.token, Ok("x".repeat(300_000)));
        let session = preview.session().unwrap();
        assert_eq!(session.status, PreviewStatus::Ready);
        match &session.content {
            PreviewContent::Text(text) => assert_eq!(text.chars().count(), 200_000),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let mut preview = PreviewController::default();
        let request = fetch(preview.activate(target(0, "u.json")));
        preview.on_response(request.token, head("application/json"), 0);
        preview.on_text(request.token, Ok("é".repeat(200_001)));
        match &preview.session().unwrap().content {
            PreviewContent::Text(text) => assert_eq!(text.chars().count(), 200_000),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn test_embed_and_unsupported() {
        let mut preview = PreviewController::default();
        let request = fetch(preview.activate(target(0, "doc.pdf")));
        preview.on_response(request.token, head("application/pdf"), 7);
        assert_eq!(
            preview.session().unwrap().content,
            PreviewContent::Embed { src: "/uploads/f/doc.pdf?preview=1&t=7".into() }
        );

        let request = fetch(preview.activate(target(1, "a.zip")));
        preview.on_response(request.token, head("application/zip"), 8);
        let session = preview.session().unwrap();
        assert_eq!(session.kind, Some(PreviewKind::Unsupported));
        assert_eq!(session.status, PreviewStatus::Ready);
        assert_eq!(
            session.content,
            PreviewContent::Message("Preview is not available for this file type. Use Download.".into())
        );
    }

    #[test]
    fn test_fetch_failures_render_error() {
        let failures = vec![
            Ok(ResponseHead { status: 404, content_type: Some("text/html".into()) }),
            Err(TransportError::Network("offline".into())),
        ];
        for failure in failures {
            let mut preview = PreviewController::default();
            let request = fetch(preview.activate(target(0, "a.txt")));
            assert_eq!(preview.on_response(request.token, failure, 0), ResponseStep::Done);
            let session = preview.session().unwrap();
            assert_eq!(session.status, PreviewStatus::Error);
            assert_eq!(
                session.content,
                PreviewContent::Message("Could not load preview. You can still download the file.".into())
            );
        }
    }

    #[test]
    fn test_late_response_for_superseded_file_is_ignored() {
        let mut preview = PreviewController::default();
        let a = fetch(preview.activate(target(0, "a.txt")));
        let b = fetch(preview.activate(target(1, "b.png")));
        assert!(b.token > a.token);

        assert_eq!(preview.on_response(b.token, head("image/png"), 5), ResponseStep::Done);
        let rendered = preview.clone();

        assert_eq!(preview.on_response(a.token, head("text/plain"), 6), ResponseStep::Stale);
        preview.on_text(a.token, Ok("from a".into()));
        assert_eq!(preview, rendered);
        assert_eq!(preview.active_row(), Some(1));
    }

    #[test]
    fn test_reactivating_active_row_closes() {
        let mut preview = PreviewController::default();
        let request = fetch(preview.activate(target(2, "a.txt")));
        assert_eq!(preview.activate(target(2, "a.txt")), Activation::Closed);
        assert_eq!(preview.active_row(), None);
        assert!(preview.session().is_none());

        // the response of the closed preview must not reopen it
        assert_eq!(preview.on_response(request.token, head("text/plain"), 0), ResponseStep::Stale);
        assert!(preview.session().is_none());
    }

    #[test]
    fn test_tokens_strictly_increase() {
        let mut preview = PreviewController::default();
        let mut last = preview.token();
        for row in [0, 1, 1, 2, 0] {
            preview.activate(target(row, "x"));
            assert!(preview.token() > last);
            last = preview.token();
        }
        preview.close();
        assert!(preview.token() > last);
    }

    #[test]
    fn test_plain_click_filter() {
        assert!(Click::default().is_plain());
        assert!(!Click { button: 1, ..Click::default() }.is_plain());
        assert!(!Click { ctrl: true, ..Click::default() }.is_plain());
        assert!(!Click { meta: true, ..Click::default() }.is_plain());
        assert!(!Click { shift: true, ..Click::default() }.is_plain());
        assert!(!Click { alt: true, ..Click::default() }.is_plain());
    }

    #[test]
    fn test_open_renders_text_end_to_end() {
        let preview = RefCell::new(PreviewController::default());
        let backend = FakeBackend::default().reply(Ok(FakeResponse::typed("text/plain", "hello".into())));
        block_on(open(&preview, &backend, &FakeBrowser::at(1), target(0, "a.txt")));
        assert_eq!(backend.sent()[0].url, "/uploads/f/a.txt?preview=1");
        assert_eq!(preview.borrow().session().unwrap().content, PreviewContent::Text("hello".into()));
    }

    /// Backend whose replies are released by the test, one URL at a time.
    #[derive(Default)]
    struct GatedBackend {
        pending: RefCell<HashMap<String, oneshot::Receiver<FakeResponse>>>,
    }

    impl GatedBackend {
        fn gate(&self, url: &str) -> oneshot::Sender<FakeResponse> {
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().insert(url.to_string(), rx);
            tx
        }
    }

    #[async_trait(?Send)]
    impl Backend for GatedBackend {
        type Response = FakeResponse;

        async fn get(&self, url: &str) -> Result<FakeResponse, TransportError> {
            let rx = self.pending.borrow_mut().remove(url);
            match rx {
                Some(rx) => rx.await.map_err(|_| TransportError::Network("cancelled".into())),
                None => Err(TransportError::Network("unexpected request".into())),
            }
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<FakeResponse, TransportError> {
            Err(TransportError::Network("unexpected request".into()))
        }
    }

    #[test]
    fn test_out_of_order_responses_end_to_end() {
        let preview = Rc::new(RefCell::new(PreviewController::default()));
        let backend = Rc::new(GatedBackend::default());
        let browser = FakeBrowser::at(100);
        let release_a = backend.gate("/uploads/f/a.txt?preview=1");
        let release_b = backend.gate("/uploads/f/b.png?preview=1");

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        for t in [target(0, "a.txt"), target(1, "b.png")] {
            let (preview, backend, browser) = (preview.clone(), backend.clone(), browser.clone());
            spawner
                .spawn_local(async move { open(&*preview, &*backend, &browser, t).await })
                .unwrap();
            pool.run_until_stalled();
        }

        release_b.send(FakeResponse::typed("image/png", String::new())).unwrap();
        pool.run_until_stalled();
        let after_b = preview.borrow().clone();
        assert_eq!(after_b.active_row(), Some(1));
        assert!(matches!(after_b.session().unwrap().content, PreviewContent::Image { .. }));

        release_a.send(FakeResponse::typed("text/plain", "stale".into())).unwrap();
        pool.run_until_stalled();
        assert_eq!(*preview.borrow(), after_b);
    }
}
