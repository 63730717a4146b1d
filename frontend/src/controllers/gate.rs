//! Encryption gate in front of the upload.
//!
//! Before the first upload into a folder that does not exist yet, the user
//! is offered to protect it with a PIN. The gate never stands in the way:
//! every failure while checking degrades to a direct upload.

use serde::Deserialize;

use super::StateCell;
use crate::services::{read_json, ApiResponse, Backend};
use crate::{FolderPinState, FOLDER_LOOKUP_URL, HAS_FOLDER_URL};

/// Where the gate currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateState {
    Idle,
    CheckingFolder,
    ResolvingFolder,
    /// Asking whether the new folder should be protected.
    EncryptPrompt { folder: String },
    /// The first-time PIN dialog is open.
    PinFlow { folder: String },
    Uploading,
}

/// Outcome of [`run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Go straight to the upload transport.
    Upload,
    /// Show the encryption offer for `folder`.
    Prompt { folder: String },
    /// Nothing staged, or a check is already running.
    Ignored,
}

#[derive(Debug, Deserialize)]
struct HasFolderBody {
    has_folder: bool,
}

#[derive(Debug, Deserialize)]
struct FolderBody {
    folder: Option<String>,
}

/// Upload gate state machine.
///
/// The uploader's folder id is cached for the lifetime of the instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadGate {
    state: GateState,
    folder: FolderPinState,
}

impl UploadGate {
    /// `page_folder` is the id the host page already knows, if any.
    pub fn new(page_folder: Option<String>) -> Self {
        Self {
            state: GateState::Idle,
            folder: FolderPinState {
                folder_id: page_folder.filter(|f| !f.is_empty()),
                has_pin: false,
            },
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn cached_folder(&self) -> Option<&str> {
        self.folder.folder_id.as_deref()
    }

    /// Start a check for `staged` files; `false` when nothing should happen.
    pub fn begin(&mut self, staged: usize) -> bool {
        if staged == 0 || self.state != GateState::Idle {
            return false;
        }
        self.state = GateState::CheckingFolder;
        true
    }

    /// Apply the folder-exists answer.
    ///
    /// Returns the cached folder id to skip the lookup with, `Ok(None)` when
    /// a lookup is needed, or `Err(decision)` when the gate is done.
    fn on_has_folder(&mut self, has_folder: bool) -> Result<Option<String>, GateDecision> {
        if self.state != GateState::CheckingFolder {
            return Err(GateDecision::Ignored);
        }
        if has_folder {
            self.state = GateState::Uploading;
            return Err(GateDecision::Upload);
        }
        self.state = GateState::ResolvingFolder;
        Ok(self.folder.folder_id.clone())
    }

    fn on_folder(&mut self, folder: Option<String>) -> GateDecision {
        if self.state != GateState::ResolvingFolder {
            return GateDecision::Ignored;
        }
        match folder.filter(|f| !f.is_empty()) {
            Some(folder) if self.folder.has_pin && self.cached_folder() == Some(folder.as_str()) => {
                log::info!("🔐 Folder {} already protected", folder);
                self.state = GateState::Uploading;
                GateDecision::Upload
            }
            Some(folder) => {
                self.folder.folder_id = Some(folder.clone());
                self.state = GateState::EncryptPrompt {
                    folder: folder.clone(),
                };
                GateDecision::Prompt { folder }
            }
            None => {
                self.state = GateState::Uploading;
                GateDecision::Upload
            }
        }
    }

    /// "No" on the encryption offer.
    pub fn decline(&mut self) -> bool {
        if !matches!(self.state, GateState::EncryptPrompt { .. }) {
            return false;
        }
        self.state = GateState::Uploading;
        true
    }

    /// "Yes" on the encryption offer; returns the folder to protect.
    pub fn accept(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, GateState::Idle) {
            GateState::EncryptPrompt { folder } => {
                self.state = GateState::PinFlow {
                    folder: folder.clone(),
                };
                Some(folder)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// The PIN flow ended, by success or cancel; the upload goes ahead.
    pub fn pin_finished(&mut self, protected: bool) -> bool {
        if !matches!(self.state, GateState::PinFlow { .. }) {
            return false;
        }
        self.folder.has_pin |= protected;
        self.state = GateState::Uploading;
        true
    }

    /// Back to idle so a failed upload can be retried.
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
    }
}

async fn has_folder<B: Backend>(backend: &B) -> bool {
    match backend.get(HAS_FOLDER_URL).await {
        Ok(response) if response.ok() => match read_json::<HasFolderBody>(&response).await {
            Some(body) => body.has_folder,
            None => {
                log::warn!("Unreadable folder check, uploading directly");
                true
            }
        },
        Ok(response) => {
            log::warn!("Folder check returned {}, uploading directly", response.status());
            true
        }
        Err(e) => {
            log::warn!("Folder check failed ({}), uploading directly", e);
            true
        }
    }
}

async fn lookup_folder<B: Backend>(backend: &B) -> Option<String> {
    match backend.get(FOLDER_LOOKUP_URL).await {
        Ok(response) if response.ok() => read_json::<FolderBody>(&response)
            .await
            .and_then(|body| body.folder),
        Ok(response) => {
            log::warn!("Folder lookup returned {}", response.status());
            None
        }
        Err(e) => {
            log::warn!("Folder lookup failed: {}", e);
            None
        }
    }
}

/// Run the gate checks for `staged` files.
pub async fn run<B: Backend>(gate: &impl StateCell<UploadGate>, backend: &B, staged: usize) -> GateDecision {
    if gate.with_mut(|g| g.begin(staged)) != Some(true) {
        return GateDecision::Ignored;
    }

    let exists = has_folder(backend).await;
    let cached = match gate.with_mut(|g| g.on_has_folder(exists)) {
        Some(Ok(cached)) => cached,
        Some(Err(decision)) => return decision,
        None => return GateDecision::Ignored,
    };

    let folder = match cached {
        Some(folder) => Some(folder),
        None => lookup_folder(backend).await,
    };

    let decision = gate
        .with_mut(|g| g.on_folder(folder))
        .unwrap_or(GateDecision::Ignored);
    if let GateDecision::Prompt { folder } = &decision {
        log::info!("🔐 New folder {}, offering encryption", folder);
    }
    decision
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;

    use super::*;
    use crate::services::api::fake::{FakeBackend, FakeResponse};
    use crate::TransportError;

    fn gate(folder: Option<&str>) -> RefCell<UploadGate> {
        RefCell::new(UploadGate::new(folder.map(str::to_string)))
    }

    fn urls(backend: &FakeBackend) -> Vec<String> {
        backend.sent().into_iter().map(|s| s.url).collect()
    }

    #[test]
    fn test_existing_folder_uploads_directly() {
        let backend = FakeBackend::default().reply(Ok(FakeResponse::json(200, r#"{"has_folder": true}"#)));
        let gate = gate(None);
        assert_eq!(block_on(run(&gate, &backend, 2)), GateDecision::Upload);
        assert_eq!(urls(&backend), vec![HAS_FOLDER_URL]);
        assert_eq!(gate.borrow().state(), &GateState::Uploading);
    }

    #[test]
    fn test_new_folder_prompts_and_caches() {
        let backend = FakeBackend::default()
            .reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)))
            .reply(Ok(FakeResponse::json(200, r#"{"folder": "abc"}"#)));
        let gate = gate(None);

        let decision = block_on(run(&gate, &backend, 1));
        assert_eq!(decision, GateDecision::Prompt { folder: "abc".into() });
        assert_eq!(urls(&backend), vec![HAS_FOLDER_URL, FOLDER_LOOKUP_URL]);
        assert_eq!(gate.borrow().cached_folder(), Some("abc"));

        // second run reuses the cached id
        assert!(gate.borrow_mut().decline());
        gate.borrow_mut().reset();
        let backend = FakeBackend::default().reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)));
        assert_eq!(block_on(run(&gate, &backend, 1)), GateDecision::Prompt { folder: "abc".into() });
        assert_eq!(urls(&backend), vec![HAS_FOLDER_URL]);
    }

    #[test]
    fn test_page_folder_skips_lookup() {
        let backend = FakeBackend::default().reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)));
        let gate = gate(Some("10.0.0.7"));
        assert_eq!(block_on(run(&gate, &backend, 1)), GateDecision::Prompt { folder: "10.0.0.7".into() });
        assert_eq!(urls(&backend), vec![HAS_FOLDER_URL]);
    }

    #[test]
    fn test_failures_degrade_to_upload() {
        let cases = vec![
            FakeBackend::default().reply(Err(TransportError::Network("offline".into()))),
            FakeBackend::default().reply(Ok(FakeResponse::json(500, r#"{"has_folder": false}"#))),
            FakeBackend::default().reply(Ok(FakeResponse::json(200, "not json"))),
            FakeBackend::default()
                .reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)))
                .reply(Err(TransportError::Network("offline".into()))),
            FakeBackend::default()
                .reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)))
                .reply(Ok(FakeResponse::json(200, r#"{"folder": null}"#))),
            FakeBackend::default()
                .reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)))
                .reply(Ok(FakeResponse::json(404, r#"{"folder": "abc"}"#))),
        ];
        for backend in cases {
            let gate = gate(None);
            assert_eq!(block_on(run(&gate, &backend, 1)), GateDecision::Upload);
            assert_eq!(gate.borrow().cached_folder(), None);
        }
    }

    #[test]
    fn test_nothing_staged_is_ignored() {
        let backend = FakeBackend::default();
        let gate = gate(None);
        assert_eq!(block_on(run(&gate, &backend, 0)), GateDecision::Ignored);
        assert!(backend.sent().is_empty());
    }

    #[test]
    fn test_busy_gate_is_ignored() {
        let backend = FakeBackend::default();
        let gate = gate(None);
        gate.borrow_mut().begin(1);
        assert_eq!(block_on(run(&gate, &backend, 1)), GateDecision::Ignored);
        assert!(backend.sent().is_empty());
    }

    #[test]
    fn test_protected_folder_not_offered_again() {
        let gate = gate(Some("abc"));
        gate.borrow_mut().state = GateState::PinFlow { folder: "abc".into() };
        assert!(gate.borrow_mut().pin_finished(true));
        gate.borrow_mut().reset();

        let backend = FakeBackend::default().reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)));
        assert_eq!(block_on(run(&gate, &backend, 1)), GateDecision::Upload);
        assert_eq!(gate.borrow().state(), &GateState::Uploading);

        // a declined offer is made again
        let declined = self::gate(Some("abc"));
        declined.borrow_mut().state = GateState::EncryptPrompt { folder: "abc".into() };
        assert!(declined.borrow_mut().decline());
        declined.borrow_mut().reset();
        let backend = FakeBackend::default().reply(Ok(FakeResponse::json(200, r#"{"has_folder": false}"#)));
        assert_eq!(block_on(run(&declined, &backend, 1)), GateDecision::Prompt { folder: "abc".into() });
    }

    #[test]
    fn test_prompt_choices() {
        let mut gate = UploadGate::new(None);
        gate.state = GateState::EncryptPrompt { folder: "abc".into() };
        assert_eq!(gate.accept(), Some("abc".to_string()));
        assert_eq!(gate.state(), &GateState::PinFlow { folder: "abc".into() });
        assert!(!gate.decline());
        assert!(gate.pin_finished(true));
        assert!(gate.folder.has_pin);
        assert_eq!(gate.state(), &GateState::Uploading);
        assert!(!gate.pin_finished(false));
        assert_eq!(gate.accept(), None);
        assert_eq!(gate.state(), &GateState::Uploading);
    }
}
