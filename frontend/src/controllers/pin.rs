//! Folder protection PIN: set, change and remove.
//!
//! Both entry points, the first-time offer from the upload gate and the
//! folder menu, go through [`PinManager::prepare`], so a payload that fails
//! validation never reaches the network.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use thiserror::Error;

use super::StateCell;
use crate::config::messages;
use crate::services::{error_message, ApiResponse, Backend};
use crate::MIN_PIN_LENGTH;

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `/uploads/{folder}/set-pin`, folder encoded as a URI component.
pub fn set_pin_url(folder: &str) -> String {
    format!("/uploads/{}/set-pin", utf8_percent_encode(folder, URI_COMPONENT))
}

/// Client-side validation failures.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PinError {
    #[error("PIN must be at least 4 characters")]
    TooShort,

    #[error("New PIN must be at least 4 characters")]
    NewTooShort,

    #[error("PIN and Confirm PIN do not match")]
    Mismatch,

    #[error("Please enter your current PIN")]
    CurrentRequired,
}

/// What the user asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinAction {
    /// Protect an unprotected folder.
    Set { pin: String, confirm: String },
    /// Replace the PIN of a protected folder.
    Change { current: String, new: String },
    /// Drop protection.
    Remove { current: String },
}

/// JSON body of `POST /uploads/{folder}/set-pin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PinPayload {
    Set { pin: String },
    Change { pin: String, current_pin: String },
    Remove { remove: bool, current_pin: String },
}

/// Length as the browser reports it, in UTF-16 code units.
fn long_enough(pin: &str) -> bool {
    pin.encode_utf16().count() >= MIN_PIN_LENGTH
}

impl PinAction {
    /// Check the action and build its payload.
    pub fn validate(self) -> Result<PinPayload, PinError> {
        match self {
            PinAction::Set { pin, confirm } => {
                if !long_enough(&pin) {
                    return Err(PinError::TooShort);
                }
                if pin != confirm {
                    return Err(PinError::Mismatch);
                }
                Ok(PinPayload::Set { pin })
            }
            PinAction::Change { current, new } => {
                if !long_enough(&new) {
                    return Err(PinError::NewTooShort);
                }
                Ok(PinPayload::Change {
                    pin: new,
                    current_pin: current,
                })
            }
            PinAction::Remove { current } => {
                if !long_enough(&current) {
                    return Err(PinError::CurrentRequired);
                }
                Ok(PinPayload::Remove {
                    remove: true,
                    current_pin: current,
                })
            }
        }
    }
}

/// Why the PIN dialogs were opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Offered by the upload gate for a brand new folder.
    FirstTime,
    /// Opened from a folder's menu.
    Manage { has_pin: bool },
}

/// Which of the two dialogs an error or request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinDialog {
    Main,
    Remove,
}

/// What to do after the dialogs closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinOutcome {
    /// Carry on with the deferred upload; `protected` once a PIN was set.
    ResumeUpload { protected: bool },
    /// Reload so the folder's protection state is re-derived.
    Reload,
}

/// Server answer to a PIN request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinResponse {
    Accepted,
    Rejected(String),
    Unreachable,
}

/// A validated request ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinRequest {
    /// Matches [`PinManager::finish`] to the request it answers
    pub id: u64,
    pub url: String,
    pub payload: PinPayload,
    pub dialog: PinDialog,
}

impl PinRequest {
    fn fallback_message(&self) -> &'static str {
        match self.dialog {
            PinDialog::Main => messages::SET_PIN_FAILED,
            PinDialog::Remove => messages::REMOVE_PIN_FAILED,
        }
    }
}

/// Texts of the main dialog for the current mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinDialogText {
    pub title: &'static str,
    pub description: &'static str,
    pub submit_label: &'static str,
    pub first_placeholder: &'static str,
    pub second_placeholder: &'static str,
    pub show_remove: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct DialogState {
    open: bool,
    error: Option<String>,
}

impl DialogState {
    fn show(&mut self) {
        self.open = true;
        self.error = None;
    }

    fn hide(&mut self) {
        self.open = false;
        self.error = None;
    }
}

/// PIN dialogs for one folder at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PinManager {
    folder: Option<String>,
    mode: Option<PinMode>,
    main: DialogState,
    remove: DialogState,
    in_flight: bool,
    // Bumped on every prepare and every close.
    request: u64,
}

impl PinManager {
    /// Open the first-time dialog for a new folder.
    pub fn open_first_time(&mut self, folder: impl Into<String>) {
        self.open(folder.into(), PinMode::FirstTime);
    }

    /// Open the management dialog from a folder menu.
    pub fn open_manage(&mut self, folder: impl Into<String>, has_pin: bool) {
        self.open(folder.into(), PinMode::Manage { has_pin });
    }

    fn open(&mut self, folder: String, mode: PinMode) {
        log::debug!("PIN dialog for {} ({:?})", folder, mode);
        self.folder = Some(folder);
        self.mode = Some(mode);
        self.main.show();
        self.remove.hide();
        self.in_flight = false;
        self.request += 1;
    }

    /// Open the removal dialog on top of the management dialog.
    pub fn open_remove(&mut self) -> bool {
        if !self.main.open || self.mode != Some(PinMode::Manage { has_pin: true }) {
            return false;
        }
        self.remove.show();
        true
    }

    /// Close only the removal dialog.
    pub fn close_remove(&mut self) {
        self.remove.hide();
    }

    /// Close everything without submitting.
    ///
    /// Cancelling the first-time offer still lets the upload go ahead.
    pub fn cancel(&mut self) -> Option<PinOutcome> {
        let mode = self.mode;
        self.close_all();
        match mode {
            Some(PinMode::FirstTime) => Some(PinOutcome::ResumeUpload { protected: false }),
            _ => None,
        }
    }

    fn close_all(&mut self) {
        self.folder = None;
        self.mode = None;
        self.main.hide();
        self.remove.hide();
        self.in_flight = false;
        self.request += 1;
    }

    pub fn mode(&self) -> Option<PinMode> {
        self.mode
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn is_open(&self, dialog: PinDialog) -> bool {
        self.state(dialog).open
    }

    pub fn error(&self, dialog: PinDialog) -> Option<&str> {
        self.state(dialog).error.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether `id` is the request still awaited.
    pub fn is_current(&self, id: u64) -> bool {
        self.in_flight && self.request == id
    }

    fn state(&self, dialog: PinDialog) -> &DialogState {
        match dialog {
            PinDialog::Main => &self.main,
            PinDialog::Remove => &self.remove,
        }
    }

    fn state_mut(&mut self, dialog: PinDialog) -> &mut DialogState {
        match dialog {
            PinDialog::Main => &mut self.main,
            PinDialog::Remove => &mut self.remove,
        }
    }

    /// Map the main dialog's two inputs to an action for the current mode.
    pub fn main_action(&self, first: String, second: String) -> Option<PinAction> {
        match self.mode? {
            PinMode::FirstTime | PinMode::Manage { has_pin: false } => Some(PinAction::Set {
                pin: first,
                confirm: second,
            }),
            PinMode::Manage { has_pin: true } => Some(PinAction::Change {
                current: first,
                new: second,
            }),
        }
    }

    pub fn dialog_text(&self) -> PinDialogText {
        match self.mode {
            Some(PinMode::Manage { has_pin: true }) => PinDialogText {
                title: "Change or remove PIN",
                description: "To remove protection, enter your current PIN below and click Remove PIN above. \
                              To change PIN, enter current and new PIN below and click Change PIN.",
                submit_label: "Change PIN",
                first_placeholder: "Current PIN",
                second_placeholder: "New PIN",
                show_remove: true,
            },
            Some(PinMode::FirstTime) => PinDialogText {
                title: "Set a PIN for your new folder",
                description: "Only people with the PIN will be able to open this folder. \
                              PIN must be at least 4 characters.",
                submit_label: "Set PIN",
                first_placeholder: "Enter PIN",
                second_placeholder: "Confirm PIN",
                show_remove: false,
            },
            _ => PinDialogText {
                title: "Set a PIN to protect your folder",
                description: "Protect this folder so only people with the PIN can open it. \
                              PIN must be at least 4 characters.",
                submit_label: "Set PIN",
                first_placeholder: "Enter PIN",
                second_placeholder: "Confirm PIN",
                show_remove: false,
            },
        }
    }

    /// Validate `action`; on failure the message is shown inline and
    /// `None` is returned.
    pub fn prepare(&mut self, action: PinAction) -> Option<PinRequest> {
        let folder = self.folder.clone()?;
        if self.in_flight {
            return None;
        }
        let dialog = match action {
            PinAction::Remove { .. } => PinDialog::Remove,
            _ => PinDialog::Main,
        };
        if !self.state(dialog).open {
            return None;
        }
        match action.validate() {
            Ok(payload) => {
                self.state_mut(dialog).error = None;
                self.in_flight = true;
                self.request += 1;
                Some(PinRequest {
                    id: self.request,
                    url: set_pin_url(&folder),
                    payload,
                    dialog,
                })
            }
            Err(e) => {
                self.state_mut(dialog).error = Some(e.to_string());
                None
            }
        }
    }

    /// Apply the server's answer to `request`.
    ///
    /// Answers to a request that was closed or superseded are dropped.
    pub fn finish(&mut self, request: &PinRequest, response: PinResponse) -> Option<PinOutcome> {
        if !self.is_current(request.id) {
            log::debug!("Dropping stale PIN response #{}", request.id);
            return None;
        }
        self.in_flight = false;
        let dialog = request.dialog;
        match response {
            PinResponse::Accepted => {
                let outcome = match self.mode? {
                    PinMode::FirstTime => PinOutcome::ResumeUpload { protected: true },
                    PinMode::Manage { .. } => PinOutcome::Reload,
                };
                log::info!("🔐 PIN updated for {}", self.folder.as_deref().unwrap_or("?"));
                self.close_all();
                Some(outcome)
            }
            PinResponse::Rejected(message) => {
                log::warn!("PIN request rejected: {}", message);
                self.state_mut(dialog).error = Some(message);
                None
            }
            PinResponse::Unreachable => {
                self.state_mut(dialog).error = Some(messages::NETWORK_ERROR.to_string());
                None
            }
        }
    }
}

/// Validate and send `action`; `Some` once the dialogs closed successfully.
pub async fn submit<B: Backend>(
    pins: &impl StateCell<PinManager>,
    backend: &B,
    action: PinAction,
) -> Option<PinOutcome> {
    let request = pins.with_mut(|p| p.prepare(action)).flatten()?;

    let response = match serde_json::to_value(&request.payload) {
        Ok(body) => match backend.post_json(&request.url, &body).await {
            Ok(response) if response.ok() => PinResponse::Accepted,
            Ok(response) => {
                PinResponse::Rejected(error_message(&response, request.fallback_message()).await)
            }
            Err(e) => {
                log::error!("PIN request failed: {}", e);
                PinResponse::Unreachable
            }
        },
        Err(e) => {
            log::error!("Failed to encode PIN payload: {}", e);
            PinResponse::Rejected(request.fallback_message().to_string())
        }
    };

    pins.with_mut(|p| p.finish(&request, response)).flatten()
}
