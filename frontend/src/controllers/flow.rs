//! Upload flow from the trigger to the transport.
//!
//! Ties the gate, the first-time PIN dialog and the upload session
//! together. The page only spawns these drivers and carries out the
//! [`FlowStep`] they end on.

use super::{gate, pin, upload, GateDecision, PinAction, PinManager, PinOutcome, Scheduled, StateCell, UploadGate, UploadSession};
use crate::services::{Backend, Uploader};
use crate::UploadStatus;

/// What the page does once a driver returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowStep {
    /// Waiting on the user, or nothing to do.
    Idle,
    /// The upload ended; the follow-up is due after its delay.
    Finished(Scheduled),
    /// The session could not start and should be cleared.
    Abandoned,
    /// A folder's protection changed.
    Reload,
}

/// The optional upload session seen as a cell of the session itself.
#[derive(Clone)]
struct SessionSlot<S>(S);

impl<S: StateCell<Option<UploadSession>>> StateCell<UploadSession> for SessionSlot<S> {
    fn with_mut<R>(&self, f: impl FnOnce(&mut UploadSession) -> R) -> Option<R> {
        self.0.with_mut(|slot| slot.as_mut().map(f)).flatten()
    }
}

/// Controllers and services taking part in one upload.
pub struct UploadFlow<'a, G, P, S, F, B, U> {
    pub gate: G,
    pub pins: P,
    pub session: S,
    /// Staged files, read when they are needed
    pub files: F,
    pub backend: &'a B,
    pub uploader: &'a U,
    pub action: String,
}

impl<G, P, S, F, B, U> UploadFlow<'_, G, P, S, F, B, U>
where
    G: StateCell<UploadGate>,
    P: StateCell<PinManager>,
    S: StateCell<Option<UploadSession>> + Clone + 'static,
    F: Fn() -> Vec<U::File>,
    B: Backend,
    U: Uploader,
{
    /// Upload trigger: run the gate, then upload unless it prompts.
    pub async fn trigger(&self) -> FlowStep {
        let staged = (self.files)().len();
        match gate::run(&self.gate, self.backend, staged).await {
            GateDecision::Upload => self.send().await,
            GateDecision::Prompt { .. } | GateDecision::Ignored => FlowStep::Idle,
        }
    }

    /// "No" on the encryption offer.
    pub async fn decline(&self) -> FlowStep {
        if self.gate.with_mut(UploadGate::decline) == Some(true) {
            self.send().await
        } else {
            FlowStep::Idle
        }
    }

    /// "Yes" on the encryption offer; opens the first-time PIN dialog.
    pub fn accept(&self) -> bool {
        match self.gate.with_mut(UploadGate::accept).flatten() {
            Some(folder) => self.pins.with_mut(|p| p.open_first_time(folder)).is_some(),
            None => false,
        }
    }

    pub async fn submit_pin(&self, action: PinAction) -> FlowStep {
        let outcome = pin::submit(&self.pins, self.backend, action).await;
        self.resume(outcome).await
    }

    pub async fn cancel_pin(&self) -> FlowStep {
        let outcome = self.pins.with_mut(PinManager::cancel).flatten();
        self.resume(outcome).await
    }

    async fn resume(&self, outcome: Option<PinOutcome>) -> FlowStep {
        match outcome {
            Some(PinOutcome::ResumeUpload { protected }) => {
                if self.gate.with_mut(|g| g.pin_finished(protected)) == Some(true) {
                    self.send().await
                } else {
                    FlowStep::Idle
                }
            }
            Some(PinOutcome::Reload) => FlowStep::Reload,
            None => FlowStep::Idle,
        }
    }

    /// Send the staged files with a fresh session.
    async fn send(&self) -> FlowStep {
        let files = (self.files)();
        let fresh = self.session.with_mut(|slot| {
            if slot.as_ref().is_some_and(|s| s.status() == UploadStatus::InFlight) {
                return false;
            }
            *slot = Some(UploadSession::new(files.len()));
            true
        });
        if fresh != Some(true) {
            return FlowStep::Idle;
        }

        let slot = SessionSlot(self.session.clone());
        match upload::run(&slot, self.uploader, &self.action, files).await {
            Some(scheduled) => FlowStep::Finished(scheduled),
            None => FlowStep::Abandoned,
        }
    }

    /// Drop the session and rearm the gate for the next trigger.
    pub fn dismiss(&self) {
        self.session.with_mut(|slot| *slot = None);
        self.gate.with_mut(UploadGate::reset);
    }
}
