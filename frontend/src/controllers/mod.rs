//! Page controllers.
//!
//! Each controller is a plain state machine owning its slice of page state.
//! None of them touch the DOM; network calls go through the
//! [`crate::services`] seams and async drivers apply results through
//! [`StateCell`], so a stale continuation can be recognised and dropped.
//!
//! # Controllers
//!
//! - [`selection`] - staged files and their thumbnail handles
//! - [`dropzone`] - picker, keyboard and drag-and-drop input
//! - [`gate`] - encryption offer before uploading into a new folder
//! - [`pin`] - folder PIN set / change / remove
//! - [`upload`] - upload session and progress
//! - [`flow`] - gate, first-time PIN and upload chained into one flow
//! - [`preview`] - single inline file preview
//! - [`confirm`] - confirmation before destructive actions

use std::cell::RefCell;
use std::rc::Rc;

use leptos::{RwSignal, SignalUpdate};

pub mod confirm;
pub mod dropzone;
pub mod flow;
pub mod gate;
pub mod pin;
pub mod preview;
pub mod selection;
pub mod upload;

pub use confirm::*;
pub use dropzone::*;
pub use flow::{FlowStep, UploadFlow};
pub use gate::{GateDecision, GateState, UploadGate};
pub use pin::*;
pub use preview::*;
pub use selection::*;
pub use upload::{Followup, Scheduled, UploadError, UploadSession};

/// Shared, mutable home of a controller.
///
/// Returns `None` when the state is gone (e.g. a disposed signal), in which
/// case the continuation has nothing left to update.
pub trait StateCell<T> {
    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>;
}

impl<T> StateCell<T> for RefCell<T> {
    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}

impl<T, C: StateCell<T>> StateCell<T> for Rc<C> {
    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        (**self).with_mut(f)
    }
}

impl<T: 'static> StateCell<T> for RwSignal<T> {
    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.try_update(f)
    }
}
