//! Two-step confirmation in front of destructive form submissions.

use crate::DEFAULT_CONFIRM_MESSAGE;

/// Holds at most one pending action until the user confirms or cancels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmDialog<A> {
    pending: Option<A>,
    message: String,
}

impl<A> Default for ConfirmDialog<A> {
    fn default() -> Self {
        Self {
            pending: None,
            message: String::new(),
        }
    }
}

impl<A> ConfirmDialog<A> {
    /// Bind `action`, replacing any previous one.
    pub fn open(&mut self, action: A, message: Option<&str>) {
        self.message = message
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_CONFIRM_MESSAGE)
            .to_string();
        self.pending = Some(action);
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Close and hand back the bound action for execution.
    pub fn confirm(&mut self) -> Option<A> {
        self.pending.take()
    }

    /// Close without running anything.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Click on the dialog; only a click on the backdrop itself closes it.
    pub fn backdrop_click(&mut self, on_backdrop: bool) {
        if on_backdrop {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_runs_bound_action_once() {
        let mut dialog = ConfirmDialog::default();
        dialog.open("delete-a", Some("Delete a.txt?"));
        assert!(dialog.is_open());
        assert_eq!(dialog.message(), "Delete a.txt?");
        assert_eq!(dialog.confirm(), Some("delete-a"));
        assert!(!dialog.is_open());
        assert_eq!(dialog.confirm(), None);
    }

    #[test]
    fn test_default_message() {
        let mut dialog = ConfirmDialog::default();
        dialog.open(1, None);
        assert_eq!(dialog.message(), "Delete?");
        dialog.open(2, Some(""));
        assert_eq!(dialog.message(), "Delete?");
    }

    #[test]
    fn test_cancel_and_backdrop_discard() {
        let mut dialog = ConfirmDialog::default();
        dialog.open("a", None);
        dialog.cancel();
        assert_eq!(dialog.confirm(), None);

        dialog.open("b", None);
        dialog.backdrop_click(false);
        assert!(dialog.is_open());
        dialog.backdrop_click(true);
        assert_eq!(dialog.confirm(), None);
    }

    #[test]
    fn test_reopen_replaces_pending() {
        let mut dialog = ConfirmDialog::default();
        dialog.open("first", Some("Delete first?"));
        dialog.open("second", Some("Delete second?"));
        assert_eq!(dialog.message(), "Delete second?");
        assert_eq!(dialog.confirm(), Some("second"));
    }
}
