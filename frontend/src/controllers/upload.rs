//! Upload session driving the multipart transport.
//!
//! A session runs once: `Idle → InFlight → Succeeded | Failed`. Retrying
//! after a failure means building a new session.

use std::time::Duration;

use thiserror::Error;

use super::StateCell;
use crate::config::messages;
use crate::services::Uploader;
use crate::{
    Progress, TransferProgress, TransportError, UploadStatus, FAILURE_RESET_DELAY, LANDING_URL,
    SUCCESS_REDIRECT_DELAY,
};

/// Reasons a session refuses to start.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No files selected")]
    NothingStaged,

    #[error("Upload session already started")]
    AlreadyStarted,
}

/// What happens once a session reached its terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Followup {
    /// Leave for the landing page.
    Navigate(String),
    /// Hide the progress overlay so the user can retry.
    Dismiss,
}

/// A [`Followup`] and how long to wait before running it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scheduled {
    pub delay: Duration,
    pub followup: Followup,
}

/// One upload of the staged batch.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadSession {
    file_count: usize,
    status: UploadStatus,
    progress: Progress,
    // Last computable percentage; kept while progress is indeterminate.
    bar_percent: u32,
}

impl UploadSession {
    pub fn new(file_count: usize) -> Self {
        Self {
            file_count,
            status: UploadStatus::Idle,
            progress: Progress::Fraction(0.0),
            bar_percent: 0,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn start(&mut self) -> Result<(), UploadError> {
        if self.file_count == 0 {
            return Err(UploadError::NothingStaged);
        }
        if self.status != UploadStatus::Idle {
            return Err(UploadError::AlreadyStarted);
        }
        self.status = UploadStatus::InFlight;
        self.progress = Progress::Fraction(0.0);
        self.bar_percent = 0;
        Ok(())
    }

    pub fn on_progress(&mut self, event: TransferProgress) {
        if self.status != UploadStatus::InFlight {
            return;
        }
        match event.total.filter(|total| *total > 0) {
            Some(total) => {
                let fraction = (event.loaded as f64 / total as f64).clamp(0.0, 1.0);
                self.progress = Progress::Fraction(fraction);
                self.bar_percent = (fraction * 100.0).round() as u32;
            }
            None => self.progress = Progress::Indeterminate,
        }
    }

    /// Record the transport's result and schedule what comes next.
    pub fn finish(&mut self, result: Result<u16, TransportError>) -> Option<Scheduled> {
        if self.status != UploadStatus::InFlight {
            return None;
        }
        match result {
            Ok(status) if (200..300).contains(&status) => {
                log::info!("✅ Uploaded {} file(s)", self.file_count);
                self.status = UploadStatus::Succeeded;
                self.progress = Progress::Fraction(1.0);
                self.bar_percent = 100;
                Some(Scheduled {
                    delay: SUCCESS_REDIRECT_DELAY,
                    followup: Followup::Navigate(LANDING_URL.to_string()),
                })
            }
            other => {
                match other {
                    Ok(status) => log::error!("❌ Upload rejected with status {}", status),
                    Err(e) => log::error!("❌ Upload failed: {}", e),
                }
                self.status = UploadStatus::Failed;
                Some(Scheduled {
                    delay: FAILURE_RESET_DELAY,
                    followup: Followup::Dismiss,
                })
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self.status {
            UploadStatus::Succeeded => messages::UPLOAD_DONE,
            UploadStatus::Failed => messages::UPLOAD_FAILED,
            UploadStatus::Idle | UploadStatus::InFlight => messages::UPLOADING,
        }
    }

    /// Percentage text, or the indeterminate marker.
    pub fn percent_text(&self) -> String {
        match self.progress {
            Progress::Indeterminate => messages::PROGRESS_INDETERMINATE.to_string(),
            Progress::Fraction(_) => format!("{}%", self.bar_percent),
        }
    }

    /// CSS width of the progress bar.
    pub fn bar_width(&self) -> String {
        format!("{}%", self.bar_percent)
    }
}

/// Start `session` and push `files` through `uploader`.
///
/// Returns the follow-up to run once the session ended, or `None` when the
/// session could not start.
pub async fn run<U, C>(session: &C, uploader: &U, action: &str, files: Vec<U::File>) -> Option<Scheduled>
where
    U: Uploader,
    C: StateCell<UploadSession> + Clone + 'static,
{
    match session.with_mut(UploadSession::start)? {
        Ok(()) => {}
        Err(e) => {
            log::warn!("Upload not started: {}", e);
            return None;
        }
    }

    let progress = session.clone();
    let result = uploader
        .upload(
            action,
            &files,
            Box::new(move |event| {
                progress.with_mut(|s| s.on_progress(event));
            }),
        )
        .await;

    session.with_mut(|s| s.finish(result)).flatten()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::services::transport::fake::FakeUploader;

    fn progress(loaded: u64, total: Option<u64>) -> TransferProgress {
        TransferProgress { loaded, total }
    }

    #[test]
    fn test_success_navigates_after_short_delay() {
        let session = Rc::new(RefCell::new(UploadSession::new(2)));
        let uploader = FakeUploader::new(vec![progress(50, Some(200)), progress(200, Some(200))], Ok(201));

        let scheduled = block_on(run(&session, &uploader, "/upload", vec!["a", "b"]));
        assert_eq!(
            scheduled,
            Some(Scheduled {
                delay: Duration::from_millis(600),
                followup: Followup::Navigate("/".into()),
            })
        );
        let session = session.borrow();
        assert_eq!(session.status(), UploadStatus::Succeeded);
        assert_eq!(session.label(), "Done!");
        assert_eq!(session.percent_text(), "100%");
        assert_eq!(uploader.calls.borrow()[0], ("/upload".to_string(), vec!["a", "b"]));
    }

    #[test]
    fn test_failure_dismisses_after_long_delay() {
        for result in [Ok(500), Err(TransportError::Network("offline".into()))] {
            let session = Rc::new(RefCell::new(UploadSession::new(1)));
            let uploader = FakeUploader::new(vec![], result);
            let scheduled = block_on(run(&session, &uploader, "/", vec!["a"]));
            assert_eq!(
                scheduled,
                Some(Scheduled {
                    delay: Duration::from_millis(2000),
                    followup: Followup::Dismiss,
                })
            );
            assert_eq!(session.borrow().status(), UploadStatus::Failed);
            assert_eq!(session.borrow().label(), "Upload failed");
        }
    }

    #[test]
    fn test_progress_percentages() {
        let mut session = UploadSession::new(1);
        session.start().unwrap();
        assert_eq!(session.percent_text(), "0%");

        session.on_progress(progress(1, Some(3)));
        assert_eq!(session.percent_text(), "33%");
        assert_eq!(session.bar_width(), "33%");

        session.on_progress(progress(2, Some(3)));
        assert_eq!(session.percent_text(), "67%");

        session.on_progress(progress(10, None));
        assert_eq!(session.progress(), Progress::Indeterminate);
        assert_eq!(session.percent_text(), "...");
        assert_eq!(session.bar_width(), "67%");
    }

    #[test]
    fn test_session_never_restarts() {
        let mut session = UploadSession::new(1);
        assert_eq!(session.start(), Ok(()));
        assert_eq!(session.start(), Err(UploadError::AlreadyStarted));
        session.finish(Ok(200));
        assert_eq!(session.start(), Err(UploadError::AlreadyStarted));
        assert_eq!(session.finish(Ok(200)), None);
        assert_eq!(session.status(), UploadStatus::Succeeded);
    }

    #[test]
    fn test_empty_session_does_not_upload() {
        let session = Rc::new(RefCell::new(UploadSession::new(0)));
        let uploader = FakeUploader::new(vec![], Ok(200));
        assert_eq!(block_on(run(&session, &uploader, "/", vec![])), None);
        assert!(uploader.calls.borrow().is_empty());
        assert_eq!(session.borrow().status(), UploadStatus::Idle);
    }

    #[test]
    fn test_progress_ignored_outside_flight() {
        let mut session = UploadSession::new(1);
        session.on_progress(progress(5, Some(10)));
        assert_eq!(session.percent_text(), "0%");
    }
}
