//! Upload progress overlay.

use leptos::*;

use super::PageState;
use crate::controllers::UploadSession;
use crate::UploadStatus;

fn files_label(count: usize) -> String {
    match count {
        1 => "1 file".to_string(),
        n => format!("{} files", n),
    }
}

/// Overlay covering the page while an upload session exists.
#[component]
pub fn ProgressOverlay() -> impl IntoView {
    let state = expect_context::<PageState>();

    let field = move |f: fn(&UploadSession) -> String| {
        move || state.session.with(|s| s.as_ref().map(f).unwrap_or_default())
    };

    let status_class = move || {
        state.session.with(|s| match s.as_ref().map(|s| s.status()) {
            Some(UploadStatus::Succeeded) => "progress-overlay is-done",
            Some(UploadStatus::Failed) => "progress-overlay is-failed",
            _ => "progress-overlay",
        })
    };

    let busy = move || {
        state
            .session
            .with(|s| s.as_ref().is_some_and(|s| !s.status().is_terminal()))
            .to_string()
    };

    view! {
        <Show when=move || state.session.with(Option::is_some) fallback=|| view! {}>
            <div class=status_class role="status" aria-live="polite" aria-busy=busy>
                <div class="progress-label">{field(|s| s.label().to_string())}</div>
                <div class="progress-files">{field(|s| files_label(s.file_count()))}</div>
                <div class="progress-bar">
                    <div class="progress-fill" style:width=field(|s| s.bar_width())></div>
                </div>
                <div class="progress-pct">{field(|s| s.percent_text())}</div>
            </div>
        </Show>
    }
}
