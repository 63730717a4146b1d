//! File rows, their delete forms and the inline preview panel.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use super::PageState;
use crate::controllers::{preview, Click, PreviewContent};
use crate::services::{HttpBackend, WebBrowser};
use crate::FileRow;

impl From<&ev::MouseEvent> for Click {
    fn from(ev: &ev::MouseEvent) -> Self {
        Self {
            button: ev.button(),
            meta: ev.meta_key(),
            ctrl: ev.ctrl_key(),
            shift: ev.shift_key(),
            alt: ev.alt_key(),
        }
    }
}

/// Whether the click started inside the row's action controls.
fn in_row_actions(ev: &ev::MouseEvent) -> bool {
    ev.target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(".row-actions").ok().flatten())
        .is_some()
}

#[component]
pub fn FileList(files: Vec<FileRow>) -> impl IntoView {
    view! {
        <ul class="file-table">
            {files.into_iter().map(|file| view! { <FileEntry file=file/> }).collect_view()}
        </ul>
    }
}

#[component]
fn FileEntry(file: FileRow) -> impl IntoView {
    let state = expect_context::<PageState>();
    let row = file.target.row;
    let name = file.target.display_name().to_string();
    let download_url = file.target.download_url.clone();
    let target = store_value(file.target);

    let activate = move || {
        let target = target.get_value();
        spawn_local(async move {
            preview::open(&state.preview, &HttpBackend, &WebBrowser, target).await;
        });
    };

    let on_trigger = move |ev: ev::MouseEvent| {
        ev.stop_propagation();
        if !Click::from(&ev).is_plain() {
            return;
        }
        ev.prevent_default();
        activate();
    };

    let on_row_click = move |ev: ev::MouseEvent| {
        if !in_row_actions(&ev) {
            activate();
        }
    };

    let is_active = move || state.preview.with(|p| p.active_row() == Some(row));

    let delete = file.delete_url.map(|action| {
        let form_id = format!("delete-file-{}", row);
        let message = file.confirm_message.clone();
        let pending = form_id.clone();
        view! {
            <form id=form_id method="post" action=action class="delete-form">
                <button
                    type="button"
                    class="delete-btn"
                    on:click=move |_| {
                        state.confirm.update(|c| c.open(pending.clone(), message.as_deref()));
                    }
                >
                    "Delete"
                </button>
            </form>
        }
    });

    view! {
        <li class="file-table-row" class:is-preview-active=is_active on:click=on_row_click>
            <a class="file-name js-file-preview-trigger" href=download_url.clone() on:click=on_trigger>
                {name.clone()}
            </a>
            <div class="row-actions">
                <a class="download-btn" href=download_url download=name>
                    "Download"
                </a>
                {delete}
            </div>
        </li>
        <Show when=is_active fallback=|| view! {}>
            <li class="file-preview-row">
                <PreviewPanel/>
            </li>
        </Show>
    }
}

/// The single preview surface, rendered after the active row.
#[component]
fn PreviewPanel() -> impl IntoView {
    let state = expect_context::<PageState>();

    let header = create_memo(move |_| {
        state.preview.with(|p| {
            p.session()
                .map(|s| (s.target.display_name().to_string(), s.target.download_url.clone()))
                .unwrap_or_default()
        })
    });
    let content = create_memo(move |_| state.preview.with(|p| p.session().map(|s| s.content.clone())));

    let body = move || {
        content.get().map(|content| match content {
            PreviewContent::Message(text) => view! { <p class="file-preview-empty">{text}</p> }.into_view(),
            PreviewContent::Image { src, alt } => {
                view! { <img class="file-preview-image" src=src alt=alt/> }.into_view()
            }
            PreviewContent::Text(text) => view! { <pre class="file-preview-text">{text}</pre> }.into_view(),
            PreviewContent::Embed { src } => {
                view! { <iframe class="file-preview-embed" src=src title="File preview"></iframe> }.into_view()
            }
        })
    };

    view! {
        <section class="file-preview-panel" aria-live="polite">
            <div class="file-preview-header">
                <h2>{move || header.with(|(name, _)| name.clone())}</h2>
                <a
                    class="file-preview-download"
                    href=move || header.with(|(_, url)| url.clone())
                    download=move || header.with(|(name, _)| name.clone())
                >
                    "Download"
                </a>
            </div>
            <div class="file-preview-content">{body}</div>
        </section>
    }
}
