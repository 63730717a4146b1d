//! Delete confirmation modal.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlFormElement;

use super::{on_backdrop, PageState};

fn submit_form(id: &str) {
    let form = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|el| el.dyn_into::<HtmlFormElement>().ok());
    match form {
        Some(form) => {
            if let Err(e) = form.submit() {
                log::error!("Failed to submit {}: {:?}", id, e);
            }
        }
        None => log::warn!("No form #{} to submit", id),
    }
}

/// Confirmation in front of a file deletion.
#[component]
pub fn ConfirmModal() -> impl IntoView {
    let state = expect_context::<PageState>();

    let on_confirm = move |_| {
        if let Some(Some(form_id)) = state.confirm.try_update(|c| c.confirm()) {
            submit_form(&form_id);
        }
    };

    view! {
        <Show when=move || state.confirm.with(|c| c.is_open()) fallback=|| view! {}>
            <div
                class="modal is-open"
                aria-hidden="false"
                on:click=move |ev| state.confirm.update(|c| c.backdrop_click(on_backdrop(&ev)))
            >
                <div class="modal-dialog" role="alertdialog" aria-modal="true">
                    <h2 class="modal-title">{move || state.confirm.with(|c| c.message().to_string())}</h2>
                    <div class="modal-actions">
                        <button type="button" class="btn-secondary" on:click=move |_| state.confirm.update(|c| c.cancel())>
                            "Cancel"
                        </button>
                        <button type="button" class="btn-danger" on:click=on_confirm>
                            "Delete"
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
