//! Drop zone, staged file list and upload trigger.

use leptos::*;
use web_sys::{File, FileList};

use super::PageState;
use crate::controllers::{is_activation_key, Badge, DropZoneEffect, DropZoneInput, EntryView, GateState};
use crate::StagedFile;

fn files_of(list: Option<FileList>) -> Vec<File> {
    let Some(list) = list else {
        return Vec::new();
    };
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

#[component]
pub fn UploadSection() -> impl IntoView {
    let state = expect_context::<PageState>();
    let picker = create_node_ref::<html::Input>();

    let dispatch = move |input: DropZoneInput<File>| match state.dropzone.try_update(|dz| dz.handle(input)) {
        Some(DropZoneEffect::OpenPicker) => {
            if let Some(input) = picker.get_untracked() {
                input.click();
            }
        }
        Some(DropZoneEffect::FilesChosen(files)) => {
            let staged: Vec<_> = files.into_iter().map(StagedFile::from_web).collect();
            state.selection.update(|s| s.replace_all(staged));
        }
        _ => {}
    };

    let on_picker_change = move |_| {
        let Some(input) = picker.get_untracked() else {
            return;
        };
        let files = files_of(input.files());
        // Picking the same files again must fire a change event.
        input.set_value("");
        dispatch(DropZoneInput::PickerChanged(files));
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        let key = ev.key();
        if is_activation_key(&key) {
            ev.prevent_default();
        }
        dispatch(DropZoneInput::Key(key));
    };

    let drag = move |ev: &ev::DragEvent, input: DropZoneInput<File>| {
        ev.prevent_default();
        ev.stop_propagation();
        dispatch(input);
    };

    let on_drop = move |ev: ev::DragEvent| {
        let files = files_of(ev.data_transfer().and_then(|dt| dt.files()));
        drag(&ev, DropZoneInput::Drop(files));
    };

    let on_upload = move |_| {
        if state.selection.with_untracked(|s| s.can_upload()) && !state.uploading() {
            state.start_upload();
        }
    };

    view! {
        <section class="upload-section">
            <input
                type="file"
                multiple
                class="upload-input"
                style="display:none"
                node_ref=picker
                on:change=on_picker_change
            />
            <div
                class="upload-dropzone"
                class:drag-active=move || state.dropzone.with(|dz| dz.drag_active())
                role="button"
                tabindex="0"
                on:click=move |_| dispatch(DropZoneInput::Click)
                on:keydown=on_keydown
                on:dragenter=move |ev| drag(&ev, DropZoneInput::DragEnter)
                on:dragover=move |ev| drag(&ev, DropZoneInput::DragOver)
                on:dragleave=move |ev| drag(&ev, DropZoneInput::DragLeave)
                on:dragend=move |ev| drag(&ev, DropZoneInput::DragEnd)
                on:drop=on_drop
            >
                <div class="upload-text">"Drop files here"</div>
                <div class="upload-hint">"or click to choose"</div>
            </div>

            <div class="selected-count">
                {move || state.selection.with(|s| s.count_label())}
            </div>

            <ul class="selected-files">
                <For
                    each=move || state.selection.with(|s| s.entries())
                    key=|entry| entry.clone()
                    children=move |entry| view! { <StagedEntry entry=entry/> }
                />
            </ul>

            <button
                class="upload-button"
                disabled=move || !state.selection.with(|s| s.can_upload()) || state.uploading()
                on:click=on_upload
            >
                "Upload"
            </button>
        </section>
    }
}

#[component]
fn StagedEntry(entry: EntryView) -> impl IntoView {
    let state = expect_context::<PageState>();
    let index = entry.index;

    let badge = match entry.badge {
        Badge::Thumbnail(src) => view! { <img class="file-thumb" src=src alt=""/> }.into_view(),
        Badge::Generic(ext) => view! { <span class="file-badge">{ext}</span> }.into_view(),
    };

    view! {
        <li class="selected-file">
            {badge}
            <span class="file-name">{entry.name}</span>
            <span class="file-size">{entry.size_label}</span>
            <button
                type="button"
                class="file-remove"
                aria-label=entry.remove_label
                on:click=move |ev| {
                    ev.stop_propagation();
                    state.selection.update(|s| {
                        s.remove_at(index);
                    });
                }
            >
                "×"
            </button>
        </li>
    }
}

/// Encryption offer shown before the first upload into a new folder.
#[component]
pub fn EncryptPrompt() -> impl IntoView {
    let state = expect_context::<PageState>();

    let open = move || state.gate.with(|g| matches!(g.state(), GateState::EncryptPrompt { .. }));

    let on_no = move |_| state.decline_encryption();
    let on_yes = move |_| state.accept_encryption();

    view! {
        <Show when=open fallback=|| view! {}>
            <div class="modal is-open" aria-hidden="false">
                <div class="modal-dialog" role="dialog" aria-modal="true">
                    <h2 class="modal-title">"Protect your folder?"</h2>
                    <p class="modal-desc">
                        "Your files go into a new folder. Set a PIN to encrypt it so only people with the PIN can open it."
                    </p>
                    <div class="modal-actions">
                        <button type="button" class="btn-secondary" on:click=on_no>"No"</button>
                        <button type="button" class="btn-primary" on:click=on_yes>"Yes"</button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
