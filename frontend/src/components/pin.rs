//! PIN dialogs and the folder menu buttons opening them.
//!
//! Inputs live inside `Show` blocks, so closing a dialog drops whatever was
//! typed into it.

use leptos::*;

use super::{on_backdrop, PageState};
use crate::controllers::{PinAction, PinDialog, PinManager};
use crate::FolderRow;

fn value_of(node: NodeRef<html::Input>) -> String {
    node.get_untracked().map(|input| input.value()).unwrap_or_default()
}

#[component]
pub fn PinDialogs() -> impl IntoView {
    let state = expect_context::<PageState>();
    let first = create_node_ref::<html::Input>();
    let second = create_node_ref::<html::Input>();
    let current = create_node_ref::<html::Input>();

    let send = move |action: PinAction| state.submit_pin(action);
    let cancel = move || state.cancel_pin();

    let on_submit = move |_| {
        let action = state.pins.with_untracked(|p| p.main_action(value_of(first), value_of(second)));
        if let Some(action) = action {
            send(action);
        }
    };

    let on_remove_confirm = move |_| {
        send(PinAction::Remove {
            current: value_of(current),
        });
    };

    let text = move || state.pins.with(|p| p.dialog_text());
    let error = move |dialog: PinDialog| move || state.pins.with(|p| p.error(dialog).map(str::to_string));
    let busy = move || state.pins.with(|p| p.in_flight());

    view! {
        <Show when=move || state.pins.with(|p| p.is_open(PinDialog::Main)) fallback=|| view! {}>
            <div
                class="modal is-open"
                on:click=move |ev| {
                    if on_backdrop(&ev) {
                        cancel();
                    }
                }
            >
                <div class="modal-dialog" role="dialog" aria-modal="true">
                    <h2 class="modal-title">{move || text().title}</h2>
                    <p class="modal-desc">{move || text().description}</p>
                    <Show when=move || text().show_remove fallback=|| view! {}>
                        <button
                            type="button"
                            class="btn-danger"
                            on:click=move |_| {
                                state.pins.update(|p| {
                                    p.open_remove();
                                });
                            }
                        >
                            "Remove PIN"
                        </button>
                    </Show>
                    <input type="password" autocomplete="off" node_ref=first placeholder=move || text().first_placeholder/>
                    <input type="password" autocomplete="off" node_ref=second placeholder=move || text().second_placeholder/>
                    <div class="modal-error">{error(PinDialog::Main)}</div>
                    <div class="modal-actions">
                        <button type="button" class="btn-secondary" on:click=move |_| cancel()>"Cancel"</button>
                        <button type="button" class="btn-primary" disabled=busy on:click=on_submit>
                            {move || text().submit_label}
                        </button>
                    </div>
                </div>
            </div>
        </Show>

        <Show when=move || state.pins.with(|p| p.is_open(PinDialog::Remove)) fallback=|| view! {}>
            <div
                class="modal modal-stacked is-open"
                on:click=move |ev| {
                    if on_backdrop(&ev) {
                        state.pins.update(PinManager::close_remove);
                    }
                }
            >
                <div class="modal-dialog" role="dialog" aria-modal="true">
                    <h2 class="modal-title">"Remove PIN"</h2>
                    <p class="modal-desc">"Enter your current PIN to remove protection from this folder."</p>
                    <input type="password" autocomplete="off" node_ref=current placeholder="Current PIN"/>
                    <div class="modal-error">{error(PinDialog::Remove)}</div>
                    <div class="modal-actions">
                        <button
                            type="button"
                            class="btn-secondary"
                            on:click=move |_| state.pins.update(PinManager::close_remove)
                        >
                            "Cancel"
                        </button>
                        <button type="button" class="btn-danger" disabled=busy on:click=on_remove_confirm>
                            "Remove PIN"
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}

/// One PIN menu button per folder listed on the page.
#[component]
pub fn FolderMenus(folders: Vec<FolderRow>) -> impl IntoView {
    let state = expect_context::<PageState>();

    folders
        .into_iter()
        .map(|row| {
            let label = if row.has_pin { "Change PIN" } else { "Set PIN" };
            let title = format!("PIN for {}", row.folder);
            view! {
                <button
                    type="button"
                    class="js-pin-menu"
                    title=title
                    on:click=move |_| {
                        state.pins.update(|p| p.open_manage(row.folder.clone(), row.has_pin));
                    }
                >
                    {label}
                </button>
            }
        })
        .collect_view()
}
