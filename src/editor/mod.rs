pub(crate) mod inline;
pub(crate) mod session;

use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::models::{Alignment, Note, NoteStyles, StyleChange, User};
use crate::state::notes::UpdateOptions;
use crate::state::AppContext;
use crate::util::{byte_idx_to_utf16, utf16_to_byte_idx};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use session::{EditorKeyOutcome, EditorSession, NoteDraft};

/// Caret of a textarea as a byte index into `value`.
fn caret_byte(el: &web_sys::HtmlTextAreaElement, value: &str) -> usize {
    caret_to_byte(value, el.selection_start().ok().flatten())
}

/// UTF-16 caret to byte index; no caret means the end of `value`.
fn caret_to_byte(value: &str, caret_utf16: Option<u32>) -> usize {
    let caret = caret_utf16
        .unwrap_or_else(|| u32::try_from(value.encode_utf16().count()).unwrap_or(u32::MAX));
    utf16_to_byte_idx(value, caret)
}

/// Modal editor for one note: title, content with `@mention` autocomplete,
/// and whole-note formatting.
#[component]
pub fn CardEditor(note: Note, on_close: Callback<()>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let note_id = note.id;

    let title = RwSignal::new(note.title.clone());
    let content = RwSignal::new(note.content.clone());
    let styles = RwSignal::new(note.styles);
    let results: RwSignal<Vec<User>> = RwSignal::new(vec![]);
    let selected: RwSignal<Option<usize>> = RwSignal::new(None);
    let saving = RwSignal::new(false);

    let textarea_ref: NodeRef<html::Textarea> = NodeRef::new();

    let on_save = {
        let notes = app_state.0.notes.clone();
        move |draft: NoteDraft| {
            saving.set(false);
            // Position may have moved since the editor opened; start from the live copy.
            let Some(current) = notes.get(note_id) else {
                return;
            };
            let updated = draft.apply_to(&current);
            let notes = notes.clone();
            spawn_local(async move {
                notes.update(updated, UpdateOptions::default()).await;
            });
        }
    };

    let session = StoredValue::new(EditorSession::new(
        &note,
        app_state.0.timer.clone(),
        StdRng::from_entropy(),
        on_save,
    ));

    let sync_view = move || {
        // The session is gone once the editor has been closed from a key handler.
        session.try_with_value(|s| {
            results.set(s.mention_results().to_vec());
            selected.set(s.selected_mention());
            saving.set(s.is_saving());
        });
    };

    let place_caret = move |value: &str, cursor: usize| {
        if let Some(el) = textarea_ref.get_untracked() {
            el.set_value(value);
            let pos = byte_idx_to_utf16(value, cursor);
            let _ = el.set_selection_range(pos, pos);
            let _ = el.focus();
        }
    };

    on_cleanup(move || {
        session.try_update_value(|s| s.close());
    });

    let users = app_state.0.users.clone();
    let on_content_input = move |ev: web_sys::Event| {
        let value = event_target_value(&ev);
        let caret = textarea_ref
            .get_untracked()
            .map(|el| caret_byte(&el, &value))
            .unwrap_or(value.len());
        let directory = users.users();
        session.update_value(|s| s.set_content(&directory, value.clone(), caret));
        content.set(value);
        sync_view();
    };

    let on_content_keydown = move |ev: web_sys::KeyboardEvent| {
        let Some(el) = textarea_ref.get_untracked() else {
            return;
        };
        let value = el.value();
        let caret = caret_byte(&el, &value);
        let key = ev.key();

        let outcome = session
            .try_update_value(|s| s.key_down(&key, caret))
            .unwrap_or(EditorKeyOutcome::Ignored);

        match outcome {
            EditorKeyOutcome::Ignored => {}
            EditorKeyOutcome::Handled => ev.prevent_default(),
            EditorKeyOutcome::Inserted { cursor } => {
                ev.prevent_default();
                let next = session.with_value(|s| s.draft().content);
                place_caret(&next, cursor);
                content.set(next);
            }
            EditorKeyOutcome::Close => {
                ev.prevent_default();
                on_close.run(());
            }
        }
        sync_view();
    };

    let on_pick_mention = Callback::new(move |username: String| {
        let caret = textarea_ref
            .get_untracked()
            .map(|el| caret_byte(&el, &el.value()))
            .unwrap_or_else(|| content.get_untracked().len());
        let Some(cursor) = session.try_update_value(|s| s.select_mention(&username, caret)) else {
            return;
        };
        let next = session.with_value(|s| s.draft().content);
        place_caret(&next, cursor);
        content.set(next);
        sync_view();
    });

    let on_style_change = Callback::new(move |change: StyleChange| {
        session.update_value(|s| s.set_style(change));
        styles.update(|st| st.apply(change));
        sync_view();
    });

    let on_blur = move |_| {
        session.update_value(|s| s.blur());
        sync_view();
    };

    let content_class = move || {
        let st = styles.get();
        let mut class = String::from("w-full h-40 rounded-md border p-2 text-sm outline-none focus-visible:ring-2 focus-visible:ring-ring/50");
        if st.bold {
            class.push_str(" font-bold");
        }
        if st.italic {
            class.push_str(" italic");
        }
        if st.underline {
            class.push_str(" underline");
        }
        class
    };

    view! {
        <div class="flex flex-col gap-2" data-name="CardEditor">
            <input
                type="text"
                class="w-full border-b p-1 text-lg font-bold focus:outline-none"
                placeholder="Enter title..."
                prop:value=move || title.get()
                on:input=move |ev| {
                    let v = event_target_value(&ev);
                    session.update_value(|s| s.set_title(v.clone()));
                    title.set(v);
                    sync_view();
                }
                on:blur=on_blur
            />

            <FormattingToolbar styles=styles on_change=on_style_change />

            <div class="relative">
                <textarea
                    node_ref=textarea_ref
                    class=content_class
                    style=move || format!("text-align: {}", styles.get().alignment.as_css())
                    prop:value=move || content.get()
                    on:input=on_content_input
                    on:keydown=on_content_keydown
                    on:blur=on_blur
                />

                <Show when=move || !results.get().is_empty()>
                    <MentionsDropdown results=results selected=selected on_select=on_pick_mention />
                </Show>
            </div>

            <div class="text-sm text-blue-500">
                {move || if saving.get() { "saving..." } else { "saved" }}
            </div>
        </div>
    }
}

#[component]
fn ToolbarToggle(
    #[prop(into)] active: Signal<bool>,
    #[prop(into)] label: String,
    #[prop(into, optional)] class: String,
    on_press: Callback<()>,
) -> impl IntoView {
    move || {
        let variant = if active.get() {
            ButtonVariant::Pressed
        } else {
            ButtonVariant::Outline
        };
        let class = class.clone();
        let label = label.clone();
        view! {
            <Button
                variant=variant
                size=ButtonSize::Sm
                attr:aria-pressed=active.get().to_string()
                on:click=move |_| on_press.run(())
            >
                <span class=class>{label}</span>
            </Button>
        }
    }
}

#[component]
pub fn FormattingToolbar(
    #[prop(into)] styles: Signal<NoteStyles>,
    on_change: Callback<StyleChange>,
) -> impl IntoView {
    let align = move |alignment: Alignment, label: &'static str| {
        view! {
            <ToolbarToggle
                active=Signal::derive(move || styles.get().alignment == alignment)
                label=label
                on_press=Callback::new(move |_| on_change.run(StyleChange::Alignment(alignment)))
            />
        }
    };

    view! {
        <div class="flex flex-wrap items-center gap-1" data-name="FormattingToolbar">
            <ToolbarToggle
                active=Signal::derive(move || styles.get().bold)
                label="B"
                class="font-bold"
                on_press=Callback::new(move |_| {
                    on_change.run(StyleChange::Bold(!styles.get_untracked().bold))
                })
            />
            <ToolbarToggle
                active=Signal::derive(move || styles.get().italic)
                label="I"
                class="italic"
                on_press=Callback::new(move |_| {
                    on_change.run(StyleChange::Italic(!styles.get_untracked().italic))
                })
            />
            <ToolbarToggle
                active=Signal::derive(move || styles.get().underline)
                label="U"
                class="underline"
                on_press=Callback::new(move |_| {
                    on_change.run(StyleChange::Underline(!styles.get_untracked().underline))
                })
            />
            {align(Alignment::Left, "Left")}
            {align(Alignment::Center, "Center")}
            {align(Alignment::Right, "Right")}
        </div>
    }
}

#[component]
pub fn MentionsDropdown(
    #[prop(into)] results: Signal<Vec<User>>,
    #[prop(into)] selected: Signal<Option<usize>>,
    on_select: Callback<String>,
) -> impl IntoView {
    view! {
        <ul
            data-name="MentionsDropdown"
            role="listbox"
            class="absolute z-10 mt-1 min-w-40 rounded-md border bg-white shadow-md"
        >
            {move || {
                results
                    .get()
                    .into_iter()
                    .enumerate()
                    .map(|(i, user)| {
                        let active = selected.get() == Some(i);
                        let class = if active {
                            "cursor-pointer p-2 bg-blue-500 text-white"
                        } else {
                            "cursor-pointer p-2 hover:bg-gray-200"
                        };
                        let username = user.username.clone();
                        view! {
                            <li
                                role="option"
                                aria-selected=active.to_string()
                                class=class
                                // Keep focus in the textarea so its caret is still readable.
                                on:mousedown=move |ev: web_sys::MouseEvent| {
                                    ev.prevent_default();
                                    on_select.run(username.clone());
                                }
                            >
                                {format!("@{}", user.username)}
                            </li>
                        }
                    })
                    .collect_view()
            }}
        </ul>
    }
}
