use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, ModalBody, ModalHeader, ModalTitle, NoteCardActions,
    NoteCardBody, NoteCardFrame, NoteCardMeta, NoteCardTitle, NoteCardToast, Tooltip,
    TooltipContent,
};
use crate::editor::inline::InlineEdits;
use crate::drag::PointerKind;
use crate::mentions::{parse_mention_tokens, MentionToken};
use crate::models::{Note, NoteStyles, Point, User};
use crate::state::notes::{UpdateOptions, DEFAULT_TITLE};
use crate::state::status::STATUS_LIFETIME_MS;
use crate::state::AppContext;
use icons::{Copy, Pencil, Trash2};
use leptos::prelude::*;
use leptos::task::spawn_local;
use tracing::warn;

pub(crate) const MSG_COPIED: &str = "Copied to clipboard!";
pub(crate) const MSG_COPY_FAILED: &str = "Failed to copy!";

/// Pointer pressed on a card: which note, where it is, and where the pointer is.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CardPress {
    pub note_id: i64,
    pub note_pos: Point,
    pub client: Point,
    pub pointer: PointerKind,
}

pub(crate) fn style_css(styles: &NoteStyles) -> String {
    format!(
        "font-weight: {}; font-style: {}; text-decoration: {};",
        if styles.bold { "bold" } else { "normal" },
        if styles.italic { "italic" } else { "normal" },
        if styles.underline { "underline" } else { "none" },
    )
}

pub(crate) fn display_title(title: &str) -> &str {
    if title.is_empty() {
        DEFAULT_TITLE
    } else {
        title
    }
}

async fn copy_to_clipboard(text: &str) -> bool {
    let Some(win) = web_sys::window() else {
        return false;
    };
    let promise = win.navigator().clipboard().write_text(text);
    match wasm_bindgen_futures::JsFuture::from(promise).await {
        Ok(_) => true,
        Err(e) => {
            warn!(?e, "clipboard write failed");
            false
        }
    }
}

/// Text with `@username` mentions rendered as clickable links.
#[component]
pub fn MentionText(#[prop(into)] text: Signal<String>, on_mention: Callback<String>) -> impl IntoView {
    move || {
        parse_mention_tokens(&text.get())
            .into_iter()
            .map(|token| match token {
                MentionToken::Text(s) => view! { <span>{s}</span> }.into_any(),
                MentionToken::Mention(username) => {
                    let label = format!("@{username}");
                    view! {
                        <span
                            class="cursor-pointer text-blue-500"
                            on:mousedown=|ev: web_sys::MouseEvent| ev.stop_propagation()
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                on_mention.run(username.clone());
                            }
                        >
                            {label}
                        </span>
                    }
                    .into_any()
                }
            })
            .collect_view()
    }
}

#[component]
pub fn UserInfo(user: User) -> impl IntoView {
    view! {
        <ModalBody>
            <ModalHeader>
                <ModalTitle class="text-center">{format!("@{}", user.username)}</ModalTitle>
            </ModalHeader>
            <div class="space-y-2">
                <p class="text-lg">
                    <strong>{user.title.clone()}</strong>
                    {format!(" {} {}", user.first_name, user.last_name)}
                </p>
                <p><strong>"Gender: "</strong>{user.gender.clone()}</p>
                <p><strong>"Location: "</strong>{user.location.city.clone()}</p>
            </div>
        </ModalBody>
    }
}

/// One note on the canvas.
///
/// Title and content can be edited in place with a double click; both go
/// through a short debounce before they are written.
#[component]
pub fn NoteCard(
    note_id: i64,
    on_press: Callback<CardPress>,
    on_edit: Callback<Note>,
    on_delete: Callback<Note>,
    on_mention: Callback<String>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let note = {
        let app_state = app_state.clone();
        Memo::new(move |_| app_state.0.note_tracked(note_id))
    };

    let editing_title = RwSignal::new(false);
    let editing_content = RwSignal::new(false);
    let title_value = RwSignal::new(String::new());
    let content_value = RwSignal::new(String::new());
    let copy_message: RwSignal<Option<&'static str>> = RwSignal::new(None);
    let copy_generation = RwSignal::new(0u64);

    let edits = {
        let notes = app_state.0.notes.clone();
        let writer = notes.clone();
        StoredValue::new(InlineEdits::new(
            note_id,
            notes,
            app_state.0.timer.clone(),
            move |edited: Note| {
                let writer = writer.clone();
                spawn_local(async move {
                    writer.update(edited, UpdateOptions::default()).await;
                });
            },
        ))
    };
    on_cleanup(move || {
        edits.try_with_value(|e| e.flush());
    });

    let save_title = move |value: String| edits.with_value(|e| e.set_title(value));
    let save_content = move |value: String| edits.with_value(|e| e.set_content(value));

    let start_title_edit = move |_: web_sys::MouseEvent| {
        title_value.set(note.get_untracked().map(|n| n.title).unwrap_or_default());
        editing_title.set(true);
    };
    let start_content_edit = move |_: web_sys::MouseEvent| {
        content_value.set(note.get_untracked().map(|n| n.content).unwrap_or_default());
        editing_content.set(true);
    };

    let timer = StoredValue::new(app_state.0.timer.clone());
    let on_copy = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let Some(n) = note.get_untracked() else {
            return;
        };
        let timer = timer.get_value();
        spawn_local(async move {
            let ok = copy_to_clipboard(&n.content).await;
            // The card may be gone by the time the clipboard answers.
            if copy_message
                .try_set(Some(if ok { MSG_COPIED } else { MSG_COPY_FAILED }))
                .is_some()
            {
                return;
            }
            let Some(generation) = copy_generation.try_update(|g| {
                *g += 1;
                *g
            }) else {
                return;
            };
            timer.set_timeout(
                STATUS_LIFETIME_MS,
                Box::new(move || {
                    if copy_generation.try_get_untracked() == Some(generation) {
                        copy_message.try_set(None);
                    }
                }),
            );
        });
    };

    let press = move |client: Point, pointer: PointerKind| {
        if editing_title.get_untracked() || editing_content.get_untracked() {
            return;
        }
        if let Some(n) = note.get_untracked() {
            on_press.run(CardPress {
                note_id: n.id,
                note_pos: n.position(),
                client,
                pointer,
            });
        }
    };

    let stop = |ev: web_sys::MouseEvent| ev.stop_propagation();

    view! {
        <Show when=move || note.get().is_some()>
            <div
                data-name="NoteCard"
                class="absolute cursor-move select-none"
                style=move || {
                    let p = note.get().map(|n| n.position()).unwrap_or_default();
                    format!("left: {}px; top: {}px;", p.x, p.y)
                }
                on:mousedown=move |ev: web_sys::MouseEvent| {
                    press(
                        Point::new(f64::from(ev.client_x()), f64::from(ev.client_y())),
                        PointerKind::Mouse,
                    );
                }
                on:touchstart=move |ev: web_sys::TouchEvent| {
                    if let Some(t) = ev.touches().get(0) {
                        press(
                            Point::new(f64::from(t.client_x()), f64::from(t.client_y())),
                            PointerKind::Touch,
                        );
                    }
                }
            >
                <NoteCardFrame>
                    <Show
                        when=move || editing_title.get()
                        fallback=move || view! {
                            <NoteCardTitle on:dblclick=start_title_edit>
                                {move || note.get().map(|n| display_title(&n.title).to_string())}
                            </NoteCardTitle>
                        }
                    >
                        <input
                            class="mb-1 w-full border-b p-1 text-lg font-bold focus:outline-none"
                            prop:value=move || title_value.get()
                            autofocus
                            on:mousedown=stop
                            on:input=move |ev| title_value.set(event_target_value(&ev))
                            on:keydown=move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
                                "Enter" => {
                                    editing_title.set(false);
                                    save_title(title_value.get_untracked());
                                }
                                "Escape" => editing_title.set(false),
                                _ => {}
                            }
                            on:blur=move |_| {
                                if !editing_title.get_untracked() {
                                    return;
                                }
                                editing_title.set(false);
                                let v = title_value.get_untracked();
                                if note.get_untracked().is_some_and(|n| n.title != v) {
                                    save_title(v);
                                }
                            }
                        />
                    </Show>

                    <NoteCardMeta>
                        {move || format!("Last updated: {}", note.get().map(|n| n.date).unwrap_or_default())}
                    </NoteCardMeta>

                    <Show
                        when=move || editing_content.get()
                        fallback=move || view! {
                            <NoteCardBody
                                on:dblclick=start_content_edit
                                attr:style=move || {
                                    let align = note.get().map(|n| n.styles.alignment).unwrap_or_default();
                                    format!("text-align: {};", align.as_css())
                                }
                            >
                                <span style=move || note.get().map(|n| style_css(&n.styles)).unwrap_or_default()>
                                    <MentionText
                                        text=Signal::derive(move || note.get().map(|n| n.content).unwrap_or_default())
                                        on_mention=on_mention
                                    />
                                </span>
                            </NoteCardBody>
                        }
                    >
                        <textarea
                            class="mb-8 h-20 w-full border p-2 text-sm"
                            prop:value=move || content_value.get()
                            autofocus
                            on:mousedown=stop
                            on:input=move |ev| content_value.set(event_target_value(&ev))
                            on:keydown=move |ev: web_sys::KeyboardEvent| {
                                let key = ev.key();
                                if key == "Escape" {
                                    editing_content.set(false);
                                } else if key == "Enter" && !ev.shift_key() {
                                    ev.prevent_default();
                                    editing_content.set(false);
                                    let v = content_value.get_untracked();
                                    if note.get_untracked().is_some_and(|n| n.content != v) {
                                        save_content(v);
                                    }
                                }
                            }
                            on:blur=move |_| {
                                if !editing_content.get_untracked() {
                                    return;
                                }
                                editing_content.set(false);
                                let v = content_value.get_untracked();
                                if note.get_untracked().is_some_and(|n| n.content != v) {
                                    save_content(v);
                                }
                            }
                        />
                    </Show>

                    <NoteCardActions>
                        <div class="flex items-center gap-3">
                            <Tooltip>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Icon
                                    attr:aria-label="Edit Note"
                                    on:mousedown=stop
                                    on:click=move |ev: web_sys::MouseEvent| {
                                        ev.stop_propagation();
                                        if let Some(n) = note.get_untracked() {
                                            on_edit.run(n);
                                        }
                                    }
                                >
                                    <Pencil />
                                </Button>
                                <TooltipContent>"Edit Note"</TooltipContent>
                            </Tooltip>
                            <Tooltip>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Icon
                                    attr:aria-label="Copy Content"
                                    on:mousedown=stop
                                    on:click=on_copy.clone()
                                >
                                    <Copy />
                                </Button>
                                <TooltipContent>"Copy Content"</TooltipContent>
                            </Tooltip>
                        </div>
                        <Tooltip>
                            <Button
                                variant=ButtonVariant::Destructive
                                size=ButtonSize::Icon
                                attr:aria-label="Delete Note"
                                on:mousedown=stop
                                on:click=move |ev: web_sys::MouseEvent| {
                                    ev.stop_propagation();
                                    if let Some(n) = note.get_untracked() {
                                        on_delete.run(n);
                                    }
                                }
                            >
                                <Trash2 />
                            </Button>
                            <TooltipContent>"Delete Note"</TooltipContent>
                        </Tooltip>
                    </NoteCardActions>

                    <Show when=move || copy_message.get().is_some()>
                        <NoteCardToast>{move || copy_message.get().unwrap_or_default()}</NoteCardToast>
                    </Show>
                </NoteCardFrame>
                <a
                    href=format!("/note/{note_id}")
                    class="mt-2 block text-blue-500 hover:underline"
                    on:mousedown=stop
                >
                    "View Note"
                </a>
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Alignment;

    #[test]
    fn test_style_css() {
        let styles = NoteStyles {
            bold: true,
            italic: false,
            underline: true,
            alignment: Alignment::Center,
        };
        assert_eq!(
            style_css(&styles),
            "font-weight: bold; font-style: normal; text-decoration: underline;"
        );
        assert_eq!(
            style_css(&NoteStyles::default()),
            "font-weight: normal; font-style: normal; text-decoration: none;"
        );
    }

    #[test]
    fn test_display_title_falls_back_for_empty() {
        assert_eq!(display_title(""), DEFAULT_TITLE);
        assert_eq!(display_title("Groceries"), "Groceries");
    }
}
