mod card;

pub use card::{MentionText, NoteCard, UserInfo};

use crate::components::ui::{Button, Modal, Spinner, StatusAlert};
use crate::drag::{CanvasRect, DragMachine, PointerKind};
use crate::editor::CardEditor;
use crate::models::{Note, Point, User};
use crate::state::AppContext;
use card::{display_title, style_css, CardPress};
use icons::Plus;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::params::Params;
use tracing::{debug, warn};

pub(crate) const MSG_NOTE_LOAD_FAILED: &str = "Error loading note.";

fn canvas_rect(el: &web_sys::HtmlDivElement) -> CanvasRect {
    let r = el.get_bounding_client_rect();
    CanvasRect {
        left: r.left(),
        top: r.top(),
        width: r.width(),
        height: r.height(),
    }
}

fn mouse_point(ev: &web_sys::MouseEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

fn touch_point(ev: &web_sys::TouchEvent) -> Option<Point> {
    let t = ev.touches().get(0)?;
    Some(Point::new(f64::from(t.client_x()), f64::from(t.client_y())))
}

/// Open the user-info modal for `@username`, if that user is known.
fn mention_opener(viewing_user: RwSignal<Option<User>>) -> Callback<String> {
    let app_state = expect_context::<AppContext>();
    Callback::new(move |username: String| {
        match app_state.0.users.find_by_username(&username) {
            Some(user) => viewing_user.set(Some(user)),
            None => debug!(%username, "mention does not match a known user"),
        }
    })
}

#[component]
fn UserInfoModal(viewing_user: RwSignal<Option<User>>) -> impl IntoView {
    view! {
        <Modal
            open=Signal::derive(move || viewing_user.get().is_some())
            on_close=Callback::new(move |_| viewing_user.set(None))
        >
            {move || viewing_user.get().map(|user| view! { <UserInfo user=user /> })}
        </Modal>
    }
}

/// The board: every live note as a draggable card.
#[component]
pub fn CanvasPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let canvas_ref: NodeRef<html::Div> = NodeRef::new();
    let drag = StoredValue::new(DragMachine::default());
    let editing: RwSignal<Option<Note>> = RwSignal::new(None);
    let viewing_user: RwSignal<Option<User>> = RwSignal::new(None);
    let creating = RwSignal::new(false);

    let current_rect = move || canvas_ref.get_untracked().map(|el| canvas_rect(&el));

    let on_press = Callback::new(move |press: CardPress| {
        let Some(rect) = current_rect() else {
            return;
        };
        drag.update_value(|d| {
            d.pointer_down(press.note_id, press.note_pos, press.client, &rect, press.pointer)
        });
    });

    let notes = app_state.0.notes.clone();
    let drag_to = Callback::new(move |(client, pointer): (Point, PointerKind)| {
        let Some(rect) = current_rect() else {
            return;
        };
        if let Some(mv) = drag.with_value(|d| d.pointer_move(client, &rect, pointer)) {
            notes.move_local(mv.note_id, mv.position);
        }
    });

    let notes = app_state.0.notes.clone();
    let release = Callback::new(move |()| {
        let Some(id) = drag.try_update_value(|d| d.pointer_up()).flatten() else {
            return;
        };
        let notes = notes.clone();
        spawn_local(async move {
            notes.commit_position(id).await;
        });
    });

    let on_edit = Callback::new(move |note: Note| editing.set(Some(note)));

    let notes = app_state.0.notes.clone();
    let on_delete = Callback::new(move |note: Note| {
        drag.update_value(|d| {
            d.cancel_if(note.id);
        });
        if editing.get_untracked().is_some_and(|n| n.id == note.id) {
            editing.set(None);
        }
        let notes = notes.clone();
        spawn_local(async move {
            notes.delete(&note).await;
        });
    });

    let on_mention = mention_opener(viewing_user);

    let notes = app_state.0.notes.clone();
    let on_add = move |_| {
        if creating.get_untracked() {
            return;
        }
        creating.set(true);
        let notes = notes.clone();
        spawn_local(async move {
            notes.create().await;
            creating.set(false);
        });
    };

    let ids = {
        let app_state = app_state.clone();
        Memo::new(move |_| {
            app_state
                .0
                .notes_tracked()
                .into_iter()
                .map(|n| n.id)
                .collect::<Vec<_>>()
        })
    };

    let status = app_state.0.status;

    view! {
        <div class="flex h-screen flex-col" data-name="CanvasPage">
            <div class="flex items-center gap-2 p-4">
                <Button on:click=on_add attr:disabled=move || creating.get()>
                    <Plus />
                    "Add Note"
                </Button>
                <Show when=move || creating.get()>
                    <Spinner />
                </Show>
            </div>

            <div
                node_ref=canvas_ref
                data-name="Canvas"
                class="relative flex-1 overflow-hidden touch-none bg-gray-100"
                on:mousemove=move |ev: web_sys::MouseEvent| drag_to.run((mouse_point(&ev), PointerKind::Mouse))
                on:mouseup=move |_| release.run(())
                on:mouseleave=move |_| release.run(())
                on:touchmove=move |ev: web_sys::TouchEvent| {
                    if let Some(p) = touch_point(&ev) {
                        ev.prevent_default();
                        drag_to.run((p, PointerKind::Touch));
                    }
                }
                on:touchend=move |_| release.run(())
                on:touchcancel=move |_| release.run(())
            >
                {move || {
                    status
                        .get()
                        .map(|msg| view! { <StatusAlert kind=msg.kind>{msg.text}</StatusAlert> })
                }}

                <For each=move || ids.get() key=|id| *id let:id>
                    <NoteCard
                        note_id=id
                        on_press=on_press
                        on_edit=on_edit
                        on_delete=on_delete
                        on_mention=on_mention
                    />
                </For>
            </div>

            <Modal
                open=Signal::derive(move || editing.get().is_some())
                on_close=Callback::new(move |_| editing.set(None))
            >
                {move || {
                    editing
                        .get()
                        .map(|note| {
                            view! {
                                <CardEditor
                                    note=note
                                    on_close=Callback::new(move |_| editing.set(None))
                                />
                            }
                        })
                }}
            </Modal>

            <UserInfoModal viewing_user=viewing_user />
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum NoteView {
    Loading,
    Failed,
    Loaded(Note),
}

/// Read-only view of a single note, fetched fresh from the store.
#[component]
pub fn NotePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = leptos_router::hooks::use_params::<NoteRouteParams>();

    let note_id = move || {
        params
            .get()
            .ok()
            .and_then(|p| p.id)
            .and_then(|id| id.trim().parse::<i64>().ok())
    };

    let view_state = RwSignal::new(NoteView::Loading);
    let req_id: RwSignal<u64> = RwSignal::new(0);
    let viewing_user: RwSignal<Option<User>> = RwSignal::new(None);

    let notes = app_state.0.notes.clone();
    Effect::new(move |_| {
        let id = note_id();
        req_id.update(|v| *v += 1);
        let my_req = req_id.get_untracked();
        view_state.set(NoteView::Loading);

        let Some(id) = id else {
            warn!("note route without a numeric id");
            view_state.set(NoteView::Failed);
            return;
        };

        let notes = notes.clone();
        spawn_local(async move {
            let result = notes.fetch_one(id).await;
            // Ignore stale responses.
            if req_id.get_untracked() != my_req {
                return;
            }
            match result {
                Ok(note) => view_state.set(NoteView::Loaded(note)),
                Err(e) => {
                    warn!(id, error = %e, "failed to load note");
                    view_state.set(NoteView::Failed);
                }
            }
        });
    });

    let on_mention = mention_opener(viewing_user);

    view! {
        <div class="mx-auto max-w-2xl p-6" data-name="NotePage">
            {move || match view_state.get() {
                NoteView::Loading => view! {
                    <div class="flex items-center gap-2 text-muted-foreground">
                        <Spinner />
                        "Loading..."
                    </div>
                }
                .into_any(),
                NoteView::Failed => view! {
                    <div class="text-red-500">{MSG_NOTE_LOAD_FAILED}</div>
                }
                .into_any(),
                NoteView::Loaded(note) => {
                    let title = display_title(&note.title).to_string();
                    let text_style = style_css(&note.styles);
                    let align = format!("text-align: {};", note.styles.alignment.as_css());
                    view! {
                        <article class="flex flex-col gap-3">
                            <h1 class="text-2xl font-bold">{title}</h1>
                            <p class="text-sm text-muted-foreground">
                                {format!("Last Updated: {}", note.date)}
                            </p>
                            <div class="whitespace-pre-wrap break-words" style=align>
                                <span style=text_style>
                                    <MentionText text=note.content on_mention=on_mention />
                                </span>
                            </div>
                        </article>
                    }
                    .into_any()
                }
            }}
            <a href="/" class="mt-6 inline-block text-blue-500 hover:underline">
                "Back to Canvas"
            </a>
            <UserInfoModal viewing_user=viewing_user />
        </div>
    }
}
