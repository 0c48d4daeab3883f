use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {NoteCardFrame, div, "relative flex flex-col bg-white text-card-foreground rounded-lg border shadow-md p-4 w-80 min-h-[160px]"}
    clx! {NoteCardTitle, h2, "text-lg font-bold mb-1 cursor-pointer truncate"}
    clx! {NoteCardMeta, p, "text-xs text-muted-foreground mb-2"}
    clx! {NoteCardBody, div, "text-sm text-gray-700 mb-8 cursor-pointer whitespace-pre-wrap break-words"}
    clx! {NoteCardActions, div, "absolute bottom-2 left-4 right-4 flex items-center justify-between text-muted-foreground"}
    clx! {NoteCardToast, div, "absolute bottom-10 left-1/2 -translate-x-1/2 rounded bg-black px-3 py-1 text-xs text-white"}
}

pub use components::*;
