use crate::state::status::StatusKind;
use leptos::prelude::*;
use tw_merge::tw_merge;

/// Floating status line at the top of the canvas.
#[component]
pub fn StatusAlert(
    kind: StatusKind,
    #[prop(into, optional)] class: String,
    children: Children,
) -> impl IntoView {
    let tone = match kind {
        StatusKind::Success => "bg-green-500 border-green-600",
        StatusKind::Error => "bg-red-500 border-red-600",
    };
    let merged_class = tw_merge!(
        "absolute top-2 left-1/2 -translate-x-1/2 z-50 rounded-lg border px-4 py-2 text-sm text-white shadow-md",
        tone,
        class,
    );

    view! {
        <div data-name="StatusAlert" role="status" aria-live="polite" class=merged_class>
            {children()}
        </div>
    }
}
