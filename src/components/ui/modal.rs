use icons::X;
use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::tw_merge;

mod components {
    use super::*;
    clx! {ModalBody, div, "flex flex-col gap-4"}
    clx! {ModalHeader, div, "flex flex-col gap-2 text-center sm:text-left"}
    clx! {ModalTitle, h3, "text-lg leading-none font-semibold"}
}

pub use components::*;

/// Centered panel over a dimmed backdrop, shown while `open` is true.
///
/// Clicking the backdrop or the close button calls `on_close`; the caller owns
/// the open state.
#[component]
pub fn Modal(
    #[prop(into)] open: Signal<bool>,
    on_close: Callback<()>,
    #[prop(optional, into)] class: String,
    children: ChildrenFn,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "relative bg-background border rounded-2xl shadow-lg p-6 w-full max-w-[calc(100%-2rem)] sm:max-w-lg max-h-[85vh] overflow-y-auto fixed top-[50%] left-[50%] translate-x-[-50%] translate-y-[-50%] z-[100]",
        class
    );
    let children = StoredValue::new(children);

    view! {
        <Show when=move || open.get()>
            <div
                data-name="ModalBackdrop"
                class="fixed inset-0 z-[60] bg-black/50"
                on:click=move |_| on_close.run(())
            />
            <div data-name="ModalContent" role="dialog" aria-modal="true" class=merged_class.clone()>
                <button
                    type="button"
                    class="absolute top-4 right-4 p-1 rounded-sm focus:ring-2 focus:ring-offset-2 focus:outline-none focus:ring-ring [&_svg:not([class*='size-'])]:size-4"
                    aria-label="Close dialog"
                    on:click=move |_| on_close.run(())
                >
                    <X />
                </button>
                {children.with_value(|c| c())}
            </div>
        </Show>
    }
}
