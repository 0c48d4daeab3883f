use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::tw_merge;

clx! {Tooltip, div, "inline-block relative whitespace-nowrap group/tooltip"}

/// Hover label shown above its [`Tooltip`] parent.
#[component]
pub fn TooltipContent(#[prop(into, optional)] class: String, children: Children) -> impl IntoView {
    let tooltip_class = tw_merge!(
        "absolute left-1/2 bottom-full mb-1 -translate-x-1/2 opacity-0 transition-opacity duration-300 pointer-events-none group-hover/tooltip:opacity-100 z-50",
        "py-1 px-2 rounded text-xs whitespace-nowrap shadow-lg text-background bg-foreground/90",
        class,
    );

    view! {
        <div data-name="TooltipContent" role="tooltip" class=tooltip_class>
            {children()}
        </div>
    }
}
