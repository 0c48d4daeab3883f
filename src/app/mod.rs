use crate::pages::{CanvasPage, NotePage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();
    state.start();
    provide_context(AppContext(state));

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("note/:id") view=NotePage />
                <Route path=path!("") view=CanvasPage />
            </Routes>
        </Router>
    }
}
