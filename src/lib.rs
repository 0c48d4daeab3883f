mod api;
mod app;
mod components;
mod debounce;
mod drag;
mod editor;
mod logging;
mod mentions;
mod models;
mod pages;
mod state;
mod timer;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    let env = api::EnvConfig::new();
    tracing::info!(notes = %env.notes_url, users = %env.users_url, "starting canvas notes");
    mount_to_body(app::App);
}
