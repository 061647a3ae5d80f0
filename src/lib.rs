//! Terminal-styled landing page, compiled to WASM.
//!
//! The host page supplies the terminal markup and calls [`start_site`] once
//! the DOM is ready. From there the crate owns keyboard handling, the `game`
//! panel, the background rain and the touch adapter on phones.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod dom;
pub mod drag;
pub mod error;
pub mod focus;
pub mod logging;
pub mod mobile;
pub mod qr;
pub mod rain;
pub mod site;
pub mod snake;
pub mod terminal;

pub use config::SiteConfig;
pub use error::{SiteError, SiteResult};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(SiteConfig::default().log_filter());
}

// -----------------------------------------------------------------------------
// Exports
// -----------------------------------------------------------------------------

/// Wire the page up with default settings.
#[wasm_bindgen]
pub fn start_site() -> Result<(), JsValue> {
    launch(SiteConfig::default())
}

/// Like [`start_site`], with a (partial) JSON object of overrides.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_site_with_config(json: &str) -> Result<(), JsValue> {
    launch(SiteConfig::from_json(json)?)
}

fn launch(config: SiteConfig) -> Result<(), JsValue> {
    logging::init(config.log_filter());
    site::start(config).map_err(|err| {
        log::error!("start failed: {err}");
        JsValue::from(err)
    })
}

#[wasm_bindgen]
pub fn open_game() -> Result<(), JsValue> {
    Ok(site::open_game()?)
}

#[wasm_bindgen]
pub fn close_game() {
    site::close_game();
}

#[wasm_bindgen]
pub fn stop_site() {
    site::stop();
}
