//! Browser binding: measures the DOM, wires scroll/resize/frame events into
//! a [`scrolly_core::Stage`] and applies the commands it emits.

pub mod style;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod hotspots;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod scroll_stage;

#[cfg(target_arch = "wasm32")]
pub use hotspots::HotspotLayer;
#[cfg(target_arch = "wasm32")]
pub use scroll_stage::ScrollStage;

use scrolly_core::ScrollyConfig;

/// Parse an optional JSON config; absent or blank input means defaults.
pub fn load_config(json: Option<&str>) -> scrolly_core::Result<ScrollyConfig> {
    match json.map(str::trim) {
        None | Some("") => Ok(ScrollyConfig::default()),
        Some(json) => Ok(ScrollyConfig::from_json(json)?),
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(err: impl std::fmt::Display) -> wasm_bindgen::JsValue {
    wasm_bindgen::JsError::new(&err.to_string()).into()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init("info");
}

/// Raise or lower log verbosity, e.g. `setLogFilter("scrolly_core=debug")`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(js_name = setLogFilter)]
pub fn set_log_filter(directives: &str) {
    logging::set_filter(directives);
}
