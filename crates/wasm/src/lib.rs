use naview_core::NaviewConfig;
use wasm_bindgen::prelude::*;

/// Compute the layout of a dot-bracket structure and return it as JSON.
#[wasm_bindgen]
pub fn layout_json(structure: &str) -> String {
    naview_core::draw_structure(structure)
}

/// Layout with JSON options.
///
/// `opts_json` is parsed as `NaviewConfig` with `#[serde(default)]`,
/// so any omitted field uses the default value. Returns an empty string
/// when the structure or the resulting configuration is rejected.
#[wasm_bindgen]
pub fn layout_with_options(structure: &str, opts_json: &str) -> String {
    let config: NaviewConfig = serde_json::from_str(opts_json).unwrap_or_default();
    naview_core::layout_structure(structure, config)
        .ok()
        .and_then(|layout| serde_json::to_string(&layout).ok())
        .unwrap_or_default()
}
