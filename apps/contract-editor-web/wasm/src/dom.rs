//! Direct mutation of the mounted editor container
//!
//! The container's HTML is replaced only on a structural rebuild. Everything
//! else goes through `apply_patch`, which touches one existing element.

use contract_editor_core::DomPatch;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// CSS selector for the placeholder element with the given index
pub fn field_selector(index_attribute: &str, index: usize) -> String {
    format!("[{}=\"{}\"]", index_attribute, index)
}

/// Replace the container's content with freshly rendered HTML
pub fn replace_content(container: &Element, html: &str) {
    container.set_inner_html(html);
}

/// Apply a patch to its element. A missing element is not an error: the
/// host may have unmounted or replaced the container.
pub fn apply_patch(
    container: &Element,
    index_attribute: &str,
    patch: &DomPatch,
) -> Result<(), JsValue> {
    let selector = field_selector(index_attribute, patch.index);
    let Some(element) = container.query_selector(&selector)? else {
        web_sys::console::warn_1(&format!("No element for {}", selector).into());
        return Ok(());
    };

    element.set_class_name(&patch.class_name);
    if let Some(text) = &patch.text {
        element.set_text_content(Some(text));
    }
    Ok(())
}
