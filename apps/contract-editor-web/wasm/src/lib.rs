//! WASM bindings for the contract editor
//!
//! The editor state lives in Rust: template, capsule catalog, the last form
//! and selection the host pushed, and the live edit surface. JavaScript
//! forwards DOM events on the placeholder elements and owns persistence.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { EditorSession, formatPrice } from './pkg/contract_editor_wasm.js';
//!
//! await init();
//!
//! const session = new EditorSession(JSON.stringify(template), JSON.stringify(capsules));
//! session.setFormChangeCallback((form) => { state.form = form; autoSave(form); });
//! session.setCapsuleSelectionCallback((ids) => { state.selected = ids; });
//! session.mount(document.getElementById('contract'));
//! session.update(JSON.stringify(state.form), JSON.stringify(state.selected));
//!
//! container.addEventListener('focusin', (e) => session.focusField(idx(e), e.target.textContent));
//! container.addEventListener('input', (e) => session.inputField(idx(e), e.target.textContent));
//! container.addEventListener('focusout', (e) => session.blurField(idx(e), e.target.textContent));
//!
//! priceLabel.textContent = formatPrice(session.totalPrice());
//! ```

pub mod dom;
pub mod session;

use wasm_bindgen::prelude::*;

pub use session::EditorSession;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Contract editor WASM initialized".into());
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Format a price as whole reais with dot thousands separators: `R$ 12.000`
#[wasm_bindgen(js_name = formatPrice)]
pub fn format_price(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-R$ {}", grouped)
    } else {
        format!("R$ {}", grouped)
    }
}

/// Placeholder names found in a template, for hosts without a variable list
#[wasm_bindgen(js_name = extractVariables)]
pub fn extract_variables(template: &str) -> Result<JsValue, JsValue> {
    let names = contract_editor_core::extract_variables(template);
    serde_wasm_bindgen::to_value(&names)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
