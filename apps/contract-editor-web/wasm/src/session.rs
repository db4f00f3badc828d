//! Stateful editor session
//!
//! Holds the template and capsule catalog for one editing session, mirrors
//! the form and selection the host last pushed, and drives the edit surface.
//! Commits update the mirror before the host callback fires, so a rebuild
//! that follows a blur always reads the committed value.

use contract_editor_core::{
    Capsule, CapsuleSelection, ContractTemplate, DomPatch, EditSurface, EditorConfig,
    EditorError, EditorHost, FormData, Summary, SyncOutcome,
};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom;

#[derive(Default)]
struct Callbacks {
    on_form_change: Option<js_sys::Function>,
    on_capsule_selection_change: Option<js_sys::Function>,
}

/// Host adapter: keeps the session mirror current and forwards to JS
struct SessionHost<'a> {
    form: &'a mut FormData,
    selection: &'a mut CapsuleSelection,
    callbacks: &'a Callbacks,
}

impl SessionHost<'_> {
    fn notify<T: serde::Serialize>(callback: Option<&js_sys::Function>, value: &T) {
        let Some(callback) = callback else {
            return;
        };
        let result = serde_wasm_bindgen::to_value(value)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
            .and_then(|arg| callback.call1(&JsValue::NULL, &arg));
        if let Err(e) = result {
            web_sys::console::error_2(&"Editor callback failed:".into(), &e);
        }
    }
}

impl EditorHost for SessionHost<'_> {
    fn on_form_change(&mut self, next: FormData) {
        *self.form = next;
        Self::notify(self.callbacks.on_form_change.as_ref(), &*self.form);
    }

    fn on_capsule_selection_change(&mut self, next: CapsuleSelection) {
        *self.selection = next;
        Self::notify(
            self.callbacks.on_capsule_selection_change.as_ref(),
            &*self.selection,
        );
    }
}

/// Editing session for one contract
#[wasm_bindgen]
pub struct EditorSession {
    template: ContractTemplate,
    capsules: Vec<Capsule>,
    form: FormData,
    selection: CapsuleSelection,
    surface: EditSurface,
    container: Option<Element>,
    callbacks: Callbacks,
}

#[wasm_bindgen]
impl EditorSession {
    /// Create a session from the template and capsule catalog JSON
    #[wasm_bindgen(constructor)]
    pub fn new(template_json: &str, capsules_json: &str) -> Result<EditorSession, JsValue> {
        Self::new_internal(template_json, capsules_json, EditorConfig::default()).map_err(to_js)
    }

    /// Create a session with a custom editor configuration
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(
        template_json: &str,
        capsules_json: &str,
        config_json: &str,
    ) -> Result<EditorSession, JsValue> {
        let config = EditorConfig::from_json(config_json).map_err(to_js)?;
        Self::new_internal(template_json, capsules_json, config).map_err(to_js)
    }

    /// Callback signature: (form: Record<string, string>) => void
    #[wasm_bindgen(js_name = setFormChangeCallback)]
    pub fn set_form_change_callback(&mut self, callback: js_sys::Function) {
        self.callbacks.on_form_change = Some(callback);
    }

    /// Callback signature: (selectedIds: number[]) => void
    #[wasm_bindgen(js_name = setCapsuleSelectionCallback)]
    pub fn set_capsule_selection_callback(&mut self, callback: js_sys::Function) {
        self.callbacks.on_capsule_selection_change = Some(callback);
    }

    /// Attach the container element and render into it
    pub fn mount(&mut self, container: Element) -> Result<(), JsValue> {
        if let Some(html) = self.surface.html() {
            dom::replace_content(&container, html);
        }
        self.container = Some(container);
        self.resync()
    }

    /// Push the host's current form and selection.
    /// Returns "rebuilt", "retained" or "empty".
    pub fn update(&mut self, form_json: &str, selection_json: &str) -> Result<String, JsValue> {
        let outcome = self
            .update_internal(form_json, selection_json)
            .map_err(to_js)?;
        self.render_outcome(&outcome);
        Ok(outcome_name(&outcome).to_string())
    }

    /// `focusin` on a placeholder; returns the applied patches as JSON
    #[wasm_bindgen(js_name = focusField)]
    pub fn focus_field(&mut self, index: usize, current_text: &str) -> Result<String, JsValue> {
        let patches = self.surface.focus(index, current_text).map_err(to_js)?;
        self.apply(&patches)
    }

    /// `input` inside the placeholder being edited
    #[wasm_bindgen(js_name = inputField)]
    pub fn input_field(&mut self, index: usize, current_text: &str) -> Result<String, JsValue> {
        let patch = self.surface.input(index, current_text).map_err(to_js)?;
        self.apply(&[patch])
    }

    /// `focusout` on the placeholder being edited: commits the value
    #[wasm_bindgen(js_name = blurField)]
    pub fn blur_field(&mut self, index: usize, current_text: &str) -> Result<String, JsValue> {
        let patches = self.blur_internal(index, current_text).map_err(to_js)?;
        self.apply(&patches)
    }

    /// Capsule checkbox `change`; returns the next selected ids
    #[wasm_bindgen(js_name = toggleCapsule)]
    pub fn toggle_capsule(&mut self, id: u32) -> Result<Vec<u32>, JsValue> {
        let outcome = self.toggle_internal(id).map_err(to_js)?;
        self.render_outcome(&outcome);
        Ok(self.selection.ids().to_vec())
    }

    /// Current rendered HTML (empty when there is no content)
    #[wasm_bindgen(js_name = renderedHtml)]
    pub fn rendered_html(&self) -> String {
        self.surface.html().unwrap_or_default().to_string()
    }

    #[wasm_bindgen(getter, js_name = hasContent)]
    pub fn has_content(&self) -> bool {
        self.surface.html().is_some()
    }

    #[wasm_bindgen(js_name = totalPrice)]
    pub fn total_price(&self) -> f64 {
        contract_editor_core::total_price(self.template.base_price, &self.capsules, &self.selection)
    }

    #[wasm_bindgen(js_name = completionPercentage)]
    pub fn completion_percentage(&self) -> u8 {
        contract_editor_core::completion_percentage(&self.template.variables, &self.form)
    }

    /// Price, completion and missing fields as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.summary())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Variable currently being edited, if any
    #[wasm_bindgen(getter, js_name = activeField)]
    pub fn active_field(&self) -> Option<String> {
        self.surface.active_field().map(str::to_string)
    }
}

impl EditorSession {
    fn new_internal(
        template_json: &str,
        capsules_json: &str,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let template: ContractTemplate = serde_json::from_str(template_json)?;
        let capsules: Vec<Capsule> = serde_json::from_str(capsules_json)?;
        let mut session = Self {
            template,
            capsules,
            form: FormData::new(),
            selection: CapsuleSelection::new(),
            surface: EditSurface::new(config),
            container: None,
            callbacks: Callbacks::default(),
        };
        session.sync()?;
        Ok(session)
    }

    fn sync(&mut self) -> Result<SyncOutcome, EditorError> {
        self.surface
            .sync(&self.template, &self.capsules, &self.selection, &self.form)
    }

    fn resync(&mut self) -> Result<(), JsValue> {
        let outcome = self.sync().map_err(to_js)?;
        self.render_outcome(&outcome);
        Ok(())
    }

    /// Nothing is stored unless the surface accepts the new state, so a
    /// refused rebuild leaves form, selection and price as they were.
    fn update_internal(
        &mut self,
        form_json: &str,
        selection_json: &str,
    ) -> Result<SyncOutcome, EditorError> {
        let form: FormData = serde_json::from_str(form_json)?;
        let ids: Vec<u32> = serde_json::from_str(selection_json)?;
        let selection = CapsuleSelection::from(ids);

        let outcome = self
            .surface
            .sync(&self.template, &self.capsules, &selection, &form)?;
        self.form = form;
        self.selection = selection;
        Ok(outcome)
    }

    fn blur_internal(
        &mut self,
        index: usize,
        current_text: &str,
    ) -> Result<Vec<DomPatch>, EditorError> {
        let current = self.form.clone();
        let mut host = SessionHost {
            form: &mut self.form,
            selection: &mut self.selection,
            callbacks: &self.callbacks,
        };
        self.surface.blur(index, current_text, &current, &mut host)
    }

    fn toggle_internal(&mut self, id: u32) -> Result<SyncOutcome, EditorError> {
        let current = self.selection.clone();
        let mut host = SessionHost {
            form: &mut self.form,
            selection: &mut self.selection,
            callbacks: &self.callbacks,
        };
        self.surface.toggle_capsule(&current, id, &mut host)?;
        self.sync()
    }

    fn summary(&self) -> Summary {
        Summary::compute(&self.template, &self.capsules, &self.selection, &self.form)
    }

    fn render_outcome(&self, outcome: &SyncOutcome) {
        let Some(container) = &self.container else {
            return;
        };
        match outcome {
            SyncOutcome::Rebuilt { html } => {
                dom::replace_content(container, html);
                web_sys::console::log_1(
                    &format!("Contract surface rebuilt ({} fields)", self.surface.fields().len())
                        .into(),
                );
            }
            SyncOutcome::NoContent => dom::replace_content(container, ""),
            SyncOutcome::Retained => {}
        }
    }

    fn apply(&self, patches: &[DomPatch]) -> Result<String, JsValue> {
        if let Some(container) = &self.container {
            let attribute = &self.surface.config().index_attribute;
            for patch in patches {
                dom::apply_patch(container, attribute, patch)?;
            }
        }
        serde_json::to_string(patches)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn outcome_name(outcome: &SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Rebuilt { .. } => "rebuilt",
        SyncOutcome::Retained => "retained",
        SyncOutcome::NoContent => "empty",
    }
}

fn to_js(e: EditorError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
