//! Inline edit surface
//!
//! Keeps the rendered document alive across edits. The HTML is regenerated
//! only when the template or the capsule selection changes; typing, focus
//! and committed values are reflected by patching the existing placeholder
//! elements (`DomPatch`), so the browser keeps its cursor, undo stack and
//! IME state.
//!
//! Per placeholder:
//!
//! ```text
//!   idle-empty --focus--> editing --blur(blank)--> idle-empty
//!   idle-filled --focus--> editing --blur(text)--> idle-filled
//!                          editing --input--> editing (class only)
//! ```
//!
//! Only `blur` commits, and it hands the host the complete next form map.

use serde::{Deserialize, Serialize};
use shared_types::{Capsule, CapsuleSelection, ContractTemplate, FormData};
use tracing::{debug, trace, warn};

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::host::EditorHost;
use crate::render::{RenderInput, Rendered, TemplateRenderer};

/// Live state of one placeholder element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    pub index: usize,
    pub variable: String,
    pub label: String,
    /// Text currently displayed in the element
    pub text: String,
    /// Last committed value, empty while unfilled
    pub value: String,
    pub filled: bool,
    pub active: bool,
}

/// Direct mutation of one existing placeholder element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomPatch {
    pub index: usize,
    /// Full class attribute value
    pub class_name: String,
    /// Replacement text content; `None` leaves the element's text alone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// What `sync` did to the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Structure changed: the caller replaces the container's HTML
    Rebuilt { html: String },
    /// Nothing structural changed; the existing elements stay
    Retained,
    /// The template is empty: the caller shows its placeholder state
    NoContent,
}

/// The inputs whose change forces a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
struct StructureKey {
    template: String,
    selection: Vec<u32>,
}

impl StructureKey {
    fn new(template: &str, selection: &CapsuleSelection) -> Self {
        let mut ids = selection.ids().to_vec();
        ids.sort_unstable();
        Self {
            template: template.to_string(),
            selection: ids,
        }
    }
}

#[derive(Debug, Default)]
pub struct EditSurface {
    renderer: TemplateRenderer,
    key: Option<StructureKey>,
    html: Option<String>,
    fields: Vec<FieldNode>,
    editing: Option<usize>,
    generation: u64,
}

impl EditSurface {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            renderer: TemplateRenderer::new(config),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EditorConfig {
        self.renderer.config()
    }

    /// Bring the surface up to date with the host's state.
    ///
    /// Rebuilds only when the template text or the capsule selection differ
    /// from the last build. Form changes alone never rebuild. Rebuilding
    /// while a field is mid-edit is refused: the edit must be committed
    /// (blurred) first so the render reads the committed form.
    pub fn sync(
        &mut self,
        template: &ContractTemplate,
        capsules: &[Capsule],
        selection: &CapsuleSelection,
        form: &FormData,
    ) -> Result<SyncOutcome, EditorError> {
        let key = StructureKey::new(&template.content, selection);
        if self.key.as_ref() == Some(&key) {
            trace!("Surface structure unchanged");
            return Ok(if self.html.is_some() {
                SyncOutcome::Retained
            } else {
                SyncOutcome::NoContent
            });
        }

        if let Some(index) = self.editing {
            return Err(EditorError::CommitPending(index));
        }

        let rendered = self.renderer.render(&RenderInput {
            template: &template.content,
            variables: &template.variables,
            form,
            active_field: None,
            selection,
            capsules,
        });

        self.key = Some(key);
        self.generation += 1;

        match rendered {
            Rendered::NoContent => {
                self.html = None;
                self.fields.clear();
                debug!(generation = self.generation, "Surface cleared, no content");
                Ok(SyncOutcome::NoContent)
            }
            Rendered::Document(doc) => {
                self.fields = doc
                    .fields
                    .into_iter()
                    .map(|slot| FieldNode {
                        text: if slot.filled {
                            form.get(&slot.variable).to_string()
                        } else {
                            slot.label.clone()
                        },
                        value: if slot.filled {
                            form.get(&slot.variable).to_string()
                        } else {
                            String::new()
                        },
                        index: slot.index,
                        variable: slot.variable,
                        label: slot.label,
                        filled: slot.filled,
                        active: slot.active,
                    })
                    .collect();
                self.html = Some(doc.html.clone());
                debug!(
                    generation = self.generation,
                    fields = self.fields.len(),
                    "Surface rebuilt"
                );
                Ok(SyncOutcome::Rebuilt { html: doc.html })
            }
        }
    }

    /// Focus entered a placeholder. An untouched placeholder (still showing
    /// its label) is cleared so the user types into a blank field.
    ///
    /// If another field was still being edited, its uncommitted text is
    /// dropped and it goes back to its committed idle state; that patch
    /// comes after the one for the newly focused field.
    pub fn focus(
        &mut self,
        index: usize,
        current_text: &str,
    ) -> Result<Vec<DomPatch>, EditorError> {
        if index >= self.fields.len() {
            warn!(index, "Focus on unknown field");
            return Err(EditorError::UnknownField(index));
        }

        let config = self.renderer.config().clone();
        let mut patches = Vec::with_capacity(2);

        let node = &mut self.fields[index];
        let text = if current_text == node.label {
            node.text = String::new();
            Some(String::new())
        } else {
            node.text = current_text.to_string();
            None
        };
        node.active = true;
        trace!(index, variable = %node.variable, "Field focused");
        patches.push(DomPatch {
            index,
            class_name: config.field_class_list(node.filled, true),
            text,
        });

        if let Some(previous) = self.editing.filter(|&previous| previous != index) {
            warn!(previous, index, "Focus moved without a blur; dropping uncommitted edit");
            if let Some(node) = self.fields.get_mut(previous) {
                node.active = false;
                node.text = if node.filled {
                    node.value.clone()
                } else {
                    node.label.clone()
                };
                patches.push(DomPatch {
                    index: previous,
                    class_name: config.field_class_list(node.filled, false),
                    text: Some(node.text.clone()),
                });
            }
        }
        self.editing = Some(index);

        Ok(patches)
    }

    /// Keystroke inside the field being edited. Only the class changes; the
    /// host hears nothing until blur.
    pub fn input(&mut self, index: usize, current_text: &str) -> Result<DomPatch, EditorError> {
        if self.editing != Some(index) {
            return Err(self.not_editing(index));
        }

        let config = self.renderer.config();
        let node = self
            .fields
            .get_mut(index)
            .ok_or(EditorError::UnknownField(index))?;
        node.text = current_text.to_string();
        let looks_filled = !current_text.trim().is_empty();

        Ok(DomPatch {
            index,
            class_name: config.field_class_list(looks_filled, true),
            text: None,
        })
    }

    /// Commit the field being edited. Calls `host.on_form_change` exactly
    /// once with the whole next form, then returns the patches to apply: the
    /// blurred element first, then every other element bound to the same
    /// variable.
    pub fn blur<H: EditorHost + ?Sized>(
        &mut self,
        index: usize,
        current_text: &str,
        form: &FormData,
        host: &mut H,
    ) -> Result<Vec<DomPatch>, EditorError> {
        if self.editing != Some(index) {
            return Err(self.not_editing(index));
        }
        let variable = self
            .fields
            .get(index)
            .map(|node| node.variable.clone())
            .ok_or(EditorError::UnknownField(index))?;

        let value = current_text.trim();
        let filled = !value.is_empty();
        host.on_form_change(form.with_value(&variable, value));
        self.editing = None;
        debug!(index, variable = %variable, filled, "Field committed");

        let config = self.renderer.config();
        let class_name = config.field_class_list(filled, false);
        let mut patches = Vec::new();

        for node in self.fields.iter_mut().filter(|n| n.variable == variable) {
            let is_blurred = node.index == index;
            node.filled = filled;
            node.value = value.to_string();
            node.active = false;

            let text = if !filled {
                node.text = node.label.clone();
                Some(node.label.clone())
            } else if is_blurred {
                // Typed text stays exactly as entered
                node.text = current_text.to_string();
                None
            } else {
                node.text = value.to_string();
                Some(value.to_string())
            };

            let patch = DomPatch {
                index: node.index,
                class_name: class_name.clone(),
                text,
            };
            if is_blurred {
                patches.insert(0, patch);
            } else {
                patches.push(patch);
            }
        }

        Ok(patches)
    }

    /// Toggle a capsule checkbox: one `on_capsule_selection_change` call
    /// with the complete next selection. The host then calls `sync`.
    pub fn toggle_capsule<H: EditorHost + ?Sized>(
        &self,
        selection: &CapsuleSelection,
        id: u32,
        host: &mut H,
    ) -> Result<CapsuleSelection, EditorError> {
        if let Some(index) = self.editing {
            return Err(EditorError::CommitPending(index));
        }
        let next = selection.toggled(id);
        debug!(capsule = id, selected = next.contains(id), "Capsule toggled");
        host.on_capsule_selection_change(next.clone());
        Ok(next)
    }

    fn not_editing(&self, index: usize) -> EditorError {
        if index >= self.fields.len() {
            warn!(index, "Event for unknown field");
            EditorError::UnknownField(index)
        } else {
            EditorError::NotEditing(index)
        }
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn fields(&self) -> &[FieldNode] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldNode> {
        self.fields.get(index)
    }

    /// Index of the field being edited
    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    /// Variable of the field being edited
    pub fn active_field(&self) -> Option<&str> {
        self.editing
            .and_then(|index| self.fields.get(index))
            .map(|node| node.variable.as_str())
    }

    /// Number of structural rebuilds so far
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
