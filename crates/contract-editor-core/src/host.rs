//! Callback seam to the host page

use shared_types::{CapsuleSelection, FormData};

/// Receives the editor's proposed state changes.
///
/// Both callbacks carry the complete next value, never a delta; merging and
/// persistence are the host's business.
pub trait EditorHost {
    /// Called once per committed field edit (on blur)
    fn on_form_change(&mut self, next: FormData);

    /// Called once per capsule checkbox toggle
    fn on_capsule_selection_change(&mut self, next: CapsuleSelection);
}

/// Host that records every callback, for tests and headless use
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub form_changes: Vec<FormData>,
    pub selection_changes: Vec<CapsuleSelection>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_form(&self) -> Option<&FormData> {
        self.form_changes.last()
    }

    pub fn last_selection(&self) -> Option<&CapsuleSelection> {
        self.selection_changes.last()
    }
}

impl EditorHost for RecordingHost {
    fn on_form_change(&mut self, next: FormData) {
        self.form_changes.push(next);
    }

    fn on_capsule_selection_change(&mut self, next: CapsuleSelection) {
        self.selection_changes.push(next);
    }
}
