//! Contract editor core
//!
//! Variable binding and live preview for contract templates:
//! - Template rendering: `{{ variable }}` substitution into HTML, with
//!   selected optional clauses ("capsules") appended
//! - Inline edit surface: focus / input / blur state machine over the
//!   rendered placeholders, committing to the host on blur only
//! - Pricing and completion: total price and form completion percentage
//!
//! The crate does no I/O. The host page owns the template, the form data
//! and the capsule selection, and receives whole-map updates through
//! [`EditorHost`].

pub mod config;
pub mod error;
pub mod host;
pub mod pricing;
pub mod render;
pub mod surface;

pub use config::EditorConfig;
pub use error::EditorError;
pub use host::{EditorHost, RecordingHost};
pub use pricing::{completion_percentage, missing_variables, total_price, Summary};
pub use render::{
    extract_variables, placeholder_label, render, FieldSlot, RenderInput, Rendered,
    RenderedDocument, TemplateRenderer,
};
pub use surface::{DomPatch, EditSurface, FieldNode, SyncOutcome};

pub use shared_types::{Capsule, CapsuleSelection, ContractTemplate, FormData};
