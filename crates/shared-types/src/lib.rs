//! Data model shared by the contract editor crates.
//!
//! Everything here crosses the WASM boundary as JSON, so every type is
//! serde (de)serializable with the field names the host API already uses.

pub mod types;

pub use types::{Capsule, CapsuleSelection, ContractTemplate, FormData};
