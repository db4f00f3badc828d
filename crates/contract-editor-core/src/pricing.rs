//! Price and completion derived from the form and capsule selection

use serde::{Deserialize, Serialize};
use shared_types::{Capsule, CapsuleSelection, ContractTemplate, FormData};

/// Base price plus the price of every selected capsule
pub fn total_price(base_price: f64, capsules: &[Capsule], selection: &CapsuleSelection) -> f64 {
    base_price
        + capsules
            .iter()
            .filter(|capsule| selection.contains(capsule.id))
            .map(|capsule| capsule.price)
            .sum::<f64>()
}

/// Percentage (0-100, rounded) of listed variables with a non-blank value.
/// An empty variable list is 0% complete.
pub fn completion_percentage(variables: &[String], form: &FormData) -> u8 {
    let names = variables.iter().filter(|name| !name.is_empty());
    let total = names.clone().count();
    if total == 0 {
        return 0;
    }
    let filled = names.filter(|name| form.is_filled(name)).count();
    ((filled as f64 * 100.0) / total as f64).round() as u8
}

/// Listed variables still blank, in list order
pub fn missing_variables<'a>(variables: &'a [String], form: &FormData) -> Vec<&'a str> {
    variables
        .iter()
        .map(String::as_str)
        .filter(|name| !name.is_empty() && !form.is_filled(name))
        .collect()
}

/// Everything the checkout sidebar shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_price: f64,
    pub completion: u8,
    pub missing: Vec<String>,
}

impl Summary {
    pub fn compute(
        template: &ContractTemplate,
        capsules: &[Capsule],
        selection: &CapsuleSelection,
        form: &FormData,
    ) -> Self {
        Self {
            total_price: total_price(template.base_price, capsules, selection),
            completion: completion_percentage(&template.variables, form),
            missing: missing_variables(&template.variables, form)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
