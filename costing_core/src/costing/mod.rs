//! # Costing Calculations
//!
//! Each calculator follows the same pattern:
//!
//! - plain input records (line items plus a parameter record)
//! - a `*Result` value built fresh on every call (JSON-serializable)
//! - a pure function from one to the other, with validation up front
//!
//! ## Available Calculations
//!
//! - [`rollup`] - material cost per output unit across line items
//! - [`formula`] - yield-adjusted unit cost of an existing production formula
//! - [`launch`] - launch economics: landed, labor, contingency, margin, break-even

pub mod formula;
pub mod launch;
pub mod rollup;

// Re-export commonly used types
pub use formula::{
    compute_formula_unit_cost, update_formula_unit_settings, FormulaCostingResult,
    UnitSettingsUpdate,
};
pub use launch::{compute_rollup, LaunchEstimate, LaunchEstimateParams, LaunchEstimateResult};
pub use rollup::{
    compute_material_cost_per_unit, rollup_line_items, CostRollupResult, CostWarnings, CostedLine,
};
