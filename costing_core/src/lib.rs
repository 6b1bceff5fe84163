//! # costing_core - Costing & Launch-Estimation Engine
//!
//! `costing_core` computes what a manufactured unit costs and whether a new
//! product launch pays off. Inputs and outputs are plain JSON-serializable
//! records; the engine never touches storage itself.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: pure functions from input records to fresh result records
//! - **Missing data is data**: no price or no density becomes a warning, not a crash
//! - **Undefined outcomes are explicit**: margin and break-even are `None`
//!   when they cannot be computed, never `NaN` or infinity
//! - **Validate first**: malformed input is rejected with a field path before
//!   any arithmetic runs
//!
//! ## Quick Start
//!
//! ```rust
//! use costing_core::costing::launch::{compute_rollup, LaunchEstimateParams};
//! use costing_core::line_items::LineItem;
//! use costing_core::units::Unit;
//!
//! let items = vec![LineItem::ingredient("Cocoa", 1000.0, Unit::G, 50.0, 200.0, Unit::G)];
//! let params = LaunchEstimateParams {
//!     material_waste_pct: Some(5.0),
//!     proposed_price: Some(25.0),
//!     ..LaunchEstimateParams::new("Cocoa bar")
//! };
//!
//! let result = compute_rollup(&params, &items).unwrap();
//! assert!((result.material_cost_per_unit - 10.5).abs() < 1e-9);
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Mass/volume/count conversion with density
//! - [`line_items`] - Line item and formula line records
//! - [`costing`] - Rollup, formula unit cost and launch economics calculators
//! - [`validation`] - Input checks run before the calculators
//! - [`errors`] - Structured error types
//! - [`store`] - Select/replace interface for formula persistence
//! - [`workbook`] - Container of formulas and estimates a caller persists
//! - [`file_io`] - Atomic workbook saves with file locking

pub mod costing;
pub mod errors;
pub mod file_io;
pub mod line_items;
pub mod store;
pub mod units;
pub mod validation;
pub mod workbook;

// Re-export commonly used types at crate root for convenience
pub use costing::formula::Formula;
pub use errors::{ConversionError, CostingError, CostingResult};
pub use file_io::{load_workbook, save_workbook, FileLock};
pub use line_items::{FormulaLine, ItemType, LineItem, UnitSize};
pub use store::FormulaStore;
pub use units::{Density, Dimension, Unit};
pub use workbook::{Workbook, WorkbookSettings};
