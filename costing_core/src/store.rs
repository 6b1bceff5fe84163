//! # Formula Storage Interface
//!
//! The engine never owns persistence. Callers hand it something that can
//! fetch a formula row by id and write a full replacement row; there are no
//! partial updates. [`Workbook`](crate::workbook::Workbook) and a plain
//! `HashMap<Uuid, Formula>` both qualify.

use std::collections::HashMap;

use uuid::Uuid;

use crate::costing::formula::Formula;
use crate::errors::{CostingError, CostingResult};

/// Select/replace access to stored formulas.
pub trait FormulaStore {
    /// Fetch the current row for `id`.
    fn fetch_formula(&self, id: &Uuid) -> CostingResult<Formula>;

    /// Overwrite the row for `id` with `formula`. The row must already exist.
    fn replace_formula(&mut self, id: &Uuid, formula: Formula) -> CostingResult<()>;
}

impl FormulaStore for HashMap<Uuid, Formula> {
    fn fetch_formula(&self, id: &Uuid) -> CostingResult<Formula> {
        self.get(id)
            .cloned()
            .ok_or_else(|| CostingError::formula_not_found(id.to_string()))
    }

    fn replace_formula(&mut self, id: &Uuid, formula: Formula) -> CostingResult<()> {
        match self.get_mut(id) {
            Some(row) => {
                *row = formula;
                Ok(())
            }
            None => Err(CostingError::formula_not_found(id.to_string())),
        }
    }
}
