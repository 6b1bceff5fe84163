//! # Costing Workbook
//!
//! The `Workbook` is the root container a caller persists: the production
//! formulas and launch estimates of one company, plus display settings.
//! Workbooks serialize to `.cwb` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Workbook
//! ├── meta: WorkbookMetadata (version, owner, company, timestamps)
//! ├── settings: WorkbookSettings (currency label, display decimals)
//! ├── formulas: HashMap<Uuid, Formula>
//! └── estimates: HashMap<Uuid, LaunchEstimate>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use costing_core::costing::formula::Formula;
//! use costing_core::workbook::Workbook;
//!
//! let mut workbook = Workbook::new("Dana Ops", "Acme Botanicals");
//! let id = workbook.add_formula(Formula::new("Lavender soap"));
//! assert_eq!(workbook.find_formula("lavender SOAP"), Some(id));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::costing::formula::Formula;
use crate::costing::launch::LaunchEstimate;
use crate::errors::{CostingError, CostingResult};
use crate::store::FormulaStore;

/// Current schema version for .cwb files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root workbook container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub meta: WorkbookMetadata,

    #[serde(default)]
    pub settings: WorkbookSettings,

    #[serde(default)]
    pub formulas: HashMap<Uuid, Formula>,

    #[serde(default)]
    pub estimates: HashMap<Uuid, LaunchEstimate>,
}

impl Workbook {
    /// Create a new empty workbook.
    pub fn new(owner: impl Into<String>, company: impl Into<String>) -> Self {
        let now = Utc::now();
        Workbook {
            meta: WorkbookMetadata {
                version: SCHEMA_VERSION.to_string(),
                owner: owner.into(),
                company: company.into(),
                created: now,
                modified: now,
            },
            settings: WorkbookSettings::default(),
            formulas: HashMap::new(),
            estimates: HashMap::new(),
        }
    }

    /// Add a formula, returning its new id.
    pub fn add_formula(&mut self, formula: Formula) -> Uuid {
        let id = Uuid::new_v4();
        self.formulas.insert(id, formula);
        self.touch();
        id
    }

    /// Remove a formula by id.
    pub fn remove_formula(&mut self, id: &Uuid) -> Option<Formula> {
        let formula = self.formulas.remove(id);
        if formula.is_some() {
            self.touch();
        }
        formula
    }

    pub fn get_formula(&self, id: &Uuid) -> Option<&Formula> {
        self.formulas.get(id)
    }

    /// Resolve a formula by id string or case-insensitive name.
    pub fn find_formula(&self, key: &str) -> Option<Uuid> {
        find_by_key(&self.formulas, key, |f| f.name.as_str())
    }

    /// Add a launch estimate, returning its new id.
    pub fn add_estimate(&mut self, estimate: LaunchEstimate) -> Uuid {
        let id = Uuid::new_v4();
        self.estimates.insert(id, estimate);
        self.touch();
        id
    }

    /// Remove a launch estimate by id.
    pub fn remove_estimate(&mut self, id: &Uuid) -> Option<LaunchEstimate> {
        let estimate = self.estimates.remove(id);
        if estimate.is_some() {
            self.touch();
        }
        estimate
    }

    pub fn get_estimate(&self, id: &Uuid) -> Option<&LaunchEstimate> {
        self.estimates.get(id)
    }

    /// Resolve a launch estimate by id string or case-insensitive name.
    pub fn find_estimate(&self, key: &str) -> Option<Uuid> {
        find_by_key(&self.estimates, key, |e| e.params.name.as_str())
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

fn find_by_key<T>(items: &HashMap<Uuid, T>, key: &str, name: impl Fn(&T) -> &str) -> Option<Uuid> {
    if let Ok(id) = key.parse::<Uuid>() {
        if items.contains_key(&id) {
            return Some(id);
        }
    }
    let key = key.trim().to_lowercase();
    items
        .iter()
        .find(|(_, item)| name(item).to_lowercase() == key)
        .map(|(id, _)| *id)
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new("", "")
    }
}

impl FormulaStore for Workbook {
    fn fetch_formula(&self, id: &Uuid) -> CostingResult<Formula> {
        self.formulas.fetch_formula(id)
    }

    fn replace_formula(&mut self, id: &Uuid, formula: Formula) -> CostingResult<()> {
        if !self.formulas.contains_key(id) {
            return Err(CostingError::formula_not_found(id.to_string()));
        }
        self.formulas.insert(*id, formula);
        self.touch();
        Ok(())
    }
}

/// Workbook metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Person responsible for the costing data
    pub owner: String,

    pub company: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Display settings. These never change computed numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookSettings {
    /// Currency label shown next to amounts (no conversion is performed)
    pub currency: String,

    /// Decimal places used when printing amounts
    pub display_decimals: usize,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        WorkbookSettings {
            currency: "USD".to_string(),
            display_decimals: 2,
        }
    }
}

impl WorkbookSettings {
    /// Format an amount for display, e.g. `12.50 USD`.
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{:.*} {}", self.display_decimals, amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::formula::{update_formula_unit_settings, UnitSettingsUpdate};
    use crate::costing::launch::LaunchEstimateParams;
    use crate::line_items::{FormulaLine, ItemType};
    use crate::units::Unit;

    #[test]
    fn test_workbook_creation() {
        let wb = Workbook::new("Dana", "Acme");
        assert_eq!(wb.meta.owner, "Dana");
        assert_eq!(wb.meta.version, SCHEMA_VERSION);
        assert_eq!(wb.settings.currency, "USD");
    }

    #[test]
    fn test_workbook_serialization() {
        let mut wb = Workbook::new("Dana", "Acme");
        let water = FormulaLine::new("Water", ItemType::Ingredient, 80.0, Unit::Ml);
        wb.add_formula(Formula::new("Lotion").with_line(water));
        let params = LaunchEstimateParams::new("Lotion launch");
        wb.add_estimate(LaunchEstimate::new(params, Vec::new()));

        let json = serde_json::to_string_pretty(&wb).unwrap();
        assert!(json.contains("Lotion launch"));

        let roundtrip: Workbook = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.formulas.len(), 1);
        assert_eq!(roundtrip.estimates.len(), 1);
    }

    #[test]
    fn test_find_formula_by_id_or_name() {
        let mut wb = Workbook::default();
        let id = wb.add_formula(Formula::new("Body Butter"));
        assert_eq!(wb.find_formula(&id.to_string()), Some(id));
        assert_eq!(wb.find_formula("body butter"), Some(id));
        assert_eq!(wb.find_formula("lip balm"), None);
    }

    #[test]
    fn test_estimates_by_name_and_removal() {
        let mut wb = Workbook::default();
        let params = LaunchEstimateParams::new("Spring Candle");
        let estimate = LaunchEstimate::new(params, Vec::new());
        let id = wb.add_estimate(estimate);
        assert_eq!(wb.find_estimate("spring candle"), Some(id));
        assert_eq!(wb.find_estimate(&id.to_string()), Some(id));
        assert_eq!(wb.get_estimate(&id).unwrap().params.name, "Spring Candle");

        assert!(wb.remove_estimate(&id).is_some());
        assert_eq!(wb.find_estimate("spring candle"), None);
        assert!(wb.remove_estimate(&id).is_none());

        let formula_id = wb.add_formula(Formula::new("Wick"));
        assert!(wb.remove_formula(&formula_id).is_some());
        assert!(wb.formulas.is_empty());
    }

    #[test]
    fn test_settings_update_through_workbook() {
        let mut wb = Workbook::default();
        let id = wb.add_formula(Formula::new("Serum"));
        let before = wb.meta.modified;

        let update = UnitSettingsUpdate::new(Some(30.0), Some(Unit::Ml), Some(98.0));
        let result = update_formula_unit_settings(&mut wb, &id, &update).unwrap();

        assert_eq!(result.header.yield_pct, Some(98.0));
        assert_eq!(wb.get_formula(&id).unwrap().yield_pct, Some(98.0));
        assert!(wb.meta.modified >= before);
    }

    #[test]
    fn test_format_amount() {
        let settings = WorkbookSettings {
            currency: "EUR".to_string(),
            display_decimals: 3,
        };
        assert_eq!(settings.format_amount(1.5), "1.500 EUR");
    }
}
