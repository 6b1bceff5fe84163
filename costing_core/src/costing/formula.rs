//! # Formula Unit Cost
//!
//! Per-unit cost summary of an existing production formula. Ingredient and
//! packaging lines are costed against their source packs and tallied
//! separately, then the sum is adjusted for yield:
//!
//! ```text
//! total_unit_cost = (ingredients + packaging) / (yield_pct / 100)
//! ```
//!
//! A yield of 0 or none means no adjustment (factor 1). When the declared
//! unit size is a mass or volume, the total is also expressed per gram or
//! per milliliter of content.
//!
//! Lines missing a price or a needed density are costed at zero and listed
//! in the result warnings; the calculation always completes.
//!
//! ## Example
//!
//! ```rust
//! use costing_core::costing::formula::compute_formula_unit_cost;
//! use costing_core::line_items::{FormulaLine, ItemType, UnitSize};
//! use costing_core::units::Unit;
//!
//! let lines = vec![
//!     FormulaLine::new("Aloe gel", ItemType::Ingredient, 25.0, Unit::G)
//!         .with_pack(1.0, Unit::Kg, 12.0),
//!     FormulaLine::new("Tube", ItemType::Packaging, 1.0, Unit::Each)
//!         .with_pack(100.0, Unit::Each, 30.0),
//! ];
//!
//! let unit_size = Some(UnitSize::new(25.0, Unit::G));
//! let result = compute_formula_unit_cost(&lines, unit_size, Some(100.0));
//! assert!((result.totals.total_unit_cost - 0.6).abs() < 1e-9);
//! assert!((result.totals.cost_per_content_unit.unwrap() - 0.024).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::costing::rollup::{cost_against_pack, CostWarnings, CostedLine};
use crate::errors::CostingResult;
use crate::line_items::{FormulaLine, ItemType, UnitSize};
use crate::store::FormulaStore;
use crate::units::{to_base_unit, Unit};
use crate::validation::{require_name, require_non_negative, require_yield};

/// A production formula as stored by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,

    /// Declared content of one finished unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_size: Option<UnitSize>,

    /// Expected yield in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_pct: Option<f64>,

    #[serde(default)]
    pub lines: Vec<FormulaLine>,
}

impl Formula {
    pub fn new(name: impl Into<String>) -> Self {
        Formula {
            name: name.into(),
            unit_size: None,
            yield_pct: None,
            lines: Vec::new(),
        }
    }

    /// Builder-style line append
    pub fn with_line(mut self, line: FormulaLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Validate the formula name, its stored settings and every line.
    ///
    /// A stored yield of 0 (or below) is read as "no adjustment" and passes;
    /// a positive yield must lie in the edit path's range.
    pub fn validate(&self) -> CostingResult<()> {
        require_name("name", &self.name)?;
        if let Some(size) = self.unit_size {
            require_non_negative("unit_size.value", size.value)?;
        }
        if let Some(yield_pct) = self.yield_pct.filter(|y| *y > 0.0) {
            require_yield("yield_pct", yield_pct)?;
        }
        for (i, line) in self.lines.iter().enumerate() {
            line.validate_at(&format!("lines[{}]", i))?;
        }
        Ok(())
    }

    /// Validate, then cost with the formula's current settings.
    pub fn cost(&self) -> CostingResult<FormulaCostingResult> {
        self.validate()?;
        Ok(compute_formula_unit_cost(&self.lines, self.unit_size, self.yield_pct))
    }
}

/// Settings the result was computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaHeader {
    pub unit_size: Option<UnitSize>,
    pub yield_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTotals {
    pub ingredients_subtotal: f64,
    pub packaging_subtotal: f64,

    /// Yield-adjusted cost of one finished unit
    pub total_unit_cost: f64,

    /// Cost per gram or per milliliter of content; `None` for count or
    /// undeclared unit sizes
    pub cost_per_content_unit: Option<f64>,

    /// g or mL when `cost_per_content_unit` is set
    pub content_unit: Option<Unit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaBreakdown {
    pub ingredients: Vec<CostedLine>,
    pub packaging: Vec<CostedLine>,
}

/// Per-unit cost summary of a formula.
///
/// ## JSON Example
///
/// ```json
/// {
///   "header": { "unit_size": { "value": 30.0, "unit": "mL" }, "yield_pct": 95.0 },
///   "totals": {
///     "ingredients_subtotal": 1.42,
///     "packaging_subtotal": 0.38,
///     "total_unit_cost": 1.8947,
///     "cost_per_content_unit": 0.0632,
///     "content_unit": "mL"
///   },
///   "breakdown": { "ingredients": [], "packaging": [] },
///   "warnings": { "missing_prices": [], "missing_densities": [], "incompatible_units": [] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaCostingResult {
    pub header: FormulaHeader,
    pub totals: FormulaTotals,
    pub breakdown: FormulaBreakdown,
    pub warnings: CostWarnings,
}

/// Divisor applied to the raw subtotal: `yield/100`, or 1 for a zero or
/// missing yield.
pub fn effective_yield_factor(yield_pct: Option<f64>) -> f64 {
    match yield_pct {
        Some(y) if y > 0.0 => y / 100.0,
        _ => 1.0,
    }
}

/// Cost per gram or milliliter of content, with the unit it is quoted in.
fn content_cost(total_unit_cost: f64, unit_size: Option<UnitSize>) -> Option<(f64, Unit)> {
    let size = unit_size?;
    if !size.unit.is_content_measure() || size.value <= 0.0 {
        return None;
    }
    let base = to_base_unit(size.value, size.unit);
    Some((total_unit_cost / base, size.unit.dimension().base_unit()))
}

fn subtotal(lines: &[CostedLine]) -> f64 {
    lines.iter().map(|l| l.material_cost_per_output_unit).sum()
}

/// Compute the per-unit cost summary of a formula.
///
/// # Arguments
///
/// * `lines` - Formula lines; `other` lines are ignored
/// * `unit_size` - Declared content of one finished unit
/// * `yield_pct` - Expected yield; 0 or `None` means no adjustment
pub fn compute_formula_unit_cost(
    lines: &[FormulaLine],
    unit_size: Option<UnitSize>,
    yield_pct: Option<f64>,
) -> FormulaCostingResult {
    let mut breakdown = FormulaBreakdown::default();
    let mut warnings = CostWarnings::default();

    for line in lines {
        let target = match line.item_type {
            ItemType::Ingredient => &mut breakdown.ingredients,
            ItemType::Packaging => &mut breakdown.packaging,
            ItemType::Other => continue,
        };
        let costed = cost_against_pack(
            &line.name,
            line.item_type,
            line.quantity,
            line.unit,
            line.priced_pack(),
            line.density,
            None,
        );
        warnings.record(&costed);
        target.push(costed);
    }

    let ingredients_subtotal = subtotal(&breakdown.ingredients);
    let packaging_subtotal = subtotal(&breakdown.packaging);

    let total_unit_cost =
        (ingredients_subtotal + packaging_subtotal) / effective_yield_factor(yield_pct);
    let content = content_cost(total_unit_cost, unit_size);

    debug!(
        target: "costing.formula",
        ingredients_subtotal,
        packaging_subtotal,
        total_unit_cost,
        warnings = !warnings.is_empty(),
        "Formula unit cost computed"
    );

    FormulaCostingResult {
        header: FormulaHeader { unit_size, yield_pct },
        totals: FormulaTotals {
            ingredients_subtotal,
            packaging_subtotal,
            total_unit_cost,
            cost_per_content_unit: content.map(|(cost, _)| cost),
            content_unit: content.map(|(_, unit)| unit),
        },
        breakdown,
        warnings,
    }
}

/// New unit-size and yield settings for a formula.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitSettingsUpdate {
    pub unit_size_value: Option<f64>,
    pub unit_size_unit: Option<Unit>,
    pub yield_pct: Option<f64>,
}

impl UnitSettingsUpdate {
    pub fn new(
        unit_size_value: Option<f64>,
        unit_size_unit: Option<Unit>,
        yield_pct: Option<f64>,
    ) -> Self {
        UnitSettingsUpdate {
            unit_size_value,
            unit_size_unit,
            yield_pct,
        }
    }

    /// Unit size, when both halves are present
    pub fn unit_size(&self) -> Option<UnitSize> {
        match (self.unit_size_value, self.unit_size_unit) {
            (Some(value), Some(unit)) => Some(UnitSize::new(value, unit)),
            _ => None,
        }
    }
}

/// Validate and save new unit settings, then return a result recomputed
/// from the row as saved.
///
/// The formula is fetched and its settings replaced. The whole modified row
/// is validated before it is written back through `store`, then read again
/// before costing, so the returned numbers always match what was persisted.
///
/// # Errors
///
/// * `InvalidInput` / `MissingField` - the settings or a stored line fail
///   validation (nothing is written)
/// * `FormulaNotFound` - `formula_id` is unknown to the store
pub fn update_formula_unit_settings<S: FormulaStore + ?Sized>(
    store: &mut S,
    formula_id: &Uuid,
    update: &UnitSettingsUpdate,
) -> CostingResult<FormulaCostingResult> {
    update.validate()?;

    let mut formula = store.fetch_formula(formula_id)?;
    formula.unit_size = update.unit_size();
    formula.yield_pct = update.yield_pct;
    formula.validate()?;
    store.replace_formula(formula_id, formula)?;

    debug!(target: "costing.formula", %formula_id, ?update, "Formula unit settings saved");

    store.fetch_formula(formula_id)?.cost()
}
