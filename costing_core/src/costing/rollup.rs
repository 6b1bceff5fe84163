//! # Material Cost Rollup
//!
//! Turns line items into a material cost per finished unit:
//!
//! ```text
//! cost_per_base_unit = pack_price / pack size in the recipe's base unit
//! line cost          = qty_base_units × cost_per_base_unit × (1 + waste/100)
//! material cost      = Σ line cost over ingredient and packaging lines
//! ```
//!
//! Lines of type `other` are carried in the result for display but never
//! summed. A line that cannot be costed (no density for a mass/volume
//! crossing, a count unit against a mass pack, a zero pack size) contributes
//! zero and is listed in [`CostWarnings`]. Lines never interact, so the
//! total is exactly the sum of the independently costed lines.
//!
//! ## Example
//!
//! ```rust
//! use costing_core::costing::rollup::rollup_line_items;
//! use costing_core::line_items::LineItem;
//! use costing_core::units::Unit;
//!
//! // 1000 g for $50, 200 g per unit, 5% waste
//! let cocoa = LineItem::ingredient("Cocoa", 1000.0, Unit::G, 50.0, 200.0, Unit::G);
//! let items = vec![cocoa.with_waste(5.0)];
//! let result = rollup_line_items(&items, None);
//! assert!((result.material_cost_per_unit - 10.5).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ConversionError;
use crate::line_items::{ItemType, LineItem};
use crate::units::{compute_cost_per_base_unit, to_base_unit, Density, Unit};

/// Why a line was costed at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineIssue {
    /// No price, no pack size, or a zero pack size
    MissingPrice,
    /// Pack and recipe units cross mass/volume and no density is recorded
    MissingDensity,
    /// Count unit against a mass or volume unit
    IncompatibleUnits,
}

/// A single costed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedLine {
    pub name: String,
    pub item_type: ItemType,

    /// Pack price per base unit of the recipe quantity's dimension
    pub cost_per_base_unit: f64,

    /// Recipe quantity per output unit, in `base_unit`
    pub qty_base_units: f64,

    /// g, mL or each
    pub base_unit: Unit,

    /// Line cost per finished unit, waste included
    pub material_cost_per_output_unit: f64,

    /// False for `other` lines, which are shown but not summed
    pub included: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<LineIssue>,
}

/// Data-quality warnings collected while costing. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostWarnings {
    pub missing_prices: Vec<String>,
    pub missing_densities: Vec<String>,
    #[serde(default)]
    pub incompatible_units: Vec<String>,
}

impl CostWarnings {
    /// Record the line's issue, if any.
    pub fn record(&mut self, line: &CostedLine) {
        let bucket = match line.issue {
            Some(LineIssue::MissingPrice) => &mut self.missing_prices,
            Some(LineIssue::MissingDensity) => &mut self.missing_densities,
            Some(LineIssue::IncompatibleUnits) => &mut self.incompatible_units,
            None => return,
        };
        bucket.push(line.name.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.missing_prices.is_empty()
            && self.missing_densities.is_empty()
            && self.incompatible_units.is_empty()
    }
}

/// Material cost across a list of line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRollupResult {
    pub lines: Vec<CostedLine>,

    /// Sum of `material_cost_per_output_unit` over included lines
    pub material_cost_per_unit: f64,

    pub warnings: CostWarnings,
}

/// Cost of one line per finished unit: `qty × cost × (1 + waste/100)`.
///
/// `waste_pct` defaults to 0 when absent.
pub fn compute_material_cost_per_unit(
    qty_base_units: f64,
    cost_per_base_unit: f64,
    waste_pct: Option<f64>,
) -> f64 {
    let waste = waste_pct.unwrap_or(0.0);
    qty_base_units * cost_per_base_unit * (1.0 + waste / 100.0)
}

/// Pack data a line was bought in: size, size unit, price.
pub(crate) type Pack = (f64, Unit, f64);

/// Cost a recipe quantity against its source pack.
///
/// The quantity's own dimension is the costing basis; the pack is converted
/// into it, crossing mass/volume through `density` when needed.
pub(crate) fn cost_against_pack(
    name: &str,
    item_type: ItemType,
    quantity: f64,
    unit: Unit,
    pack: Option<Pack>,
    density: Option<Density>,
    waste_pct: Option<f64>,
) -> CostedLine {
    let basis = unit.dimension();
    let qty_base_units = to_base_unit(quantity, unit);

    let (cost_per_base_unit, issue) = match pack {
        None => (0.0, Some(LineIssue::MissingPrice)),
        Some((size, size_unit, price)) => {
            match compute_cost_per_base_unit(price, size, size_unit, basis, density) {
                Ok(cost) if size == 0.0 => (cost, Some(LineIssue::MissingPrice)),
                Ok(cost) => (cost, None),
                Err(ConversionError::MissingDensity { .. }) => {
                    (0.0, Some(LineIssue::MissingDensity))
                }
                Err(ConversionError::Incompatible { .. }) => {
                    (0.0, Some(LineIssue::IncompatibleUnits))
                }
            }
        }
    };

    let included = item_type.is_costed();
    if included {
        if let Some(issue) = issue {
            warn!(target: "costing.rollup", line = name, ?issue, "Line costed at zero");
        }
    }

    CostedLine {
        name: name.to_string(),
        item_type,
        cost_per_base_unit,
        qty_base_units,
        base_unit: basis.base_unit(),
        material_cost_per_output_unit: compute_material_cost_per_unit(
            qty_base_units,
            cost_per_base_unit,
            waste_pct,
        ),
        included,
        issue,
    }
}

/// Cost one line item. `waste_override` replaces the line's own waste rate.
pub fn cost_line_item(item: &LineItem, waste_override: Option<f64>) -> CostedLine {
    cost_against_pack(
        &item.name,
        item.item_type,
        item.qty_per_output_unit,
        item.qty_per_output_unit_unit,
        Some((item.pack_size_value, item.pack_size_unit, item.pack_price)),
        item.density,
        waste_override.or(item.waste_pct),
    )
}

/// Roll up material cost per finished unit over `items`.
///
/// # Arguments
///
/// * `items` - Line items, already validated
/// * `waste_override` - Shared waste rate for every line; `None` uses each
///   line's own `waste_pct`
pub fn rollup_line_items(items: &[LineItem], waste_override: Option<f64>) -> CostRollupResult {
    let mut warnings = CostWarnings::default();
    let lines: Vec<CostedLine> = items
        .iter()
        .map(|item| cost_line_item(item, waste_override))
        .collect();

    for line in lines.iter().filter(|l| l.included) {
        warnings.record(line);
    }

    let material_cost_per_unit = lines
        .iter()
        .filter(|l| l.included)
        .map(|l| l.material_cost_per_output_unit)
        .sum();

    debug!(
        target: "costing.rollup",
        lines = lines.len(),
        material_cost_per_unit,
        "Material rollup computed"
    );

    CostRollupResult {
        lines,
        material_cost_per_unit,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_cost_formula() {
        assert!((compute_material_cost_per_unit(200.0, 0.05, Some(5.0)) - 10.5).abs() < 1e-9);
        assert_eq!(compute_material_cost_per_unit(200.0, 0.05, None), 10.0);
    }

    #[test]
    fn test_volume_pack_mass_recipe() {
        // 1 L for $20 at 0.9 g/mL, 50 g per unit
        let item =
            LineItem::ingredient("Glycerin", 1.0, Unit::L, 20.0, 50.0, Unit::G).with_density(0.9);
        let line = cost_line_item(&item, None);
        assert!((line.cost_per_base_unit - 0.022222).abs() < 1e-6);
        assert!((line.material_cost_per_output_unit - 1.111).abs() < 1e-3);
        assert_eq!(line.base_unit, Unit::G);
        assert_eq!(line.issue, None);
    }

    #[test]
    fn test_missing_density_costs_zero_and_warns() {
        let items = vec![
            LineItem::ingredient("Oil", 1.0, Unit::L, 20.0, 50.0, Unit::G),
            LineItem::ingredient("Salt", 1.0, Unit::Kg, 2.0, 10.0, Unit::G),
        ];
        let result = rollup_line_items(&items, None);
        assert_eq!(result.lines[0].material_cost_per_output_unit, 0.0);
        assert_eq!(result.warnings.missing_densities, vec!["Oil".to_string()]);
        assert!((result.material_cost_per_unit - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_other_lines_excluded_from_total() {
        let items = vec![
            LineItem::ingredient("Butter", 1.0, Unit::Kg, 10.0, 100.0, Unit::G),
            LineItem::ingredient("Label", 100.0, Unit::Each, 25.0, 1.0, Unit::Each)
                .with_type(ItemType::Other),
        ];
        let result = rollup_line_items(&items, None);
        assert_eq!(result.lines.len(), 2);
        assert!(!result.lines[1].included);
        assert!((result.lines[1].material_cost_per_output_unit - 0.25).abs() < 1e-12);
        assert!((result.material_cost_per_unit - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_waste_override_replaces_line_waste() {
        let flour = LineItem::ingredient("Flour", 1.0, Unit::Kg, 1.0, 1000.0, Unit::G);
        let items = vec![flour.with_waste(50.0)];
        let own = rollup_line_items(&items, None);
        let shared = rollup_line_items(&items, Some(10.0));
        assert!((own.material_cost_per_unit - 1.5).abs() < 1e-12);
        assert!((shared.material_cost_per_unit - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_pack_reported_as_missing_price() {
        let items = vec![LineItem::ingredient("Sample", 0.0, Unit::G, 5.0, 10.0, Unit::G)];
        let result = rollup_line_items(&items, None);
        assert_eq!(result.material_cost_per_unit, 0.0);
        assert_eq!(result.warnings.missing_prices, vec!["Sample".to_string()]);
    }

    #[test]
    fn test_count_against_mass_is_incompatible() {
        let items = vec![LineItem::ingredient("Jar", 1.0, Unit::Kg, 5.0, 1.0, Unit::Each)];
        let result = rollup_line_items(&items, None);
        assert_eq!(result.warnings.incompatible_units, vec!["Jar".to_string()]);
    }

    #[test]
    fn test_empty_rollup() {
        let result = rollup_line_items(&[], Some(5.0));
        assert_eq!(result.material_cost_per_unit, 0.0);
        assert!(result.warnings.is_empty());
    }
}
