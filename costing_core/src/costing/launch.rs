//! # Launch Economics
//!
//! Full per-unit economics of a new product launch. Each step is a pure
//! function of the inputs and the steps before it:
//!
//! ```text
//! 1. material      = Σ line cost, using material_waste_pct for every line
//! 2. landed        = (freight + duty_tax + insurance + handling) / volume   (0 if volume is 0)
//! 3. labor         = rate × hours × (1 + learning/100)
//! 4. amortized     = (tooling_nre + certification_testing + label_design) / max(volume, 1)
//! 5. contingency   = (material + landed + labor + overhead) × contingency/100
//! 6. total         = material + landed + labor + overhead + contingency + amortized
//! 7. gross margin  = (price × (1 − fees/100) − total) / price × 100        (price > 0)
//! 8. break-even    = fixed costs / (price − total)                          (price > total)
//! ```
//!
//! Economic edge cases never fail: a zero volume, a zero price or a negative
//! contribution margin show up as 0 or `None` fields. Only structurally
//! invalid input is rejected, and that happens before step 1.
//!
//! ## Example
//!
//! ```rust
//! use costing_core::costing::launch::{compute_rollup, LaunchEstimateParams};
//!
//! let params = LaunchEstimateParams {
//!     overhead_allocation_per_unit: 4.0,
//!     tooling_nre: 10_000.0,
//!     proposed_price: Some(10.0),
//!     ..LaunchEstimateParams::new("Travel mug")
//! };
//!
//! let result = compute_rollup(&params, &[]).unwrap();
//! assert_eq!(result.total_variable_cost_per_unit, 10_004.0);
//! assert_eq!(result.break_even_units, None);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::costing::rollup::{rollup_line_items, CostRollupResult};
use crate::errors::CostingResult;
use crate::line_items::LineItem;
use crate::validation::validate_line_items;

/// Estimate-level parameters. Cost fields default to 0 when omitted.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Lip balm launch",
///   "target_launch_volume_units": 5000,
///   "material_waste_pct": 3,
///   "freight": 400,
///   "duty_tax": 120,
///   "labor_rate_per_hour": 22,
///   "labor_hours_per_unit": 0.02,
///   "contingency_pct": 10,
///   "tooling_nre": 1500,
///   "proposed_price": 6.5,
///   "channel_fees_pct": 15
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchEstimateParams {
    /// Estimate label (required)
    pub name: String,

    /// Units the one-off and logistics costs are spread over
    pub target_launch_volume_units: Option<f64>,

    /// Waste rate applied to every line item (0 when absent)
    pub material_waste_pct: Option<f64>,

    // Logistics, for the whole launch volume
    pub freight: f64,
    pub duty_tax: f64,
    pub insurance: f64,
    pub handling: f64,

    // Labor
    pub labor_rate_per_hour: f64,
    pub labor_hours_per_unit: f64,
    /// Learning-curve inefficiency added on top of labor hours
    pub labor_learning_pct: f64,

    pub overhead_allocation_per_unit: f64,
    pub contingency_pct: f64,

    // One-off launch costs
    pub tooling_nre: f64,
    pub certification_testing: f64,
    pub label_design: f64,

    /// Selling price per unit; margin and break-even need it
    pub proposed_price: Option<f64>,

    /// Marketplace/distributor fees as a percentage of price
    pub channel_fees_pct: f64,
}

impl LaunchEstimateParams {
    /// Parameters with every cost at zero and no price.
    pub fn new(name: impl Into<String>) -> Self {
        LaunchEstimateParams {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sum of logistics costs for the whole launch
    pub fn logistics_total(&self) -> f64 {
        self.freight + self.duty_tax + self.insurance + self.handling
    }

    /// Tooling + certification + label design
    pub fn fixed_costs(&self) -> f64 {
        self.tooling_nre + self.certification_testing + self.label_design
    }
}

/// A launch estimate: parameters plus its purchased inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaunchEstimate {
    pub params: LaunchEstimateParams,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl LaunchEstimate {
    pub fn new(params: LaunchEstimateParams, line_items: Vec<LineItem>) -> Self {
        LaunchEstimate { params, line_items }
    }

    /// Validate and compute this estimate.
    pub fn compute(&self) -> CostingResult<LaunchEstimateResult> {
        compute_rollup(&self.params, &self.line_items)
    }
}

/// Per-unit launch economics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEstimateResult {
    pub material_cost_per_unit: f64,
    pub landed_cost_per_unit: f64,
    pub labor_cost_per_unit: f64,
    pub overhead_per_unit: f64,
    pub contingency_per_unit: f64,
    pub amortized_one_off_per_unit: f64,
    pub total_variable_cost_per_unit: f64,

    /// Tooling + certification + label design
    pub fixed_costs: f64,

    /// Price after channel fees; `None` without a price
    pub net_price_per_unit: Option<f64>,

    /// Price minus total variable cost; may be negative
    pub contribution_margin_per_unit: Option<f64>,

    /// `None` unless the price is positive
    pub gross_margin_pct: Option<f64>,

    /// `None` when the contribution margin is not positive (unreachable).
    /// Otherwise finite and positive, except `Some(0.0)` when there are no
    /// fixed costs: the first unit sold already covers them.
    /// Not rounded; whole-unit display is up to the caller.
    pub break_even_units: Option<f64>,

    /// Line-level material detail and data-quality warnings
    pub rollup: CostRollupResult,
}

impl LaunchEstimateResult {
    /// Whether break-even can be reached at the proposed price
    pub fn break_even_reachable(&self) -> bool {
        self.break_even_units.is_some()
    }
}

/// Spread a launch-wide amount over the target volume; 0 without a volume.
fn landed_per_unit(logistics_total: f64, volume: Option<f64>) -> f64 {
    match volume {
        Some(v) if v > 0.0 => logistics_total / v,
        _ => 0.0,
    }
}

/// One-off costs per unit, never dividing by less than one unit.
fn amortize_one_off(fixed_costs: f64, volume: Option<f64>) -> f64 {
    fixed_costs / volume.unwrap_or(0.0).max(1.0)
}

/// Compute launch economics for an estimate.
///
/// # Arguments
///
/// * `params` - Estimate-level logistics, labor, one-off and pricing inputs
/// * `line_items` - Purchased inputs; `other` lines are shown but not summed
///
/// # Returns
///
/// * `Ok(LaunchEstimateResult)` - always, for structurally valid input
/// * `Err(CostingError::InvalidInput)` - negative costs, out-of-range
///   percentages, missing name, etc.
pub fn compute_rollup(
    params: &LaunchEstimateParams,
    line_items: &[LineItem],
) -> CostingResult<LaunchEstimateResult> {
    params.validate()?;
    validate_line_items(line_items)?;

    let volume = params.target_launch_volume_units;

    // 1. Material, one shared waste rate
    let rollup = rollup_line_items(line_items, Some(params.material_waste_pct.unwrap_or(0.0)));
    let material_cost_per_unit = rollup.material_cost_per_unit;

    // 2. Landed
    let landed_cost_per_unit = landed_per_unit(params.logistics_total(), volume);

    // 3. Labor
    let labor_cost_per_unit = params.labor_rate_per_hour
        * params.labor_hours_per_unit
        * (1.0 + params.labor_learning_pct / 100.0);

    // 4. One-off amortization
    let fixed_costs = params.fixed_costs();
    let amortized_one_off_per_unit = amortize_one_off(fixed_costs, volume);

    // 5. Contingency (not applied to one-off costs)
    let overhead_per_unit = params.overhead_allocation_per_unit;
    let contingency_base =
        material_cost_per_unit + landed_cost_per_unit + labor_cost_per_unit + overhead_per_unit;
    let contingency_per_unit = contingency_base * params.contingency_pct / 100.0;

    // 6. Total variable
    let total_variable_cost_per_unit =
        contingency_base + contingency_per_unit + amortized_one_off_per_unit;

    // 7. Gross margin
    let price = params.proposed_price;
    let net_price_per_unit = price.map(|p| p * (1.0 - params.channel_fees_pct / 100.0));
    let gross_margin_pct = match (price, net_price_per_unit) {
        (Some(p), Some(net)) if p > 0.0 => Some((net - total_variable_cost_per_unit) / p * 100.0),
        _ => None,
    };

    // 8. Break-even
    let contribution_margin_per_unit = price.map(|p| p - total_variable_cost_per_unit);
    let break_even_units = contribution_margin_per_unit
        .filter(|cm| *cm > 0.0)
        .map(|cm| fixed_costs / cm);

    debug!(
        target: "costing.launch",
        estimate = params.name.as_str(),
        material_cost_per_unit,
        total_variable_cost_per_unit,
        ?gross_margin_pct,
        ?break_even_units,
        "Launch rollup computed"
    );

    Ok(LaunchEstimateResult {
        material_cost_per_unit,
        landed_cost_per_unit,
        labor_cost_per_unit,
        overhead_per_unit,
        contingency_per_unit,
        amortized_one_off_per_unit,
        total_variable_cost_per_unit,
        fixed_costs,
        net_price_per_unit,
        contribution_margin_per_unit,
        gross_margin_pct,
        break_even_units,
        rollup,
    })
}
