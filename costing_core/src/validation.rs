//! # Input Validation
//!
//! Shape and range checks run before any calculator does arithmetic. A
//! failure returns [`CostingError::InvalidInput`] (or `MissingField`) naming
//! the offending field by path, e.g. `line_items[2].pack_price`, so the
//! message can be shown to the user as is. Validation never mutates input.
//!
//! ## Example
//!
//! ```rust
//! use costing_core::line_items::LineItem;
//! use costing_core::units::Unit;
//!
//! let mut item = LineItem::ingredient("Shea butter", 1.0, Unit::Kg, 18.0, 25.0, Unit::G);
//! assert!(item.validate().is_ok());
//!
//! item.pack_price = -1.0;
//! let err = item.validate().unwrap_err();
//! assert!(err.to_string().contains("line_item.pack_price"));
//! ```

use crate::costing::formula::UnitSettingsUpdate;
use crate::costing::launch::{LaunchEstimate, LaunchEstimateParams};
use crate::errors::{CostingError, CostingResult};
use crate::line_items::{FormulaLine, LineItem};
use crate::units::Density;

/// Upper bound for waste, contingency and learning-curve percentages
pub const MAX_ALLOWANCE_PCT: f64 = 1000.0;

/// Upper bound for channel fees (a fee above 100% of price is nonsense)
pub const MAX_FEES_PCT: f64 = 100.0;

/// Upper bound for yield percentages on the settings edit path
pub const MAX_YIELD_PCT: f64 = 999.0;

/// Smallest non-zero amount, size, price or density accepted
pub const MIN_MAGNITUDE: f64 = 1e-9;

/// Largest amount, size, price or density accepted. Together with
/// [`MIN_MAGNITUDE`] this keeps every quotient and product the calculators
/// form well inside the finite `f64` range.
pub const MAX_MAGNITUDE: f64 = 1e12;

// ============================================================================
// Field checks
// ============================================================================

fn require_finite(field: &str, value: f64) -> CostingResult<()> {
    if !value.is_finite() {
        return Err(CostingError::invalid_input(
            field,
            value.to_string(),
            "Value must be a finite number",
        ));
    }
    Ok(())
}

fn require_magnitude(field: &str, value: f64) -> CostingResult<()> {
    if value != 0.0 && !(MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&value) {
        return Err(CostingError::invalid_input(
            field,
            value.to_string(),
            format!("Value must be 0 or between {} and {}", MIN_MAGNITUDE, MAX_MAGNITUDE),
        ));
    }
    Ok(())
}

/// Reject negative, non-finite or out-of-range values.
pub fn require_non_negative(field: &str, value: f64) -> CostingResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(CostingError::invalid_input(
            field,
            value.to_string(),
            "Value cannot be negative",
        ));
    }
    require_magnitude(field, value)
}

/// Reject zero, negative, non-finite or out-of-range values.
pub fn require_positive(field: &str, value: f64) -> CostingResult<()> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(CostingError::invalid_input(
            field,
            value.to_string(),
            "Value must be positive",
        ));
    }
    require_magnitude(field, value)
}

/// Require a percentage in `[0, max]`.
pub fn require_percent(field: &str, value: f64, max: f64) -> CostingResult<()> {
    require_finite(field, value)?;
    if !(0.0..=max).contains(&value) {
        return Err(CostingError::invalid_input(
            field,
            value.to_string(),
            format!("Percentage must be between 0 and {}", max),
        ));
    }
    Ok(())
}

/// Require a yield percentage in `(0, 999]`.
pub fn require_yield(field: &str, value: f64) -> CostingResult<()> {
    require_finite(field, value)?;
    if value <= 0.0 || value > MAX_YIELD_PCT {
        return Err(CostingError::invalid_input(
            field,
            value.to_string(),
            format!("Yield must be greater than 0 and at most {}", MAX_YIELD_PCT),
        ));
    }
    require_magnitude(field, value)
}

/// Require a non-blank identifier.
pub fn require_name(field: &str, value: &str) -> CostingResult<()> {
    if value.trim().is_empty() {
        return Err(CostingError::missing_field(field));
    }
    Ok(())
}

fn require_density(field: &str, density: Option<Density>) -> CostingResult<()> {
    match density {
        Some(d) => require_positive(field, d.value()),
        None => Ok(()),
    }
}

fn path(prefix: &str, field: &str) -> String {
    format!("{}.{}", prefix, field)
}

// ============================================================================
// Inputs
// ============================================================================

impl LineItem {
    /// Validate a standalone line item.
    pub fn validate(&self) -> CostingResult<()> {
        self.validate_at("line_item")
    }

    /// Validate with field paths rooted at `prefix` (e.g. `line_items[3]`).
    pub fn validate_at(&self, prefix: &str) -> CostingResult<()> {
        require_name(&path(prefix, "name"), &self.name)?;
        require_non_negative(&path(prefix, "pack_size_value"), self.pack_size_value)?;
        require_non_negative(&path(prefix, "pack_price"), self.pack_price)?;
        require_non_negative(&path(prefix, "qty_per_output_unit"), self.qty_per_output_unit)?;
        require_density(&path(prefix, "density"), self.density)?;
        if let Some(waste) = self.waste_pct {
            require_percent(&path(prefix, "waste_pct"), waste, MAX_ALLOWANCE_PCT)?;
        }
        Ok(())
    }
}

impl FormulaLine {
    /// Validate a formula line. Missing pack data is allowed here; it
    /// becomes a warning at costing time.
    pub fn validate_at(&self, prefix: &str) -> CostingResult<()> {
        require_name(&path(prefix, "name"), &self.name)?;
        require_non_negative(&path(prefix, "quantity"), self.quantity)?;
        if let Some(size) = self.pack_size_value {
            require_non_negative(&path(prefix, "pack_size_value"), size)?;
        }
        if let Some(price) = self.pack_price {
            require_non_negative(&path(prefix, "pack_price"), price)?;
        }
        require_density(&path(prefix, "density"), self.density)
    }
}

impl LaunchEstimateParams {
    /// Validate estimate-level parameters.
    pub fn validate(&self) -> CostingResult<()> {
        require_name("name", &self.name)?;

        if let Some(volume) = self.target_launch_volume_units {
            require_non_negative("target_launch_volume_units", volume)?;
        }
        if let Some(waste) = self.material_waste_pct {
            require_percent("material_waste_pct", waste, MAX_ALLOWANCE_PCT)?;
        }

        let costs = [
            ("freight", self.freight),
            ("duty_tax", self.duty_tax),
            ("insurance", self.insurance),
            ("handling", self.handling),
            ("labor_rate_per_hour", self.labor_rate_per_hour),
            ("labor_hours_per_unit", self.labor_hours_per_unit),
            ("overhead_allocation_per_unit", self.overhead_allocation_per_unit),
            ("tooling_nre", self.tooling_nre),
            ("certification_testing", self.certification_testing),
            ("label_design", self.label_design),
        ];
        for (field, value) in costs {
            require_non_negative(field, value)?;
        }

        require_percent("labor_learning_pct", self.labor_learning_pct, MAX_ALLOWANCE_PCT)?;
        require_percent("contingency_pct", self.contingency_pct, MAX_ALLOWANCE_PCT)?;
        require_percent("channel_fees_pct", self.channel_fees_pct, MAX_FEES_PCT)?;

        if let Some(price) = self.proposed_price {
            require_non_negative("proposed_price", price)?;
        }
        Ok(())
    }
}

/// Validate every line item, with paths like `line_items[3].pack_price`.
pub fn validate_line_items(items: &[LineItem]) -> CostingResult<()> {
    for (i, item) in items.iter().enumerate() {
        item.validate_at(&format!("line_items[{}]", i))?;
    }
    Ok(())
}

impl LaunchEstimate {
    /// Validate parameters and every line item.
    pub fn validate(&self) -> CostingResult<()> {
        self.params.validate()?;
        validate_line_items(&self.line_items)
    }
}

impl UnitSettingsUpdate {
    /// Unit size value and unit must come together; yield must lie in (0, 999].
    pub fn validate(&self) -> CostingResult<()> {
        match (self.unit_size_value, self.unit_size_unit) {
            (Some(value), Some(_)) => require_positive("unit_size_value", value)?,
            (None, None) => {}
            (Some(_), None) => return Err(CostingError::missing_field("unit_size_unit")),
            (None, Some(_)) => return Err(CostingError::missing_field("unit_size_value")),
        }
        if let Some(yield_pct) = self.yield_pct {
            require_yield("yield_pct", yield_pct)?;
        }
        Ok(())
    }
}
