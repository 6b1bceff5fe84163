//! # Unit Types
//!
//! Dimensional conversion between mass, volume and count units. Every cost
//! calculation is carried out in the base unit of one dimension:
//!
//! - Mass: grams (g)
//! - Volume: milliliters (mL)
//! - Count: each
//!
//! Same-dimension conversions are a multiplication by a fixed factor.
//! Mass and volume can be crossed with an ingredient [`Density`] in g/mL;
//! count never converts to either. No rounding is applied here, display
//! formatting is left to the caller.
//!
//! ## Example
//!
//! ```rust
//! use costing_core::units::{convert, to_base_unit, Density, Unit};
//!
//! assert_eq!(to_base_unit(2.5, Unit::Kg), 2500.0);
//!
//! // 1 L of a liquid at 0.9 g/mL weighs 900 g
//! let grams = convert(1.0, Unit::L, Unit::G, Some(Density(0.9))).unwrap();
//! assert!((grams - 900.0).abs() < 1e-9);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{ConversionError, CostingError};

// ============================================================================
// Conversion Factors (to base unit)
// ============================================================================

/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per avoirdupois ounce
pub const G_PER_OZ: f64 = 28.3495;
/// Grams per pound
pub const G_PER_LB: f64 = 453.592;
/// Milliliters per liter
pub const ML_PER_L: f64 = 1000.0;
/// Milliliters per US gallon
pub const ML_PER_GAL: f64 = 3785.41;

// ============================================================================
// Dimensions and Units
// ============================================================================

/// Physical dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

impl Dimension {
    /// Canonical unit all arithmetic in this dimension is done in
    pub fn base_unit(self) -> Unit {
        match self {
            Dimension::Mass => Unit::G,
            Dimension::Volume => Unit::Ml,
            Dimension::Count => Unit::Each,
        }
    }
}

/// A unit of measure. Each unit belongs to exactly one [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    G,
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "oz")]
    Oz,
    #[serde(rename = "lb")]
    Lb,
    #[serde(rename = "mL", alias = "ml")]
    Ml,
    #[serde(rename = "L", alias = "l")]
    L,
    #[serde(rename = "gal")]
    Gal,
    #[serde(rename = "each", alias = "unit")]
    Each,
}

impl Unit {
    /// All supported units, mass first, then volume, then count
    pub const ALL: [Unit; 8] = [
        Unit::G,
        Unit::Kg,
        Unit::Oz,
        Unit::Lb,
        Unit::Ml,
        Unit::L,
        Unit::Gal,
        Unit::Each,
    ];

    /// Dimension this unit measures
    pub fn dimension(self) -> Dimension {
        match self {
            Unit::G | Unit::Kg | Unit::Oz | Unit::Lb => Dimension::Mass,
            Unit::Ml | Unit::L | Unit::Gal => Dimension::Volume,
            Unit::Each => Dimension::Count,
        }
    }

    /// Multiplier that takes a quantity in this unit to its base unit
    pub fn factor_to_base(self) -> f64 {
        match self {
            Unit::G | Unit::Ml | Unit::Each => 1.0,
            Unit::Kg => G_PER_KG,
            Unit::Oz => G_PER_OZ,
            Unit::Lb => G_PER_LB,
            Unit::L => ML_PER_L,
            Unit::Gal => ML_PER_GAL,
        }
    }

    /// Canonical display symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::G => "g",
            Unit::Kg => "kg",
            Unit::Oz => "oz",
            Unit::Lb => "lb",
            Unit::Ml => "mL",
            Unit::L => "L",
            Unit::Gal => "gal",
            Unit::Each => "each",
        }
    }

    /// True for mass and volume units, the ones a content size can be quoted in
    pub fn is_content_measure(self) -> bool {
        matches!(self.dimension(), Dimension::Mass | Dimension::Volume)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Lowercase spellings accepted from user input
static UNIT_ALIASES: Lazy<HashMap<&'static str, Unit>> = Lazy::new(|| {
    let table: [(&str, Unit); 27] = [
        ("g", Unit::G),
        ("gram", Unit::G),
        ("grams", Unit::G),
        ("kg", Unit::Kg),
        ("kilogram", Unit::Kg),
        ("kilograms", Unit::Kg),
        ("oz", Unit::Oz),
        ("ounce", Unit::Oz),
        ("ounces", Unit::Oz),
        ("lb", Unit::Lb),
        ("lbs", Unit::Lb),
        ("pound", Unit::Lb),
        ("pounds", Unit::Lb),
        ("ml", Unit::Ml),
        ("milliliter", Unit::Ml),
        ("milliliters", Unit::Ml),
        ("l", Unit::L),
        ("liter", Unit::L),
        ("liters", Unit::L),
        ("litre", Unit::L),
        ("gal", Unit::Gal),
        ("gallon", Unit::Gal),
        ("gallons", Unit::Gal),
        ("each", Unit::Each),
        ("ea", Unit::Each),
        ("unit", Unit::Each),
        ("units", Unit::Each),
    ];
    table.into_iter().collect()
});

impl FromStr for Unit {
    type Err = CostingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UNIT_ALIASES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| CostingError::UnknownUnit {
                symbol: s.to_string(),
            })
    }
}

// ============================================================================
// Density
// ============================================================================

/// Ingredient density in grams per milliliter.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Density(pub f64);

impl Density {
    /// Get the raw g/mL value
    pub fn value(self) -> f64 {
        self.0
    }

    /// Non-positive densities cannot cross dimensions and count as absent
    fn usable(self) -> Option<f64> {
        (self.0 > 0.0 && self.0.is_finite()).then_some(self.0)
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert a quantity to the base unit of its own dimension.
///
/// ```rust
/// use costing_core::units::{to_base_unit, Unit};
///
/// assert_eq!(to_base_unit(2.0, Unit::L), 2000.0);
/// assert_eq!(to_base_unit(3.0, Unit::Each), 3.0);
/// ```
pub fn to_base_unit(quantity: f64, unit: Unit) -> f64 {
    quantity * unit.factor_to_base()
}

/// Convert a base-unit quantity back to `unit`.
pub fn from_base_unit(quantity: f64, unit: Unit) -> f64 {
    quantity / unit.factor_to_base()
}

/// Convert a quantity into the base unit of `target`, crossing mass and
/// volume through `density` when the dimensions differ.
///
/// # Errors
///
/// * [`ConversionError::MissingDensity`] - mass/volume crossing without a density
/// * [`ConversionError::Incompatible`] - count to or from mass/volume
pub fn to_base_unit_in(
    quantity: f64,
    unit: Unit,
    target: Dimension,
    density: Option<Density>,
) -> Result<f64, ConversionError> {
    let base = to_base_unit(quantity, unit);
    let from = unit.dimension();
    if from == target {
        return Ok(base);
    }

    let missing = ConversionError::MissingDensity { from: unit, to: target };
    match (from, target) {
        (Dimension::Mass, Dimension::Volume) => {
            density.and_then(Density::usable).map(|d| base / d).ok_or(missing)
        }
        (Dimension::Volume, Dimension::Mass) => {
            density.and_then(Density::usable).map(|d| base * d).ok_or(missing)
        }
        _ => Err(ConversionError::Incompatible { from: unit, to: target }),
    }
}

/// Convert between any two units.
pub fn convert(
    quantity: f64,
    from: Unit,
    to: Unit,
    density: Option<Density>,
) -> Result<f64, ConversionError> {
    let base = to_base_unit_in(quantity, from, to.dimension(), density)?;
    Ok(from_base_unit(base, to))
}

/// Price per base unit of `basis` for a purchased pack.
///
/// A pack with zero size has no cost basis and yields 0 rather than a
/// division fault; callers report such lines as missing a price.
///
/// ```rust
/// use costing_core::units::{compute_cost_per_base_unit, Density, Dimension, Unit};
///
/// // $20 for 1 L at 0.9 g/mL, costed per gram
/// let density = Some(Density(0.9));
/// let per_g = compute_cost_per_base_unit(20.0, 1.0, Unit::L, Dimension::Mass, density).unwrap();
/// assert!((per_g - 20.0 / 900.0).abs() < 1e-12);
/// ```
pub fn compute_cost_per_base_unit(
    pack_price: f64,
    pack_size_value: f64,
    pack_size_unit: Unit,
    basis: Dimension,
    density: Option<Density>,
) -> Result<f64, ConversionError> {
    if pack_size_value == 0.0 {
        return Ok(0.0);
    }
    let pack_base = to_base_unit_in(pack_size_value, pack_size_unit, basis, density)?;
    if pack_base == 0.0 {
        return Ok(0.0);
    }
    Ok(pack_price / pack_base)
}
