//! # Line Items
//!
//! Rows consumed by the calculators. Two shapes exist:
//!
//! - [`LineItem`] - a fully priced purchase line used by launch estimates
//! - [`FormulaLine`] - a line of an existing production formula, where the
//!   pack data may not have been recorded yet
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "item_type": "ingredient",
//!   "name": "Glycerin",
//!   "pack_size_value": 1.0,
//!   "pack_size_unit": "L",
//!   "pack_price": 20.0,
//!   "density": 1.26,
//!   "qty_per_output_unit": 50.0,
//!   "qty_per_output_unit_unit": "g"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::units::{Density, Unit};

/// What a line contributes to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Ingredient,
    Packaging,
    /// Informational line (e.g. a label costed elsewhere), never summed
    Other,
}

impl ItemType {
    /// Whether lines of this type count toward material cost
    pub fn is_costed(self) -> bool {
        !matches!(self, ItemType::Other)
    }
}

/// One purchased input of a launch estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub item_type: ItemType,

    /// Display name (e.g., "Glycerin", "30 mL amber bottle")
    pub name: String,

    /// Size of the purchased pack
    pub pack_size_value: f64,

    /// Unit of the purchased pack
    pub pack_size_unit: Unit,

    /// Price paid for one pack
    pub pack_price: f64,

    /// Density in g/mL, needed only when pack and recipe units cross mass/volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<Density>,

    /// Quantity consumed per finished unit
    pub qty_per_output_unit: f64,

    /// Unit of `qty_per_output_unit`
    pub qty_per_output_unit_unit: Unit,

    /// Line-level waste allowance in percent (0 when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waste_pct: Option<f64>,
}

impl LineItem {
    /// Create an ingredient line with no density and no waste.
    pub fn ingredient(
        name: impl Into<String>,
        pack_size_value: f64,
        pack_size_unit: Unit,
        pack_price: f64,
        qty_per_output_unit: f64,
        qty_unit: Unit,
    ) -> Self {
        LineItem {
            item_type: ItemType::Ingredient,
            name: name.into(),
            pack_size_value,
            pack_size_unit,
            pack_price,
            density: None,
            qty_per_output_unit,
            qty_per_output_unit_unit: qty_unit,
            waste_pct: None,
        }
    }

    /// Same line with a different item type
    pub fn with_type(mut self, item_type: ItemType) -> Self {
        self.item_type = item_type;
        self
    }

    /// Same line with a density attached
    pub fn with_density(mut self, g_per_ml: f64) -> Self {
        self.density = Some(Density(g_per_ml));
        self
    }

    /// Same line with a waste allowance
    pub fn with_waste(mut self, waste_pct: f64) -> Self {
        self.waste_pct = Some(waste_pct);
        self
    }
}

/// One line of a production formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaLine {
    pub name: String,

    #[serde(default)]
    pub item_type: ItemType,

    /// Quantity used per finished unit
    pub quantity: f64,

    /// Unit of `quantity`
    pub unit: Unit,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_size_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_size_unit: Option<Unit>,

    /// Price of one source pack; `None` when the item was never priced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<Density>,
}

impl FormulaLine {
    /// Create an unpriced formula line.
    pub fn new(name: impl Into<String>, item_type: ItemType, quantity: f64, unit: Unit) -> Self {
        FormulaLine {
            name: name.into(),
            item_type,
            quantity,
            unit,
            pack_size_value: None,
            pack_size_unit: None,
            pack_price: None,
            density: None,
        }
    }

    /// Attach source pack data
    pub fn with_pack(mut self, size_value: f64, size_unit: Unit, price: f64) -> Self {
        self.pack_size_value = Some(size_value);
        self.pack_size_unit = Some(size_unit);
        self.pack_price = Some(price);
        self
    }

    /// Attach a density in g/mL
    pub fn with_density(mut self, g_per_ml: f64) -> Self {
        self.density = Some(Density(g_per_ml));
        self
    }

    /// Pack size, unit and price, when all three are recorded
    pub fn priced_pack(&self) -> Option<(f64, Unit, f64)> {
        match (self.pack_size_value, self.pack_size_unit, self.pack_price) {
            (Some(size), Some(unit), Some(price)) => Some((size, unit, price)),
            _ => None,
        }
    }
}

/// Declared content of one finished unit (e.g. 30 mL, 250 g, 1 each).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSize {
    pub value: f64,
    pub unit: Unit,
}

impl UnitSize {
    pub fn new(value: f64, unit: Unit) -> Self {
        UnitSize { value, unit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_serialization() {
        assert_eq!(serde_json::to_string(&ItemType::Packaging).unwrap(), "\"packaging\"");
        let t: ItemType = serde_json::from_str("\"other\"").unwrap();
        assert!(!t.is_costed());
    }

    #[test]
    fn test_line_item_defaults_from_json() {
        let json = r#"{
            "name": "Glycerin",
            "pack_size_value": 1.0,
            "pack_size_unit": "L",
            "pack_price": 20.0,
            "qty_per_output_unit": 50.0,
            "qty_per_output_unit_unit": "g"
        }"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Ingredient);
        assert_eq!(item.density, None);
        assert_eq!(item.waste_pct, None);
        assert_eq!(item.pack_size_unit, Unit::L);
    }

    #[test]
    fn test_priced_pack_requires_all_fields() {
        let line = FormulaLine::new("Water", ItemType::Ingredient, 100.0, Unit::G);
        assert!(line.priced_pack().is_none());

        let mut partial = line.clone().with_pack(1.0, Unit::Kg, 2.0);
        partial.pack_price = None;
        assert!(partial.priced_pack().is_none());

        let priced = line.with_pack(1.0, Unit::Kg, 2.0);
        assert_eq!(priced.priced_pack(), Some((1.0, Unit::Kg, 2.0)));
    }
}
