//! Worked costing scenarios, checked by hand against the published formulas.

use costing_core::costing::formula::{
    compute_formula_unit_cost, update_formula_unit_settings, UnitSettingsUpdate,
};
use costing_core::costing::launch::{compute_rollup, LaunchEstimateParams};
use costing_core::costing::rollup::rollup_line_items;
use costing_core::units::{compute_cost_per_base_unit, Dimension};
use costing_core::{
    CostingError, Density, Formula, FormulaLine, ItemType, LineItem, Unit, UnitSize, Workbook,
};

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}

#[test]
fn scenario_a_mass_pack_with_waste() {
    // 1000 g for $50, 200 g per unit, 5% waste
    let cocoa = LineItem::ingredient("Cocoa powder", 1000.0, Unit::G, 50.0, 200.0, Unit::G);
    let items = vec![cocoa.with_waste(5.0)];
    let result = rollup_line_items(&items, None);
    assert_close(result.material_cost_per_unit, 10.50, 1e-9);
    assert!(result.warnings.is_empty());
}

#[test]
fn scenario_b_liquid_pack_costed_by_mass() {
    // 1 L for $20 at 0.9 g/mL, 50 g per unit
    let density = Some(Density(0.9));
    let per_g = compute_cost_per_base_unit(20.0, 1.0, Unit::L, Dimension::Mass, density).unwrap();
    assert_close(per_g, 0.02222, 1e-5);

    let glycerin = LineItem::ingredient("Glycerin", 1.0, Unit::L, 20.0, 50.0, Unit::G);
    let items = vec![glycerin.with_density(0.9)];
    let result = rollup_line_items(&items, None);
    assert_close(result.material_cost_per_unit, 1.11, 0.005);
}

/// Material $2, landed $0.50, labor $0.30, overhead $0.10 per unit.
fn scenario_c_params() -> (LaunchEstimateParams, Vec<LineItem>) {
    let params = LaunchEstimateParams {
        target_launch_volume_units: Some(1000.0),
        freight: 500.0,
        labor_rate_per_hour: 30.0,
        labor_hours_per_unit: 0.01,
        overhead_allocation_per_unit: 0.10,
        contingency_pct: 10.0,
        proposed_price: Some(10.0),
        channel_fees_pct: 5.0,
        ..LaunchEstimateParams::new("Scenario C")
    };
    let items = vec![LineItem::ingredient("Resin", 1.0, Unit::Kg, 20.0, 100.0, Unit::G)];
    (params, items)
}

#[test]
fn scenario_c_variable_cost_and_margin() {
    let (params, items) = scenario_c_params();
    let r = compute_rollup(&params, &items).unwrap();

    assert_close(r.material_cost_per_unit, 2.0, 1e-9);
    assert_close(r.landed_cost_per_unit, 0.5, 1e-12);
    assert_close(r.labor_cost_per_unit, 0.3, 1e-12);
    assert_close(r.amortized_one_off_per_unit, 0.0, 0.0);
    assert_close(r.total_variable_cost_per_unit, 3.19, 1e-9);
    assert_close(r.gross_margin_pct.unwrap(), 63.1, 1e-9);
}

#[test]
fn scenario_d_break_even() {
    // $10,000 fixed, $10 price, $4 variable. The one-off costs amortize into
    // the variable cost too, so spread them over a large volume and make up
    // the rest with overhead.
    let params = LaunchEstimateParams {
        target_launch_volume_units: Some(1_000_000.0),
        overhead_allocation_per_unit: 3.99,
        tooling_nre: 10_000.0,
        proposed_price: Some(10.0),
        ..LaunchEstimateParams::new("Scenario D")
    };
    let r = compute_rollup(&params, &[]).unwrap();
    assert_close(r.fixed_costs, 10_000.0, 0.0);
    assert_close(r.total_variable_cost_per_unit, 4.0, 1e-9);

    let units = r.break_even_units.unwrap();
    assert_close(units, 10_000.0 / 6.0, 1e-6);
    assert_eq!(units.ceil(), 1667.0);
}

#[test]
fn yield_of_zero_is_rejected_on_edit_but_neutral_on_read() {
    let lines = vec![FormulaLine::new("Beeswax", ItemType::Ingredient, 10.0, Unit::G)
        .with_pack(1.0, Unit::Kg, 30.0)];

    let read = compute_formula_unit_cost(&lines, None, Some(0.0));
    assert_close(read.totals.total_unit_cost, 0.3, 1e-12);

    let mut workbook = Workbook::default();
    let mut formula = Formula::new("Lip balm");
    formula.lines = lines;
    let id = workbook.add_formula(formula);

    let update = UnitSettingsUpdate::new(None, None, Some(0.0));
    let err = update_formula_unit_settings(&mut workbook, &id, &update).unwrap_err();
    assert!(matches!(err, CostingError::InvalidInput { ref field, .. } if field == "yield_pct"));
}

#[test]
fn formula_summary_end_to_end() {
    let mut workbook = Workbook::default();
    let formula = Formula::new("Face oil")
        .with_line(
            FormulaLine::new("Jojoba oil", ItemType::Ingredient, 27.0, Unit::G)
                .with_pack(1.0, Unit::L, 36.0)
                .with_density(0.9),
        )
        .with_line(
            FormulaLine::new("Vitamin E", ItemType::Ingredient, 0.3, Unit::Ml)
                .with_pack(100.0, Unit::G, 15.0),
        )
        .with_line(
            FormulaLine::new("Dropper bottle", ItemType::Packaging, 1.0, Unit::Each)
                .with_pack(24.0, Unit::Each, 18.0),
        )
        .with_line(FormulaLine::new("Carton", ItemType::Packaging, 1.0, Unit::Each));
    let id = workbook.add_formula(formula);

    let update = UnitSettingsUpdate::new(Some(30.0), Some(Unit::Ml), Some(95.0));
    let result = update_formula_unit_settings(&mut workbook, &id, &update).unwrap();

    // Jojoba: 27 g × 36/900 = 1.08. Vitamin E needs a density, bottle 0.75.
    assert_close(result.totals.ingredients_subtotal, 1.08, 1e-9);
    assert_close(result.totals.packaging_subtotal, 0.75, 1e-12);
    assert_close(result.totals.total_unit_cost, 1.83 / 0.95, 1e-9);
    assert_close(result.totals.cost_per_content_unit.unwrap(), 1.83 / 0.95 / 30.0, 1e-9);
    assert_eq!(result.totals.content_unit, Some(Unit::Ml));
    assert_eq!(result.warnings.missing_densities, vec!["Vitamin E".to_string()]);
    assert_eq!(result.warnings.missing_prices, vec!["Carton".to_string()]);
    assert_eq!(result.header.unit_size, Some(UnitSize::new(30.0, Unit::Ml)));
}

#[test]
fn results_serialize_nulls_for_undefined_outcomes() {
    let params = LaunchEstimateParams::new("No price yet");
    let r = compute_rollup(&params, &[]).unwrap();
    let json = serde_json::to_value(&r).unwrap();
    assert!(json["gross_margin_pct"].is_null());
    assert!(json["break_even_units"].is_null());
}
