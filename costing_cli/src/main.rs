//! # Costing CLI
//!
//! Terminal front end for the costing engine. Workbooks are JSON files
//! holding formulas and launch estimates; launch estimates can also be
//! computed straight from a standalone JSON file.
//!
//! ```text
//! costing init costing.cwb --owner "Dana" --company "Acme Botanicals"
//! costing import-formula costing.cwb face_oil.json
//! costing formula costing.cwb "Face oil"
//! costing set-unit costing.cwb "Face oil" --size 30 --unit mL --yield 95
//! costing estimate launch.json
//! costing import-estimate costing.cwb launch.json
//! costing estimate costing.cwb "Face oil launch"
//! costing remove costing.cwb "Face oil launch"
//! costing convert 1 L g --density 0.9
//! ```
//!
//! Set `RUST_LOG=costing=debug` (or pass `--verbose`) to see calculation logs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use costing_core::costing::formula::{
    update_formula_unit_settings, FormulaCostingResult, UnitSettingsUpdate,
};
use costing_core::costing::launch::{LaunchEstimate, LaunchEstimateResult};
use costing_core::costing::rollup::{CostWarnings, CostedLine};
use costing_core::file_io::{load_workbook, load_workbook_with_lock_check, save_workbook, FileLock};
use costing_core::units::{convert, Density, Unit};
use costing_core::{CostingError, Formula, Workbook, WorkbookSettings};

#[derive(Parser)]
#[command(name = "costing")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Formula unit costs and launch economics for manufactured products")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON only
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty workbook
    Init {
        workbook: PathBuf,
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "")]
        company: String,
        /// Currency label shown next to amounts
        #[arg(long, default_value = "USD")]
        currency: String,
    },

    /// Add a formula from a JSON file to a workbook
    ImportFormula {
        workbook: PathBuf,
        formula: PathBuf,
        #[arg(long, env = "COSTING_USER", default_value = "costing-cli")]
        user: String,
    },

    /// Show the unit cost summary of a formula
    Formula {
        workbook: PathBuf,
        /// Formula id or name
        formula: String,
    },

    /// Change a formula's unit size and yield, then show the new summary
    SetUnit {
        workbook: PathBuf,
        /// Formula id or name
        formula: String,
        /// Unit size value (requires --unit)
        #[arg(long)]
        size: Option<f64>,
        /// Unit size unit, e.g. g, mL, each (requires --size)
        #[arg(long)]
        unit: Option<String>,
        /// Yield percentage, greater than 0 and at most 999
        #[arg(long = "yield")]
        yield_pct: Option<f64>,
        #[arg(long, env = "COSTING_USER", default_value = "costing-cli")]
        user: String,
    },

    /// Add a launch estimate from a JSON file to a workbook
    ImportEstimate {
        workbook: PathBuf,
        estimate: PathBuf,
        #[arg(long, env = "COSTING_USER", default_value = "costing-cli")]
        user: String,
    },

    /// Compute launch economics from an estimate JSON file, or from an
    /// estimate stored in a workbook when a name or id is given
    Estimate {
        /// Estimate JSON file, or workbook
        source: PathBuf,
        /// Estimate id or name inside the workbook
        estimate: Option<String>,
    },

    /// Remove a formula or launch estimate from a workbook
    Remove {
        workbook: PathBuf,
        /// Formula or estimate id or name
        key: String,
        #[arg(long, env = "COSTING_USER", default_value = "costing-cli")]
        user: String,
    },

    /// Convert a quantity between units
    Convert {
        quantity: f64,
        from: String,
        to: String,
        /// Density in g/mL, needed to cross mass and volume
        #[arg(long)]
        density: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "costing=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        if let Some(costing_error) = e.downcast_ref::<CostingError>() {
            if let Ok(json) = serde_json::to_string_pretty(costing_error) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            if costing_error.is_recoverable() {
                eprintln!();
                eprintln!("The workbook is in use; try again once the other session closes it.");
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Init {
            workbook,
            owner,
            company,
            currency,
        } => {
            if workbook.exists() {
                return Err(anyhow!("{} already exists", workbook.display()));
            }
            let mut wb = Workbook::new(owner, company);
            wb.settings.currency = currency.clone();
            save_workbook(&wb, workbook)?;
            println!("Created {}", workbook.display());
        }

        Command::ImportFormula { workbook, formula, user } => {
            let json = fs::read_to_string(formula)
                .with_context(|| format!("reading {}", formula.display()))?;
            let parsed: Formula = serde_json::from_str(&json)
                .with_context(|| format!("parsing {}", formula.display()))?;
            parsed.validate()?;

            let _lock = FileLock::acquire(workbook, user.as_str())?;
            let mut wb = load_workbook(workbook)?;
            let name = parsed.name.clone();
            let id = wb.add_formula(parsed);
            save_workbook(&wb, workbook)?;
            info!(%id, formula = %name, "Formula imported");
            println!("Imported '{}' as {}", name, id);
        }

        Command::Formula { workbook, formula } => {
            let (wb, lock) = load_workbook_with_lock_check(workbook)?;
            if let Some(lock) = lock {
                eprintln!(
                    "Note: {} is being edited by {} ({})",
                    workbook.display(),
                    lock.user_id,
                    lock.machine
                );
            }
            let id = resolve_formula(&wb, formula)?;
            let f = wb
                .get_formula(&id)
                .ok_or_else(|| CostingError::formula_not_found(formula.as_str()))?;
            let result = f.cost()?;
            report_formula(cli, &wb.settings, &f.name, &result)?;
        }

        Command::SetUnit {
            workbook,
            formula,
            size,
            unit,
            yield_pct,
            user,
        } => {
            let unit = unit.as_deref().map(str::parse::<Unit>).transpose()?;
            let update = UnitSettingsUpdate::new(*size, unit, *yield_pct);

            let _lock = FileLock::acquire(workbook, user.as_str())?;
            let mut wb = load_workbook(workbook)?;
            let id = resolve_formula(&wb, formula)?;
            let result = update_formula_unit_settings(&mut wb, &id, &update)?;
            save_workbook(&wb, workbook)?;

            let name = wb.get_formula(&id).map(|f| f.name.clone()).unwrap_or_default();
            report_formula(cli, &wb.settings, &name, &result)?;
        }

        Command::ImportEstimate { workbook, estimate, user } => {
            let parsed = read_estimate(estimate)?;
            parsed.validate()?;

            let _lock = FileLock::acquire(workbook, user.as_str())?;
            let mut wb = load_workbook(workbook)?;
            let name = parsed.params.name.clone();
            let id = wb.add_estimate(parsed);
            save_workbook(&wb, workbook)?;
            info!(%id, estimate = %name, "Launch estimate imported");
            println!("Imported '{}' as {}", name, id);
        }

        Command::Estimate { source, estimate: None } => {
            let estimate = read_estimate(source)?;
            let result = estimate.compute()?;
            report_estimate(cli, &WorkbookSettings::default(), &estimate, &result)?;
        }

        Command::Estimate {
            source,
            estimate: Some(key),
        } => {
            let wb = load_workbook(source)?;
            let estimate = wb
                .find_estimate(key)
                .and_then(|id| wb.get_estimate(&id))
                .ok_or_else(|| anyhow!("no launch estimate '{}' in {}", key, source.display()))?;
            let result = estimate.compute()?;
            report_estimate(cli, &wb.settings, estimate, &result)?;
        }

        Command::Remove { workbook, key, user } => {
            let _lock = FileLock::acquire(workbook, user.as_str())?;
            let mut wb = load_workbook(workbook)?;
            let removed = if let Some(id) = wb.find_formula(key) {
                wb.remove_formula(&id).map(|f| format!("formula '{}'", f.name))
            } else if let Some(id) = wb.find_estimate(key) {
                wb.remove_estimate(&id).map(|e| format!("launch estimate '{}'", e.params.name))
            } else {
                None
            };
            let removed = removed.ok_or_else(|| {
                anyhow!("no formula or launch estimate '{}' in {}", key, workbook.display())
            })?;
            save_workbook(&wb, workbook)?;
            println!("Removed {}", removed);
        }

        Command::Convert {
            quantity,
            from,
            to,
            density,
        } => {
            let from: Unit = from.parse()?;
            let to: Unit = to.parse()?;
            let converted =
                convert(*quantity, from, to, density.map(Density)).map_err(CostingError::from)?;
            println!("{} {} = {} {}", quantity, from, converted, to);
        }
    }
    Ok(())
}

fn read_estimate(path: &Path) -> Result<LaunchEstimate> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

fn resolve_formula(wb: &Workbook, key: &str) -> Result<uuid::Uuid> {
    wb.find_formula(key)
        .ok_or_else(|| CostingError::formula_not_found(key).into())
}

// ============================================================================
// Reports
// ============================================================================

const RULE: &str = "═══════════════════════════════════════";

fn banner(title: &str) {
    println!("{}", RULE);
    println!("  {}", title);
    println!("{}", RULE);
}

fn print_lines(settings: &WorkbookSettings, heading: &str, lines: &[CostedLine]) {
    if lines.is_empty() {
        return;
    }
    println!("{}:", heading);
    for line in lines {
        let marker = if line.included { "" } else { " (not summed)" };
        println!(
            "  {:<28} {:>10.3} {:<4} {:>14}{}",
            line.name,
            line.qty_base_units,
            line.base_unit,
            settings.format_amount(line.material_cost_per_output_unit),
            marker
        );
    }
    println!();
}

fn print_warnings(warnings: &CostWarnings) {
    if warnings.is_empty() {
        return;
    }
    println!("Warnings (lines costed at zero):");
    for name in &warnings.missing_prices {
        println!("  [PRICE]   {} has no usable price", name);
    }
    for name in &warnings.missing_densities {
        println!("  [DENSITY] {} needs a density to convert units", name);
    }
    for name in &warnings.incompatible_units {
        println!("  [UNITS]   {} mixes count and mass/volume units", name);
    }
    println!();
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| "N/A".to_string())
}

fn report_formula(
    cli: &Cli,
    settings: &WorkbookSettings,
    name: &str,
    result: &FormulaCostingResult,
) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    banner(&format!("FORMULA UNIT COST: {}", name));
    println!();
    let unit_size = result
        .header
        .unit_size
        .map(|s| format!("{} {}", s.value, s.unit));
    println!("Unit size: {}", or_na(unit_size));
    println!("Yield:     {}", or_na(result.header.yield_pct.map(|y| format!("{}%", y))));
    println!();

    print_lines(settings, "Ingredients", &result.breakdown.ingredients);
    print_lines(settings, "Packaging", &result.breakdown.packaging);

    let t = &result.totals;
    println!("Ingredients subtotal: {}", settings.format_amount(t.ingredients_subtotal));
    println!("Packaging subtotal:   {}", settings.format_amount(t.packaging_subtotal));
    println!("Total unit cost:      {}", settings.format_amount(t.total_unit_cost));
    let per_content = t
        .cost_per_content_unit
        .zip(t.content_unit)
        .map(|(cost, unit)| format!("{:.5} {} / {}", cost, settings.currency, unit));
    println!("Cost per content:     {}", or_na(per_content));
    println!();

    print_warnings(&result.warnings);
    println!("{}", RULE);
    Ok(())
}

fn report_estimate(
    cli: &Cli,
    settings: &WorkbookSettings,
    estimate: &LaunchEstimate,
    result: &LaunchEstimateResult,
) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    banner(&format!("LAUNCH ESTIMATE: {}", estimate.params.name));
    println!();
    print_lines(settings, "Materials", &result.rollup.lines);

    let money = |v: f64| settings.format_amount(v);
    println!("Per unit:");
    println!("  Material:        {:>16}", money(result.material_cost_per_unit));
    println!("  Landed:          {:>16}", money(result.landed_cost_per_unit));
    println!("  Labor:           {:>16}", money(result.labor_cost_per_unit));
    println!("  Overhead:        {:>16}", money(result.overhead_per_unit));
    println!("  Contingency:     {:>16}", money(result.contingency_per_unit));
    println!("  One-off (amort): {:>16}", money(result.amortized_one_off_per_unit));
    println!("  Total variable:  {:>16}", money(result.total_variable_cost_per_unit));
    println!();
    println!("Fixed launch costs: {}", money(result.fixed_costs));
    let margin = result.gross_margin_pct.map(|m| format!("{:.1}%", m));
    println!("Gross margin:       {}", or_na(margin));
    println!(
        "Break-even:         {}",
        result
            .break_even_units
            .map(|u| format!("{} units", u.ceil()))
            .unwrap_or_else(|| "unreachable at this price".to_string())
    );
    println!();

    print_warnings(&result.rollup.warnings);
    println!("{}", RULE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_set_unit() {
        let cli = Cli::try_parse_from([
            "costing", "set-unit", "wb.cwb", "Face oil", "--size", "30", "--unit", "mL", "--yield",
            "95",
        ])
        .unwrap();
        match cli.command {
            Command::SetUnit { size, unit, yield_pct, .. } => {
                assert_eq!(size, Some(30.0));
                assert_eq!(unit.as_deref(), Some("mL"));
                assert_eq!(yield_pct, Some(95.0));
            }
            _ => panic!("expected set-unit"),
        }
    }

    #[test]
    fn test_cli_parses_convert() {
        let args = ["costing", "convert", "1", "L", "g", "--density", "0.9"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Convert { density: Some(d), .. } if d == 0.9));
    }

    #[test]
    fn test_cli_parses_estimate_sources() {
        let cli = Cli::try_parse_from(["costing", "estimate", "launch.json"]).unwrap();
        assert!(matches!(cli.command, Command::Estimate { estimate: None, .. }));

        let cli = Cli::try_parse_from(["costing", "estimate", "wb.cwb", "Spring candle"]).unwrap();
        match cli.command {
            Command::Estimate { source, estimate } => {
                assert_eq!(source, PathBuf::from("wb.cwb"));
                assert_eq!(estimate.as_deref(), Some("Spring candle"));
            }
            _ => panic!("expected estimate"),
        }
    }

    #[test]
    fn test_resolve_unknown_formula() {
        let wb = Workbook::default();
        assert!(resolve_formula(&wb, "missing").is_err());
    }
}
