//! The module responsible for writing output data to disk.
use crate::results::{DispatchResults, DispatchRow};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "microsizer_results";

/// The output file name for the hourly dispatch schedule
const DISPATCH_FILE_NAME: &str = "optimal_dispatch.csv";

/// The output file name for the sizing decisions
const SIZING_FILE_NAME: &str = "sizing.csv";

/// The output file name for the cost breakdown
const COSTS_FILE_NAME: &str = "cost_summary.csv";

/// The output file name for aggregate performance indicators
const KPIS_FILE_NAME: &str = "kpis.csv";

/// Get the default output folder for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model specified at `model_dir`.
pub fn create_output_directory(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        // already exists
        return Ok(());
    }

    fs::create_dir_all(output_dir)?;

    Ok(())
}

/// Represents a row in the dispatch CSV file.
///
/// The column headers are shared with downstream plotting tools, hence the
/// non-standard names.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DispatchFileRow {
    #[serde(rename = "Hour")]
    hour: usize,
    #[serde(rename = "Load (kWh)")]
    load: f64,
    #[serde(rename = "Solar Production (kWh)")]
    solar_production: f64,
    #[serde(rename = "Curtailment (kWh)")]
    curtailment: f64,
    #[serde(rename = "Battery Charge (kWh)")]
    battery_charge: f64,
    #[serde(rename = "Battery Discharge (kWh)")]
    battery_discharge: f64,
    #[serde(rename = "State of Charge (kWh)")]
    state_of_charge: f64,
    #[serde(rename = "Lost Load (kWh)")]
    lost_load: f64,
    #[serde(rename = "Generator Production (kWh)")]
    generator_production: Option<f64>,
    #[serde(rename = "Fuel Consumption (l)")]
    fuel_consumption: Option<f64>,
    #[serde(rename = "Generator Efficiency")]
    generator_efficiency: Option<f64>,
    #[serde(rename = "Generator Load Factor")]
    generator_load_factor: Option<f64>,
}

impl From<&DispatchRow> for DispatchFileRow {
    fn from(row: &DispatchRow) -> Self {
        Self {
            hour: row.hour,
            load: row.load,
            solar_production: row.solar_production,
            curtailment: row.curtailment,
            battery_charge: row.battery_charge,
            battery_discharge: row.battery_discharge,
            state_of_charge: row.state_of_charge,
            lost_load: row.lost_load,
            generator_production: row.generator_production,
            fuel_consumption: row.fuel_consumption,
            generator_efficiency: row.generator_efficiency,
            generator_load_factor: row.generator_load_factor,
        }
    }
}

/// Represents a row in the sizing CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SizingRow {
    component: String,
    units: f64,
    capacity: f64,
}

/// Represents the single row of the cost summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CostSummaryRow {
    currency: String,
    capex: f64,
    subsidies: f64,
    replacement_npv: f64,
    opex_npv: f64,
    salvage_npv: f64,
    npc: f64,
}

/// Represents a row in the KPIs CSV file.
///
/// Long format, one metric per row; metrics that are undefined for the solved
/// design are omitted.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct KpiRow {
    metric: String,
    value: f64,
}

/// Write all results for a solved model to CSV files in `output_dir`.
///
/// # Arguments
///
/// * `output_dir` - The folder in which files will be saved
/// * `currency` - The currency label for the cost summary
/// * `results` - The extracted results of the run
pub fn write_results(output_dir: &Path, currency: &str, results: &DispatchResults) -> Result<()> {
    write_dispatch(output_dir, &results.rows)?;
    write_sizing(output_dir, results)?;
    write_costs(output_dir, currency, results)?;
    write_kpis(output_dir, results)?;

    Ok(())
}

fn write_dispatch(output_dir: &Path, rows: &[DispatchRow]) -> Result<()> {
    let file_path = output_dir.join(DISPATCH_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(DispatchFileRow::from(row))?;
    }
    writer.flush()?;

    Ok(())
}

fn write_sizing(output_dir: &Path, results: &DispatchResults) -> Result<()> {
    let file_path = output_dir.join(SIZING_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;

    let sizing = &results.sizing;
    writer.serialize(SizingRow {
        component: "solar".into(),
        units: sizing.solar_units,
        capacity: sizing.solar_capacity,
    })?;
    writer.serialize(SizingRow {
        component: "battery".into(),
        units: sizing.battery_units,
        capacity: sizing.battery_capacity,
    })?;
    if let (Some(units), Some(capacity)) = (sizing.generator_units, sizing.generator_capacity) {
        writer.serialize(SizingRow {
            component: "generator".into(),
            units,
            capacity,
        })?;
    }
    writer.flush()?;

    Ok(())
}

fn write_costs(output_dir: &Path, currency: &str, results: &DispatchResults) -> Result<()> {
    let file_path = output_dir.join(COSTS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;

    let costs = &results.costs;
    writer.serialize(CostSummaryRow {
        currency: currency.into(),
        capex: costs.capex,
        subsidies: costs.subsidies,
        replacement_npv: costs.replacement_npv,
        opex_npv: costs.opex_npv,
        salvage_npv: costs.salvage_npv,
        npc: costs.npc,
    })?;
    writer.flush()?;

    Ok(())
}

fn write_kpis(output_dir: &Path, results: &DispatchResults) -> Result<()> {
    let file_path = output_dir.join(KPIS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;

    let kpis = &results.kpis;
    let metrics = [
        ("solar_production_total", Some(kpis.solar_production_total)),
        (
            "generator_production_total",
            kpis.generator_production_total,
        ),
        ("fuel_consumption_total", kpis.fuel_consumption_total),
        ("lost_load_total", Some(kpis.lost_load_total)),
        ("renewable_share", kpis.renewable_share),
        ("generator_load_factor", kpis.generator_load_factor),
        (
            "specific_fuel_consumption",
            kpis.specific_fuel_consumption,
        ),
    ];
    for (metric, value) in metrics {
        if let Some(value) = value {
            writer.serialize(KpiRow {
                metric: metric.into(),
                value,
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}
