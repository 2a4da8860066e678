//! Code for reading the hourly time series and the generator efficiency curve.
use super::{input_err_msg, read_vec_from_csv};
use crate::model::HOURS_PER_YEAR;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const LOAD_FILE_NAME: &str = "load.csv";
const SOLAR_FILE_NAME: &str = "solar.csv";
const FUEL_CURVE_FILE_NAME: &str = "fuel_curve.csv";

/// A row of the hourly load file
#[derive(Debug, Deserialize, PartialEq)]
struct LoadRow {
    /// Demand in the given hour, in energy units
    load: f64,
}

/// A row of the per-unit solar production file
#[derive(Debug, Deserialize, PartialEq)]
struct SolarRow {
    /// Production of one installed solar unit in the given hour
    solar: f64,
}

/// A row of the generator efficiency curve file
#[derive(Debug, Deserialize, PartialEq)]
struct EfficiencyRow {
    /// Generator output relative to rated capacity, in percent
    load_factor: f64,
    /// Conversion efficiency at that output, in percent
    efficiency: f64,
}

/// Read the hourly load series from the model directory.
pub fn read_load(model_dir: &Path) -> Result<Vec<f64>> {
    let file_path = model_dir.join(LOAD_FILE_NAME);
    let series: Vec<f64> = read_vec_from_csv::<LoadRow>(&file_path)?
        .into_iter()
        .map(|row| row.load)
        .collect();
    check_hourly_series(&series, "load").with_context(|| input_err_msg(&file_path))?;

    Ok(series)
}

/// Read the hourly per-unit solar production series from the model directory.
pub fn read_solar_profile(model_dir: &Path) -> Result<Vec<f64>> {
    let file_path = model_dir.join(SOLAR_FILE_NAME);
    let series: Vec<f64> = read_vec_from_csv::<SolarRow>(&file_path)?
        .into_iter()
        .map(|row| row.solar)
        .collect();
    check_hourly_series(&series, "solar").with_context(|| input_err_msg(&file_path))?;

    Ok(series)
}

/// Read the generator efficiency curve from the model directory.
///
/// Returns (relative output %, efficiency %) pairs in file order.
pub fn read_efficiency_curve(model_dir: &Path) -> Result<Vec<(f64, f64)>> {
    let file_path = model_dir.join(FUEL_CURVE_FILE_NAME);
    let points: Vec<(f64, f64)> = read_vec_from_csv::<EfficiencyRow>(&file_path)?
        .into_iter()
        .map(|row| (row.load_factor, row.efficiency))
        .collect();

    Ok(points)
}

/// Check that a series covers exactly one year at hourly resolution with
/// finite, non-negative values.
fn check_hourly_series(series: &[f64], name: &str) -> Result<()> {
    ensure!(
        series.len() == HOURS_PER_YEAR,
        "{name} series must have {HOURS_PER_YEAR} rows, got {}",
        series.len()
    );
    ensure!(
        series.iter().all(|value| value.is_finite() && *value >= 0.0),
        "{name} series contains negative or non-finite values"
    );

    Ok(())
}
