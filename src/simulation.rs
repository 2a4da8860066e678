//! Functionality for running a complete sizing optimisation.
use crate::economics::ComponentSchedules;
use crate::error::SizingError;
use crate::fuel_curve::FuelCurve;
use crate::model::Model;
use crate::optimisation::build_system_model;
use crate::optimisation::costs::CostModel;
use crate::output::write_results;
use crate::results::{DispatchResults, extract_results};
use crate::solver::{HighsSolver, SolutionStatus, SolverEngine};
use anyhow::{Context, Result};
use log::{error, info};
use std::path::Path;

/// Size the system described by `model` and write the results to `output_path`.
///
/// # Arguments
///
/// * `model` - The input data for the run
/// * `output_path` - The folder in which result files will be saved
pub fn run(model: &Model, output_path: &Path) -> Result<()> {
    let results = optimise(model)?;

    write_results(
        output_path,
        &model.parameters.project.currency,
        &results,
    )
    .context("Failed to write result files")?;
    info!("Results written to {}", output_path.display());

    Ok(())
}

/// Build, solve and post-process the sizing problem for `model`.
pub fn optimise(model: &Model) -> Result<DispatchResults> {
    let parameters = &model.parameters;
    let schedules = ComponentSchedules::build(parameters)?;
    let fuel_curve = build_fuel_curve(model)?;
    let costs = CostModel::build(parameters, &schedules);

    let (system, variables) = build_system_model(model, &costs, fuel_curve.as_ref())?;
    info!("Built sizing problem with {}", system.summary());

    let solver = HighsSolver::with_options(parameters.solver.clone());
    let solution = solver.solve(&system);
    if solution.status != SolutionStatus::Optimal {
        error!(
            "Solver finished with status {} for problem with {}",
            solution.status,
            system.summary()
        );
        return Err(SizingError::SolverStatus(solution.status).into());
    }

    let results = extract_results(&solution, model, &variables, &costs);
    info!(
        "Optimal design: {:.2} kW solar, {:.2} kWh battery{}",
        results.sizing.solar_capacity,
        results.sizing.battery_capacity,
        results
            .sizing
            .generator_capacity
            .map_or_else(String::new, |capacity| format!(", {capacity:.2} kW generator"))
    );
    info!(
        "Net present cost: {:.2} {}",
        results.costs.npc, parameters.project.currency
    );

    Ok(results)
}

/// Linearise the generator efficiency curve, when part-load modelling is on.
fn build_fuel_curve(model: &Model) -> Result<Option<FuelCurve>> {
    let Some(generator) = &model.parameters.generator else {
        return Ok(None);
    };
    if !generator.partload_model {
        return Ok(None);
    }

    let points = model
        .efficiency_curve
        .as_ref()
        .context("Part-load modelling requires an efficiency curve")?;
    let curve = FuelCurve::linearise(
        points,
        generator.fuel_curve_samples,
        generator.nominal_capacity,
        generator.fuel_lhv,
    )?;
    info!(
        "Linearised fuel curve with {} breakpoints",
        curve.breakpoints().len()
    );

    Ok(Some(curve))
}
