//! The decision variables of the sizing problem.
use super::costs::CostModel;
use super::{SystemModel, VariableId};
use crate::model::HOURS_PER_YEAR;
use crate::model::parameters::ModelParameters;

/// Map storing the variables of the optimisation problem.
///
/// Sizing variables count installed units per component. All other variables
/// are hourly operating quantities, indexed by hour of the representative
/// year. The generator vectors are empty when the system has no generator,
/// and `fuel_consumption` is additionally empty when part-load fuel
/// modelling is off.
pub struct VariableMap {
    /// Number of installed solar units
    pub solar_units: VariableId,
    /// Number of installed battery units
    pub battery_units: VariableId,
    /// Number of installed generator units
    pub generator_units: Option<VariableId>,
    /// Solar production in each hour
    pub solar_production: Vec<VariableId>,
    /// Battery charging in each hour
    pub battery_charge: Vec<VariableId>,
    /// Battery discharging in each hour
    pub battery_discharge: Vec<VariableId>,
    /// Battery state of charge at the end of each hour
    pub state_of_charge: Vec<VariableId>,
    /// Unmet demand in each hour
    pub lost_load: Vec<VariableId>,
    /// Generator production in each hour
    pub generator_production: Vec<VariableId>,
    /// Generator fuel consumption in each hour
    pub fuel_consumption: Vec<VariableId>,
}

/// Add a sizing variable, integer when the component's flag requests it.
fn add_sizing_variable(
    model: &mut SystemModel,
    coefficient: f64,
    integer_sizing: bool,
) -> VariableId {
    if integer_sizing {
        model.add_integer_variable(coefficient, 0.0, f64::INFINITY)
    } else {
        model.add_variable(coefficient, 0.0, f64::INFINITY)
    }
}

/// Add a non-negative operating variable for every hour of the year.
fn add_hourly_variables(model: &mut SystemModel, coefficient: f64) -> Vec<VariableId> {
    (0..HOURS_PER_YEAR)
        .map(|_| model.add_variable(coefficient, 0.0, f64::INFINITY))
        .collect()
}

/// Declare all decision variables for the problem.
///
/// The NPC objective is entirely captured by the variables' objective
/// coefficients: sizing variables carry the discounted investment cost of one
/// unit and fuel (or, without part-load modelling, generator production)
/// variables carry the discounted annual fuel cost.
pub fn add_variables(
    model: &mut SystemModel,
    parameters: &ModelParameters,
    costs: &CostModel,
) -> VariableMap {
    let solar_units =
        add_sizing_variable(model, costs.solar.npc(), parameters.solar.integer_sizing);
    let battery_units = add_sizing_variable(
        model,
        costs.battery.npc(),
        parameters.battery.integer_sizing,
    );
    let generator_units = parameters.generator.as_ref().map(|generator| {
        let unit_costs = costs
            .generator
            .as_ref()
            .expect("generator costs present when generator is enabled");
        add_sizing_variable(model, unit_costs.npc(), generator.integer_sizing)
    });

    let solar_production = add_hourly_variables(model, 0.0);
    let battery_charge = add_hourly_variables(model, 0.0);
    let battery_discharge = add_hourly_variables(model, 0.0);
    // State of charge is sign-free; its range is fixed by SOC bound constraints
    let state_of_charge = (0..HOURS_PER_YEAR)
        .map(|_| model.add_variable(0.0, f64::NEG_INFINITY, f64::INFINITY))
        .collect();
    let lost_load = add_hourly_variables(model, 0.0);

    let (generator_production, fuel_consumption) = match &parameters.generator {
        Some(generator) if generator.partload_model => {
            // Fuel variables carry the fuel cost; production is costed
            // indirectly through the fuel linearisation constraints
            let production = add_hourly_variables(model, 0.0);
            let fuel = add_hourly_variables(model, costs.fuel_npv);
            (production, fuel)
        }
        Some(_) => (add_hourly_variables(model, costs.production_fuel_npv), vec![]),
        None => (vec![], vec![]),
    };

    VariableMap {
        solar_units,
        battery_units,
        generator_units,
        solar_production,
        battery_charge,
        battery_discharge,
        state_of_charge,
        lost_load,
        generator_production,
        fuel_consumption,
    }
}
