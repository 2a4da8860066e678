//! Code for adding constraints to the sizing optimisation problem.
//!
//! Each function adds one block of rows; optional blocks (generator, fuel
//! linearisation, renewable share, investment cap) are only assembled when
//! the corresponding component or limit is active.
use super::SystemModel;
use super::costs::CostModel;
use super::variables::VariableMap;
use crate::fuel_curve::FuelCurve;
use crate::model::Model;
use crate::model::parameters::{BatteryParameters, GeneratorParameters};

/// Add all constraints for the assembled system.
///
/// # Arguments
///
/// * `model` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `input` - The input data for the run
/// * `costs` - Discounted cost coefficients, used for the investment cap
/// * `fuel_curve` - The linearised fuel curve, when part-load modelling is on
pub fn add_system_constraints(
    model: &mut SystemModel,
    variables: &VariableMap,
    input: &Model,
    costs: &CostModel,
    fuel_curve: Option<&FuelCurve>,
) {
    add_energy_balance_constraints(model, variables, &input.load);
    add_solar_capacity_constraints(model, variables, &input.solar_profile);
    add_battery_power_constraints(model, variables, &input.parameters.battery);
    add_state_of_charge_constraints(model, variables, &input.parameters.battery);

    if let Some(generator) = &input.parameters.generator {
        add_generator_capacity_constraints(model, variables, generator);
        if let Some(fuel_curve) = fuel_curve {
            add_fuel_constraints(model, variables, fuel_curve);
        }

        // The renewable share constraint only makes sense with a second,
        // non-renewable source in the system
        let min_renewable_share = input.parameters.limits.min_renewable_share;
        if min_renewable_share > 0.0 {
            add_renewable_share_constraint(model, variables, min_renewable_share);
        }
    }

    add_reliability_constraint(
        model,
        variables,
        input.parameters.limits.max_lost_load_share,
        input.total_load(),
    );
    if let Some(max_capex) = input.parameters.limits.max_capex {
        add_investment_constraint(model, variables, costs, max_capex);
    }
}

/// Fix the hourly supply-demand balance:
///
/// `load[t] = solar[t] + discharge[t] - charge[t] + generator[t] + lost_load[t]`
fn add_energy_balance_constraints(model: &mut SystemModel, variables: &VariableMap, load: &[f64]) {
    for (t, &demand) in load.iter().enumerate() {
        let mut terms = vec![
            (variables.solar_production[t], 1.0),
            (variables.battery_discharge[t], 1.0),
            (variables.battery_charge[t], -1.0),
            (variables.lost_load[t], 1.0),
        ];
        if let Some(&production) = variables.generator_production.get(t) {
            terms.push((production, 1.0));
        }
        model.add_constraint(demand, demand, terms);
    }
}

/// Cap hourly solar production at the installed units times the per-unit profile.
fn add_solar_capacity_constraints(
    model: &mut SystemModel,
    variables: &VariableMap,
    solar_profile: &[f64],
) {
    for (t, &unit_production) in solar_profile.iter().enumerate() {
        model.add_constraint(
            f64::NEG_INFINITY,
            0.0,
            vec![
                (variables.solar_production[t], 1.0),
                (variables.solar_units, -unit_production),
            ],
        );
    }
}

/// Cap hourly battery charging and discharging power.
///
/// The power limit is the installed energy capacity divided by the
/// charge/discharge time constant.
fn add_battery_power_constraints(
    model: &mut SystemModel,
    variables: &VariableMap,
    battery: &BatteryParameters,
) {
    let charge_power = battery.nominal_capacity / battery.charge_time;
    for &charge in &variables.battery_charge {
        model.add_constraint(
            f64::NEG_INFINITY,
            0.0,
            vec![(charge, 1.0), (variables.battery_units, -charge_power)],
        );
    }

    let discharge_power = battery.nominal_capacity / battery.discharge_time;
    for &discharge in &variables.battery_discharge {
        model.add_constraint(
            f64::NEG_INFINITY,
            0.0,
            vec![(discharge, 1.0), (variables.battery_units, -discharge_power)],
        );
    }
}

/// Add SOC bounds, the hourly SOC recursion and the annual closure constraint.
///
/// The closure constraint pins the final state of charge back to its initial
/// value so that the operating year is energy-neutral for storage and costs
/// stay comparable across a repeating annual cycle.
fn add_state_of_charge_constraints(
    model: &mut SystemModel,
    variables: &VariableMap,
    battery: &BatteryParameters,
) {
    let capacity = battery.nominal_capacity;

    for &soc in &variables.state_of_charge {
        model.add_constraint(
            f64::NEG_INFINITY,
            0.0,
            vec![
                (soc, 1.0),
                (variables.battery_units, -battery.soc_max * capacity),
            ],
        );
    }
    for &soc in &variables.state_of_charge {
        model.add_constraint(
            0.0,
            f64::INFINITY,
            vec![
                (soc, 1.0),
                (variables.battery_units, -battery.soc_min * capacity),
            ],
        );
    }

    // SOC[t] = SOC[t-1] + charge[t]*eta_charge - discharge[t]*eta_discharge,
    // with the installed initial charge standing in for SOC[0]
    for t in 0..variables.state_of_charge.len() {
        let mut terms = vec![
            (variables.state_of_charge[t], 1.0),
            (variables.battery_charge[t], -battery.efficiency_charge),
            (variables.battery_discharge[t], battery.efficiency_discharge),
        ];
        if t == 0 {
            terms.push((variables.battery_units, -battery.soc_initial * capacity));
        } else {
            terms.push((variables.state_of_charge[t - 1], -1.0));
        }
        model.add_constraint(0.0, 0.0, terms);
    }

    let final_soc = *variables
        .state_of_charge
        .last()
        .expect("at least one hourly step");
    model.add_constraint(
        0.0,
        0.0,
        vec![
            (final_soc, 1.0),
            (variables.battery_units, -battery.soc_initial * capacity),
        ],
    );
}

/// Cap hourly generator production at the installed nominal capacity.
fn add_generator_capacity_constraints(
    model: &mut SystemModel,
    variables: &VariableMap,
    generator: &GeneratorParameters,
) {
    let generator_units = variables
        .generator_units
        .expect("generator units variable present when generator is enabled");
    for &production in &variables.generator_production {
        model.add_constraint(
            f64::NEG_INFINITY,
            0.0,
            vec![
                (production, 1.0),
                (generator_units, -generator.nominal_capacity),
            ],
        );
    }
}

/// Bound hourly fuel consumption from below by every fuel curve segment:
///
/// `fuel[t] >= slope*(production[t] - power*units) + fuel_rate*units`
fn add_fuel_constraints(model: &mut SystemModel, variables: &VariableMap, fuel_curve: &FuelCurve) {
    let generator_units = variables
        .generator_units
        .expect("generator units variable present when generator is enabled");
    for (&fuel, &production) in variables
        .fuel_consumption
        .iter()
        .zip(variables.generator_production.iter())
    {
        for segment in fuel_curve.segments() {
            model.add_constraint(
                0.0,
                f64::INFINITY,
                vec![
                    (fuel, 1.0),
                    (production, -segment.slope),
                    (
                        generator_units,
                        segment.slope * segment.power - segment.fuel_rate,
                    ),
                ],
            );
        }
    }
}

/// Cap the total unserved demand over the year at a share of total demand.
fn add_reliability_constraint(
    model: &mut SystemModel,
    variables: &VariableMap,
    max_lost_load_share: f64,
    total_load: f64,
) {
    let terms = variables
        .lost_load
        .iter()
        .map(|&lost_load| (lost_load, 1.0))
        .collect();
    model.add_constraint(f64::NEG_INFINITY, max_lost_load_share * total_load, terms);
}

/// Cap total capital expenditure.
fn add_investment_constraint(
    model: &mut SystemModel,
    variables: &VariableMap,
    costs: &CostModel,
    max_capex: f64,
) {
    let mut terms = vec![
        (variables.solar_units, costs.solar.capex),
        (variables.battery_units, costs.battery.capex),
    ];
    if let Some(generator_units) = variables.generator_units {
        let generator_costs = costs
            .generator
            .as_ref()
            .expect("generator costs present when generator is enabled");
        terms.push((generator_units, generator_costs.capex));
    }
    model.add_constraint(f64::NEG_INFINITY, max_capex, terms);
}

/// Require solar to cover at least `min_renewable_share` of yearly generation:
///
/// `(1 - share) * sum(solar) - share * sum(generator) >= 0`
fn add_renewable_share_constraint(
    model: &mut SystemModel,
    variables: &VariableMap,
    min_renewable_share: f64,
) {
    let mut terms: Vec<_> = variables
        .solar_production
        .iter()
        .map(|&production| (production, 1.0 - min_renewable_share))
        .collect();
    terms.extend(
        variables
            .generator_production
            .iter()
            .map(|&production| (production, -min_renewable_share)),
    );
    model.add_constraint(0.0, f64::INFINITY, terms);
}

#[cfg(test)]
mod tests {
    use super::super::variables::add_variables;
    use super::*;
    use crate::economics::ComponentSchedules;
    use crate::fixture::example_model;
    use crate::model::HOURS_PER_YEAR;
    use float_cmp::assert_approx_eq;

    const T: usize = HOURS_PER_YEAR;

    /// Assemble the full problem for the given model.
    fn assemble(input: &Model) -> (SystemModel, VariableMap) {
        let schedules = ComponentSchedules::build(&input.parameters).unwrap();
        let costs = CostModel::build(&input.parameters, &schedules);
        let mut model = SystemModel::default();
        let variables = add_variables(&mut model, &input.parameters, &costs);
        add_system_constraints(&mut model, &variables, input, &costs, None);
        (model, variables)
    }

    #[test]
    fn test_energy_balance_rows() {
        let mut input = example_model();
        input.load[0] = 42.0;
        let (model, variables) = assemble(&input);

        // Balance rows come first, one per hour
        let row = &model.constraints()[0];
        assert_eq!(row.min, 42.0);
        assert_eq!(row.max, 42.0);
        assert_eq!(
            row.terms,
            vec![
                (variables.solar_production[0], 1.0),
                (variables.battery_discharge[0], 1.0),
                (variables.battery_charge[0], -1.0),
                (variables.lost_load[0], 1.0),
                (variables.generator_production[0], 1.0),
            ]
        );
    }

    #[test]
    fn test_solar_capacity_rows() {
        let mut input = example_model();
        input.solar_profile[5] = 0.75;
        let (model, variables) = assemble(&input);

        let row = &model.constraints()[T + 5];
        assert_eq!(row.max, 0.0);
        assert_eq!(
            row.terms,
            vec![
                (variables.solar_production[5], 1.0),
                (variables.solar_units, -0.75),
            ]
        );
    }

    #[test]
    fn test_battery_power_rows() {
        let input = example_model();
        let (model, variables) = assemble(&input);
        let battery = &input.parameters.battery;

        let charge_row = &model.constraints()[2 * T];
        assert_eq!(charge_row.terms[0], (variables.battery_charge[0], 1.0));
        assert_approx_eq!(
            f64,
            charge_row.terms[1].1,
            -battery.nominal_capacity / battery.charge_time,
            epsilon = 1e-12
        );

        let discharge_row = &model.constraints()[3 * T];
        assert_eq!(
            discharge_row.terms[0],
            (variables.battery_discharge[0], 1.0)
        );
    }

    #[test]
    fn test_state_of_charge_rows() {
        let input = example_model();
        let (model, variables) = assemble(&input);
        let battery = &input.parameters.battery;

        // Recursion rows follow the two SOC bound blocks
        let first_recursion = &model.constraints()[6 * T];
        assert_eq!(first_recursion.min, 0.0);
        assert_eq!(first_recursion.max, 0.0);
        assert_eq!(
            first_recursion.terms,
            vec![
                (variables.state_of_charge[0], 1.0),
                (variables.battery_charge[0], -battery.efficiency_charge),
                (variables.battery_discharge[0], battery.efficiency_discharge),
                (
                    variables.battery_units,
                    -battery.soc_initial * battery.nominal_capacity
                ),
            ]
        );

        let later_recursion = &model.constraints()[6 * T + 1];
        assert_eq!(
            later_recursion.terms[3],
            (variables.state_of_charge[0], -1.0)
        );

        // The closure row pins SOC[T] to the initial state of charge
        let closure = &model.constraints()[7 * T];
        assert_eq!(
            closure.terms,
            vec![
                (variables.state_of_charge[T - 1], 1.0),
                (
                    variables.battery_units,
                    -battery.soc_initial * battery.nominal_capacity
                ),
            ]
        );
    }

    #[test]
    fn test_reliability_row() {
        let mut input = example_model();
        input.parameters.limits.max_lost_load_share = 0.05;
        let (model, variables) = assemble(&input);

        let row = model.constraints().last().unwrap();
        assert_approx_eq!(
            f64,
            row.max,
            0.05 * input.total_load(),
            epsilon = 1e-9
        );
        assert_eq!(row.terms.len(), T);
        assert_eq!(row.terms[0], (variables.lost_load[0], 1.0));
    }

    #[test]
    fn test_investment_row() {
        let mut input = example_model();
        input.parameters.limits.max_capex = Some(1e6);
        let (model, variables) = assemble(&input);

        let row = model.constraints().last().unwrap();
        assert_eq!(row.max, 1e6);
        // One term per sizing variable, valued at the unit capital cost
        assert_eq!(row.terms.len(), 3);
        assert_eq!(row.terms[0].0, variables.solar_units);
        assert_approx_eq!(
            f64,
            row.terms[0].1,
            input.parameters.solar.nominal_capacity * input.parameters.solar.capex,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_renewable_share_row() {
        let mut input = example_model();
        input.parameters.limits.min_renewable_share = 0.4;
        let (model, variables) = assemble(&input);

        // Renewable share row precedes the reliability row
        let row = &model.constraints()[model.constraints().len() - 2];
        assert_eq!(row.min, 0.0);
        assert_eq!(row.terms.len(), 2 * T);
        assert_approx_eq!(f64, row.terms[0].1, 0.6, epsilon = 1e-12);
        assert_eq!(row.terms[0].0, variables.solar_production[0]);
        assert_approx_eq!(f64, row.terms[T].1, -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_fuel_rows() {
        let mut input = example_model();
        input.parameters.generator.as_mut().unwrap().partload_model = true;
        let curve_points = vec![(0.0, 40.0), (50.0, 30.0), (100.0, 20.0)];
        let generator = input.parameters.generator.as_ref().unwrap();
        let fuel_curve = FuelCurve::linearise(
            &curve_points,
            3,
            generator.nominal_capacity,
            generator.fuel_lhv,
        )
        .unwrap();

        let schedules = ComponentSchedules::build(&input.parameters).unwrap();
        let costs = CostModel::build(&input.parameters, &schedules);
        let mut model = SystemModel::default();
        let variables = add_variables(&mut model, &input.parameters, &costs);
        let rows_before = model.constraints().len();
        add_fuel_constraints(&mut model, &variables, &fuel_curve);

        // Two segments per hour
        assert_eq!(model.constraints().len() - rows_before, 2 * T);
        let segment = fuel_curve.segments().next().unwrap();
        let row = &model.constraints()[rows_before];
        assert_eq!(
            row.terms,
            vec![
                (variables.fuel_consumption[0], 1.0),
                (variables.generator_production[0], -segment.slope),
                (
                    variables.generator_units.unwrap(),
                    segment.slope * segment.power - segment.fuel_rate,
                ),
            ]
        );
    }
}
