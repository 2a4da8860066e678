//! Post-processing of the solved model into a dispatch table and KPIs.
//!
//! A metric whose denominator resolves to zero (e.g. specific fuel
//! consumption with an idle generator) is reported as [`None`] rather than
//! aborting the run.
use crate::model::{HOURS_PER_YEAR, Model};
use crate::optimisation::costs::CostModel;
use crate::optimisation::variables::VariableMap;
use crate::solver::Solution;
use float_cmp::approx_eq;
use log::warn;

/// Curtailment more negative than this indicates a modelling or solver
/// precision bug rather than noise.
const CURTAILMENT_TOLERANCE: f64 = 1e-6;

/// Relative tolerance for the NPC vs. objective cross-check.
const NPC_TOLERANCE: f64 = 1e-6;

/// One hour of the optimal dispatch schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRow {
    /// Hour of the year, 1-based
    pub hour: usize,
    /// Demand in this hour
    pub load: f64,
    /// Solar production
    pub solar_production: f64,
    /// Available solar production that was not used
    pub curtailment: f64,
    /// Battery charging
    pub battery_charge: f64,
    /// Battery discharging
    pub battery_discharge: f64,
    /// Battery state of charge at the end of the hour
    pub state_of_charge: f64,
    /// Unmet demand
    pub lost_load: f64,
    /// Generator production, when the system has a generator
    pub generator_production: Option<f64>,
    /// Generator fuel consumption
    pub fuel_consumption: Option<f64>,
    /// Instantaneous generator conversion efficiency
    pub generator_efficiency: Option<f64>,
    /// Generator output relative to installed capacity
    pub generator_load_factor: Option<f64>,
}

/// The sizing decisions of the solved model.
#[derive(Debug, Clone, PartialEq)]
pub struct Sizing {
    /// Number of installed solar units
    pub solar_units: f64,
    /// Installed solar capacity
    pub solar_capacity: f64,
    /// Number of installed battery units
    pub battery_units: f64,
    /// Installed battery capacity
    pub battery_capacity: f64,
    /// Number of installed generator units
    pub generator_units: Option<f64>,
    /// Installed generator capacity
    pub generator_capacity: Option<f64>,
}

/// The discounted cost breakdown of the solved design.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    /// Total capital expenditure
    pub capex: f64,
    /// Total subsidies received
    pub subsidies: f64,
    /// NPV of all component replacements
    pub replacement_npv: f64,
    /// NPV of fixed and variable operating costs
    pub opex_npv: f64,
    /// NPV of the salvage credit at the horizon
    pub salvage_npv: f64,
    /// Net present cost, recomputed from the components above
    pub npc: f64,
    /// The objective value reported by the solver
    pub objective: f64,
}

/// Aggregate performance indicators for the operating year.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    /// Total annual solar production
    pub solar_production_total: f64,
    /// Total annual generator production
    pub generator_production_total: Option<f64>,
    /// Total annual fuel consumption
    pub fuel_consumption_total: Option<f64>,
    /// Total annual unmet demand
    pub lost_load_total: f64,
    /// Share of total generation coming from solar
    pub renewable_share: Option<f64>,
    /// Average generator load factor over the year
    pub generator_load_factor: Option<f64>,
    /// Fuel consumed per unit of generator production
    pub specific_fuel_consumption: Option<f64>,
}

/// Everything extracted from a solved model.
#[derive(Debug)]
pub struct DispatchResults {
    /// The hourly dispatch schedule
    pub rows: Vec<DispatchRow>,
    /// The sizing decisions
    pub sizing: Sizing,
    /// The discounted cost breakdown
    pub costs: CostSummary,
    /// Aggregate performance indicators
    pub kpis: Kpis,
}

/// Map the solved variable values back into a dispatch table and KPIs.
///
/// # Arguments
///
/// * `solution` - The solved model, with status `Optimal`
/// * `model` - The input data for the run
/// * `variables` - The map of decision variables
/// * `costs` - The discounted cost coefficients used in the objective
pub fn extract_results(
    solution: &Solution,
    model: &Model,
    variables: &VariableMap,
    costs: &CostModel,
) -> DispatchResults {
    let sizing = extract_sizing(solution, model, variables);
    let rows = extract_dispatch_rows(solution, model, variables, &sizing);
    let kpis = extract_kpis(&rows, &sizing);
    let cost_summary = extract_costs(solution, variables, costs, &kpis);

    DispatchResults {
        rows,
        sizing,
        costs: cost_summary,
        kpis,
    }
}

fn extract_sizing(solution: &Solution, model: &Model, variables: &VariableMap) -> Sizing {
    let parameters = &model.parameters;
    let solar_units = solution.value(variables.solar_units);
    let battery_units = solution.value(variables.battery_units);
    let generator_units = variables.generator_units.map(|id| solution.value(id));

    Sizing {
        solar_units,
        solar_capacity: solar_units * parameters.solar.nominal_capacity,
        battery_units,
        battery_capacity: battery_units * parameters.battery.nominal_capacity,
        generator_units,
        generator_capacity: generator_units.map(|units| {
            units
                * parameters
                    .generator
                    .as_ref()
                    .expect("generator parameters present when generator is enabled")
                    .nominal_capacity
        }),
    }
}

fn extract_dispatch_rows(
    solution: &Solution,
    model: &Model,
    variables: &VariableMap,
    sizing: &Sizing,
) -> Vec<DispatchRow> {
    let generator = model.parameters.generator.as_ref();
    let mut bad_curtailment_hours = 0;

    let rows = (0..HOURS_PER_YEAR)
        .map(|t| {
            let solar_production = solution.value(variables.solar_production[t]);
            let potential = sizing.solar_units * model.solar_profile[t];
            let curtailment = potential - solar_production;
            if curtailment < -CURTAILMENT_TOLERANCE {
                bad_curtailment_hours += 1;
            }

            let generator_production = variables
                .generator_production
                .get(t)
                .map(|&id| solution.value(id));
            let fuel_consumption = match (generator, generator_production) {
                // Fuel is a decision variable under part-load modelling and
                // follows directly from production at rated efficiency otherwise
                (Some(_), Some(_)) if !variables.fuel_consumption.is_empty() => {
                    Some(solution.value(variables.fuel_consumption[t]))
                }
                (Some(generator), Some(production)) => {
                    Some(production / (generator.efficiency * generator.fuel_lhv))
                }
                _ => None,
            };
            let generator_efficiency = generator.and_then(|generator| {
                let production = generator_production?;
                let fuel = fuel_consumption?;
                (fuel > 0.0).then(|| production / (fuel * generator.fuel_lhv))
            });
            let generator_load_factor = sizing.generator_capacity.and_then(|capacity| {
                (capacity > 0.0).then(|| generator_production.unwrap_or(0.0) / capacity)
            });

            DispatchRow {
                hour: t + 1,
                load: model.load[t],
                solar_production,
                curtailment: curtailment.max(0.0),
                battery_charge: solution.value(variables.battery_charge[t]),
                battery_discharge: solution.value(variables.battery_discharge[t]),
                state_of_charge: solution.value(variables.state_of_charge[t]),
                lost_load: solution.value(variables.lost_load[t]),
                generator_production,
                fuel_consumption,
                generator_efficiency,
                generator_load_factor,
            }
        })
        .collect();

    if bad_curtailment_hours > 0 {
        warn!(
            "Curtailment below -{CURTAILMENT_TOLERANCE} in {bad_curtailment_hours} hour(s); \
            this indicates a modelling or solver precision problem"
        );
    }

    rows
}

fn extract_kpis(rows: &[DispatchRow], sizing: &Sizing) -> Kpis {
    let solar_production_total = rows.iter().map(|row| row.solar_production).sum();
    let lost_load_total = rows.iter().map(|row| row.lost_load).sum();
    let generator_production_total = sizing
        .generator_units
        .map(|_| rows.iter().filter_map(|row| row.generator_production).sum());
    let fuel_consumption_total = sizing
        .generator_units
        .map(|_| rows.iter().filter_map(|row| row.fuel_consumption).sum());

    let total_generation =
        solar_production_total + generator_production_total.unwrap_or(0.0);
    let renewable_share =
        (total_generation > 0.0).then(|| solar_production_total / total_generation);

    let generator_load_factor = match (sizing.generator_capacity, generator_production_total) {
        (Some(capacity), Some(production)) if capacity > 0.0 => {
            Some(production / (capacity * HOURS_PER_YEAR as f64))
        }
        _ => None,
    };
    let specific_fuel_consumption =
        match (fuel_consumption_total, generator_production_total) {
            (Some(fuel), Some(production)) if production > 0.0 => Some(fuel / production),
            _ => None,
        };

    Kpis {
        solar_production_total,
        generator_production_total,
        fuel_consumption_total,
        lost_load_total,
        renewable_share,
        generator_load_factor,
        specific_fuel_consumption,
    }
}

fn extract_costs(
    solution: &Solution,
    variables: &VariableMap,
    costs: &CostModel,
    kpis: &Kpis,
) -> CostSummary {
    let solar_units = solution.value(variables.solar_units);
    let battery_units = solution.value(variables.battery_units);
    let generator_units = variables
        .generator_units
        .map(|id| solution.value(id))
        .unwrap_or(0.0);
    let generator_costs = costs.generator.as_ref();

    let per_component = |f: fn(&crate::optimisation::costs::UnitCosts) -> f64| {
        solar_units * f(&costs.solar)
            + battery_units * f(&costs.battery)
            + generator_units * generator_costs.map_or(0.0, f)
    };

    let capex = per_component(|c| c.capex);
    let subsidies = per_component(|c| c.subsidy);
    let replacement_npv = per_component(|c| c.replacement_npv);
    let salvage_npv = per_component(|c| c.salvage_npv);

    // Variable OPEX is fuel cost; it sits on fuel variables under part-load
    // modelling and on production otherwise
    let variable_opex_npv = if variables.fuel_consumption.is_empty() {
        costs.production_fuel_npv * kpis.generator_production_total.unwrap_or(0.0)
    } else {
        costs.fuel_npv * kpis.fuel_consumption_total.unwrap_or(0.0)
    };
    let opex_npv = per_component(|c| c.opex_npv) + variable_opex_npv;

    let npc = capex - subsidies + replacement_npv + opex_npv - salvage_npv;
    let scale = npc.abs().max(1.0);
    if !approx_eq!(f64, npc, solution.objective, epsilon = NPC_TOLERANCE * scale) {
        warn!(
            "Recomputed NPC {npc} differs from solver objective {}",
            solution.objective
        );
    }

    CostSummary {
        capex,
        subsidies,
        replacement_npv,
        opex_npv,
        salvage_npv,
        npc,
        objective: solution.objective,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::ComponentSchedules;
    use crate::fixture::example_model;
    use crate::optimisation::build_system_model;
    use crate::solver::SolutionStatus;
    use float_cmp::assert_approx_eq;

    /// Build the fixture problem and a hand-crafted solution for it.
    fn fake_solution(model: &Model) -> (Solution, VariableMap, CostModel) {
        let schedules = ComponentSchedules::build(&model.parameters).unwrap();
        let costs = CostModel::build(&model.parameters, &schedules);
        let (system, variables) = build_system_model(model, &costs, None).unwrap();

        let mut values = vec![0.0; system.variables().len()];
        values[variables.solar_units.index()] = 12.0;
        values[variables.battery_units.index()] = 3.0;
        if let Some(id) = variables.generator_units {
            values[id.index()] = 2.0;
        }
        for t in 0..HOURS_PER_YEAR {
            values[variables.solar_production[t].index()] = 10.0;
            if let Some(&id) = variables.generator_production.get(t) {
                values[id.index()] = 4.0;
            }
        }

        let objective = system
            .variables()
            .iter()
            .zip(values.iter())
            .map(|(definition, value)| definition.coefficient * value)
            .sum();
        let solution = Solution {
            status: SolutionStatus::Optimal,
            values,
            objective,
        };
        (solution, variables, costs)
    }

    #[test]
    fn test_extract_sizing_and_curtailment() {
        let model = example_model();
        let (solution, variables, costs) = fake_solution(&model);
        let results = extract_results(&solution, &model, &variables, &costs);

        assert_approx_eq!(f64, results.sizing.solar_units, 12.0, epsilon = 1e-9);
        assert_approx_eq!(f64, results.sizing.solar_capacity, 12.0, epsilon = 1e-9);
        assert_eq!(results.sizing.generator_capacity, Some(10.0));

        // Per-unit profile is 1.0, so 12 units can produce 12 and 10 are used
        let row = &results.rows[0];
        assert_approx_eq!(f64, row.curtailment, 2.0, epsilon = 1e-9);
        assert_eq!(row.hour, 1);
        assert_eq!(row.generator_production, Some(4.0));
        // Production 4 out of 10 installed
        assert_approx_eq!(f64, row.generator_load_factor.unwrap(), 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_extract_kpis() {
        let model = example_model();
        let (solution, variables, costs) = fake_solution(&model);
        let results = extract_results(&solution, &model, &variables, &costs);
        let hours = HOURS_PER_YEAR as f64;

        assert_approx_eq!(
            f64,
            results.kpis.solar_production_total,
            10.0 * hours,
            epsilon = 1e-6
        );
        assert_approx_eq!(
            f64,
            results.kpis.renewable_share.unwrap(),
            10.0 / 14.0,
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            results.kpis.generator_load_factor.unwrap(),
            0.4,
            epsilon = 1e-9
        );

        // Rated efficiency fuel use: 4 / (0.3 * 9.9) per hour
        let generator = model.parameters.generator.as_ref().unwrap();
        let expected_fuel = 4.0 / (generator.efficiency * generator.fuel_lhv);
        assert_approx_eq!(
            f64,
            results.kpis.specific_fuel_consumption.unwrap(),
            expected_fuel / 4.0,
            epsilon = 1e-9
        );
    }

    /// NPC recomputed from the cost components must equal the objective.
    #[test]
    fn test_npc_round_trip() {
        let model = example_model();
        let (solution, variables, costs) = fake_solution(&model);
        let results = extract_results(&solution, &model, &variables, &costs);

        let summary = &results.costs;
        assert_approx_eq!(
            f64,
            summary.npc,
            summary.capex - summary.subsidies + summary.replacement_npv + summary.opex_npv
                - summary.salvage_npv,
            epsilon = 1e-9
        );
        let scale = summary.npc.abs().max(1.0);
        assert!((summary.npc - summary.objective).abs() <= 1e-6 * scale);
    }

    #[test]
    fn test_metrics_omitted_without_generator() {
        let mut model = example_model();
        model.parameters.generator = None;
        let (solution, variables, costs) = fake_solution(&model);
        let results = extract_results(&solution, &model, &variables, &costs);

        assert_eq!(results.kpis.generator_production_total, None);
        assert_eq!(results.kpis.generator_load_factor, None);
        assert_eq!(results.kpis.specific_fuel_consumption, None);
        assert_eq!(results.kpis.renewable_share, Some(1.0));
        assert_eq!(results.rows[0].generator_production, None);
        assert_eq!(results.rows[0].fuel_consumption, None);
    }
}
