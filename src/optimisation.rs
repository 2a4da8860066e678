//! Assembly of the sizing and dispatch optimisation problem.
//!
//! The problem is held in a [`SystemModel`], a solver-neutral container of
//! variable definitions and sparse constraint rows. One model represents one
//! candidate system design together with its full 8760-hour operating year.
//! The model is built once, handed to a solver and never mutated afterwards.
use crate::error::{SizingError, SizingResult};
use crate::fuel_curve::FuelCurve;
use crate::model::Model;

pub mod constraints;
pub mod costs;
pub mod variables;

use constraints::add_system_constraints;
use costs::CostModel;
use variables::{VariableMap, add_variables};

/// Identifies a decision variable within a [`SystemModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableId(usize);

impl VariableId {
    /// The position of the variable in declaration order.
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// The definition of a variable to be optimised.
///
/// The coefficient represents the multiplying factor of the variable in the
/// objective function to minimise, i.e. one of the Cs in:
///
/// f = c1*x1 + c2*x2 + ...
///
/// with x1, x2... taking values between min and max.
#[derive(PartialEq, Debug)]
pub struct VariableDef {
    /// The variable's minimum value
    pub min: f64,
    /// The variable's maximum value
    pub max: f64,
    /// The coefficient of the variable in the objective
    pub coefficient: f64,
    /// Whether the variable must take an integer value
    pub integer: bool,
}

/// A constraint for the optimisation.
///
/// Each constraint adds an inequality equation to the problem to solve of the
/// form:
///
/// min <= a1*x1 + a2*x2 + ... <= max
///
/// Often, constraints will impose only a min or a max value, with the other
/// set to infinity or minus infinity. Only non-zero coefficients are stored.
#[derive(PartialEq, Debug)]
pub struct ConstraintDef {
    /// The minimum value for the constraint
    pub min: f64,
    /// The maximum value for the constraint
    pub max: f64,
    /// The non-zero coefficients of the constraint row
    pub terms: Vec<(VariableId, f64)>,
}

/// The assembled optimisation problem, independent of any particular solver.
#[derive(Default)]
pub struct SystemModel {
    variables: Vec<VariableDef>,
    constraints: Vec<ConstraintDef>,
}

impl SystemModel {
    /// Add a continuous variable, returning its ID.
    pub fn add_variable(&mut self, coefficient: f64, min: f64, max: f64) -> VariableId {
        self.add_variable_def(VariableDef {
            min,
            max,
            coefficient,
            integer: false,
        })
    }

    /// Add an integer variable, returning its ID.
    pub fn add_integer_variable(&mut self, coefficient: f64, min: f64, max: f64) -> VariableId {
        self.add_variable_def(VariableDef {
            min,
            max,
            coefficient,
            integer: true,
        })
    }

    fn add_variable_def(&mut self, definition: VariableDef) -> VariableId {
        let id = VariableId(self.variables.len());
        self.variables.push(definition);
        id
    }

    /// Add a constraint row.
    pub fn add_constraint(&mut self, min: f64, max: f64, terms: Vec<(VariableId, f64)>) {
        self.constraints.push(ConstraintDef { min, max, terms });
    }

    /// The variable definitions, in declaration order.
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// The constraint rows, in declaration order.
    pub fn constraints(&self) -> &[ConstraintDef] {
        &self.constraints
    }

    /// A short human-readable summary of the model's size for diagnostics.
    pub fn summary(&self) -> String {
        let num_integer = self.variables.iter().filter(|v| v.integer).count();
        format!(
            "{} variables ({} integer), {} constraints",
            self.variables.len(),
            num_integer,
            self.constraints.len()
        )
    }
}

/// Assemble the full optimisation problem for one run.
///
/// # Arguments
///
/// * `model` - The input data for the run
/// * `costs` - Discounted cost coefficients for every component
/// * `fuel_curve` - The linearised fuel curve, when part-load modelling is on
///
/// # Returns
///
/// The assembled problem along with the map of its decision variables.
pub fn build_system_model(
    model: &Model,
    costs: &CostModel,
    fuel_curve: Option<&FuelCurve>,
) -> SizingResult<(SystemModel, VariableMap)> {
    check_parameters(model, fuel_curve)?;

    let mut system = SystemModel::default();
    let variables = add_variables(&mut system, &model.parameters, costs);
    add_system_constraints(&mut system, &variables, model, costs, fuel_curve);

    Ok((system, variables))
}

/// Check the physical parameters the builder relies on.
///
/// Models loaded from disk are already validated; this guards against
/// programmatically constructed parameter sets.
fn check_parameters(model: &Model, fuel_curve: Option<&FuelCurve>) -> SizingResult<()> {
    let parameters = &model.parameters;
    let battery = &parameters.battery;
    let configuration_err =
        |message: &str| Err(SizingError::Configuration(message.to_string()));

    if parameters.solar.nominal_capacity <= 0.0
        || battery.nominal_capacity <= 0.0
        || parameters
            .generator
            .as_ref()
            .is_some_and(|generator| generator.nominal_capacity <= 0.0)
    {
        return configuration_err("component capacities must be greater than 0");
    }
    if battery.efficiency_charge <= 0.0 || battery.efficiency_discharge <= 0.0 {
        return configuration_err("battery efficiencies must be greater than 0");
    }
    if battery.charge_time <= 0.0 || battery.discharge_time <= 0.0 {
        return configuration_err("battery time constants must be greater than 0");
    }
    if let Some(generator) = &parameters.generator {
        if generator.efficiency <= 0.0 {
            return configuration_err("generator efficiency must be greater than 0");
        }
        if generator.partload_model && fuel_curve.is_none() {
            return configuration_err(
                "part-load fuel modelling requires a linearised fuel curve",
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::ComponentSchedules;
    use crate::fixture::example_model;
    use crate::model::HOURS_PER_YEAR;

    const T: usize = HOURS_PER_YEAR;

    fn build(model: &Model) -> (SystemModel, VariableMap) {
        let schedules = ComponentSchedules::build(&model.parameters).unwrap();
        let costs = CostModel::build(&model.parameters, &schedules);
        build_system_model(model, &costs, None).unwrap()
    }

    #[test]
    fn test_model_size_without_generator() {
        let mut model = example_model();
        model.parameters.generator = None;
        let (system, _) = build(&model);

        // Two sizing variables plus five hourly variables
        assert_eq!(system.variables().len(), 2 + 5 * T);
        // Balance, solar cap, charge/discharge caps, SOC bounds and recursion
        // rows every hour; plus closure and reliability
        assert_eq!(system.constraints().len(), 7 * T + 2);
    }

    #[test]
    fn test_model_size_with_generator() {
        let model = example_model();
        let (system, _) = build(&model);

        // The generator adds a sizing variable, hourly production variables
        // and an hourly capacity cap
        assert_eq!(system.variables().len(), 3 + 6 * T);
        assert_eq!(system.constraints().len(), 8 * T + 2);
    }

    #[test]
    fn test_integer_sizing_flags() {
        let mut model = example_model();
        model.parameters.solar.integer_sizing = true;
        let (system, variables) = build(&model);

        assert!(system.variables()[variables.solar_units.index()].integer);
        assert!(!system.variables()[variables.battery_units.index()].integer);
    }

    #[test]
    fn test_partload_without_curve_fails() {
        let mut model = example_model();
        model.parameters.generator.as_mut().unwrap().partload_model = true;
        let schedules = ComponentSchedules::build(&model.parameters).unwrap();
        let costs = CostModel::build(&model.parameters, &schedules);

        assert!(matches!(
            build_system_model(&model, &costs, None),
            Err(SizingError::Configuration(_))
        ));
    }
}
