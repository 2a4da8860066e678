//! The interface between the assembled model and the numerical solver.
//!
//! The core never inspects solver internals: it hands a [`SystemModel`] to
//! anything implementing [`SolverEngine`] and gets back a [`Solution`]
//! holding a status and the resolved variable values. The default engine
//! wraps the HiGHS solver.
use crate::optimisation::{SystemModel, VariableId};
use highs::{HighsModelStatus, RowProblem, Sense};
use indexmap::IndexMap;
use log::warn;
use strum::Display;

/// The outcome of a solve, as reported by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SolutionStatus {
    /// The solver proved the returned solution optimal
    Optimal,
    /// No assignment satisfies every constraint
    Infeasible,
    /// The objective can be decreased without bound
    Unbounded,
    /// The solver hit its wall-clock limit before proving optimality
    TimeLimit,
    /// The solver failed for another reason
    Error,
}

/// Read-only snapshot of a solve outcome.
///
/// Variable values are only present when the status is
/// [`SolutionStatus::Optimal`].
pub struct Solution {
    /// The solver's reported status
    pub status: SolutionStatus,
    /// The resolved value of every variable, in declaration order
    pub values: Vec<f64>,
    /// The objective value of the returned solution
    pub objective: f64,
}

impl Solution {
    /// The resolved value of the given variable.
    pub fn value(&self, variable: VariableId) -> f64 {
        self.values[variable.index()]
    }
}

/// A solver capable of optimising a [`SystemModel`].
///
/// The core functions identically against any engine implementing this
/// contract; an exact MILP solver and an LP relaxation solver differ only in
/// performance and integrality guarantees.
pub trait SolverEngine {
    /// Minimise the model's objective, returning the outcome.
    fn solve(&self, model: &SystemModel) -> Solution;
}

/// A [`SolverEngine`] backed by the HiGHS solver.
pub struct HighsSolver {
    /// Solver tuning options, passed to HiGHS verbatim
    options: IndexMap<String, toml::Value>,
}

impl HighsSolver {
    /// Create a solver with default options.
    pub fn new() -> Self {
        Self::with_options(toml::Table::new())
    }

    /// Create a solver with the given tuning options.
    ///
    /// Keys and values are passed through to HiGHS unmodified; see the HiGHS
    /// documentation for the recognised options (e.g. `time_limit`).
    pub fn with_options(options: toml::Table) -> Self {
        Self {
            options: options.into_iter().collect(),
        }
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverEngine for HighsSolver {
    fn solve(&self, model: &SystemModel) -> Solution {
        let mut problem = RowProblem::default();

        // Add variables
        let mut columns = Vec::with_capacity(model.variables().len());
        for definition in model.variables() {
            let column = if definition.integer {
                problem.add_integer_column(definition.coefficient, definition.min..=definition.max)
            } else {
                problem.add_column(definition.coefficient, definition.min..=definition.max)
            };
            columns.push(column);
        }

        // Add constraints
        for constraint in model.constraints() {
            let factors = constraint
                .terms
                .iter()
                .map(|&(variable, coefficient)| (columns[variable.index()], coefficient));
            problem.add_row(constraint.min..=constraint.max, factors);
        }

        let mut highs_model = problem.optimise(Sense::Minimise);
        highs_model.set_option("output_flag", false);
        for (key, value) in &self.options {
            match value {
                toml::Value::String(text) => highs_model.set_option(key.as_str(), text.as_str()),
                toml::Value::Integer(number) => {
                    highs_model.set_option(key.as_str(), *number as i32);
                }
                toml::Value::Float(number) => highs_model.set_option(key.as_str(), *number),
                toml::Value::Boolean(flag) => highs_model.set_option(key.as_str(), *flag),
                _ => warn!("Ignoring solver option {key} with unsupported value type"),
            }
        }

        let solved = highs_model.solve();
        let status = match solved.status() {
            HighsModelStatus::Optimal => SolutionStatus::Optimal,
            HighsModelStatus::Infeasible => SolutionStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                SolutionStatus::Unbounded
            }
            HighsModelStatus::ReachedTimeLimit => SolutionStatus::TimeLimit,
            _ => SolutionStatus::Error,
        };

        // HiGHS does not guarantee a feasible incumbent for non-optimal
        // statuses, so variable values are only extracted when optimal
        if status != SolutionStatus::Optimal {
            return Solution {
                status,
                values: Vec::new(),
                objective: f64::NAN,
            };
        }

        // The highs bindings expose column values but not the solver's own
        // objective, so it is reconstructed from the objective coefficients
        let values = solved.get_solution().columns().to_vec();
        let objective = model
            .variables()
            .iter()
            .zip(values.iter())
            .map(|(definition, value)| definition.coefficient * value)
            .sum();

        Solution {
            status,
            values,
            objective,
        }
    }
}
