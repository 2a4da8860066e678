//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

fn default_currency() -> String {
    "USD".to_string()
}

fn default_fuel_curve_samples() -> usize {
    10
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Project-wide settings
    pub project: ProjectParameters,
    /// Limits applied to the optimisation
    #[serde(default)]
    pub limits: OptimisationLimits,
    /// Parameters for the solar component
    pub solar: SolarParameters,
    /// Parameters for the battery component
    pub battery: BatteryParameters,
    /// Parameters for the backup generator, if the system has one
    pub generator: Option<GeneratorParameters>,
    /// Solver tuning options, passed through to the solver verbatim
    #[serde(default)]
    pub solver: toml::Table,
}

/// Project-wide settings, immutable for a run.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ProjectParameters {
    /// Project horizon in years
    pub lifetime: u32,
    /// Discount rate applied to future cash flows (between 0 and 1)
    pub discount_rate: f64,
    /// Currency label used in output, display only
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Limits applied to the optimisation.
#[derive(Debug, Deserialize, PartialEq)]
pub struct OptimisationLimits {
    /// Maximum share of annual demand that may go unserved
    #[serde(default)]
    pub max_lost_load_share: f64,
    /// Upper bound on total capital expenditure, unbounded if omitted
    pub max_capex: Option<f64>,
    /// Minimum share of total generation that must come from solar
    #[serde(default)]
    pub min_renewable_share: f64,
}

impl Default for OptimisationLimits {
    fn default() -> Self {
        Self {
            max_lost_load_share: 0.0,
            max_capex: None,
            min_renewable_share: 0.0,
        }
    }
}

/// Parameters for the solar component.
#[derive(Debug, Deserialize, PartialEq)]
pub struct SolarParameters {
    /// Nominal capacity of one installed unit
    pub nominal_capacity: f64,
    /// Capital cost per unit of installed capacity
    pub capex: f64,
    /// Annual operating cost as a fraction of CAPEX
    pub opex_share: f64,
    /// Share of CAPEX covered by subsidies
    #[serde(default)]
    pub subsidy_share: f64,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Whether the number of installed units must be an integer
    #[serde(default)]
    pub integer_sizing: bool,
}

/// Parameters for the battery component.
#[derive(Debug, Deserialize, PartialEq)]
pub struct BatteryParameters {
    /// Nominal capacity of one installed unit, in energy units
    pub nominal_capacity: f64,
    /// Capital cost per unit of installed capacity
    pub capex: f64,
    /// Annual operating cost as a fraction of CAPEX
    pub opex_share: f64,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Whether the number of installed units must be an integer
    #[serde(default)]
    pub integer_sizing: bool,
    /// Charging efficiency (between 0 and 1)
    pub efficiency_charge: f64,
    /// Discharging efficiency (between 0 and 1)
    pub efficiency_discharge: f64,
    /// Lower state-of-charge bound as a fraction of installed capacity
    pub soc_min: f64,
    /// Upper state-of-charge bound as a fraction of installed capacity
    pub soc_max: f64,
    /// Initial state of charge as a fraction of installed capacity
    pub soc_initial: f64,
    /// Hours needed to fully charge the battery, sets the charging power cap
    pub charge_time: f64,
    /// Hours needed to fully discharge the battery, sets the discharging power cap
    pub discharge_time: f64,
}

/// Parameters for the backup generator.
#[derive(Debug, Deserialize, PartialEq)]
pub struct GeneratorParameters {
    /// Nominal capacity of one installed unit
    pub nominal_capacity: f64,
    /// Capital cost per unit of installed capacity
    pub capex: f64,
    /// Annual operating cost as a fraction of CAPEX
    pub opex_share: f64,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Whether the number of installed units must be an integer
    #[serde(default)]
    pub integer_sizing: bool,
    /// Lower heating value of the fuel, energy per fuel unit
    pub fuel_lhv: f64,
    /// Cost per fuel unit
    pub fuel_cost: f64,
    /// Rated conversion efficiency (between 0 and 1)
    pub efficiency: f64,
    /// Whether to model part-load fuel consumption with a piecewise-linear curve
    #[serde(default)]
    pub partload_model: bool,
    /// Number of points to sample from the efficiency curve
    #[serde(default = "default_fuel_curve_samples")]
    pub fuel_curve_samples: usize,
}

/// Check that a value is a share, i.e. in [0, 1].
fn check_share(value: f64, name: &str) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{name} must be between 0 and 1, got {value}"
    );

    Ok(())
}

/// Check that a value is finite and strictly positive.
fn check_positive(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number greater than zero, got {value}"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let parameters: ModelParameters = read_toml(&file_path)?;

        parameters
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(parameters)
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        // project
        ensure!(
            self.project.lifetime > 0,
            "Project lifetime must be greater than 0"
        );
        ensure!(
            (0.0..1.0).contains(&self.project.discount_rate),
            "Discount rate must be at least 0 and less than 1"
        );

        // limits
        check_share(self.limits.max_lost_load_share, "max_lost_load_share")?;
        check_share(self.limits.min_renewable_share, "min_renewable_share")?;
        if let Some(max_capex) = self.limits.max_capex {
            check_positive(max_capex, "max_capex")?;
        }

        self.validate_solar().context("Invalid solar parameters")?;
        self.validate_battery().context("Invalid battery parameters")?;
        if let Some(generator) = &self.generator {
            validate_generator(generator).context("Invalid generator parameters")?;
        }

        Ok(())
    }

    fn validate_solar(&self) -> Result<()> {
        let solar = &self.solar;
        check_positive(solar.nominal_capacity, "nominal_capacity")?;
        check_positive(solar.capex, "capex")?;
        ensure!(solar.opex_share >= 0.0, "opex_share cannot be negative");
        check_share(solar.subsidy_share, "subsidy_share")?;
        ensure!(solar.lifetime > 0, "lifetime must be greater than 0");

        Ok(())
    }

    fn validate_battery(&self) -> Result<()> {
        let battery = &self.battery;
        check_positive(battery.nominal_capacity, "nominal_capacity")?;
        check_positive(battery.capex, "capex")?;
        ensure!(battery.opex_share >= 0.0, "opex_share cannot be negative");
        ensure!(battery.lifetime > 0, "lifetime must be greater than 0");
        check_positive(battery.efficiency_charge, "efficiency_charge")?;
        check_positive(battery.efficiency_discharge, "efficiency_discharge")?;
        check_share(battery.efficiency_charge, "efficiency_charge")?;
        check_share(battery.efficiency_discharge, "efficiency_discharge")?;
        check_share(battery.soc_min, "soc_min")?;
        check_share(battery.soc_max, "soc_max")?;
        ensure!(
            battery.soc_min < battery.soc_max,
            "soc_min must be less than soc_max"
        );
        ensure!(
            (battery.soc_min..=battery.soc_max).contains(&battery.soc_initial),
            "soc_initial must lie between soc_min and soc_max"
        );
        check_positive(battery.charge_time, "charge_time")?;
        check_positive(battery.discharge_time, "discharge_time")?;

        Ok(())
    }
}

fn validate_generator(generator: &GeneratorParameters) -> Result<()> {
    check_positive(generator.nominal_capacity, "nominal_capacity")?;
    check_positive(generator.capex, "capex")?;
    ensure!(generator.opex_share >= 0.0, "opex_share cannot be negative");
    ensure!(generator.lifetime > 0, "lifetime must be greater than 0");
    check_positive(generator.fuel_lhv, "fuel_lhv")?;
    ensure!(generator.fuel_cost >= 0.0, "fuel_cost cannot be negative");
    check_positive(generator.efficiency, "efficiency")?;
    check_share(generator.efficiency, "efficiency")?;
    if generator.partload_model {
        ensure!(
            generator.fuel_curve_samples >= 2,
            "fuel_curve_samples must be at least 2"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::example_parameters;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_example_parameters_valid() {
        example_parameters().validate().unwrap();
    }

    #[test]
    fn test_parameters_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            write!(
                file,
                r#"
                [project]
                lifetime = 20
                discount_rate = 0.05

                [solar]
                nominal_capacity = 1.0
                capex = 1500.0
                opex_share = 0.02
                lifetime = 15

                [battery]
                nominal_capacity = 1.0
                capex = 550.0
                opex_share = 0.02
                lifetime = 10
                efficiency_charge = 0.95
                efficiency_discharge = 0.95
                soc_min = 0.1
                soc_max = 1.0
                soc_initial = 0.5
                charge_time = 4.0
                discharge_time = 4.0

                [solver]
                time_limit = 600.0
                "#
            )
            .unwrap();
        }

        let parameters = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(parameters.project.lifetime, 20);
        assert_eq!(parameters.project.currency, "USD");
        assert_eq!(parameters.limits, OptimisationLimits::default());
        assert!(parameters.generator.is_none());
        assert_eq!(
            parameters.solver.get("time_limit"),
            Some(&toml::Value::Float(600.0))
        );
    }

    #[rstest]
    #[case(|p: &mut ModelParameters| p.project.lifetime = 0)]
    #[case(|p: &mut ModelParameters| p.project.discount_rate = 1.0)]
    #[case(|p: &mut ModelParameters| p.limits.max_capex = Some(0.0))]
    #[case(|p: &mut ModelParameters| p.limits.max_lost_load_share = 1.5)]
    #[case(|p: &mut ModelParameters| p.solar.nominal_capacity = 0.0)]
    #[case(|p: &mut ModelParameters| p.solar.capex = -1.0)]
    #[case(|p: &mut ModelParameters| p.battery.lifetime = 0)]
    #[case(|p: &mut ModelParameters| p.battery.efficiency_charge = 0.0)]
    #[case(|p: &mut ModelParameters| p.battery.soc_min = 0.9)]
    #[case(|p: &mut ModelParameters| p.battery.soc_initial = 0.01)]
    #[case(|p: &mut ModelParameters| p.battery.charge_time = 0.0)]
    #[case(|p: &mut ModelParameters| p.generator.as_mut().unwrap().efficiency = 1.2)]
    #[case(|p: &mut ModelParameters| p.generator.as_mut().unwrap().fuel_lhv = 0.0)]
    #[case(|p: &mut ModelParameters| {
        let generator = p.generator.as_mut().unwrap();
        generator.partload_model = true;
        generator.fuel_curve_samples = 1;
    })]
    fn test_validate_rejects(#[case] mutate: fn(&mut ModelParameters)) {
        let mut parameters = example_parameters();
        mutate(&mut parameters);
        assert!(parameters.validate().is_err());
    }
}
