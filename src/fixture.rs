//! Ready-made model fixtures for tests.
use crate::model::parameters::{
    BatteryParameters, GeneratorParameters, ModelParameters, OptimisationLimits,
    ProjectParameters, SolarParameters,
};
use crate::model::{HOURS_PER_YEAR, Model};
use std::path::PathBuf;

/// A small but complete parameter set with a generator.
pub fn example_parameters() -> ModelParameters {
    ModelParameters {
        project: ProjectParameters {
            lifetime: 20,
            discount_rate: 0.05,
            currency: "USD".to_string(),
        },
        limits: OptimisationLimits {
            max_lost_load_share: 0.0,
            max_capex: None,
            min_renewable_share: 0.0,
        },
        solar: SolarParameters {
            nominal_capacity: 1.0,
            capex: 1500.0,
            opex_share: 0.02,
            subsidy_share: 0.0,
            lifetime: 15,
            integer_sizing: false,
        },
        battery: BatteryParameters {
            nominal_capacity: 1.0,
            capex: 550.0,
            opex_share: 0.02,
            lifetime: 10,
            integer_sizing: false,
            efficiency_charge: 0.95,
            efficiency_discharge: 0.95,
            soc_min: 0.1,
            soc_max: 1.0,
            soc_initial: 0.5,
            charge_time: 4.0,
            discharge_time: 4.0,
        },
        generator: Some(GeneratorParameters {
            nominal_capacity: 5.0,
            capex: 800.0,
            opex_share: 0.03,
            lifetime: 8,
            integer_sizing: false,
            fuel_lhv: 9.9,
            fuel_cost: 1.2,
            efficiency: 0.3,
            partload_model: false,
            fuel_curve_samples: 10,
        }),
        solver: toml::Table::new(),
    }
}

/// An example model with constant load and a constant per-unit solar profile.
pub fn example_model() -> Model {
    Model {
        model_path: PathBuf::new(),
        parameters: example_parameters(),
        load: vec![10.0; HOURS_PER_YEAR],
        solar_profile: vec![1.0; HOURS_PER_YEAR],
        efficiency_curve: None,
    }
}
