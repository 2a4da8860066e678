//! The model represents the static input data provided by the user.
use crate::input::time_series::{read_efficiency_curve, read_load, read_solar_profile};
use anyhow::{Context, Result, ensure};
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::ModelParameters;

/// Number of hourly steps in the representative operating year.
pub const HOURS_PER_YEAR: usize = 8760;

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Hourly demand over the representative year
    pub load: Vec<f64>,
    /// Hourly production of one installed solar unit over the representative year
    pub solar_profile: Vec<f64>,
    /// Generator efficiency curve as (relative output %, efficiency %) points
    pub efficiency_curve: Option<Vec<(f64, f64)>>,
}

impl Model {
    /// Load and validate a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path(model_dir: &Path) -> Result<Model> {
        let parameters = ModelParameters::from_path(model_dir)?;
        let load = read_load(model_dir).context("Failed to read load time series.")?;
        let solar_profile =
            read_solar_profile(model_dir).context("Failed to read solar time series.")?;

        // The efficiency curve is only needed for part-load fuel modelling
        let needs_curve = parameters
            .generator
            .as_ref()
            .is_some_and(|generator| generator.partload_model);
        let efficiency_curve = if needs_curve {
            let curve = read_efficiency_curve(model_dir)
                .context("Failed to read generator efficiency curve.")?;
            Some(curve)
        } else {
            None
        };

        ensure!(
            load.iter().sum::<f64>() > 0.0,
            "Total annual load must be greater than zero"
        );

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            parameters,
            load,
            solar_profile,
            efficiency_curve,
        })
    }

    /// Total demand over the representative year.
    pub fn total_load(&self) -> f64 {
        self.load.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::example_model;

    #[test]
    fn test_total_load() {
        let model = example_model();
        assert_eq!(model.total_load(), 10.0 * HOURS_PER_YEAR as f64);
    }
}
