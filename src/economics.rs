//! Discounted cash-flow schedules for system components.
//!
//! Each component (solar, battery, generator) is installed in year zero and
//! replaced at the end of every full lifetime that completes before the
//! project horizon. Whatever economic life is left at the horizon is credited
//! back as salvage value.
use crate::error::{SizingError, SizingResult};
use crate::model::ModelParameters;

/// Replacement and salvage schedule for one component over the project horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomicSchedule {
    /// Discount factor for each project year, indexed by `y - 1` for `y = 1..=horizon`
    pub discount_factors: Vec<f64>,
    /// Years in which the component is replaced, strictly before the horizon
    pub replacement_years: Vec<u32>,
    /// Fraction of the last install's economic life unused at the horizon
    pub salvage_fraction: f64,
}

impl EconomicSchedule {
    /// Build the schedule for a component with the given lifetime.
    ///
    /// # Arguments
    ///
    /// * `lifetime` - The component's economic lifetime in years
    /// * `horizon` - The project horizon in years
    /// * `discount_rate` - The project discount rate (between 0 and 1)
    pub fn build(lifetime: u32, horizon: u32, discount_rate: f64) -> SizingResult<Self> {
        if lifetime == 0 {
            return Err(SizingError::Configuration(
                "component lifetime must be greater than 0".to_string(),
            ));
        }
        if horizon == 0 {
            return Err(SizingError::Configuration(
                "project lifetime must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&discount_rate) {
            return Err(SizingError::Configuration(format!(
                "discount rate must be in [0, 1), got {discount_rate}"
            )));
        }

        let discount_factors = (1..=horizon)
            .map(|year| (1.0 + discount_rate).powi(-(year as i32)))
            .collect();

        // Replacements happen at every completed lifetime strictly before the
        // horizon; a replacement exactly at the horizon is never scheduled
        // since the project ends there.
        let replacement_years: Vec<u32> = (1..)
            .map(|n| n * lifetime)
            .take_while(|&year| year < horizon)
            .collect();

        let last_install_year = replacement_years.last().copied().unwrap_or(0);
        let unused_life = lifetime as f64 - (horizon - last_install_year) as f64;
        let salvage_fraction = (unused_life / lifetime as f64).max(0.0);

        Ok(Self {
            discount_factors,
            replacement_years,
            salvage_fraction,
        })
    }

    /// The discount factor for the given project year (`1..=horizon`).
    pub fn discount_factor(&self, year: u32) -> f64 {
        self.discount_factors[year as usize - 1]
    }

    /// The discount factor for the final project year.
    pub fn horizon_discount_factor(&self) -> f64 {
        *self
            .discount_factors
            .last()
            .expect("schedule covers at least one year")
    }

    /// The sum of discount factors over all project years.
    ///
    /// Multiplying an annual cost by this gives its NPV under the assumption
    /// that the representative year repeats across the whole horizon.
    pub fn annuity_factor(&self) -> f64 {
        self.discount_factors.iter().sum()
    }

    /// The sum of discount factors over the replacement years.
    pub fn replacement_discount_sum(&self) -> f64 {
        self.replacement_years
            .iter()
            .map(|&year| self.discount_factor(year))
            .sum()
    }
}

/// Economic schedules for every component in the system.
///
/// The schedules are mutually independent; they are computed up front and
/// consumed once during model assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSchedules {
    /// Schedule for the solar component
    pub solar: EconomicSchedule,
    /// Schedule for the battery component
    pub battery: EconomicSchedule,
    /// Schedule for the generator, if the system has one
    pub generator: Option<EconomicSchedule>,
}

impl ComponentSchedules {
    /// Build the schedules for all components in the parameter set.
    pub fn build(parameters: &ModelParameters) -> SizingResult<Self> {
        let horizon = parameters.project.lifetime;
        let discount_rate = parameters.project.discount_rate;

        Ok(Self {
            solar: EconomicSchedule::build(parameters.solar.lifetime, horizon, discount_rate)?,
            battery: EconomicSchedule::build(parameters.battery.lifetime, horizon, discount_rate)?,
            generator: parameters
                .generator
                .as_ref()
                .map(|generator| EconomicSchedule::build(generator.lifetime, horizon, discount_rate))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(15, 20, vec![15], 10.0 / 15.0)] // one replacement at year 15, 10y left of it
    #[case(5, 20, vec![5, 10, 15], 0.0)] // last replacement worn out exactly at horizon
    #[case(20, 20, vec![], 0.0)] // lifetime equals horizon
    #[case(25, 20, vec![], 5.0 / 25.0)] // outlives the project
    #[case(8, 20, vec![8, 16], 4.0 / 8.0)]
    #[case(1, 3, vec![1, 2], 0.0)]
    fn test_replacement_and_salvage(
        #[case] lifetime: u32,
        #[case] horizon: u32,
        #[case] expected_years: Vec<u32>,
        #[case] expected_salvage: f64,
    ) {
        let schedule = EconomicSchedule::build(lifetime, horizon, 0.05).unwrap();
        assert_eq!(schedule.replacement_years, expected_years);
        assert_approx_eq!(
            f64,
            schedule.salvage_fraction,
            expected_salvage,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_discount_factors() {
        let schedule = EconomicSchedule::build(15, 20, 0.05).unwrap();
        assert_eq!(schedule.discount_factors.len(), 20);
        assert_approx_eq!(f64, schedule.discount_factor(1), 1.0 / 1.05, epsilon = 1e-12);
        assert_approx_eq!(
            f64,
            schedule.discount_factor(20),
            1.05_f64.powi(-20),
            epsilon = 1e-12
        );
        assert_approx_eq!(
            f64,
            schedule.horizon_discount_factor(),
            schedule.discount_factor(20),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_zero_discount_rate() {
        let schedule = EconomicSchedule::build(10, 20, 0.0).unwrap();
        assert_approx_eq!(f64, schedule.annuity_factor(), 20.0, epsilon = 1e-12);
        assert_approx_eq!(f64, schedule.replacement_discount_sum(), 1.0, epsilon = 1e-12);
    }

    /// Salvage fraction must stay in [0, 1) for any valid lifetime/horizon pair.
    #[test]
    fn test_salvage_fraction_in_range() {
        for lifetime in 1..40 {
            for horizon in 1..40 {
                let schedule = EconomicSchedule::build(lifetime, horizon, 0.05).unwrap();
                assert!(
                    (0.0..1.0).contains(&schedule.salvage_fraction),
                    "salvage fraction {} out of range for lifetime {lifetime}, horizon {horizon}",
                    schedule.salvage_fraction
                );
                for years in schedule.replacement_years.windows(2) {
                    assert!(years[0] < years[1]);
                }
                for &year in &schedule.replacement_years {
                    assert!(year > 0 && year < horizon && year % lifetime == 0);
                }
            }
        }
    }

    #[test]
    fn test_component_schedules() {
        let parameters = crate::fixture::example_parameters();
        let schedules = ComponentSchedules::build(&parameters).unwrap();
        assert_eq!(schedules.solar.replacement_years, vec![15]);
        assert_eq!(schedules.battery.replacement_years, vec![10]);
        assert_eq!(schedules.generator.unwrap().replacement_years, vec![8, 16]);
    }

    #[rstest]
    #[case(0, 20, 0.05)]
    #[case(10, 0, 0.05)]
    #[case(10, 20, 1.0)]
    #[case(10, 20, -0.1)]
    fn test_invalid_inputs(#[case] lifetime: u32, #[case] horizon: u32, #[case] rate: f64) {
        assert!(matches!(
            EconomicSchedule::build(lifetime, horizon, rate),
            Err(SizingError::Configuration(_))
        ));
    }
}
