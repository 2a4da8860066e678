//! Discounted cost coefficients for the optimisation objective.
//!
//! The objective minimises Net Present Cost. Because every cost term is
//! linear in either a sizing variable or an hourly fuel/production variable,
//! the whole objective reduces to one coefficient per variable; those
//! coefficients are computed here from the economic schedules.
use crate::economics::{ComponentSchedules, EconomicSchedule};
use crate::model::parameters::ModelParameters;

/// Discounted costs per installed unit of one component.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCosts {
    /// Capital cost of one installed unit
    pub capex: f64,
    /// Subsidy received for one installed unit
    pub subsidy: f64,
    /// NPV of all replacement purchases for one installed unit
    pub replacement_npv: f64,
    /// NPV of fixed operating costs for one installed unit
    pub opex_npv: f64,
    /// NPV of the salvage credit for one installed unit
    pub salvage_npv: f64,
}

impl UnitCosts {
    fn build(
        nominal_capacity: f64,
        specific_capex: f64,
        opex_share: f64,
        subsidy_share: f64,
        schedule: &EconomicSchedule,
    ) -> Self {
        let capex = nominal_capacity * specific_capex;
        Self {
            capex,
            subsidy: capex * subsidy_share,
            replacement_npv: capex * schedule.replacement_discount_sum(),
            opex_npv: capex * opex_share * schedule.annuity_factor(),
            salvage_npv: capex * schedule.salvage_fraction * schedule.horizon_discount_factor(),
        }
    }

    /// Net present cost contribution of one installed unit.
    pub fn npc(&self) -> f64 {
        self.capex - self.subsidy + self.replacement_npv + self.opex_npv - self.salvage_npv
    }
}

/// Objective cost coefficients for the whole system.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    /// Costs per installed solar unit
    pub solar: UnitCosts,
    /// Costs per installed battery unit
    pub battery: UnitCosts,
    /// Costs per installed generator unit, if the system has one
    pub generator: Option<UnitCosts>,
    /// NPV of one unit of hourly fuel consumption, repeated every year
    pub fuel_npv: f64,
    /// NPV of the fuel burned for one unit of hourly generator production at
    /// rated efficiency; applies when part-load modelling is off
    pub production_fuel_npv: f64,
}

impl CostModel {
    /// Compute all objective cost coefficients for the parameter set.
    pub fn build(parameters: &ModelParameters, schedules: &ComponentSchedules) -> Self {
        // Discount factors depend only on the project settings, so the
        // annuity factor is the same for every component
        let annuity_factor = schedules.solar.annuity_factor();

        let solar = UnitCosts::build(
            parameters.solar.nominal_capacity,
            parameters.solar.capex,
            parameters.solar.opex_share,
            parameters.solar.subsidy_share,
            &schedules.solar,
        );
        let battery = UnitCosts::build(
            parameters.battery.nominal_capacity,
            parameters.battery.capex,
            parameters.battery.opex_share,
            0.0,
            &schedules.battery,
        );

        let mut fuel_npv = 0.0;
        let mut production_fuel_npv = 0.0;
        let generator = parameters.generator.as_ref().map(|generator| {
            let schedule = schedules
                .generator
                .as_ref()
                .expect("generator schedule present when generator is enabled");
            fuel_npv = generator.fuel_cost * annuity_factor;
            production_fuel_npv = generator.fuel_cost
                / (generator.efficiency * generator.fuel_lhv)
                * annuity_factor;
            UnitCosts::build(
                generator.nominal_capacity,
                generator.capex,
                generator.opex_share,
                0.0,
                schedule,
            )
        });

        Self {
            solar,
            battery,
            generator,
            fuel_npv,
            production_fuel_npv,
        }
    }
}
