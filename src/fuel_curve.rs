//! Piecewise-linear approximation of the generator fuel consumption curve.
//!
//! The generator's empirical efficiency curve (efficiency vs. relative output)
//! is sampled into a set of (power, fuel rate) breakpoints. Adjacent
//! breakpoints form linear segments which are added to the optimisation
//! problem as lower bounds on fuel consumption. If the breakpoint sequence is
//! convex the segment envelope passes through every breakpoint exactly; for a
//! non-convex sequence the envelope deviates from some breakpoints. Callers
//! relying on exactness should validate convexity of the source data
//! themselves.
use crate::error::{SizingError, SizingResult};
use itertools::Itertools;

/// One sampled point of the linearised fuel consumption curve.
///
/// Both fields are per installed generator unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelBreakpoint {
    /// Generator output at this breakpoint
    pub power: f64,
    /// Fuel consumed per hour when producing `power`
    pub fuel_rate: f64,
}

/// A linear segment between two adjacent breakpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelSegment {
    /// Marginal fuel consumption along the segment
    pub slope: f64,
    /// Output at the segment's lower breakpoint, per installed unit
    pub power: f64,
    /// Fuel rate at the segment's lower breakpoint, per installed unit
    pub fuel_rate: f64,
}

/// The linearised fuel consumption curve for the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelCurve {
    breakpoints: Vec<FuelBreakpoint>,
}

impl FuelCurve {
    /// Sample the empirical efficiency curve into fuel consumption breakpoints.
    ///
    /// The empirical points are (relative output %, efficiency %) pairs with
    /// strictly increasing relative output. Both axes are normalised to
    /// [0, 1], the curve is evaluated at `samples` equally spaced relative
    /// outputs and each sample is converted to a (power, fuel rate) pair.
    /// Samples with non-positive efficiency have no defined fuel rate and are
    /// discarded.
    ///
    /// # Arguments
    ///
    /// * `points` - The empirical (relative output %, efficiency %) points
    /// * `samples` - Number of equally spaced points to sample (at least 2)
    /// * `rated_capacity` - Nominal capacity of one generator unit
    /// * `fuel_lhv` - Lower heating value of the fuel, energy per fuel unit
    pub fn linearise(
        points: &[(f64, f64)],
        samples: usize,
        rated_capacity: f64,
        fuel_lhv: f64,
    ) -> SizingResult<Self> {
        if points.len() < 2 {
            return Err(SizingError::CurveData(format!(
                "efficiency curve needs at least 2 points, got {}",
                points.len()
            )));
        }
        if samples < 2 {
            return Err(SizingError::CurveData(format!(
                "at least 2 samples required, got {samples}"
            )));
        }
        if rated_capacity <= 0.0 || fuel_lhv <= 0.0 {
            return Err(SizingError::Configuration(
                "generator capacity and fuel LHV must be greater than 0".to_string(),
            ));
        }

        // Normalise both axes from percent to [0, 1]
        let xs: Vec<f64> = points.iter().map(|&(x, _)| x / 100.0).collect();
        let ys: Vec<f64> = points.iter().map(|&(_, y)| y / 100.0).collect();
        if !xs.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(SizingError::CurveData(
                "efficiency curve points must have strictly increasing relative output"
                    .to_string(),
            ));
        }

        let breakpoints: Vec<_> = (0..samples)
            .map(|i| i as f64 / (samples - 1) as f64)
            .map(|relative_output| {
                let efficiency = interpolate(&xs, &ys, relative_output);
                (relative_output, efficiency)
            })
            .filter(|&(_, efficiency)| efficiency > 0.0)
            .map(|(relative_output, efficiency)| {
                let power = relative_output * rated_capacity;
                FuelBreakpoint {
                    power,
                    fuel_rate: power / (efficiency * fuel_lhv),
                }
            })
            .collect();

        // With fewer than 2 valid samples there is no segment to constrain
        // fuel consumption with, so the linearisation is undefined.
        if breakpoints.len() < 2 {
            return Err(SizingError::CurveData(format!(
                "only {} sample(s) with positive efficiency remain",
                breakpoints.len()
            )));
        }

        Ok(Self { breakpoints })
    }

    /// The sampled breakpoints, in order of increasing power.
    pub fn breakpoints(&self) -> &[FuelBreakpoint] {
        &self.breakpoints
    }

    /// Iterate over the linear segments between adjacent breakpoints.
    pub fn segments(&self) -> impl Iterator<Item = FuelSegment> + '_ {
        self.breakpoints.iter().tuple_windows().map(|(a, b)| {
            FuelSegment {
                slope: (b.fuel_rate - a.fuel_rate) / (b.power - a.power),
                power: a.power,
                fuel_rate: a.fuel_rate,
            }
        })
    }
}

/// Evaluate the piecewise-linear interpolant through (`xs`, `ys`) at `x`.
///
/// Outside the range of `xs` the boundary segment is extended linearly.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    // Pick the segment to interpolate on, clamping to the boundary segments
    // so that out-of-range values are extrapolated linearly.
    let upper = match xs.iter().position(|&x0| x0 >= x) {
        Some(0) => 1,
        Some(i) => i,
        None => xs.len() - 1,
    };
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}
