//! Common functionality for microsizer.
#![warn(missing_docs)]
pub mod cli;
pub mod economics;
pub mod error;
pub mod fuel_curve;
pub mod input;
pub mod log;
pub mod model;
pub mod optimisation;
pub mod output;
pub mod results;
pub mod settings;
pub mod simulation;
pub mod solver;

#[cfg(test)]
mod fixture;
