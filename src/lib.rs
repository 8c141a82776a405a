//! Toy agent-based epidemic simulator.
//!
//! A fixed population of balls moves in a toroidal arena. Touching balls
//! may pass on an infection; sick balls recover or die after a fixed
//! number of steps. [`engine::Simulation`] drives the model one step at a
//! time and records how many balls are healthy, sick, immune and dead.
//!
//! This is not a validated epidemiological model.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod manager;
pub mod model;
pub mod stats;

pub use config::Config;
pub use engine::Simulation;
pub use model::{Agent, Arena, DiseaseState, Status};
pub use stats::{Counts, Statistics};
