use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Disease progression of an agent.
///
/// Transitions only go `Healthy -> Sick -> Immune | Dead`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum DiseaseState {
    Healthy,
    Sick { remaining: u32 },
    Immune,
    Dead,
}

/// Classification of a [`DiseaseState`] without the remaining sickness time.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Status {
    Healthy,
    Sick,
    Immune,
    Dead,
}

impl DiseaseState {
    pub fn status(&self) -> Status {
        match self {
            DiseaseState::Healthy => Status::Healthy,
            DiseaseState::Sick { .. } => Status::Sick,
            DiseaseState::Immune => Status::Immune,
            DiseaseState::Dead => Status::Dead,
        }
    }

    pub fn is_sick(&self) -> bool {
        matches!(self, DiseaseState::Sick { .. })
    }
}

/// Rectangular arena with wraparound edges.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Arena {
    width: f64,
    height: f64,
}

impl Arena {
    const DIAMETER_DIVISOR: f64 = 150.0;

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Collision diameter shared by all agents in this arena.
    pub fn diameter(&self) -> f64 {
        (self.width + self.height) / Self::DIAMETER_DIVISOR
    }

    /// Map a position onto `[0, width) x [0, height)`.
    pub fn wrap(&self, x: f64, y: f64) -> (f64, f64) {
        (wrap_coord(x, self.width), wrap_coord(y, self.height))
    }
}

fn wrap_coord(val: f64, len: f64) -> f64 {
    let val = val.rem_euclid(len);
    // `rem_euclid` can round up to `len` for tiny negative values.
    if val >= len { 0.0 } else { val }
}

/// Agent of the simulation.
///
/// A ball moving in the arena with a fixed diameter and a disease state.
/// Dead agents stay in the population but neither move nor collide.
#[derive(Debug, Clone)]
pub struct Agent {
    x: f64,
    y: f64,
    heading: f64,
    stationary: bool,
    diameter: f64,
    state: DiseaseState,
}

impl Agent {
    /// Create a new healthy agent.
    pub fn new(x: f64, y: f64, heading: f64, stationary: bool, diameter: f64) -> Self {
        Self {
            x,
            y,
            heading,
            stationary,
            diameter,
            state: DiseaseState::Healthy,
        }
    }

    /// Replace the disease state, bypassing the transition rules.
    ///
    /// Intended for setting up patient zero and hand-built populations.
    pub fn with_state(mut self, state: DiseaseState) -> Self {
        self.state = state;
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn is_stationary(&self) -> bool {
        self.stationary
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn state(&self) -> DiseaseState {
        self.state
    }

    pub fn is_healthy(&self) -> bool {
        self.state == DiseaseState::Healthy
    }

    pub fn is_sick(&self) -> bool {
        self.state.is_sick()
    }

    pub fn is_immune(&self) -> bool {
        self.state == DiseaseState::Immune
    }

    pub fn is_dead(&self) -> bool {
        self.state == DiseaseState::Dead
    }

    /// Interact with an agent whose state is `other`.
    ///
    /// A healthy agent touching a sick one becomes sick for `sick_duration` steps.
    pub fn contact_with(&mut self, other: DiseaseState, sick_duration: u32) {
        if self.is_healthy() && other.is_sick() {
            self.state = DiseaseState::Sick {
                remaining: sick_duration,
            };
        }
    }

    /// Check whether this agent overlaps `other`.
    pub fn touches(&self, other: &Agent) -> bool {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy < self.diameter * self.diameter
    }

    /// Pick a new heading uniformly in `[0, 2π)`.
    pub fn randomize_heading<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.heading = rng.random_range(0.0..TAU);
    }

    /// Advance the sickness countdown by one step and move.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        mortality: f64,
        speed: f64,
        arena: &Arena,
        rng: &mut R,
    ) {
        if let DiseaseState::Sick { remaining } = self.state {
            self.state = match remaining.saturating_sub(1) {
                0 if rng.random::<f64>() < mortality => DiseaseState::Dead,
                0 => DiseaseState::Immune,
                remaining => DiseaseState::Sick { remaining },
            };
        }

        if !self.stationary && !self.is_dead() {
            let (x, y) = arena.wrap(
                self.x + speed * self.heading.cos(),
                self.y + speed * self.heading.sin(),
            );
            self.x = x;
            self.y = y;
        }
    }
}
