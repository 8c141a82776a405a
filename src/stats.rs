use crate::model::{Agent, Status};
use serde::{Deserialize, Serialize};

/// Number of agents in each disease state at one step.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Counts {
    pub healthy: usize,
    pub sick: usize,
    pub immune: usize,
    pub dead: usize,
}

impl Counts {
    /// Tally the states of a population in a single pass.
    pub fn tally<'a, I>(agents: I) -> Self
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        let mut counts = Self::default();
        for agt in agents {
            match agt.state().status() {
                Status::Healthy => counts.healthy += 1,
                Status::Sick => counts.sick += 1,
                Status::Immune => counts.immune += 1,
                Status::Dead => counts.dead += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.healthy + self.sick + self.immune + self.dead
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Healthy => self.healthy,
            Status::Sick => self.sick,
            Status::Immune => self.immune,
            Status::Dead => self.dead,
        }
    }

    /// Fraction of the counted agents in `status`.
    pub fn fraction(&self, status: Status) -> f64 {
        let total = self.total();
        if total == 0 {
            return f64::NAN;
        }
        self.get(status) as f64 / total as f64
    }
}

/// Time series of the per-state counts.
///
/// Entry `t` holds the counts at the start of step `t`. The four sequences
/// are append-only and always have the same length.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    healthy: Vec<usize>,
    sick: Vec<usize>,
    immune: Vec<usize>,
    dead: Vec<usize>,
}

impl Statistics {
    pub fn push(&mut self, counts: Counts) {
        self.healthy.push(counts.healthy);
        self.sick.push(counts.sick);
        self.immune.push(counts.immune);
        self.dead.push(counts.dead);
    }

    pub fn len(&self) -> usize {
        self.healthy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.healthy.is_empty()
    }

    pub fn healthy(&self) -> &[usize] {
        &self.healthy
    }

    pub fn sick(&self) -> &[usize] {
        &self.sick
    }

    pub fn immune(&self) -> &[usize] {
        &self.immune
    }

    pub fn dead(&self) -> &[usize] {
        &self.dead
    }

    pub fn get(&self, time: usize) -> Option<Counts> {
        Some(Counts {
            healthy: *self.healthy.get(time)?,
            sick: *self.sick.get(time)?,
            immune: *self.immune.get(time)?,
            dead: *self.dead.get(time)?,
        })
    }

    /// Counts of the most recently recorded step.
    pub fn latest(&self) -> Option<Counts> {
        self.get(self.len().checked_sub(1)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = Counts> + '_ {
        (0..self.len()).filter_map(|time| self.get(time))
    }
}

/// Running mean and variance (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}
