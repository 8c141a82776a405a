use crate::config::{self, Config, InitConfig, ModelConfig, PatientZero, StationaryRule};
use crate::model::{Agent, Arena, DiseaseState};
use crate::stats::{Counts, Statistics};
use anyhow::{Context, Result, bail};
use rand::{prelude::*, seq::index};
use rand_chacha::ChaCha12Rng;
use rand_distr::Uniform;
use std::f64::consts::TAU;

/// Simulation engine.
///
/// Owns the agent population, the per-step statistics and the random
/// number generator. An external driver calls [`Simulation::step`] once per
/// frame until [`Simulation::is_finished`] returns `true`.
pub struct Simulation<R = ChaCha12Rng> {
    arena: Arena,
    init: InitConfig,
    params: ModelConfig,
    max_time_factor: usize,
    speed: f64,
    agents: Vec<Agent>,
    stats: Statistics,
    current_time: usize,
    rng: R,
}

impl Simulation<ChaCha12Rng> {
    /// Create a simulation seeded from `seed`, or from the OS if `None`.
    pub fn with_seed(cfg: &Config, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng")?,
        };
        Self::new(cfg, rng)
    }
}

impl<R: Rng> Simulation<R> {
    /// Create a simulation with a random initial population.
    pub fn new(cfg: &Config, rng: R) -> Result<Self> {
        let mut sim = Self::empty(cfg, rng)?;
        sim.populate().context("failed to generate initial population")?;
        log::debug!(
            "initialized {} agents ({} stationary)",
            sim.population(),
            sim.agents.iter().filter(|agt| agt.is_stationary()).count()
        );
        Ok(sim)
    }

    /// Create a simulation from a hand-built population.
    ///
    /// `init.population` and the stationary and patient zero rules of `cfg`
    /// are ignored; the agents are used as given.
    pub fn with_agents(cfg: &Config, agents: Vec<Agent>, rng: R) -> Result<Self> {
        if agents.is_empty() {
            bail!("population must contain at least one agent");
        }
        let mut cfg = cfg.clone();
        cfg.init.population = agents.len();
        let mut sim = Self::empty(&cfg, rng)?;
        sim.agents = agents;
        Ok(sim)
    }

    fn empty(cfg: &Config, rng: R) -> Result<Self> {
        cfg.validate().context("invalid configuration")?;
        Ok(Self {
            arena: Arena::new(cfg.arena.width, cfg.arena.height),
            init: cfg.init.clone(),
            params: cfg.model.clone(),
            max_time_factor: cfg.output.max_time_factor,
            speed: cfg.model.speed.speed(cfg.model.social_distance),
            agents: Vec::with_capacity(cfg.init.population),
            stats: Statistics::default(),
            current_time: 0,
            rng,
        })
    }

    /// Rebuild the population with new parameters and reset the statistics.
    ///
    /// Parameters are validated before anything is changed.
    pub fn initialize(&mut self, params: ModelConfig) -> Result<()> {
        params.validate().context("invalid model parameters")?;
        log::info!(
            "restarting with social_distance={} mortality={} sick_duration={}",
            params.social_distance,
            params.mortality,
            params.sick_duration
        );

        self.speed = params.speed.speed(params.social_distance);
        self.params = params;
        self.stats = Statistics::default();
        self.current_time = 0;
        self.populate()
    }

    /// Change the social distance fraction without a restart.
    ///
    /// Only the speed of moving agents changes; which agents are stationary
    /// is fixed until the next [`Simulation::initialize`].
    pub fn set_social_distance(&mut self, social_distance: f64) -> Result<()> {
        config::check_social_distance(social_distance)?;
        self.params.social_distance = social_distance;
        self.speed = self.params.speed.speed(social_distance);
        log::info!("social distance set to {social_distance}, speed {}", self.speed);
        Ok(())
    }

    fn populate(&mut self) -> Result<()> {
        let n_agt = self.init.population;
        let diameter = self.arena.diameter();

        let stationary = self.stationary_flags();

        let x_dist = Uniform::new(0.0, self.arena.width())?;
        let y_dist = Uniform::new(0.0, self.arena.height())?;
        let heading_dist = Uniform::new(0.0, TAU)?;

        let i_agt_zero = match self.init.patient_zero {
            PatientZero::First => 0,
            PatientZero::Last => n_agt - 1,
        };

        let mut agents = Vec::with_capacity(n_agt);
        for (i_agt, is_stationary) in stationary.into_iter().enumerate() {
            let x = x_dist.sample(&mut self.rng);
            let y = y_dist.sample(&mut self.rng);
            let heading = heading_dist.sample(&mut self.rng);
            let mut agt = Agent::new(x, y, heading, is_stationary, diameter);
            if i_agt == i_agt_zero {
                agt = agt.with_state(DiseaseState::Sick {
                    remaining: self.params.sick_duration,
                });
            }
            agents.push(agt);
        }

        self.agents = agents;
        Ok(())
    }

    fn stationary_flags(&mut self) -> Vec<bool> {
        let n_agt = self.init.population;
        let n_stationary = (n_agt as f64 * self.params.social_distance).floor() as usize;
        let n_stationary = n_stationary.min(n_agt);

        match self.init.stationary {
            StationaryRule::Leading => (0..n_agt).map(|i_agt| i_agt < n_stationary).collect(),
            StationaryRule::Sampled => {
                let mut flags = vec![false; n_agt];
                for i_agt in index::sample(&mut self.rng, n_agt, n_stationary).iter() {
                    flags[i_agt] = true;
                }
                flags
            }
        }
    }

    /// Whether the run is over.
    ///
    /// True after at least one step once the maximum time is reached or the
    /// last recorded sick count is zero.
    pub fn is_finished(&self) -> bool {
        if self.current_time == 0 {
            return false;
        }
        let no_sick = self.stats.latest().is_some_and(|counts| counts.sick == 0);
        self.current_time + 1 >= self.max_time() || no_sick
    }

    /// Perform one step of the simulation. Does nothing once finished.
    pub fn step(&mut self) {
        if self.is_finished() {
            return;
        }

        // Record the state resulting from the previous step.
        let counts = Counts::tally(&self.agents);
        self.stats.push(counts);
        self.current_time += 1;

        let sick_duration = self.params.sick_duration;
        let mortality = self.params.mortality;
        for i_agt in 0..self.agents.len() {
            collide(&mut self.agents, i_agt, sick_duration, &mut self.rng);
            self.agents[i_agt].advance(mortality, self.speed, &self.arena, &mut self.rng);
        }

        if self.is_finished() {
            log::info!(
                "finished at time {} with {:?}",
                self.current_time,
                Counts::tally(&self.agents)
            );
        }
    }

    pub fn current_time(&self) -> usize {
        self.current_time
    }

    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// Maximum number of steps of a run.
    pub fn max_time(&self) -> usize {
        self.max_time_factor * self.params.sick_duration as usize
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Agents in drawing order: dead agents first, then live agents.
    pub fn draw_order(&self) -> impl Iterator<Item = &Agent> {
        let dead = self.agents.iter().filter(|agt| agt.is_dead());
        let live = self.agents.iter().filter(|agt| !agt.is_dead());
        dead.chain(live)
    }
}

/// Collide agent `i_agt` with every live agent of lower index.
fn collide<R: Rng + ?Sized>(agents: &mut [Agent], i_agt: usize, sick_duration: u32, rng: &mut R) {
    let (others, rest) = agents.split_at_mut(i_agt);
    let agt = &mut rest[0];
    if agt.is_dead() {
        return;
    }

    for other in others.iter_mut() {
        if other.is_dead() || !agt.touches(other) {
            continue;
        }
        // Both contacts use the states from before the collision.
        let agt_state = agt.state();
        let other_state = other.state();
        agt.contact_with(other_state, sick_duration);
        other.contact_with(agt_state, sick_duration);

        agt.randomize_heading(rng);
        other.randomize_heading(rng);
    }
}
