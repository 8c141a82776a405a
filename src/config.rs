use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Disease and motion parameters.
    pub model: ModelConfig,
    /// Dimensions of the arena.
    pub arena: ArenaConfig,
    /// Initial population.
    pub init: InitConfig,
    /// Run length and reporting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameters that can be changed when the population is (re)initialized.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fraction of agents that never move.
    pub social_distance: f64,
    /// Probability that the end of the sickness is death.
    pub mortality: f64,
    /// Number of steps an agent stays sick.
    pub sick_duration: u32,
    /// Rule deriving the agent speed.
    #[serde(default)]
    pub speed: SpeedRule,
}

/// Agent speed as a function of the social distance fraction.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SpeedRule {
    /// Every moving agent has the same speed.
    Fixed { speed: f64 },
    /// Speed decreases linearly with the social distance fraction.
    Scaled { max_speed: f64 },
}

impl Default for SpeedRule {
    fn default() -> Self {
        SpeedRule::Fixed { speed: 2.0 }
    }
}

impl SpeedRule {
    /// Compute the speed of moving agents.
    pub fn speed(&self, social_distance: f64) -> f64 {
        match *self {
            SpeedRule::Fixed { speed } => speed,
            SpeedRule::Scaled { max_speed } => max_speed * (1.0 - social_distance),
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            SpeedRule::Fixed { speed } => check_num(speed, 0.0..1e6).context("invalid speed"),
            SpeedRule::Scaled { max_speed } => {
                check_num(max_speed, 0.0..1e6).context("invalid maximum speed")
            }
        }
    }
}

/// Arena dimensions.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
}

/// Index of the agent that is sick at creation.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientZero {
    #[default]
    First,
    Last,
}

/// Selection of the stationary agents.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationaryRule {
    /// The agents with the lowest indices.
    #[default]
    Leading,
    /// Indices sampled uniformly without replacement.
    Sampled,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Number of agents.
    pub population: usize,
    #[serde(default)]
    pub patient_zero: PatientZero,
    #[serde(default)]
    pub stationary: StationaryRule,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum number of steps in units of the sickness duration.
    pub max_time_factor: usize,
    /// Number of steps between progress messages.
    pub steps_per_log: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_time_factor: 30,
            steps_per_log: 64,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;

        check_num(self.arena.width, 1.0..1e6).context("invalid arena width")?;
        check_num(self.arena.height, 1.0..1e6).context("invalid arena height")?;

        check_num(self.init.population, 1..100_000).context("invalid population")?;

        check_num(self.output.max_time_factor, 1..1_000)
            .context("invalid maximum time factor")?;
        check_num(self.output.steps_per_log, 1..1_000_000)
            .context("invalid number of steps per log")?;

        Ok(())
    }

    /// Maximum number of steps of a run.
    pub fn max_time(&self) -> usize {
        self.output.max_time_factor * self.model.sick_duration as usize
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        check_social_distance(self.social_distance)?;
        check_num(self.mortality, 0.0..=1.0).context("invalid mortality")?;
        check_num(self.sick_duration, 1..10_000).context("invalid sickness duration")?;
        self.speed.validate()?;
        Ok(())
    }
}

pub(crate) fn check_social_distance(social_distance: f64) -> Result<()> {
    check_num(social_distance, 0.0..=1.0).context("invalid social distance fraction")
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    // NaN is rejected here since it is contained in no range.
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
