use crate::model::Status;
use crate::stats::{Accumulator, AccumulatorReport, Statistics};
use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Chart data of a finished run.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub population: usize,
    pub stats: Statistics,
}

impl RunRecord {
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, self).context("failed to serialize run record")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let record = decode::from_read(&mut reader).context("failed to deserialize run record")?;
        Ok(record)
    }
}

/// Key figures of a single run.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of recorded steps.
    pub duration: usize,
    /// Largest sick count.
    pub peak_sick: usize,
    /// First step at which the largest sick count is reached.
    pub peak_time: usize,
    pub final_healthy: f64,
    pub final_immune: f64,
    pub final_dead: f64,
}

impl RunSummary {
    pub fn from_series(stats: &Statistics, population: usize) -> Result<Self> {
        if population == 0 {
            bail!("population must be positive");
        }
        let last = stats.latest().context("series is empty")?;

        let mut peak_sick = 0;
        let mut peak_time = 0;
        for (time, counts) in stats.iter().enumerate() {
            if counts.total() != population {
                bail!(
                    "counts at time {time} sum to {}, but population is {population}",
                    counts.total()
                );
            }
            if counts.sick > peak_sick {
                peak_sick = counts.sick;
                peak_time = time;
            }
        }

        Ok(Self {
            duration: stats.len(),
            peak_sick,
            peak_time,
            final_healthy: last.fraction(Status::Healthy),
            final_immune: last.fraction(Status::Immune),
            final_dead: last.fraction(Status::Dead),
        })
    }
}

/// Aggregate of the summaries of several runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub n_runs: usize,
    pub duration: AccumulatorReport,
    pub peak_sick_fraction: AccumulatorReport,
    pub peak_time: AccumulatorReport,
    pub final_healthy: AccumulatorReport,
    pub final_immune: AccumulatorReport,
    pub final_dead: AccumulatorReport,
}

/// Folds the summaries of finished runs.
#[derive(Default)]
pub struct Analyzer {
    n_runs: usize,
    duration: Accumulator,
    peak_sick_fraction: Accumulator,
    peak_time: Accumulator,
    final_healthy: Accumulator,
    final_immune: Accumulator,
    final_dead: Accumulator,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let record = RunRecord::load(file)?;
        let summary = RunSummary::from_series(&record.stats, record.population)
            .context("failed to summarize run")?;
        log::debug!("{summary:?}");
        self.add(&summary, record.population);
        Ok(())
    }

    pub fn add(&mut self, summary: &RunSummary, population: usize) {
        self.n_runs += 1;
        self.duration.add(summary.duration as f64);
        self.peak_sick_fraction
            .add(summary.peak_sick as f64 / population as f64);
        self.peak_time.add(summary.peak_time as f64);
        self.final_healthy.add(summary.final_healthy);
        self.final_immune.add(summary.final_immune);
        self.final_dead.add(summary.final_dead);
    }

    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            n_runs: self.n_runs,
            duration: self.duration.report(),
            peak_sick_fraction: self.peak_sick_fraction.report(),
            peak_time: self.peak_time.report(),
            final_healthy: self.final_healthy.report(),
            final_immune: self.final_immune.report(),
            final_dead: self.final_dead.report(),
        }
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents = toml::to_string(&self.report()).context("failed to serialize results")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
