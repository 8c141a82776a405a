use crate::analysis::{Analyzer, RunRecord};
use crate::config::Config;
use crate::engine::Simulation;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Simulation directory holding `config.toml`, the runs and the results.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Run a new simulation to completion and save its chart data.
    pub fn create_run(&self, seed: Option<u64>) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let mut sim = Simulation::with_seed(&self.cfg, seed)
            .context("failed to generate initial condition")?;

        let steps_per_log = self.cfg.output.steps_per_log;
        while !sim.is_finished() {
            sim.step();

            let time = sim.current_time();
            if time % steps_per_log == 0 {
                let progress = 100.0 * time as f64 / sim.max_time() as f64;
                if let Some(counts) = sim.stats().latest() {
                    log::info!("time {time:6} ({progress:06.2}% of max) {counts:?}");
                }
            }
        }

        let record = RunRecord {
            population: sim.population(),
            stats: sim.stats().clone(),
        };
        let series_file = self.series_file(run_idx);
        record
            .save(&series_file)
            .with_context(|| format!("failed to save {series_file:?}"))?;
        log::info!("saved {series_file:?}");

        Ok(())
    }

    /// Summarize every run and save the aggregate results.
    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;

        let mut analyzer = Analyzer::new();
        for run_idx in 0..n_runs {
            let series_file = self.series_file(run_idx);
            analyzer
                .add_file(&series_file)
                .with_context(|| format!("failed to add {series_file:?}"))?;
        }

        let results_file = self.results_file();
        analyzer
            .save_results(&results_file)
            .context("failed to save results")?;
        log::info!("saved {results_file:?}");

        Ok(())
    }

    /// Remove every run directory and the results file.
    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs()? {
            fs::remove_dir_all(&run_dir).with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let results_file = self.results_file();
        if results_file.exists() {
            fs::remove_file(&results_file)
                .with_context(|| format!("failed to remove {results_file:?}"))?;
            log::info!("removed {results_file:?}");
        }

        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn series_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("series.msgpack")
    }

    fn results_file(&self) -> PathBuf {
        self.sim_dir.join("results.toml")
    }
}
