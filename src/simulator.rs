//! Run a simulation step by step and navigate the stored time steps
use crate::{Error, Result, SimulationDocument};
use chrono::{Duration, Local, NaiveDateTime};
use log::{debug, info};
use serde::Serialize;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

/// Parameters for `Simulator::run`
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Json file where the time log is (re)written after every step
    pub time_log: Option<PathBuf>,
    /// Stop the simulator once the final time is reached
    pub auto_stop: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            time_log: None,
            auto_stop: true,
        }
    }
}

/// Wall clock and simulation time after a step
#[derive(Debug, Clone, Serialize)]
pub struct TimeLogEntry {
    pub step: usize,
    pub wall_time: NaiveDateTime,
    pub elapsed_s: f64,
    pub simulation_time: f64,
    pub time_step: f64,
}

/// Time step stored in the results file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeStep {
    pub file_index: usize,
    pub simulation_time: f64,
}

/// Simulation control on a document
pub struct Simulator<'a, D: SimulationDocument> {
    doc: &'a mut D,
}

impl<'a, D: SimulationDocument> Simulator<'a, D> {
    #[must_use]
    pub const fn new(doc: &'a mut D) -> Self {
        Self { doc }
    }

    fn write_time_log(fname: &Path, log: &[TimeLogEntry]) -> Result<()> {
        let mut file = File::create(fname)?;
        writeln!(file, "{}", serde_json::to_string_pretty(log)?)?;
        Ok(())
    }

    /// Run the simulation until the final time, logging the progress after
    /// every step. Returns the time log
    pub fn run(&mut self, params: &RunParams) -> Result<Vec<TimeLogEntry>> {
        let clock_start = Instant::now();
        info!(
            "simulation started at {}",
            Local::now().format("%m/%d/%Y, %H:%M:%S")
        );

        let t_0 = self.doc.absolute_time();
        let mut res = Vec::new();
        let mut step = 0;

        while self.doc.absolute_time() < self.doc.final_time() {
            self.doc.single_step()?;
            step += 1;

            let simulation_time = self.doc.absolute_time();
            let time_step = self.doc.time_increment();
            let elapsed = clock_start.elapsed();
            let progress = (simulation_time - t_0) / (self.doc.final_time() - t_0);

            res.push(TimeLogEntry {
                step,
                wall_time: Local::now().naive_local(),
                elapsed_s: elapsed.as_secs_f64(),
                simulation_time,
                time_step,
            });
            if let Some(fname) = &params.time_log {
                Self::write_time_log(fname, &res)?;
            }

            info!(
                "#{step:4} {:4.0}%  t={simulation_time:2.2e}  dt={time_step:2.2e}    clock={elapsed:?}",
                progress * 100.0
            );
        }

        info!(
            "model run complete {} ({:?})",
            Local::now().format("%m/%d/%Y, %H:%M:%S"),
            clock_start.elapsed()
        );
        if params.auto_stop {
            self.doc.stop()?;
            info!("simulator stopped");
        }

        Ok(res)
    }

    /// Current absolute simulation time as a calendar date. The reference time
    /// must be set in the model
    pub fn absolute_time_calendar(&self) -> Result<NaiveDateTime> {
        let t_ref = self
            .doc
            .reference_time()
            .ok_or_else(|| Error::value("Reference Time not set in model."))?;

        let ms = (self.doc.absolute_time() * 86_400_000.0).round() as i64;
        t_ref
            .checked_add_signed(Duration::milliseconds(ms))
            .ok_or_else(|| Error::value("Absolute simulation time out of range"))
    }

    /// Load the first stored time step after `time` (strictly) and return it
    pub fn load_first_ts_after(&mut self, time: f64) -> Result<TimeStep> {
        let (file_index, simulation_time) = self
            .doc
            .stored_time_steps()?
            .into_iter()
            .find(|&(_, t)| t > time)
            .ok_or_else(|| Error::runtime(&format!("no time step after {time} d")))?;

        debug!("Load time step {file_index} (t = {simulation_time})");
        self.doc.load_time_step(file_index)?;

        Ok(TimeStep {
            file_index,
            simulation_time,
        })
    }
}
