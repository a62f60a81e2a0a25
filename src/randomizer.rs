//! Randomized trials averaged into a single spectrum.
//!
//! The randomization orchestrator provides:
//! - Validation of the single random variable before any work starts
//! - Parallel trials on a dedicated rayon pool sized to the requested parallelism
//! - Per-trial deep copies, so workers share no mutable structure
//! - Reproducible draws from a per-trial RNG seeded with `seed + index`
//! - Optional intermediate files, one per trial
//! - Progress as a completed-trial count on a bounded channel
//! - Cooperative cancellation checked before each trial
//!
//! Trial series are reduced on the fly and divided by the trial count once
//! every trial has finished.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Mutex;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use crate::builder::{build_mutable_structure, BuildContext};
use crate::computation::{compute, ComputationRange};
use crate::error::{Error, Result};
use crate::optics::OpticalParams;
use crate::output::{randomization_average_file_name, randomization_trial_file_name, write_computed_data};
use crate::params::{VarParameter, Variation};
use crate::result::ComputedData;
use crate::structure::Structure;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc::sync_channel;

    fn description() -> Value {
        json!([
            {"material": "custom", "d": {"var": true, "mean": 100.0, "deviation": 5.0}, "eps": 2.25}
        ])
    }

    fn options(iterations: usize, save_intermediate: bool) -> RandomizationOptions {
        RandomizationOptions {
            parallelism: 2,
            iterations,
            save_intermediate,
            seed: Some(7),
        }
    }

    #[test]
    fn draws_do_not_depend_on_scheduling() {
        let normal = Normal::new(10.0, 2.0).unwrap();
        assert_eq!(draw(&normal, 42, 3), draw(&normal, 42, 3));
        assert_ne!(draw(&normal, 42, 3), draw(&normal, 42, 4));
    }

    #[test]
    fn progress_is_monotonic_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = sync_channel(4);
        let cancel = AtomicBool::new(false);
        let handle = std::thread::spawn(move || rx.iter().collect::<Vec<usize>>());
        let outcome = randomize_and_compute(
            &description(),
            &BuildContext::default(),
            &OpticalParams::default(),
            &ComputationRange::nm(500.0, 520.0, 10.0),
            &options(6, false),
            dir.path(),
            Some(tx),
            &cancel,
        )
        .unwrap();
        let updates = handle.join().unwrap();
        assert_eq!(updates, (1..=6).collect::<Vec<_>>());
        assert_eq!(outcome.completed, 6);
        assert!(outcome.path.exists());
    }

    #[test]
    fn cancelled_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = AtomicBool::new(true);
        let err = randomize_and_compute(
            &description(),
            &BuildContext::default(),
            &OpticalParams::default(),
            &ComputationRange::nm(500.0, 520.0, 10.0),
            &options(4, true),
            dir.path(),
            None,
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn range_variable_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let description = json!([
            {"material": "custom", "d": {"var": true, "start": 1.0, "end": 2.0, "step": 1.0}, "eps": 2.25}
        ]);
        let err = randomize_and_compute(
            &description,
            &BuildContext::default(),
            &OpticalParams::default(),
            &ComputationRange::nm(500.0, 520.0, 10.0),
            &options(2, false),
            dir.path(),
            None,
            &AtomicBool::new(false),
        )
        .unwrap_err();
        assert_eq!(err.header(), "Incorrect variation");
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomizationOptions {
    /// Worker count, capped at the number of available CPUs.
    pub parallelism: usize,
    pub iterations: usize,
    pub save_intermediate: bool,
    /// Base seed, drawn from the thread RNG when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RandomizationOutcome {
    pub average: ComputedData,
    pub path: PathBuf,
    pub completed: usize,
}

/// Partial sum of trial series.
struct Accumulated {
    sum: Option<ComputedData>,
    trials: usize,
}

impl Accumulated {
    fn empty() -> Self {
        Self { sum: None, trials: 0 }
    }

    fn merge(self, other: Accumulated) -> Accumulated {
        let sum = match (self.sum, other.sum) {
            (Some(mut acc), Some(item)) => {
                acc += &item;
                Some(acc)
            }
            (acc, item) => acc.or(item),
        };
        Accumulated {
            sum,
            trials: self.trials + other.trials,
        }
    }
}

/// Trial `index` of a run seeded with `seed`.
fn draw(normal: &Normal<f64>, seed: u64, index: usize) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
    normal.sample(&mut rng)
}

fn random_distribution(variable: &VarParameter) -> Result<Normal<f64>> {
    match variable.variation() {
        Variation::Random { mean, deviation } => Normal::new(*mean, *deviation).map_err(|e| {
            Error::structural(
                "Invalid variable parameter",
                format!("cannot sample \"{}\": {}", variable.name(), e),
            )
        }),
        _ => Err(Error::structural(
            "Incorrect variation",
            "a randomization needs a mean/deviation variable parameter",
        )),
    }
}

/// Runs `options.iterations` randomized trials and writes their average.
///
/// **Context**: A structure with one normally distributed parameter models
/// sample to sample spread. The expected spectrum is the mean over many
/// independent draws of that parameter.
///
/// **How it Works**: Builds and flattens the mutable structure once and
/// validates its single random variable. Each trial deep copies the base
/// structure, assigns a draw, computes the series and optionally writes it.
/// Completed trials are counted under a lock, so the counts sent on
/// `progress` strictly increase. The sender is dropped when the run ends,
/// which closes the channel. Once `cancel` is set no new trial starts and
/// the run returns [`Error::Cancelled`] without writing the average.
#[allow(clippy::too_many_arguments)]
pub fn randomize_and_compute(
    description: &Value,
    ctx: &BuildContext,
    params: &OpticalParams,
    range: &ComputationRange,
    options: &RandomizationOptions,
    output_dir: &Path,
    progress: Option<SyncSender<usize>>,
    cancel: &AtomicBool,
) -> Result<RandomizationOutcome> {
    let start = Instant::now();
    range.validate()?;
    if options.iterations == 0 {
        return Err(Error::structural(
            "Incorrect number of iterations",
            "a randomization needs at least one iteration",
        ));
    }

    let base = build_mutable_structure(description, ctx)?.flatten();
    let variable = base.validate_single_variable()?;
    let normal = random_distribution(variable)?;
    let seed = options.seed.unwrap_or_else(|| rand::rng().random());

    let threads = options
        .parallelism
        .clamp(1, std::thread::available_parallelism().map_or(1, |n| n.get()));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::structural("Thread pool error", e.to_string()))?;
    info!(
        parameter = %variable.name(),
        iterations = options.iterations,
        threads,
        seed,
        "starting randomization"
    );

    let progress = Mutex::new((0usize, progress));
    let trial = |index: usize| -> Result<Accumulated> {
        if cancel.load(Ordering::SeqCst) {
            return Ok(Accumulated::empty());
        }
        let value = draw(&normal, seed, index);
        let structure = assign(&base, value)?;
        let data = compute(&structure, params, range)?;

        if options.save_intermediate && !cancel.load(Ordering::SeqCst) {
            let path = output_dir.join(randomization_trial_file_name(index, value, params, range));
            if let Err(e) = write_computed_data(&path, &data) {
                warn!(trial = index, error = %e, "could not save intermediate result");
            }
        }

        if let Ok(mut guard) = progress.lock() {
            guard.0 += 1;
            let completed = guard.0;
            if let Some(sender) = &guard.1 {
                if sender.send(completed).is_err() {
                    guard.1 = None;
                }
            }
        }
        Ok(Accumulated {
            sum: Some(data),
            trials: 1,
        })
    };

    let total = pool.install(|| {
        (0..options.iterations)
            .into_par_iter()
            .map(trial)
            .try_reduce(Accumulated::empty, |a, b| Ok(a.merge(b)))
    });
    drop(progress);
    let total = total?;

    if cancel.load(Ordering::SeqCst) {
        info!(completed = total.trials, "randomization cancelled");
        return Err(Error::Cancelled);
    }
    let mut average = total.sum.ok_or(Error::Cancelled)?;
    average.normalize(total.trials as f64);

    let path = output_dir.join(randomization_average_file_name(options.iterations, params, range));
    write_computed_data(&path, &average)?;

    let duration = start.elapsed();
    info!(
        trials = total.trials,
        "randomization finished in {:.2?}, {:.2?} per trial",
        duration,
        duration / total.trials.max(1) as u32
    );
    Ok(RandomizationOutcome {
        average,
        path,
        completed: total.trials,
    })
}

/// Deep copy of `base` with its variable slot set to `value`.
fn assign(base: &Structure<VarParameter>, value: f64) -> Result<Structure<VarParameter>> {
    let mut structure = base.deep_copy();
    structure
        .variable_slot_mut()
        .ok_or_else(|| Error::structural("Non-variable structure", "variable parameter vanished"))?
        .set(value)?;
    Ok(structure)
}
