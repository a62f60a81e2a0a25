use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::sync_channel;
use std::thread;

use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use tmstack::builder::{build_structure, BuildContext};
use tmstack::computation::compute;
use tmstack::output::{self, RunSummary};
use tmstack::randomizer::randomize_and_compute;
use tmstack::settings::{self, RunKind, Settings};
use tmstack::sweep::compute_range;
use tmstack::tabulated::DispersionRegistry;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = settings::load_config()?;
    println!("{}", settings);

    let started = Local::now();
    let directory = settings
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("tmstack_{}", started.format("%Y%m%d_%H%M%S"))));
    output::ensure_dir(&directory)?;

    let registry = match &settings.dispersions {
        Some(dir) => DispersionRegistry::load_dir(dir)?,
        None => DispersionRegistry::default(),
    };
    let ctx = BuildContext::new(registry);

    let text = fs::read_to_string(&settings.structure)
        .with_context(|| format!("cannot read structure description {:?}", settings.structure))?;
    let description: Value = serde_json::from_str(&text)
        .with_context(|| format!("structure description {:?} is not valid JSON", settings.structure))?;

    let files = match settings.run {
        RunKind::Single => run_single(&settings, &description, &ctx, &directory)?,
        RunKind::Sweep => compute_range(
            &description,
            &ctx,
            &settings.optical_params(),
            &settings.range,
            &directory,
        )?,
        RunKind::Randomize => run_randomization(&settings, &description, &ctx, &directory)?,
    };

    let summary = RunSummary {
        kind: settings.run.to_string(),
        started: started.to_rfc3339(),
        finished: Local::now().to_rfc3339(),
        structure: settings.structure.display().to_string(),
        mode: settings.mode.to_string(),
        polarization: settings.polarization.to_string(),
        angle: settings.angle,
        temperature: settings.temperature,
        range: format!(
            "{}..{} step {} {}",
            settings.range.start, settings.range.end, settings.range.step, settings.range.unit
        ),
        files: files.iter().map(|p| p.display().to_string()).collect(),
    };
    let summary_path = output::write_summary(&directory, &summary)?;

    println!("Wrote {} file(s) to {}", files.len(), directory.display());
    println!("Summary: {}", summary_path.display());
    Ok(())
}

fn run_single(settings: &Settings, description: &Value, ctx: &BuildContext, directory: &Path) -> Result<Vec<PathBuf>> {
    settings.range.validate()?;
    let structure = build_structure(description, ctx)?;
    let params = settings.optical_params();
    let data = compute(&structure, &params, &settings.range)?;
    let path = directory.join(output::computation_file_name(&params, &settings.range));
    output::write_computed_data(&path, &data)?;
    Ok(vec![path])
}

fn run_randomization(
    settings: &Settings,
    description: &Value,
    ctx: &BuildContext,
    directory: &Path,
) -> Result<Vec<PathBuf>> {
    let options = settings.randomization_options();
    let pb = ProgressBar::new(options.iterations as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
        )?
        .progress_chars("█▇▆▅▄▃▂▁"),
    );
    pb.set_message("trials".to_string());

    let (sender, receiver) = sync_channel(options.iterations.clamp(1, 64));
    let drain = {
        let pb = pb.clone();
        thread::spawn(move || {
            for completed in receiver {
                pb.set_position(completed as u64);
            }
        })
    };

    let cancel = AtomicBool::new(false);
    let outcome = randomize_and_compute(
        description,
        ctx,
        &settings.optical_params(),
        &settings.range,
        &options,
        directory,
        Some(sender),
        &cancel,
    );
    let _ = drain.join();
    pb.finish();

    let outcome = outcome?;
    println!("Averaged {} trials", outcome.completed);
    Ok(vec![outcome.path])
}
