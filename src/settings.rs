use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::computation::{ComputationRange, ComputationUnit};
use crate::optics::{Medium, Mode, OpticalParams, Polarization};
use crate::randomizer::RandomizationOptions;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads_and_validates() {
        let settings = load_default_config().unwrap();
        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.optical_params().left, Medium::Air);
    }

    #[test]
    fn cli_overrides_config() {
        let mut settings = load_default_config().unwrap();
        let args = CliArgs::parse_from([
            "tmstack", "--mode", "transmittance", "--pol", "p", "--angle", "30", "--start", "500",
            "--end", "600", "--step", "2", "--run", "randomize", "--iterations", "10",
        ]);
        apply_args(&mut settings, args);
        assert_eq!(settings.mode, Mode::Transmittance);
        assert_eq!(settings.polarization, Polarization::P);
        assert_eq!(settings.angle, 30.0);
        assert_eq!(settings.range, ComputationRange::nm(500.0, 600.0, 2.0));
        assert_eq!(settings.run, RunKind::Randomize);
        assert_eq!(settings.randomization.iterations, 10);
    }

    #[test]
    fn grazing_angle_is_rejected() {
        let mut settings = load_default_config().unwrap();
        settings.angle = 90.0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn empty_range_is_rejected() {
        let mut settings = load_default_config().unwrap();
        settings.range.end = settings.range.start - 1.0;
        assert!(validate_settings(&settings).is_err());
    }
}

/// What the binary does with the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// One spectrum of a fixed structure.
    Single,
    /// One spectrum per value of the variable parameter.
    Sweep,
    /// Average over randomized trials of the variable parameter.
    Randomize,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Single => write!(f, "single"),
            RunKind::Sweep => write!(f, "sweep"),
            RunKind::Randomize => write!(f, "randomize"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RandomizationSettings {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    pub iterations: usize,
    #[serde(default)]
    pub save_intermediate: bool,
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Path to the JSON structure description.
    pub structure: PathBuf,
    /// Output directory. A timestamped directory is created when absent.
    pub directory: Option<PathBuf>,
    pub run: RunKind,
    pub mode: Mode,
    pub polarization: Polarization,
    /// Angle of incidence in degrees.
    pub angle: f64,
    /// Temperature in kelvin.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    pub range: ComputationRange,
    pub left: Medium,
    pub right: Medium,
    pub randomization: RandomizationSettings,
    pub seed: Option<u64>,
    /// Directory of tabulated dispersion files, registered by file stem.
    pub dispersions: Option<PathBuf>,
}

fn default_temperature() -> f64 {
    300.0
}

impl Settings {
    pub fn optical_params(&self) -> OpticalParams {
        OpticalParams {
            mode: self.mode,
            polarization: self.polarization,
            angle: self.angle,
            temperature: self.temperature,
            left: self.left,
            right: self.right,
        }
    }

    pub fn randomization_options(&self) -> RandomizationOptions {
        RandomizationOptions {
            parallelism: self.randomization.parallelism,
            iterations: self.randomization.iterations,
            save_intermediate: self.randomization.save_intermediate,
            seed: self.seed,
        }
    }
}

/// Loads `config/default.toml` only, without environment or CLI overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let settings = Config::builder()
        .add_source(File::from(root.join("config/default.toml")).required(true))
        .build()?;
    let config: Settings = settings.try_deserialize()?;
    validate_settings(&config)?;
    Ok(config)
}

/// Loads the configuration file, then `TMSTACK_*` environment variables,
/// then command-line arguments, each overriding the previous one.
pub fn load_config() -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        tracing::info!("using local configuration: {:?}", local_config);
        local_config
    } else {
        tracing::info!("using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("tmstack").separator("__"))
        .build()?;
    let mut config: Settings = settings.try_deserialize()?;

    apply_args(&mut config, CliArgs::parse());
    validate_settings(&config)?;

    Ok(config)
}

fn apply_args(config: &mut Settings, args: CliArgs) {
    if let Some(structure) = args.structure {
        config.structure = structure;
    }
    if let Some(directory) = args.directory {
        config.directory = Some(directory);
    }
    if let Some(run) = args.run {
        config.run = run;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(pol) = args.pol {
        config.polarization = pol;
    }
    if let Some(angle) = args.angle {
        config.angle = angle;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(start) = args.start {
        config.range.start = start;
    }
    if let Some(end) = args.end {
        config.range.end = end;
    }
    if let Some(step) = args.step {
        config.range.step = step;
    }
    if args.ev {
        config.range.unit = ComputationUnit::Ev;
    }
    if let Some(iterations) = args.iterations {
        config.randomization.iterations = iterations;
    }
    if let Some(parallelism) = args.parallelism {
        config.randomization.parallelism = parallelism;
    }
    if args.save_intermediate {
        config.randomization.save_intermediate = true;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(dispersions) = args.dispersions {
        config.dispersions = Some(dispersions);
    }
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the TMSTACK_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("TMSTACK_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }
    let exe_path = env::current_exe()?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("could not find project root directory"))
}

pub fn validate_settings(config: &Settings) -> Result<()> {
    if !(0.0..90.0).contains(&config.angle) {
        return Err(anyhow!("angle must be in [0, 90) degrees, got {}", config.angle));
    }
    if !(config.temperature > 0.0) {
        return Err(anyhow!("temperature must be positive, got {}", config.temperature));
    }
    config.range.validate()?;
    if config.run == RunKind::Randomize {
        if config.randomization.iterations == 0 {
            return Err(anyhow!("randomization needs at least one iteration"));
        }
        if config.randomization.parallelism == 0 {
            return Err(anyhow!("randomization parallelism must be at least 1"));
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "tmstack - transfer-matrix optics of layered structures")]
pub struct CliArgs {
    /// File path to the JSON structure description.
    #[arg(short, long)]
    structure: Option<PathBuf>,

    /// Output directory. Defaults to a timestamped directory under the current one.
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Compute a single spectrum, sweep the variable parameter, or average randomized trials.
    #[arg(short, long, value_enum)]
    run: Option<RunKind>,

    /// Quantity to compute: reflectance, transmittance, absorbance, permittivity,
    /// refractive_index, extinction_coefficient or scattering_coefficient.
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Polarization of the incident light, s or p.
    #[arg(long)]
    pol: Option<Polarization>,

    /// Angle of incidence in degrees.
    #[arg(short, long)]
    angle: Option<f64>,

    /// Temperature in kelvin.
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Start of the computation range.
    #[arg(long)]
    start: Option<f64>,

    /// End of the computation range, inclusive.
    #[arg(long)]
    end: Option<f64>,

    /// Step of the computation range.
    #[arg(long)]
    step: Option<f64>,

    /// Interpret the computation range as photon energies in eV.
    #[arg(long)]
    ev: bool,

    /// Number of randomized trials.
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Number of worker threads for randomized trials.
    #[arg(short, long)]
    parallelism: Option<usize>,

    /// Write the spectrum of every randomized trial as well as the average.
    #[arg(long)]
    save_intermediate: bool,

    /// Random seed for the randomized trials.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory of tabulated dispersion files.
    #[arg(long)]
    dispersions: Option<PathBuf>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Structure: {}
  - Run: {}
  - Mode: {}
  - Polarization: {}
  - Angle: {:.2} deg
  - Temperature: {:.2} K
  - Range: {} .. {} step {} {}
  - Media: {:?} | {:?}
  - Randomization: {} iterations on {} threads, seed {:?}
  ",
            self.structure.display(),
            self.run,
            self.mode,
            self.polarization,
            self.angle,
            self.temperature,
            self.range.start,
            self.range.end,
            self.range.step,
            self.range.unit,
            self.left,
            self.right,
            self.randomization.iterations,
            self.randomization.parallelism,
            self.seed,
        )
    }
}
