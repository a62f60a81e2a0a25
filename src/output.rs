use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::computation::ComputationRange;
use crate::error::{Error, Result};
use crate::optics::OpticalParams;
use crate::result::ComputedData;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optics::{Mode, Polarization};
    use ndarray::array;

    fn params(mode: Mode) -> OpticalParams {
        OpticalParams {
            mode,
            polarization: Polarization::P,
            angle: 5.0,
            temperature: 77.0,
            ..OpticalParams::default()
        }
    }

    #[test]
    fn sweep_name_for_angular_mode() {
        let name = sweep_file_name(12.5, &params(Mode::Reflectance), &ComputationRange::nm(400.0, 800.0, 1.0));
        assert_eq!(name, "computation_12.50000000_REFLECTANCE_400.0_800.0_P-POL_05.0deg_77.0K.txt");
    }

    #[test]
    fn sweep_name_for_material_mode() {
        let name = sweep_file_name(0.1, &params(Mode::Permittivity), &ComputationRange::nm(400.0, 800.5, 1.0));
        assert_eq!(name, "computation_0.10000000_PERMITTIVITY_400.0_800.5_77.0K.txt");
    }

    #[test]
    fn single_computation_name() {
        let name = computation_file_name(&params(Mode::ExtinctionCoefficient), &ComputationRange::nm(1.0, 2.0, 0.5));
        assert_eq!(name, "computation_EXTINCTION_COEFFICIENT_1.0_2.0_77.0K.txt");
    }

    #[test]
    fn randomization_names_are_distinct() {
        let p = params(Mode::Absorbance);
        let range = ComputationRange::nm(500.0, 600.0, 1.0);
        let average = randomization_average_file_name(100, &p, &range);
        assert_eq!(average, "randomization_average_100_ABSORBANCE_500.0_600.0_P-POL_05.0deg_77.0K.txt");
        assert_ne!(
            randomization_trial_file_name(1, 3.0, &p, &range),
            randomization_trial_file_name(2, 3.0, &p, &range)
        );
    }

    #[test]
    fn columns_and_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let data = ComputedData {
            x: array![400.0, 401.0],
            y_real: array![0.5, 0.25],
            y_imaginary: Some(array![1.0, 2.0]),
        };
        write_computed_data(&path, &data).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let columns: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(columns[0], "400.00000000");
        assert_eq!(columns[1], format!("0.5{}", "0".repeat(31)));
        assert_eq!(columns[2].split('.').nth(1).unwrap().len(), 32);
    }

    #[test]
    fn real_series_has_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let data = ComputedData {
            x: array![1.5],
            y_real: array![0.125],
            y_imaginary: None,
        };
        write_computed_data(&path, &data).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end().split('\t').count(), 2);
    }
}

/// Writes a series as tab-separated `x  y_real  [y_imaginary]` lines.
pub fn write_computed_data(path: &Path, data: &ComputedData) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::Resource {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    for (x, re, im) in data.rows() {
        write!(writer, "{:.8}\t{:.32}", x, re)?;
        if let Some(im) = im {
            write!(writer, "\t{:.32}", im)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), points = data.len(), "wrote computed data");
    Ok(())
}

/// Mode, range bounds and, where relevant, polarization, angle and
/// temperature, as shared by every output file name.
fn descriptor(params: &OpticalParams, range: &ComputationRange) -> String {
    let mut name = format!("{}_{:?}_{:?}", params.mode, range.start, range.end);
    if params.mode.is_angular() {
        name.push_str(&format!("_{}-POL_{:04.1}deg", params.polarization, params.angle));
    }
    name.push_str(&format!("_{:04.1}K", params.temperature));
    name
}

/// File name of a single computation.
pub fn computation_file_name(params: &OpticalParams, range: &ComputationRange) -> String {
    format!("computation_{}.txt", descriptor(params, range))
}

/// File name of one sweep step, keyed by the current parameter value.
pub fn sweep_file_name(value: f64, params: &OpticalParams, range: &ComputationRange) -> String {
    format!("computation_{:.8}_{}.txt", value, descriptor(params, range))
}

pub fn randomization_average_file_name(
    iterations: usize,
    params: &OpticalParams,
    range: &ComputationRange,
) -> String {
    format!("randomization_average_{}_{}.txt", iterations, descriptor(params, range))
}

/// File name of an intermediate trial result. The trial index keeps names
/// unique when two trials draw the same value.
pub fn randomization_trial_file_name(
    index: usize,
    value: f64,
    params: &OpticalParams,
    range: &ComputationRange,
) -> String {
    format!(
        "randomization_trial_{:06}_{:.8}_{}.txt",
        index,
        value,
        descriptor(params, range)
    )
}

/// Creates `dir` if needed and returns it.
pub fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| Error::Resource {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.to_path_buf())
}

/// Record of a finished run, written next to its output files.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub kind: String,
    pub started: String,
    pub finished: String,
    pub structure: String,
    pub mode: String,
    pub polarization: String,
    pub angle: f64,
    pub temperature: f64,
    pub range: String,
    pub files: Vec<String>,
}

pub fn write_summary(dir: &Path, summary: &RunSummary) -> anyhow::Result<PathBuf> {
    let path = dir.join("summary.toml");
    fs::write(&path, toml::to_string_pretty(summary)?)?;
    Ok(path)
}
