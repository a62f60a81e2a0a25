//! Deterministic sweep of the single variable parameter.
//!
//! The mutable structure is built and flattened once, then reused in place.
//! For every value the variable slot is cleared and reassigned, the series is
//! recomputed from scratch and written to its own file. Any failure ends the
//! sweep.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::builder::{build_mutable_structure, BuildContext};
use crate::computation::{compute, inclusive_steps, ComputationRange};
use crate::error::{Error, Result};
use crate::optics::OpticalParams;
use crate::output::{sweep_file_name, write_computed_data};
use crate::params::Variation;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn values_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1.5\n\n  2,5\n3e1").unwrap();
        assert_eq!(read_values(file.path()).unwrap(), vec![1.5, 2.5, 30.0]);
    }

    #[test]
    fn values_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1.0\nabc").unwrap();
        match read_values(file.path()).unwrap_err() {
            Error::ResourceFormat { detail, .. } => assert!(detail.contains("line 2")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_values_file_is_a_resource_error() {
        let err = read_values(Path::new("/nonexistent/values.txt")).unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));
    }

    #[test]
    fn random_variation_cannot_be_swept() {
        let err = sweep_values(&Variation::Random { mean: 1.0, deviation: 0.1 }).unwrap_err();
        assert_eq!(err.header(), "Incorrect variation");
    }
}

/// Values visited by a sweep over `variation`.
pub fn sweep_values(variation: &Variation) -> Result<Vec<f64>> {
    match variation {
        Variation::Range { start, end, step } => Ok(inclusive_steps(*start, *end, *step)),
        Variation::File(path) => read_values(path),
        Variation::Random { .. } | Variation::Constant => Err(Error::structural(
            "Incorrect variation",
            "a range computation needs a start/end/step or file variable parameter",
        )),
    }
}

/// Reads one number per non-blank line. A decimal comma is accepted.
pub fn read_values(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Resource {
        path: path.to_path_buf(),
        source,
    })?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim()
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| Error::ResourceFormat {
                    path: path.to_path_buf(),
                    detail: format!("line {}: \"{}\" is not a number", i + 1, line.trim()),
                })
        })
        .collect()
}

/// Computes one series per value of the variable parameter and writes each
/// to `output_dir`. Returns the written paths in sweep order.
pub fn compute_range(
    description: &Value,
    ctx: &BuildContext,
    params: &OpticalParams,
    range: &ComputationRange,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    range.validate()?;
    let mut structure = build_mutable_structure(description, ctx)?.flatten();
    let variable = structure.validate_single_variable()?;
    let name = variable.name().to_string();
    let values = sweep_values(variable.variation())?;
    info!(parameter = %name, steps = values.len(), "starting range computation");

    let mut written = Vec::with_capacity(values.len());
    for value in values {
        structure.clear_variables();
        structure
            .variable_slot_mut()
            .ok_or_else(|| Error::structural("Non-variable structure", "variable parameter vanished"))?
            .set(value)?;

        let data = compute(&structure, params, range)?;
        let path = output_dir.join(sweep_file_name(value, params, range));
        write_computed_data(&path, &data)?;
        info!(parameter = %name, value, "computation successful");
        written.push(path);
    }
    Ok(written)
}
