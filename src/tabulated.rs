//! Tabulated dispersion data and the registry that names it.
//!
//! - [`CubicSpline`]: natural cubic spline over strictly increasing knots
//! - [`TabulatedDispersion`]: complex data interpolated on real and imaginary
//!   parts separately, clamped to the table domain
//! - [`DispersionRegistry`]: name → table map built once and then shared
//!   read-only by every layer and particle that refers to it
//!
//! Data files hold whitespace separated `x yRe [yIm]` lines with `x` the
//! wavelength in nm. A `.nk` extension marks refractive index data, anything
//! else is permittivity.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use num_complex::Complex64;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::optics::to_permittivity;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    #[test]
    fn spline_passes_through_knots() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(spline.evaluate(*x), *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn spline_is_exact_for_lines() {
        let xs = vec![0.0, 1.0, 2.5, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::new(xs, ys).unwrap();
        assert_abs_diff_eq!(spline.evaluate(1.7), 3.0 * 1.7 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spline_rejects_unordered_knots() {
        assert!(CubicSpline::new(vec![1.0, 1.0], vec![0.0, 1.0]).is_err());
        assert!(CubicSpline::new(vec![], vec![]).is_err());
    }

    #[test]
    fn table_clamps_outside_domain() {
        let table = TabulatedDispersion::new(
            vec![400.0, 500.0, 600.0],
            vec![Complex64::new(2.0, 0.1), Complex64::new(3.0, 0.2), Complex64::new(5.0, 0.4)],
            TableKind::Permittivity,
        )
        .unwrap();
        assert_eq!(table.permittivity(100.0), table.permittivity(400.0));
        assert_eq!(table.permittivity(900.0), Complex64::new(5.0, 0.4));
    }

    #[test]
    fn refractive_index_tables_are_squared() {
        let table = TabulatedDispersion::new(
            vec![400.0, 800.0],
            vec![Complex64::new(2.0, 0.0), Complex64::new(2.0, 0.0)],
            TableKind::RefractiveIndex,
        )
        .unwrap();
        assert_abs_diff_eq!(table.permittivity(600.0).re, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn registry_loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut eps = fs::File::create(dir.path().join("film.txt")).unwrap();
        writeln!(eps, "# wavelength re im").unwrap();
        writeln!(eps, "400\t2.0\t0.5").unwrap();
        writeln!(eps, "500\t3.0\t0.5").unwrap();
        writeln!(eps, "600\t4.0\t0.5").unwrap();
        let mut nk = fs::File::create(dir.path().join("glass.nk")).unwrap();
        writeln!(nk, "300 1.5").unwrap();
        writeln!(nk, "900 1.5").unwrap();

        let registry = DispersionRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_abs_diff_eq!(registry.get("film").unwrap().permittivity(500.0).re, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(registry.get("glass").unwrap().permittivity(500.0).re, 2.25, epsilon = 1e-12);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn malformed_lines_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "400 abc\n").unwrap();
        match TabulatedDispersion::from_file(&path) {
            Err(Error::ResourceFormat { .. }) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}

/// Natural cubic spline (zero second derivative at both ends).
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Builds the spline. `xs` must be strictly increasing and non-empty.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> std::result::Result<Self, String> {
        if xs.len() != ys.len() {
            return Err(format!("{} knots but {} values", xs.len(), ys.len()));
        }
        if xs.is_empty() {
            return Err("no data points".to_string());
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(format!("knots are not strictly increasing at {}", xs[i]));
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        if n > 2 {
            let mut u = vec![0.0; n - 1];
            // forward sweep of the tridiagonal system
            for i in 1..n - 1 {
                let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
                let p = sig * y2s[i - 1] + 2.0;
                y2s[i] = (sig - 1.0) / p;
                let slope = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                    - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
                u[i] = (6.0 * slope / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
            }
            for k in (0..n - 2).rev() {
                y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
            }
        }

        Ok(Self { xs, ys, y2s })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluates the spline; outside the knots the boundary cubic is used.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 1 {
            return self.ys[0];
        }
        let hi = self.xs.partition_point(|&v| v < x).clamp(1, n - 1);
        let lo = hi - 1;

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }
}

/// What the tabulated complex values are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Permittivity,
    RefractiveIndex,
}

/// Interpolated complex dispersion over a wavelength table.
#[derive(Debug, Clone)]
pub struct TabulatedDispersion {
    re: CubicSpline,
    im: CubicSpline,
    kind: TableKind,
}

impl TabulatedDispersion {
    pub fn new(wavelengths: Vec<f64>, values: Vec<Complex64>, kind: TableKind) -> std::result::Result<Self, String> {
        let re = CubicSpline::new(wavelengths.clone(), values.iter().map(|v| v.re).collect())?;
        let im = CubicSpline::new(wavelengths, values.iter().map(|v| v.im).collect())?;
        Ok(Self { re, im, kind })
    }

    /// Reads a data file. Rows are sorted by wavelength before fitting.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Resource {
            path: path.to_path_buf(),
            source,
        })?;
        let malformed = |detail: String| Error::ResourceFormat {
            path: path.to_path_buf(),
            detail,
        };

        let mut rows = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| malformed(format!("line {}: {}", number + 1, e)))?;
            match fields.as_slice() {
                [x, re] => rows.push((*x, Complex64::new(*re, 0.0))),
                [x, re, im, ..] => rows.push((*x, Complex64::new(*re, *im))),
                _ => return Err(malformed(format!("line {}: expected 2 or 3 columns", number + 1))),
            }
        }
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));

        let kind = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("nk") => TableKind::RefractiveIndex,
            _ => TableKind::Permittivity,
        };
        let (wavelengths, values): (Vec<f64>, Vec<Complex64>) = rows.into_iter().unzip();
        Self::new(wavelengths, values, kind).map_err(malformed)
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Permittivity at `wl` (nm), clamped to the table domain.
    pub fn permittivity(&self, wl: f64) -> Complex64 {
        let (min, max) = self.re.domain();
        let wl = wl.clamp(min, max);
        let value = Complex64::new(self.re.evaluate(wl), self.im.evaluate(wl));
        match self.kind {
            TableKind::Permittivity => value,
            TableKind::RefractiveIndex => to_permittivity(value),
        }
    }
}

/// Table reference held by layers and particles. Two references are equal
/// when they point at the same registry entry.
#[derive(Debug, Clone)]
pub struct NamedTable {
    pub name: String,
    pub table: Arc<TabulatedDispersion>,
}

impl PartialEq for NamedTable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.table, &other.table)
    }
}

impl NamedTable {
    pub fn permittivity(&self, wl: f64) -> Complex64 {
        self.table.permittivity(wl)
    }
}

/// Named tabulated dispersions available to a structure description.
#[derive(Debug, Clone, Default)]
pub struct DispersionRegistry {
    tables: HashMap<String, Arc<TabulatedDispersion>>,
}

impl DispersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: TabulatedDispersion) {
        self.tables.insert(name.into(), Arc::new(table));
    }

    pub fn get(&self, name: &str) -> Option<Arc<TabulatedDispersion>> {
        self.tables.get(name).cloned()
    }

    /// Reference to the table `name`, or a structural error naming it.
    pub fn resolve(&self, name: &str) -> Result<NamedTable> {
        let table = self.get(name).ok_or_else(|| {
            Error::structural(
                "Unknown dispersion",
                format!("tabulated dispersion \"{}\" is not loaded", name),
            )
        })?;
        Ok(NamedTable {
            name: name.to_string(),
            table,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Loads every regular file of `dir`, named by its file stem.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| Error::Resource {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut registry = Self::new();
        for entry in entries {
            let path: PathBuf = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let table = TabulatedDispersion::from_file(&path)?;
            debug!("loaded dispersion '{}' from {:?} as {:?}", name, path, table.kind());
            registry.insert(name, table);
        }
        info!("loaded {} tabulated dispersions from {:?}", registry.len(), dir);
        Ok(registry)
    }
}
