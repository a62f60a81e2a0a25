//! Complex number helpers shared by every optical model.
//!
//! Arithmetic and the elementary functions (`exp`, `sqrt`, `ln`, `atan`,
//! `powf`, `powc`) come from [`num_complex::Complex64`]. All of them use the
//! principal branch. This module adds the constants and parsers the rest of
//! the crate needs.

use num_complex::Complex64;

use crate::error::{Error, Result};


/// Imaginary unit.
pub const I: Complex64 = Complex64::new(0.0, 1.0);
/// Multiplicative identity.
pub const ONE: Complex64 = Complex64::new(1.0, 0.0);
/// Additive identity.
pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Real number lifted to the complex plane.
pub fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

/// Parses `"(re, im)"` or a plain real number.
pub fn parse_complex(text: &str) -> Result<Complex64> {
    let trimmed = text.trim();
    let malformed = || {
        Error::structural(
            "Malformed complex number",
            format!("expected \"(re, im)\" or a real number, got \"{}\"", text),
        )
    };

    if let Some(inner) = trimmed.strip_prefix('(') {
        let inner = inner.strip_suffix(')').ok_or_else(malformed)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(malformed());
        }
        let re = parts[0].parse::<f64>().map_err(|_| malformed())?;
        let im = parts[1].parse::<f64>().map_err(|_| malformed())?;
        return Ok(Complex64::new(re, im));
    }

    trimmed
        .parse::<f64>()
        .map(real)
        .map_err(|_| malformed())
}

/// `true` when `text` can be read by [`parse_complex`].
pub fn is_complex_literal(text: &str) -> bool {
    parse_complex(text).is_ok()
}
