//! Parameter slots shared by fixed and mutable structures.
//!
//! Every physical quantity of a layer, particle or exciton is stored in a
//! slot `S: Slot`:
//! - `f64` for structures computed once
//! - [`VarParameter`] for structures driven by a sweep or a randomization
//!
//! A [`VarParameter`] is either a constant, which can never be changed, or a
//! variable whose value starts unset and is assigned before every
//! computation. Reading an unset variable is an [`Error::Uninitialized`]
//! error, assigning a constant is an [`Error::ConstantMutation`] error.
//!
//! In a structure description a plain number is a constant, while
//! `{"var": true, ...}` nodes declare how the variable is driven:
//! - `{"var": true, "mean": m, "deviation": s}` for randomization
//! - `{"var": true, "start": a, "end": b, "step": c}` for a linear sweep
//! - `{"var": true, "file": "values.txt"}` for a sweep over listed values

use std::fmt;
use std::path::PathBuf;

use num_complex::Complex64;
use serde_json::Value;

use crate::complex::parse_complex;
use crate::error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_variable_is_uninitialized() {
        let p = VarParameter::variable("d", Variation::Random { mean: 10.0, deviation: 1.0 });
        match p.value() {
            Err(Error::Uninitialized { parameter }) => assert_eq!(parameter, "d"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn constant_rejects_mutation() {
        let mut p = VarParameter::constant("cal", 0.3);
        assert!(matches!(p.set(0.4), Err(Error::ConstantMutation { .. })));
        assert_eq!(p.value().unwrap(), 0.3);
    }

    #[test]
    fn set_then_clear() {
        let mut p = VarParameter::variable("d", Variation::Range { start: 1.0, end: 2.0, step: 0.5 });
        p.set(1.5).unwrap();
        assert_eq!(p.value().unwrap(), 1.5);
        p.clear();
        assert!(p.value().is_err());
    }

    #[test]
    fn parses_variable_nodes() {
        let random = VarParameter::from_node(&json!({"var": true, "mean": 5, "deviation": 0.5}), "d").unwrap();
        assert_eq!(random.variation(), &Variation::Random { mean: 5.0, deviation: 0.5 });
        assert!(random.is_variable());

        let range = VarParameter::from_node(&json!({"var": true, "start": 400, "end": 800, "step": 100}), "d").unwrap();
        assert_eq!(range.variation(), &Variation::Range { start: 400.0, end: 800.0, step: 100.0 });

        let file = VarParameter::from_node(&json!({"var": true, "file": "v.txt"}), "d").unwrap();
        assert_eq!(file.variation(), &Variation::File(PathBuf::from("v.txt")));

        let constant = VarParameter::from_node(&json!(12.5), "d").unwrap();
        assert!(!constant.is_variable());
        assert_eq!(constant.value().unwrap(), 12.5);
    }

    #[test]
    fn rejects_bad_variable_nodes() {
        assert!(VarParameter::from_node(&json!({"var": true}), "d").is_err());
        assert!(VarParameter::from_node(&json!({"var": true, "start": 1, "end": 2, "step": 0}), "d").is_err());
        assert!(VarParameter::from_node(&json!({"var": true, "mean": 1, "deviation": -1}), "d").is_err());
        assert!(VarParameter::from_node(&json!("abc"), "d").is_err());
    }

    #[test]
    fn fixed_slots_reject_variables() {
        assert_eq!(<f64 as Slot>::from_node(&json!(3), "d").unwrap(), 3.0);
        assert_eq!(<f64 as Slot>::from_node(&json!("2.5"), "d").unwrap(), 2.5);
        assert!(<f64 as Slot>::from_node(&json!({"var": true, "mean": 1, "deviation": 0}), "d").is_err());
    }

    #[test]
    fn complex_slot_forms() {
        let pair = ComplexSlot::<f64>::from_node(&json!("(3.6, -0.1)"), "eps").unwrap();
        assert_eq!(pair.value().unwrap(), Complex64::new(3.6, -0.1));
        let array = ComplexSlot::<f64>::from_node(&json!([1, 2]), "eps").unwrap();
        assert_eq!(array.value().unwrap(), Complex64::new(1.0, 2.0));
        let split = ComplexSlot::<VarParameter>::from_node(
            &json!({"re": {"var": true, "mean": 12, "deviation": 1}, "im": 0.1}),
            "eps",
        )
        .unwrap();
        assert!(split.re.is_variable());
        assert!(!split.im.is_variable());
    }
}

/// How a variable parameter receives its values.
#[derive(Debug, Clone, PartialEq)]
pub enum Variation {
    /// Never changes.
    Constant,
    /// Drawn from a normal distribution for each randomization trial.
    Random { mean: f64, deviation: f64 },
    /// Linear sweep, end inclusive.
    Range { start: f64, end: f64, step: f64 },
    /// Sweep over the values listed one per line in a file.
    File(PathBuf),
}

/// Quantity that may be varied between computations.
#[derive(Debug, Clone, PartialEq)]
pub struct VarParameter {
    name: String,
    value: Option<f64>,
    variation: Variation,
}

impl VarParameter {
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            variation: Variation::Constant,
        }
    }

    pub fn variable(name: impl Into<String>, variation: Variation) -> Self {
        Self {
            name: name.into(),
            value: None,
            variation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variation(&self) -> &Variation {
        &self.variation
    }

    pub fn is_variable(&self) -> bool {
        self.variation != Variation::Constant
    }

    pub fn value(&self) -> Result<f64> {
        self.value.ok_or_else(|| Error::Uninitialized {
            parameter: self.name.clone(),
        })
    }

    pub fn set(&mut self, value: f64) -> Result<()> {
        if !self.is_variable() {
            return Err(Error::ConstantMutation {
                parameter: self.name.clone(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    /// Forgets the current value of a variable; constants keep theirs.
    pub fn clear(&mut self) {
        if self.is_variable() {
            self.value = None;
        }
    }

    fn from_var_node(node: &Value, name: &str) -> Result<Self> {
        let field = |key: &str| -> Result<Option<f64>> {
            match node.get(key) {
                None => Ok(None),
                Some(v) => number(v, &format!("{}.{}", name, key)).map(Some),
            }
        };

        if let Some(file) = node.get("file") {
            let path = file.as_str().ok_or_else(|| {
                Error::structural("Invalid variable parameter", format!("\"{}.file\" must be a path string", name))
            })?;
            return Ok(Self::variable(name, Variation::File(PathBuf::from(path))));
        }

        match (field("mean")?, field("deviation")?, field("start")?, field("end")?, field("step")?) {
            (Some(mean), deviation, None, None, None) => {
                let deviation = deviation.unwrap_or(0.0);
                if deviation < 0.0 {
                    return Err(Error::structural(
                        "Invalid variable parameter",
                        format!("deviation of \"{}\" must be non-negative", name),
                    ));
                }
                Ok(Self::variable(name, Variation::Random { mean, deviation }))
            }
            (None, None, Some(start), Some(end), Some(step)) => {
                if step <= 0.0 || end < start {
                    return Err(Error::structural(
                        "Invalid variable parameter",
                        format!("range of \"{}\" needs start <= end and a positive step", name),
                    ));
                }
                Ok(Self::variable(name, Variation::Range { start, end, step }))
            }
            _ => Err(Error::structural(
                "Invalid variable parameter",
                format!(
                    "\"{}\" must define either mean/deviation, start/end/step or file",
                    name
                ),
            )),
        }
    }
}

impl fmt::Display for VarParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.variation, self.value) {
            (Variation::Constant, Some(v)) => write!(f, "{} = {}", self.name, v),
            (variation, Some(v)) => write!(f, "{} = {} ({:?})", self.name, v, variation),
            (variation, None) => write!(f, "{} unset ({:?})", self.name, variation),
        }
    }
}

/// `true` for `{"var": true, ...}` nodes.
pub fn is_var_node(node: &Value) -> bool {
    node.get("var").and_then(Value::as_bool).unwrap_or(false)
}

/// Reads a number given either as a JSON number or a numeric string.
pub fn number(node: &Value, name: &str) -> Result<f64> {
    let parsed = match node {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::structural(
            "Invalid number",
            format!("\"{}\" must be a number, got {}", name, node),
        )
    })
}

/// Storage of one real quantity, fixed or variable.
pub trait Slot: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    fn value(&self) -> Result<f64>;

    fn as_var(&self) -> Option<&VarParameter>;

    fn as_var_mut(&mut self) -> Option<&mut VarParameter>;

    /// Builds the slot named `name` from a description node.
    fn from_node(node: &Value, name: &str) -> Result<Self>;

    fn constant(name: &str, value: f64) -> Self;
}

impl Slot for f64 {
    fn value(&self) -> Result<f64> {
        Ok(*self)
    }

    fn as_var(&self) -> Option<&VarParameter> {
        None
    }

    fn as_var_mut(&mut self) -> Option<&mut VarParameter> {
        None
    }

    fn from_node(node: &Value, name: &str) -> Result<Self> {
        if is_var_node(node) {
            return Err(Error::structural(
                "Unexpected variable parameter",
                format!("\"{}\" is variable, but the structure is not computed as a sweep or randomization", name),
            ));
        }
        number(node, name)
    }

    fn constant(_name: &str, value: f64) -> Self {
        value
    }
}

impl Slot for VarParameter {
    fn value(&self) -> Result<f64> {
        VarParameter::value(self)
    }

    fn as_var(&self) -> Option<&VarParameter> {
        Some(self)
    }

    fn as_var_mut(&mut self) -> Option<&mut VarParameter> {
        Some(self)
    }

    fn from_node(node: &Value, name: &str) -> Result<Self> {
        if is_var_node(node) {
            return Self::from_var_node(node, name);
        }
        number(node, name).map(|v| Self::constant(name, v))
    }

    fn constant(name: &str, value: f64) -> Self {
        VarParameter::constant(name, value)
    }
}

/// Complex quantity stored as two real slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSlot<S> {
    pub re: S,
    pub im: S,
}

impl<S: Slot> ComplexSlot<S> {
    pub fn constant(name: &str, value: Complex64) -> Self {
        Self {
            re: S::constant(&format!("{}.re", name), value.re),
            im: S::constant(&format!("{}.im", name), value.im),
        }
    }

    pub fn value(&self) -> Result<Complex64> {
        Ok(Complex64::new(self.re.value()?, self.im.value()?))
    }

    /// Accepts `"(re, im)"`, a real number, `[re, im]` or `{"re": .., "im": ..}`.
    /// A variable node stands for the real part.
    pub fn from_node(node: &Value, name: &str) -> Result<Self> {
        let re_name = format!("{}.re", name);
        let im_name = format!("{}.im", name);
        match node {
            Value::String(text) => Ok(Self::constant(name, parse_complex(text)?)),
            Value::Number(_) => Ok(Self {
                re: S::from_node(node, &re_name)?,
                im: S::constant(&im_name, 0.0),
            }),
            Value::Array(parts) if parts.len() == 2 => Ok(Self {
                re: S::from_node(&parts[0], &re_name)?,
                im: S::from_node(&parts[1], &im_name)?,
            }),
            Value::Object(_) if is_var_node(node) => Ok(Self {
                re: S::from_node(node, &re_name)?,
                im: S::constant(&im_name, 0.0),
            }),
            Value::Object(fields) if fields.contains_key("re") => Ok(Self {
                re: S::from_node(&fields["re"], &re_name)?,
                im: match fields.get("im") {
                    Some(im) => S::from_node(im, &im_name)?,
                    None => S::constant(&im_name, 0.0),
                },
            }),
            _ => Err(Error::structural(
                "Invalid complex number",
                format!("\"{}\" must be \"(re, im)\", a number, [re, im] or {{\"re\", \"im\"}}, got {}", name, node),
            )),
        }
    }

    pub fn slots_mut(&mut self) -> [&mut S; 2] {
        [&mut self.re, &mut self.im]
    }

    pub fn slots(&self) -> [&S; 2] {
        [&self.re, &self.im]
    }
}
