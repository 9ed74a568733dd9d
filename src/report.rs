use crate::PropagationError;
use crate::differentiator::PreparedFunction;
use std::fmt;

/// Value and propagated error of `G` for one measurement.
///
/// `Display` prints the three-line summary
///
/// ```text
/// Function: G(x,y) = x y
/// Measured value: G(3, 4) = 1.2e1
/// Propagated error: 5.0e-1
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationReport {
    variables: Vec<String>,
    function: String,
    values: Vec<f64>,
    errors: Vec<f64>,
    value: f64,
    error: f64,
}

impl PropagationReport {
    pub(crate) fn new(
        prepared: &PreparedFunction,
        values: &[f64],
        errors: &[f64],
    ) -> Result<Self, PropagationError> {
        let error = prepared.propagate_scalar(values, errors)?;
        let value = prepared.value_at(values)?;
        Ok(Self {
            variables: prepared.variables().to_vec(),
            function: prepared.expr().display_form(),
            values: values.to_vec(),
            errors: errors.to_vec(),
            value,
            error,
        })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// `G` in diagnostic display form
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// `G` evaluated at the measured values
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Propagated uncertainty of `G`
    pub fn error(&self) -> f64 {
        self.error
    }
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

impl fmt::Display for PropagationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Function: G({}) = {}",
            self.variables.join(","),
            self.function
        )?;
        writeln!(
            f,
            "Measured value: G({}) = {:.1e}",
            join(&self.values, ", "),
            self.value
        )?;
        write!(f, "Propagated error: {:.1e}", self.error)
    }
}
