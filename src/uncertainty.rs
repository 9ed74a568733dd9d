//! Uncertainty propagation for symbolic expressions
//!
//! Combines partial derivatives into a propagated uncertainty using the
//! first-order formula for uncorrelated inputs:
//! σ_G² = Σᵢ (∂G/∂xᵢ)² σᵢ²
//!
//! # Reference
//!
//! JCGM 100:2008 "Evaluation of measurement data — Guide to the expression
//! of uncertainty in measurement" (GUM), Section 5.1.2
//! <https://www.bipm.org/documents/20126/2071204/JCGM_100_2008_E.pdf>

use crate::differentiator::DerivativeEvaluator;
use crate::helpers::{check_equal_lengths, try_map_rows};
use crate::PropagationError;
use tracing::error;

fn non_finite(row: usize, variable: &str, value: f64) -> PropagationError {
    PropagationError::NonFiniteResult {
        row,
        variable: variable.to_owned(),
        value,
    }
}

/// Quadrature sum of `derivative_i * error_i` for one row
///
/// A non-finite term is reported against its variable, an overflowing total against `G`.
fn combine_row<F>(
    evaluators: &[DerivativeEvaluator],
    values: &[f64],
    error_at: F,
    row: usize,
) -> Result<f64, PropagationError>
where
    F: Fn(usize) -> f64,
{
    let mut variance = 0.0;
    for (i, d) in evaluators.iter().enumerate() {
        let term = d.evaluate_row(values, row)? * error_at(i);
        if !term.is_finite() {
            return Err(non_finite(row, d.variable(), term));
        }
        variance += term * term;
    }
    let sigma = variance.sqrt();
    if sigma.is_finite() {
        Ok(sigma)
    } else {
        Err(non_finite(row, "G", sigma))
    }
}

fn check_count(what: &'static str, expected: usize, got: usize) -> Result<(), PropagationError> {
    if expected == got {
        Ok(())
    } else {
        error!(
            "The number of variables ({}) does not match the number of {} ({})",
            expected, what, got
        );
        Err(PropagationError::arity(what, expected, got))
    }
}

/// Propagated uncertainty `sqrt(Σ (∂G/∂xᵢ(values) · errors[i])²)` for one measurement.
///
/// # Errors
/// - `ArityMismatch` unless `values` and `errors` both hold one entry per evaluator
/// - `NonFiniteResult` if a derivative, an uncertainty term or the result is `NaN` or
///   infinite
///
/// # Example
/// ```
/// use errprop::{build_derivatives, propagate_scalar};
///
/// let d = build_derivatives(&["x", "y"], "x y").unwrap();
/// let sigma = propagate_scalar(&d, &[3.0, 4.0], &[0.1, 0.1]).unwrap();
/// assert!((sigma - 0.5).abs() < 1e-12);
/// ```
pub fn propagate_scalar(
    evaluators: &[DerivativeEvaluator],
    values: &[f64],
    errors: &[f64],
) -> Result<f64, PropagationError> {
    check_count("values", evaluators.len(), values.len())?;
    check_count("errors", evaluators.len(), errors.len())?;
    combine_row(evaluators, values, |i| errors[i], 0)
}

/// Propagated uncertainty for every row of a batch.
///
/// `value_columns[i]` and `error_columns[i]` hold the measurements of variable `i`;
/// row `r` of the output is computed from row `r` of every column. Rows are
/// independent and, with the `parallel` feature, evaluated on the rayon pool; output
/// order always follows input order.
///
/// All validation happens before any row is evaluated.
///
/// # Errors
/// - `ArityMismatch` unless there is one value column and one error column per evaluator
/// - `SizeMismatch` if any column length differs from the first value column; `index`
///   counts value columns first, then error columns
/// - `NonFiniteResult` for the first failing row (any failing row in parallel mode)
pub fn propagate_batch<V, E>(
    evaluators: &[DerivativeEvaluator],
    value_columns: &[V],
    error_columns: &[E],
) -> Result<Vec<f64>, PropagationError>
where
    V: AsRef<[f64]> + Sync,
    E: AsRef<[f64]> + Sync,
{
    check_count("value columns", evaluators.len(), value_columns.len())?;
    check_count("error columns", evaluators.len(), error_columns.len())?;

    let columns: Vec<&[f64]> = value_columns
        .iter()
        .map(AsRef::as_ref)
        .chain(error_columns.iter().map(AsRef::as_ref))
        .collect();
    let rows = check_equal_lengths(&columns).inspect_err(|e| error!("{}", e))?;

    try_map_rows(rows, |row| {
        let values: Vec<f64> = value_columns.iter().map(|c| c.as_ref()[row]).collect();
        combine_row(evaluators, &values, |i| error_columns[i].as_ref()[row], row)
    })
}

/// Relative uncertainty `σ / |value|`
///
/// # Errors
/// `NonFiniteResult` when `value` is zero or the ratio is otherwise not finite.
pub fn relative_uncertainty(value: f64, sigma: f64) -> Result<f64, PropagationError> {
    let ratio = sigma / value.abs();
    if ratio.is_finite() {
        Ok(ratio)
    } else {
        Err(non_finite(0, "G", ratio))
    }
}
