//! Closed-form propagators for plain sums, products and quotients
//!
//! The derivatives of these shapes are known in advance, so no formula is parsed
//! or differentiated. Results agree with the symbolic path for the same function.
//!
//! Every operand is a pair of equal-length columns (values, errors). All columns are
//! validated before any row is computed.

use crate::PropagationError;
use crate::helpers::{check_equal_lengths, try_map_rows};
use tracing::{error, info};

/// One measured quantity: a column of values and the matching column of errors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operand<'a> {
    pub values: &'a [f64],
    pub errors: &'a [f64],
}

impl<'a> Operand<'a> {
    pub fn new(values: &'a [f64], errors: &'a [f64]) -> Self {
        Operand { values, errors }
    }
}

impl<'a> From<(&'a [f64], &'a [f64])> for Operand<'a> {
    fn from((values, errors): (&'a [f64], &'a [f64])) -> Self {
        Operand::new(values, errors)
    }
}

/// Check the operand count and column lengths, returning the row count.
///
/// Column `2i` is the value column of operand `i`, column `2i + 1` its error column.
fn validate(operands: &[Operand<'_>], min: usize) -> Result<usize, PropagationError> {
    if operands.len() < min {
        error!(
            "At least {} operands are required, got {}",
            min,
            operands.len()
        );
        return Err(PropagationError::arity("operands", min, operands.len()));
    }
    let columns: Vec<&[f64]> = operands
        .iter()
        .flat_map(|op| [op.values, op.errors])
        .collect();
    check_equal_lengths(&columns).inspect_err(|e| error!("{}", e))
}

/// Reject a zero value in any operand at `row`
fn check_nonzero(operands: &[Operand<'_>], row: usize) -> Result<(), PropagationError> {
    match operands.iter().position(|op| op.values[row] == 0.0) {
        Some(operand) => Err(PropagationError::DivisionByZero { row, operand }),
        None => Ok(()),
    }
}

fn finite(kind: &str, row: usize, value: f64) -> Result<f64, PropagationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PropagationError::NonFiniteResult {
            row,
            variable: kind.to_owned(),
            value,
        })
    }
}

/// Propagated uncertainty of `A + B + …`: `sqrt(Σ errᵢ²)` per row.
///
/// Values do not enter the result but must still match the error columns in length.
///
/// # Errors
/// `ArityMismatch` for fewer than two operands, `SizeMismatch` for unequal columns,
/// `NonFiniteResult` if an error entry is not finite.
pub fn fast_sum(operands: &[Operand<'_>]) -> Result<Vec<f64>, PropagationError> {
    info!("Closed-form sum of {} operands", operands.len());
    let rows = validate(operands, 2)?;

    try_map_rows(rows, |row| {
        let variance: f64 = operands.iter().map(|op| op.errors[row].powi(2)).sum();
        finite("sum", row, variance.sqrt())
    })
}

/// Propagated uncertainty of `A · B · …`: `|Π vᵢ| · sqrt(Σ (errᵢ/vᵢ)²)` per row.
///
/// # Errors
/// `ArityMismatch` for fewer than two operands, `SizeMismatch` for unequal columns,
/// `DivisionByZero` naming the row and operand of a zero value, `NonFiniteResult`
/// for any other non-finite row.
///
/// # Example
/// ```
/// use errprop::{fast_product, Operand};
///
/// let a = [2.0, 4.0];
/// let b = [3.0, 5.0];
/// let ea = [0.2, 0.4];
/// let eb = [0.3, 0.5];
/// let sigma = fast_product(&[Operand::new(&a, &ea), Operand::new(&b, &eb)]).unwrap();
/// assert!((sigma[0] - 6.0 * 0.02f64.sqrt()).abs() < 1e-12);
/// ```
pub fn fast_product(operands: &[Operand<'_>]) -> Result<Vec<f64>, PropagationError> {
    info!("Closed-form product of {} operands", operands.len());
    let rows = validate(operands, 2)?;

    try_map_rows(rows, |row| {
        check_nonzero(operands, row)?;
        let product: f64 = operands.iter().map(|op| op.values[row]).product();
        let relative: f64 = operands
            .iter()
            .map(|op| (op.errors[row] / op.values[row]).powi(2))
            .sum();
        finite("product", row, (product * relative.sqrt()).abs())
    })
}

/// Propagated uncertainty of `A / B`: `|A/B| · sqrt((errA/A)² + (errB/B)²)` per row.
///
/// # Errors
/// `SizeMismatch` for unequal columns, `DivisionByZero` when `A` (operand 0) or `B`
/// (operand 1) is zero at some row, `NonFiniteResult` for any other non-finite row.
pub fn fast_quotient(
    numerator: Operand<'_>,
    denominator: Operand<'_>,
) -> Result<Vec<f64>, PropagationError> {
    info!("Closed-form quotient");
    let operands = [numerator, denominator];
    let rows = validate(&operands, 2)?;

    try_map_rows(rows, |row| {
        check_nonzero(&operands, row)?;
        let (a, b) = (numerator.values[row], denominator.values[row]);
        let (ea, eb) = (numerator.errors[row], denominator.errors[row]);
        let relative = (ea / a).powi(2) + (eb / b).powi(2);
        finite("quotient", row, (a / b * relative.sqrt()).abs())
    })
}
