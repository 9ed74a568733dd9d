//! Shared helpers for the row-wise propagators
//!
//! Input validation for parallel arrays and the row loop, which runs on the rayon
//! pool when the `parallel` feature is enabled.

use crate::PropagationError;

/// Check that every column has the same length and return that length.
///
/// An empty slice of columns has zero rows. Lengths are compared against the first
/// column; the first column that differs is reported by position.
///
/// # Errors
/// `SizeMismatch { index, expected, got }` for the first offending column.
///
/// # Example
/// ```
/// use errprop::{check_equal_lengths, PropagationError};
///
/// assert_eq!(check_equal_lengths(&[vec![1.0, 2.0], vec![3.0, 4.0]]), Ok(2));
/// assert_eq!(
///     check_equal_lengths(&[&[1.0, 2.0, 3.0][..], &[1.0][..]]),
///     Err(PropagationError::SizeMismatch { index: 1, expected: 3, got: 1 })
/// );
/// ```
pub fn check_equal_lengths<C: AsRef<[f64]>>(columns: &[C]) -> Result<usize, PropagationError> {
    let Some(first) = columns.first() else {
        return Ok(0);
    };
    let expected = first.as_ref().len();

    match columns
        .iter()
        .enumerate()
        .find(|(_, c)| c.as_ref().len() != expected)
    {
        Some((index, column)) => Err(PropagationError::SizeMismatch {
            index,
            expected,
            got: column.as_ref().len(),
        }),
        None => Ok(expected),
    }
}

/// Apply `f` to every row index, collecting results in row order
#[cfg(not(feature = "parallel"))]
pub(crate) fn try_map_rows<F>(rows: usize, f: F) -> Result<Vec<f64>, PropagationError>
where
    F: Fn(usize) -> Result<f64, PropagationError> + Sync + Send,
{
    (0..rows).map(f).collect()
}

/// Apply `f` to every row index, collecting results in row order
#[cfg(feature = "parallel")]
pub(crate) fn try_map_rows<F>(rows: usize, f: F) -> Result<Vec<f64>, PropagationError>
where
    F: Fn(usize) -> Result<f64, PropagationError> + Sync + Send,
{
    use rayon::prelude::*;

    (0..rows).into_par_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_columns() {
        let columns: [Vec<f64>; 0] = [];
        assert_eq!(check_equal_lengths(&columns), Ok(0));
    }

    #[test]
    fn test_reports_first_mismatch() {
        let columns = [vec![1.0; 4], vec![1.0; 4], vec![1.0; 2], vec![1.0; 7]];
        assert_eq!(
            check_equal_lengths(&columns),
            Err(PropagationError::SizeMismatch {
                index: 2,
                expected: 4,
                got: 2
            })
        );
    }

    #[test]
    fn test_map_rows_preserves_order() {
        let out = try_map_rows(1000, |r| Ok(r as f64)).unwrap();
        assert!(out.iter().enumerate().all(|(i, v)| *v == i as f64));
    }

    #[test]
    fn test_map_rows_propagates_error() {
        let result = try_map_rows(10, |r| {
            if r == 7 {
                Err(PropagationError::DivisionByZero { row: r, operand: 0 })
            } else {
                Ok(0.0)
            }
        });
        assert_eq!(
            result,
            Err(PropagationError::DivisionByZero { row: 7, operand: 0 })
        );
    }
}
