//! First-order measurement uncertainty propagation
//!
//! Given a formula `G(x_1, …, x_n)`, measured values `x_i` and their uncertainties
//! `σ_i`, computes
//!
//! ```text
//! σ_G = sqrt( Σ_i (∂G/∂x_i · σ_i)² )
//! ```
//!
//! with the partial derivatives obtained symbolically and compiled to bytecode once
//! per formula. Inputs are assumed uncorrelated.
//!
//! # Features
//! - Mathematica-style formula syntax (`a Exp[b]`, `Log[x]`, `x^2 y`)
//! - Scalar and column-batched propagation
//! - Closed-form fast paths for sums, products and quotients
//! - Opt-in diagnostic log, configured per [`Propagator`]
//! - Row-parallel batches with the `parallel` feature
//!
//! # Usage Examples
//!
//! ## Free functions
//! ```
//! use errprop::{build_derivatives, propagate_scalar};
//!
//! let derivatives = build_derivatives(&["x", "y", "z"], "x^2 y + z").unwrap();
//! let sigma = propagate_scalar(&derivatives, &[1.0, 2.0, 3.0], &[0.1, 0.1, 0.1]).unwrap();
//! assert!(sigma > 0.0);
//! ```
//!
//! ## Builder API
//! ```no_run
//! use errprop::{DiagnosticLog, Propagator};
//!
//! let report = Propagator::new()
//!     .log(DiagnosticLog::to_default_file()?)
//!     .report(&["a", "b"], "a Exp[b]", &[2.0, 0.5], &[0.1, 0.01])?;
//! println!("{report}");
//! # Ok::<(), errprop::PropagationError>(())
//! ```

mod ast;
mod builder;
mod closed_form;
mod differentiation;
mod differentiator;
mod display;
mod error;
pub mod evaluator;
pub(crate) mod functions;
mod helpers;
pub mod known_symbols;
mod logging;
mod parser;
mod report;
mod uncertainty;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use ast::{Expr, ExprKind};
pub use builder::Propagator;
pub use closed_form::{Operand, fast_product, fast_quotient, fast_sum};
pub use differentiator::{DerivativeEvaluator, PreparedFunction, build_derivatives};
pub use error::{PropagationError, Span};
pub use evaluator::{CompiledEvaluator, MAX_STACK_DEPTH};
pub use helpers::check_equal_lengths;
pub use logging::{DEFAULT_LOG_FILE, DiagnosticLog};
pub use parser::parse;
pub use report::PropagationReport;
pub use uncertainty::{propagate_batch, propagate_scalar, relative_uncertainty};

/// Default maximum AST depth
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default maximum AST node count
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Propagated uncertainty of `formula` for one measurement
///
/// # Arguments
/// * `variables` - Names of the measured quantities, in the order of `values`
/// * `formula` - The function `G` (e.g., "a Exp[b]")
/// * `values` - One measured value per variable
/// * `errors` - One uncertainty per variable
///
/// # Example
/// ```
/// let sigma = errprop::propagate(&["a", "b"], "a + b", &[1.0, 2.0], &[0.3, 0.4]).unwrap();
/// assert!((sigma - 0.5).abs() < 1e-12);
/// ```
///
/// # Note
/// For the diagnostic log or custom limits, use the [`Propagator`] builder:
/// ```ignore
/// Propagator::new().log(log).propagate_scalar(&["a", "b"], "a + b", &values, &errors)
/// ```
pub fn propagate(
    variables: &[&str],
    formula: &str,
    values: &[f64],
    errors: &[f64],
) -> Result<f64, PropagationError> {
    Propagator::new().propagate_scalar(variables, formula, values, errors)
}
