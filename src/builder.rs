//! Builder pattern API for uncertainty propagation
//!
//! Provides a fluent interface for configuring expression limits and the optional
//! diagnostic log, then running any of the propagators under that configuration.
//!
//! # Example
//! ```
//! use errprop::Propagator;
//!
//! let sigma = Propagator::new()
//!     .max_nodes(500)
//!     .propagate_scalar(&["x", "y"], "x y", &[3.0, 4.0], &[0.1, 0.1])
//!     .unwrap();
//! assert!((sigma - 0.5).abs() < 1e-12);
//! ```

use crate::closed_form::{self, Operand};
use crate::differentiator::{DerivativeEvaluator, PreparedFunction};
use crate::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, DiagnosticLog, PropagationError, PropagationReport,
};
use tracing::Dispatch;
use tracing::subscriber::NoSubscriber;

/// Builder for propagation calls
#[derive(Debug, Clone)]
pub struct Propagator {
    log: Option<DiagnosticLog>,
    max_depth: usize,
    max_nodes: usize,
}

impl Default for Propagator {
    fn default() -> Self {
        Self {
            log: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl Propagator {
    /// Create a new builder: no log, default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Write diagnostics of every call to `log`
    pub fn log(mut self, log: DiagnosticLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Set maximum AST depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set maximum AST node count
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Run `f` with the configured log, or with all events discarded
    fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.log {
            Some(log) => log.in_scope(f),
            None => tracing::dispatcher::with_default(&Dispatch::new(NoSubscriber::default()), f),
        }
    }

    /// Parse `formula` and compile `G` with all its partial derivatives
    ///
    /// # Errors
    /// See [`build_derivatives`](crate::build_derivatives).
    pub fn prepare(
        &self,
        variables: &[&str],
        formula: &str,
    ) -> Result<PreparedFunction, PropagationError> {
        self.scoped(|| {
            PreparedFunction::with_limits(variables, formula, self.max_depth, self.max_nodes)
        })
    }

    /// [`build_derivatives`](crate::build_derivatives) under this configuration
    pub fn build_derivatives(
        &self,
        variables: &[&str],
        formula: &str,
    ) -> Result<Vec<DerivativeEvaluator>, PropagationError> {
        self.prepare(variables, formula)
            .map(PreparedFunction::into_derivatives)
    }

    /// Build the derivatives of `formula` and propagate one measurement
    pub fn propagate_scalar(
        &self,
        variables: &[&str],
        formula: &str,
        values: &[f64],
        errors: &[f64],
    ) -> Result<f64, PropagationError> {
        let prepared = self.prepare(variables, formula)?;
        self.scoped(|| prepared.propagate_scalar(values, errors))
    }

    /// Build the derivatives of `formula` and propagate every row of a batch
    pub fn propagate_batch<V, E>(
        &self,
        variables: &[&str],
        formula: &str,
        value_columns: &[V],
        error_columns: &[E],
    ) -> Result<Vec<f64>, PropagationError>
    where
        V: AsRef<[f64]> + Sync,
        E: AsRef<[f64]> + Sync,
    {
        let prepared = self.prepare(variables, formula)?;
        self.scoped(|| prepared.propagate_batch(value_columns, error_columns))
    }

    /// Value and propagated error of `G` for one measurement
    ///
    /// # Example
    /// ```
    /// use errprop::Propagator;
    ///
    /// let report = Propagator::new()
    ///     .report(&["a", "b"], "a/b", &[1.0, 2.0], &[0.1, 0.2])
    ///     .unwrap();
    /// assert_eq!(report.value(), 0.5);
    /// println!("{report}");
    /// ```
    pub fn report(
        &self,
        variables: &[&str],
        formula: &str,
        values: &[f64],
        errors: &[f64],
    ) -> Result<PropagationReport, PropagationError> {
        let prepared = self.prepare(variables, formula)?;
        self.scoped(|| PropagationReport::new(&prepared, values, errors))
    }

    /// [`fast_sum`](crate::fast_sum) under this configuration
    pub fn fast_sum(&self, operands: &[Operand<'_>]) -> Result<Vec<f64>, PropagationError> {
        self.scoped(|| closed_form::fast_sum(operands))
    }

    /// [`fast_product`](crate::fast_product) under this configuration
    pub fn fast_product(&self, operands: &[Operand<'_>]) -> Result<Vec<f64>, PropagationError> {
        self.scoped(|| closed_form::fast_product(operands))
    }

    /// [`fast_quotient`](crate::fast_quotient) under this configuration
    pub fn fast_quotient(
        &self,
        numerator: Operand<'_>,
        denominator: Operand<'_>,
    ) -> Result<Vec<f64>, PropagationError> {
        self.scoped(|| closed_form::fast_quotient(numerator, denominator))
    }
}
