//! Symbolic differentiator
//!
//! Parses a formula once, differentiates it with respect to every declared variable
//! and compiles each partial derivative into a [`CompiledEvaluator`] that takes one
//! value per variable, in declaration order.

use crate::evaluator::CompiledEvaluator;
use crate::uncertainty;
use crate::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, Expr, PropagationError, parser};
use rustc_hash::FxHashSet;
use tracing::{debug, error, info};

/// Numeric evaluator for one partial derivative `∂G/∂x`
#[derive(Debug, Clone)]
pub struct DerivativeEvaluator {
    variable: String,
    expr: Expr,
    compiled: CompiledEvaluator,
}

impl DerivativeEvaluator {
    fn new(variable: &str, expr: Expr, variables: &[String]) -> Result<Self, PropagationError> {
        let compiled = CompiledEvaluator::compile(&expr, variables)?.with_label(variable);
        Ok(Self {
            variable: variable.to_owned(),
            expr,
            compiled,
        })
    }

    /// The variable this derivative is taken with respect to
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The symbolic derivative
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Number of values expected by [`evaluate`](Self::evaluate)
    pub fn arity(&self) -> usize {
        self.compiled.param_count()
    }

    /// Evaluate the derivative at a point given one value per declared variable.
    ///
    /// # Errors
    /// - `ArityMismatch` if `values` does not hold one value per variable
    /// - `NonFiniteResult` if the derivative is `NaN` or infinite at this point
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, PropagationError> {
        self.compiled.evaluate_checked(values)
    }

    /// Evaluate without the arity check, reporting a non-finite value against `row`
    pub(crate) fn evaluate_row(&self, values: &[f64], row: usize) -> Result<f64, PropagationError> {
        let value = self.compiled.evaluate(values);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PropagationError::NonFiniteResult {
                row,
                variable: self.variable.clone(),
                value,
            })
        }
    }
}

/// Build one derivative evaluator per variable, in the order of `variables`.
///
/// Uses the default expression limits ([`DEFAULT_MAX_DEPTH`], [`DEFAULT_MAX_NODES`]).
/// See [`Propagator`](crate::Propagator) to change them or to enable the diagnostic log.
///
/// # Errors
/// `DuplicateVariable`, `EmptyFormula`, `ParseError`, `UndefinedVariable`,
/// `MaxDepthExceeded`, `MaxNodesExceeded`.
///
/// # Example
/// ```
/// use errprop::build_derivatives;
///
/// let derivatives = build_derivatives(&["x", "y"], "x^2 + y^2").unwrap();
/// assert_eq!(derivatives.len(), 2);
/// assert_eq!(derivatives[1].evaluate(&[1.0, 2.0]).unwrap(), 4.0);
/// ```
pub fn build_derivatives(
    variables: &[&str],
    formula: &str,
) -> Result<Vec<DerivativeEvaluator>, PropagationError> {
    PreparedFunction::new(variables, formula).map(PreparedFunction::into_derivatives)
}

/// A parsed function `G(x_1, …, x_n)` together with its compiled partial derivatives
#[derive(Debug, Clone)]
pub struct PreparedFunction {
    variables: Vec<String>,
    expr: Expr,
    function: CompiledEvaluator,
    derivatives: Vec<DerivativeEvaluator>,
}

impl PreparedFunction {
    /// Parse and differentiate `formula` with the default limits
    ///
    /// # Errors
    /// Same as [`build_derivatives`].
    pub fn new(variables: &[&str], formula: &str) -> Result<Self, PropagationError> {
        Self::with_limits(variables, formula, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES)
    }

    pub(crate) fn with_limits(
        variables: &[&str],
        formula: &str,
        max_depth: usize,
        max_nodes: usize,
    ) -> Result<Self, PropagationError> {
        info!("Building derivatives of G({})", variables.join(","));

        let mut seen = FxHashSet::default();
        for name in variables {
            if !seen.insert(*name) {
                error!("Variable '{}' is declared more than once", name);
                return Err(PropagationError::DuplicateVariable((*name).to_owned()));
            }
        }
        let names: Vec<String> = variables.iter().map(|v| (*v).to_owned()).collect();
        debug!("Created variables --> ({})", names.join(", "));

        let expr = parser::parse(formula, variables)?;
        if expr.max_depth() > max_depth {
            return Err(PropagationError::MaxDepthExceeded);
        }
        if expr.node_count() > max_nodes {
            return Err(PropagationError::MaxNodesExceeded);
        }
        debug!(
            "Function: G({}) = {}",
            variables.join(","),
            expr.display_form()
        );

        let function = CompiledEvaluator::compile(&expr, &names)?.with_label("G");

        let derivatives = names
            .iter()
            .map(|var| {
                let derivative = expr.derive(var);
                debug!("Derivative --> dG/d{} = {}", var, derivative.display_form());
                DerivativeEvaluator::new(var, derivative, &names)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            variables: names,
            expr,
            function,
            derivatives,
        })
    }

    /// Declared variable names, in order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The parsed function
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// One evaluator per variable, in declaration order
    pub fn derivatives(&self) -> &[DerivativeEvaluator] {
        &self.derivatives
    }

    pub fn into_derivatives(self) -> Vec<DerivativeEvaluator> {
        self.derivatives
    }

    fn check_arity(&self, what: &'static str, got: usize) -> Result<(), PropagationError> {
        if got == self.variables.len() {
            Ok(())
        } else {
            error!(
                "The number of variables ({}) does not match the number of {} ({})",
                self.variables.len(),
                what,
                got
            );
            Err(PropagationError::arity(what, self.variables.len(), got))
        }
    }

    /// Evaluate `G` itself at the central measurement point
    ///
    /// # Errors
    /// `ArityMismatch`, or `NonFiniteResult` naming `G`.
    pub fn value_at(&self, values: &[f64]) -> Result<f64, PropagationError> {
        self.check_arity("values", values.len())?;
        let value = self.function.evaluate_checked(values)?;
        debug!("Computed the value of G --> {}", value);
        Ok(value)
    }

    /// Partial derivative values at a point, in declaration order
    ///
    /// # Errors
    /// `ArityMismatch` when `values` does not hold one value per variable, before any
    /// derivative is evaluated; `NonFiniteResult` for a derivative that is not finite.
    pub fn gradient_at(&self, values: &[f64]) -> Result<Vec<f64>, PropagationError> {
        self.check_arity("values", values.len())?;
        self.derivatives
            .iter()
            .map(|d| {
                let value = d.evaluate_row(values, 0)?;
                debug!("Derivative value --> dG/d{} = {}", d.variable(), value);
                Ok(value)
            })
            .collect()
    }

    /// Propagated uncertainty for a single measurement
    ///
    /// # Errors
    /// See [`uncertainty::propagate_scalar`].
    pub fn propagate_scalar(&self, values: &[f64], errors: &[f64]) -> Result<f64, PropagationError> {
        self.check_arity("values", values.len())?;
        self.check_arity("errors", errors.len())?;
        let sigma = uncertainty::propagate_scalar(&self.derivatives, values, errors)?;
        debug!("Computed the error on G --> {}", sigma);
        Ok(sigma)
    }

    /// Propagated uncertainty for every row of a batch
    ///
    /// # Errors
    /// See [`uncertainty::propagate_batch`].
    pub fn propagate_batch<V, E>(
        &self,
        value_columns: &[V],
        error_columns: &[E],
    ) -> Result<Vec<f64>, PropagationError>
    where
        V: AsRef<[f64]> + Sync,
        E: AsRef<[f64]> + Sync,
    {
        let sigmas = uncertainty::propagate_batch(&self.derivatives, value_columns, error_columns)?;
        debug!("Computed the error on G for {} rows", sigmas.len());
        Ok(sigmas)
    }

    /// Relative uncertainty `σ_G / |G|` for a single measurement
    ///
    /// # Errors
    /// Errors of [`value_at`](Self::value_at) and
    /// [`propagate_scalar`](Self::propagate_scalar); `NonFiniteResult` when `G` is zero.
    pub fn relative_uncertainty(
        &self,
        values: &[f64],
        errors: &[f64],
    ) -> Result<f64, PropagationError> {
        let value = self.value_at(values)?;
        let sigma = self.propagate_scalar(values, errors)?;
        uncertainty::relative_uncertainty(value, sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_derivative_per_variable() {
        let derivatives = build_derivatives(&["x", "y", "z"], "x y").unwrap();
        assert_eq!(derivatives.len(), 3);
        let names: Vec<&str> = derivatives.iter().map(|d| d.variable()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        // G does not depend on z
        assert!(derivatives[2].expr().is_zero_num());
    }

    #[test]
    fn test_duplicate_variable() {
        let err = build_derivatives(&["x", "y", "x"], "x + y").unwrap_err();
        assert_eq!(err, PropagationError::DuplicateVariable("x".to_string()));
    }

    #[test]
    fn test_undefined_variable() {
        let err = build_derivatives(&["x"], "x + w").unwrap_err();
        assert!(matches!(err, PropagationError::UndefinedVariable { ref name, .. } if name == "w"));
    }

    #[test]
    fn test_derivative_arity_is_fixed_at_build_time() {
        let derivatives = build_derivatives(&["x", "y"], "x^2 + y^2").unwrap();
        assert_eq!(derivatives[0].arity(), 2);
        assert_eq!(
            derivatives[0].evaluate(&[1.0, 2.0, 3.0]),
            Err(PropagationError::ArityMismatch {
                what: "values",
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn test_value_and_gradient() {
        let g = PreparedFunction::new(&["a", "b"], "a^2 + b").unwrap();
        assert_eq!(g.value_at(&[1.0, 2.0]).unwrap(), 3.0);
        assert_eq!(g.gradient_at(&[1.0, 2.0]).unwrap(), vec![2.0, 1.0]);
        assert!(matches!(
            g.gradient_at(&[1.0, 2.0, 3.0]),
            Err(PropagationError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_non_finite_derivative() {
        let g = PreparedFunction::new(&["x"], "Sqrt[x]").unwrap();
        match g.gradient_at(&[0.0]) {
            Err(PropagationError::NonFiniteResult { variable, .. }) => assert_eq!(variable, "x"),
            other => panic!("expected NonFiniteResult, got {:?}", other),
        }
    }

    #[test]
    fn test_limits() {
        let deep = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        let err = PreparedFunction::with_limits(&["x"], "x + x + x + x", 100, 3).unwrap_err();
        assert_eq!(err, PropagationError::MaxNodesExceeded);
        // Parentheses do not add depth
        assert!(PreparedFunction::with_limits(&["x"], &deep, 2, 100).is_ok());
        let err = PreparedFunction::with_limits(&["x"], "Sin[Sin[Sin[x]]]", 3, 100).unwrap_err();
        assert_eq!(err, PropagationError::MaxDepthExceeded);
    }

    #[test]
    fn test_long_sum_within_default_depth() {
        let names: Vec<String> = (0..120).map(|i| format!("x{}", i)).collect();
        let vars: Vec<&str> = names.iter().map(String::as_str).collect();
        let formula = vars.join(" + ");

        let g = PreparedFunction::new(&vars, &formula).unwrap();
        assert_eq!(g.derivatives().len(), 120);
        let values = vec![1.0; 120];
        let errors = vec![0.5; 120];
        let sigma = g.propagate_scalar(&values, &errors).unwrap();
        assert!((sigma - 0.5 * 120f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_relative_uncertainty() {
        let g = PreparedFunction::new(&["x"], "2 x").unwrap();
        let rel = g.relative_uncertainty(&[4.0], &[0.2]).unwrap();
        assert!((rel - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_no_variables() {
        let g = PreparedFunction::new(&[], "2 Pi").unwrap();
        assert!(g.derivatives().is_empty());
        assert_eq!(g.propagate_scalar(&[], &[]).unwrap(), 0.0);
        assert!((g.value_at(&[]).unwrap() - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }
}
