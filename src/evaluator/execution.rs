//! Scalar evaluation for the bytecode evaluator.
//!
//! A plain `Vec` stack sized from the compiler's recorded maximum is allocated per
//! call, so a shared [`CompiledEvaluator`] can be evaluated from several threads.

use super::CompiledEvaluator;
use super::instruction::Instruction;
use crate::PropagationError;

#[inline]
fn binary(stack: &mut Vec<f64>, op: impl FnOnce(f64, f64) -> f64) {
    let b = stack.pop().unwrap_or(f64::NAN);
    let a = stack.pop().unwrap_or(f64::NAN);
    stack.push(op(a, b));
}

#[inline]
fn unary(stack: &mut [f64], op: impl FnOnce(f64) -> f64) {
    if let Some(top) = stack.last_mut() {
        *top = op(*top);
    }
}

impl CompiledEvaluator {
    /// Evaluate at one point.
    ///
    /// `params` must be in the order given to [`CompiledEvaluator::compile`]. Missing
    /// parameters read as `NaN`. Values outside a function's domain propagate as `NaN`
    /// or an infinity; use [`evaluate_checked`](Self::evaluate_checked) to reject them.
    ///
    /// # Example
    ///
    /// ```
    /// use errprop::{parse, CompiledEvaluator};
    ///
    /// let expr = parse("x^2 + 1", &["x"]).unwrap();
    /// let eval = CompiledEvaluator::compile(&expr, &["x"]).unwrap();
    ///
    /// assert!((eval.evaluate(&[3.0]) - 10.0).abs() < 1e-10);
    /// ```
    #[must_use]
    pub fn evaluate(&self, params: &[f64]) -> f64 {
        let mut stack: Vec<f64> = Vec::with_capacity(self.stack_size);

        for instr in self.instructions.iter() {
            match *instr {
                // Hot instructions first
                Instruction::LoadConst(c) => {
                    stack.push(self.constants.get(c as usize).copied().unwrap_or(f64::NAN));
                }
                Instruction::LoadParam(p) => {
                    stack.push(params.get(p as usize).copied().unwrap_or(f64::NAN));
                }
                Instruction::Add => binary(&mut stack, |a, b| a + b),
                Instruction::Mul => binary(&mut stack, |a, b| a * b),
                Instruction::Sub => binary(&mut stack, |a, b| a - b),
                Instruction::Div => binary(&mut stack, |a, b| a / b),
                Instruction::Pow => binary(&mut stack, f64::powf),
                Instruction::Neg => unary(&mut stack, |a| -a),
                Instruction::Square => unary(&mut stack, |a| a * a),
                Instruction::Call { eval, argc } => {
                    let start = stack.len().saturating_sub(argc);
                    let result = eval(&stack[start..]);
                    stack.truncate(start);
                    stack.push(result);
                }
            }
        }

        stack.pop().unwrap_or(f64::NAN)
    }

    /// Evaluate at one point, checking the parameter count and the result.
    ///
    /// # Errors
    /// - `ArityMismatch` if `params.len()` differs from the compiled parameter count
    /// - `NonFiniteResult` if the value is `NaN` or infinite; the error names the
    ///   evaluator's label (the expression text unless set with [`with_label`](Self::with_label))
    pub fn evaluate_checked(&self, params: &[f64]) -> Result<f64, PropagationError> {
        if params.len() != self.param_count() {
            return Err(PropagationError::arity(
                "values",
                self.param_count(),
                params.len(),
            ));
        }

        let value = self.evaluate(params);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PropagationError::NonFiniteResult {
                row: 0,
                variable: self.label.clone(),
                value,
            })
        }
    }
}
