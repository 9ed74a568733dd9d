//! Compiled expression evaluator for fast numerical evaluation.
//!
//! Expression trees are converted into flat bytecode once, then evaluated per row
//! without tree traversal. The evaluator is immutable after compilation and is
//! shared freely between threads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    ┌────────────┐    ┌─────────────────────┐
//! │    Expr     │ -> │  Compiler  │ -> │  CompiledEvaluator  │
//! │ (AST Tree)  │    │ (Bytecode) │    │   (Stack Machine)   │
//! └─────────────┘    └────────────┘    └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use errprop::{parse, CompiledEvaluator};
//!
//! let expr = parse("Sin[x] Cos[x] + x^2", &["x"]).unwrap();
//! let evaluator = CompiledEvaluator::compile(&expr, &["x"]).unwrap();
//!
//! let result = evaluator.evaluate(&[0.5]);
//! assert!((result - (0.5_f64.sin() * 0.5_f64.cos() + 0.25)).abs() < 1e-10);
//! ```

mod compiler;
mod execution;
mod instruction;

pub use compiler::MAX_STACK_DEPTH;

use crate::{Expr, PropagationError};
use compiler::Compiler;
use instruction::Instruction;
use std::fmt;

/// Compiled expression evaluator - thread-safe, reusable.
///
/// All data is immutable after construction and each evaluation allocates its own
/// stack, so `CompiledEvaluator` is `Send + Sync`.
#[derive(Clone)]
pub struct CompiledEvaluator {
    /// Bytecode instructions
    instructions: Box<[Instruction]>,
    /// Required stack depth for evaluation
    stack_size: usize,
    /// Parameter names in order
    param_names: Box<[String]>,
    /// Constant pool for numeric literals
    constants: Box<[f64]>,
    /// Name reported in `NonFiniteResult` errors
    label: String,
}

impl CompiledEvaluator {
    /// Compile an expression to bytecode.
    ///
    /// `param_order` fixes the positions of the values passed to
    /// [`evaluate`](Self::evaluate). A parameter shadows a named constant of the same
    /// name.
    ///
    /// # Errors
    ///
    /// - `UndefinedVariable`: symbol not in `param_order` and not a known constant
    /// - `MaxDepthExceeded`: expression needs more than [`MAX_STACK_DEPTH`] stack slots
    /// - `ParseError`: unknown function or wrong argument count
    pub fn compile<S: AsRef<str>>(
        expr: &Expr,
        param_order: &[S],
    ) -> Result<Self, PropagationError> {
        let param_names: Vec<String> = param_order.iter().map(|p| p.as_ref().to_owned()).collect();

        let mut compiler = Compiler::new(&param_names);
        compiler.compile_expr(expr)?;
        let (instructions, constants, max_stack) = compiler.into_parts();

        Ok(Self {
            instructions: instructions.into_boxed_slice(),
            stack_size: max_stack,
            param_names: param_names.into_boxed_slice(),
            constants: constants.into_boxed_slice(),
            label: expr.to_string(),
        })
    }

    /// Replace the name reported when [`evaluate_checked`](Self::evaluate_checked)
    /// rejects a non-finite value
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Parameter names in evaluation order
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Number of parameters expected by `evaluate`
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_names.len()
    }

    /// Number of bytecode instructions
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Maximum stack depth reached during evaluation
    #[must_use]
    pub fn stack_size(&self) -> usize {
        self.stack_size
    }
}

impl fmt::Debug for CompiledEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledEvaluator")
            .field("label", &self.label)
            .field("params", &self.param_names)
            .field("instructions", &self.instructions.len())
            .field("stack_size", &self.stack_size)
            .finish()
    }
}
