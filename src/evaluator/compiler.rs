//! Expression compiler for the bytecode evaluator.
//!
//! This module compiles symbolic [`Expr`] trees into [`Instruction`]s executed by
//! the [`CompiledEvaluator`](super::CompiledEvaluator).
//!
//! # Compilation Process
//!
//! 1. **Constant folding**: subtrees without parameters are evaluated once here
//! 2. **Instruction emission**: post-order walk of the tree
//! 3. **Stack tracking**: the deepest stack reached is recorded so evaluation can
//!    allocate exactly once
//!
//! Symbols resolve to parameters first, then to the named constants `E` and `Pi`.

use super::instruction::Instruction;
use crate::PropagationError;
use crate::functions::registry::Registry;
use crate::known_symbols::get_constant_value;
use crate::{Expr, ExprKind};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Maximum allowed stack depth to prevent deeply nested expressions from causing issues.
pub const MAX_STACK_DEPTH: usize = 1024;

/// Internal compiler state for transforming expressions to bytecode.
pub(crate) struct Compiler<'p> {
    instructions: Vec<Instruction>,
    /// Parameter names in evaluation order
    params: &'p [String],
    current_stack: usize,
    max_stack: usize,
    constants: Vec<f64>,
    /// Map from constant bit pattern → pool index (deduplication)
    const_map: FxHashMap<u64, u32>,
}

impl<'p> Compiler<'p> {
    pub(crate) fn new(params: &'p [String]) -> Self {
        Self {
            instructions: Vec::with_capacity(32),
            params,
            current_stack: 0,
            max_stack: 0,
            constants: Vec::new(),
            const_map: FxHashMap::default(),
        }
    }

    /// Add a constant to the pool, deduplicating by bit pattern.
    fn add_const(&mut self, val: f64) -> u32 {
        match self.const_map.entry(val.to_bits()) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                let idx = self.constants.len() as u32;
                self.constants.push(val);
                v.insert(idx);
                idx
            }
        }
    }

    /// Emit an instruction and track its effect on the stack height.
    ///
    /// # Errors
    /// Returns `MaxDepthExceeded` if the stack would exceed `MAX_STACK_DEPTH`.
    fn emit(&mut self, instr: Instruction) -> Result<(), PropagationError> {
        let height = self.current_stack as isize + instr.stack_effect();
        self.current_stack = height.max(0) as usize;
        if self.current_stack > MAX_STACK_DEPTH {
            return Err(PropagationError::MaxDepthExceeded);
        }
        self.max_stack = self.max_stack.max(self.current_stack);
        self.instructions.push(instr);
        Ok(())
    }

    fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p == name)
    }

    /// Replace every parameter-free subtree by its value in one bottom-up pass
    fn fold(&self, expr: &Expr) -> Expr {
        match &expr.kind {
            ExprKind::Symbol(s) if self.param_index(s).is_none() => {
                get_constant_value(s).map_or_else(|| expr.clone(), Expr::number)
            }
            ExprKind::Number(_) | ExprKind::Symbol(_) => expr.clone(),
            ExprKind::Add(l, r) => self.fold_binary(l, r, |a, b| a + b, Expr::add_expr),
            ExprKind::Sub(l, r) => self.fold_binary(l, r, |a, b| a - b, Expr::sub_expr),
            ExprKind::Mul(l, r) => self.fold_binary(l, r, |a, b| a * b, Expr::mul_expr),
            ExprKind::Div(l, r) => self.fold_binary(l, r, |a, b| a / b, Expr::div_expr),
            ExprKind::Pow(l, r) => self.fold_binary(l, r, f64::powf, Expr::pow),
            ExprKind::FunctionCall { name, args } => {
                let args: Vec<Expr> = args.iter().map(|a| self.fold(a)).collect();
                let values: Option<Vec<f64>> = args.iter().map(Expr::as_number).collect();
                match (Registry::get(name), values) {
                    (Some(def), Some(values)) if def.validate_arity(values.len()) => {
                        Expr::number((def.eval)(&values))
                    }
                    _ => Expr::func_multi(name.clone(), args),
                }
            }
        }
    }

    fn fold_binary(
        &self,
        left: &Expr,
        right: &Expr,
        op: fn(f64, f64) -> f64,
        node: fn(Expr, Expr) -> Expr,
    ) -> Expr {
        let (left, right) = (self.fold(left), self.fold(right));
        match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Expr::number(op(a, b)),
            _ => node(left, right),
        }
    }

    /// Compile an expression to bytecode.
    ///
    /// # Errors
    /// - `UndefinedVariable`: symbol is neither a parameter nor a known constant
    /// - `MaxDepthExceeded`: expression too deeply nested
    /// - `ParseError`: unknown function or wrong argument count
    pub(crate) fn compile_expr(&mut self, expr: &Expr) -> Result<(), PropagationError> {
        let folded = self.fold(expr);
        self.emit_tree(&folded)
    }

    fn emit_tree(&mut self, expr: &Expr) -> Result<(), PropagationError> {
        match &expr.kind {
            ExprKind::Number(n) => {
                let idx = self.add_const(*n);
                self.emit(Instruction::LoadConst(idx))
            }
            ExprKind::Symbol(s) => match self.param_index(s) {
                Some(idx) => self.emit(Instruction::LoadParam(idx as u32)),
                None => Err(PropagationError::UndefinedVariable {
                    name: s.clone(),
                    span: None,
                }),
            },

            ExprKind::Add(l, r) => self.compile_binary(l, r, Instruction::Add),
            ExprKind::Sub(l, r) => self.compile_binary(l, r, Instruction::Sub),
            ExprKind::Div(l, r) => self.compile_binary(l, r, Instruction::Div),

            // -1 * u compiles to a single negation
            ExprKind::Mul(l, r) if l.is_neg_one_num() => {
                self.emit_tree(r)?;
                self.emit(Instruction::Neg)
            }
            ExprKind::Mul(l, r) => self.compile_binary(l, r, Instruction::Mul),

            ExprKind::Pow(base, exp) => match exp.as_number() {
                Some(n) if n == 2.0 => {
                    self.emit_tree(base)?;
                    self.emit(Instruction::Square)
                }
                Some(n) if n == 1.0 => self.emit_tree(base),
                _ => self.compile_binary(base, exp, Instruction::Pow),
            },

            ExprKind::FunctionCall { name, args } => {
                let def = Registry::get(name).ok_or_else(|| {
                    PropagationError::parse(format!("unknown function '{}'", name))
                })?;
                if !def.validate_arity(args.len()) {
                    return Err(PropagationError::parse(format!(
                        "function '{}' does not take {} argument(s)",
                        name,
                        args.len()
                    )));
                }
                for arg in args {
                    self.emit_tree(arg)?;
                }
                self.emit(Instruction::Call {
                    eval: def.eval,
                    argc: args.len(),
                })
            }
        }
    }

    fn compile_binary(
        &mut self,
        left: &Expr,
        right: &Expr,
        op: Instruction,
    ) -> Result<(), PropagationError> {
        self.emit_tree(left)?;
        self.emit_tree(right)?;
        self.emit(op)
    }

    /// Consume the compiler, returning `(instructions, constants, max_stack)`
    pub(crate) fn into_parts(self) -> (Vec<Instruction>, Vec<f64>, usize) {
        (self.instructions, self.constants, self.max_stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn compile(formula: &str, params: &[&str]) -> (Vec<Instruction>, Vec<f64>, usize) {
        let expr = parse(formula, params).unwrap();
        let names: Vec<String> = params.iter().map(|s| s.to_string()).collect();
        let mut compiler = Compiler::new(&names);
        compiler.compile_expr(&expr).unwrap();
        compiler.into_parts()
    }

    #[test]
    fn test_constant_folding() {
        let (instrs, constants, _) = compile("2 Pi + Sqrt[4]", &[]);
        assert_eq!(instrs, vec![Instruction::LoadConst(0)]);
        assert!((constants[0] - (2.0 * std::f64::consts::PI + 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_constant_pool_dedup() {
        let (_, constants, _) = compile("3 x + 3 y", &["x", "y"]);
        assert_eq!(constants, vec![3.0]);
    }

    #[test]
    fn test_square_and_negation() {
        let (instrs, _, max_stack) = compile("-x^2", &["x"]);
        assert_eq!(
            instrs,
            vec![
                Instruction::LoadParam(0),
                Instruction::Square,
                Instruction::Neg
            ]
        );
        assert_eq!(max_stack, 1);
    }

    #[test]
    fn test_declared_name_is_not_folded() {
        // E declared as a parameter must not be replaced by Euler's number
        let (instrs, _, _) = compile("E + 1", &["E"]);
        assert_eq!(instrs[0], Instruction::LoadParam(0));
    }

    #[test]
    fn test_undefined_symbol() {
        let expr = Expr::symbol("q");
        let names: Vec<String> = vec!["x".to_string()];
        let mut compiler = Compiler::new(&names);
        assert!(matches!(
            compiler.compile_expr(&expr),
            Err(PropagationError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_folding_stops_at_parameters() {
        // (2 + 3) x + Sqrt[16]: both constant subtrees fold, the product stays
        let (instrs, constants, _) = compile("(2 + 3) x + Sqrt[16]", &["x"]);
        assert_eq!(
            instrs,
            vec![
                Instruction::LoadConst(0),
                Instruction::LoadParam(0),
                Instruction::Mul,
                Instruction::LoadConst(1),
                Instruction::Add
            ]
        );
        assert_eq!(constants, vec![5.0, 4.0]);
    }

    #[test]
    fn test_long_constant_chain_folds_to_one_load() {
        let mut expr = Expr::number(0.0);
        for i in 0..2_000 {
            expr = Expr::add_expr(expr, Expr::number(i as f64));
        }
        let names: Vec<String> = Vec::new();
        let mut compiler = Compiler::new(&names);
        compiler.compile_expr(&expr).unwrap();
        let (instrs, constants, _) = compiler.into_parts();
        assert_eq!(instrs, vec![Instruction::LoadConst(0)]);
        assert_eq!(constants, vec![(0..2_000).sum::<i32>() as f64]);
    }

    #[test]
    fn test_stack_limit() {
        // Right-nested sum x + (x + (x + ...)) keeps every operand on the stack
        let mut expr = Expr::symbol("x");
        for _ in 0..(MAX_STACK_DEPTH + 1) {
            expr = Expr::add_expr(Expr::symbol("x"), expr);
        }
        let names = vec!["x".to_string()];
        let mut compiler = Compiler::new(&names);
        assert_eq!(
            compiler.compile_expr(&expr),
            Err(PropagationError::MaxDepthExceeded)
        );
    }
}
