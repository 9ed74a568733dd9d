//! Centralized mathematical function registry
//!
//! This module provides a single source of truth for all elementary functions
//! accepted in formulas, including their evaluation and derivative formulas.

use crate::{Expr, ExprKind};

pub(crate) mod definitions;
pub(crate) mod registry;

// ===== Helper functions for building derivative expressions =====

/// Create a function call expression from Expr
pub(crate) fn func(name: &str, arg: Expr) -> Expr {
    Expr::func(name, arg)
}

/// Multiply, optimizing for common cases (0 and 1)
pub(crate) fn mul_opt(a: Expr, b: Expr) -> Expr {
    if a.is_zero_num() || b.is_zero_num() {
        Expr::number(0.0)
    } else if a.is_one_num() {
        b
    } else if b.is_one_num() {
        a
    } else if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        Expr::number(x * y)
    } else {
        Expr::mul_expr(a, b)
    }
}

/// Add, dropping zero terms
pub(crate) fn add_opt(a: Expr, b: Expr) -> Expr {
    if a.is_zero_num() {
        b
    } else if b.is_zero_num() {
        a
    } else {
        Expr::add_expr(a, b)
    }
}

/// Subtract, dropping zero terms
pub(crate) fn sub_opt(a: Expr, b: Expr) -> Expr {
    if b.is_zero_num() {
        a
    } else if a.is_zero_num() {
        neg(b)
    } else {
        Expr::sub_expr(a, b)
    }
}

/// Divide, optimizing for a zero numerator or unit denominator
pub(crate) fn div_opt(a: Expr, b: Expr) -> Expr {
    if a.is_zero_num() {
        Expr::number(0.0)
    } else if b.is_one_num() {
        a
    } else {
        Expr::div_expr(a, b)
    }
}

/// Negate an expression
pub(crate) fn neg(e: Expr) -> Expr {
    match &e.kind {
        ExprKind::Number(n) => Expr::number(-n),
        _ => Expr::mul_expr(Expr::number(-1.0), e),
    }
}
