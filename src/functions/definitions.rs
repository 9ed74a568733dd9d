//! Mathematical function definitions for the function registry
//!
//! Contains evaluation and symbolic differentiation rules for all supported functions.
//! Each derivative applies the chain rule: the outer derivative is multiplied by the
//! derivative of the argument (`u'`).

use super::registry::FunctionDefinition;
use super::{add_opt, div_opt, func, mul_opt, neg, sub_opt};
use crate::Expr;

/// `sqrt(1 - u^2)`, shared by the inverse sine and cosine rules
fn sqrt_one_minus_square(u: &Expr) -> Expr {
    func(
        "sqrt",
        Expr::sub_expr(
            Expr::number(1.0),
            Expr::pow(u.clone(), Expr::number(2.0)),
        ),
    )
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        // NaN stays NaN, both zeros map to zero
        x * 0.0
    }
}

/// Return all function definitions for populating the registry
pub(crate) fn all_definitions() -> Vec<FunctionDefinition> {
    vec![
        // Exponential / Log
        FunctionDefinition {
            name: "exp",
            aliases: &["Exp"],
            arity: 1..=1,
            eval: |args| args[0].exp(),
            derivative: |args, arg_primes| {
                // d/dx exp(u) = exp(u) * u'
                mul_opt(func("exp", args[0].clone()), arg_primes[0].clone())
            },
        },
        FunctionDefinition {
            name: "log",
            aliases: &["Log", "ln"],
            arity: 1..=2,
            eval: |args| match args {
                [x] => x.ln(),
                [base, x] => x.ln() / base.ln(),
                _ => f64::NAN,
            },
            derivative: |args, arg_primes| match (args, arg_primes) {
                // d/dx ln(u) = u'/u
                ([u], [u_prime]) => div_opt(u_prime.clone(), u.clone()),
                // log_b(u) = ln(u)/ln(b)
                // d/dx = (u'/u * ln(b) - ln(u) * b'/b) / ln(b)^2
                ([b, u], [b_prime, u_prime]) => {
                    let ln_b = func("log", b.clone());
                    let ln_u = func("log", u.clone());
                    let numerator = sub_opt(
                        mul_opt(div_opt(u_prime.clone(), u.clone()), ln_b.clone()),
                        mul_opt(ln_u, div_opt(b_prime.clone(), b.clone())),
                    );
                    div_opt(numerator, Expr::pow(ln_b, Expr::number(2.0)))
                }
                _ => Expr::number(f64::NAN),
            },
        },
        FunctionDefinition {
            name: "sqrt",
            aliases: &["Sqrt"],
            arity: 1..=1,
            eval: |args| args[0].sqrt(),
            derivative: |args, arg_primes| {
                // d/dx sqrt(u) = u' / (2 sqrt(u))
                div_opt(
                    arg_primes[0].clone(),
                    Expr::mul_expr(Expr::number(2.0), func("sqrt", args[0].clone())),
                )
            },
        },
        // Trigonometric
        FunctionDefinition {
            name: "sin",
            aliases: &["Sin"],
            arity: 1..=1,
            eval: |args| args[0].sin(),
            derivative: |args, arg_primes| {
                // d/dx sin(u) = cos(u) * u'
                mul_opt(func("cos", args[0].clone()), arg_primes[0].clone())
            },
        },
        FunctionDefinition {
            name: "cos",
            aliases: &["Cos"],
            arity: 1..=1,
            eval: |args| args[0].cos(),
            derivative: |args, arg_primes| {
                // d/dx cos(u) = -sin(u) * u'
                mul_opt(neg(func("sin", args[0].clone())), arg_primes[0].clone())
            },
        },
        FunctionDefinition {
            name: "tan",
            aliases: &["Tan"],
            arity: 1..=1,
            eval: |args| args[0].tan(),
            derivative: |args, arg_primes| {
                // d/dx tan(u) = u' / cos^2(u)
                div_opt(
                    arg_primes[0].clone(),
                    Expr::pow(func("cos", args[0].clone()), Expr::number(2.0)),
                )
            },
        },
        // Inverse trigonometric
        FunctionDefinition {
            name: "asin",
            aliases: &["ArcSin", "arcsin"],
            arity: 1..=1,
            eval: |args| args[0].asin(),
            derivative: |args, arg_primes| {
                // d/dx asin(u) = u' / sqrt(1 - u^2)
                div_opt(arg_primes[0].clone(), sqrt_one_minus_square(&args[0]))
            },
        },
        FunctionDefinition {
            name: "acos",
            aliases: &["ArcCos", "arccos"],
            arity: 1..=1,
            eval: |args| args[0].acos(),
            derivative: |args, arg_primes| {
                // d/dx acos(u) = -u' / sqrt(1 - u^2)
                neg(div_opt(
                    arg_primes[0].clone(),
                    sqrt_one_minus_square(&args[0]),
                ))
            },
        },
        FunctionDefinition {
            name: "atan",
            aliases: &["ArcTan", "arctan"],
            arity: 1..=1,
            eval: |args| args[0].atan(),
            derivative: |args, arg_primes| {
                // d/dx atan(u) = u' / (1 + u^2)
                div_opt(
                    arg_primes[0].clone(),
                    add_opt(
                        Expr::number(1.0),
                        Expr::pow(args[0].clone(), Expr::number(2.0)),
                    ),
                )
            },
        },
        // Hyperbolic
        FunctionDefinition {
            name: "sinh",
            aliases: &["Sinh"],
            arity: 1..=1,
            eval: |args| args[0].sinh(),
            derivative: |args, arg_primes| {
                mul_opt(func("cosh", args[0].clone()), arg_primes[0].clone())
            },
        },
        FunctionDefinition {
            name: "cosh",
            aliases: &["Cosh"],
            arity: 1..=1,
            eval: |args| args[0].cosh(),
            derivative: |args, arg_primes| {
                mul_opt(func("sinh", args[0].clone()), arg_primes[0].clone())
            },
        },
        FunctionDefinition {
            name: "tanh",
            aliases: &["Tanh"],
            arity: 1..=1,
            eval: |args| args[0].tanh(),
            derivative: |args, arg_primes| {
                // d/dx tanh(u) = u' / cosh^2(u)
                div_opt(
                    arg_primes[0].clone(),
                    Expr::pow(func("cosh", args[0].clone()), Expr::number(2.0)),
                )
            },
        },
        // Piecewise
        FunctionDefinition {
            name: "abs",
            aliases: &["Abs"],
            arity: 1..=1,
            eval: |args| args[0].abs(),
            derivative: |args, arg_primes| {
                // d/dx |u| = sign(u) * u'
                mul_opt(func("sign", args[0].clone()), arg_primes[0].clone())
            },
        },
        FunctionDefinition {
            name: "sign",
            aliases: &["Sign", "sgn"],
            arity: 1..=1,
            eval: |args| sign(args[0]),
            derivative: |_, _| Expr::number(0.0),
        },
    ]
}
