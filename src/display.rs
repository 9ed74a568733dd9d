//! Display formatting for AST
//!
//! Two notations share one renderer:
//! - `to_string()` / `{}`: explicit operators, `x^2 + 2*y`, `exp(x)`
//! - [`Expr::display_form`]: the compact form written to diagnostic logs, with
//!   juxtaposition for products and `e^(u)` for the exponential, `2x e^(y)`

use crate::{Expr, ExprKind};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Notation {
    Explicit,
    Juxtaposed,
}

struct Rendered<'a> {
    expr: &'a Expr,
    notation: Notation,
}

impl Expr {
    /// Render with juxtaposed products and `e^(u)` exponentials
    ///
    /// ```
    /// use errprop::parse;
    ///
    /// let expr = parse("2*x*Exp[y]", &["x", "y"]).unwrap();
    /// assert_eq!(expr.display_form(), "2x e^(y)");
    /// ```
    pub fn display_form(&self) -> String {
        Rendered {
            expr: self,
            notation: Notation::Juxtaposed,
        }
        .to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Rendered {
            expr: self,
            notation: Notation::Explicit,
        }
        .fmt(f)
    }
}

impl Rendered<'_> {
    fn child<'b>(&self, expr: &'b Expr) -> Rendered<'b> {
        Rendered {
            expr,
            notation: self.notation,
        }
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr.kind {
            ExprKind::Number(n) => format_number(f, *n),

            ExprKind::Symbol(s) => write!(f, "{}", s),

            ExprKind::FunctionCall { name, args } => {
                if self.notation == Notation::Juxtaposed && name == "exp" && args.len() == 1 {
                    return write!(f, "e^({})", self.child(&args[0]));
                }
                let args_str: Vec<String> = args.iter().map(|a| self.child(a).to_string()).collect();
                write!(f, "{}({})", name, args_str.join(", "))
            }

            ExprKind::Add(u, v) => {
                // Negative right-hand terms display as subtraction
                if let Some(positive) = extract_negative(v) {
                    write!(f, "{} - {}", self.child(u), self.sub_rhs(&positive))
                } else {
                    write!(f, "{} + {}", self.child(u), self.child(v))
                }
            }

            ExprKind::Sub(u, v) => write!(f, "{} - {}", self.child(u), self.sub_rhs(v)),

            ExprKind::Mul(u, v) => {
                if u.is_neg_one_num() {
                    return write!(f, "-{}", self.mul_operand(v, true));
                }
                let left = self.mul_operand(u, false);
                let right = self.mul_operand(v, true);
                match self.notation {
                    Notation::Explicit => write!(f, "{}*{}", left, right),
                    Notation::Juxtaposed => {
                        if needs_separator(&left, &right) {
                            write!(f, "{} {}", left, right)
                        } else {
                            write!(f, "{}{}", left, right)
                        }
                    }
                }
            }

            ExprKind::Div(u, v) => {
                // Parenthesize a sum numerator and any compound denominator
                let num = self.child(u);
                let den = self.child(v);
                let num_str = match u.kind {
                    ExprKind::Add(_, _) | ExprKind::Sub(_, _) => format!("({})", num),
                    _ => num.to_string(),
                };
                let den_str = match v.kind {
                    ExprKind::Symbol(_) | ExprKind::FunctionCall { .. } | ExprKind::Pow(_, _) => {
                        den.to_string()
                    }
                    ExprKind::Number(n) if n >= 0.0 => den.to_string(),
                    _ => format!("({})", den),
                };
                write!(f, "{}/{}", num_str, den_str)
            }

            ExprKind::Pow(u, v) => {
                // (C * R)^2 must keep its parentheses, and so must (a^b)^c
                let base = self.child(u);
                let base_str = match u.kind {
                    ExprKind::Add(_, _)
                    | ExprKind::Sub(_, _)
                    | ExprKind::Mul(_, _)
                    | ExprKind::Div(_, _)
                    | ExprKind::Pow(_, _) => format!("({})", base),
                    ExprKind::Number(n) if n < 0.0 => format!("({})", base),
                    _ => base.to_string(),
                };

                let exp = self.child(v);
                let exp_str = match v.kind {
                    ExprKind::Symbol(_) => exp.to_string(),
                    ExprKind::Number(n) if n >= 0.0 => exp.to_string(),
                    _ => format!("({})", exp),
                };

                write!(f, "{}^{}", base_str, exp_str)
            }
        }
    }
}

impl Rendered<'_> {
    /// Right operand of a subtraction: keep grouping for `a - (b + c)` and `a - (-x)`
    fn sub_rhs(&self, expr: &Expr) -> String {
        match expr.kind {
            ExprKind::Add(_, _) | ExprKind::Sub(_, _) => format!("({})", self.child(expr)),
            _ if extract_negative(expr).is_some() => format!("({})", self.child(expr)),
            _ => self.child(expr).to_string(),
        }
    }

    /// Format operand for multiplication to minimize parentheses
    fn mul_operand(&self, expr: &Expr, right: bool) -> String {
        let wrap = match expr.kind {
            ExprKind::Add(_, _) | ExprKind::Sub(_, _) => true,
            // Juxtaposed division would read as a single fraction: 2 (a/b) vs 2a/b
            ExprKind::Div(_, _) => self.notation == Notation::Juxtaposed,
            _ => right && extract_negative(expr).is_some(),
        };
        if wrap {
            format!("({})", self.child(expr))
        } else {
            self.child(expr).to_string()
        }
    }
}

fn format_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        if n > 0.0 {
            write!(f, "Infinity")
        } else {
            write!(f, "-Infinity")
        }
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        // Display as integer if no fractional part
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

/// If `expr` carries a leading negative sign, return its positive counterpart
fn extract_negative(expr: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Number(n) if *n < 0.0 => Some(Expr::number(-n)),
        ExprKind::Mul(l, r) => match l.as_number() {
            Some(n) if n < 0.0 => {
                if l.is_neg_one_num() {
                    Some((**r).clone())
                } else {
                    Some(Expr::mul_expr(Expr::number(-n), (**r).clone()))
                }
            }
            _ => None,
        },
        _ => None,
    }
}

/// Juxtaposed operands need a space when both sides are alphanumeric, unless a
/// number is followed by a letter (`2x`)
fn needs_separator(left: &str, right: &str) -> bool {
    match (left.chars().last(), right.chars().next()) {
        (Some(l), Some(r)) if l.is_alphanumeric() && r.is_alphanumeric() => {
            !(l.is_ascii_digit() && r.is_alphabetic() && is_numeric_literal(left))
        }
        _ => false,
    }
}

fn is_numeric_literal(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}
