// Differentiation engine - applies calculus rules
//
// Zero and one operands are folded while the derivative tree is built
// (0 + x -> x, 1 * x -> x). There is no later simplification pass, so these
// checks are what keeps d/dx sin(x^5) from growing a tree of `* 1` and `+ 0` nodes.

use crate::functions::registry::Registry;
use crate::functions::{add_opt, div_opt, func, mul_opt, sub_opt};
use crate::{Expr, ExprKind};

impl Expr {
    /// Differentiate this expression with respect to a variable
    ///
    /// Symbols other than `var` (including the constants `E` and `Pi`) are treated
    /// as constants. Function calls use the derivative rule registered for the
    /// function and the chain rule over every argument.
    ///
    /// ```
    /// use errprop::parse;
    ///
    /// let expr = parse("x^2 y", &["x", "y"]).unwrap();
    /// assert_eq!(expr.derive("x").to_string(), "2*x*y");
    /// ```
    pub fn derive(&self, var: &str) -> Expr {
        match &self.kind {
            // Base cases
            ExprKind::Number(_) => Expr::number(0.0),

            ExprKind::Symbol(name) => {
                if name == var {
                    Expr::number(1.0)
                } else {
                    Expr::number(0.0)
                }
            }

            ExprKind::FunctionCall { name, args } => {
                if !args.iter().any(|a| a.contains_var(var)) {
                    return Expr::number(0.0);
                }

                let arg_primes: Vec<Expr> = args.iter().map(|arg| arg.derive(var)).collect();
                match Registry::get(name) {
                    Some(def) if def.validate_arity(args.len()) => {
                        (def.derivative)(args, &arg_primes)
                    }
                    // The parser only produces registered functions with valid arity
                    _ => Expr::number(f64::NAN),
                }
            }

            // Sum rule: (u + v)' = u' + v'
            ExprKind::Add(u, v) => add_opt(u.derive(var), v.derive(var)),

            // Subtraction rule: (u - v)' = u' - v'
            ExprKind::Sub(u, v) => sub_opt(u.derive(var), v.derive(var)),

            // Product rule: (u * v)' = u' * v + u * v'
            ExprKind::Mul(u, v) => {
                let u_prime = u.derive(var);
                let v_prime = v.derive(var);

                let term1 = mul_opt(u_prime, (**v).clone());
                let term2 = mul_opt((**u).clone(), v_prime);
                add_opt(term1, term2)
            }

            // Quotient rule: (u / v)' = (u' * v - u * v') / v^2
            ExprKind::Div(u, v) => {
                let u_prime = u.derive(var);
                let v_prime = v.derive(var);

                if v_prime.is_zero_num() {
                    // Constant denominator: (u / c)' = u' / c
                    return div_opt(u_prime, (**v).clone());
                }

                let numerator = sub_opt(
                    mul_opt(u_prime, (**v).clone()),
                    mul_opt((**u).clone(), v_prime),
                );
                div_opt(numerator, Expr::pow((**v).clone(), Expr::number(2.0)))
            }

            ExprKind::Pow(u, v) => derive_power(u, v, var),
        }
    }
}

/// Power rule, with logarithmic differentiation for variable exponents
fn derive_power(u: &Expr, v: &Expr, var: &str) -> Expr {
    let u_prime = u.derive(var);

    if !v.contains_var(var) {
        // Constant exponent: (u^n)' = n * u^(n-1) * u'
        if u_prime.is_zero_num() {
            return Expr::number(0.0);
        }
        return match v.as_number() {
            Some(n) if n == 0.0 => Expr::number(0.0),
            Some(n) if n == 1.0 => u_prime,
            Some(n) => {
                let u_pow = if n == 2.0 {
                    u.clone()
                } else {
                    Expr::pow(u.clone(), Expr::number(n - 1.0))
                };
                mul_opt(Expr::number(n), mul_opt(u_pow, u_prime))
            }
            None => {
                let n_minus_1 = Expr::sub_expr(v.clone(), Expr::number(1.0));
                mul_opt(
                    v.clone(),
                    mul_opt(Expr::pow(u.clone(), n_minus_1), u_prime),
                )
            }
        };
    }

    // Variable exponent: d/dx[u^v] = u^v * (v' * ln(u) + v * u'/u)
    let v_prime = v.derive(var);

    let ln_u = if u.is_one_num() {
        Expr::number(0.0)
    } else {
        func("log", u.clone())
    };

    let term1 = mul_opt(v_prime, ln_u);
    let term2 = if u_prime.is_zero_num() {
        Expr::number(0.0)
    } else {
        mul_opt(v.clone(), div_opt(u_prime, u.clone()))
    };

    let sum = add_opt(term1, term2);
    mul_opt(Expr::pow(u.clone(), v.clone()), sum)
}
