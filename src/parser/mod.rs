//! Parser module - converts formula strings to AST
mod implicit_mul;
mod lexer;
mod pratt;
mod tokens;

use crate::{Expr, PropagationError};
use rustc_hash::FxHashSet;

/// Parse a formula string into an expression AST
///
/// Accepts infix arithmetic (`+ - * / ^`, with `**` as a synonym for `^`), parentheses,
/// bracket calls such as `Exp[x]` or `Sqrt[x]`, lowercase calls such as `exp(x)`,
/// juxtaposition as multiplication (`2x`, `x y`, `(a+b)(c+d)`), and the constants
/// `E`/`e` and `Pi`/`pi`. A declared variable shadows a constant or function of the
/// same name.
///
/// # Errors
/// - [`PropagationError::EmptyFormula`] for blank input
/// - [`PropagationError::ParseError`] for malformed syntax
/// - [`PropagationError::UndefinedVariable`] when the formula uses a name outside `variables`
///
/// # Example
/// ```
/// use errprop::parse;
///
/// let expr = parse("x^2 + Exp[y]", &["x", "y"]).unwrap();
/// assert_eq!(expr.to_string(), "x^2 + exp(y)");
/// ```
pub fn parse(input: &str, variables: &[&str]) -> Result<Expr, PropagationError> {
    // Pipeline: validate -> lex -> implicit_mul -> parse
    if input.trim().is_empty() {
        return Err(PropagationError::EmptyFormula);
    }

    let declared: FxHashSet<&str> = variables.iter().copied().collect();

    let tokens = lexer::lex(input, &declared)?;
    let tokens = implicit_mul::insert_implicit_multiplication(tokens);
    pratt::parse_expression(&tokens, &declared, input.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExprKind;

    #[test]
    fn test_empty_formula() {
        assert_eq!(parse("   ", &["x"]), Err(PropagationError::EmptyFormula));
    }

    #[test]
    fn test_bracket_and_paren_calls_agree() {
        let a = parse("Exp[x] + Sqrt[y]", &["x", "y"]).unwrap();
        let b = parse("exp(x) + sqrt(y)", &["x", "y"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_juxtaposition() {
        let a = parse("2 x y", &["x", "y"]).unwrap();
        let b = parse("2*x*y", &["x", "y"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_double_star_power() {
        let a = parse("x**2", &["x"]).unwrap();
        let b = parse("x^2", &["x"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multi_character_variables() {
        let expr = parse("theta*rho", &["theta", "rho"]).unwrap();
        assert_eq!(
            expr.symbols().into_iter().collect::<Vec<_>>(),
            vec!["rho".to_string(), "theta".to_string()]
        );
    }

    #[test]
    fn test_undefined_variable_reports_name() {
        let err = parse("x + w", &["x"]).unwrap_err();
        assert!(matches!(err, PropagationError::UndefinedVariable { ref name, .. } if name == "w"));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            parse("(x + 1", &["x"]),
            Err(PropagationError::ParseError { .. })
        ));
        assert!(matches!(
            parse("x + 1)", &["x"]),
            Err(PropagationError::ParseError { .. })
        ));
    }

    #[test]
    fn test_dangling_operator() {
        assert!(matches!(
            parse("x +", &["x"]),
            Err(PropagationError::ParseError { .. })
        ));
    }

    #[test]
    fn test_constants_are_symbols() {
        let expr = parse("Pi x", &["x"]).unwrap();
        assert!(matches!(expr.kind, ExprKind::Mul(_, _)));
        assert!(expr.contains_var("Pi"));
    }

    #[test]
    fn test_log_with_base() {
        let expr = parse("Log[10, x]", &["x"]).unwrap();
        assert!(matches!(&expr.kind, ExprKind::FunctionCall { name, args } if name == "log" && args.len() == 2));
    }
}
