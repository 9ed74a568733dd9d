//! Implicit multiplication insertion for natural notation
//!
//! Inserts `*` operators between tokens where multiplication is implied, e.g. `2x` → `2 * x`,
//! `x y` → `x * y`, `(a + b)(c)` → `(a + b) * (c)`.

use super::tokens::{Lexeme, Operator, Token};
use crate::error::Span;

/// Check if implicit multiplication should be inserted between two tokens
fn should_insert_mul(current: &Token, next: &Token) -> bool {
    matches!(
        (current, next),
        (
            Token::Number(_) | Token::Identifier(_) | Token::RightParen | Token::RightBracket,
            Token::Number(_) | Token::Identifier(_) | Token::Function(_) | Token::LeftParen,
        )
    )
}

/// Insert implicit multiplication operators between appropriate tokens
///
/// Rules:
/// - Number/Identifier/closing bracket followed by Number/Identifier/Function/`(`
///
/// The lexer already turned `name(` into a function token when `name` is a built-in,
/// so an identifier followed by `(` here is always a product: `x (y + 1)` → `x * (y + 1)`.
pub(crate) fn insert_implicit_multiplication(tokens: Vec<Lexeme>) -> Vec<Lexeme> {
    if tokens.is_empty() {
        return tokens;
    }

    let needs_insertion = tokens
        .windows(2)
        .any(|w| should_insert_mul(&w[0].token, &w[1].token));

    if !needs_insertion {
        return tokens;
    }

    let mut result = Vec::with_capacity(tokens.len() * 3 / 2);
    let mut it = tokens.into_iter().peekable();

    while let Some(current) = it.next() {
        let inserted_at = it
            .peek()
            .filter(|next| should_insert_mul(&current.token, &next.token))
            .map(|next| next.span.start);

        result.push(current);
        if let Some(at) = inserted_at {
            result.push(Lexeme::new(Token::Operator(Operator::Mul), Span::new(at, at)));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(tokens: Vec<Token>) -> Vec<Lexeme> {
        tokens
            .into_iter()
            .enumerate()
            .map(|(i, t)| Lexeme::new(t, Span::at(i)))
            .collect()
    }

    #[test]
    fn test_number_identifier() {
        let tokens = lexemes(vec![Token::Number(2.0), Token::Identifier("x".into())]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 3);
        assert_eq!(result[1].token, Token::Operator(Operator::Mul));
    }

    #[test]
    fn test_identifier_identifier() {
        let tokens = lexemes(vec![Token::Identifier("a".into()), Token::Identifier("x".into())]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_paren_paren() {
        let tokens = lexemes(vec![Token::RightParen, Token::LeftParen]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_function_no_multiplication() {
        let tokens = lexemes(vec![Token::Function("sin"), Token::LeftParen]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_bracket_call_followed_by_identifier() {
        // Exp[x] y → Exp[x] * y
        let tokens = lexemes(vec![
            Token::Function("exp"),
            Token::LeftBracket,
            Token::Identifier("x".into()),
            Token::RightBracket,
            Token::Identifier("y".into()),
        ]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 6);
        assert_eq!(result[4].token, Token::Operator(Operator::Mul));
    }

    #[test]
    fn test_operator_untouched() {
        let tokens = lexemes(vec![
            Token::Identifier("x".into()),
            Token::Operator(Operator::Add),
            Token::Number(1.0),
        ]);
        let result = insert_implicit_multiplication(tokens.clone());
        assert_eq!(result, tokens);
    }
}
