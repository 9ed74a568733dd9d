//! Lexer: turns formula text into positioned tokens
//!
//! Identifiers are maximal alphanumeric runs. An identifier becomes a function token
//! when it names a built-in function, is not a declared variable, and is immediately
//! followed (ignoring whitespace) by `(` or `[`.

use super::tokens::{Lexeme, Operator, Token};
use crate::PropagationError;
use crate::error::Span;
use crate::functions::registry::Registry;
use rustc_hash::FxHashSet;

/// Tokenize `input`, resolving function names against the declared variables
pub(crate) fn lex(
    input: &str,
    variables: &FxHashSet<&str>,
) -> Result<Vec<Lexeme>, PropagationError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::with_capacity(input.len() / 2 + 1);
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            let end = scan_number(bytes, pos);
            let text = &input[pos..end];
            let value: f64 = text.parse().map_err(|_| {
                PropagationError::parse_at(
                    format!("invalid number '{}'", text),
                    Span::new(pos, end),
                )
            })?;
            if bytes.get(end) == Some(&b'.') {
                return Err(PropagationError::parse_at(
                    format!("invalid number '{}.'", text),
                    Span::new(pos, end + 1),
                ));
            }
            tokens.push(Lexeme::new(Token::Number(value), Span::new(pos, end)));
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            let mut end = pos + 1;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            let name = &input[pos..end];
            let span = Span::new(pos, end);
            let next = next_significant(bytes, end);

            let token = match Registry::resolve(name) {
                Some(def)
                    if !variables.contains(name) && matches!(next, Some(b'(') | Some(b'[')) =>
                {
                    Token::Function(def.name)
                }
                _ if next == Some(b'[') => {
                    let msg = if variables.contains(name) {
                        format!("'{}' is a declared variable, not a function", name)
                    } else {
                        format!("unknown function '{}'", name)
                    };
                    return Err(PropagationError::parse_at(msg, span));
                }
                _ => Token::Identifier(name.to_string()),
            };
            tokens.push(Lexeme::new(token, span));
            pos = end;
            continue;
        }

        let (token, width) = match c {
            b'+' => (Token::Operator(Operator::Add), 1),
            b'-' => (Token::Operator(Operator::Sub), 1),
            b'*' if bytes.get(pos + 1) == Some(&b'*') => (Token::Operator(Operator::Pow), 2),
            b'*' => (Token::Operator(Operator::Mul), 1),
            b'/' => (Token::Operator(Operator::Div), 1),
            b'^' => (Token::Operator(Operator::Pow), 1),
            b'(' => (Token::LeftParen, 1),
            b')' => (Token::RightParen, 1),
            b'[' => (Token::LeftBracket, 1),
            b']' => (Token::RightBracket, 1),
            b',' => (Token::Comma, 1),
            _ => {
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(PropagationError::parse_at(
                    format!("unexpected character '{}'", ch),
                    Span::new(pos, pos + ch.len_utf8()),
                ));
            }
        };
        tokens.push(Lexeme::new(token, Span::new(pos, pos + width)));
        pos += width;
    }

    Ok(tokens)
}

/// Scan a numeric literal starting at `start`: digits, optional fraction, optional exponent
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // Exponent only when digits follow, so `2e` stays `2 * e`
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            end = exp_end;
        }
    }
    end
}

fn next_significant(bytes: &[u8], from: usize) -> Option<u8> {
    bytes[from..].iter().copied().find(|b| !b.is_ascii_whitespace())
}
