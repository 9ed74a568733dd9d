use super::tokens::{Lexeme, Operator, Token};
use crate::error::Span;
use crate::functions::registry::Registry;
use crate::known_symbols::{is_euler, is_known_constant};
use crate::{Expr, ExprKind, PropagationError};
use rustc_hash::FxHashSet;

/// Recursion guard for pathological inputs such as thousands of nested parentheses
const MAX_PARSE_DEPTH: usize = 512;

/// Parse tokens into an AST using Pratt parsing algorithm
pub(crate) fn parse_expression(
    tokens: &[Lexeme],
    variables: &FxHashSet<&str>,
    input_len: usize,
) -> Result<Expr, PropagationError> {
    if tokens.is_empty() {
        return Err(PropagationError::EmptyFormula);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        variables,
        input_len,
    };

    let expr = parser.parse_expr(0)?;

    if let Some(extra) = parser.current() {
        return Err(PropagationError::parse_at(
            format!("unexpected '{}'", extra.token.to_user_string()),
            extra.span,
        ));
    }

    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Lexeme],
    pos: usize,
    depth: usize,
    variables: &'a FxHashSet<&'a str>,
    input_len: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Lexeme> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn end_of_input(&self) -> PropagationError {
        PropagationError::parse_at("unexpected end of input", Span::at(self.input_len))
    }

    fn expect(&mut self, closing: &Token) -> Result<(), PropagationError> {
        match self.current() {
            Some(lexeme) if &lexeme.token == closing => {
                self.advance();
                Ok(())
            }
            Some(lexeme) => Err(PropagationError::parse_at(
                format!(
                    "expected '{}', got '{}'",
                    closing.to_user_string(),
                    lexeme.token.to_user_string()
                ),
                lexeme.span,
            )),
            None => Err(PropagationError::parse_at(
                format!("missing '{}'", closing.to_user_string()),
                Span::at(self.input_len),
            )),
        }
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr, PropagationError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(PropagationError::MaxDepthExceeded);
        }

        // Parse left side (prefix)
        let mut left = self.parse_prefix()?;

        // Parse operators and right side (infix)
        while let Some(lexeme) = self.current() {
            let op = match lexeme.token {
                Token::Operator(op) => op,
                _ => break,
            };

            if op.precedence() < min_precedence {
                break;
            }

            left = self.parse_infix(left, op)?;
        }

        self.depth -= 1;
        Ok(left)
    }

    fn is_declared(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    fn parse_arguments(&mut self, closing: &Token) -> Result<Vec<Expr>, PropagationError> {
        let mut args = Vec::new();

        loop {
            args.push(self.parse_expr(0)?);

            match self.current() {
                Some(Lexeme {
                    token: Token::Comma,
                    ..
                }) => self.advance(),
                _ => break,
            }
        }

        self.expect(closing)?;
        Ok(args)
    }

    fn parse_prefix(&mut self) -> Result<Expr, PropagationError> {
        let lexeme = self.current().ok_or_else(|| self.end_of_input())?;

        match &lexeme.token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::number(*n))
            }

            Token::Identifier(name) => {
                self.advance();
                if self.is_declared(name) || is_known_constant(name) {
                    Ok(Expr::symbol(name.clone()))
                } else {
                    Err(PropagationError::UndefinedVariable {
                        name: name.clone(),
                        span: Some(lexeme.span),
                    })
                }
            }

            Token::Function(name) => {
                self.advance();

                let closing = match self.current().map(|l| &l.token) {
                    Some(Token::LeftParen) => Token::RightParen,
                    Some(Token::LeftBracket) => Token::RightBracket,
                    _ => {
                        return Err(PropagationError::parse_at(
                            format!("expected '(' or '[' after '{}'", name),
                            lexeme.span,
                        ));
                    }
                };
                self.advance();
                let args = self.parse_arguments(&closing)?;

                if let Some(def) = Registry::get(name)
                    && !def.validate_arity(args.len())
                {
                    return Err(PropagationError::parse_at(
                        format!(
                            "function '{}' does not take {} argument(s)",
                            name,
                            args.len()
                        ),
                        lexeme.span,
                    ));
                }

                Ok(Expr::func_multi(*name, args))
            }

            // Unary minus: precedence between Mul (20) and Pow (30)
            // This ensures -x^2 parses as -(x^2), not (-x)^2
            Token::Operator(Operator::Sub) => {
                self.advance();
                let expr = self.parse_expr(25)?;
                Ok(match expr.as_number() {
                    Some(n) => Expr::number(-n),
                    None => Expr::mul_expr(Expr::number(-1.0), expr),
                })
            }

            // Unary plus: same precedence as unary minus, just returns the expression
            Token::Operator(Operator::Add) => {
                self.advance();
                self.parse_expr(25)
            }

            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            other => Err(PropagationError::parse_at(
                format!("unexpected '{}'", other.to_user_string()),
                lexeme.span,
            )),
        }
    }

    fn parse_infix(&mut self, left: Expr, op: Operator) -> Result<Expr, PropagationError> {
        self.advance();

        // Right associative for power, left for others
        let next_precedence = if op == Operator::Pow {
            op.precedence()
        } else {
            op.precedence() + 1
        };

        let right = self.parse_expr(next_precedence)?;

        Ok(match op {
            Operator::Add => Expr::add_expr(left, right),
            Operator::Sub => Expr::sub_expr(left, right),
            Operator::Mul => Expr::mul_expr(left, right),
            Operator::Div => Expr::div_expr(left, right),
            // E^u is the exponential unless E was declared as a variable
            Operator::Pow => match &left.kind {
                ExprKind::Symbol(name) if is_euler(name) && !self.is_declared(name) => {
                    Expr::func("exp", right)
                }
                _ => Expr::pow(left, right),
            },
        })
    }
}
