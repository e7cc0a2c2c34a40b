//! Lexer, AST and parser for the coffee language.
//!
//! [`parse_source`] is the usual entry point: it lexes `src` and feeds the
//! resulting token stream to the recursive-descent parser, producing an
//! [`ast::Module`] or a [`SyntaxError`] anchored at the offending span.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::{LexError, ParseError};
pub use lexer::{lex, LexOutput};
pub use token::{Literal, Token, TokenKind};

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SyntaxError {
  #[error(transparent)]
  Lex(#[from] LexError),
  #[error(transparent)]
  Parse(#[from] ParseError),
}

impl SyntaxError {
  pub fn span(&self) -> span::Span {
    match self {
      SyntaxError::Lex(e) => e.span,
      SyntaxError::Parse(e) => e.span,
    }
  }
}

/// Lexes and parses `src`, returning the module AST plus the normalized
/// source text the AST's spans are relative to.
pub fn parse_source(src: &str) -> Result<(ast::Module, String), SyntaxError> {
  let out = lex(src)?;
  let module = parser::parse(out.tokens)?;
  Ok((module, out.source))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_small_program() {
    let (module, _src) = parse_source("x = 1\nif x > 0\n  x\nelse\n  0\n").unwrap();
    assert_eq!(module.statements.len(), 2);
  }

  #[test]
  fn surfaces_lex_errors_through_the_aggregate_type() {
    let err = parse_source("x = 1\n\tif true\n      0\n").unwrap_err();
    assert!(matches!(err, SyntaxError::Lex(_)) || matches!(err, SyntaxError::Parse(_)));
    let _ = err.span();
  }
}
