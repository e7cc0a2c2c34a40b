use span::Span;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct LexError {
  pub message: String,
  pub span: Span,
  pub line: usize,
  pub column: usize,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct ParseError {
  pub message: String,
  pub span: Span,
  pub line: usize,
  pub column: usize,
}
