//! Aggregate error type: mirrors the teacher's root `Error` enum
//! (`Vm`/`Syntax`/`User` variants in `hebi`'s `src/error.rs`), folding the
//! lexer, parser and evaluator's distinct error kinds into one type that a
//! caller can match on or simply `Display`.

use std::fmt;

use span::Span;
use syntax::SyntaxError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A runtime error: undefined identifier, non-callable invocation, missing
/// attribute/index, destructuring mismatch, `return`/`break`/`continue` out
/// of context, uncaught `throw`, or a `Host` failure.
#[derive(Clone, Debug)]
pub struct RuntimeError {
  pub message: String,
  pub span: Option<Span>,
}

impl RuntimeError {
  pub fn new(message: impl Into<String>) -> RuntimeError {
    RuntimeError { message: message.into(), span: None }
  }

  pub fn at(message: impl Into<String>, span: Span) -> RuntimeError {
    RuntimeError { message: message.into(), span: Some(span) }
  }

  pub fn with_span(mut self, span: Span) -> RuntimeError {
    if self.span.is_none() {
      self.span = Some(span);
    }
    self
  }
}

impl fmt::Display for RuntimeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl std::error::Error for RuntimeError {}

#[derive(Debug)]
pub enum Error {
  Syntax(SyntaxError),
  Runtime(RuntimeError),
}

impl From<SyntaxError> for Error {
  fn from(value: SyntaxError) -> Self {
    Error::Syntax(value)
  }
}

impl From<RuntimeError> for Error {
  fn from(value: RuntimeError) -> Self {
    Error::Runtime(value)
  }
}

impl Error {
  pub fn span(&self) -> Option<Span> {
    match self {
      Error::Syntax(e) => Some(e.span()),
      Error::Runtime(e) => e.span,
    }
  }

  /// Renders the error as a caret-pointer snippet against `src`, the way
  /// `coffee_diag` renders lexer/parser diagnostics (spec.md §7).
  pub fn report(&self, src: &str) -> String {
    let span = self.span().unwrap_or(Span { start: 0, end: 0 });
    diag::Report::error(self.to_string(), span)
      .with_source(diag::Source::string(src))
      .emit_to_string()
      .unwrap_or_else(|_| self.to_string())
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Syntax(e) => write!(f, "{e}"),
      Error::Runtime(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for Error {}
