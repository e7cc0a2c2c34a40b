use std::io::{self, Write};

use span::Span;
use thiserror::Error;

use crate::source::Source;
use crate::style::Style;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
  Info,
  Warning,
  Error,
}

impl Level {
  fn as_str(&self) -> &'static str {
    match self {
      Level::Info => "info",
      Level::Warning => "warning",
      Level::Error => "error",
    }
  }
}

/// A diagnostic message anchored to a span of some source text.
///
/// Rendered as a single-line caret pointer, e.g.:
///
/// ```text
/// error: unexpected token
///   at script:3:7
///   |\tx = (1 +)
///   |       ^
/// ```
pub struct Report<'a> {
  level: Level,
  source: Source<'a>,
  message: String,
  span: Span,
}

/// Type-state marker for a [`ReportBuilder`] that has not yet been given a
/// source to render against.
pub struct NoSource;

/// Builds a [`Report`]. A source must be attached with [`with_source`][Self::with_source]
/// before the report can be emitted - until then the only available method
/// is `with_source` itself.
pub struct ReportBuilder<'a, S> {
  level: Level,
  message: String,
  span: Span,
  source: S,
}

impl Report<'static> {
  pub fn info(message: impl Into<String>, span: impl Into<Span>) -> ReportBuilder<'static, NoSource> {
    ReportBuilder::new(Level::Info, message, span)
  }

  pub fn warn(message: impl Into<String>, span: impl Into<Span>) -> ReportBuilder<'static, NoSource> {
    ReportBuilder::new(Level::Warning, message, span)
  }

  pub fn error(message: impl Into<String>, span: impl Into<Span>) -> ReportBuilder<'static, NoSource> {
    ReportBuilder::new(Level::Error, message, span)
  }
}

impl<'a> ReportBuilder<'a, NoSource> {
  fn new(level: Level, message: impl Into<String>, span: impl Into<Span>) -> Self {
    ReportBuilder {
      level,
      message: message.into(),
      span: span.into(),
      source: NoSource,
    }
  }

  pub fn with_source(self, source: impl Into<Source<'a>>) -> ReportBuilder<'a, Source<'a>> {
    ReportBuilder {
      level: self.level,
      message: self.message,
      span: self.span,
      source: source.into(),
    }
  }
}

impl<'a> ReportBuilder<'a, Source<'a>> {
  pub fn build(self) -> Report<'a> {
    Report {
      level: self.level,
      source: self.source,
      message: self.message,
      span: self.span,
    }
  }

  pub fn emit<W: Write>(self, w: W) -> Result<(), EmitError> {
    self.build().emit(w)
  }

  pub fn emit_to_string(self) -> Result<String, EmitError> {
    self.build().emit_to_string()
  }
}

#[derive(Debug, Error)]
pub enum EmitError {
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error(transparent)]
  Fmt(#[from] std::fmt::Error),
  #[error("span {0} is out of bounds of the source text")]
  OutOfBounds(Span),
}

impl<'a> Report<'a> {
  pub fn level(&self) -> Level {
    self.level
  }

  pub fn span(&self) -> Span {
    self.span
  }

  /// Render the report as plain text (no color) into `w`.
  pub fn emit<W: Write>(&self, mut w: W) -> Result<(), EmitError> {
    write!(w, "{}", self.emit_to_string()?)?;
    Ok(())
  }

  /// Render the report as plain text (no color), returning the result as a string.
  ///
  /// Colored rendering is available to a host with a real terminal via
  /// [`Report::emit_styled`]; library consumers get plain text by default so
  /// the output is stable to assert against in tests.
  pub fn emit_to_string(&self) -> Result<String, EmitError> {
    self.render(&Style::plain())
  }

  /// Render the report with ANSI color codes, for a host printing directly
  /// to an interactive terminal.
  pub fn emit_styled(&self) -> Result<String, EmitError> {
    self.render(&Style::colored())
  }

  fn render(&self, style: &Style) -> Result<String, EmitError> {
    use std::fmt::Write as _;

    let src = self.source.str();
    if self.span.start > src.len() || self.span.end > src.len() || self.span.start > self.span.end {
      return Err(EmitError::OutOfBounds(self.span));
    }

    let (line, col) = self.span.line_col(src);
    let line_text = line_containing(src, self.span.start);

    let mut out = String::new();
    writeln!(out, "{}: {}", style.level(self.level.as_str()), self.message)?;
    match self.source.name() {
      Some(name) => writeln!(out, "  at {name}:{line}:{col}")?,
      None => writeln!(out, "  at {line}:{col}")?,
    }
    writeln!(out, "  | {line_text}")?;

    let underline_len = underline_len(self.span, src, line_text, col);
    let pointer = format!("{}{}", " ".repeat(col - 1), "^".repeat(underline_len));
    write!(out, "  | {}", style.span(pointer))?;

    Ok(out)
  }
}

fn line_containing(src: &str, at: usize) -> &str {
  let start = src[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
  let end = src[at..].find('\n').map(|i| at + i).unwrap_or(src.len());
  &src[start..end]
}

/// Number of carets to draw under the pointer, clamped to what remains of
/// the line so a span that runs onto a later line doesn't overflow it.
fn underline_len(span: Span, src: &str, line_text: &str, col: usize) -> usize {
  let span_len = span.end.saturating_sub(span.start);
  let remaining_on_line = line_text.chars().count().saturating_sub(col - 1);
  span_len.max(1).min(remaining_on_line.max(1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_single_line_caret() {
    let src = "x = (1 +)";
    let report = Report::error("unexpected token `)`", Span { start: 8, end: 9 })
      .with_source(Source::file("script", src))
      .build();
    let rendered = report.emit_to_string().unwrap();
    assert!(rendered.contains("error: unexpected token"));
    assert!(rendered.contains("at script:1:9"));
    assert!(rendered.ends_with('^'));
  }

  #[test]
  fn out_of_bounds_span_is_an_error() {
    let report = Report::error("oops", Span { start: 0, end: 100 })
      .with_source(Source::string("short"))
      .build();
    assert!(matches!(report.emit_to_string(), Err(EmitError::OutOfBounds(_))));
  }
}
