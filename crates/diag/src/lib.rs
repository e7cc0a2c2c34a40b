//! Turns `(message, span)` pairs into human-readable diagnostics, anchored
//! against the original source text.
//!
//! This is shared by the lexer, parser and evaluator: each produces errors
//! carrying a [`span::Span`] rather than formatted text, and asks this crate
//! to render them against whichever source string is on hand.

mod report;
mod source;
mod style;

pub use report::{EmitError, Level, Report, ReportBuilder};
pub use source::Source;
