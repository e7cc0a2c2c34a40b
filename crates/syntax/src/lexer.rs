use span::Span;

use crate::error::LexError;
use crate::token::{keyword, Literal, StrPart, Token, TokenKind};

/// Result of a successful lex: the token stream plus the (CRLF-normalized)
/// source text the spans are relative to.
pub struct LexOutput {
  pub tokens: Vec<Token>,
  pub source: String,
}

pub fn lex(src: &str) -> Result<LexOutput, LexError> {
  Lexer::new(src).run()
}

struct Lexer {
  src: String,
  chars: Vec<char>,
  /// `offsets[i]` is the byte offset of `chars[i]`; `offsets[chars.len()]` is `src.len()`.
  offsets: Vec<usize>,

  current: usize,
  line: usize,
  column: usize,

  start: usize,
  start_line: usize,
  start_column: usize,

  at_line_start: bool,
  indents: Vec<usize>,
  tokens: Vec<Token>,

  /// Kind of the last emitted non-trivial token, used to decide whether `/`
  /// starts a regex literal or a division operator.
  prev_kind: Option<TokenKind>,

  /// Set when inline whitespace was skipped since the last emitted token.
  pending_space: bool,
}

impl Lexer {
  fn new(src: &str) -> Lexer {
    let normalized = src.replace("\r\n", "\n").replace('\r', "\n");
    let mut chars = Vec::with_capacity(normalized.len());
    let mut offsets = Vec::with_capacity(normalized.len() + 1);
    for (i, ch) in normalized.char_indices() {
      chars.push(ch);
      offsets.push(i);
    }
    offsets.push(normalized.len());

    Lexer {
      src: normalized,
      chars,
      offsets,
      current: 0,
      line: 1,
      column: 1,
      start: 0,
      start_line: 1,
      start_column: 1,
      at_line_start: true,
      indents: vec![0],
      tokens: Vec::new(),
      prev_kind: None,
      pending_space: false,
    }
  }

  fn run(mut self) -> Result<LexOutput, LexError> {
    while !self.is_at_end() {
      if self.at_line_start && self.consume_line_prefix()? {
        continue;
      }
      if self.is_at_end() {
        break;
      }

      self.start = self.current;
      self.start_line = self.line;
      self.start_column = self.column;
      self.scan_token()?;
    }

    while self.indents.len() > 1 {
      self.indents.pop();
      self.push(TokenKind::Outdent, "");
    }
    self.push(TokenKind::Eof, "");

    Ok(LexOutput {
      tokens: self.tokens,
      source: self.src,
    })
  }

  // ---- indentation -------------------------------------------------------

  /// Consumes leading whitespace of a logical line and turns it into
  /// INDENT/OUTDENT tokens, or fully consumes a blank/comment-only line.
  /// Returns true if the line was fully handled (caller should loop again).
  fn consume_line_prefix(&mut self) -> Result<bool, LexError> {
    let mut indent = 0usize;
    while !self.is_at_end() && matches!(self.peek(), ' ' | '\t') {
      let ch = self.advance();
      indent += if ch == '\t' { 4 } else { 1 };
    }

    if self.is_at_end() {
      return Ok(false);
    }

    if self.peek() == '\n' {
      self.emit_newline();
      return Ok(true);
    }

    if self.peek() == '#' {
      while !self.is_at_end() && self.peek() != '\n' {
        self.advance();
      }
      if !self.is_at_end() && self.peek() == '\n' {
        self.emit_newline();
      }
      return Ok(true);
    }

    let top = *self.indents.last().unwrap();
    if indent > top {
      self.indents.push(indent);
      self.push(TokenKind::Indent, "");
    } else if indent < top {
      while indent < *self.indents.last().unwrap() {
        self.indents.pop();
        self.push(TokenKind::Outdent, "");
      }
      if indent != *self.indents.last().unwrap() {
        return Err(self.error("inconsistent indentation"));
      }
    }

    self.at_line_start = false;
    Ok(false)
  }

  fn emit_newline(&mut self) {
    let line = self.line;
    let column = self.column;
    let span_start = self.offsets[self.current];
    self.advance();
    let span = Span {
      start: span_start,
      end: self.offsets[self.current],
    };
    let mut token = Token::new(TokenKind::Newline, "\n", span, line, column);
    token.spaced_before = self.pending_space;
    self.pending_space = false;
    self.tokens.push(token);
    self.at_line_start = true;
  }

  // ---- token scanning ------------------------------------------------------

  fn scan_token(&mut self) -> Result<(), LexError> {
    let ch = self.advance();

    match ch {
      ' ' | '\t' => {
        self.pending_space = true;
        Ok(())
      }
      '\n' => {
        self.push(TokenKind::Newline, "\n");
        self.at_line_start = true;
        Ok(())
      }
      '#' => {
        while !self.is_at_end() && self.peek() != '\n' {
          self.advance();
        }
        Ok(())
      }
      '(' => self.simple(TokenKind::LParen),
      ')' => self.simple(TokenKind::RParen),
      '[' => self.simple(TokenKind::LBracket),
      ']' => self.simple(TokenKind::RBracket),
      '{' => self.simple(TokenKind::LBrace),
      '}' => self.simple(TokenKind::RBrace),
      ',' => self.simple(TokenKind::Comma),
      ':' => {
        if self.matches(':') {
          self.simple(TokenKind::Proto)
        } else {
          self.simple(TokenKind::Colon)
        }
      }
      ';' => self.simple(TokenKind::Semicolon),
      '@' => self.simple(TokenKind::At),
      '.' => {
        if self.matches('.') {
          if self.matches('.') {
            self.simple(TokenKind::DotDotDot)
          } else {
            self.simple(TokenKind::DotDot)
          }
        } else {
          self.simple(TokenKind::Dot)
        }
      }
      '?' => {
        if self.matches('.') {
          self.simple(TokenKind::QuestionDot)
        } else if self.matches('=') {
          self.simple(TokenKind::QuestionEq)
        } else {
          self.simple(TokenKind::Question)
        }
      }
      '=' => {
        if self.matches('=') {
          self.simple(TokenKind::EqEq)
        } else if self.matches('>') {
          self.simple(TokenKind::FatArrow)
        } else {
          self.simple(TokenKind::Eq)
        }
      }
      '!' => {
        if self.matches('=') {
          self.simple(TokenKind::Neq)
        } else {
          Err(self.error("unexpected character '!'"))
        }
      }
      '<' => {
        if self.matches('=') {
          self.simple(TokenKind::Lte)
        } else {
          self.simple(TokenKind::Lt)
        }
      }
      '>' => {
        if self.matches('=') {
          self.simple(TokenKind::Gte)
        } else {
          self.simple(TokenKind::Gt)
        }
      }
      '+' => {
        if self.matches('+') {
          self.simple(TokenKind::PlusPlus)
        } else if self.matches('=') {
          self.simple(TokenKind::PlusEq)
        } else {
          self.simple(TokenKind::Plus)
        }
      }
      '-' => {
        if self.matches('>') {
          self.simple(TokenKind::Arrow)
        } else if self.matches('-') {
          self.simple(TokenKind::MinusMinus)
        } else if self.matches('=') {
          self.simple(TokenKind::MinusEq)
        } else {
          self.simple(TokenKind::Minus)
        }
      }
      '*' => {
        if self.matches('*') {
          self.simple(TokenKind::StarStar)
        } else if self.matches('=') {
          self.simple(TokenKind::StarEq)
        } else {
          self.simple(TokenKind::Star)
        }
      }
      '%' => {
        if self.matches('=') {
          self.simple(TokenKind::PercentEq)
        } else {
          self.simple(TokenKind::Percent)
        }
      }
      '&' => {
        if self.matches('&') {
          if self.matches('=') {
            self.simple(TokenKind::AndAndEq)
          } else {
            self.simple(TokenKind::AndAnd)
          }
        } else {
          Err(self.error("unexpected character '&'"))
        }
      }
      '|' => {
        if self.matches('|') {
          if self.matches('=') {
            self.simple(TokenKind::OrOrEq)
          } else {
            self.simple(TokenKind::OrOr)
          }
        } else {
          Err(self.error("unexpected character '|'"))
        }
      }
      '/' => self.slash_or_regex(),
      '"' => self.string('"'),
      '\'' => self.string('\''),
      ch if ch.is_ascii_digit() => self.number(),
      ch if is_ident_start(ch) => self.identifier(),
      ch => Err(self.error(&format!("unexpected character '{ch}'"))),
    }
  }

  fn slash_or_regex(&mut self) -> Result<(), LexError> {
    // `///` always starts a heregex.
    if self.peek() == '/' && self.peek_at(1) == '/' {
      self.advance();
      self.advance();
      return self.heregex();
    }

    if self.matches('=') {
      return self.simple(TokenKind::SlashEq);
    }

    let next = self.peek();
    let looks_like_regex_start = !matches!(next, ' ' | '\t' | '/' | '=' | '\n' | '\0');
    if looks_like_regex_start && expects_operand(self.prev_kind) {
      return self.regex();
    }

    self.simple(TokenKind::Slash)
  }

  fn regex(&mut self) -> Result<(), LexError> {
    let mut pattern = String::new();
    loop {
      if self.is_at_end() || self.peek() == '\n' {
        return Err(self.error("unterminated regex literal"));
      }
      let ch = self.advance();
      if ch == '/' {
        break;
      }
      if ch == '\\' {
        pattern.push(ch);
        if self.is_at_end() {
          return Err(self.error("unterminated regex literal"));
        }
        pattern.push(self.advance());
        continue;
      }
      pattern.push(ch);
    }

    let flags = self.regex_flags();
    self.add_literal(TokenKind::String, Literal::Regex(pattern, flags));
    Ok(())
  }

  fn heregex(&mut self) -> Result<(), LexError> {
    let mut raw = String::new();
    loop {
      if self.is_at_end() {
        return Err(self.error("unterminated heregex literal"));
      }
      if self.peek() == '/' && self.peek_at(1) == '/' && self.peek_at(2) == '/' {
        self.advance();
        self.advance();
        self.advance();
        break;
      }
      let ch = self.advance();
      if ch == '\\' {
        raw.push(ch);
        if self.is_at_end() {
          return Err(self.error("unterminated heregex literal"));
        }
        raw.push(self.advance());
        continue;
      }
      raw.push(ch);
    }

    let pattern = strip_heregex_trivia(&raw);
    let flags = self.regex_flags();
    self.add_literal(TokenKind::String, Literal::Regex(pattern, flags));
    Ok(())
  }

  fn regex_flags(&mut self) -> String {
    let mut flags = String::new();
    while matches!(self.peek(), 'g' | 'i' | 'm' | 's' | 'u' | 'y') {
      flags.push(self.advance());
    }
    flags
  }

  fn string(&mut self, quote: char) -> Result<(), LexError> {
    if self.peek() == quote && self.peek_at(1) == quote {
      self.advance();
      self.advance();
      return self.block_string(quote);
    }

    // Only double-quoted strings interpolate; single-quoted ones are raw.
    let interpolates = quote == '"';
    let mut parts: Vec<StrPart> = Vec::new();
    let mut text = String::new();

    loop {
      if self.is_at_end() {
        return Err(self.error("unterminated string literal"));
      }
      if interpolates && self.peek() == '#' && self.peek_at(1) == '{' {
        if !text.is_empty() {
          parts.push(StrPart::Text(std::mem::take(&mut text)));
        }
        self.advance();
        self.advance();
        let expr_src = self.scan_interpolation_expr()?;
        parts.push(StrPart::Expr(expr_src));
        continue;
      }
      let ch = self.advance();
      if ch == quote {
        if parts.is_empty() {
          self.add_literal(TokenKind::String, Literal::Str(text));
        } else {
          if !text.is_empty() {
            parts.push(StrPart::Text(text));
          }
          self.add_literal(TokenKind::String, Literal::StrInterp(parts));
        }
        return Ok(());
      }
      if ch == '\\' {
        text.push(self.read_escape()?);
        continue;
      }
      if ch == '\n' {
        return Err(self.error("unterminated string literal"));
      }
      text.push(ch);
    }
  }

  /// Scans the raw source text of a `#{...}` interpolation, tracking brace
  /// depth and skipping over nested string literals so a `}` inside one
  /// doesn't close the interpolation early.
  fn scan_interpolation_expr(&mut self) -> Result<String, LexError> {
    let mut depth: i32 = 1;
    let mut out = String::new();
    loop {
      if self.is_at_end() {
        return Err(self.error("unterminated interpolation"));
      }
      let ch = self.peek();
      if ch == '{' {
        depth += 1;
        out.push(self.advance());
        continue;
      }
      if ch == '}' {
        depth -= 1;
        self.advance();
        if depth == 0 {
          return Ok(out);
        }
        out.push('}');
        continue;
      }
      if ch == '"' || ch == '\'' {
        let q = ch;
        out.push(self.advance());
        loop {
          if self.is_at_end() {
            return Err(self.error("unterminated string in interpolation"));
          }
          let c = self.advance();
          out.push(c);
          if c == '\\' {
            if !self.is_at_end() {
              out.push(self.advance());
            }
            continue;
          }
          if c == q {
            break;
          }
        }
        continue;
      }
      out.push(self.advance());
    }
  }

  fn block_string(&mut self, quote: char) -> Result<(), LexError> {
    let mut text = String::new();
    loop {
      if self.is_at_end() {
        return Err(self.error("unterminated block string literal"));
      }
      if self.peek() == quote && self.peek_at(1) == quote && self.peek_at(2) == quote {
        self.advance();
        self.advance();
        self.advance();
        break;
      }
      let ch = self.advance();
      if ch == '\\' {
        text.push(self.read_escape()?);
        continue;
      }
      text.push(ch);
    }

    self.add_literal(TokenKind::String, Literal::Str(dedent_block_string(&text)));
    Ok(())
  }

  fn read_escape(&mut self) -> Result<char, LexError> {
    if self.is_at_end() {
      return Err(self.error("unterminated string literal"));
    }
    let ch = self.advance();
    Ok(match ch {
      'n' => '\n',
      'r' => '\r',
      't' => '\t',
      'b' => '\u{8}',
      'f' => '\u{c}',
      'v' => '\u{b}',
      '0' => '\0',
      '\\' => '\\',
      '"' => '"',
      '\'' => '\'',
      'x' => self.read_fixed_hex_escape(2)?,
      'u' => {
        if self.peek() == '{' {
          self.advance();
          self.read_braced_unicode_escape()?
        } else {
          self.read_fixed_hex_escape(4)?
        }
      }
      other => other,
    })
  }

  fn read_fixed_hex_escape(&mut self, width: usize) -> Result<char, LexError> {
    let mut digits = String::new();
    for _ in 0..width {
      if self.is_at_end() || !self.peek().is_ascii_hexdigit() {
        return Err(self.error("invalid escape sequence"));
      }
      digits.push(self.advance());
    }
    let codepoint = u32::from_str_radix(&digits, 16).unwrap();
    char::from_u32(codepoint).ok_or_else(|| self.error("invalid escape sequence"))
  }

  fn read_braced_unicode_escape(&mut self) -> Result<char, LexError> {
    let mut digits = String::new();
    while !self.is_at_end() && self.peek() != '}' {
      if !self.peek().is_ascii_hexdigit() {
        return Err(self.error("invalid unicode escape sequence"));
      }
      digits.push(self.advance());
    }
    if self.is_at_end() || !self.matches('}') {
      return Err(self.error("invalid unicode escape sequence"));
    }
    if digits.is_empty() {
      return Err(self.error("invalid unicode escape sequence"));
    }
    let codepoint = u32::from_str_radix(&digits, 16).map_err(|_| self.error("invalid unicode escape sequence"))?;
    if codepoint > 0x10FFFF {
      return Err(self.error("invalid unicode escape sequence"));
    }
    char::from_u32(codepoint).ok_or_else(|| self.error("invalid unicode escape sequence"))
  }

  fn number(&mut self) -> Result<(), LexError> {
    while self.peek().is_ascii_digit() {
      self.advance();
    }
    if self.peek() == '.' && self.peek_at(1).is_ascii_digit() {
      self.advance();
      while self.peek().is_ascii_digit() {
        self.advance();
      }
    }

    let text: String = self.chars[self.start..self.current].iter().collect();
    if text.contains('.') {
      let value: f64 = text.parse().map_err(|_| self.error("invalid number literal"))?;
      self.add_literal(TokenKind::Number, Literal::Float(value));
    } else {
      let value: i64 = text.parse().map_err(|_| self.error("invalid number literal"))?;
      self.add_literal(TokenKind::Number, Literal::Int(value));
    }
    Ok(())
  }

  fn identifier(&mut self) -> Result<(), LexError> {
    while is_ident_part(self.peek()) {
      self.advance();
    }
    let text: String = self.chars[self.start..self.current].iter().collect();
    let kind = keyword(&text).unwrap_or(TokenKind::Ident);
    self.push(kind, &text);
    Ok(())
  }

  // ---- low-level helpers -----------------------------------------------

  fn simple(&mut self, kind: TokenKind) -> Result<(), LexError> {
    let lexeme: String = self.chars[self.start..self.current].iter().collect();
    self.push(kind, &lexeme);
    Ok(())
  }

  fn push(&mut self, kind: TokenKind, lexeme: &str) {
    let span = Span {
      start: self.offsets[self.start],
      end: self.offsets[self.current],
    };
    self.prev_kind = Some(kind);
    let mut token = Token::new(kind, lexeme, span, self.start_line, self.start_column);
    token.spaced_before = self.pending_space;
    self.pending_space = false;
    self.tokens.push(token);
  }

  fn add_literal(&mut self, kind: TokenKind, literal: Literal) {
    let lexeme: String = self.chars[self.start..self.current].iter().collect();
    let span = Span {
      start: self.offsets[self.start],
      end: self.offsets[self.current],
    };
    self.prev_kind = Some(kind);
    let mut token = Token::new(kind, lexeme, span, self.start_line, self.start_column).with_literal(literal);
    token.spaced_before = self.pending_space;
    self.pending_space = false;
    self.tokens.push(token);
  }

  fn matches(&mut self, expected: char) -> bool {
    if self.is_at_end() || self.chars[self.current] != expected {
      return false;
    }
    self.advance();
    true
  }

  fn peek(&self) -> char {
    if self.is_at_end() {
      '\0'
    } else {
      self.chars[self.current]
    }
  }

  fn peek_at(&self, offset: usize) -> char {
    self.chars.get(self.current + offset).copied().unwrap_or('\0')
  }

  fn advance(&mut self) -> char {
    let ch = self.chars[self.current];
    self.current += 1;
    if ch == '\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }
    ch
  }

  fn is_at_end(&self) -> bool {
    self.current >= self.chars.len()
  }

  fn error(&self, message: &str) -> LexError {
    LexError {
      message: message.to_string(),
      span: Span {
        start: self.offsets[self.start.min(self.chars.len())],
        end: self.offsets[self.current.min(self.chars.len())],
      },
      line: self.start_line,
      column: self.start_column,
    }
  }
}

fn is_ident_start(ch: char) -> bool {
  ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_part(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Whether the token kind preceding a `/` is one after which a primary
/// expression is expected, i.e. a regex literal rather than a division.
fn expects_operand(prev: Option<TokenKind>) -> bool {
  use TokenKind::*;
  match prev {
    None => true,
    Some(kind) => matches!(
      kind,
      LParen
        | LBracket
        | LBrace
        | Comma
        | Colon
        | Semicolon
        | Newline
        | Indent
        | At
        | Dot
        | Proto
        | DotDot
        | DotDotDot
        | Question
        | QuestionDot
        | QuestionEq
        | Eq
        | EqEq
        | Neq
        | Lt
        | Lte
        | Gt
        | Gte
        | Plus
        | Minus
        | Star
        | Slash
        | Percent
        | StarStar
        | PlusEq
        | MinusEq
        | StarEq
        | SlashEq
        | PercentEq
        | AndAnd
        | OrOr
        | AndAndEq
        | OrOrEq
        | Not
        | And
        | Or
        | Is
        | Isnt
        | Arrow
        | FatArrow
        | If
        | Unless
        | Then
        | Else
        | While
        | Until
        | For
        | In
        | Of
        | By
        | Return
        | Throw
        | Switch
        | When
        | Do
        | Yield
        | New
        | Extends
        | Catch
    ),
  }
}

/// Removes insignificant whitespace and `#`-comments from a heregex body,
/// preserving backslash escapes.
fn strip_heregex_trivia(raw: &str) -> String {
  let mut out = String::new();
  let mut chars = raw.chars().peekable();
  while let Some(ch) = chars.next() {
    match ch {
      '\\' => {
        out.push(ch);
        if let Some(next) = chars.next() {
          out.push(next);
        }
      }
      '#' => {
        for c in chars.by_ref() {
          if c == '\n' {
            break;
          }
        }
      }
      c if c.is_whitespace() => {}
      c => out.push(c),
    }
  }
  out
}

/// Dedents a block string: trims a single leading and trailing blank line,
/// then removes the minimum common leading whitespace of the remaining
/// non-blank lines.
fn dedent_block_string(text: &str) -> String {
  let mut lines: Vec<&str> = text.split('\n').collect();
  if lines.first().map(|l| l.trim().is_empty()).unwrap_or(false) {
    lines.remove(0);
  }
  if lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
    lines.pop();
  }

  let min_indent = lines
    .iter()
    .filter(|l| !l.trim().is_empty())
    .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
    .min()
    .unwrap_or(0);

  lines
    .into_iter()
    .map(|l| if l.len() >= min_indent { &l[min_indent..] } else { l.trim_start() })
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).unwrap().tokens.into_iter().map(|t| t.kind).collect()
  }

  #[test]
  fn balanced_indent_outdent() {
    let out = lex("if x\n  y\n  z\n").unwrap();
    let indents = out.tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
    let outdents = out.tokens.iter().filter(|t| t.kind == TokenKind::Outdent).count();
    assert_eq!(indents, outdents);
    assert_eq!(indents, 1);
  }

  #[test]
  fn inconsistent_indentation_is_an_error() {
    let err = lex("if x\n  y\n z\n").unwrap_err();
    assert!(err.message.contains("inconsistent indentation"));
  }

  #[test]
  fn keyword_aliases_lex_as_booleans() {
    use TokenKind::*;
    assert_eq!(kinds("yes"), vec![True, Eof]);
    assert_eq!(kinds("off"), vec![False, Eof]);
  }

  #[test]
  fn slash_after_operand_is_division() {
    assert_eq!(kinds("a / b"), vec![TokenKind::Ident, TokenKind::Slash, TokenKind::Ident, TokenKind::Eof]);
  }

  #[test]
  fn slash_after_operator_is_regex() {
    let out = lex("x = /abc/g").unwrap();
    let string_tok = out.tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
    assert_eq!(string_tok.literal, Some(Literal::Regex("abc".into(), "g".into())));
  }

  #[test]
  fn decodes_escapes() {
    let out = lex(r#""a\nb""#).unwrap();
    assert_eq!(out.tokens[0].literal, Some(Literal::Str("a\nb".into())));
  }

  #[test]
  fn dedents_block_strings() {
    let out = lex("\"\"\"\n  hello\n  world\n\"\"\"").unwrap();
    assert_eq!(out.tokens[0].literal, Some(Literal::Str("hello\nworld".into())));
  }

  #[test]
  fn splits_interpolated_string_into_parts() {
    let out = lex(r#""sum: #{a + b} done""#).unwrap();
    match &out.tokens[0].literal {
      Some(Literal::StrInterp(parts)) => {
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], StrPart::Text("sum: ".into()));
        assert_eq!(parts[1], StrPart::Expr("a + b".into()));
        assert_eq!(parts[2], StrPart::Text(" done".into()));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn single_quoted_strings_do_not_interpolate() {
    let out = lex(r#"'no #{x} here'"#).unwrap();
    assert_eq!(out.tokens[0].literal, Some(Literal::Str("no #{x} here".into())));
  }
}
