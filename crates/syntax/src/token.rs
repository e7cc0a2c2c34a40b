use span::Span;

/// The closed set of lexical token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Eof,
  Newline,
  Semicolon,
  Indent,
  Outdent,

  Ident,
  Number,
  String,

  LParen,
  RParen,
  LBracket,
  RBracket,
  LBrace,
  RBrace,

  Comma,
  Dot,
  Colon,
  At,
  Proto, // `::`
  DotDot,
  DotDotDot,

  Question,
  QuestionDot,
  QuestionEq,

  Eq,
  EqEq,
  Neq,
  Lt,
  Lte,
  Gt,
  Gte,

  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  StarStar,

  PlusPlus,
  MinusMinus,
  PlusEq,
  MinusEq,
  StarEq,
  SlashEq,
  PercentEq,

  AndAnd,
  OrOr,
  AndAndEq,
  OrOrEq,

  Not,
  And,
  Or,
  Is,
  Isnt,

  Arrow,
  FatArrow,

  True,
  False,
  Null,
  Undefined,

  If,
  Unless,
  Else,
  Then,
  While,
  Until,
  For,
  In,
  Of,
  By,
  Break,
  Continue,
  Return,
  Class,
  Extends,
  Super,
  This,
  New,
  Try,
  Catch,
  Finally,
  Throw,
  Switch,
  When,
  Do,
  Yield,
  Import,
  From,
  As,
  Get,
  Set,
}

impl TokenKind {
  pub fn is_statement_terminator(self) -> bool {
    matches!(self, TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::Outdent)
  }
}

/// A decoded literal value attached to a `NUMBER` or `STRING` token.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
  Int(i64),
  Float(f64),
  /// Decoded string text. A heregex/regex literal is carried as
  /// `Regex(pattern, flags)` instead.
  Str(String),
  /// A double-quoted string containing one or more `#{...}` interpolations.
  /// `Expr` parts hold the raw (unparsed) source text between the braces.
  StrInterp(Vec<StrPart>),
  Regex(String, String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StrPart {
  Text(String),
  Expr(String),
}

#[derive(Clone, Debug)]
pub struct Token {
  pub kind: TokenKind,
  pub lexeme: String,
  pub literal: Option<Literal>,
  pub span: Span,
  pub line: usize,
  pub column: usize,
  /// Whether this token was preceded by inline whitespace. Used by the
  /// parser to tell `f -1` (implicit call with a unary-minus argument)
  /// apart from `a - b` (subtraction) - see the implicit-call heuristic.
  pub spaced_before: bool,
}

impl Token {
  pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span, line: usize, column: usize) -> Token {
    Token {
      kind,
      lexeme: lexeme.into(),
      literal: None,
      span,
      line,
      column,
      spaced_before: false,
    }
  }

  pub fn with_literal(mut self, literal: Literal) -> Token {
    self.literal = Some(literal);
    self
  }
}

pub fn keyword(ident: &str) -> Option<TokenKind> {
  use TokenKind::*;
  Some(match ident {
    "true" | "yes" | "on" => True,
    "false" | "no" | "off" => False,
    "null" => Null,
    "undefined" => Undefined,
    "if" => If,
    "unless" => Unless,
    "else" => Else,
    "then" => Then,
    "while" => While,
    "until" => Until,
    "for" => For,
    "in" => In,
    "of" => Of,
    "by" => By,
    "break" => Break,
    "continue" => Continue,
    "return" => Return,
    "class" => Class,
    "extends" => Extends,
    "super" => Super,
    "this" => This,
    "new" => New,
    "try" => Try,
    "catch" => Catch,
    "finally" => Finally,
    "throw" => Throw,
    "switch" => Switch,
    "when" => When,
    "do" => Do,
    "yield" => Yield,
    "import" => Import,
    "from" => From,
    "as" => As,
    "and" => And,
    "or" => Or,
    "not" => Not,
    "is" => Is,
    "isnt" => Isnt,
    "get" => Get,
    "set" => Set,
    _ => return None,
  })
}
