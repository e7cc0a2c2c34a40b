use span::Span;

use crate::ast::*;
use crate::error::ParseError;
use crate::token::{Literal as TokLiteral, Token, TokenKind};

pub fn parse(tokens: Vec<Token>) -> Result<Module, ParseError> {
  Parser::new(tokens).parse_module()
}

struct Parser {
  tokens: Vec<Token>,
  current: usize,
  depth: u32,
}

/// Tokens that can start a new expression - used both by the implicit-call
/// heuristic and by the range/splat-marker disambiguation in `range_expr`.
fn is_expr_start(kind: TokenKind) -> bool {
  use TokenKind::*;
  matches!(
    kind,
    Number
      | String
      | Ident
      | True
      | False
      | Null
      | Undefined
      | LParen
      | LBracket
      | LBrace
      | Not
      | If
      | Unless
      | Arrow
      | FatArrow
      | At
      | This
      | Super
      | New
      | Do
      | Minus
      | Plus
  )
}

impl Parser {
  fn new(tokens: Vec<Token>) -> Parser {
    Parser { tokens, current: 0, depth: 0 }
  }

  fn parse_module(mut self) -> Result<Module, ParseError> {
    let mut statements = Vec::new();
    self.consume_statement_breaks();
    while !self.is_at_end() {
      statements.push(self.statement()?);
      self.consume_statement_breaks();
    }
    Ok(Module { statements })
  }

  // ---- recursion guard -----------------------------------------------------

  fn with_depth_guard<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
    self.depth += 1;
    if self.depth > 512 {
      let tok = self.peek().clone();
      self.depth -= 1;
      return Err(self.error_at(&tok, "expression nested too deeply"));
    }
    #[cfg(feature = "check-recursion-limit")]
    let result = stacker::maybe_grow(32 * 1024, 1024 * 1024, || f(self));
    #[cfg(not(feature = "check-recursion-limit"))]
    let result = f(self);
    self.depth -= 1;
    result
  }

  // ---- statements -----------------------------------------------------------

  fn statement(&mut self) -> Result<Stmt, ParseError> {
    self.with_depth_guard(|p| p.statement_inner())
  }

  fn statement_inner(&mut self) -> Result<Stmt, ParseError> {
    let start = self.peek().span;

    if self.match_(TokenKind::Import) {
      return self.import_statement(start);
    }
    if self.match_(TokenKind::From) {
      return self.from_import_statement(start);
    }
    if self.match_(TokenKind::Return) {
      if self.check_any(&[TokenKind::Newline, TokenKind::Semicolon, TokenKind::Outdent, TokenKind::Eof]) {
        return Ok(Stmt::new(start, StmtKind::Return(None)));
      }
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Stmt::new(span, StmtKind::Return(Some(value))));
    }
    if self.match_(TokenKind::Break) {
      return Ok(Stmt::new(start, StmtKind::Break));
    }
    if self.match_(TokenKind::Continue) {
      return Ok(Stmt::new(start, StmtKind::Continue));
    }
    if self.match_(TokenKind::Throw) {
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Stmt::new(span, StmtKind::Throw(value)));
    }
    if self.match_(TokenKind::While) || self.match_(TokenKind::Until) {
      let is_until = self.previous().kind == TokenKind::Until;
      let mut cond = self.logical_or()?;
      if is_until {
        cond = Expr::new(cond.span, ExprKind::Unary(UnaryOp::Not, Box::new(cond)));
      }
      let body = self.parse_clause_body()?;
      let span = start.join(body.span);
      return Ok(Stmt::new(span, StmtKind::While { cond, body }));
    }
    if self.match_(TokenKind::For) {
      return self.for_statement(start);
    }
    if self.match_(TokenKind::Try) {
      return self.try_statement(start);
    }
    if self.match_(TokenKind::Class) {
      return self.class_decl(start);
    }

    if let Some(stmt) = self.maybe_assignment_or_update_statement(start)? {
      return Ok(stmt);
    }

    let expr = self.expression()?;
    let span = expr.span;
    Ok(Stmt::new(span, StmtKind::ExprStmt(expr)))
  }

  fn import_statement(&mut self, start: Span) -> Result<Stmt, ParseError> {
    if self.match_(TokenKind::Star) {
      self.consume_keyword_word("from")?;
      let module = self.module_path()?;
      let alias = if self.match_(TokenKind::As) { Some(self.consume_ident("expected alias name")?) } else { None };
      return Ok(Stmt::new(start, StmtKind::ImportAll { module, alias }));
    }

    let mut items = vec![self.import_item()?];
    while self.match_(TokenKind::Comma) {
      items.push(self.import_item()?);
    }
    Ok(Stmt::new(start, StmtKind::Import(items)))
  }

  fn import_item(&mut self) -> Result<ImportItem, ParseError> {
    let module = self.module_path()?;
    let alias = if self.match_(TokenKind::As) { Some(self.consume_ident("expected identifier after 'as'")?) } else { None };
    Ok(ImportItem { module, alias })
  }

  fn from_import_statement(&mut self, start: Span) -> Result<Stmt, ParseError> {
    let module = self.module_path()?;
    self.consume(TokenKind::Import, "expected 'import' in from-import statement")?;

    let mut names = vec![self.import_name()?];
    while self.match_(TokenKind::Comma) {
      names.push(self.import_name()?);
    }
    Ok(Stmt::new(start, StmtKind::FromImport { module, names }))
  }

  fn import_name(&mut self) -> Result<ImportName, ParseError> {
    let name = self.consume_ident("expected imported name")?;
    let alias = if self.match_(TokenKind::As) { Some(self.consume_ident("expected alias name after 'as'")?) } else { None };
    Ok(ImportName { name, alias })
  }

  fn module_path(&mut self) -> Result<String, ParseError> {
    let mut module = self.consume_ident("expected module path")?;
    while self.match_(TokenKind::Dot) {
      let part = self.consume_ident("expected module segment after '.'")?;
      module.push('.');
      module.push_str(&part);
    }
    Ok(module)
  }

  fn for_statement(&mut self, start: Span) -> Result<Stmt, ParseError> {
    let first = self.consume_ident("expected loop variable")?;
    if self.match_(TokenKind::Of) {
      let iter = self.logical_or()?;
      let body = self.parse_clause_body()?;
      let span = start.join(body.span);
      return Ok(Stmt::new(span, StmtKind::ForOf { key_var: first, value_var: None, iter, body }));
    }
    if self.match_(TokenKind::Comma) {
      let value_var = self.consume_ident("expected value variable after ','")?;
      self.consume(TokenKind::Of, "expected 'of' in for-of loop")?;
      let iter = self.logical_or()?;
      let body = self.parse_clause_body()?;
      let span = start.join(body.span);
      return Ok(Stmt::new(span, StmtKind::ForOf { key_var: first, value_var: Some(value_var), iter, body }));
    }
    self.consume(TokenKind::In, "expected 'in' or 'of' in for loop")?;
    let iter = self.logical_or()?;
    let body = self.parse_clause_body()?;
    let span = start.join(body.span);
    Ok(Stmt::new(span, StmtKind::ForIn { var: first, iter, body }))
  }

  fn try_statement(&mut self, start: Span) -> Result<Stmt, ParseError> {
    let try_body = self.parse_clause_body()?;
    let mut catch_var = None;
    let mut catch_body = None;
    let mut finally_body = None;

    if self.match_(TokenKind::Catch) {
      if let Some(name) = self.match_ident() {
        catch_var = Some(name);
      }
      catch_body = Some(self.parse_clause_body()?);
    }
    if self.match_(TokenKind::Finally) {
      finally_body = Some(self.parse_clause_body()?);
    }

    let span = start;
    Ok(Stmt::new(span, StmtKind::Try { try_body, catch_var, catch_body, finally_body }))
  }

  fn class_decl(&mut self, start: Span) -> Result<Stmt, ParseError> {
    let name = self.consume_ident("expected class name")?;
    let parent = if self.match_(TokenKind::Extends) { Some(self.call_chain()?) } else { None };

    self.consume_statement_breaks();
    self.consume(TokenKind::Indent, "expected indented class body")?;

    let mut members = Vec::new();
    loop {
      self.consume_statement_breaks();
      if self.check(TokenKind::Outdent) || self.is_at_end() {
        break;
      }

      if self.match_(TokenKind::Get) {
        let mname = self.consume_ident("expected getter name")?;
        let body = self.parse_clause_body()?;
        members.push(ClassMember::Getter(mname, body));
      } else if self.match_(TokenKind::Set) {
        let mname = self.consume_ident("expected setter name")?;
        self.consume(TokenKind::LParen, "expected '(' after setter name")?;
        let param = self.consume_ident("expected setter parameter")?;
        self.consume(TokenKind::RParen, "expected ')' after setter parameter")?;
        let body = self.parse_clause_body()?;
        members.push(ClassMember::Setter(mname, param, body));
      } else {
        let mname = self.object_key()?;
        self.consume(TokenKind::Colon, "expected ':' after class member name")?;
        let value = self.expression()?;
        members.push(ClassMember::Field(mname, value));
      }

      self.consume_statement_breaks();
    }
    self.consume(TokenKind::Outdent, "expected end of class body")?;

    Ok(Stmt::new(start, StmtKind::ClassDecl { name, parent, members }))
  }

  // ---- assignment targets ---------------------------------------------------

  fn maybe_assignment_or_update_statement(&mut self, start: Span) -> Result<Option<Stmt>, ParseError> {
    let checkpoint = self.current;

    if self.match_(TokenKind::PlusPlus) || self.match_(TokenKind::MinusMinus) {
      let op = if self.previous().kind == TokenKind::PlusPlus { UpdateOp::Inc } else { UpdateOp::Dec };
      if let Some(target) = self.try_parse_plain_assign_target()? {
        return Ok(Some(Stmt::new(start, StmtKind::Update { target, op, prefix: true })));
      }
      self.current = checkpoint;
      return Ok(None);
    }

    if let Some(target) = self.try_parse_destructure_target()? {
      if !self.match_(TokenKind::Eq) {
        self.current = checkpoint;
        return Ok(None);
      }
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Some(Stmt::new(span, StmtKind::Assign { target, value })));
    }

    let target = match self.try_parse_plain_assign_target()? {
      Some(t) => t,
      None => {
        self.current = checkpoint;
        return Ok(None);
      }
    };

    if self.check(TokenKind::Comma) {
      let multi_checkpoint = self.current;
      let mut targets = vec![target];
      let mut ok = true;
      while self.match_(TokenKind::Comma) {
        match self.try_parse_plain_assign_target()? {
          Some(t) => targets.push(t),
          None => match self.try_parse_destructure_target()? {
            Some(t) => targets.push(t),
            None => {
              ok = false;
              break;
            }
          },
        }
      }
      if ok && self.match_(TokenKind::Eq) {
        let value = self.expression()?;
        let span = start.join(value.span);
        return Ok(Some(Stmt::new(span, StmtKind::MultiAssign { targets, value })));
      }
      self.current = multi_checkpoint;
    }

    if self.match_(TokenKind::Eq) {
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Some(Stmt::new(span, StmtKind::Assign { target, value })));
    }
    if let Some(op) = self.match_aug_assign_op() {
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Some(Stmt::new(span, StmtKind::AugAssign { target, op, value })));
    }
    if self.match_(TokenKind::QuestionEq) {
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Some(Stmt::new(span, StmtKind::ExistentialAssign { target, value })));
    }
    if self.match_(TokenKind::OrOrEq) {
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Some(Stmt::new(span, StmtKind::LogicalAssign { target, op: LogicalAssignOp::Or, value })));
    }
    if self.match_(TokenKind::AndAndEq) {
      let value = self.expression()?;
      let span = start.join(value.span);
      return Ok(Some(Stmt::new(span, StmtKind::LogicalAssign { target, op: LogicalAssignOp::And, value })));
    }
    if self.match_(TokenKind::PlusPlus) || self.match_(TokenKind::MinusMinus) {
      let op = if self.previous().kind == TokenKind::PlusPlus { UpdateOp::Inc } else { UpdateOp::Dec };
      return Ok(Some(Stmt::new(start, StmtKind::Update { target, op, prefix: false })));
    }

    self.current = checkpoint;
    Ok(None)
  }

  fn match_aug_assign_op(&mut self) -> Option<AugAssignOp> {
    let op = match self.peek().kind {
      TokenKind::PlusEq => AugAssignOp::Add,
      TokenKind::MinusEq => AugAssignOp::Sub,
      TokenKind::StarEq => AugAssignOp::Mul,
      TokenKind::SlashEq => AugAssignOp::Div,
      TokenKind::PercentEq => AugAssignOp::Mod,
      _ => return None,
    };
    self.advance();
    Some(op)
  }

  fn try_parse_plain_assign_target(&mut self) -> Result<Option<Expr>, ParseError> {
    let span = self.peek().span;
    let mut target = if self.match_(TokenKind::At) {
      let name = match self.match_ident() {
        Some(n) => n,
        None => return Ok(None),
      };
      Expr::new(span, ExprKind::GetAttr { target: Box::new(Expr::new(span, ExprKind::This)), name })
    } else if self.match_(TokenKind::This) {
      Expr::new(span, ExprKind::This)
    } else if let Some(name) = self.match_ident() {
      Expr::new(span, ExprKind::Identifier(name))
    } else {
      return Ok(None);
    };

    loop {
      if self.match_(TokenKind::Dot) {
        let name = match self.match_ident() {
          Some(n) => n,
          None => return Ok(None),
        };
        let span = target.span.join(self.previous().span);
        target = Expr::new(span, ExprKind::GetAttr { target: Box::new(target), name });
        continue;
      }
      if self.match_(TokenKind::LBracket) {
        let index = self.expression()?;
        self.consume(TokenKind::RBracket, "expected ']' after index expression")?;
        let span = target.span.join(self.previous().span);
        target = Expr::new(span, ExprKind::Index { target: Box::new(target), index: Box::new(index) });
        continue;
      }
      break;
    }

    Ok(Some(target))
  }

  fn try_parse_destructure_target(&mut self) -> Result<Option<Expr>, ParseError> {
    let checkpoint = self.current;
    if self.check(TokenKind::LBracket) {
      match self.try_parse_array_pattern()? {
        Some(e) => return Ok(Some(e)),
        None => self.current = checkpoint,
      }
    } else if self.check(TokenKind::LBrace) {
      match self.try_parse_object_pattern()? {
        Some(e) => return Ok(Some(e)),
        None => self.current = checkpoint,
      }
    }
    Ok(None)
  }

  fn try_parse_array_pattern(&mut self) -> Result<Option<Expr>, ParseError> {
    let start = self.peek().span;
    self.advance(); // '['
    let mut elems = Vec::new();
    let mut splat_index: isize = -1;

    if !self.check(TokenKind::RBracket) {
      loop {
        let elem_span = self.peek().span;
        let elem = if self.check(TokenKind::LBracket) {
          match self.try_parse_array_pattern()? {
            Some(e) => e,
            None => return Ok(None),
          }
        } else if self.check(TokenKind::LBrace) {
          match self.try_parse_object_pattern()? {
            Some(e) => e,
            None => return Ok(None),
          }
        } else {
          match self.match_ident() {
            Some(name) => Expr::new(elem_span, ExprKind::Identifier(name)),
            None => return Ok(None),
          }
        };

        if self.match_(TokenKind::DotDotDot) {
          if splat_index != -1 {
            return Err(self.error_here("array pattern can have at most one splat"));
          }
          splat_index = elems.len() as isize;
        }
        elems.push(elem);

        if !self.match_(TokenKind::Comma) {
          break;
        }
      }
    }

    if !self.match_(TokenKind::RBracket) {
      return Ok(None);
    }
    let span = start.join(self.previous().span);
    Ok(Some(Expr::new(span, ExprKind::ArrayDestructure { elems, splat_index })))
  }

  fn try_parse_object_pattern(&mut self) -> Result<Option<Expr>, ParseError> {
    let start = self.peek().span;
    self.advance(); // '{'
    let mut props = Vec::new();

    if !self.check(TokenKind::RBrace) {
      loop {
        let key = match self.match_ident() {
          Some(k) => k,
          None => return Ok(None),
        };
        let alias = if self.match_(TokenKind::Colon) {
          match self.match_ident() {
            Some(a) => Some(a),
            None => return Ok(None),
          }
        } else {
          None
        };
        let default = if self.match_(TokenKind::Eq) { Some(self.if_expr()?) } else { None };
        props.push(ObjectPatternProp { key, alias, default });

        if !self.match_(TokenKind::Comma) {
          break;
        }
      }
    }

    if !self.match_(TokenKind::RBrace) {
      return Ok(None);
    }
    let span = start.join(self.previous().span);
    Ok(Some(Expr::new(span, ExprKind::ObjectDestructure(props))))
  }

  // ---- shared clause-body / block parsing -----------------------------------

  fn parse_clause_body(&mut self) -> Result<Expr, ParseError> {
    if self.match_(TokenKind::Then) {
      return self.if_expr();
    }
    if self.match_(TokenKind::Newline) {
      self.consume_statement_breaks();
      if self.match_(TokenKind::Indent) {
        return self.parse_indented_block();
      }
      return Err(self.error_here("expected indented block"));
    }
    self.if_expr()
  }

  fn parse_indented_block(&mut self) -> Result<Expr, ParseError> {
    let start = self.previous().span;
    let mut statements = Vec::new();
    self.consume_statement_breaks();
    while !self.check(TokenKind::Outdent) && !self.is_at_end() {
      statements.push(self.statement()?);
      self.consume_statement_breaks();
    }
    self.consume(TokenKind::Outdent, "expected end of indented block")?;
    let span = start.join(self.previous().span);
    Ok(Expr::new(span, ExprKind::Block(statements)))
  }

  fn match_else_marker(&mut self) -> bool {
    if self.match_(TokenKind::Else) {
      return true;
    }
    let checkpoint = self.current;
    if self.match_(TokenKind::Newline) {
      self.consume_statement_breaks();
      if self.match_(TokenKind::Else) {
        return true;
      }
    }
    self.current = checkpoint;
    false
  }

  fn consume_statement_breaks(&mut self) {
    while self.match_(TokenKind::Newline) || self.match_(TokenKind::Semicolon) {}
  }

  // ---- expressions -----------------------------------------------------------

  fn expression(&mut self) -> Result<Expr, ParseError> {
    self.with_depth_guard(|p| {
      if p.check(TokenKind::Switch) {
        return p.switch_expr();
      }
      p.if_expr()
    })
  }

  fn if_expr(&mut self) -> Result<Expr, ParseError> {
    if self.check(TokenKind::If) || self.check(TokenKind::Unless) {
      let start = self.peek().span;
      let is_unless = self.peek().kind == TokenKind::Unless;
      self.advance();
      let mut cond = self.logical_or()?;
      if is_unless {
        cond = Expr::new(cond.span, ExprKind::Unary(UnaryOp::Not, Box::new(cond)));
      }
      let then_branch = self.parse_clause_body()?;
      let else_branch = if self.match_else_marker() {
        self.parse_clause_body()?
      } else {
        Expr::new(then_branch.span, ExprKind::Literal(Literal::Null))
      };
      let span = start.join(else_branch.span);
      return Ok(Expr::new(
        span,
        ExprKind::If { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: Box::new(else_branch) },
      ));
    }

    let expr = self.logical_or()?;
    if self.can_take_postfix_if() {
      let is_unless = self.peek().kind == TokenKind::Unless;
      self.advance();
      let mut cond = self.logical_or()?;
      if is_unless {
        cond = Expr::new(cond.span, ExprKind::Unary(UnaryOp::Not, Box::new(cond)));
      }
      let span = expr.span.join(cond.span);
      let null = Expr::new(span, ExprKind::Literal(Literal::Null));
      return Ok(Expr::new(span, ExprKind::If { cond: Box::new(cond), then_branch: Box::new(expr), else_branch: Box::new(null) }));
    }
    Ok(expr)
  }

  fn can_take_postfix_if(&self) -> bool {
    if !self.check(TokenKind::If) && !self.check(TokenKind::Unless) {
      return false;
    }
    self.peek().column > 1
  }

  fn switch_expr(&mut self) -> Result<Expr, ParseError> {
    let start = self.peek().span;
    self.advance(); // 'switch'
    let subject = if self.check(TokenKind::Newline) { None } else { Some(Box::new(self.logical_or()?)) };
    self.match_(TokenKind::Newline);
    self.consume_statement_breaks();
    self.consume(TokenKind::Indent, "expected indented switch body")?;

    let mut cases = Vec::new();
    let mut default = None;
    loop {
      self.consume_statement_breaks();
      if self.match_(TokenKind::When) {
        let mut conds = vec![self.if_expr()?];
        while self.match_(TokenKind::Comma) {
          conds.push(self.if_expr()?);
        }
        let body = self.parse_clause_body()?;
        cases.push((conds, body));
        continue;
      }
      if self.match_(TokenKind::Else) {
        default = Some(Box::new(self.parse_clause_body()?));
        continue;
      }
      break;
    }
    self.consume(TokenKind::Outdent, "expected end of switch body")?;
    let span = start.join(self.previous().span);
    Ok(Expr::new(span, ExprKind::Switch { subject, cases, default }))
  }

  fn logical_or(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.existential()?;
    while self.match_(TokenKind::Or) || self.match_(TokenKind::OrOr) {
      let right = self.existential()?;
      let span = expr.span.join(right.span);
      expr = Expr::new(span, ExprKind::Binary(Box::new(expr), BinOp::Or, Box::new(right)));
    }
    Ok(expr)
  }

  fn existential(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.logical_and()?;
    while self.match_(TokenKind::Question) {
      let right = self.logical_and()?;
      let span = expr.span.join(right.span);
      expr = Expr::new(span, ExprKind::Existential { left: Box::new(expr), right: Box::new(right) });
    }
    Ok(expr)
  }

  fn logical_and(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.equality()?;
    while self.match_(TokenKind::And) || self.match_(TokenKind::AndAnd) {
      let right = self.equality()?;
      let span = expr.span.join(right.span);
      expr = Expr::new(span, ExprKind::Binary(Box::new(expr), BinOp::And, Box::new(right)));
    }
    Ok(expr)
  }

  fn equality(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.comparison_chain()?;
    loop {
      let op = if self.match_(TokenKind::EqEq) {
        BinOp::Eq
      } else if self.match_(TokenKind::Neq) {
        BinOp::Neq
      } else if self.match_(TokenKind::Is) {
        if self.match_(TokenKind::Not) { BinOp::Neq } else { BinOp::Eq }
      } else if self.match_(TokenKind::Isnt) {
        BinOp::Neq
      } else {
        break;
      };
      let right = self.comparison_chain()?;
      let span = expr.span.join(right.span);
      expr = Expr::new(span, ExprKind::Binary(Box::new(expr), op, Box::new(right)));
    }
    Ok(expr)
  }

  fn comparison_chain(&mut self) -> Result<Expr, ParseError> {
    let first = self.range_expr()?;
    let mut operands = vec![first];
    let mut ops = Vec::new();

    loop {
      let op = match self.peek().kind {
        TokenKind::Lt => CmpOp::Lt,
        TokenKind::Lte => CmpOp::Lte,
        TokenKind::Gt => CmpOp::Gt,
        TokenKind::Gte => CmpOp::Gte,
        _ => break,
      };
      self.advance();
      ops.push(op);
      operands.push(self.range_expr()?);
    }

    match ops.len() {
      0 => Ok(operands.pop().unwrap()),
      1 => {
        let right = operands.pop().unwrap();
        let left = operands.pop().unwrap();
        let span = left.span.join(right.span);
        Ok(Expr::new(span, ExprKind::Binary(Box::new(left), cmp_to_bin(ops[0]), Box::new(right))))
      }
      _ => {
        let span = operands[0].span.join(operands[operands.len() - 1].span);
        Ok(Expr::new(span, ExprKind::ChainedComparison { operands, ops }))
      }
    }
  }

  fn range_expr(&mut self) -> Result<Expr, ParseError> {
    let start = self.additive()?;

    if self.check(TokenKind::DotDot) {
      self.advance();
      let end = self.additive()?;
      let step = if self.match_(TokenKind::By) { Some(Box::new(self.additive()?)) } else { None };
      let span = start.span.join(end.span);
      return Ok(Expr::new(span, ExprKind::RangeLit { start: Box::new(start), end: Box::new(end), exclusive: false, step }));
    }

    if self.check(TokenKind::DotDotDot) && is_expr_start(self.peek_at(1).kind) {
      self.advance();
      let end = self.additive()?;
      let step = if self.match_(TokenKind::By) { Some(Box::new(self.additive()?)) } else { None };
      let span = start.span.join(end.span);
      return Ok(Expr::new(span, ExprKind::RangeLit { start: Box::new(start), end: Box::new(end), exclusive: true, step }));
    }

    Ok(start)
  }

  fn additive(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.multiplicative()?;
    loop {
      let op = if self.match_(TokenKind::Plus) {
        BinOp::Add
      } else if self.match_(TokenKind::Minus) {
        BinOp::Sub
      } else {
        break;
      };
      let right = self.multiplicative()?;
      let span = expr.span.join(right.span);
      expr = Expr::new(span, ExprKind::Binary(Box::new(expr), op, Box::new(right)));
    }
    Ok(expr)
  }

  fn multiplicative(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.power()?;
    loop {
      let op = if self.match_(TokenKind::Star) {
        BinOp::Mul
      } else if self.match_(TokenKind::Slash) {
        BinOp::Div
      } else if self.match_(TokenKind::Percent) {
        BinOp::Mod
      } else {
        break;
      };
      let right = self.power()?;
      let span = expr.span.join(right.span);
      expr = Expr::new(span, ExprKind::Binary(Box::new(expr), op, Box::new(right)));
    }
    Ok(expr)
  }

  fn power(&mut self) -> Result<Expr, ParseError> {
    let expr = self.unary()?;
    if self.match_(TokenKind::StarStar) {
      // right-associative: recurse into `power`, not a loop
      let right = self.power()?;
      let span = expr.span.join(right.span);
      return Ok(Expr::new(span, ExprKind::Binary(Box::new(expr), BinOp::Pow, Box::new(right))));
    }
    Ok(expr)
  }

  fn unary(&mut self) -> Result<Expr, ParseError> {
    let start = self.peek().span;
    let op = if self.match_(TokenKind::Not) {
      UnaryOp::Not
    } else if self.match_(TokenKind::Minus) {
      UnaryOp::Neg
    } else if self.match_(TokenKind::Plus) {
      UnaryOp::Pos
    } else {
      return self.call_chain();
    };
    let right = self.unary()?;
    let span = start.join(right.span);
    Ok(Expr::new(span, ExprKind::Unary(op, Box::new(right))))
  }

  fn call_chain(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.primary()?;

    loop {
      if self.match_(TokenKind::Dot) {
        let name = self.consume_ident("expected property name after '.'")?;
        let span = expr.span.join(self.previous().span);
        expr = Expr::new(span, ExprKind::GetAttr { target: Box::new(expr), name });
        continue;
      }
      if self.match_(TokenKind::QuestionDot) {
        let name = self.consume_ident("expected property name after '?.'")?;
        let span = expr.span.join(self.previous().span);
        expr = Expr::new(span, ExprKind::SafeAccess { target: Box::new(expr), name });
        continue;
      }
      if self.match_(TokenKind::Proto) {
        let name = self.consume_ident("expected member name after '::'")?;
        let span = expr.span.join(self.previous().span);
        expr = Expr::new(span, ExprKind::ProtoAccess { target: Some(Box::new(expr)), name });
        continue;
      }
      if self.match_(TokenKind::LBracket) {
        expr = self.index_or_slice(expr)?;
        continue;
      }
      if self.match_(TokenKind::LParen) {
        let (args, kwargs) = self.argument_list()?;
        let span = expr.span.join(self.previous().span);
        expr = Expr::new(span, ExprKind::Call { callee: Box::new(expr), args, kwargs, implicit: false });
        continue;
      }
      if self.can_parse_implicit_call(&expr) {
        let mut args = vec![self.maybe_wrap_splat(self.if_expr()?)?];
        while self.match_(TokenKind::Comma) {
          args.push(self.maybe_wrap_splat(self.if_expr()?)?);
        }
        let span = expr.span.join(args[args.len() - 1].span);
        expr = Expr::new(span, ExprKind::Call { callee: Box::new(expr), args, kwargs: Vec::new(), implicit: true });
        continue;
      }
      break;
    }

    Ok(expr)
  }

  fn index_or_slice(&mut self, target: Expr) -> Result<Expr, ParseError> {
    let start = target.span;

    if self.check(TokenKind::DotDot) || self.check(TokenKind::DotDotDot) {
      let exclusive = self.check(TokenKind::DotDotDot);
      self.advance();
      let end = if self.check(TokenKind::RBracket) { None } else { Some(Box::new(self.additive()?)) };
      self.consume(TokenKind::RBracket, "expected ']' after slice")?;
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::Slice { target: Box::new(target), start: None, end, exclusive }));
    }

    let first = self.additive()?;
    if self.check(TokenKind::DotDot) || self.check(TokenKind::DotDotDot) {
      let exclusive = self.check(TokenKind::DotDotDot);
      self.advance();
      let end = if self.check(TokenKind::RBracket) { None } else { Some(Box::new(self.additive()?)) };
      self.consume(TokenKind::RBracket, "expected ']' after slice")?;
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::Slice { target: Box::new(target), start: Some(Box::new(first)), end, exclusive }));
    }

    self.consume(TokenKind::RBracket, "expected ']' after index expression")?;
    let span = start.join(self.previous().span);
    Ok(Expr::new(span, ExprKind::Index { target: Box::new(target), index: Box::new(first) }))
  }

  fn argument_list(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ParseError> {
    let mut args = Vec::new();
    let mut kwargs = Vec::new();

    if self.match_(TokenKind::RParen) {
      return Ok((args, kwargs));
    }

    let mut seen_kwargs = false;
    loop {
      if self.check(TokenKind::Ident) && self.check_next(TokenKind::Eq) {
        let name = self.consume_ident("expected keyword argument name")?;
        self.advance(); // '='
        let value = self.if_expr()?;
        seen_kwargs = true;
        kwargs.push((name, value));
      } else {
        let value = self.maybe_wrap_splat(self.if_expr()?)?;
        if seen_kwargs {
          return Err(self.error_here("positional argument after keyword argument"));
        }
        args.push(value);
      }
      if !self.match_(TokenKind::Comma) {
        break;
      }
    }

    self.consume(TokenKind::RParen, "expected ')' after arguments")?;
    Ok((args, kwargs))
  }

  /// If the current token is a trailing `...` that `range_expr` left
  /// unconsumed (because nothing expression-like follows it), treat it as a
  /// call-site spread and wrap `expr` in `Splat`.
  fn maybe_wrap_splat(&mut self, expr: Expr) -> Result<Expr, ParseError> {
    if self.check(TokenKind::DotDotDot) {
      self.advance();
      let span = expr.span.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::Splat(Box::new(expr))));
    }
    Ok(expr)
  }

  fn can_parse_implicit_call(&self, expr: &Expr) -> bool {
    let is_callable_primary = matches!(
      expr.kind,
      ExprKind::Identifier(_) | ExprKind::GetAttr { .. } | ExprKind::Index { .. } | ExprKind::Call { .. }
    );
    if !is_callable_primary {
      return false;
    }

    let next = self.peek();
    match next.kind {
      TokenKind::Minus | TokenKind::Plus => next.spaced_before && !self.peek_at(1).spaced_before,
      kind => is_expr_start(kind) && !matches!(kind, TokenKind::Minus | TokenKind::Plus),
    }
  }

  fn primary(&mut self) -> Result<Expr, ParseError> {
    let start = self.peek().span;

    if self.check(TokenKind::Ident) && self.check_next(TokenKind::Arrow) {
      let name = self.consume_ident("expected parameter name")?;
      self.advance(); // '->'
      let body = self.parse_function_body()?;
      let span = start.join(body.span);
      let params = vec![Param { name, this_param: false, splat: false, default: None }];
      return Ok(Expr::new(span, ExprKind::FunctionLit { params, body: Box::new(body), bound: false }));
    }

    if self.match_(TokenKind::Arrow) {
      let body = self.parse_function_body()?;
      let span = start.join(body.span);
      return Ok(Expr::new(span, ExprKind::FunctionLit { params: Vec::new(), body: Box::new(body), bound: false }));
    }
    if self.match_(TokenKind::FatArrow) {
      let body = self.parse_function_body()?;
      let span = start.join(body.span);
      return Ok(Expr::new(span, ExprKind::FunctionLit { params: Vec::new(), body: Box::new(body), bound: true }));
    }

    if self.match_(TokenKind::Number) {
      return Ok(Expr::new(start, ExprKind::Literal(literal_from_token(self.previous()))));
    }
    if self.match_(TokenKind::String) {
      let tok = self.previous().clone();
      if let Some(TokLiteral::StrInterp(parts)) = &tok.literal {
        let mut pieces = Vec::new();
        for part in parts {
          match part {
            crate::token::StrPart::Text(s) => pieces.push(Expr::new(start, ExprKind::Literal(Literal::Str(s.clone())))),
            crate::token::StrPart::Expr(src) => pieces.push(parse_embedded_expr(src, start)?),
          }
        }
        return Ok(Expr::new(start, ExprKind::InterpolatedString(pieces)));
      }
      return Ok(Expr::new(start, ExprKind::Literal(literal_from_token(&tok))));
    }
    if self.match_(TokenKind::True) {
      return Ok(Expr::new(start, ExprKind::Literal(Literal::Bool(true))));
    }
    if self.match_(TokenKind::False) {
      return Ok(Expr::new(start, ExprKind::Literal(Literal::Bool(false))));
    }
    if self.match_(TokenKind::Null) {
      return Ok(Expr::new(start, ExprKind::Literal(Literal::Null)));
    }
    if self.match_(TokenKind::Undefined) {
      return Ok(Expr::new(start, ExprKind::Literal(Literal::Undefined)));
    }
    if self.match_(TokenKind::This) {
      return Ok(Expr::new(start, ExprKind::This));
    }
    if self.match_(TokenKind::Super) {
      return Ok(Expr::new(start, ExprKind::Super));
    }
    if self.match_(TokenKind::At) {
      let name = self.consume_ident("expected property name after '@'")?;
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::GetAttr { target: Box::new(Expr::new(start, ExprKind::This)), name }));
    }
    if self.match_(TokenKind::Proto) {
      let name = self.consume_ident("expected member name after '::'")?;
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::ProtoAccess { target: None, name }));
    }
    if self.match_(TokenKind::New) {
      let class_expr = self.call_chain_no_call()?;
      let (args, kwargs) = if self.match_(TokenKind::LParen) { self.argument_list()? } else { (Vec::new(), Vec::new()) };
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::New { class_expr: Box::new(class_expr), args, kwargs }));
    }
    if self.match_(TokenKind::Do) {
      let body = self.if_expr()?;
      let span = start.join(body.span);
      return Ok(Expr::new(span, ExprKind::Do(Box::new(body))));
    }
    if self.match_(TokenKind::Yield) {
      if self.check_any(&[TokenKind::Newline, TokenKind::Semicolon, TokenKind::Outdent, TokenKind::Eof, TokenKind::RParen, TokenKind::RBracket, TokenKind::RBrace, TokenKind::Comma]) {
        return Ok(Expr::new(start, ExprKind::Yield(None)));
      }
      let value = self.if_expr()?;
      let span = start.join(value.span);
      return Ok(Expr::new(span, ExprKind::Yield(Some(Box::new(value)))));
    }
    if self.match_(TokenKind::Ident) {
      let name = self.previous().lexeme.clone();
      let expr = Expr::new(start, ExprKind::Identifier(name));
      return self.maybe_in_of(expr);
    }
    if self.match_(TokenKind::LBracket) {
      return self.array_literal(start);
    }
    if self.match_(TokenKind::LBrace) {
      return self.object_literal(start);
    }
    if self.match_(TokenKind::LParen) {
      let checkpoint = self.current;
      if let Some(fn_lit) = self.try_parse_parenthesized_function_literal(start)? {
        return Ok(fn_lit);
      }
      self.current = checkpoint;
      let expr = self.expression()?;
      self.consume(TokenKind::RParen, "expected ')' after expression")?;
      return Ok(expr);
    }

    let tok = self.peek().clone();
    Err(self.error_at(&tok, "expected expression"))
  }

  /// `in`/`of` containment tests bind at primary level in this grammar
  /// (`x in xs`, `k of obj`) - parsed right after the leading identifier or
  /// any other primary so `in`/`of` never get swallowed by `for`.
  fn maybe_in_of(&mut self, expr: Expr) -> Result<Expr, ParseError> {
    if self.match_(TokenKind::In) {
      let container = self.range_expr()?;
      let span = expr.span.join(container.span);
      return Ok(Expr::new(span, ExprKind::In { value: Box::new(expr), container: Box::new(container) }));
    }
    if self.match_(TokenKind::Of) {
      let container = self.range_expr()?;
      let span = expr.span.join(container.span);
      return Ok(Expr::new(span, ExprKind::Of { key: Box::new(expr), container: Box::new(container) }));
    }
    Ok(expr)
  }

  /// Parses a primary/call-chain without consuming an explicit-paren call,
  /// used for `new Foo(...)`/`new a.b.C(...)` so the constructor args are
  /// consumed by `new`'s own argument-list parsing.
  fn call_chain_no_call(&mut self) -> Result<Expr, ParseError> {
    let mut expr = self.primary()?;
    loop {
      if self.match_(TokenKind::Dot) {
        let name = self.consume_ident("expected property name after '.'")?;
        let span = expr.span.join(self.previous().span);
        expr = Expr::new(span, ExprKind::GetAttr { target: Box::new(expr), name });
        continue;
      }
      break;
    }
    Ok(expr)
  }

  fn parse_function_body(&mut self) -> Result<Expr, ParseError> {
    if self.match_(TokenKind::Newline) {
      self.consume_statement_breaks();
      self.consume(TokenKind::Indent, "expected indented function body")?;
      return self.parse_indented_block();
    }
    self.if_expr()
  }

  fn try_parse_parenthesized_function_literal(&mut self, start: Span) -> Result<Option<Expr>, ParseError> {
    let mut params = Vec::new();

    if self.match_(TokenKind::RParen) {
      // fallthrough to arrow check below with zero params
    } else {
      loop {
        let this_param = self.match_(TokenKind::At);
        let name = match self.match_ident() {
          Some(n) => n,
          None => return Ok(None),
        };
        let splat = self.match_(TokenKind::DotDotDot);
        let default = if !splat && self.match_(TokenKind::Eq) { Some(self.if_expr()?) } else { None };
        params.push(Param { name, this_param, splat, default });
        if !self.match_(TokenKind::Comma) {
          break;
        }
      }
      if !self.match_(TokenKind::RParen) {
        return Ok(None);
      }
    }

    let bound = if self.match_(TokenKind::FatArrow) {
      true
    } else if self.match_(TokenKind::Arrow) {
      false
    } else {
      return Ok(None);
    };

    let body = self.parse_function_body()?;
    let span = start.join(body.span);
    Ok(Some(Expr::new(span, ExprKind::FunctionLit { params, body: Box::new(body), bound })))
  }

  fn array_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
    if self.match_(TokenKind::RBracket) {
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::ArrayLit(Vec::new())));
    }

    let first = self.maybe_wrap_splat(self.if_expr()?)?;

    if self.match_(TokenKind::For) {
      let var = self.consume_ident("expected loop variable in comprehension")?;
      self.consume(TokenKind::In, "expected 'in' in comprehension")?;
      let iter = self.if_expr()?;
      let filter = if self.match_(TokenKind::When) { Some(Box::new(self.if_expr()?)) } else { None };
      self.consume(TokenKind::RBracket, "expected ']' after comprehension")?;
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::Comprehension { var, iter: Box::new(iter), body: Box::new(first), filter }));
    }

    let mut items = vec![first];
    while self.match_(TokenKind::Comma) {
      if self.check(TokenKind::RBracket) {
        break;
      }
      items.push(self.maybe_wrap_splat(self.if_expr()?)?);
    }
    self.consume(TokenKind::RBracket, "expected ']' after array literal")?;
    let span = start.join(self.previous().span);
    Ok(Expr::new(span, ExprKind::ArrayLit(items)))
  }

  fn object_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
    if self.match_(TokenKind::RBrace) {
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::ObjectLit(Vec::new())));
    }

    let (first_key, first_key_span) = {
      let span = self.peek().span;
      (self.object_key()?, span)
    };

    // shorthand `{a}` - only valid when not followed by ':'
    if !self.check(TokenKind::Colon) {
      let mut items = vec![(first_key.clone(), Expr::new(first_key_span, ExprKind::Identifier(first_key)))];
      while self.match_(TokenKind::Comma) {
        if self.check(TokenKind::RBrace) {
          break;
        }
        let span = self.peek().span;
        let key = self.object_key()?;
        if self.match_(TokenKind::Colon) {
          let value = self.expression()?;
          items.push((key, value));
        } else {
          items.push((key.clone(), Expr::new(span, ExprKind::Identifier(key))));
        }
      }
      self.consume(TokenKind::RBrace, "expected '}' after object literal")?;
      let span = start.join(self.previous().span);
      return Ok(Expr::new(span, ExprKind::ObjectLit(items)));
    }

    self.consume(TokenKind::Colon, "expected ':' after object key")?;
    let first_value = self.if_expr()?;

    if self.match_(TokenKind::For) {
      let key_var = self.consume_ident("expected key variable in comprehension")?;
      let value_var = if self.match_(TokenKind::Comma) { Some(self.consume_ident("expected value variable in comprehension")?) } else { None };
      self.consume(TokenKind::Of, "expected 'of' in object comprehension")?;
      let iter = self.if_expr()?;
      let filter = if self.match_(TokenKind::When) { Some(Box::new(self.if_expr()?)) } else { None };
      self.consume(TokenKind::RBrace, "expected '}' after object comprehension")?;
      let span = start.join(self.previous().span);
      let key_expr = Expr::new(first_key_span, ExprKind::Literal(Literal::Str(first_key)));
      return Ok(Expr::new(
        span,
        ExprKind::ObjectComprehension {
          key_expr: Box::new(key_expr),
          value_expr: Box::new(first_value),
          key_var,
          value_var,
          iter: Box::new(iter),
          filter,
        },
      ));
    }

    let mut items = vec![(first_key, first_value)];
    while self.match_(TokenKind::Comma) {
      if self.check(TokenKind::RBrace) {
        break;
      }
      let span = self.peek().span;
      let key = self.object_key()?;
      if self.match_(TokenKind::Colon) {
        let value = self.expression()?;
        items.push((key, value));
      } else {
        items.push((key.clone(), Expr::new(span, ExprKind::Identifier(key))));
      }
    }
    self.consume(TokenKind::RBrace, "expected '}' after object literal")?;
    let span = start.join(self.previous().span);
    Ok(Expr::new(span, ExprKind::ObjectLit(items)))
  }

  fn object_key(&mut self) -> Result<String, ParseError> {
    if let Some(name) = self.match_ident() {
      return Ok(name);
    }
    if self.match_(TokenKind::String) {
      return match &self.previous().literal {
        Some(TokLiteral::Str(s)) => Ok(s.clone()),
        _ => Err(self.error_here("object key must be a string")),
      };
    }
    Err(self.error_here("expected object key"))
  }

  // ---- token-stream primitives -----------------------------------------------

  fn match_(&mut self, kind: TokenKind) -> bool {
    if self.check(kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn match_ident(&mut self) -> Option<String> {
    if self.check(TokenKind::Ident) {
      self.advance();
      Some(self.previous().lexeme.clone())
    } else {
      None
    }
  }

  fn consume_ident(&mut self, message: &str) -> Result<String, ParseError> {
    if self.check(TokenKind::Ident) {
      self.advance();
      Ok(self.previous().lexeme.clone())
    } else {
      Err(self.error_here(message))
    }
  }

  fn consume_keyword_word(&mut self, word: &str) -> Result<(), ParseError> {
    // Only used for `import * from mod` - `from` is already a real keyword token.
    if word == "from" && self.match_(TokenKind::From) {
      return Ok(());
    }
    Err(self.error_here("expected 'from'"))
  }

  fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ParseError> {
    if self.check(kind) {
      Ok(self.advance())
    } else {
      Err(self.error_here(message))
    }
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.peek().kind == kind
  }

  fn check_any(&self, kinds: &[TokenKind]) -> bool {
    kinds.contains(&self.peek().kind)
  }

  fn check_next(&self, kind: TokenKind) -> bool {
    self.peek_at(1).kind == kind
  }

  fn advance(&mut self) -> &Token {
    if !self.is_at_end() {
      self.current += 1;
    }
    self.previous()
  }

  fn is_at_end(&self) -> bool {
    self.peek().kind == TokenKind::Eof
  }

  fn peek(&self) -> &Token {
    &self.tokens[self.current]
  }

  fn peek_at(&self, offset: usize) -> &Token {
    let idx = (self.current + offset).min(self.tokens.len() - 1);
    &self.tokens[idx]
  }

  fn previous(&self) -> &Token {
    &self.tokens[self.current - 1]
  }

  fn error_here(&self, message: &str) -> ParseError {
    let tok = self.peek();
    ParseError { message: message.to_string(), span: tok.span, line: tok.line, column: tok.column }
  }

  fn error_at(&self, tok: &Token, message: &str) -> ParseError {
    ParseError { message: message.to_string(), span: tok.span, line: tok.line, column: tok.column }
  }
}

fn cmp_to_bin(op: CmpOp) -> BinOp {
  match op {
    CmpOp::Lt => BinOp::Lt,
    CmpOp::Lte => BinOp::Lte,
    CmpOp::Gt => BinOp::Gt,
    CmpOp::Gte => BinOp::Gte,
    CmpOp::Eq => BinOp::Eq,
    CmpOp::Neq => BinOp::Neq,
  }
}

/// Lexes and parses a single expression out of the raw text captured between
/// a string interpolation's `#{` and `}`. Errors are re-anchored to the
/// enclosing string's span since the fragment has no position of its own in
/// the outer token stream.
fn parse_embedded_expr(src: &str, span: Span) -> Result<Expr, ParseError> {
  let out = crate::lexer::lex(src).map_err(|e| ParseError {
    message: format!("in string interpolation: {}", e.message),
    span,
    line: e.line,
    column: e.column,
  })?;
  Parser::new(out.tokens).expression().map_err(|e| ParseError {
    message: format!("in string interpolation: {}", e.message),
    span,
    line: e.line,
    column: e.column,
  })
}

fn literal_from_token(tok: &Token) -> Literal {
  match &tok.literal {
    Some(TokLiteral::Int(v)) => Literal::Int(*v),
    Some(TokLiteral::Float(v)) => Literal::Float(*v),
    Some(TokLiteral::Str(v)) => Literal::Str(v.clone()),
    Some(TokLiteral::Regex(pattern, flags)) => Literal::Regex(pattern.clone(), flags.clone()),
    None => Literal::Null,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexer::lex;

  fn parse_src(src: &str) -> Module {
    let out = lex(src).unwrap();
    parse(out.tokens).unwrap()
  }

  #[test]
  fn parses_simple_assignment_and_expression() {
    let module = parse_src("x = 2 + 3 * 4\nx\n");
    assert_eq!(module.statements.len(), 2);
    assert!(matches!(module.statements[0].kind, StmtKind::Assign { .. }));
  }

  #[test]
  fn parses_range_literal() {
    let module = parse_src("1..5\n");
    match &module.statements[0].kind {
      StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::RangeLit { exclusive: false, .. })),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn parses_chained_comparison() {
    let module = parse_src("1 < 5 < 10\n");
    match &module.statements[0].kind {
      StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::ChainedComparison { .. })),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn parses_array_destructuring_assignment() {
    let module = parse_src("[first, middle..., last] = arr\n");
    match &module.statements[0].kind {
      StmtKind::Assign { target, .. } => assert!(matches!(target.kind, ExprKind::ArrayDestructure { splat_index: 1, .. })),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn implicit_call_with_unary_minus_argument() {
    let module = parse_src("f -1\n");
    match &module.statements[0].kind {
      StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::Call { implicit: true, .. })),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn binary_minus_is_not_an_implicit_call() {
    let module = parse_src("a - b\n");
    match &module.statements[0].kind {
      StmtKind::ExprStmt(e) => assert!(matches!(e.kind, ExprKind::Binary(_, BinOp::Sub, _))),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn parses_string_interpolation() {
    let module = parse_src("\"hello #{name + 1}!\"\n");
    match &module.statements[0].kind {
      StmtKind::ExprStmt(e) => match &e.kind {
        ExprKind::InterpolatedString(pieces) => {
          assert_eq!(pieces.len(), 3);
          assert!(matches!(pieces[0].kind, ExprKind::Literal(Literal::Str(_))));
          assert!(matches!(pieces[1].kind, ExprKind::Binary(_, BinOp::Add, _)));
          assert!(matches!(pieces[2].kind, ExprKind::Literal(Literal::Str(_))));
        }
        other => panic!("unexpected {other:?}"),
      },
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn power_is_right_associative() {
    // 2 ** 3 ** 2 should be 2 ** (3 ** 2), i.e. the outer Binary's rhs is itself a Pow
    let module = parse_src("2 ** 3 ** 2\n");
    match &module.statements[0].kind {
      StmtKind::ExprStmt(e) => match &e.kind {
        ExprKind::Binary(_, BinOp::Pow, rhs) => assert!(matches!(rhs.kind, ExprKind::Binary(_, BinOp::Pow, _))),
        other => panic!("unexpected {other:?}"),
      },
      other => panic!("unexpected {other:?}"),
    }
  }
}
