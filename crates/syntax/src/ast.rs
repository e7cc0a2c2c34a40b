use span::Span;

#[derive(Clone, Debug)]
pub struct Module {
  pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub struct Stmt {
  pub span: Span,
  pub kind: StmtKind,
}

impl Stmt {
  pub fn new(span: Span, kind: StmtKind) -> Stmt {
    Stmt { span, kind }
  }
}

#[derive(Clone, Debug)]
pub struct Expr {
  pub span: Span,
  pub kind: ExprKind,
}

impl Expr {
  pub fn new(span: Span, kind: ExprKind) -> Expr {
    Expr { span, kind }
  }
}

pub type BExpr = Box<Expr>;

#[derive(Clone, Debug)]
pub struct ImportItem {
  pub module: String,
  pub alias: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ImportName {
  pub name: String,
  pub alias: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
  Not,
  Neg,
  Pos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Pow,
  Eq,
  Neq,
  Lt,
  Lte,
  Gt,
  Gte,
  And,
  Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
  Lt,
  Lte,
  Gt,
  Gte,
  Eq,
  Neq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
  Inc,
  Dec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AugAssignOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalAssignOp {
  Or,
  And,
}

/// One parameter of a function literal.
#[derive(Clone, Debug)]
pub struct Param {
  pub name: String,
  /// `@name` shorthand: auto-assigns `this.name = name` on call.
  pub this_param: bool,
  pub splat: bool,
  pub default: Option<Expr>,
}

/// One member of a class body.
#[derive(Clone, Debug)]
pub enum ClassMember {
  /// `name: expr` - a method if `expr` is a function literal, otherwise a
  /// plain value evaluated once at class-declaration time.
  Field(String, Expr),
  Getter(String, Expr),
  Setter(String, String, Expr),
}

#[derive(Clone, Debug)]
pub enum StmtKind {
  Import(Vec<ImportItem>),
  FromImport {
    module: String,
    names: Vec<ImportName>,
  },
  ImportAll {
    module: String,
    alias: Option<String>,
  },
  Assign {
    target: Expr,
    value: Expr,
  },
  MultiAssign {
    targets: Vec<Expr>,
    value: Expr,
  },
  AugAssign {
    target: Expr,
    op: AugAssignOp,
    value: Expr,
  },
  ExistentialAssign {
    target: Expr,
    value: Expr,
  },
  LogicalAssign {
    target: Expr,
    op: LogicalAssignOp,
    value: Expr,
  },
  Update {
    target: Expr,
    op: UpdateOp,
    prefix: bool,
  },
  Return(Option<Expr>),
  While {
    cond: Expr,
    body: Expr,
  },
  ForIn {
    var: String,
    iter: Expr,
    body: Expr,
  },
  ForOf {
    key_var: String,
    value_var: Option<String>,
    iter: Expr,
    body: Expr,
  },
  Break,
  Continue,
  Throw(Expr),
  Try {
    try_body: Expr,
    catch_var: Option<String>,
    catch_body: Option<Expr>,
    finally_body: Option<Expr>,
  },
  ClassDecl {
    name: String,
    parent: Option<Expr>,
    members: Vec<ClassMember>,
  },
  ExprStmt(Expr),
}

#[derive(Clone, Debug)]
pub enum Literal {
  Int(i64),
  Float(f64),
  Str(String),
  Regex(String, String),
  Bool(bool),
  Null,
  Undefined,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
  Literal(Literal),
  Identifier(String),
  This,
  Super,
  Unary(UnaryOp, BExpr),
  Binary(BExpr, BinOp, BExpr),
  ChainedComparison {
    operands: Vec<Expr>,
    ops: Vec<CmpOp>,
  },
  If {
    cond: BExpr,
    then_branch: BExpr,
    else_branch: BExpr,
  },
  Block(Vec<Stmt>),
  Call {
    callee: BExpr,
    args: Vec<Expr>,
    kwargs: Vec<(String, Expr)>,
    implicit: bool,
  },
  New {
    class_expr: BExpr,
    args: Vec<Expr>,
    kwargs: Vec<(String, Expr)>,
  },
  FunctionLit {
    params: Vec<Param>,
    body: BExpr,
    bound: bool,
  },
  GetAttr {
    target: BExpr,
    name: String,
  },
  SafeAccess {
    target: BExpr,
    name: String,
  },
  ProtoAccess {
    target: Option<BExpr>,
    name: String,
  },
  Index {
    target: BExpr,
    index: BExpr,
  },
  Slice {
    target: BExpr,
    start: Option<BExpr>,
    end: Option<BExpr>,
    exclusive: bool,
  },
  ArrayLit(Vec<Expr>),
  ObjectLit(Vec<(String, Expr)>),
  RangeLit {
    start: BExpr,
    end: BExpr,
    exclusive: bool,
    step: Option<BExpr>,
  },
  Existential {
    left: BExpr,
    right: BExpr,
  },
  Splat(BExpr),
  InterpolatedString(Vec<Expr>),
  In {
    value: BExpr,
    container: BExpr,
  },
  Of {
    key: BExpr,
    container: BExpr,
  },
  Comprehension {
    var: String,
    iter: BExpr,
    body: BExpr,
    filter: Option<BExpr>,
  },
  ObjectComprehension {
    key_expr: BExpr,
    value_expr: BExpr,
    key_var: String,
    value_var: Option<String>,
    iter: BExpr,
    filter: Option<BExpr>,
  },
  Switch {
    subject: Option<BExpr>,
    cases: Vec<(Vec<Expr>, Expr)>,
    default: Option<BExpr>,
  },
  Do(BExpr),
  Yield(Option<BExpr>),
  /// `[a, b, rest..., c] = value` — array destructuring target.
  ArrayDestructure {
    elems: Vec<Expr>,
    splat_index: isize,
  },
  /// `{a, b: alias, c = default} = value` — object destructuring target.
  ObjectDestructure(Vec<ObjectPatternProp>),
}

#[derive(Clone, Debug)]
pub struct ObjectPatternProp {
  pub key: String,
  pub alias: Option<String>,
  pub default: Option<Expr>,
}
