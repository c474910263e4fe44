//! The parsed-tree input the compiler consumes.
//!
//! This is the external interface described in the language reference: the
//! lexer and parser that produce this tree are out of scope for this crate
//! (see the top-level Non-goals). Embedders construct `Program` values
//! themselves, typically by running their own parser over source text.

use crate::error::Loc;

#[derive(Debug, Clone, Default)]
pub struct Program {
  pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
  pub kind: StmtKind,
  pub loc: Option<Loc>,
}

impl Stmt {
  pub fn new(kind: StmtKind) -> Stmt {
    Stmt { kind, loc: None }
  }

  pub fn with_loc(kind: StmtKind, loc: Loc) -> Stmt {
    Stmt { kind, loc: Some(loc) }
  }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
  Expr(Box<Expr>),
  VarDecl(Vec<VarDeclEntry>),
  If(Box<If>),
  Block(Vec<Stmt>),
  Return(Option<Box<Expr>>),
}

#[derive(Debug, Clone)]
pub struct VarDeclEntry {
  pub name: String,
  pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct If {
  pub test: Expr,
  pub then_branch: Stmt,
  pub else_branch: Option<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Expr {
  pub kind: ExprKind,
  pub loc: Option<Loc>,
}

impl Expr {
  pub fn new(kind: ExprKind) -> Expr {
    Expr { kind, loc: None }
  }

  pub fn with_loc(kind: ExprKind, loc: Loc) -> Expr {
    Expr { kind, loc: Some(loc) }
  }
}

#[derive(Debug, Clone)]
pub enum Literal {
  Number(f64),
  String(String),
  Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Gt,
  Lt,
  Gte,
  Lte,
  Eq,
  Neq,
  And,
  Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Plus,
  Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
  /// `:=`
  Assign,
  /// `:` (display-assign)
  Display,
  /// `^^` — present in the grammar, not lowerable.
  Caret,
  /// `..` — present in the grammar, not lowerable.
  Range,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
  Literal(Literal),
  Ident(String),
  Binary {
    op: BinaryOp,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  Unary {
    op: UnaryOp,
    arg: Box<Expr>,
  },
  Assign {
    op: AssignOp,
    target: Box<Expr>,
    value: Box<Expr>,
  },
  Call {
    callee: Box<Expr>,
    args: Vec<Expr>,
  },
  Member {
    object: Box<Expr>,
    property: String,
    computed: bool,
  },
}
