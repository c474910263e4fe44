use super::Compiler;
use crate::ast;
use crate::error::{Error, ErrorKind, Result};
use crate::ir::Opcode;
use crate::value::Value;

impl Compiler {
  /// Lowers a statement sequence, threading "is this the trailing
  /// statement of the enclosing body" so only the program's very last
  /// expression statement keeps its value on the stack (`lastResult`).
  /// Statements aren't expressions elsewhere in this grammar, so only
  /// `Stmt::Expr` in the truly last position needs this.
  pub(super) fn emit_body(&mut self, body: &[ast::Stmt]) -> Result<()> {
    self.emit_body_tail(body, true)
  }

  /// Lowers a statement sequence where `outer_last` says whether the
  /// *enclosing* position is itself the program's trailing statement.
  /// Only the sequence's own last statement can ever keep a value on the
  /// stack, and only then if the enclosing position agrees — a `Block`
  /// nested inside a non-trailing position must still `Pop` its own last
  /// expression statement.
  fn emit_body_tail(&mut self, body: &[ast::Stmt], outer_last: bool) -> Result<()> {
    for (i, stmt) in body.iter().enumerate() {
      let is_last = outer_last && i == body.len() - 1;
      self.emit_stmt(stmt, is_last)?;
    }
    Ok(())
  }

  fn emit_stmt(&mut self, stmt: &ast::Stmt, is_last: bool) -> Result<()> {
    match &stmt.kind {
      ast::StmtKind::Expr(expr) => {
        self.emit_expr(expr)?;
        if !is_last {
          self.emit(Opcode::Pop, stmt.loc, None)?;
        }
      }
      ast::StmtKind::VarDecl(entries) => self.emit_var_decl(entries, stmt.loc)?,
      ast::StmtKind::If(if_stmt) => self.emit_if(if_stmt, stmt.loc)?,
      ast::StmtKind::Block(inner) => self.emit_body_tail(inner, is_last)?,
      ast::StmtKind::Return(arg) => self.emit_return(arg.as_deref(), stmt.loc)?,
    }
    Ok(())
  }

  fn emit_var_decl(&mut self, entries: &[ast::VarDeclEntry], loc: Option<crate::error::Loc>) -> Result<()> {
    for entry in entries {
      if super::is_protected(&entry.name) {
        return Err(protected_word_error(&entry.name, loc));
      }
      let slot = self.alloc_global(&entry.name);
      match &entry.init {
        Some(init) => self.emit_expr(init)?,
        None => {
          let idx = self.intern_const(Value::Null);
          self.emit(Opcode::LoadConst(idx), loc, None)?;
        }
      }
      self.emit(Opcode::InitGlobal(slot), loc, Some(entry.name.clone()))?;
    }
    Ok(())
  }

  fn emit_if(&mut self, if_stmt: &ast::If, loc: Option<crate::error::Loc>) -> Result<()> {
    let else_label = self.new_label();
    let end_label = self.new_label();

    self.emit_expr(&if_stmt.test)?;
    self.emit(Opcode::JumpIfFalse(else_label), loc, None)?;
    self.emit_stmt(&if_stmt.then_branch, false)?;
    self.emit(Opcode::Jump(end_label), loc, None)?;
    self.place_label(else_label)?;
    if let Some(else_branch) = &if_stmt.else_branch {
      self.emit_stmt(else_branch, false)?;
    }
    self.place_label(end_label)?;
    Ok(())
  }

  fn emit_return(&mut self, arg: Option<&ast::Expr>, loc: Option<crate::error::Loc>) -> Result<()> {
    match arg {
      Some(expr) => self.emit_expr(expr)?,
      None => {
        let idx = self.intern_const(Value::Null);
        self.emit(Opcode::LoadConst(idx), loc, None)?;
      }
    }
    self.emit(Opcode::Return, loc, None)
  }
}

pub(super) fn protected_word_error(name: &str, loc: Option<crate::error::Loc>) -> Error {
  let err = Error::new(ErrorKind::InvalidAssignment, format!("`{name}` is a protected word and cannot be assigned to"));
  match loc {
    Some(loc) => err.with_loc(loc),
    None => err,
  }
}
