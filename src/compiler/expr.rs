use super::Compiler;
use crate::ast::{self, AssignOp, BinaryOp, UnaryOp};
use crate::error::{Error, ErrorKind, Loc, Result};
use crate::ir::Opcode;
use crate::value::Value;

fn binary_opcode(op: BinaryOp) -> Opcode {
  match op {
    BinaryOp::Add => Opcode::Add,
    BinaryOp::Sub => Opcode::Sub,
    BinaryOp::Mul => Opcode::Mul,
    BinaryOp::Div => Opcode::Div,
    BinaryOp::Gt => Opcode::Gt,
    BinaryOp::Lt => Opcode::Lt,
    BinaryOp::Gte => Opcode::Gte,
    BinaryOp::Lte => Opcode::Lte,
    BinaryOp::Eq => Opcode::Eq,
    BinaryOp::Neq => Opcode::Neq,
    BinaryOp::And => Opcode::And,
    BinaryOp::Or => Opcode::Or,
  }
}

impl Compiler {
  pub(super) fn emit_expr(&mut self, expr: &ast::Expr) -> Result<()> {
    match &expr.kind {
      ast::ExprKind::Literal(lit) => self.emit_literal(lit, expr.loc),
      ast::ExprKind::Ident(name) => self.emit_ident_load(name, expr.loc),
      ast::ExprKind::Binary { op, left, right } => {
        self.emit_expr(left)?;
        self.emit_expr(right)?;
        self.emit(binary_opcode(*op), expr.loc, None)
      }
      ast::ExprKind::Unary { op, arg } => {
        self.emit_expr(arg)?;
        let opcode = match op {
          UnaryOp::Plus => Opcode::UnaryPlus,
          UnaryOp::Minus => Opcode::UnaryMinus,
        };
        self.emit(opcode, expr.loc, None)
      }
      ast::ExprKind::Assign { op, target, value } => self.emit_assign(*op, target, value, expr.loc),
      ast::ExprKind::Call { callee, args } => self.emit_call(callee, args, expr.loc),
      ast::ExprKind::Member { .. } => Err(member_access_error(expr.loc)),
    }
  }

  fn emit_literal(&mut self, lit: &ast::Literal, loc: Option<Loc>) -> Result<()> {
    let value = match lit {
      ast::Literal::Number(n) => Value::Float(*n),
      ast::Literal::String(s) => Value::str(s.as_str()),
      ast::Literal::Bool(b) => Value::Bool(*b),
    };
    let idx = self.intern_const(value);
    self.emit(Opcode::LoadConst(idx), loc, None)
  }

  fn emit_ident_load(&mut self, name: &str, loc: Option<Loc>) -> Result<()> {
    if let Some(&slot) = self.local_slots.get(name) {
      return self.emit(Opcode::LoadVar(slot), loc, Some(name.to_string()));
    }
    if let Some(&slot) = self.global_slots.get(name) {
      return self.emit(Opcode::LoadGlobal(slot), loc, Some(name.to_string()));
    }
    Err(undefined_variable_error(name, loc))
  }

  fn emit_call(&mut self, callee: &ast::Expr, args: &[ast::Expr], loc: Option<Loc>) -> Result<()> {
    if let ast::ExprKind::Ident(name) = &callee.kind {
      for arg in args {
        self.emit_expr(arg)?;
      }
      return self.emit(
        Opcode::CallBuiltin {
          name: name.clone(),
          arg_count: args.len() as u32,
        },
        loc,
        Some(name.clone()),
      );
    }
    self.emit_expr(callee)?;
    for arg in args {
      self.emit_expr(arg)?;
    }
    self.emit(Opcode::CallFunc(args.len() as u32), loc, None)
  }

  fn emit_assign(&mut self, op: AssignOp, target: &ast::Expr, value: &ast::Expr, loc: Option<Loc>) -> Result<()> {
    let name = match &target.kind {
      ast::ExprKind::Ident(name) => name.clone(),
      _ => {
        return Err(Error::new(ErrorKind::InvalidAssignment, "assignment target must be an identifier").maybe_loc(loc))
      }
    };
    if super::is_protected(&name) {
      return Err(super::stmt::protected_word_error(&name, loc));
    }

    match op {
      AssignOp::Caret | AssignOp::Range => {
        return Err(
          Error::new(ErrorKind::UnimplementedFeature, format!("operator `{op:?}` is not lowerable")).maybe_loc(loc),
        )
      }
      _ => {}
    }

    self.emit_expr(value)?;

    // An assignment is itself an expression yielding the assigned value
    // (so `y := (x := 5);` and a trailing `x := 5` as the program's last
    // statement both work, and so a non-trailing `x := 5;` has something
    // for the statement lowerer's `Pop` to consume). One `Dup` survives
    // the store below as that result; display-assign needs a second for
    // `STORE_OUTPUT` on top of that.
    self.emit(Opcode::Dup, loc, None)?;
    if op == AssignOp::Display {
      self.emit(Opcode::Dup, loc, None)?;
    }

    let slot = if let Some(&slot) = self.global_slots.get(&name) {
      self.emit(Opcode::StoreGlobal(slot), loc, Some(name.clone()))?;
      slot
    } else {
      let slot = self.alloc_local(&name);
      self.emit(Opcode::StoreVar(slot), loc, Some(name.clone()))?;
      slot
    };

    if op == AssignOp::Display {
      self.emit(Opcode::StoreOutput { slot, name: name.clone() }, loc, Some(name))?;
    }

    Ok(())
  }
}

fn undefined_variable_error(name: &str, loc: Option<Loc>) -> Error {
  Error::new(ErrorKind::UndefinedVariable, format!("undefined variable `{name}`")).maybe_loc(loc)
}

fn member_access_error(loc: Option<Loc>) -> Error {
  Error::new(ErrorKind::RuntimeError, "member access is reserved and not yet implemented").maybe_loc(loc)
}
