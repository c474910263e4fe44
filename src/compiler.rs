//! The tree-walking lowering pass from `ast::Program` to `ir::Program`
//! (component C). Split into `stmt`/`expr` lowering, with the mutable
//! compiler state threaded explicitly through both.

mod expr;
mod stmt;

use std::collections::HashMap;

use crate::ast;
use crate::error::{Error, ErrorKind, Loc, Result};
use crate::ir::{Instruction, InstructionExtra, LabelId, LabelTable, Opcode, Program};
use crate::value::Value;

/// Names the compiler forbids on the left-hand side of an assignment.
const PROTECTED_WORDS: &[&str] = &["O", "H", "L", "C", "VARIABLE", "IF", "THEN", "ELSE", "BEGIN", "END", "RETURN"];

fn is_protected(name: &str) -> bool {
  PROTECTED_WORDS.contains(&name)
}

/// Controls debug-info emission and which embedder globals are
/// pre-seeded alongside `O H L C`.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
  pub debug: bool,
  pub extra_globals: Vec<String>,
}

struct Compiler {
  constants: Vec<Value>,
  global_slots: HashMap<String, u32>,
  global_name_by_slot: Vec<String>,
  local_slots: HashMap<String, u32>,
  local_name_by_slot: Vec<String>,
  instructions: Vec<Instruction>,
  next_instruction_id: u32,
  next_label_id: u32,
  labels: LabelTable,
  stack_depth: i32,
  max_stack_depth: u32,
  debug: bool,
}

pub fn compile(ast: &ast::Program, options: CompileOptions) -> Result<Program> {
  let mut c = Compiler {
    constants: Vec::new(),
    global_slots: HashMap::new(),
    global_name_by_slot: Vec::new(),
    local_slots: HashMap::new(),
    local_name_by_slot: Vec::new(),
    instructions: Vec::new(),
    next_instruction_id: 0,
    next_label_id: 0,
    labels: HashMap::new(),
    stack_depth: 0,
    max_stack_depth: 0,
    debug: options.debug,
  };

  c.seed_globals(&options.extra_globals);
  c.emit_body(&ast.body)?;

  Ok(Program {
    main: crate::ir::Function {
      instructions: c.instructions,
      locals_count: c.local_name_by_slot.len() as u32,
      globals_count: c.global_name_by_slot.len() as u32,
      max_stack_depth: c.max_stack_depth,
    },
    constants: c.constants,
    labels: c.labels,
    global_names: c.global_slots,
    global_name_by_slot: c.global_name_by_slot,
    local_name_by_slot: c.local_name_by_slot,
  })
}

impl Compiler {
  fn seed_globals(&mut self, extra: &[String]) {
    for name in ["O", "H", "L", "C"] {
      self.alloc_global(name);
    }
    for name in extra {
      self.alloc_global(name);
    }
  }

  fn alloc_global(&mut self, name: &str) -> u32 {
    if let Some(&slot) = self.global_slots.get(name) {
      return slot;
    }
    let slot = self.global_name_by_slot.len() as u32;
    self.global_slots.insert(name.to_string(), slot);
    self.global_name_by_slot.push(name.to_string());
    slot
  }

  fn alloc_local(&mut self, name: &str) -> u32 {
    if let Some(&slot) = self.local_slots.get(name) {
      return slot;
    }
    let slot = self.local_name_by_slot.len() as u32;
    self.local_slots.insert(name.to_string(), slot);
    self.local_name_by_slot.push(name.to_string());
    slot
  }

  fn intern_const(&mut self, v: Value) -> u32 {
    if let Some(idx) = self.constants.iter().position(|c| *c == v) {
      return idx as u32;
    }
    self.constants.push(v);
    (self.constants.len() - 1) as u32
  }

  fn new_label(&mut self) -> LabelId {
    let id = LabelId(self.next_label_id);
    self.next_label_id += 1;
    id
  }

  fn place_label(&mut self, label: LabelId) -> Result<()> {
    let pos = self.instructions.len();
    self.labels.insert(label, pos);
    self.emit(Opcode::Nop, None, None)
  }

  /// Appends `opcode`, updates the running/maximum stack depth, and
  /// attaches debug extras when `debug` is enabled.
  fn emit(&mut self, opcode: Opcode, loc: Option<Loc>, operand_name: Option<String>) -> Result<()> {
    let id = self.next_instruction_id;
    self.next_instruction_id += 1;

    self.stack_depth += opcode.stack_effect();
    if self.stack_depth < 0 {
      return Err(
        Error::new(ErrorKind::RuntimeError, "internal compiler error: stack depth went negative")
          .with_context("opcode", format!("{opcode:?}")),
      );
    }
    if self.stack_depth as u32 > self.max_stack_depth {
      self.max_stack_depth = self.stack_depth as u32;
    }

    let extra = InstructionExtra {
      loc: if self.debug { loc } else { None },
      operand_name: if self.debug { operand_name } else { None },
    };
    self.instructions.push(Instruction { id, opcode, extra });
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::*;

  fn num(n: f64) -> Expr {
    Expr::new(ExprKind::Literal(Literal::Number(n)))
  }

  fn ident(name: &str) -> Expr {
    Expr::new(ExprKind::Ident(name.to_string()))
  }

  #[test]
  fn assigning_to_protected_word_fails_to_compile() {
    let program = Program {
      body: vec![Stmt::new(StmtKind::Expr(Box::new(Expr::new(ExprKind::Assign {
        op: AssignOp::Assign,
        target: Box::new(ident("C")),
        value: Box::new(num(1.0)),
      }))))],
    };
    let err = compile(&program, CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAssignment);
  }

  #[test]
  fn globals_are_preseeded_in_ohlc_order() {
    let program = Program { body: vec![] };
    let compiled = compile(&program, CompileOptions::default()).unwrap();
    assert_eq!(compiled.global_name_by_slot, vec!["O", "H", "L", "C"]);
  }

  #[test]
  fn var_decl_assigns_once_via_init_global() {
    let program = Program {
      body: vec![Stmt::new(StmtKind::VarDecl(vec![VarDeclEntry {
        name: "cnt".to_string(),
        init: Some(num(0.0)),
      }]))],
    };
    let compiled = compile(&program, CompileOptions::default()).unwrap();
    assert!(compiled
      .main
      .instructions
      .iter()
      .any(|i| matches!(i.opcode, Opcode::InitGlobal(_))));
  }

  fn ma_cross_fixture() -> Program {
    // VARIABLE: cnt := 0;
    // cnt := cnt + 1;
    // cnt : cnt;
    Program {
      body: vec![
        Stmt::new(StmtKind::VarDecl(vec![VarDeclEntry {
          name: "cnt".to_string(),
          init: Some(num(0.0)),
        }])),
        Stmt::new(StmtKind::Expr(Box::new(Expr::new(ExprKind::Assign {
          op: AssignOp::Assign,
          target: Box::new(ident("cnt")),
          value: Box::new(Expr::new(ExprKind::Binary {
            op: BinaryOp::Add,
            left: Box::new(ident("cnt")),
            right: Box::new(num(1.0)),
          })),
        })))),
        Stmt::new(StmtKind::Expr(Box::new(Expr::new(ExprKind::Assign {
          op: AssignOp::Display,
          target: Box::new(ident("cnt")),
          value: Box::new(ident("cnt")),
        })))),
      ],
    }
  }

  /// Same input tree, compiled twice, must produce a structurally equal
  /// `ir::Program` (constants order, instruction sequence, label
  /// positions) — the determinism property in the language reference.
  #[test]
  fn compiling_the_same_tree_twice_is_deterministic() {
    let program = ma_cross_fixture();
    let a = compile(&program, CompileOptions::default()).unwrap();
    let b = compile(&program, CompileOptions::default()).unwrap();
    assert_eq!(a, b);
  }
}
