//! The stack virtual machine (component F). Owns the operand stack,
//! locals/globals vectors, output map, and the per-call-site state map;
//! executes a compiled [`Program`](crate::ir::Program) once per bar.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::bar::{self, Bar};
use crate::error::{Error, ErrorKind, Result};
use crate::ir::{Opcode, Program};
use crate::logger::{Logger, StdoutLogger};
use crate::registry::{CallContext, Registry, StateBag};
use crate::value::Value;

const DEFAULT_MAX_STACK_SIZE: usize = 1000;

/// Output/result maps preserve insertion order (`indexmap::IndexMap` rather
/// than an unordered `HashMap`) — useful for embedders that render a bar's
/// output in declaration order.
pub type Map<K, V> = IndexMap<K, V>;

/// Construction-time options, mirroring the builder pattern used
/// elsewhere in this crate (`CompileOptions`).
pub struct VmOptions {
  pub logger: Box<dyn Logger>,
  pub max_stack_size: usize,
  pub initial_globals: HashMap<String, Value>,
  pub registry: Registry,
}

impl Default for VmOptions {
  fn default() -> Self {
    VmOptions {
      logger: Box::new(StdoutLogger),
      max_stack_size: DEFAULT_MAX_STACK_SIZE,
      initial_globals: HashMap::new(),
      registry: Registry::with_builtins(),
    }
  }
}

/// Builder for [`Vm`], for constructing an embeddable interpreter instance
/// without a long constructor argument list.
#[derive(Default)]
pub struct VmBuilder {
  options: VmOptions,
}

impl VmBuilder {
  pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
    self.options.logger = Box::new(logger);
    self
  }

  pub fn max_stack_size(mut self, max: usize) -> Self {
    self.options.max_stack_size = max;
    self
  }

  pub fn initial_global(mut self, name: impl Into<String>, value: Value) -> Self {
    self.options.initial_globals.insert(name.into(), value);
    self
  }

  pub fn registry(mut self, registry: Registry) -> Self {
    self.options.registry = registry;
    self
  }

  pub fn build(self, program: Program) -> Vm {
    Vm::new(program, self.options)
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionResult {
  pub output: Map<String, Value>,
  pub vars: Map<String, Value>,
  pub global_vars: Map<String, Value>,
  pub last_result: Option<Value>,
}

pub struct Vm {
  /// Shared, never mutated after `compile` — `Rc` lets the dispatch loop
  /// hold a live reference to the instruction stream without aliasing the
  /// rest of `self`, so executing a bar doesn't reallocate the program.
  program: Rc<Program>,
  registry: Registry,
  logger: Box<dyn Logger>,
  max_stack_size: usize,

  stack: Vec<Value>,
  locals: Vec<Value>,
  globals: Vec<Value>,
  output: Map<String, Value>,
  call_state: HashMap<u32, StateBag>,

  round: u64,
  market_ts: f64,
  executing: bool,
}

impl Vm {
  pub fn builder() -> VmBuilder {
    VmBuilder::default()
  }

  pub fn new(program: Program, options: VmOptions) -> Vm {
    let locals_count = program.main.locals_count as usize;
    let globals_count = program.main.globals_count as usize;
    let mut globals = vec![Value::Null; globals_count];
    for (name, value) in &options.initial_globals {
      if let Some(&slot) = program.global_names.get(name) {
        globals[slot as usize] = value.clone();
      }
    }

    Vm {
      program: Rc::new(program),
      registry: options.registry,
      logger: options.logger,
      max_stack_size: options.max_stack_size,
      stack: Vec::new(),
      locals: vec![Value::Null; locals_count],
      globals,
      output: Map::new(),
      call_state: HashMap::new(),
      round: 0,
      market_ts: 0.0,
      executing: false,
    }
  }

  /// Executes the compiled program against one incoming bar.
  pub fn execute(&mut self, bar: &Bar) -> Result<ExecutionResult> {
    if self.executing {
      return Err(Error::new(ErrorKind::RuntimeError, "Vm::execute called re-entrantly"));
    }
    self.executing = true;
    let result = self.execute_inner(bar);
    self.executing = false;
    result
  }

  fn execute_inner(&mut self, bar: &Bar) -> Result<ExecutionResult> {
    self.stack.clear();
    self.output.clear();
    for local in self.locals.iter_mut() {
      *local = Value::Null;
    }
    self.round += 1;
    self.ingest_bar(bar);

    let mut pc = 0usize;
    let program = Rc::clone(&self.program);
    let instructions = &program.main.instructions;
    while pc < instructions.len() {
      let instr = &instructions[pc];
      match self.dispatch(instr, &mut pc) {
        Ok(()) => {}
        Err(err) => {
          return Err(self.annotate(err, instr));
        }
      }
    }

    let last_result = self.stack.pop();
    if !self.stack.is_empty() {
      return Err(Error::new(
        ErrorKind::RuntimeError,
        format!("operand stack not empty at end of bar: {} leftover value(s)", self.stack.len()),
      ));
    }

    let vars = self
      .program
      .local_name_by_slot
      .iter()
      .enumerate()
      .map(|(i, name)| (name.clone(), self.locals[i].clone()))
      .collect();
    let global_vars = self
      .program
      .global_name_by_slot
      .iter()
      .enumerate()
      .map(|(i, name)| (name.clone(), self.globals[i].clone()))
      .collect();

    Ok(ExecutionResult {
      output: std::mem::take(&mut self.output),
      vars,
      global_vars,
      last_result,
    })
  }

  fn ingest_bar(&mut self, bar: &Bar) {
    self.market_ts = bar.timestamp();
    for (field, value) in bar.iter() {
      self.write_global_if_present(field, value);
      if let Some(alias) = bar::alias_of(field) {
        self.write_global_if_present(alias, value);
      }
    }
  }

  fn write_global_if_present(&mut self, name: &str, value: f64) {
    if let Some(&slot) = self.program.global_names.get(name) {
      self.globals[slot as usize] = Value::Float(value);
    }
  }

  fn annotate(&self, err: Error, instr: &crate::ir::Instruction) -> Error {
    let mut err = err
      .with_context("opcode", format!("{:?}", instr.opcode))
      .with_context("instructionId", instr.id);
    if let Some(name) = &instr.extra.operand_name {
      err = err.with_context("operandName", name.clone());
    }
    if let Some(loc) = instr.extra.loc {
      err = err.with_loc(loc);
    }
    err
  }

  fn push(&mut self, v: Value) -> Result<()> {
    if self.stack.len() >= self.max_stack_size {
      return Err(Error::new(ErrorKind::RuntimeError, "stack overflow"));
    }
    self.stack.push(v);
    Ok(())
  }

  fn pop(&mut self) -> Result<Value> {
    self.stack.pop().ok_or_else(|| Error::new(ErrorKind::RuntimeError, "stack underflow"))
  }

  fn dispatch(&mut self, instr: &crate::ir::Instruction, pc: &mut usize) -> Result<()> {
    let mut advance = true;
    match &instr.opcode {
      Opcode::LoadConst(idx) => {
        let v = self
          .program
          .constants
          .get(*idx as usize)
          .cloned()
          .ok_or_else(|| Error::new(ErrorKind::RuntimeError, "LOAD_CONST index out of bounds"))?;
        self.push(v)?;
      }
      Opcode::LoadVar(i) => self.push(self.locals[*i as usize].clone())?,
      Opcode::LoadGlobal(i) => self.push(self.globals[*i as usize].clone())?,
      Opcode::StoreVar(i) => {
        let v = self.pop()?;
        self.locals[*i as usize] = v;
      }
      Opcode::StoreGlobal(i) => {
        let v = self.pop()?;
        self.globals[*i as usize] = v;
      }
      Opcode::InitGlobal(i) => {
        let v = self.pop()?;
        if self.round == 1 {
          self.globals[*i as usize] = v;
        }
      }
      Opcode::StoreOutput { name, .. } => {
        let v = self.pop()?;
        self.output.insert(name.clone(), v);
      }

      Opcode::Add => self.binary_arith(|a, b| a + b)?,
      Opcode::Sub => self.binary_arith(|a, b| a - b)?,
      Opcode::Mul => self.binary_arith(|a, b| a * b)?,
      Opcode::Div => {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(div(a, b)?)?;
      }

      Opcode::UnaryPlus => {
        let v = self.pop()?;
        self.push(v)?;
      }
      Opcode::UnaryMinus => {
        let v = self.pop()?;
        let out = match v {
          Value::Null => Value::Null,
          Value::Float(f) => Value::Float(-f),
          other => return Err(type_error("UNARY_MINUS", &other)),
        };
        self.push(out)?;
      }

      Opcode::Gt => self.compare(|a, b| a > b)?,
      Opcode::Lt => self.compare(|a, b| a < b)?,
      Opcode::Gte => self.compare(|a, b| a >= b)?,
      Opcode::Lte => self.compare(|a, b| a <= b)?,
      Opcode::Eq => {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(a == b))?;
      }
      Opcode::Neq => {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(a != b))?;
      }

      Opcode::And => {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(a.is_truthy() && b.is_truthy()))?;
      }
      Opcode::Or => {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(Value::Bool(a.is_truthy() || b.is_truthy()))?;
      }

      Opcode::Jump(label) => {
        *pc = self.resolve_label(*label)?;
        advance = false;
      }
      Opcode::JumpIfFalse(label) => {
        let v = self.pop()?;
        if !v.is_truthy() {
          *pc = self.resolve_label(*label)?;
          advance = false;
        }
      }
      Opcode::JumpIfTrue(label) => {
        let v = self.pop()?;
        if v.is_truthy() {
          *pc = self.resolve_label(*label)?;
          advance = false;
        }
      }

      Opcode::CallBuiltin { name, arg_count } => self.call_builtin(instr.id, name, *arg_count)?,
      Opcode::CallFunc(_) => return Err(Error::new(ErrorKind::InvalidFunctionCall, "user-defined functions are not supported")),

      Opcode::Pop => {
        self.pop()?;
      }
      Opcode::Dup => {
        let v = self.stack.last().cloned().ok_or_else(|| Error::new(ErrorKind::RuntimeError, "stack underflow"))?;
        self.push(v)?;
      }
      Opcode::Swap => {
        let len = self.stack.len();
        if len < 2 {
          return Err(Error::new(ErrorKind::RuntimeError, "stack underflow"));
        }
        self.stack.swap(len - 1, len - 2);
      }

      Opcode::Return => {
        *pc = self.program.main.instructions.len();
        advance = false;
      }
      Opcode::Nop => {}
    }

    if advance {
      *pc += 1;
    }
    Ok(())
  }

  fn resolve_label(&self, label: crate::ir::LabelId) -> Result<usize> {
    self
      .program
      .resolve_label(label)
      .ok_or_else(|| Error::new(ErrorKind::UndefinedLabel, format!("unresolved label {}", label.0)))
  }

  fn binary_arith(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<()> {
    let b = self.pop()?;
    let a = self.pop()?;
    let out = match (a, b) {
      (Value::Null, _) | (_, Value::Null) => Value::Null,
      (Value::Float(a), Value::Float(b)) => Value::Float(f(a, b)),
      (a, _) => return Err(type_error("arithmetic", &a)),
    };
    self.push(out)
  }

  fn compare(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<()> {
    let b = self.pop()?;
    let a = self.pop()?;
    let out = match (a, b) {
      (Value::Null, _) | (_, Value::Null) => Value::Null,
      (Value::Float(a), Value::Float(b)) => Value::Bool(f(a, b)),
      (a, _) => return Err(type_error("comparison", &a)),
    };
    self.push(out)
  }

  fn call_builtin(&mut self, instruction_id: u32, name: &str, arg_count: u32) -> Result<()> {
    let mut args = Vec::with_capacity(arg_count as usize);
    for _ in 0..arg_count {
      args.push(self.pop()?);
    }
    args.reverse();

    let entry = self
      .registry
      .get(name)
      .ok_or_else(|| Error::new(ErrorKind::InvalidFunctionCall, format!("no registered function named `{name}`")))?;
    let execute = entry.execute;

    let state = self.call_state.entry(instruction_id).or_default();
    let mut ctx = CallContext {
      state,
      market_ts: self.market_ts,
      log: self.logger.as_mut(),
    };
    let result = execute(&args, &mut ctx)?;
    self.push(result)
  }
}

fn div(a: Value, b: Value) -> Result<Value> {
  match (a, b) {
    (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
    (Value::Float(_), Value::Float(b)) if b == 0.0 => Err(Error::new(ErrorKind::DivisionByZero, "division by zero")),
    (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
    (a, _) => Err(type_error("DIV", &a)),
  }
}

fn type_error(op: &str, v: &Value) -> Error {
  Error::new(ErrorKind::TypeError, format!("{op}: expected a number, got {v:?}"))
}
