//! `tascript` compiles a parsed technical-analysis script into a linear
//! intermediate representation and executes it once per incoming market
//! bar, threading per-call-site indicator state across bars.
//!
//! The lexer and source-to-tree parser are out of scope (see the language
//! reference's Non-goals) — this crate starts at [`ast::Program`]. The
//! pipeline is: `ast::Program` -> [`compiler::compile`] -> `ir::Program`
//! -> repeated [`vm::Vm::execute`] calls, one per [`bar::Bar`].

pub mod ast;
pub mod bar;
pub mod compiler;
pub mod error;
mod indicators;
pub mod ir;
pub mod logger;
pub mod registry;
pub mod ring;
pub mod value;
pub mod vm;

pub use error::{Error, ErrorKind, Loc, Position};
pub use value::Value;

pub type Result<T, E = Error> = std::result::Result<T, E>;
