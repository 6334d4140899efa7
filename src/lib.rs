//! # SCDL
//!
//! A compiler and evaluator for SCDL, a small language for declaring
//! bit-level inputs, integer constants, and named functions over `*`/`+`,
//! compiled into a shared arithmetic-circuit DAG with common-subexpression
//! elimination and evaluated generically over any ring-like type.

pub mod circuit;
pub mod compiler;
pub mod error;
pub mod gate;
pub mod parser;
pub mod program;
pub mod symbol;
pub mod token;

pub use circuit::Circuit;
pub use compiler::{compile, compile_file, Compiler};
pub use error::{Error, Result};
pub use program::Program;
