//! The postfix token stream produced by the expression parser (C4) and
//! consumed by the gate builder (§4.6).

use crate::symbol::Function;

/// A single token in the parser's operator stack or output queue.
///
/// `LParen`/`RParen` only ever live on the operator stack; they never
/// reach the output queue. `Function` is part of the data model for
/// fidelity with the source grammar, but in practice a parameterized call
/// is inlined by splicing tokens directly into the caller's stream
/// (§4.4), so a `Function` token should never reach the gate builder —
/// doing so is an internal error.
#[derive(Debug, Clone)]
pub enum Token {
    LParen,
    RParen,
    Mul,
    Add,
    /// A single already-built gate, referenced as an operand (variable
    /// element, constant, or freshly auto-declared input).
    Operand(usize),
    /// A reference to a closed (already-lowered) function's root gate.
    Circuit(usize),
    /// Vestigial: a parameterized function call that reached the output
    /// queue without being inlined. Never produced by this parser.
    Function(Box<Function>, Vec<Vec<Token>>),
    /// A formal parameter reference, present only inside a parameterized
    /// function's stored token stream; replaced by the bound argument's
    /// tokens at inlining time.
    Argument(String),
}
