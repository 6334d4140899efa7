use thiserror::Error;

/// All failure modes the compiler and evaluator can surface.
///
/// Every variant carries enough context (a name, an index, or a free-form
/// message) for a caller to report something actionable; the core itself
/// never prints or logs these, it only returns them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("'{0}' is already declared")]
    AlreadyDeclared(String),

    #[error("unknown name: {0}")]
    Unknown(String),

    #[error("wrong number of arguments for '{name}': expected {expected}, got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{0}")]
    Bounds(String),

    #[error("circuit is not well formed: {0}")]
    NotWellFormed(String),

    #[error("internal compiler error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
