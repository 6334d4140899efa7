//! Symbol table (C3): name resolution for variables, constants, and
//! functions, shared by the statement driver (C5) and the expression
//! parser (C4).

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::token::Token;

/// A declared bit-level input variable: `len` contiguous input indices
/// starting at `base` in the external (evaluation-time) input vector, each
/// backed by its own `Gate::Input` already allocated in the shared arena
/// at `gates[i]`. `var[i]` reads external input index `base + i` through
/// arena gate `gates[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub base: usize,
    pub len: usize,
    pub gates: Vec<usize>,
}

impl Variable {
    pub fn external_index(&self, offset: usize) -> Result<usize> {
        if offset >= self.len {
            return Err(Error::Bounds(format!(
                "array index {offset} out of range (length {})",
                self.len
            )));
        }
        Ok(self.base + offset)
    }

    pub fn gate_index(&self, offset: usize) -> Result<usize> {
        if offset >= self.len {
            return Err(Error::Bounds(format!(
                "array index {offset} out of range (length {})",
                self.len
            )));
        }
        Ok(self.gates[offset])
    }
}

/// A declared integer constant. `input_index` starts out tentative (see
/// the statement driver's relocation pass) and is fixed up, along with the
/// `Gate::Input` at `gate`, once the final variable-input count is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub input_index: usize,
    pub gate: usize,
    pub value: i64,
}

/// A function may be closed (no parameters, already lowered to a gate) or
/// parameterized (stored as a token stream to be inlined at each call
/// site).
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// Lowered root gate index in the shared DAG.
    Gate(usize),
    /// Not yet lowered: the postfix token stream to splice at call sites.
    Tokens(Vec<Token>),
}

#[derive(Debug, Clone)]
pub struct Function {
    pub params: Vec<String>,
    pub body: FunctionBody,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(Variable),
    Constant(Constant),
    Function(Function),
}

/// Name resolution table. Insertion is rejected if the name is already
/// bound; SCDL has no shadowing.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    /// Preserves declaration order for `Program`'s ordered variable/constant
    /// name lists.
    variable_order: Vec<String>,
    constant_order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    pub fn declare_variable(&mut self, name: &str, base: usize, gates: Vec<usize>) -> Result<()> {
        let len = gates.len();
        debug!("declare variable '{name}': base={base}, len={len}");
        self.insert_new(name, Symbol::Variable(Variable { base, len, gates }))?;
        self.variable_order.push(name.to_string());
        Ok(())
    }

    pub fn declare_constant(&mut self, name: &str, input_index: usize, gate: usize, value: i64) -> Result<()> {
        debug!("declare constant '{name}' = {value} (tentative input index {input_index})");
        self.insert_new(
            name,
            Symbol::Constant(Constant {
                input_index,
                gate,
                value,
            }),
        )?;
        self.constant_order.push(name.to_string());
        Ok(())
    }

    pub fn declare_function(&mut self, name: &str, function: Function) -> Result<()> {
        debug!("declare function '{name}' (arity {})", function.arity());
        self.insert_new(name, Symbol::Function(function))
    }

    fn insert_new(&mut self, name: &str, symbol: Symbol) -> Result<()> {
        if self.symbols.contains_key(name) {
            return Err(Error::AlreadyDeclared(name.to_string()));
        }
        self.symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_order
    }

    pub fn constant_names(&self) -> &[String] {
        &self.constant_order
    }
}
