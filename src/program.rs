//! Program (C6): the frozen result of a compilation — a bundle of named
//! circuits plus variable/constant metadata, and the one operation
//! callers actually need: `run`.

use std::collections::HashMap;
use std::ops::{Add, Mul};

use serde::Serialize;

use crate::circuit::{Circuit, GateCounts};
use crate::error::{Error, Result};
use crate::symbol::{Constant, Symbol, SymbolTable, Variable};

#[derive(Debug)]
pub struct Program {
    circuits: HashMap<String, Circuit>,
    symbols: SymbolTable,
    n_var_inputs: usize,
    n_constants: usize,
}

impl Program {
    pub(crate) fn new(
        circuits: HashMap<String, Circuit>,
        symbols: SymbolTable,
        n_var_inputs: usize,
        n_constants: usize,
    ) -> Self {
        Program {
            circuits,
            symbols,
            n_var_inputs,
            n_constants,
        }
    }

    /// Evaluates the named closed function against a variable-input slice
    /// and a constant slice, in that order, over any ring-like type.
    pub fn run<T>(&self, circuit_name: &str, var_inputs: &[T], constants: &[T]) -> Result<T>
    where
        T: Copy + Add<Output = T> + Mul<Output = T>,
    {
        if var_inputs.len() != self.n_var_inputs {
            return Err(Error::Bounds(format!(
                "expected {} variable inputs, got {}",
                self.n_var_inputs,
                var_inputs.len()
            )));
        }
        if constants.len() != self.n_constants {
            return Err(Error::Bounds(format!(
                "expected {} constants, got {}",
                self.n_constants,
                constants.len()
            )));
        }

        let circuit = self
            .circuits
            .get(circuit_name)
            .ok_or_else(|| Error::Unknown(circuit_name.to_string()))?;

        let mut inputs = Vec::with_capacity(var_inputs.len() + constants.len());
        inputs.extend_from_slice(var_inputs);
        inputs.extend_from_slice(constants);

        Ok(circuit.evaluate(&inputs))
    }

    pub fn get_circuit(&self, name: &str) -> Option<&Circuit> {
        self.circuits.get(name)
    }

    pub fn has_circuit(&self, name: &str) -> bool {
        self.circuits.contains_key(name)
    }

    pub fn circuit_names(&self) -> impl Iterator<Item = &String> {
        self.circuits.keys()
    }

    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        match self.symbols.get(name) {
            Some(Symbol::Variable(v)) => Some(v),
            _ => None,
        }
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }

    pub fn get_constant(&self, name: &str) -> Option<&Constant> {
        match self.symbols.get(name) {
            Some(Symbol::Constant(c)) => Some(c),
            _ => None,
        }
    }

    /// Looks up a constant by declaration order rather than by name, e.g.
    /// the third `constant` statement compiled is ordinal 2.
    pub fn get_constant_at(&self, ordinal: usize) -> Option<&Constant> {
        let name = self.symbols.constant_names().get(ordinal)?;
        self.get_constant(name)
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.get_constant(name).is_some()
    }

    pub fn variable_names(&self) -> &[String] {
        self.symbols.variable_names()
    }

    pub fn constant_names(&self) -> &[String] {
        self.symbols.constant_names()
    }

    pub fn get_num_var_inputs(&self) -> usize {
        self.n_var_inputs
    }

    pub fn get_num_constants(&self) -> usize {
        self.n_constants
    }

    /// Number of declared variable *names* (distinct from
    /// `get_num_var_inputs`'s total input-wire count: an array variable
    /// declared with `input x:4` counts once here but contributes 4 wires).
    pub fn get_num_variables(&self) -> usize {
        self.symbols.variable_names().len()
    }

    pub fn get_num_circuits(&self) -> usize {
        self.circuits.len()
    }

    /// Dumps variable/constant/circuit metadata (not the gate arena itself —
    /// see `Circuit::to_json` for a per-circuit gate dump) as JSON, for
    /// debugging and golden-file tests.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let variables = self
            .symbols
            .variable_names()
            .iter()
            .map(|name| (name.clone(), self.get_variable(name).unwrap().clone()))
            .collect();
        let constants = self
            .symbols
            .constant_names()
            .iter()
            .map(|name| (name.clone(), self.get_constant(name).unwrap().clone()))
            .collect();
        let mut circuits: Vec<CircuitSummary> = self
            .circuits
            .iter()
            .map(|(name, circuit)| CircuitSummary {
                name: name.clone(),
                root: circuit.root(),
                depth: circuit.depth(),
                counts: circuit.gate_counts(),
            })
            .collect();
        circuits.sort_by(|a, b| a.name.cmp(&b.name));

        let snapshot = ProgramSnapshot {
            n_var_inputs: self.n_var_inputs,
            n_constants: self.n_constants,
            variables,
            constants,
            circuits,
        };
        serde_json::to_string_pretty(&snapshot)
    }
}

#[derive(Debug, Serialize)]
struct ProgramSnapshot {
    n_var_inputs: usize,
    n_constants: usize,
    variables: Vec<(String, Variable)>,
    constants: Vec<(String, Constant)>,
    circuits: Vec<CircuitSummary>,
}

#[derive(Debug, Serialize)]
struct CircuitSummary {
    name: String,
    root: usize,
    depth: usize,
    counts: GateCounts,
}
