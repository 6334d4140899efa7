//! The gate DAG (C1): an immutable-after-build arena of input/add/multiply
//! nodes addressed by integer index, with structural common-subexpression
//! elimination shared across every circuit built in one compilation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The shape of a single gate. `fan_in` is always 2 for `Add`/`Mul`; there is
/// no `Out` tag (the source's `GATE_OUT` is never constructed and is omitted
/// here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateKind {
    Input,
    Add,
    Mul,
}

/// One node in the DAG. `Input` gates carry the input index they read from;
/// `Add`/`Mul` gates carry the indices (into the same arena) of their two
/// children. Children always have a strictly smaller index than their
/// parent — this is the topological-order invariant the whole crate relies
/// on for postorder traversal without a separate sort step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    Input(usize),
    Add(usize, usize),
    Mul(usize, usize),
}

impl Gate {
    pub fn kind(&self) -> GateKind {
        match self {
            Gate::Input(_) => GateKind::Input,
            Gate::Add(_, _) => GateKind::Add,
            Gate::Mul(_, _) => GateKind::Mul,
        }
    }

    pub fn children(&self) -> Vec<usize> {
        match self {
            Gate::Input(_) => Vec::new(),
            Gate::Add(l, r) | Gate::Mul(l, r) => vec![*l, *r],
        }
    }
}

/// Binary operator kind used both by gates and by the CSE key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum_macros::Display,
)]
pub enum OpKind {
    Add,
    Mul,
}

/// The CSE key: a structural operation is uniquely identified by its two
/// child indices (in the order they were registered) and its operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Operation {
    left: usize,
    right: usize,
    op: OpKind,
}

/// The shared gate arena. One `GateDag` is created per compilation and
/// lives for as long as any `Circuit` built from it (via `Rc`).
#[derive(Debug, Default)]
pub struct GateDag {
    gates: RefCell<Vec<Gate>>,
    cse: RefCell<HashMap<Operation, usize>>,
}

impl GateDag {
    pub fn new() -> Rc<GateDag> {
        Rc::new(GateDag {
            gates: RefCell::new(Vec::new()),
            cse: RefCell::new(HashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.gates.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn gate(&self, index: usize) -> Gate {
        self.gates.borrow()[index]
    }

    /// Allocates a fresh input gate, unconditionally (inputs are never
    /// deduplicated — two distinct `input` declarations with the same
    /// underlying index never happen, and re-declaring the same variable
    /// offset twice is a symbol-table error, not a DAG concern).
    pub fn new_input(&self, input_index: usize) -> usize {
        let mut gates = self.gates.borrow_mut();
        let idx = gates.len();
        gates.push(Gate::Input(input_index));
        trace!("gate {idx}: input({input_index})");
        idx
    }

    /// Allocates, or reuses via CSE, an `Add`/`Mul` gate over two existing
    /// gate indices. Both children must already exist in this arena.
    pub fn new_op(&self, op: OpKind, left: usize, right: usize) -> Result<usize> {
        let len = self.gates.borrow().len();
        if left >= len || right >= len {
            return Err(Error::Internal(format!(
                "gate child out of range: left={left}, right={right}, len={len}"
            )));
        }

        let key = Operation { left, right, op };
        if let Some(&existing) = self.cse.borrow().get(&key) {
            trace!("cse hit: {op}({left}, {right}) -> gate {existing}");
            return Ok(existing);
        }

        let mut gates = self.gates.borrow_mut();
        let idx = gates.len();
        gates.push(match op {
            OpKind::Add => Gate::Add(left, right),
            OpKind::Mul => Gate::Mul(left, right),
        });
        drop(gates);
        self.cse.borrow_mut().insert(key, idx);
        trace!("gate {idx}: {op}({left}, {right})");
        Ok(idx)
    }

    /// Rewrites the input index carried by a gate already in the arena.
    ///
    /// Used exactly once per constant, by the end-of-compilation relocation
    /// pass (constants are allocated tentative input indices during
    /// parsing, then shifted once the final variable-input count is known).
    /// This is the one place the "immutable after build" arena is mutated;
    /// it only ever touches `Input` gates and only before any `Circuit` is
    /// handed out for evaluation.
    pub fn relocate_input(&self, gate_index: usize, new_input_index: usize) -> Result<()> {
        let mut gates = self.gates.borrow_mut();
        match gates.get_mut(gate_index) {
            Some(g @ Gate::Input(_)) => {
                *g = Gate::Input(new_input_index);
                Ok(())
            }
            Some(_) => Err(Error::Internal(format!(
                "gate {gate_index} is not an input gate, cannot relocate"
            ))),
            None => Err(Error::Internal(format!("gate index {gate_index} out of range"))),
        }
    }
}

/// An externally constructed gate tree, used only by the validating build
/// path below (property-based tests build these directly, bypassing the
/// textual front-end entirely). Shared via `Rc` so that structural sharing
/// in the *source* tree is preserved and detected by pointer identity.
#[derive(Debug, Clone)]
pub enum RawGate {
    Input(usize),
    Add(Rc<RawGate>, Rc<RawGate>),
    Mul(Rc<RawGate>, Rc<RawGate>),
}

impl GateDag {
    /// Validating ingestion of an externally constructed `RawGate` tree.
    ///
    /// Walks the tree in postorder, assigning each *distinct* node (by
    /// pointer identity, so shared subtrees collapse to one gate) an index
    /// in a fresh arena. Fails with `NotWellFormed` if any input index is
    /// out of range.
    pub fn build(root: &Rc<RawGate>, n_inputs: usize) -> Result<(Rc<GateDag>, usize)> {
        let dag = GateDag::new();
        let mut visited: HashMap<*const RawGate, usize> = HashMap::new();
        let root_idx = build_rec(&dag, root, n_inputs, &mut visited)?;
        Ok((dag, root_idx))
    }
}

fn build_rec(
    dag: &Rc<GateDag>,
    node: &Rc<RawGate>,
    n_inputs: usize,
    visited: &mut HashMap<*const RawGate, usize>,
) -> Result<usize> {
    let ptr = Rc::as_ptr(node);
    if let Some(&idx) = visited.get(&ptr) {
        return Ok(idx);
    }

    let idx = match node.as_ref() {
        RawGate::Input(i) => {
            if *i >= n_inputs {
                return Err(Error::NotWellFormed(format!(
                    "input gate index {i} out of range (n_inputs={n_inputs})"
                )));
            }
            dag.new_input(*i)
        }
        RawGate::Add(l, r) => {
            let li = build_rec(dag, l, n_inputs, visited)?;
            let ri = build_rec(dag, r, n_inputs, visited)?;
            dag.new_op(OpKind::Add, li, ri)?
        }
        RawGate::Mul(l, r) => {
            let li = build_rec(dag, l, n_inputs, visited)?;
            let ri = build_rec(dag, r, n_inputs, visited)?;
            dag.new_op(OpKind::Mul, li, ri)?
        }
    };

    visited.insert(ptr, idx);
    Ok(idx)
}
