//! Circuit (C2): a named view into the shared gate DAG, plus the generic
//! evaluator and multiplicative-depth analysis.

use std::cell::RefCell;
use std::ops::{Add, Mul};
use std::rc::Rc;

use serde::Serialize;

use crate::gate::{Gate, GateDag};

/// A circuit is just a root index into a program-wide [`GateDag`], plus a
/// lazily computed, cached multiplicative depth. Cloning a `Circuit` is
/// cheap (it clones the `Rc`, not the arena).
#[derive(Debug, Clone)]
pub struct Circuit {
    dag: Rc<GateDag>,
    root: usize,
    depth: RefCell<Option<usize>>,
}

impl Circuit {
    pub fn new(dag: Rc<GateDag>, root: usize) -> Self {
        Circuit {
            dag,
            root,
            depth: RefCell::new(None),
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn dag(&self) -> &Rc<GateDag> {
        &self.dag
    }

    /// Multiplicative depth: 0 for an input, the max over children for an
    /// add gate, and one more than the max over children for a multiply
    /// gate. Memoized across the whole reachable subgraph on first call.
    pub fn depth(&self) -> usize {
        if let Some(d) = *self.depth.borrow() {
            return d;
        }
        let mut memo = vec![None; self.dag.len()];
        let d = depth_rec(&self.dag, self.root, &mut memo);
        *self.depth.borrow_mut() = Some(d);
        d
    }

    /// Counts add/multiply gates reachable from this circuit's root. A
    /// shared arena may hold gates from other circuits too; those are not
    /// counted.
    pub fn gate_counts(&self) -> GateCounts {
        let mut seen = vec![false; self.dag.len()];
        let mut counts = GateCounts::default();
        count_rec(&self.dag, self.root, &mut seen, &mut counts);
        counts
    }

    /// Evaluates the circuit with memoization: each reachable gate is
    /// computed at most once. This is the intended default evaluation
    /// mode (see `evaluate_no_store` for the deliberately-naive
    /// alternative kept around for testing).
    pub fn evaluate<T>(&self, inputs: &[T]) -> T
    where
        T: Copy + Add<Output = T> + Mul<Output = T>,
    {
        let mut stored: Vec<Option<T>> = vec![None; self.dag.len()];
        eval_with_store(&self.dag, self.root, inputs, &mut stored)
    }

    /// Naive recursive evaluation with no memoization: every time a gate
    /// is reached from more than one parent, it is recomputed from
    /// scratch. Exponential in the worst case for deeply shared DAGs.
    /// Kept only so property tests can check it agrees with `evaluate`;
    /// never the right choice for real workloads.
    pub fn evaluate_no_store<T>(&self, inputs: &[T]) -> T
    where
        T: Copy + Add<Output = T> + Mul<Output = T>,
    {
        eval_no_store(&self.dag, self.root, inputs)
    }

    /// Dumps the gates reachable from this circuit's root, in postorder,
    /// as JSON — for debugging and golden-file tests, not an external
    /// wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut order = Vec::new();
        let mut seen = vec![false; self.dag.len()];
        collect_postorder(&self.dag, self.root, &mut seen, &mut order);
        let snapshot = CircuitSnapshot {
            root: self.root,
            depth: self.depth(),
            counts: self.gate_counts(),
            gates: order.into_iter().map(|i| self.dag.gate(i)).collect(),
        };
        serde_json::to_string_pretty(&snapshot)
    }
}

#[derive(Debug, Serialize)]
struct CircuitSnapshot {
    root: usize,
    depth: usize,
    counts: GateCounts,
    gates: Vec<Gate>,
}

fn collect_postorder(dag: &GateDag, index: usize, seen: &mut [bool], order: &mut Vec<usize>) {
    if seen[index] {
        return;
    }
    seen[index] = true;
    for child in dag.gate(index).children() {
        collect_postorder(dag, child, seen, order);
    }
    order.push(index);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateCounts {
    pub n_add: usize,
    pub n_mul: usize,
}

impl GateCounts {
    pub fn total(&self) -> usize {
        self.n_add + self.n_mul
    }
}

fn depth_rec(dag: &GateDag, index: usize, memo: &mut [Option<usize>]) -> usize {
    if let Some(d) = memo[index] {
        return d;
    }
    let d = match dag.gate(index) {
        Gate::Input(_) => 0,
        Gate::Add(l, r) => depth_rec(dag, l, memo).max(depth_rec(dag, r, memo)),
        Gate::Mul(l, r) => 1 + depth_rec(dag, l, memo).max(depth_rec(dag, r, memo)),
    };
    memo[index] = Some(d);
    d
}

fn count_rec(dag: &GateDag, index: usize, seen: &mut [bool], counts: &mut GateCounts) {
    if seen[index] {
        return;
    }
    seen[index] = true;
    match dag.gate(index) {
        Gate::Input(_) => {}
        Gate::Add(l, r) => {
            counts.n_add += 1;
            count_rec(dag, l, seen, counts);
            count_rec(dag, r, seen, counts);
        }
        Gate::Mul(l, r) => {
            counts.n_mul += 1;
            count_rec(dag, l, seen, counts);
            count_rec(dag, r, seen, counts);
        }
    }
}

fn eval_with_store<T>(dag: &GateDag, index: usize, inputs: &[T], stored: &mut [Option<T>]) -> T
where
    T: Copy + Add<Output = T> + Mul<Output = T>,
{
    if let Some(v) = stored[index] {
        return v;
    }
    let value = match dag.gate(index) {
        Gate::Input(i) => inputs[i],
        Gate::Add(l, r) => {
            eval_with_store(dag, l, inputs, stored) + eval_with_store(dag, r, inputs, stored)
        }
        Gate::Mul(l, r) => {
            eval_with_store(dag, l, inputs, stored) * eval_with_store(dag, r, inputs, stored)
        }
    };
    stored[index] = Some(value);
    value
}

fn eval_no_store<T>(dag: &GateDag, index: usize, inputs: &[T]) -> T
where
    T: Copy + Add<Output = T> + Mul<Output = T>,
{
    match dag.gate(index) {
        Gate::Input(i) => inputs[i],
        Gate::Add(l, r) => eval_no_store(dag, l, inputs) + eval_no_store(dag, r, inputs),
        Gate::Mul(l, r) => eval_no_store(dag, l, inputs) * eval_no_store(dag, r, inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::OpKind;

    #[test]
    fn depth_counts_multiplies_on_the_deepest_path() {
        let dag = GateDag::new();
        let a = dag.new_input(0);
        let b = dag.new_input(1);
        let c = dag.new_input(2);
        let d = dag.new_input(3);
        let ab = dag.new_op(OpKind::Mul, a, b).unwrap();
        let abc = dag.new_op(OpKind::Mul, ab, c).unwrap();
        let abcd = dag.new_op(OpKind::Mul, abc, d).unwrap();
        let circuit = Circuit::new(dag, abcd);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn add_does_not_increase_depth() {
        let dag = GateDag::new();
        let a = dag.new_input(0);
        let b = dag.new_input(1);
        let add = dag.new_op(OpKind::Add, a, b).unwrap();
        let circuit = Circuit::new(dag, add);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn evaluate_matches_no_store_mod_2() {
        let dag = GateDag::new();
        let a = dag.new_input(0);
        let b = dag.new_input(1);
        let ab = dag.new_op(OpKind::Mul, a, b).unwrap();
        let out = dag.new_op(OpKind::Add, ab, a).unwrap();
        let circuit = Circuit::new(dag, out);

        for &(x, y) in &[(0u8, 0u8), (0, 1), (1, 0), (1, 1)] {
            let stored = circuit.evaluate(&[x % 2, y % 2]);
            let naive = circuit.evaluate_no_store(&[x % 2, y % 2]);
            assert_eq!(stored % 2, naive % 2);
        }
    }

    #[test]
    fn shared_subexpression_is_counted_once() {
        let dag = GateDag::new();
        let a = dag.new_input(0);
        let b = dag.new_input(1);
        let sum = dag.new_op(OpKind::Add, a, b).unwrap();
        let out = dag.new_op(OpKind::Mul, sum, sum).unwrap();
        let circuit = Circuit::new(dag, out);
        let counts = circuit.gate_counts();
        assert_eq!(counts.n_add, 1);
        assert_eq!(counts.n_mul, 1);
    }

    #[test]
    fn to_json_includes_reachable_gates_only() {
        let dag = GateDag::new();
        let a = dag.new_input(0);
        let b = dag.new_input(1);
        let _unused = dag.new_input(2);
        let add = dag.new_op(OpKind::Add, a, b).unwrap();
        let circuit = Circuit::new(dag, add);
        let json = circuit.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["gates"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["root"], add);
    }
}
