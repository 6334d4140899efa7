#[path = "helpers.rs"]
mod helpers;

use scdl::compile;

#[test]
fn repeated_subexpression_is_built_once() {
    helpers::init_logging();

    let program = compile("input a\ninput b\nfunc out = (a+b)*(a+b)\n").unwrap();
    let circuit = program.get_circuit("out").unwrap();
    let counts = circuit.gate_counts();

    assert_eq!(counts.n_add, 1);
    assert_eq!(counts.n_mul, 1);
    assert_eq!(counts.total(), 2);
}

#[test]
fn reinserting_same_operation_does_not_grow_the_arena() {
    let program = compile("input a\ninput b\nfunc left = a + b\nfunc right = a + b\n").unwrap();
    let left = program.get_circuit("left").unwrap();
    let right = program.get_circuit("right").unwrap();

    // Both closed functions share one arena: building the identical `a + b`
    // a second time must reuse the first function's gate, not allocate a
    // second one.
    assert_eq!(left.root(), right.root());
}
