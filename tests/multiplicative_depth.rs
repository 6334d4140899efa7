#[path = "helpers.rs"]
mod helpers;

use scdl::compile;

#[test]
fn chained_multiplies_have_depth_equal_to_factor_count_minus_one() {
    helpers::init_logging();

    let program =
        compile("input a\ninput b\ninput c\ninput d\nfunc out = a * b * c * d\n").unwrap();
    let circuit = program.get_circuit("out").unwrap();

    assert_eq!(circuit.gate_counts().n_mul, 3);
    assert_eq!(circuit.depth(), 3);
}

#[test]
fn addition_alone_has_zero_depth() {
    let program = compile("input a\ninput b\ninput c\nfunc out = a + b + c\n").unwrap();
    let circuit = program.get_circuit("out").unwrap();
    assert_eq!(circuit.depth(), 0);
}
