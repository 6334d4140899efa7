#[path = "helpers.rs"]
mod helpers;

use scdl::compile;

#[test]
fn constant_is_placed_after_variable_inputs() {
    helpers::init_logging();

    let program = compile("constant k = 1\ninput a\nfunc out = a * k + k\n").unwrap();

    assert_eq!(program.get_num_var_inputs(), 1);
    assert_eq!(program.get_constant("k").unwrap().input_index, 1);

    let result: u8 = program.run("out", &[0], &[1]).unwrap();
    assert_eq!(result % 2, 1);

    let result: u8 = program.run("out", &[1], &[1]).unwrap();
    assert_eq!(result % 2, 0);
}

#[test]
fn multiple_constants_are_relocated_in_declaration_order() {
    let program =
        compile("constant k = 2\nconstant m = 3\ninput a\nfunc out = a + k + m\n").unwrap();

    assert_eq!(program.get_constant("k").unwrap().input_index, 1);
    assert_eq!(program.get_constant("m").unwrap().input_index, 2);
}
