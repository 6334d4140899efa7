use scdl::compile;
use scdl::Error;

#[test]
fn redeclaring_a_name_is_rejected() {
    let err = compile("input a\ninput a\n");
    assert!(matches!(err, Err(Error::AlreadyDeclared(_))));
}

#[test]
fn calling_function_with_wrong_arity_is_rejected() {
    let err = compile("func and(x,y) = x*y\ninput a\nfunc out = and(a)\n");
    assert!(matches!(err, Err(Error::Arity { .. })));
}

#[test]
fn running_an_unknown_circuit_is_rejected() {
    let program = compile("input a\nfunc out = a\n").unwrap();
    let err: Result<u8, Error> = program.run("nope", &[1], &[]);
    assert!(matches!(err, Err(Error::Unknown(_))));
}

#[test]
fn mismatched_input_length_is_rejected() {
    let program = compile("input a\ninput b\nfunc out = a + b\n").unwrap();
    let err: Result<u8, Error> = program.run("out", &[1], &[]);
    assert!(matches!(err, Err(Error::Bounds(_))));
}
