#[path = "helpers.rs"]
mod helpers;

use scdl::compile;

#[test]
fn a_times_b_plus_a() {
    helpers::init_logging();

    let program = compile("input a\ninput b\nfunc out = a * b + a\n").unwrap();

    let result: u8 = program.run("out", &[1, 0], &[]).unwrap();
    assert_eq!(result % 2, 1);

    let result: u8 = program.run("out", &[1, 1], &[]).unwrap();
    assert_eq!(result % 2, 0);
}
