#[path = "helpers.rs"]
mod helpers;

use std::io::Write;

use scdl::compiler::compile_file;

#[test]
fn include_pulls_in_declarations_from_another_file() {
    helpers::init_logging();

    let dir = std::env::temp_dir().join(format!("scdl-include-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let included_path = dir.join("bits.scdl");
    std::fs::File::create(&included_path)
        .unwrap()
        .write_all(b"input a\ninput b\n")
        .unwrap();

    let main_path = dir.join("main.scdl");
    std::fs::File::create(&main_path)
        .unwrap()
        .write_all(b"include \"bits.scdl\"\nfunc out = a * b\n")
        .unwrap();

    let program = compile_file(&main_path).unwrap();
    let result: u8 = program.run("out", &[1, 1], &[]).unwrap();
    assert_eq!(result % 2, 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
