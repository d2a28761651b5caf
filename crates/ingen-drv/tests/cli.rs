//! End-to-end runs of the `ingen` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn ingen() -> Command {
    Command::cargo_bin("ingen").expect("binary should build")
}

/// Creates a working directory with the fixed template locations, an
/// input file and an output directory.
fn workspace(inspect: &str, header_template: &str, source_template: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("codegen/templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("data.header"), header_template).unwrap();
    std::fs::write(templates.join("data.source"), source_template).unwrap();
    std::fs::write(dir.path().join("input.ins"), inspect).unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();
    dir
}

#[test]
fn test_no_arguments_prints_usage() {
    ingen()
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("No input file specified."))
        .stdout(predicate::str::contains("Usage: ingen"));
}

#[test]
fn test_help_exits_zero() {
    ingen()
        .arg("-?")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: ingen"));
}

#[test]
fn test_unknown_switch() {
    ingen()
        .arg("-X")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unknown switch \"-X\""));
}

#[test]
fn test_missing_output_directory() {
    ingen()
        .arg("input.ins")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Output directory required."));
}

#[test]
fn test_output_must_be_a_directory() {
    ingen()
        .args(["input.ins", "-O", "no/such/directory"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("is not a directory."));
}

#[test]
fn test_debug_conflicts_with_other_arguments() {
    ingen()
        .args(["-D", "input.ins"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("when using the \"/D\" switch"));
}

#[test]
fn test_generates_both_files() {
    let dir = workspace(
        "struct Foo { Int x; };\n",
        "// generated\n$foreach S in Structs$struct $S.Name$;\n$end$",
        "#include \"$HeaderFile$\"\n",
    );

    ingen()
        .current_dir(dir.path())
        .args(["input.ins", "-O", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("input.gen.h"))
        .stdout(predicate::str::contains("input.gen.cpp"));

    let header = std::fs::read_to_string(dir.path().join("out/input.gen.h")).unwrap();
    assert_eq!(header, "// generated\nstruct Foo;\n");

    let source = std::fs::read_to_string(dir.path().join("out/input.gen.cpp")).unwrap();
    assert_eq!(source, "#include \"input.gen.h\"\n");
}

#[test]
fn test_inspect_error_fails_run() {
    let dir = workspace("struct Foo { Unknown x; };\n", "h\n", "s\n");

    ingen()
        .current_dir(dir.path())
        .args(["input.ins", "-O", "out"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Unrecognized type \"Unknown\""));
}

#[test]
fn test_template_error_reports_failed_file() {
    let dir = workspace(
        "struct Foo { Int x; };\n",
        "$missing_name$\n",
        "fine\n",
    );

    ingen()
        .current_dir(dir.path())
        .args(["input.ins", "-O", "out"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unknown identifier \"missing_name\""))
        .stdout(predicate::str::contains("-- FAILED"));
}

#[test]
fn test_missing_template_reports_failed_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.ins"), "struct A { Int x; };\n").unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();

    ingen()
        .current_dir(dir.path())
        .args(["input.ins", "-O", "out"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unable to open template"))
        .stdout(predicate::str::contains("-- FAILED"));
}

#[test]
fn test_missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("out")).unwrap();

    ingen()
        .current_dir(dir.path())
        .args(["absent.ins", "-O", "out"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unable to open file"));
}

#[test]
fn test_imports_resolve_relative_to_input() {
    let dir = workspace(
        "import \"shared/types.ins\";\nstruct B { my_type t; };\n",
        "$foreach S in Structs$$S.Name$:$end$$foreach T in Types$$T.Name$ $end$\n",
        "ok\n",
    );
    let shared = dir.path().join("shared");
    std::fs::create_dir(&shared).unwrap();
    std::fs::write(shared.join("types.ins"), "declare_type my_type MyTD;\n").unwrap();

    ingen()
        .current_dir(dir.path())
        .args(["input.ins", "-O", "out"])
        .assert()
        .success();

    let header = std::fs::read_to_string(dir.path().join("out/input.gen.h")).unwrap();
    assert_eq!(header, "B:Pointer Int Bool String my_type B \n");
}
