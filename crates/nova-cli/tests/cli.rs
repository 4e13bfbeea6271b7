use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn nova() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("nova"))
}

fn tiny_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("src/p/Main.java")
        .write_str(
            r#"package p;

public class Main {
    public static void main(String[] args) {
        System.out.println(greeting());
    }

    static String greeting() {
        return "hello";
    }

    static int unused() {
        return 1;
    }
}
"#,
        )
        .unwrap();
    temp
}

#[test]
fn help_mentions_core_commands() {
    nova().arg("--help").assert().success().stdout(
        predicate::str::contains("minimize").and(predicate::str::contains("type-correct")),
    );
}

#[test]
fn minimize_json_reports_the_run() {
    let temp = tiny_project();

    let output = nova()
        .arg("minimize")
        .arg("--root")
        .arg(temp.path().join("src"))
        .arg("--output")
        .arg(temp.path().join("out"))
        .arg("--target")
        .arg("p.Main#main(String[])")
        .arg("--no-check")
        .arg("--json")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["targets"][0], "p.Main.main(java.lang.String[])");
    assert_eq!(v["used_methods"][0], "p.Main.greeting()");
    assert_eq!(v["files"][0]["path"], "p/Main.java");
    assert_eq!(v["files"][0]["kept"], true);

    temp.child("out/p/Main.java")
        .assert(predicate::str::contains("static String greeting() { throw new Error(); }"))
        .assert(predicate::str::contains("System.out.println(greeting());"))
        .assert(predicate::str::contains("unused").not());
}

#[test]
fn minimize_reads_targets_from_the_discovered_config() {
    let temp = tiny_project();
    temp.child("src/nova-minimize.toml")
        .write_str("targets = [\"p.Main#greeting()\"]\noutput = \"../min\"\n\n[checker]\nenabled = false\n")
        .unwrap();

    nova()
        .arg("minimize")
        .arg("--root")
        .arg(temp.path().join("src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("minimized: 1 of 1 files"));

    temp.child("min/p/Main.java")
        .assert(predicate::str::contains("return \"hello\";"))
        .assert(predicate::str::contains("main(").not());
}

#[test]
fn unknown_targets_exit_with_an_error() {
    let temp = tiny_project();

    nova()
        .arg("minimize")
        .arg("--root")
        .arg(temp.path().join("src"))
        .arg("--output")
        .arg(temp.path().join("out"))
        .arg("--target")
        .arg("p.Main#missing()")
        .arg("--no-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("target methods not found: p.Main#missing()"));
}

#[test]
fn malformed_targets_exit_with_an_error() {
    let temp = tiny_project();

    nova()
        .arg("minimize")
        .arg("--root")
        .arg(temp.path().join("src"))
        .arg("--target")
        .arg("p.Main.main")
        .arg("--no-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid target `p.Main.main`"));
}

#[cfg(unix)]
#[test]
fn type_correct_prints_corrections() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tiny_project();
    let checker = temp.child("fake-javac");
    checker
        .write_str("#!/bin/sh\necho \"$3:1: error: incompatible types: Stand cannot be converted to String\"\n")
        .unwrap();
    let mut perms = std::fs::metadata(checker.path()).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(checker.path(), perms).unwrap();

    nova()
        .arg("type-correct")
        .arg(temp.path().join("src"))
        .arg("--checker")
        .arg(checker.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("correction: Stand -> String"));
}
