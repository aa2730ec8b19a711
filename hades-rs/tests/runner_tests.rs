//! Run scripts through the `hades` binary and check stdout, stderr and the
//! exit status.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn hades() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hades"));
    // Keep the user's environment out of the picture.
    cmd.env_remove("HADESRC").env_remove("HADES_LOG");
    cmd
}

/// Pipe `script` to `hades -f -` plus any extra flags.
fn run_stdin(flags: &[&str], script: &str) -> Output {
    let mut child = hades()
        .args(flags)
        .args(["-f", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn hades");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(script.as_bytes())
        .expect("write script");
    child.wait_with_output().expect("wait for hades")
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout).lines().map(str::to_owned).collect()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn echo_goes_to_stdout() {
    let out = run_stdin(&[], "for $i = 1 to 3\necho $i * $i\nend\n");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["1", "4", "9"]);
}

#[test]
fn error_fails_the_run_and_is_reported() {
    let out = run_stdin(&[], "echo 'a'\necho $nope\necho 'b'\n");
    assert!(!out.status.success());
    assert_eq!(stdout_lines(&out), vec!["a"]);
    let err = stderr(&out);
    assert!(err.contains("ERROR:"), "{err}");
    assert!(err.contains("on line 2"), "{err}");
}

#[test]
fn keep_going_flag_still_stops_the_script_but_exits_cleanly() {
    let out = run_stdin(&["-k"], "echo 'a'\nend\necho 'b'\n");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["a"]);
}

#[test]
fn warnings_do_not_fail_the_run() {
    let out = run_stdin(&[], "var $x = 1\nvar $x = 2\necho $x\n");
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), vec!["1"]);
    assert!(stderr(&out).contains("WARNING:"));
}

#[test]
fn silent_flag_moves_echo_to_stderr() {
    let out = run_stdin(&["-s"], "echo 'hush'\n");
    assert!(out.status.success());
    assert!(stdout_lines(&out).is_empty());
    assert!(stderr(&out).contains("NOTICE: hush"));
}

#[test]
fn inline_code_runs_first() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "main.hds", "echo 'file'\n");
    let out = hades()
        .args(["-f", "-c", "echo 'inline'"])
        .arg(&script)
        .output()
        .expect("run hades");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["inline", "file"]);
}

#[test]
fn imports_resolve_beside_the_script() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib.hds", "function double $x\nreturn $x * 2\nend\n");
    let main = write(dir.path(), "main.hds", "import 'lib.hds'\necho {double 21}\n");
    let out = hades().arg("-f").arg(&main).output().expect("run hades");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["42"]);
}

#[test]
fn config_file_sets_import_dir_and_libs() {
    let dir = tempfile::tempdir().unwrap();
    let libdir = dir.path().join("lib");
    std::fs::create_dir(&libdir).unwrap();
    write(&libdir, "util.hds", "global $ready = 'yes'\n");
    let rc = write(
        dir.path(),
        "hadesrc",
        &format!("import_dir = {}\nlibs = math\n", libdir.display()),
    );
    let main = write(dir.path(), "main.hds", "import 'util.hds'\necho $ready\necho {math:sqrt 16}\n");

    let out = hades()
        .arg(format!("-f{}", rc.display()))
        .arg(&main)
        .output()
        .expect("run hades");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout_lines(&out), vec!["yes", "4"]);
}

#[test]
fn hadesrc_env_var_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let rc = write(dir.path(), "rc", "silent = on\n");
    let main = write(dir.path(), "main.hds", "echo 'x'\n");
    let out = hades().env("HADESRC", &rc).arg(&main).output().expect("run hades");
    assert!(out.status.success());
    assert!(stdout_lines(&out).is_empty());
}

#[test]
fn missing_script_file_fails() {
    let out = hades().args(["-f", "/definitely/not/here.hds"]).output().expect("run hades");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("here.hds"));
}

#[test]
fn bad_usage_prints_help() {
    let out = hades().output().expect("run hades");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Usage: hades"));
}
