//! Integration Tests

#[macro_use]
extern crate lazy_static;


use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::process::Stdio;
use std::time::Duration;

use crate::workdir::{WorkDir, TEST_USER};

struct ScriptData<'a> {
    pub script: &'a str,
    pub stdout: &'a str,
    pub stderr: &'a str,
}

lazy_static! {
    static ref SIMPLE_SCRIPTS_MAP: HashMap<&'static str, ScriptData<'static>> = {
        let mut map = HashMap::new();
        map.insert("simple_echo", ScriptData {
            script: "echo test\n",
            stdout: "test\n",
            stderr: "",
        });
        map.insert("simple_external", ScriptData {
            script: "printf %s test\n",
            stdout: "test",
            stderr: "",
        });
        map.insert("simple_whitespace", ScriptData {
            script: "\n   \n\t echo   a\t\tb  \n",
            stdout: "a b\n",
            stderr: "",
        });
        map.insert("simple_redirects", ScriptData {
            script: "echo test output, please ignore > out\ncat < out\n",
            stdout: "test output, please ignore\n",
            stderr: "",
        });
        map.insert("simple_external_redirects", ScriptData {
            script: "printf %s\\n b a > unsorted\nsort < unsorted > sorted\ncat sorted\n",
            stdout: "a\nb\n",
            stderr: "",
        });
        map.insert("simple_variable", ScriptData {
            script: "echo $USER\n",
            stdout: "tester\n",
            stderr: "",
        });
        map.insert("simple_undefined_variable", ScriptData {
            script: "echo $MYSHELL_TEST_SURELY_UNDEFINED\necho after\n",
            stdout: "after\n",
            stderr: "myshell: $MYSHELL_TEST_SURELY_UNDEFINED: Undefined variable.\n",
        });
        map.insert("simple_command_not_found", ScriptData {
            script: "myshell-test-no-such-command arg\n",
            stdout: "",
            stderr: "myshell: myshell-test-no-such-command: Command not found.\n",
        });
        map.insert("simple_malformed_redirect", ScriptData {
            script: "echo hi >\n",
            stdout: "",
            stderr: "myshell: syntax error: expected a file name after '>'\n",
        });
        map.insert("simple_jobs_empty", ScriptData {
            script: "jobs\n",
            stdout: "",
            stderr: "",
        });
        map.insert("simple_exit", ScriptData {
            script: "exit\necho unreachable\n",
            stdout: "",
            stderr: "",
        });
        map
    };
}

#[test]
fn test_all_simple_scripts() {
    for (name, expected) in SIMPLE_SCRIPTS_MAP.iter() {
        let work_dir = WorkDir::new();
        let session = work_dir.run(expected.script);

        assert!(session.status.success(), "{}: {:?}", name, session);
        assert_eq!(session.stdout, expected.stdout, "{}: {:?}", name, session);
        assert_eq!(session.stderr, expected.stderr, "{}: {:?}", name, session);
    }
}

#[test]
fn test_prompt_format() {
    let work_dir = WorkDir::new();
    let mut child = work_dir.command().spawn().unwrap();
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b"echo hi\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let prompt = format!("{}@myshell:{}> ", TEST_USER, work_dir.path().display());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("{}hi\n{}", prompt, prompt)
    );
}

#[test]
fn test_end_of_file_exits_successfully() {
    let work_dir = WorkDir::new();
    let session = work_dir.run("");
    assert!(session.status.success(), "{:?}", session);
    assert_eq!(session.stdout, "");
}

#[test]
fn test_cd_changes_prompt_and_relative_paths() {
    let work_dir = WorkDir::new();
    fs::create_dir(work_dir.path().join("sub")).unwrap();
    work_dir.create("sub/file", "inside\n");

    let session = work_dir.run("cd sub\ncat file\n");
    let sub_prompt = WorkDir::prompt_in(work_dir.path().join("sub"));
    assert_eq!(session.stdout, format!("{}inside\n{}", sub_prompt, sub_prompt));
}

#[test]
fn test_cd_without_arguments_goes_home() {
    let work_dir = WorkDir::new();
    fs::create_dir(work_dir.path().join("sub")).unwrap();

    // HOME is the work dir, so prompts after `cd` are stripped again
    let session = work_dir.run("cd sub\ncd\necho back\n");
    let sub_prompt = WorkDir::prompt_in(work_dir.path().join("sub"));
    assert_eq!(session.stdout, format!("{}back\n", sub_prompt));
}

#[test]
fn test_cd_nonexistent_directory() {
    let work_dir = WorkDir::new();
    let session = work_dir.run("cd missing\necho still here\n");

    assert_eq!(session.stdout, "still here\n");
    assert!(
        session.stderr.starts_with("myshell: missing: "),
        "{:?}",
        session
    );
}

#[test]
fn test_builtin_redirection() {
    let work_dir = WorkDir::new();
    let session = work_dir.run("echo to file > out\n");
    assert_eq!(session.stdout, "");
    assert_eq!(work_dir.read("out"), "to file\n");

    let mode = fs::metadata(work_dir.path().join("out"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o077, 0, "{:o}", mode);
}

#[test]
fn test_missing_input_file_only_fails_the_command() {
    let work_dir = WorkDir::new();
    let session = work_dir.run("cat < missing\necho next\n");

    assert!(session.status.success(), "{:?}", session);
    assert_eq!(session.stdout, "next\n");
    assert!(
        session.stderr.starts_with("myshell: missing: "),
        "{:?}",
        session
    );
}

#[test]
fn test_search_path_unset() {
    let work_dir = WorkDir::new();
    let mut cmd = work_dir.command();
    cmd.env_remove("PATH");

    let session = work_dir.run_command(cmd, "ls\necho builtins still work\n");
    assert_eq!(session.stdout, "builtins still work\n");
    assert_eq!(
        session.stderr,
        "myshell: ls: unable to search for command: PATH is not set\n"
    );
}

#[test]
fn test_background_job_is_reported_done_once() {
    let work_dir = WorkDir::new();
    let session = work_dir.run("sleep 0 &\nsleep 1\necho first\njobs\necho second\n");

    let lines: Vec<&str> = session.stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{:?}", session);
    assert!(lines[0].starts_with("[1] "), "{:?}", session);
    assert!(
        lines[0]["[1] ".len()..].parse::<u32>().is_ok(),
        "{:?}",
        session
    );
    assert_eq!(&lines[1..], &["[1] Done sleep 0", "first", "second"]);
}

#[test]
fn test_background_jobs_are_numbered_and_listed() {
    let work_dir = WorkDir::new();
    let session = work_dir.run("sleep 1 &\nsleep 1 &\njobs\nexit\n");
    assert!(session.status.success(), "{:?}", session);

    let lines: Vec<&str> = session.stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{:?}", session);
    let first_pid = lines[0].trim_start_matches("[1] ");
    let second_pid = lines[1].trim_start_matches("[2] ");
    assert_ne!(first_pid, second_pid);
    assert_eq!(lines[2], format!("[1] {} sleep 1", first_pid));
    assert_eq!(lines[3], format!("[2] {} sleep 1", second_pid));
}

#[test]
fn test_unreadable_log_path_does_not_stop_the_shell() {
    let work_dir = WorkDir::new();
    let mut cmd = work_dir.command();
    cmd.env("MYSHELL_LOG", work_dir.path().join("no-such-dir").join("log"));

    let session = work_dir.run_command(cmd, "echo ok\n");
    assert!(session.status.success(), "{:?}", session);
    assert_eq!(session.stdout, "ok\n");
    assert!(session.stderr.contains("unable to open log file"));
}

#[test]
fn test_invalid_utf8_line_still_runs() {
    let work_dir = WorkDir::new();
    let session = work_dir.run(&b"echo caf\xe9\necho after\n"[..]);

    assert!(session.status.success(), "{:?}", session);
    assert_eq!(session.stdout, "caf\u{fffd}\nafter\n");
    assert_eq!(session.stderr, "");
}

#[test]
fn test_unreadable_stdin_exits() {
    let work_dir = WorkDir::new();
    let mut cmd = work_dir.command();
    cmd.stdin(Stdio::from(
        File::open(work_dir.path()).expect("unable to open work dir"),
    ));

    let session = work_dir.run_with_limit(cmd, Duration::from_secs(10));
    assert!(session.status.success(), "{:?}", session);
    assert_eq!(session.stdout, "");
    assert_eq!(session.stderr.lines().count(), 1, "{:?}", session);
    assert!(session.stderr.starts_with("myshell: "), "{:?}", session);
}
