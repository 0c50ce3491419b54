use std::error::Error;

use cmsbatch::errors::Error as CmsbatchError;
use cmsbatch::exec::{Cmd, ScopedDir, ShellSession, run_command};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn run_captures_output_lines() -> TestResult {
    let lines = Cmd::new("sh")
        .args(["-c", "echo first; echo second"])
        .run()?;

    assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);

    Ok(())
}

#[test]
fn stderr_is_merged_into_the_captured_output() -> TestResult {
    let lines = Cmd::new("sh").args(["-c", "echo oops >&2"]).run()?;

    assert_eq!(lines, vec!["oops".to_string()]);

    Ok(())
}

#[test]
fn nonzero_exit_becomes_command_failed() {
    let err = Cmd::new("sh").args(["-c", "exit 3"]).run().unwrap_err();

    assert!(matches!(
        err,
        CmsbatchError::CommandFailed { code: 3, .. }
    ));
}

#[test]
fn run_unchecked_reports_the_exit_code() -> TestResult {
    let (code, lines) = Cmd::new("sh")
        .args(["-c", "echo partial; exit 3"])
        .run_unchecked()?;

    assert_eq!(code, 3);
    assert_eq!(lines, vec!["partial".to_string()]);

    Ok(())
}

#[test]
fn dry_mode_never_spawns() -> TestResult {
    let lines = Cmd::new("definitely-not-an-installed-tool")
        .arg("--frobnicate")
        .dry(true)
        .run()?;

    assert!(lines.is_empty());

    Ok(())
}

#[test]
fn run_command_takes_a_full_argv() -> TestResult {
    let lines = run_command(["echo", "hello"])?;

    assert_eq!(lines, vec!["hello".to_string()]);

    Ok(())
}

#[test]
fn environment_variables_reach_the_child() -> TestResult {
    let lines = Cmd::new("sh")
        .args(["-c", "echo $CMSBATCH_TEST_VALUE"])
        .env("CMSBATCH_TEST_VALUE", "42")
        .run()?;

    assert_eq!(lines, vec!["42".to_string()]);

    Ok(())
}

#[test]
fn shell_session_state_threads_across_commands() -> TestResult {
    let dir = tempfile::tempdir()?;

    let lines = ShellSession::new()
        .cmd(format!("cd {}", dir.path().display()))
        .cmd("export CMSBATCH_SESSION_VALUE=carried")
        .cmd("echo $CMSBATCH_SESSION_VALUE")
        .cmd("pwd")
        .run()?;

    assert!(lines.contains(&"carried".to_string()));
    let real_dir = dir.path().canonicalize()?;
    assert!(
        lines
            .iter()
            .any(|l| l == &real_dir.display().to_string()
                || l == &dir.path().display().to_string())
    );

    Ok(())
}

#[test]
fn shell_session_stops_at_the_first_failure() {
    let err = ShellSession::new()
        .cmd("echo before")
        .cmd("false")
        .cmd("echo after")
        .run()
        .unwrap_err();

    assert!(matches!(err, CmsbatchError::CommandFailed { code: 1, .. }));
}

#[test]
fn scoped_dir_restores_the_previous_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    let before = std::env::current_dir()?;

    {
        let _guard = ScopedDir::change(dir.path())?;
        assert_eq!(
            std::env::current_dir()?,
            dir.path().canonicalize()?
        );
    }
    assert_eq!(std::env::current_dir()?, before);

    Ok(())
}

#[test]
fn dry_shell_session_never_spawns() {
    let lines = ShellSession::new()
        .cmd("definitely-not-an-installed-tool")
        .dry(true)
        .run()
        .expect("dry session must not fail");

    assert!(lines.is_empty());
}
