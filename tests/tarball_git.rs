use std::error::Error;
use std::fs;
use std::path::Path;

use cmsbatch::errors::Error as CmsbatchError;
use cmsbatch::exec::Cmd;
use cmsbatch::tarball::{create_tarball, repo_toplevel};

type TestResult = Result<(), Box<dyn Error>>;

fn git_available() -> bool {
    Cmd::new("git")
        .arg("--version")
        .run_unchecked()
        .map(|(code, _)| code == 0)
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> TestResult {
    Cmd::new("git")
        .args(args.iter().copied())
        .current_dir(dir)
        .run()?;
    Ok(())
}

fn init_committed_repo(dir: &Path) -> TestResult {
    git(dir, &["init", "-q"])?;
    git(dir, &["config", "user.email", "tester@example.org"])?;
    git(dir, &["config", "user.name", "Tester"])?;
    fs::write(dir.join("README.md"), "test repo\n")?;
    git(dir, &["add", "."])?;
    git(dir, &["commit", "-q", "-m", "initial"])?;
    Ok(())
}

#[test]
fn toplevel_of_a_nested_path_is_the_repo_root() -> TestResult {
    if !git_available() {
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    init_committed_repo(dir.path())?;
    let nested = dir.path().join("sub/dir");
    fs::create_dir_all(&nested)?;

    let toplevel = repo_toplevel(&nested)?;
    assert_eq!(toplevel.canonicalize()?, dir.path().canonicalize()?);

    Ok(())
}

#[test]
fn a_clean_tree_is_archived() -> TestResult {
    if !git_available() {
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    init_committed_repo(dir.path())?;
    let outfile = dir.path().join("code.tar");

    let written = create_tarball(dir.path(), Some(outfile.as_path()), false)?;
    assert_eq!(written, outfile);
    assert!(outfile.is_file());
    assert!(fs::metadata(&outfile)?.len() > 0);

    Ok(())
}

#[test]
fn a_dirty_tree_is_refused() -> TestResult {
    if !git_available() {
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    init_committed_repo(dir.path())?;
    fs::write(dir.path().join("README.md"), "modified, not committed\n")?;

    let outfile = dir.path().join("code.tar");
    let err = create_tarball(dir.path(), Some(outfile.as_path()), false).unwrap_err();
    assert!(matches!(err, CmsbatchError::DirtyWorkingTree(_)));

    Ok(())
}

#[test]
fn dry_mode_returns_a_placeholder_without_touching_git() -> TestResult {
    let dir = tempfile::tempdir()?;

    // No git repo here at all; dry mode must still succeed.
    let tarball = create_tarball(dir.path(), None, true)?;
    assert!(!tarball.as_os_str().is_empty());

    Ok(())
}
