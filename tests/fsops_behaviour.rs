use std::error::Error;
use std::fs;

use cmsbatch::errors::Error as CmsbatchError;
use cmsbatch::fsops::{
    CreateMode, copy_file, create_directory, remove_dir, remove_file, unique_path,
};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn keep_mode_leaves_an_existing_directory_alone() -> TestResult {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("run");

    assert!(create_directory(&target, CreateMode::Keep, false)?);
    fs::write(target.join("marker"), "x")?;

    assert!(!create_directory(&target, CreateMode::Keep, false)?);
    assert!(target.join("marker").is_file());

    Ok(())
}

#[test]
fn force_mode_recreates_the_directory_tree() -> TestResult {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("run");
    fs::create_dir(&target)?;
    fs::write(target.join("marker"), "x")?;

    assert!(create_directory(&target, CreateMode::Force, false)?);
    assert!(target.is_dir());
    assert!(!target.join("marker").exists());

    Ok(())
}

#[test]
fn must_not_exist_rejects_an_existing_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("run");
    fs::create_dir(&target)?;

    let err = create_directory(&target, CreateMode::MustNotExist, false).unwrap_err();
    assert!(matches!(err, CmsbatchError::DirectoryExists(_)));

    Ok(())
}

#[test]
fn dry_mode_creates_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("run");

    assert!(create_directory(&target, CreateMode::Keep, true)?);
    assert!(!target.exists());

    Ok(())
}

#[test]
fn unique_path_probes_numbered_candidates() -> TestResult {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("output.tar");

    assert_eq!(unique_path(&base)?, base);

    fs::write(&base, "x")?;
    let first = unique_path(&base)?;
    assert_eq!(first, dir.path().join("output.tar_1"));

    fs::write(&first, "x")?;
    assert_eq!(unique_path(&base)?, dir.path().join("output.tar_2"));

    Ok(())
}

#[test]
fn remove_file_tolerates_missing_files() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("gone");

    remove_file(&file)?;

    fs::write(&file, "x")?;
    remove_file(&file)?;
    assert!(!file.exists());

    Ok(())
}

#[test]
fn remove_dir_tolerates_missing_directories() -> TestResult {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("gone");

    remove_dir(&target)?;

    fs::create_dir(&target)?;
    fs::write(target.join("file"), "x")?;
    remove_dir(&target)?;
    assert!(!target.exists());

    Ok(())
}

#[test]
fn copy_file_copies_contents() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("b.txt");
    fs::write(&src, "payload")?;

    copy_file(&src, &dst, false)?;
    assert_eq!(fs::read_to_string(&dst)?, "payload");

    Ok(())
}
