use std::error::Error;
use std::fs;

use cmsbatch::config::Directives;
use cmsbatch::errors::Error as CmsbatchError;

type TestResult = Result<(), Box<dyn Error>>;

const PAYLOAD: &str = r#"#!/bin/bash
#$ n_jobs = 50
#$ SEED=2001
# a normal comment, not a directive
#$ malformed directive without equals
#$ cmssw_tarball = /path/to/CMSSW_10_2_21.tar.gz
echo "payload body"
"#;

#[test]
fn directive_lines_are_parsed_and_keys_case_folded() -> TestResult {
    let directives = Directives::parse(PAYLOAD);

    assert_eq!(directives.get("n_jobs"), Some("50"));
    assert_eq!(directives.get("seed"), Some("2001"));
    assert_eq!(
        directives.get("cmssw_tarball"),
        Some("/path/to/CMSSW_10_2_21.tar.gz")
    );

    Ok(())
}

#[test]
fn lines_without_equals_are_skipped() {
    let directives = Directives::parse("#$ no equals here\n");
    assert!(directives.is_empty());
}

#[test]
fn non_directive_lines_are_ignored() {
    let directives = Directives::parse("echo hello\n# plain comment\n");
    assert!(directives.is_empty());
}

#[test]
fn later_duplicate_keys_win() {
    let directives = Directives::parse("#$ seed = 1\n#$ seed = 2\n");
    assert_eq!(directives.get("seed"), Some("2"));
}

#[test]
fn typed_getters_parse_values() -> TestResult {
    let directives = Directives::parse("#$ n_jobs = 50\n");

    let n_jobs: Option<usize> = directives.get_parsed("n_jobs")?;
    assert_eq!(n_jobs, Some(50));

    let absent: Option<usize> = directives.get_parsed("n_events")?;
    assert_eq!(absent, None);

    Ok(())
}

#[test]
fn typed_getters_reject_unparsable_values() {
    let directives = Directives::parse("#$ n_jobs = soon\n");
    let err = directives.get_parsed::<usize>("n_jobs").unwrap_err();

    assert!(matches!(
        err,
        CmsbatchError::Directive { ref key, ref value } if key == "n_jobs" && value == "soon"
    ));
}

#[test]
fn directives_can_be_read_from_a_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let payload = dir.path().join("payload.sh");
    fs::write(&payload, PAYLOAD)?;

    let directives = Directives::from_file(&payload)?;
    assert_eq!(directives.get("n_jobs"), Some("50"));

    Ok(())
}
