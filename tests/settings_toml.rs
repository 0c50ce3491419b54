use std::error::Error;
use std::fs;

use cmsbatch::config::{JobEnvironment, Settings, load_or_default};
use cmsbatch::config::env::{BATCH_MODE_VAR, CONDOR_SCRATCH_VAR};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn defaults_match_the_lpc_setup() {
    let settings = Settings::default();

    assert_eq!(settings.storage.default_mgm, "root://cmseos.fnal.gov");
    assert_eq!(settings.condor.starting_seed, 1001);
    assert_eq!(settings.condor.n_events, 20);
    assert_eq!(settings.cmssw.default_scram_arch, "slc7_amd64_gcc493");
    assert_eq!(
        settings.cmssw.setup_script,
        "/cvmfs/cms.cern.ch/cmsset_default.sh"
    );
}

#[test]
fn a_missing_config_file_falls_back_to_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let settings = load_or_default(dir.path().join("Cmsbatch.toml"))?;

    assert_eq!(settings.storage.default_mgm, "root://cmseos.fnal.gov");

    Ok(())
}

#[test]
fn partial_config_files_keep_defaults_for_missing_sections() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Cmsbatch.toml");
    fs::write(
        &config,
        r#"
[condor]
starting_seed = 5001
"#,
    )?;

    let settings = load_or_default(&config)?;
    assert_eq!(settings.condor.starting_seed, 5001);
    assert_eq!(settings.storage.default_mgm, "root://cmseos.fnal.gov");

    Ok(())
}

#[test]
fn a_non_root_mgm_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("Cmsbatch.toml");
    fs::write(
        &config,
        r#"
[storage]
default_mgm = "https://cmseos.fnal.gov"
"#,
    )?;

    assert!(load_or_default(&config).is_err());

    Ok(())
}

#[test]
fn job_environment_scratch_dir_follows_batch_mode() -> TestResult {
    let settings = Settings::default();

    // Outside batch mode the configured scratch root is used.
    unsafe {
        std::env::remove_var(BATCH_MODE_VAR);
    }
    let local = JobEnvironment::detect(&settings)?;
    assert!(!local.batch_mode);
    assert_eq!(local.scratch_dir, settings.job.scratch_root);

    // Batch mode without a condor scratch dir is an error.
    unsafe {
        std::env::set_var(BATCH_MODE_VAR, "lpc");
        std::env::remove_var(CONDOR_SCRATCH_VAR);
    }
    assert!(JobEnvironment::detect(&settings).is_err());

    // Batch mode with a condor scratch dir nests under it.
    unsafe {
        std::env::set_var(CONDOR_SCRATCH_VAR, "/scratch/job123");
    }
    let batch = JobEnvironment::detect(&settings)?;
    assert!(batch.batch_mode);
    assert_eq!(
        batch.scratch_dir,
        std::path::Path::new("/scratch/job123/cmsbatch")
    );

    unsafe {
        std::env::remove_var(BATCH_MODE_VAR);
        std::env::remove_var(CONDOR_SCRATCH_VAR);
    }

    Ok(())
}
