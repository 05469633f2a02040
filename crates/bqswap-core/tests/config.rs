use std::env;
use std::path::Path;

use bqswap_core::config::Config;

// Environment variables are process-global, so everything lives in a single
// test function.
#[test]
fn from_env_reads_and_validates() {
    env::set_var("ID_BQ_PROJECT", "proj");
    env::set_var("ID_DATASET", "ds");
    env::set_var("ID_TABLE_SOURCE", "live");
    env::set_var("ID_TABLE_NEW", "stage");
    env::set_var("PATH_LOCAL_DOWNLOADS", "/tmp/downloads");
    env::remove_var("GOOGLE_APPLICATION_CREDENTIALS");

    let config = Config::from_env().expect("complete environment");
    assert_eq!(config.project_id, "proj");
    assert_eq!(config.dataset_id, "ds");
    assert_eq!(config.source_table_id, "live");
    assert_eq!(config.staging_table_id, "stage");
    assert_eq!(config.downloads_dir, Path::new("/tmp/downloads"));
    assert!(config.service_account_key.is_none());
    assert_eq!(config.qualified("stage"), "proj.ds.stage");

    env::set_var("GOOGLE_APPLICATION_CREDENTIALS", "/tmp/key.json");
    let config = Config::from_env().expect("complete environment");
    assert_eq!(
        config.service_account_key.as_deref(),
        Some(Path::new("/tmp/key.json"))
    );

    env::set_var("ID_DATASET", "  ");
    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("ID_DATASET"));

    env::remove_var("ID_DATASET");
    assert!(Config::from_env().is_err());
}
