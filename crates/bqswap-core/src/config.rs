use std::env;
use std::path::PathBuf;

use crate::error::{Result, SwapError};

/// Runtime configuration for one swap run, resolved from the environment
/// once and passed explicitly to every step.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: String,
    pub dataset_id: String,
    pub source_table_id: String,
    pub staging_table_id: String,
    pub downloads_dir: PathBuf,
    /// Service-account key file; when absent the client falls back to
    /// application-default credentials.
    pub service_account_key: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            project_id: required_var("ID_BQ_PROJECT")?,
            dataset_id: required_var("ID_DATASET")?,
            source_table_id: required_var("ID_TABLE_SOURCE")?,
            staging_table_id: required_var("ID_TABLE_NEW")?,
            downloads_dir: PathBuf::from(required_var("PATH_LOCAL_DOWNLOADS")?),
            service_account_key: env::var("GOOGLE_APPLICATION_CREDENTIALS")
                .ok()
                .map(PathBuf::from),
        })
    }

    /// Fully qualified `project.dataset.table` identifier.
    pub fn qualified(&self, table_id: &str) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, table_id)
    }
}

fn required_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SwapError::Config(format!("{name} must be set"))),
    }
}
