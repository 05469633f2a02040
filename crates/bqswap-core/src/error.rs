// crates/bqswap-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("BigQuery request failed: {0}")]
    BigQuery(#[from] gcp_bigquery_client::error::BQError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Schema file error: {0}")]
    SchemaFile(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Load failed: {0}")]
    Load(String),

    #[error("Query failed: {0}")]
    Query(String),
}

pub type Result<T> = std::result::Result<T, SwapError>;
