use std::path::Path;

use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::model::query_request::QueryRequest;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use gcp_bigquery_client::Client;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Result, SwapError};

/// Async wrapper around the BigQuery client, scoped to a single project.
pub struct Warehouse {
    project_id: String,
    client: Client,
}

impl Warehouse {
    /// Authenticate with a service-account key file when one is configured,
    /// otherwise fall back to application-default credentials (the
    /// `gcloud auth application-default login` flow).
    pub async fn connect(project_id: &str, service_account_key: Option<&Path>) -> Result<Self> {
        let client = match service_account_key {
            Some(path) => {
                info!(key = %path.display(), "authenticating with service account key");
                Client::from_service_account_key_file(&path.to_string_lossy()).await?
            }
            None => {
                info!("authenticating with application-default credentials");
                Client::from_application_default_credentials().await?
            }
        };

        Ok(Self {
            project_id: project_id.to_string(),
            client,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Fetch table metadata; a missing table is a `TableNotFound` error.
    pub async fn get_table(&self, dataset_id: &str, table_id: &str) -> Result<Table> {
        match self
            .client
            .table()
            .get(&self.project_id, dataset_id, table_id, None)
            .await
        {
            Ok(table) => Ok(table),
            Err(err) if is_not_found(&err) => Err(SwapError::TableNotFound(format!(
                "{}.{dataset_id}.{table_id}",
                self.project_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn table_exists(&self, dataset_id: &str, table_id: &str) -> Result<bool> {
        match self
            .client
            .table()
            .get(&self.project_id, dataset_id, table_id, None)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn create_table(&self, table: Table) -> Result<()> {
        self.client.table().create(table).await?;
        Ok(())
    }

    /// Delete a table; with `not_found_ok` a missing table is not an error.
    pub async fn delete_table(
        &self,
        dataset_id: &str,
        table_id: &str,
        not_found_ok: bool,
    ) -> Result<()> {
        match self
            .client
            .table()
            .delete(&self.project_id, dataset_id, table_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if not_found_ok && is_not_found(&err) => {
                debug!(table = table_id, "table already absent, nothing to delete");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Run a DDL/DML script as a query job and wait for it to finish.
    pub async fn run_script(&self, sql: String) -> Result<()> {
        debug!(%sql, "running query job");
        let response = self
            .client
            .job()
            .query(&self.project_id, QueryRequest::new(sql))
            .await?;

        if !response.job_complete.unwrap_or(false) {
            return Err(SwapError::Query("query job did not complete".to_string()));
        }
        Ok(())
    }

    /// Insert one batch of rows, surfacing per-row errors as a load failure.
    pub async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        rows: Vec<Map<String, Value>>,
    ) -> Result<()> {
        let count = rows.len();
        let mut request = TableDataInsertAllRequest::new();
        for row in rows {
            request.add_row(None, row)?;
        }

        let response = self
            .client
            .tabledata()
            .insert_all(&self.project_id, dataset_id, table_id, request)
            .await?;

        if let Some(errors) = response.insert_errors {
            if !errors.is_empty() {
                return Err(SwapError::Load(format!(
                    "{} of {count} rows were rejected (first: {:?})",
                    errors.len(),
                    errors.first()
                )));
            }
        }
        Ok(())
    }
}

fn is_not_found(err: &BQError) -> bool {
    let message = err.to_string();
    message.contains("Not found") || message.contains("404")
}
