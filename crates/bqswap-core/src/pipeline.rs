use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gcp_bigquery_client::model::clustering::Clustering;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::time_partitioning::TimePartitioning;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Result, SwapError};
use crate::load;
use crate::locate;
use crate::schema::{self, ColumnSpec};
use crate::sql;
use crate::warehouse::Warehouse;

/// One step of the swap sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LocateCsv,
    ReadSourceMetadata,
    BuildSchema,
    CreateStagingTable,
    LoadCsv,
    StampIngestionColumn,
    SwapTables,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::LocateCsv => "locate csv",
            Step::ReadSourceMetadata => "read source metadata",
            Step::BuildSchema => "build schema",
            Step::CreateStagingTable => "create staging table",
            Step::LoadCsv => "load csv",
            Step::StampIngestionColumn => "stamp ingestion column",
            Step::SwapTables => "swap tables",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Completed(String),
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
}

impl StepReport {
    pub fn completed(step: Step, detail: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Completed(detail.into()),
        }
    }

    pub fn failed(step: Step, message: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Failed(message.into()),
        }
    }

    pub fn skipped(step: Step) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
}

impl MigrationReport {
    /// True only when every step completed.
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|step| matches!(step.status, StepStatus::Completed(_)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Keep attempting the remaining remote steps after one of them fails,
    /// the way the original export job behaved. The exit status still
    /// reflects the failures.
    pub keep_going: bool,
    /// Replace the source schema with a hand-authored column list.
    pub schema_override: Option<PathBuf>,
}

/// Run the full swap sequence. Step failures are recorded in the report
/// rather than returned; the caller decides what a failed run means.
///
/// Prerequisite steps (locating the CSV, reading source metadata, building
/// the schema) always end the run when they fail. The remote mutation steps
/// honor `keep_going`.
pub async fn run(
    warehouse: &Warehouse,
    config: &Config,
    options: &MigrationOptions,
) -> MigrationReport {
    let started_at = Utc::now();
    let mut steps = Vec::new();

    let csv_path = match locate::most_recent_csv(&config.downloads_dir) {
        Some(path) => {
            info!(csv = %path.display(), "selected most recent CSV");
            steps.push(StepReport::completed(
                Step::LocateCsv,
                path.display().to_string(),
            ));
            path
        }
        None => {
            steps.push(StepReport::failed(
                Step::LocateCsv,
                format!("no CSV files found in {}", config.downloads_dir.display()),
            ));
            return abandon(
                started_at,
                steps,
                &[
                    Step::ReadSourceMetadata,
                    Step::BuildSchema,
                    Step::CreateStagingTable,
                    Step::LoadCsv,
                    Step::StampIngestionColumn,
                    Step::SwapTables,
                ],
            );
        }
    };

    let mut source = match warehouse
        .get_table(&config.dataset_id, &config.source_table_id)
        .await
    {
        Ok(table) => {
            steps.push(StepReport::completed(
                Step::ReadSourceMetadata,
                config.qualified(&config.source_table_id),
            ));
            table
        }
        Err(err) => {
            error!(%err, "failed to read source table metadata");
            steps.push(StepReport::failed(Step::ReadSourceMetadata, err.to_string()));
            return abandon(
                started_at,
                steps,
                &[
                    Step::BuildSchema,
                    Step::CreateStagingTable,
                    Step::LoadCsv,
                    Step::StampIngestionColumn,
                    Step::SwapTables,
                ],
            );
        }
    };

    // Partitioning and clustering carry over verbatim whenever the source
    // has them.
    let partitioning = source.time_partitioning.take();
    let clustering = source.clustering.take();

    let columns = match build_columns(&source, options) {
        Ok(columns) => {
            steps.push(StepReport::completed(
                Step::BuildSchema,
                format!("{} columns", columns.len()),
            ));
            columns
        }
        Err(err) => {
            error!(%err, "failed to build destination schema");
            steps.push(StepReport::failed(Step::BuildSchema, err.to_string()));
            return abandon(
                started_at,
                steps,
                &[
                    Step::CreateStagingTable,
                    Step::LoadCsv,
                    Step::StampIngestionColumn,
                    Step::SwapTables,
                ],
            );
        }
    };

    let mut halt = false;

    match create_staging(warehouse, config, &columns, partitioning, clustering).await {
        Ok(detail) => steps.push(StepReport::completed(Step::CreateStagingTable, detail)),
        Err(err) => {
            error!(%err, "failed to create staging table");
            steps.push(StepReport::failed(Step::CreateStagingTable, err.to_string()));
            halt = !options.keep_going;
        }
    }

    if halt {
        steps.push(StepReport::skipped(Step::LoadCsv));
    } else {
        match load::load_csv(
            warehouse,
            &config.dataset_id,
            &config.staging_table_id,
            &columns,
            &csv_path,
        )
        .await
        {
            Ok(rows) => steps.push(StepReport::completed(
                Step::LoadCsv,
                format!("{rows} rows from {}", csv_path.display()),
            )),
            Err(err) => {
                error!(%err, "CSV load failed");
                steps.push(StepReport::failed(Step::LoadCsv, err.to_string()));
                halt = !options.keep_going;
            }
        }
    }

    if halt {
        steps.push(StepReport::skipped(Step::StampIngestionColumn));
    } else {
        let script = sql::backfill_ingestion_column(
            &config.project_id,
            &config.dataset_id,
            &config.staging_table_id,
            schema::INGESTED_AT_COLUMN,
        );
        match warehouse.run_script(script).await {
            Ok(()) => steps.push(StepReport::completed(
                Step::StampIngestionColumn,
                format!("{} backfilled", schema::INGESTED_AT_COLUMN),
            )),
            Err(err) => {
                error!(%err, "failed to stamp ingestion column");
                steps.push(StepReport::failed(
                    Step::StampIngestionColumn,
                    err.to_string(),
                ));
                halt = !options.keep_going;
            }
        }
    }

    if halt {
        steps.push(StepReport::skipped(Step::SwapTables));
    } else {
        match swap_tables(warehouse, config).await {
            Ok(detail) => steps.push(StepReport::completed(Step::SwapTables, detail)),
            Err(err) => {
                error!(%err, "table swap failed");
                steps.push(StepReport::failed(Step::SwapTables, err.to_string()));
            }
        }
    }

    MigrationReport {
        started_at,
        finished_at: Utc::now(),
        steps,
    }
}

fn build_columns(source: &Table, options: &MigrationOptions) -> Result<Vec<ColumnSpec>> {
    match &options.schema_override {
        Some(path) => load_override_columns(path),
        None => Ok(schema::strip_housekeeping(schema::columns_from_table(
            source,
        )?)),
    }
}

fn load_override_columns(path: &Path) -> Result<Vec<ColumnSpec>> {
    info!(schema_file = %path.display(), "replacing source schema with hand-authored column list");
    schema::load_override(path)
}

async fn create_staging(
    warehouse: &Warehouse,
    config: &Config,
    columns: &[ColumnSpec],
    partitioning: Option<TimePartitioning>,
    clustering: Option<Clustering>,
) -> Result<String> {
    let qualified = config.qualified(&config.staging_table_id);

    if warehouse
        .table_exists(&config.dataset_id, &config.staging_table_id)
        .await?
    {
        return Err(SwapError::TableAlreadyExists(qualified));
    }

    let mut table = Table::new(
        &config.project_id,
        &config.dataset_id,
        &config.staging_table_id,
        schema::to_table_schema(columns),
    );
    if partitioning.is_some() {
        info!("applying time partitioning from source table");
    }
    if clustering.is_some() {
        info!("applying clustering from source table");
    }
    table.time_partitioning = partitioning;
    table.clustering = clustering;

    warehouse.create_table(table).await?;
    info!(table = %qualified, "staging table created");
    Ok(qualified)
}

async fn swap_tables(warehouse: &Warehouse, config: &Config) -> Result<String> {
    warehouse
        .delete_table(&config.dataset_id, &config.source_table_id, true)
        .await?;
    info!(table = %config.source_table_id, "old source table deleted");

    let rename = sql::rename_table(
        &config.project_id,
        &config.dataset_id,
        &config.staging_table_id,
        &config.source_table_id,
    );
    warehouse.run_script(rename).await?;
    info!(
        from = %config.staging_table_id,
        to = %config.source_table_id,
        "staging table renamed into place"
    );

    Ok(format!(
        "{} -> {}",
        config.staging_table_id, config.source_table_id
    ))
}

fn abandon(
    started_at: DateTime<Utc>,
    mut steps: Vec<StepReport>,
    remaining: &[Step],
) -> MigrationReport {
    for step in remaining {
        steps.push(StepReport::skipped(*step));
    }
    MigrationReport {
        started_at,
        finished_at: Utc::now(),
        steps,
    }
}
