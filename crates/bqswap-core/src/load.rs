use std::path::Path;

use csv::StringRecord;
use gcp_bigquery_client::model::field_type::FieldType;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{Result, SwapError};
use crate::schema::{field_type_name, ColumnSpec};
use crate::warehouse::Warehouse;

/// Rows per insert request. BigQuery caps request payloads and the exports
/// this tool handles carry wide rows, so batches stay small.
const INSERT_BATCH_ROWS: usize = 500;

/// Stream a CSV file into `dataset.table`, skipping the header row and
/// converting every cell against the destination schema. Returns the number
/// of rows inserted.
pub async fn load_csv(
    warehouse: &Warehouse,
    dataset_id: &str,
    table_id: &str,
    columns: &[ColumnSpec],
    path: &Path,
) -> Result<u64> {
    info!(csv = %path.display(), table = table_id, "starting CSV load");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let header_width = reader.headers()?.len();
    if header_width != columns.len() {
        return Err(SwapError::Load(format!(
            "CSV has {header_width} columns but the destination schema has {}",
            columns.len()
        )));
    }

    let mut batch = Vec::with_capacity(INSERT_BATCH_ROWS);
    let mut total: u64 = 0;

    for record in reader.records() {
        let record = record?;
        batch.push(record_to_row(columns, &record)?);
        if batch.len() == INSERT_BATCH_ROWS {
            total += batch.len() as u64;
            warehouse
                .insert_rows(dataset_id, table_id, std::mem::take(&mut batch))
                .await?;
            debug!(rows = total, "batch inserted");
        }
    }

    if !batch.is_empty() {
        total += batch.len() as u64;
        warehouse.insert_rows(dataset_id, table_id, batch).await?;
    }

    info!(rows = total, table = table_id, "CSV load finished");
    Ok(total)
}

fn record_to_row(columns: &[ColumnSpec], record: &StringRecord) -> Result<Map<String, Value>> {
    if record.len() != columns.len() {
        return Err(SwapError::Load(format!(
            "row at line {} has {} fields, expected {}",
            record.position().map(|p| p.line()).unwrap_or(0),
            record.len(),
            columns.len()
        )));
    }

    let mut row = Map::with_capacity(columns.len());
    for (column, raw) in columns.iter().zip(record.iter()) {
        row.insert(column.name.clone(), cell_to_value(column, raw)?);
    }
    Ok(row)
}

/// Schema-constrained cell conversion; the load never autodetects types.
fn cell_to_value(column: &ColumnSpec, raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parse_error = || {
        SwapError::Load(format!(
            "column `{}`: cannot parse `{raw}` as {}",
            column.name,
            field_type_name(&column.field_type)
        ))
    };

    let value = match column.field_type {
        FieldType::Integer | FieldType::Int64 => {
            json!(trimmed.parse::<i64>().map_err(|_| parse_error())?)
        }
        FieldType::Float | FieldType::Float64 => {
            json!(trimmed.parse::<f64>().map_err(|_| parse_error())?)
        }
        FieldType::Boolean | FieldType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => json!(true),
            "false" | "0" => json!(false),
            _ => return Err(parse_error()),
        },
        // NUMERIC and BIGNUMERIC stay textual so the warehouse keeps full
        // decimal precision; timestamps and the rest pass through in the
        // export's own formatting.
        _ => Value::String(raw.to_string()),
    };
    Ok(value)
}
