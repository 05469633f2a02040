use std::path::Path;

use gcp_bigquery_client::model::field_type::FieldType;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_field_schema::TableFieldSchema;
use gcp_bigquery_client::model::table_schema::TableSchema;
use serde::Deserialize;

use crate::error::{Result, SwapError};

/// Housekeeping column stamped after every load; never carried over from
/// the source schema.
pub const INGESTED_AT_COLUMN: &str = "ingested_at";

/// A single destination column, in warehouse order.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub field_type: FieldType,
}

// `FieldType` (from gcp-bigquery-client) does not implement `PartialEq`, so the
// derive cannot expand. For a fieldless enum a derived `PartialEq` is exactly
// discriminant equality, which this reproduces by hand.
impl PartialEq for ColumnSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && std::mem::discriminant(&self.field_type)
                == std::mem::discriminant(&other.field_type)
    }
}

/// Read the ordered column list out of a fetched table.
pub fn columns_from_table(table: &Table) -> Result<Vec<ColumnSpec>> {
    let fields = table.schema.fields.as_ref().ok_or_else(|| {
        SwapError::Query("source table returned a schema without fields".to_string())
    })?;

    Ok(fields
        .iter()
        .map(|field| ColumnSpec {
            name: field.name.clone(),
            field_type: field.r#type.clone(),
        })
        .collect())
}

/// Drop every housekeeping column, preserving the order of the rest.
pub fn strip_housekeeping(columns: Vec<ColumnSpec>) -> Vec<ColumnSpec> {
    columns
        .into_iter()
        .filter(|column| column.name != INGESTED_AT_COLUMN)
        .collect()
}

#[derive(Debug, Deserialize)]
struct OverrideFile {
    #[serde(default, rename = "column")]
    columns: Vec<OverrideColumn>,
}

#[derive(Debug, Deserialize)]
struct OverrideColumn {
    name: String,
    #[serde(rename = "type")]
    type_tag: String,
}

/// Load a hand-authored column list that replaces the source schema
/// entirely. The file is a TOML array of tables:
///
/// ```toml
/// [[column]]
/// name = "internal_id"
/// type = "STRING"
/// ```
pub fn load_override(path: &Path) -> Result<Vec<ColumnSpec>> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: OverrideFile = toml::from_str(&raw)?;

    if parsed.columns.is_empty() {
        return Err(SwapError::Config(format!(
            "schema file {} declares no columns",
            path.display()
        )));
    }

    parsed
        .columns
        .into_iter()
        .map(|column| {
            Ok(ColumnSpec {
                field_type: parse_field_type(&column.type_tag)?,
                name: column.name,
            })
        })
        .collect()
}

/// Map a BigQuery type tag to the client's `FieldType`.
pub fn parse_field_type(tag: &str) -> Result<FieldType> {
    let field_type = match tag.trim().to_ascii_uppercase().as_str() {
        "STRING" => FieldType::String,
        "BYTES" => FieldType::Bytes,
        "INTEGER" => FieldType::Integer,
        "INT64" => FieldType::Int64,
        "FLOAT" => FieldType::Float,
        "FLOAT64" => FieldType::Float64,
        "NUMERIC" => FieldType::Numeric,
        "BIGNUMERIC" => FieldType::Bignumeric,
        "BOOLEAN" => FieldType::Boolean,
        "BOOL" => FieldType::Bool,
        "TIMESTAMP" => FieldType::Timestamp,
        "DATE" => FieldType::Date,
        "TIME" => FieldType::Time,
        "DATETIME" => FieldType::Datetime,
        "GEOGRAPHY" => FieldType::Geography,
        "JSON" => FieldType::Json,
        other => {
            return Err(SwapError::Config(format!(
                "unsupported column type `{other}`"
            )))
        }
    };
    Ok(field_type)
}

/// The tag BigQuery DDL and logs use for a `FieldType`.
pub fn field_type_name(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::String => "STRING",
        FieldType::Bytes => "BYTES",
        FieldType::Integer => "INTEGER",
        FieldType::Int64 => "INT64",
        FieldType::Float => "FLOAT",
        FieldType::Float64 => "FLOAT64",
        FieldType::Numeric => "NUMERIC",
        FieldType::Bignumeric => "BIGNUMERIC",
        FieldType::Boolean => "BOOLEAN",
        FieldType::Bool => "BOOL",
        FieldType::Timestamp => "TIMESTAMP",
        FieldType::Date => "DATE",
        FieldType::Time => "TIME",
        FieldType::Datetime => "DATETIME",
        FieldType::Geography => "GEOGRAPHY",
        FieldType::Json => "JSON",
        _ => "STRUCT",
    }
}

/// Build the staging table schema; every column is NULLABLE like the
/// original export.
pub fn to_table_schema(columns: &[ColumnSpec]) -> TableSchema {
    let fields = columns
        .iter()
        .map(|column| {
            let mut field = TableFieldSchema::new(&column.name, column.field_type.clone());
            field.mode = Some("NULLABLE".to_string());
            field
        })
        .collect();
    TableSchema::new(fields)
}
