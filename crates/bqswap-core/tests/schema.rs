use std::io::Write;

use bqswap_core::schema::{
    field_type_name, load_override, parse_field_type, strip_housekeeping, to_table_schema,
    ColumnSpec, INGESTED_AT_COLUMN,
};
use gcp_bigquery_client::model::field_type::FieldType;

fn column(name: &str, field_type: FieldType) -> ColumnSpec {
    ColumnSpec {
        name: name.to_string(),
        field_type,
    }
}

#[test]
fn strip_housekeeping_drops_only_the_ingestion_column() {
    let columns = vec![
        column("id", FieldType::Integer),
        column(INGESTED_AT_COLUMN, FieldType::Timestamp),
        column("sku", FieldType::String),
    ];

    let stripped = strip_housekeeping(columns);

    assert_eq!(
        stripped,
        vec![
            column("id", FieldType::Integer),
            column("sku", FieldType::String),
        ]
    );
}

#[test]
fn strip_housekeeping_is_a_no_op_without_the_column() {
    let columns = vec![
        column("id", FieldType::Integer),
        column("amount", FieldType::Numeric),
    ];
    assert_eq!(strip_housekeeping(columns.clone()), columns);
}

#[test]
fn field_type_tags_round_trip() {
    for tag in [
        "STRING",
        "BYTES",
        "INTEGER",
        "INT64",
        "FLOAT",
        "FLOAT64",
        "NUMERIC",
        "BIGNUMERIC",
        "BOOLEAN",
        "BOOL",
        "TIMESTAMP",
        "DATE",
        "TIME",
        "DATETIME",
        "GEOGRAPHY",
        "JSON",
    ] {
        let parsed = parse_field_type(tag).expect(tag);
        assert_eq!(field_type_name(&parsed), tag);
    }
}

#[test]
fn field_type_parsing_is_case_insensitive() {
    assert_eq!(
        parse_field_type("timestamp").unwrap(),
        FieldType::Timestamp
    );
    assert_eq!(parse_field_type(" int64 ").unwrap(), FieldType::Int64);
}

#[test]
fn unknown_field_type_is_rejected() {
    let err = parse_field_type("VARCHAR").unwrap_err();
    assert!(err.to_string().contains("VARCHAR"));
}

#[test]
fn override_file_preserves_column_order() {
    let mut file = tempfile::NamedTempFile::new().expect("temp schema file");
    write!(
        file,
        r#"
[[column]]
name = "last_modified_at"
type = "TIMESTAMP"

[[column]]
name = "internal_id"
type = "STRING"

[[column]]
name = "quantity"
type = "INTEGER"
"#
    )
    .expect("write schema file");

    let columns = load_override(file.path()).expect("load override");

    assert_eq!(
        columns,
        vec![
            column("last_modified_at", FieldType::Timestamp),
            column("internal_id", FieldType::String),
            column("quantity", FieldType::Integer),
        ]
    );
}

#[test]
fn override_file_without_columns_is_rejected() {
    let file = tempfile::NamedTempFile::new().expect("temp schema file");
    assert!(load_override(file.path()).is_err());
}

#[test]
fn table_schema_marks_every_field_nullable() {
    let columns = vec![
        column("id", FieldType::Integer),
        column("sku", FieldType::String),
    ];

    let table_schema = to_table_schema(&columns);
    let fields = table_schema.fields.expect("fields");

    assert_eq!(fields.len(), 2);
    for field in &fields {
        assert_eq!(field.mode.as_deref(), Some("NULLABLE"));
    }
    assert_eq!(fields[0].name, "id");
    assert_eq!(fields[1].name, "sku");
}
