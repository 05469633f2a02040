//! DDL/DML statement builders for the finalize and swap steps.

/// Multi-statement script that adds the ingestion column, gives it a
/// `CURRENT_TIMESTAMP()` default, and backfills every existing row.
pub fn backfill_ingestion_column(
    project_id: &str,
    dataset_id: &str,
    table_id: &str,
    column: &str,
) -> String {
    format!(
        "ALTER TABLE `{project_id}.{dataset_id}.{table_id}` ADD COLUMN {column} TIMESTAMP;\n\
         ALTER TABLE `{project_id}.{dataset_id}.{table_id}` ALTER COLUMN {column} SET DEFAULT CURRENT_TIMESTAMP();\n\
         UPDATE `{project_id}.{dataset_id}.{table_id}` SET {column} = CURRENT_TIMESTAMP() WHERE TRUE;"
    )
}

/// Rename `from` to `to` within the same dataset.
pub fn rename_table(project_id: &str, dataset_id: &str, from: &str, to: &str) -> String {
    format!("ALTER TABLE `{project_id}.{dataset_id}.{from}` RENAME TO `{to}`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_script_contains_all_three_statements() {
        let script = backfill_ingestion_column("proj", "ds", "stage", "ingested_at");

        assert!(script.contains("ALTER TABLE `proj.ds.stage` ADD COLUMN ingested_at TIMESTAMP;"));
        assert!(script.contains(
            "ALTER TABLE `proj.ds.stage` ALTER COLUMN ingested_at SET DEFAULT CURRENT_TIMESTAMP();"
        ));
        assert!(script
            .contains("UPDATE `proj.ds.stage` SET ingested_at = CURRENT_TIMESTAMP() WHERE TRUE;"));
        assert_eq!(script.matches(';').count(), 3);
    }

    #[test]
    fn rename_targets_bare_table_name() {
        let sql = rename_table("proj", "ds", "stage", "live");
        assert_eq!(sql, "ALTER TABLE `proj.ds.stage` RENAME TO `live`");
    }
}
