use thiserror::Error;
use tracing::{info, warn};

use crate::database::repo::ArtifactStore;
use crate::report::table::Table;

#[derive(Debug, Error, PartialEq)]
pub enum AdHocError {
    #[error("Enter a SQL query before executing.")]
    EmptyInput,
    #[error("Error: {0}")]
    Query(String),
}

#[derive(Debug, PartialEq)]
pub enum AdHocOutcome {
    Rows(Table),
    /// The statement ran but produced nothing (also what DDL/DML produce).
    NoRows { columns: Vec<String> },
}

/// Runs user-supplied SQL verbatim. Several `;`-separated statements all run,
/// and the last one decides the outcome. Failures are turned into an
/// [`AdHocError`]; nothing here is allowed to panic on bad input.
pub fn execute(store: &ArtifactStore, sql: &str) -> Result<AdHocOutcome, AdHocError> {
    if sql.trim().is_empty() {
        return Err(AdHocError::EmptyInput);
    }

    match store.run_script(sql) {
        Ok(table) if table.is_empty() => {
            info!("Ad-hoc query ran, no rows");
            Ok(AdHocOutcome::NoRows { columns: table.columns })
        }
        Ok(table) => {
            info!("Ad-hoc query returned {} rows", table.rows.len());
            Ok(AdHocOutcome::Rows(table))
        }
        Err(e) => {
            warn!("Ad-hoc query failed: {}", e);
            Err(AdHocError::Query(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repo::tests::{metadata, temp_store};
    use crate::ingest::transform::TransformedBatch;

    #[test]
    fn test_blank_input_never_touches_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("never-created.db");
        let store = ArtifactStore::new(&db_path);

        assert_eq!(execute(&store, ""), Err(AdHocError::EmptyInput));
        assert_eq!(execute(&store, "  \n\t "), Err(AdHocError::EmptyInput));
        assert!(!db_path.exists());
    }

    #[test]
    fn test_invalid_sql_is_reported() {
        let (_dir, store) = temp_store();
        let result = execute(&store, "SELEC nonsense FROM");
        assert!(matches!(result, Err(AdHocError::Query(_))));

        let result = execute(&store, "SELECT * FROM no_such_table");
        match result {
            Err(AdHocError::Query(msg)) => assert!(msg.contains("no_such_table")),
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_rows_is_not_an_error() {
        let (_dir, store) = temp_store();
        let outcome = execute(&store, "SELECT id, title FROM artifact_metadata").unwrap();
        assert_eq!(
            outcome,
            AdHocOutcome::NoRows { columns: vec!["id".to_string(), "title".to_string()] }
        );
    }

    #[test]
    fn test_rows_use_statement_columns() {
        let (_dir, store) = temp_store();
        store
            .load(&TransformedBatch { metadata: vec![metadata(1), metadata(2)], ..Default::default() })
            .unwrap();

        match execute(&store, "SELECT id AS artifact FROM artifact_metadata ORDER BY id").unwrap() {
            AdHocOutcome::Rows(table) => {
                assert_eq!(table.columns, vec!["artifact"]);
                assert_eq!(table.rows.len(), 2);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_statements_without_result_sets_run() {
        let (_dir, store) = temp_store();
        store
            .load(&TransformedBatch { metadata: vec![metadata(1)], ..Default::default() })
            .unwrap();

        let outcome = execute(&store, "DELETE FROM artifact_metadata WHERE id = 1").unwrap();
        assert_eq!(outcome, AdHocOutcome::NoRows { columns: vec![] });

        let outcome = execute(&store, "SELECT COUNT(*) AS n FROM artifact_metadata").unwrap();
        assert!(matches!(outcome, AdHocOutcome::Rows(t) if t.rows[0][0] == crate::report::table::Cell::Integer(0)));
    }

    #[test]
    fn test_every_statement_in_the_input_runs() {
        let (_dir, store) = temp_store();
        store
            .load(&TransformedBatch { metadata: vec![metadata(1), metadata(2)], ..Default::default() })
            .unwrap();

        let outcome = execute(
            &store,
            "DELETE FROM artifact_metadata WHERE id = 1; DELETE FROM artifact_metadata WHERE id = 2; -- done",
        )
        .unwrap();
        assert_eq!(outcome, AdHocOutcome::NoRows { columns: vec![] });

        let outcome = execute(&store, "SELECT COUNT(*) AS n FROM artifact_metadata").unwrap();
        assert!(matches!(outcome, AdHocOutcome::Rows(t) if t.rows[0][0] == crate::report::table::Cell::Integer(0)));
    }

    #[test]
    fn test_last_select_wins() {
        let (_dir, store) = temp_store();
        match execute(&store, "SELECT 1; SELECT 2").unwrap() {
            AdHocOutcome::Rows(table) => {
                assert_eq!(table.rows, vec![vec![crate::report::table::Cell::Integer(2)]]);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }
}
