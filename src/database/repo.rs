use std::fmt;
use std::path::{Path, PathBuf};
use rusqlite::{Batch, Connection, Params, Statement, params};
use tracing::{info, debug};

use crate::database::schema::SCHEMA;
use crate::error::EtlResult;
use crate::ingest::transform::TransformedBatch;
use crate::report::table::{Cell, Table};
use crate::utils::config::AppConfig;

const SQL_META: &str = "INSERT OR IGNORE INTO artifact_metadata
    (id, title, culture, period, century, medium, dimensions, description,
     department, classification, accessionyear, accessionmethod)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const SQL_MEDIA: &str = "INSERT OR IGNORE INTO artifact_media
    (objectid, imagecount, mediacount, colorcount, rank, datebegin, dateend)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const SQL_COLOR: &str = "INSERT INTO artifact_colors
    (objectid, color, spectrum, hue, percent, css3)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// What one `load` call did. Conflicting metadata/media rows are counted as skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub metadata_inserted: usize,
    pub metadata_skipped: usize,
    pub media_inserted: usize,
    pub media_skipped: usize,
    pub colors_inserted: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "metadata: {} (skipped {}), media: {} (skipped {}), colors: {}",
            self.metadata_inserted,
            self.metadata_skipped,
            self.media_inserted,
            self.media_skipped,
            self.colors_inserted
        )
    }
}

/// Handle on the SQLite file. Holds no connection; every operation opens its
/// own and drops it before returning.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.db_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> EtlResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// Inserts all three row sets inside one transaction.
    /// Any statement error drops the transaction, so nothing from the call is kept.
    pub fn load(&self, batch: &TransformedBatch) -> EtlResult<LoadReport> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut report = LoadReport::default();

        if !batch.metadata.is_empty() {
            let mut stmt = tx.prepare(SQL_META)?;
            for m in &batch.metadata {
                let changed = stmt.execute(params![
                    m.id,
                    m.title,
                    m.culture,
                    m.period,
                    m.century,
                    m.medium,
                    m.dimensions,
                    m.description,
                    m.department,
                    m.classification,
                    m.accession_year,
                    m.accession_method,
                ])?;
                if changed == 0 {
                    report.metadata_skipped += 1;
                } else {
                    report.metadata_inserted += changed;
                }
            }
        }

        if !batch.media.is_empty() {
            let mut stmt = tx.prepare(SQL_MEDIA)?;
            for m in &batch.media {
                let changed = stmt.execute(params![
                    m.object_id,
                    m.image_count,
                    m.media_count,
                    m.color_count,
                    m.rank,
                    m.date_begin,
                    m.date_end,
                ])?;
                if changed == 0 {
                    report.media_skipped += 1;
                } else {
                    report.media_inserted += changed;
                }
            }
        }

        if !batch.colors.is_empty() {
            let mut stmt = tx.prepare(SQL_COLOR)?;
            for c in &batch.colors {
                report.colors_inserted += stmt.execute(params![
                    c.object_id,
                    c.color,
                    c.spectrum,
                    c.hue,
                    c.percent,
                    c.css3,
                ])?;
            }
        }

        tx.commit()?;
        info!("Loaded into {:?} -> {}", self.path, report);
        Ok(report)
    }

    /// Runs one statement and collects every row as display cells.
    /// `labels` replaces the statement's own column names when given.
    pub fn query_table<P: Params>(&self, sql: &str, params: P, labels: Option<&[&str]>) -> EtlResult<Table> {
        let conn = self.connect()?;
        let (columns, rows) = fetch_rows(&conn, sql, params)?;
        debug!("Query returned {} rows", rows.len());

        let columns = match labels {
            Some(labels) => labels.iter().map(|l| l.to_string()).collect(),
            None => columns,
        };
        Ok(Table::new(columns, rows))
    }

    /// Runs every statement in `sql`, in order, on one connection.
    /// Returns what the last statement produced; statements without a result
    /// set give an empty table. Earlier statements stay applied if a later one fails.
    pub fn run_script(&self, sql: &str) -> EtlResult<Table> {
        let conn = self.connect()?;
        let mut batch = Batch::new(&conn, sql);
        let mut last = Table::default();
        let mut executed = 0usize;

        while let Some(mut stmt) = batch.next()? {
            let (columns, rows) = collect_rows(&mut stmt, [])?;
            last = Table::new(columns, rows);
            executed += 1;
        }
        debug!("Script ran {} statements, last returned {} rows", executed, last.rows.len());
        Ok(last)
    }
}

fn fetch_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut stmt = conn.prepare(sql)?;
    collect_rows(&mut stmt, params)
}

fn collect_rows<P: Params>(stmt: &mut Statement<'_>, params: P) -> rusqlite::Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(Cell::from(row.get_ref(i)?));
        }
        out.push(cells);
    }
    Ok((columns, out))
}
