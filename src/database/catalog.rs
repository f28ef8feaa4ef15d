//! The twenty canned reports over the three artifact tables.
//!
//! Each entry pairs a fixed statement with the labels used to display its
//! columns. Only `colors-for-artifact` takes input, bound as `?1`.

use tracing::debug;

use crate::database::repo::ArtifactStore;
use crate::error::{EtlError, EtlResult};
use crate::report::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    None,
    ArtifactId,
}

#[derive(Debug)]
pub struct CatalogQuery {
    pub key: &'static str,
    pub title: &'static str,
    pub sql: &'static str,
    pub columns: &'static [&'static str],
    pub parameter: Parameter,
}

const METADATA_COLUMNS: &[&str] = &[
    "ID",
    "Title",
    "Culture",
    "Period",
    "Century",
    "Medium",
    "Dimensions",
    "Description",
    "Department",
    "Classification",
    "AccessionYear",
    "AccessionMethod",
];

const fn fixed(key: &'static str, title: &'static str, sql: &'static str, columns: &'static [&'static str]) -> CatalogQuery {
    CatalogQuery { key, title, sql, columns, parameter: Parameter::None }
}

pub static CATALOG: [CatalogQuery; 20] = [
    fixed(
        "byzantine-11th-century",
        "11th Century Byzantine Artifacts",
        "SELECT * FROM artifact_metadata WHERE century = '11th century' AND culture = 'Byzantine'",
        METADATA_COLUMNS,
    ),
    fixed(
        "unique-cultures",
        "Unique Cultures",
        "SELECT DISTINCT culture FROM artifact_metadata",
        &["Culture"],
    ),
    fixed(
        "archaic-period",
        "Archaic Period Artifacts",
        "SELECT * FROM artifact_metadata WHERE period = 'Archaic'",
        METADATA_COLUMNS,
    ),
    fixed(
        "titles-by-year",
        "Titles Descending by Year",
        "SELECT title, accessionyear FROM artifact_metadata ORDER BY accessionyear DESC",
        &["Title", "AccessionYear"],
    ),
    fixed(
        "count-per-department",
        "Artifacts per Department",
        "SELECT department, COUNT(*) FROM artifact_metadata GROUP BY department",
        &["Department", "Count"],
    ),
    fixed(
        "more-than-3-images",
        "Artifacts with >3 Images",
        "SELECT objectid, imagecount FROM artifact_media WHERE imagecount > 3",
        &["ObjectID", "ImageCount"],
    ),
    fixed(
        "average-rank",
        "Average Rank",
        "SELECT AVG(rank) FROM artifact_media",
        &["AvgRank"],
    ),
    fixed(
        "colorcount-over-mediacount",
        "ColorCount > MediaCount",
        "SELECT objectid FROM artifact_media WHERE colorcount > mediacount",
        &["ObjectID"],
    ),
    fixed(
        "created-1500-1600",
        "Created 1500-1600",
        "SELECT objectid, datebegin, dateend FROM artifact_media WHERE datebegin >= 1500 AND dateend <= 1600",
        &["ObjectID", "DateBegin", "DateEnd"],
    ),
    fixed(
        "no-media",
        "Artifacts with No Media",
        "SELECT objectid FROM artifact_media WHERE mediacount = 0 OR mediacount IS NULL",
        &["ObjectID"],
    ),
    fixed(
        "distinct-hues",
        "Distinct Hues",
        "SELECT DISTINCT hue FROM artifact_colors",
        &["Hue"],
    ),
    fixed(
        "top-5-colors",
        "Top 5 Colors",
        "SELECT color, COUNT(*) AS freq FROM artifact_colors GROUP BY color ORDER BY freq DESC LIMIT 5",
        &["Color", "Frequency"],
    ),
    fixed(
        "avg-percent-per-hue",
        "Average Percent per Hue",
        "SELECT hue, AVG(percent) FROM artifact_colors GROUP BY hue",
        &["Hue", "AvgPercent"],
    ),
    CatalogQuery {
        key: "colors-for-artifact",
        title: "Colors for Artifact",
        sql: "SELECT color, hue FROM artifact_colors WHERE objectid = ?1",
        columns: &["Color", "Hue"],
        parameter: Parameter::ArtifactId,
    },
    fixed(
        "total-colors",
        "Total Colors",
        "SELECT COUNT(*) FROM artifact_colors",
        &["TotalColors"],
    ),
    fixed(
        "byzantine-titles-hues",
        "Titles & Hues of Byzantine Artifacts",
        "SELECT m.title, c.hue
         FROM artifact_metadata m
         JOIN artifact_colors c ON m.id = c.objectid
         WHERE m.culture = 'Byzantine'",
        &["Title", "Hue"],
    ),
    fixed(
        "titles-with-hues",
        "Titles with Hues",
        "SELECT m.title, c.hue
         FROM artifact_metadata m
         JOIN artifact_colors c ON m.id = c.objectid",
        &["Title", "Hue"],
    ),
    fixed(
        "titles-cultures-ranks",
        "Titles, Cultures & Ranks",
        "SELECT m.title, m.culture, a.rank
         FROM artifact_metadata m
         JOIN artifact_media a ON m.id = a.objectid
         WHERE m.period IS NOT NULL",
        &["Title", "Culture", "Rank"],
    ),
    fixed(
        "top-10-grey",
        "Top 10 Grey Hued Artifacts",
        "SELECT m.title
         FROM artifact_metadata m
         JOIN artifact_media a ON m.id = a.objectid
         JOIN artifact_colors c ON m.id = c.objectid
         WHERE c.hue = 'Grey'
         ORDER BY a.rank DESC
         LIMIT 10",
        &["Title"],
    ),
    fixed(
        "per-classification",
        "Artifacts per Classification",
        "SELECT m.classification, COUNT(*) AS total, AVG(a.mediacount)
         FROM artifact_metadata m
         JOIN artifact_media a ON m.id = a.objectid
         GROUP BY m.classification",
        &["Classification", "Total", "AvgMediaCount"],
    ),
];

/// Resolves a query by key, by title (case-insensitive) or by its 1-based number.
pub fn find(selector: &str) -> EtlResult<&'static CatalogQuery> {
    let selector = selector.trim();
    if let Ok(n) = selector.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| CATALOG.get(i))
            .ok_or_else(|| EtlError::UnknownQuery(selector.to_string()));
    }

    CATALOG
        .iter()
        .find(|q| q.key.eq_ignore_ascii_case(selector) || q.title.eq_ignore_ascii_case(selector))
        .ok_or_else(|| EtlError::UnknownQuery(selector.to_string()))
}

impl CatalogQuery {
    pub fn run(&self, store: &ArtifactStore, artifact_id: Option<i64>) -> EtlResult<Table> {
        debug!("Running catalog query {}", self.key);
        match self.parameter {
            Parameter::None => store.query_table(self.sql, [], Some(self.columns)),
            Parameter::ArtifactId => {
                let id = artifact_id.ok_or(EtlError::MissingParameter(self.key))?;
                store.query_table(self.sql, [id], Some(self.columns))
            }
        }
    }
}
