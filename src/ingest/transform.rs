use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::ingest::fetcher::RawRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub id: i64,
    pub title: Option<String>,
    pub culture: Option<String>,
    pub period: Option<String>,
    pub century: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub classification: Option<String>,
    pub accession_year: Option<i64>,
    pub accession_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRow {
    pub object_id: i64,
    pub image_count: Option<i64>,
    pub media_count: Option<i64>,
    pub color_count: Option<i64>,
    pub rank: Option<i64>,
    pub date_begin: Option<i64>,
    pub date_end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRow {
    pub object_id: i64,
    pub color: Option<String>,
    pub spectrum: Option<String>,
    pub hue: Option<String>,
    pub percent: Option<f64>,
    pub css3: Option<String>,
}

/// Rows ready for the loader. Also the on-disk format between `preview` and `insert`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformedBatch {
    pub metadata: Vec<MetadataRow>,
    pub media: Vec<MediaRow>,
    pub colors: Vec<ColorRow>,
}

impl TransformedBatch {
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.metadata.len(), self.media.len(), self.colors.len())
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.media.is_empty() && self.colors.is_empty()
    }
}

fn text(obj: &Value, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

fn int(obj: &Value, field: &str) -> Option<i64> {
    obj.get(field).and_then(Value::as_i64)
}

fn real(obj: &Value, field: &str) -> Option<f64> {
    obj.get(field).and_then(Value::as_f64)
}

/// Accepts integer ids and integer strings such as `"12"`.
/// Anything else, and zero, is treated the same as a missing id.
fn object_id(obj: &Value) -> Option<i64> {
    let id = match obj.get("objectid")? {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_i64(),
    };
    id.filter(|id| *id != 0)
}

/// Splits raw API objects into the three table row sets.
pub fn transform(records: &[RawRecord]) -> TransformedBatch {
    let mut batch = TransformedBatch::default();
    let mut skipped = 0usize;

    for obj in records {
        let Some(id) = object_id(obj) else {
            skipped += 1;
            continue;
        };

        batch.metadata.push(MetadataRow {
            id,
            title: text(obj, "title"),
            culture: text(obj, "culture"),
            period: text(obj, "period"),
            century: text(obj, "century"),
            medium: text(obj, "medium"),
            dimensions: text(obj, "dimensions"),
            description: text(obj, "description"),
            department: text(obj, "department"),
            classification: text(obj, "classification"),
            accession_year: int(obj, "accessionyear"),
            accession_method: text(obj, "accessionmethod"),
        });

        batch.media.push(MediaRow {
            object_id: id,
            image_count: int(obj, "imagecount"),
            media_count: int(obj, "mediacount"),
            color_count: int(obj, "colorcount"),
            rank: int(obj, "rank"),
            date_begin: int(obj, "datebegin"),
            date_end: int(obj, "dateend"),
        });

        if let Some(colors) = obj.get("colors").and_then(Value::as_array) {
            for c in colors {
                batch.colors.push(ColorRow {
                    object_id: id,
                    color: text(c, "color"),
                    spectrum: text(c, "spectrum"),
                    hue: text(c, "hue"),
                    percent: real(c, "percent"),
                    css3: text(c, "css3"),
                });
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} records without an object id", skipped);
    }
    let (meta, media, colors) = batch.counts();
    info!("Transformed {} records -> metadata: {}, media: {}, colors: {}", records.len(), meta, media, colors);

    batch
}
