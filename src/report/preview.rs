use crate::ingest::transform::{ColorRow, MediaRow, MetadataRow, TransformedBatch};
use crate::report::table::{Cell, Table};

fn text(v: &Option<String>) -> Cell {
    v.as_ref().map_or(Cell::Null, |s| Cell::Text(s.clone()))
}

fn int(v: Option<i64>) -> Cell {
    v.map_or(Cell::Null, Cell::Integer)
}

fn real(v: Option<f64>) -> Cell {
    v.map_or(Cell::Null, Cell::Real)
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn metadata_table(rows: &[MetadataRow]) -> Table {
    Table::new(
        labels(&["ID", "Title", "Culture", "Period", "Century", "Medium", "Dimensions",
                 "Description", "Department", "Classification", "AccessionYear", "AccessionMethod"]),
        rows.iter()
            .map(|m| vec![
                Cell::Integer(m.id),
                text(&m.title),
                text(&m.culture),
                text(&m.period),
                text(&m.century),
                text(&m.medium),
                text(&m.dimensions),
                text(&m.description),
                text(&m.department),
                text(&m.classification),
                int(m.accession_year),
                text(&m.accession_method),
            ])
            .collect(),
    )
}

pub fn media_table(rows: &[MediaRow]) -> Table {
    Table::new(
        labels(&["ObjectID", "ImageCount", "MediaCount", "ColorCount", "Rank", "DateBegin", "DateEnd"]),
        rows.iter()
            .map(|m| vec![
                Cell::Integer(m.object_id),
                int(m.image_count),
                int(m.media_count),
                int(m.color_count),
                int(m.rank),
                int(m.date_begin),
                int(m.date_end),
            ])
            .collect(),
    )
}

pub fn color_table(rows: &[ColorRow]) -> Table {
    Table::new(
        labels(&["ObjectID", "Color", "Spectrum", "Hue", "Percent", "CSS3"]),
        rows.iter()
            .map(|c| vec![
                Cell::Integer(c.object_id),
                text(&c.color),
                text(&c.spectrum),
                text(&c.hue),
                real(c.percent),
                text(&c.css3),
            ])
            .collect(),
    )
}

/// The "prepared for insert" summary followed by the first `sample` rows of each table.
pub fn render_batch(batch: &TransformedBatch, sample: usize) -> String {
    let (meta, media, colors) = batch.counts();
    let sections = [
        ("Metadata Sample", metadata_table(&batch.metadata)),
        ("Media Sample", media_table(&batch.media)),
        ("Colors Sample", color_table(&batch.colors)),
    ];

    let mut out = format!(
        "Prepared for insert -> metadata: {}, media: {}, colors: {}",
        meta, media, colors
    );
    for (title, table) in sections {
        out.push_str(&format!("\n\n### {}\n{}", title, table.head(sample).render()));
    }
    out
}
