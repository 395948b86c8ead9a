//! Console tables and file exports for report rows.

use std::fs;
use std::path::{Path, PathBuf};

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tracing::info;

use crate::error::Result;

/// A row that can be shown in a console table. The console view is a condensed
/// projection; exports always carry every field.
pub trait TableRow {
    fn headers() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

pub fn render<T: TableRow>(rows: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(T::headers());
    for row in rows {
        table.add_row(row.cells());
    }
    table
}

/// Writes `rows` as pretty JSON to `<dir>/<name>.json`, creating `dir` when missing.
pub fn export_json<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", name));
    let file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), rows)?;
    info!(path = %path.display(), rows = rows.len(), "saved");
    Ok(path)
}

pub(crate) fn float(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        qty: f64,
    }

    impl TableRow for Row {
        fn headers() -> Vec<&'static str> {
            vec!["Name", "Qty"]
        }

        fn cells(&self) -> Vec<String> {
            vec![self.name.to_string(), float(self.qty)]
        }
    }

    #[test]
    fn export_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("temp");
        let path = export_json(&out, "quants_to_show", &[Row { name: "A", qty: 1.0 }]).unwrap();
        assert_eq!(path, out.join("quants_to_show.json"));
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved[0]["name"], "A");
    }

    #[test]
    fn table_lists_every_row() {
        let rendered = render(&[Row { name: "Widget", qty: 2.5 }]).to_string();
        assert!(rendered.contains("Widget"));
        assert!(rendered.contains("2.50"));
    }
}
