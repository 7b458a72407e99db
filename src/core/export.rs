// ZSleuth - core/export.rs
//
// CSV and JSON export of record tables.
// Core layer: writes to any Write trait object.

use crate::core::model::{SubfolderRecord, WellRecord};
use crate::core::table::{rig_for_plate, RecordTable};
use crate::util::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Export file format, chosen from the path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(ExportError::UnknownFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// A record with a flat export shape shared by CSV and JSON.
pub trait ExportRow {
    type Row<'a>: Serialize
    where
        Self: 'a;

    /// Column names, in `Row` field order.
    fn export_header() -> &'static [&'static str];
    fn export_row(&self) -> Self::Row<'_>;
}

/// One exported by-well row.
#[derive(Debug, Serialize)]
pub struct WellExportRow<'a> {
    pub plate_name: &'a str,
    pub well_position: &'a str,
    pub z_value: i64,
    pub rig: String,
    pub source_file: String,
}

/// One exported by-subfolder row.
#[derive(Debug, Serialize)]
pub struct SubfolderExportRow<'a> {
    pub subfolder_tag: &'a str,
    pub z_value: f64,
    pub source_file: String,
}

impl ExportRow for WellRecord {
    type Row<'a> = WellExportRow<'a>;

    fn export_header() -> &'static [&'static str] {
        &["plate_name", "well_position", "z_value", "rig", "source_file"]
    }

    fn export_row(&self) -> WellExportRow<'_> {
        // A plate without a rig digit exports with an empty rig column;
        // grouping is where that condition is fatal.
        let rig = rig_for_plate(&self.plate_name)
            .map(|r| r.label().to_string())
            .unwrap_or_default();
        WellExportRow {
            plate_name: &self.plate_name,
            well_position: &self.well_position,
            z_value: self.z_value,
            rig,
            source_file: self.path.display().to_string(),
        }
    }
}

impl ExportRow for SubfolderRecord {
    type Row<'a> = SubfolderExportRow<'a>;

    fn export_header() -> &'static [&'static str] {
        &["subfolder_tag", "z_value", "source_file"]
    }

    fn export_row(&self) -> SubfolderExportRow<'_> {
        SubfolderExportRow {
            subfolder_tag: &self.subfolder_tag,
            z_value: self.z_value,
            source_file: self.path.display().to_string(),
        }
    }
}

/// Export a table to CSV. Returns the number of rows written.
///
/// The header is written even for an empty table.
pub fn export_csv<R: ExportRow, W: Write>(
    table: &RecordTable<R>,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(R::export_header()).map_err(csv_err)?;

    let mut count = 0;
    for row in table {
        csv_writer.serialize(row.export_row()).map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Export a table to JSON (array of objects with the CSV columns as keys).
pub fn export_json<R: ExportRow, W: Write>(
    table: &RecordTable<R>,
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let rows: Vec<R::Row<'_>> = table.iter().map(|r| r.export_row()).collect();
    serde_json::to_writer_pretty(&mut writer, &rows).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(rows.len())
}

/// Write a table to `path`, format chosen by extension.
pub fn export_to_path<R: ExportRow>(
    table: &RecordTable<R>,
    path: &Path,
) -> Result<usize, ExportError> {
    let format = ExportFormat::from_path(path)?;
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = std::io::BufWriter::new(file);
    let count = match format {
        ExportFormat::Csv => export_csv(table, &mut writer, path)?,
        ExportFormat::Json => export_json(table, &mut writer, path)?,
    };
    // Dropping a BufWriter discards flush errors.
    writer.flush().map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), rows = count, ?format, "Exported table");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn well_table() -> RecordTable<WellRecord> {
        vec![WellRecord {
            plate_name: "P1345678_0001".to_string(),
            well_position: "G02".to_string(),
            z_value: 8267,
            file_name: "f.tif".to_string(),
            path: PathBuf::from("run/f.tif"),
        }]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_csv_export() {
        let mut buf = Vec::new();
        let count = export_csv(&well_table(), &mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(count, 1);

        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("plate_name,well_position,z_value,rig,source_file")
        );
        assert_eq!(lines.next(), Some("P1345678_0001,G02,8267,Rig 1,run/f.tif"));
    }

    #[test]
    fn test_json_export() {
        let mut buf = Vec::new();
        let count = export_json(&well_table(), &mut buf, Path::new("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let row = value[0].as_object().unwrap();
        let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = WellRecord::export_header().to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected, "JSON keys must match the CSV columns");
        assert_eq!(row["rig"], "Rig 1");
        assert_eq!(row["z_value"], 8267);
        assert_eq!(row["source_file"], "run/f.tif");
    }

    #[test]
    fn test_json_export_subfolder_rows() {
        let table: RecordTable<SubfolderRecord> = vec![SubfolderRecord {
            z_value: 8267.25,
            subfolder_tag: "Plate1".to_string(),
            file_name: "f.tif".to_string(),
            path: PathBuf::from("run/f.tif"),
        }]
        .into_iter()
        .collect();
        let mut buf = Vec::new();
        export_json(&table, &mut buf, Path::new("out.json")).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["subfolder_tag"], "Plate1");
        assert_eq!(value[0]["z_value"], 8267.25);
        assert!(value[0].get("file_name").is_none());
    }

    /// Accepts every write, fails on flush.
    struct FlushFails;

    impl Write for FlushFails {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_flush_failure_is_an_error() {
        let json = export_json(&well_table(), FlushFails, Path::new("out.json"));
        assert!(matches!(json, Err(ExportError::Io { .. })));

        let csv = export_csv(&well_table(), FlushFails, Path::new("out.csv"));
        assert!(matches!(csv, Err(ExportError::Io { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("a.CSV")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("a.json")).unwrap(),
            ExportFormat::Json
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("a.xlsx")),
            Err(ExportError::UnknownFormat { .. })
        ));
    }
}
