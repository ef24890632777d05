//! CSV file gateway.
//!
//! # Responsibility
//! - Read a header row plus data rows of arbitrary width.
//! - Write the canonical table atomically (temp file + rename).
//!
//! # Invariants
//! - A missing or empty file reads as `Ok(None)`.
//! - Empty cells read as missing values.
//! - Invalid UTF-8 is replaced per cell, never failing the whole read.

use super::{GatewayResult, PersistenceGateway};
use crate::schema::{CanonicalRecords, RawRecords, RawValue};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Guest list stored as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvGateway {
    path: PathBuf,
}

impl CsvGateway {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_table(&self) -> GatewayResult<Option<RawRecords>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(&self.path)?;

        let headers = reader.byte_headers()?.clone();
        let mut table = RawRecords::new(headers.iter().map(lossy_cell));
        for record in reader.byte_records() {
            let record = record?;
            table.push_row(
                record
                    .iter()
                    .map(|cell| RawValue::from_cell(&lossy_cell(cell)))
                    .collect(),
            );
        }

        if table.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }

    fn write_table(&self, records: &CanonicalRecords) -> GatewayResult<()> {
        let staging = staging_path(&self.path);
        {
            let mut writer = csv::Writer::from_path(&staging)?;
            writer.write_record(records.column_names())?;
            for row in records.rows() {
                writer.write_record(row.iter().map(|cell| cell.to_string()))?;
            }
            writer.flush()?;
        }
        if let Err(err) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }
        Ok(())
    }
}

impl PersistenceGateway for CsvGateway {
    fn read(&self) -> GatewayResult<Option<RawRecords>> {
        let started_at = Instant::now();
        match self.read_table() {
            Ok(table) => {
                info!(
                    "event=store_read module=gateway status=ok backend=csv found={} rows={} duration_ms={}",
                    table.is_some(),
                    table.as_ref().map_or(0, RawRecords::row_count),
                    started_at.elapsed().as_millis()
                );
                Ok(table)
            }
            Err(err) => {
                error!(
                    "event=store_read module=gateway status=error backend=csv duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn write(&mut self, records: &CanonicalRecords) -> GatewayResult<()> {
        let started_at = Instant::now();
        match self.write_table(records) {
            Ok(()) => {
                info!(
                    "event=store_write module=gateway status=ok backend=csv rows={} duration_ms={}",
                    records.row_count(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_write module=gateway status=error backend=csv duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

// Undecodable bytes become U+FFFD.
fn lossy_cell(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::{lossy_cell, staging_path, CsvGateway};
    use crate::gateway::PersistenceGateway;
    use std::path::Path;

    #[test]
    fn staging_file_sits_next_to_target() {
        assert_eq!(
            staging_path(Path::new("/data/guests.csv")),
            Path::new("/data/guests.csv.tmp")
        );
    }

    #[test]
    fn missing_file_reads_as_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = CsvGateway::new(dir.path().join("nothing.csv"));
        assert_eq!(gateway.read().unwrap(), None);
    }

    #[test]
    fn empty_file_reads_as_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();
        assert_eq!(CsvGateway::new(&path).read().unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced_inside_the_cell() {
        assert_eq!(lossy_cell(b"Aiko"), "Aiko");
        assert_eq!(lossy_cell(b"A\xffko"), "A\u{fffd}ko");
    }
}
