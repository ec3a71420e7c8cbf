//! CSV reading and writing for raw shipments and supplier features

use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::labeler::mislabeled;
use crate::models::{ShipmentRecord, SupplierFeature};
use crate::normalize::records_from_table;

/// Lossy UTF-8 decode; legacy exports are often Latin-1
fn decode(record: &ByteRecord) -> StringRecord {
    record.iter().map(|field| String::from_utf8_lossy(field).into_owned()).collect()
}

/// Read the raw shipment file. A missing file or missing canonical column
/// is fatal; short rows yield missing cells.
pub fn read_shipments(path: &Path) -> Result<Vec<ShipmentRecord>> {
    if !path.exists() {
        return Err(PipelineError::InputMissing(path.to_path_buf()));
    }
    info!("Reading CSV from {:?}", path);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = decode(reader.byte_headers()?);

    let mut rows = Vec::new();
    let mut error_count = 0;
    for (i, result) in reader.byte_records().enumerate() {
        match result {
            Ok(record) => rows.push(decode(&record)),
            Err(e) => {
                if error_count < 5 {
                    warn!("Failed to read record {}: {}", i, e);
                }
                error_count += 1;
            }
        }
    }
    info!("Parsed {} records from CSV ({} unreadable)", rows.len(), error_count);

    records_from_table(&headers, &rows)
}

pub fn write_features(path: &Path, features: &[SupplierFeature]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for feature in features {
        writer.serialize(feature)?;
    }
    writer.flush()?;
    info!("Wrote {} supplier features to {}", features.len(), path.display());
    Ok(())
}

/// Read the supplier feature file, warning about rows whose stored label
/// no longer matches the rule table.
pub fn read_features(path: &Path) -> Result<Vec<SupplierFeature>> {
    if !path.exists() {
        return Err(PipelineError::InputMissing(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let features = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SupplierFeature>, csv::Error>>()?;

    let stale = mislabeled(&features);
    if !stale.is_empty() {
        warn!("{} suppliers have labels that disagree with the rule table", stale.len());
    }
    info!("Loaded {} supplier features from {}", features.len(), path.display());
    Ok(features)
}
