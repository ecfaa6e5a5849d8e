use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{CreatePricePoint, PricePoint};
use crate::store::PricePointStore;

/// Outcome of one CSV import. Rows listed in `errors` were skipped.
#[derive(Debug, Default, Serialize)]
pub struct ImportResult {
    pub imported: u64,
    pub errors: Vec<String>,
}

impl ImportResult {
    fn absorb(&mut self, other: ImportResult) {
        self.imported += other.imported;
        self.errors.extend(other.errors);
    }
}

fn field<'r>(record: &'r StringRecord, index: usize, column: &str) -> Result<&'r str, String> {
    record
        .get(index)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing {}", column))
}

// Columns: timestamp, symbol, price.
fn parse_row(record: &StringRecord) -> Result<PricePoint, String> {
    let timing = field(record, 0, "timestamp")?
        .parse::<i64>()
        .map_err(|e| format!("invalid timestamp: {}", e))?;
    let name = field(record, 1, "symbol")?.to_string();
    let price = field(record, 2, "price")?
        .parse::<f64>()
        .map_err(|e| format!("invalid price: {}", e))?;

    let input = CreatePricePoint {
        timing,
        name,
        price,
        recommendation: None,
    };
    let asset = input.validate().map_err(|e| e.to_string())?;
    Ok(PricePoint::new(asset, timing, price, None))
}

/// Parses CSV text with a header row. Bad rows are reported by line number
/// and skipped.
pub fn parse_csv(content: &str) -> (Vec<PricePoint>, Vec<String>) {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut points = Vec::new();
    let mut errors = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        let line = line_num + 2;
        match result {
            Ok(record) => match parse_row(&record) {
                Ok(point) => points.push(point),
                Err(e) => errors.push(format!("Line {}: {}", line, e)),
            },
            Err(e) => errors.push(format!("Line {}: Failed to parse CSV row: {}", line, e)),
        }
    }

    (points, errors)
}

pub async fn import_csv_str(store: &dyn PricePointStore, content: &str) -> Result<ImportResult, AppError> {
    let (points, errors) = parse_csv(content);
    for e in &errors {
        warn!("Skipping CSV row: {}", e);
    }

    let imported = if points.is_empty() {
        0
    } else {
        store.insert_many(points).await?
    };

    Ok(ImportResult { imported, errors })
}

pub async fn import_csv_file(store: &dyn PricePointStore, file_path: &Path) -> Result<ImportResult> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file: {:?}", file_path))?;
    let result = import_csv_str(store, &content)
        .await
        .with_context(|| format!("Failed to store prices from {:?}", file_path))?;
    info!("Loaded {} price points from {:?}", result.imported, file_path);
    Ok(result)
}

/// Imports every `*.csv` file in `dir`, in file-name order. A missing
/// directory imports nothing.
pub async fn import_directory(store: &dyn PricePointStore, dir: &Path) -> Result<ImportResult> {
    if !dir.is_dir() {
        warn!("Price data directory {:?} does not exist, skipping CSV load", dir);
        return Ok(ImportResult::default());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    let mut total = ImportResult::default();
    for file in &files {
        total.absorb(import_csv_file(store, file).await?);
    }

    info!("Loaded {} price points from {} CSV files", total.imported, files.len());
    Ok(total)
}
