//! Readers for the interactome, seed and DE result tables.
//!
//! Tables may be comma- or tab-separated; the delimiter is taken from the
//! header line.

use crate::error::{PcsfError, Result};
use crate::graph::{DeRecord, Interactome, InteractomeBuilder, PrizeTable, SeedRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn detect_delimiter(path: &Path) -> Result<u8> {
    let mut first = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first)?;
    if first.trim().is_empty() {
        return Err(PcsfError::EmptyData(format!("{} is empty", path.display())));
    }
    Ok(if first.contains('\t') { b'\t' } else { b',' })
}

fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    let delimiter = detect_delimiter(path)?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?)
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

fn require_column(headers: &StringRecord, names: &[&str], table: &str) -> Result<usize> {
    find_column(headers, names).ok_or_else(|| PcsfError::MissingColumn {
        column: names[0].to_string(),
        table: table.to_string(),
    })
}

fn parse_f64(record: &StringRecord, idx: usize, column: &str, row: usize) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>().map_err(|_| PcsfError::InvalidValue {
        value: raw.to_string(),
        column: column.to_string(),
        row,
    })
}

fn optional_text(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read a `protein1, protein2, cost` table. Columns are positional; the
/// header line is skipped. Malformed rows are counted and skipped.
pub fn read_interactome<P: AsRef<Path>>(path: P) -> Result<Interactome> {
    let path = path.as_ref();
    let mut reader = open_table(path)?;
    let mut builder = InteractomeBuilder::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                builder.reject_row();
                continue;
            }
        };
        let cost = record.get(2).and_then(|c| c.parse::<f64>().ok());
        match (record.get(0), record.get(1), cost) {
            (Some(a), Some(b), Some(cost)) => {
                // Rejections are tallied inside the builder.
                let _ = builder.add_edge(a, b, cost);
            }
            _ => builder.reject_row(),
        }
    }

    if builder.rejected() > 0 {
        warn!(
            "{} malformed rows skipped in {}",
            builder.rejected(),
            path.display()
        );
    }
    builder.build()
}

/// Read a seed table with `name` and `prize` columns and optional `score`
/// and `display_name` (or `gene`) columns.
pub fn read_prizes<P: AsRef<Path>>(path: P) -> Result<PrizeTable> {
    let path = path.as_ref();
    let table = path.display().to_string();
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();

    let name_idx = require_column(&headers, &["name"], &table)?;
    let prize_idx = require_column(&headers, &["prize"], &table)?;
    let score_idx = find_column(&headers, &["score"]);
    let display_idx = find_column(&headers, &["display_name", "gene", "symbol"]);

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 2;
        let name = record.get(name_idx).unwrap_or("");
        if name.is_empty() {
            return Err(PcsfError::InvalidValue {
                value: String::new(),
                column: "name".into(),
                row,
            });
        }
        let score = match score_idx {
            Some(idx) if !record.get(idx).unwrap_or("").is_empty() => {
                Some(parse_f64(&record, idx, "score", row)?)
            }
            _ => None,
        };
        records.push(SeedRecord {
            name: name.to_string(),
            prize: parse_f64(&record, prize_idx, "prize", row)?,
            score,
            display_name: optional_text(&record, display_idx),
        });
    }

    info!("Read {} seeds from {}", records.len(), table);
    PrizeTable::new(records)
}

/// Read upstream DE results. `score_column` names the signed effect column
/// (e.g. `log2FoldChange`, `NES`). Rows with `NA` values are skipped.
pub fn read_de_results<P: AsRef<Path>>(path: P, score_column: &str) -> Result<Vec<DeRecord>> {
    let path = path.as_ref();
    let table = path.display().to_string();
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();

    let gene_idx = require_column(&headers, &["gene", "name", "id"], &table)?;
    let score_idx = require_column(&headers, &[score_column], &table)?;
    let padj_idx = require_column(&headers, &["padj", "fdr", "q_value"], &table)?;
    let display_idx = find_column(&headers, &["display_name", "symbol"]);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        let gene = record.get(gene_idx).unwrap_or("");
        let score = record.get(score_idx).and_then(|s| s.parse::<f64>().ok());
        let padj = record.get(padj_idx).and_then(|s| s.parse::<f64>().ok());
        match (score, padj) {
            (Some(score), Some(padj)) if !gene.is_empty() => rows.push(DeRecord {
                gene: gene.to_string(),
                score,
                padj,
                display_name: optional_text(&record, display_idx),
            }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("{} DE rows without usable score or padj skipped", skipped);
    }
    Ok(rows)
}
