//! Translation between interactome identifiers and gene symbols.

use crate::error::{PcsfError, Result};
use csv::ReaderBuilder;
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct IdMapRow {
    #[serde(rename = "STRING")]
    id: String,
    #[serde(rename = "display name")]
    symbol: String,
}

/// Bidirectional identifier map. Unknown keys pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    to_symbol: HashMap<String, String>,
    to_id: HashMap<String, String>,
}

impl IdMap {
    /// Build from `(id, symbol)` pairs. The first mapping for a symbol wins.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut map = Self::default();
        for (id, symbol) in pairs {
            let (id, symbol) = (id.into(), symbol.into());
            if id.is_empty() || symbol.is_empty() {
                continue;
            }
            map.to_id.entry(symbol.clone()).or_insert_with(|| id.clone());
            if map.to_symbol.insert(id.clone(), symbol).is_some() {
                debug!("Identifier '{}' mapped more than once", id);
            }
        }
        map
    }

    /// Read a tab-separated table with `STRING` and `display name` columns.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        for column in ["STRING", "display name"] {
            if !headers.iter().any(|h| h == column) {
                return Err(PcsfError::MissingColumn {
                    column: column.to_string(),
                    table: path.display().to_string(),
                });
            }
        }

        let mut pairs = Vec::new();
        for row in reader.deserialize() {
            let row: IdMapRow = row?;
            pairs.push((row.id, row.symbol));
        }
        let map = Self::from_pairs(pairs);
        info!("Loaded {} identifier mappings", map.len());
        Ok(map)
    }

    /// Symbol for `id`, or `id` itself when unmapped.
    pub fn to_symbol<'a>(&'a self, id: &'a str) -> &'a str {
        self.to_symbol.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Identifier for `symbol`, or `symbol` itself when unmapped.
    pub fn to_id<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.to_id.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.to_symbol.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.to_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_pairs_passthrough() {
        let map = IdMap::from_pairs(vec![
            ("9606.ENSP1", "TP53"),
            ("9606.ENSP2", "MDM2"),
            ("9606.ENSP3", "TP53"),
        ]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.to_symbol("9606.ENSP2"), "MDM2");
        assert_eq!(map.to_symbol("unknown"), "unknown");
        assert_eq!(map.to_id("TP53"), "9606.ENSP1");
        assert_eq!(map.to_id("BRCA1"), "BRCA1");
    }

    #[test]
    fn test_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "STRING\tdisplay name\tsize").unwrap();
        writeln!(file, "9606.ENSP1\tTP53\t393").unwrap();
        writeln!(file, "9606.ENSP2\tMDM2\t491").unwrap();
        file.flush().unwrap();

        let map = IdMap::from_tsv(file.path()).unwrap();
        assert!(map.contains_id("9606.ENSP1"));
        assert_eq!(map.to_symbol("9606.ENSP1"), "TP53");
    }

    #[test]
    fn test_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id\tsymbol").unwrap();
        writeln!(file, "9606.ENSP1\tTP53").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            IdMap::from_tsv(file.path()),
            Err(PcsfError::MissingColumn { .. })
        ));
    }
}
