//! Seed table and per-node prizes.

use crate::error::{PcsfError, Result};
use crate::graph::interactome::{Interactome, NodeId};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the seed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    /// Interactome identifier.
    pub name: String,
    /// Non-negative prize.
    pub prize: f64,
    /// Signed upstream score (log fold change, TF activity).
    pub score: Option<f64>,
    /// Human-readable label, usually the gene symbol.
    pub display_name: Option<String>,
}

impl SeedRecord {
    pub fn new(name: &str, prize: f64) -> Self {
        Self {
            name: name.to_string(),
            prize,
            score: None,
            display_name: None,
        }
    }
}

/// One row of an upstream differential-expression result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeRecord {
    pub gene: String,
    pub score: f64,
    pub padj: f64,
    pub display_name: Option<String>,
}

/// Validated, de-duplicated seed table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrizeTable {
    records: Vec<SeedRecord>,
}

impl PrizeTable {
    /// Validate prizes and collapse duplicate names (last row wins).
    pub fn new(records: Vec<SeedRecord>) -> Result<Self> {
        let mut kept: Vec<SeedRecord> = Vec::with_capacity(records.len());
        let mut position: HashMap<String, usize> = HashMap::new();

        for record in records {
            if !record.prize.is_finite() || record.prize < 0.0 {
                return Err(PcsfError::InvalidParameter(format!(
                    "prize for '{}' must be finite and >= 0, got {}",
                    record.name, record.prize
                )));
            }
            match position.get(&record.name) {
                Some(&idx) => {
                    debug!("Duplicate seed '{}', keeping last row", record.name);
                    kept[idx] = record;
                }
                None => {
                    position.insert(record.name.clone(), kept.len());
                    kept.push(record);
                }
            }
        }

        Ok(Self { records: kept })
    }

    /// Seeds from DE results: rows with `padj < padj_threshold`, prize `|score|`.
    pub fn from_de_results(rows: &[DeRecord], padj_threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&padj_threshold) {
            return Err(PcsfError::InvalidParameter(format!(
                "padj threshold must be in [0, 1], got {}",
                padj_threshold
            )));
        }
        let records = rows
            .iter()
            .filter(|r| r.padj.is_finite() && r.padj < padj_threshold && r.score.is_finite())
            .map(|r| SeedRecord {
                name: r.gene.clone(),
                prize: r.score.abs(),
                score: Some(r.score),
                display_name: r.display_name.clone(),
            })
            .collect();
        Self::new(records)
    }

    pub fn records(&self) -> &[SeedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Prizes resolved against an interactome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePrizes {
    prizes: Vec<f64>,
    scores: Vec<Option<f64>>,
    display_names: Vec<Option<String>>,
    terminals: Vec<NodeId>,
    dropped: Vec<String>,
}

impl NodePrizes {
    /// Attach the seed table to the interactome.
    ///
    /// Seeds missing from the interactome are dropped with a warning. Fails
    /// with `NoTerminals` when no seed with a positive prize survives.
    pub fn assign(interactome: &Interactome, table: &PrizeTable) -> Result<Self> {
        let n = interactome.n_nodes();
        let mut prizes = vec![0.0; n];
        let mut scores = vec![None; n];
        let mut display_names = vec![None; n];
        let mut dropped = Vec::new();

        for record in table.records() {
            match interactome.node_id(&record.name) {
                Some(node) => {
                    prizes[node] = record.prize;
                    scores[node] = record.score;
                    display_names[node] = record.display_name.clone();
                }
                None => dropped.push(record.name.clone()),
            }
        }

        if !dropped.is_empty() {
            warn!(
                "{} of {} seeds not found in interactome and dropped",
                dropped.len(),
                table.len()
            );
            debug!("Dropped seeds: {:?}", dropped);
        }

        let mut node_prizes = Self::from_prizes(prizes);
        node_prizes.scores = scores;
        node_prizes.display_names = display_names;
        node_prizes.dropped = dropped;

        if node_prizes.terminals.is_empty() {
            return Err(PcsfError::NoTerminals(format!(
                "none of the {} seeds has a positive prize in the interactome",
                table.len()
            )));
        }
        info!("{} terminals assigned", node_prizes.n_terminals());
        Ok(node_prizes)
    }

    /// Prizes without annotations. Terminals are the nodes with prize > 0.
    pub fn from_prizes(prizes: Vec<f64>) -> Self {
        let n = prizes.len();
        let terminals = prizes
            .iter()
            .enumerate()
            .filter(|(_, &p)| p > 0.0)
            .map(|(i, _)| i)
            .collect();
        Self {
            prizes,
            scores: vec![None; n],
            display_names: vec![None; n],
            terminals,
            dropped: Vec::new(),
        }
    }

    /// Same annotations, different prize vector.
    pub fn with_prizes(&self, prizes: Vec<f64>) -> Self {
        let mut moved = Self::from_prizes(prizes);
        moved.scores = self.scores.clone();
        moved.display_names = self.display_names.clone();
        moved.dropped = self.dropped.clone();
        moved
    }

    pub fn prize(&self, node: NodeId) -> f64 {
        self.prizes[node]
    }

    pub fn prizes(&self) -> &[f64] {
        &self.prizes
    }

    pub fn score(&self, node: NodeId) -> Option<f64> {
        self.scores[node]
    }

    pub fn display_name(&self, node: NodeId) -> Option<&str> {
        self.display_names[node].as_deref()
    }

    /// Terminal nodes in ascending id order.
    pub fn terminals(&self) -> &[NodeId] {
        &self.terminals
    }

    pub fn n_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.prizes[node] > 0.0
    }

    /// Seed names absent from the interactome.
    pub fn dropped_seeds(&self) -> &[String] {
        &self.dropped
    }

    pub fn total_prize(&self) -> f64 {
        self.prizes.iter().sum()
    }

    pub fn n_nodes(&self) -> usize {
        self.prizes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Interactome {
        Interactome::from_edges(vec![("A", "B", 0.1), ("B", "C", 0.2)]).unwrap()
    }

    #[test]
    fn test_assign_prizes() {
        let table = PrizeTable::new(vec![
            SeedRecord::new("A", 2.0),
            SeedRecord::new("C", 1.5),
            SeedRecord::new("X", 9.0),
        ])
        .unwrap();
        let prizes = NodePrizes::assign(&toy(), &table).unwrap();
        assert_eq!(prizes.terminals(), &[0, 2]);
        assert_eq!(prizes.prize(1), 0.0);
        assert_eq!(prizes.dropped_seeds(), &["X".to_string()]);
        assert!((prizes.total_prize() - 3.5).abs() < 1e-10);
    }

    #[test]
    fn test_duplicate_seed_last_wins() {
        let table = PrizeTable::new(vec![
            SeedRecord::new("A", 2.0),
            SeedRecord::new("B", 1.0),
            SeedRecord::new("A", 4.0),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].prize, 4.0);
    }

    #[test]
    fn test_negative_prize_rejected() {
        let result = PrizeTable::new(vec![SeedRecord::new("A", -1.0)]);
        assert!(matches!(result, Err(PcsfError::InvalidParameter(_))));
        let result = PrizeTable::new(vec![SeedRecord::new("A", f64::NAN)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_surviving_terminals() {
        let table = PrizeTable::new(vec![SeedRecord::new("X", 1.0)]).unwrap();
        assert!(matches!(
            NodePrizes::assign(&toy(), &table),
            Err(PcsfError::NoTerminals(_))
        ));

        let zero = PrizeTable::new(vec![SeedRecord::new("A", 0.0)]).unwrap();
        assert!(NodePrizes::assign(&toy(), &zero).is_err());
    }

    #[test]
    fn test_from_de_results() {
        let rows = vec![
            DeRecord {
                gene: "A".into(),
                score: -2.5,
                padj: 0.001,
                display_name: Some("GENEA".into()),
            },
            DeRecord {
                gene: "B".into(),
                score: 1.0,
                padj: 0.2,
                display_name: None,
            },
            DeRecord {
                gene: "C".into(),
                score: 0.7,
                padj: f64::NAN,
                display_name: None,
            },
        ];
        let table = PrizeTable::from_de_results(&rows, 0.05).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].prize, 2.5);
        assert_eq!(table.records()[0].score, Some(-2.5));

        let prizes = NodePrizes::assign(&toy(), &table).unwrap();
        assert_eq!(prizes.display_name(0), Some("GENEA"));
        assert_eq!(prizes.score(0), Some(-2.5));
    }

    #[test]
    fn test_with_prizes_keeps_annotations() {
        let table = PrizeTable::new(vec![SeedRecord {
            name: "A".into(),
            prize: 1.0,
            score: Some(1.0),
            display_name: Some("a".into()),
        }])
        .unwrap();
        let prizes = NodePrizes::assign(&toy(), &table).unwrap();
        let moved = prizes.with_prizes(vec![0.0, 0.0, 1.0]);
        assert_eq!(moved.terminals(), &[2]);
        assert_eq!(moved.display_name(0), Some("a"));
    }
}
