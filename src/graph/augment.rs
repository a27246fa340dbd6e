//! Cost transform and the solver's view of the graph.
//!
//! Every real edge gets the hub-penalised cost
//!
//! ```text
//! c*(e) = c(e) + dx*dy / (dx*dy + (N-dx-1)*(N-dy-1)) * 10^g
//! ```
//!
//! where `dx`, `dy` are endpoint degrees in the full, unperturbed network and
//! `N` is its node count. The synthetic root and its edges of cost `w` are not
//! materialised; the solver derives them from [`AugmentedGraph::w`] and
//! [`AugmentedGraph::dummy_mode`].

use crate::error::{PcsfError, Result};
use crate::graph::interactome::{EdgeId, Interactome};
use crate::graph::params::{DummyMode, PcsfParams};

/// Hub penalty for every edge, in edge order.
pub fn hub_penalties(interactome: &Interactome, hub_scale: f64) -> Vec<f64> {
    if hub_scale == 0.0 {
        return vec![0.0; interactome.n_edges()];
    }
    let n = interactome.n_nodes() as f64;
    let degrees = interactome.degrees();
    interactome
        .edges()
        .iter()
        .map(|edge| {
            let dx = degrees[edge.source] as f64;
            let dy = degrees[edge.target] as f64;
            let numerator = dx * dy;
            let denominator = numerator + (n - dx - 1.0) * (n - dy - 1.0);
            if denominator == 0.0 {
                0.0
            } else {
                numerator / denominator * hub_scale
            }
        })
        .collect()
}

/// Interactome with transformed costs and root wiring.
#[derive(Debug, Clone)]
pub struct AugmentedGraph<'a> {
    interactome: &'a Interactome,
    costs: Vec<f64>,
    w: f64,
    dummy_mode: DummyMode,
}

impl<'a> AugmentedGraph<'a> {
    /// Apply the cost transform for `params`.
    pub fn new(interactome: &'a Interactome, params: &PcsfParams) -> Result<Self> {
        params.validate()?;
        let penalties = hub_penalties(interactome, params.hub_scale());
        let costs = interactome
            .edges()
            .iter()
            .zip(&penalties)
            .map(|(edge, penalty)| edge.cost + penalty)
            .collect();
        Self::from_costs(interactome, costs, params.w, params.dummy_mode)
    }

    /// Use explicit costs (one per edge).
    pub fn from_costs(
        interactome: &'a Interactome,
        costs: Vec<f64>,
        w: f64,
        dummy_mode: DummyMode,
    ) -> Result<Self> {
        if costs.len() != interactome.n_edges() {
            return Err(PcsfError::InvalidParameter(format!(
                "expected {} edge costs, got {}",
                interactome.n_edges(),
                costs.len()
            )));
        }
        if let Some((idx, cost)) = costs
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_finite() || **c < 0.0)
        {
            return Err(PcsfError::InvalidParameter(format!(
                "edge {} has invalid cost {}",
                idx, cost
            )));
        }
        if !w.is_finite() || w <= 0.0 {
            return Err(PcsfError::InvalidParameter(format!(
                "w must be finite and > 0, got {}",
                w
            )));
        }
        Ok(Self {
            interactome,
            costs,
            w,
            dummy_mode,
        })
    }

    /// Same graph with replaced edge costs.
    pub fn with_costs(&self, costs: Vec<f64>) -> Result<Self> {
        Self::from_costs(self.interactome, costs, self.w, self.dummy_mode)
    }

    /// Same graph with a different dummy edge cost.
    pub fn with_w(&self, w: f64) -> Result<Self> {
        Self::from_costs(self.interactome, self.costs.clone(), w, self.dummy_mode)
    }

    pub fn interactome(&self) -> &'a Interactome {
        self.interactome
    }

    /// Transformed cost of a real edge.
    pub fn cost(&self, edge: EdgeId) -> f64 {
        self.costs[edge]
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Dummy edge cost.
    pub fn w(&self) -> f64 {
        self.w
    }

    pub fn dummy_mode(&self) -> DummyMode {
        self.dummy_mode
    }
}
