//! Solver parameters shared by the cost transform, the forest solver and the
//! randomized ensemble.

use crate::error::{PcsfError, Result};
use serde::{Deserialize, Serialize};

/// How the synthetic root is wired into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DummyMode {
    /// Root connects to every terminal at cost `w`.
    #[default]
    Terminals,
    /// Root connects to every node at cost `w`. Only terminals can profit
    /// from a root edge, so this solves identically to `Terminals`.
    All,
    /// Root connects to non-terminals only; a terminal reaches the root
    /// through its cheapest non-terminal neighbourhood.
    Others,
}

impl std::fmt::Display for DummyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DummyMode::Terminals => write!(f, "terminals"),
            DummyMode::All => write!(f, "all"),
            DummyMode::Others => write!(f, "others"),
        }
    }
}

/// Parameters of a single PCSF solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PcsfParams {
    /// Cost of every dummy edge. Controls how many trees the forest has.
    pub w: f64,
    /// Multiplier applied to every prize.
    pub b: f64,
    /// Hub penalty exponent. `0` disables the penalty. The switch is
    /// discrete: any `g > 0` scales the penalty by `10^g >= 1`, so a small
    /// positive `g` already applies roughly the full degree term.
    pub g: f64,
    /// Relative amplitude of the uniform edge-cost noise used by ensembles.
    pub edge_noise: f64,
    /// Root wiring.
    pub dummy_mode: DummyMode,
    /// Base seed for every randomized run.
    pub seed: u64,
}

impl Default for PcsfParams {
    fn default() -> Self {
        Self {
            w: 5.0,
            b: 1.0,
            g: 3.0,
            edge_noise: 0.1,
            dummy_mode: DummyMode::Terminals,
            seed: 42,
        }
    }
}

impl PcsfParams {
    /// Create parameters with the given `w` and `b`, other fields default.
    pub fn new(w: f64, b: f64) -> Self {
        Self {
            w,
            b,
            ..Default::default()
        }
    }

    /// Set the dummy edge cost.
    pub fn with_w(mut self, w: f64) -> Self {
        self.w = w;
        self
    }

    /// Set the prize multiplier.
    pub fn with_b(mut self, b: f64) -> Self {
        self.b = b;
        self
    }

    /// Set the hub penalty exponent.
    pub fn with_g(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    /// Set the edge noise amplitude.
    pub fn with_edge_noise(mut self, edge_noise: f64) -> Self {
        self.edge_noise = edge_noise;
        self
    }

    /// Set the root wiring.
    pub fn with_dummy_mode(mut self, dummy_mode: DummyMode) -> Self {
        self.dummy_mode = dummy_mode;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every field against its domain.
    pub fn validate(&self) -> Result<()> {
        if !self.w.is_finite() || self.w <= 0.0 {
            return Err(PcsfError::InvalidParameter(format!(
                "w must be finite and > 0, got {}",
                self.w
            )));
        }
        if !self.b.is_finite() || self.b < 1.0 {
            return Err(PcsfError::InvalidParameter(format!(
                "b must be finite and >= 1, got {}",
                self.b
            )));
        }
        if !self.g.is_finite() || self.g < 0.0 {
            return Err(PcsfError::InvalidParameter(format!(
                "g must be finite and >= 0, got {}",
                self.g
            )));
        }
        if !self.edge_noise.is_finite() || self.edge_noise < 0.0 {
            return Err(PcsfError::InvalidParameter(format!(
                "edge_noise must be finite and >= 0, got {}",
                self.edge_noise
            )));
        }
        Ok(())
    }

    /// Scale factor of the hub penalty term, `10^g`, or 0 when disabled.
    pub fn hub_scale(&self) -> f64 {
        if self.g == 0.0 {
            0.0
        } else {
            10f64.powf(self.g)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = PcsfParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.dummy_mode, DummyMode::Terminals);
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PcsfParams::default().with_w(0.0).validate().is_err());
        assert!(PcsfParams::default().with_w(f64::NAN).validate().is_err());
        assert!(PcsfParams::default().with_b(0.5).validate().is_err());
        assert!(PcsfParams::default().with_g(-1.0).validate().is_err());
        assert!(PcsfParams::default().with_edge_noise(-0.1).validate().is_err());
    }

    #[test]
    fn test_hub_scale() {
        assert_eq!(PcsfParams::default().with_g(0.0).hub_scale(), 0.0);
        assert!((PcsfParams::default().with_g(2.0).hub_scale() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_hub_scale_jumps_at_zero() {
        let off = PcsfParams::default().with_g(0.0).hub_scale();
        let tiny = PcsfParams::default().with_g(0.001).hub_scale();
        assert_eq!(off, 0.0);
        assert!(tiny >= 1.0);
        assert!((tiny - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_dummy_mode_yaml() {
        let params = PcsfParams::default().with_dummy_mode(DummyMode::Others);
        let yaml = serde_yaml::to_string(&params).unwrap();
        assert!(yaml.contains("dummy_mode: others"));
        let parsed: PcsfParams = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.dummy_mode, DummyMode::Others);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: PcsfParams = serde_yaml::from_str("w: 2.5\n").unwrap();
        assert_eq!(parsed.w, 2.5);
        assert_eq!(parsed.b, 1.0);
        assert_eq!(parsed.seed, 42);
    }
}
