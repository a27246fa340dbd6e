//! Serializable run configuration.

use crate::community::CommunityConfig;
use crate::ensemble::EnsembleConfig;
use crate::error::{PcsfError, Result};
use crate::graph::PcsfParams;
use crate::sensitivity::SensitivityConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to reproduce a network inference run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PcsfConfig {
    /// Name of the run, used in summaries.
    pub name: String,
    pub description: Option<String>,
    /// Solver parameters.
    pub params: PcsfParams,
    /// Ensemble settings. `None` runs a single unperturbed solve.
    pub ensemble: Option<EnsembleConfig>,
    /// Minimum node robustness kept in the consensus network.
    pub consensus_threshold: f64,
    pub community: CommunityConfig,
    /// Grid used by the `sweep` command.
    pub sensitivity: SensitivityConfig,
}

impl Default for PcsfConfig {
    fn default() -> Self {
        Self {
            name: "pcsf".to_string(),
            description: None,
            params: PcsfParams::default(),
            ensemble: Some(EnsembleConfig::default()),
            consensus_threshold: 0.5,
            community: CommunityConfig::default(),
            sensitivity: SensitivityConfig::default(),
        }
    }
}

impl PcsfConfig {
    /// Small ensemble and grid for quick runs.
    pub fn quick() -> Self {
        Self {
            ensemble: Some(EnsembleConfig::quick()),
            sensitivity: SensitivityConfig::quick(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_params(mut self, params: PcsfParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_ensemble(mut self, ensemble: Option<EnsembleConfig>) -> Self {
        self.ensemble = ensemble;
        self
    }

    pub fn with_consensus_threshold(mut self, threshold: f64) -> Self {
        self.consensus_threshold = threshold;
        self
    }

    pub fn with_community(mut self, community: CommunityConfig) -> Self {
        self.community = community;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: SensitivityConfig) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Check every section before anything is solved.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if !(0.0..=1.0).contains(&self.consensus_threshold) {
            return Err(PcsfError::InvalidParameter(format!(
                "consensus threshold must be in [0, 1], got {}",
                self.consensus_threshold
            )));
        }
        if let Some(ensemble) = &self.ensemble {
            if ensemble.noisy_edge_reps == 0 {
                return Err(PcsfError::InvalidParameter(
                    "ensemble needs at least one noisy-edge repetition for robustness".into(),
                ));
            }
        }
        self.community.validate()?;
        self.sensitivity.validate()?;
        Ok(())
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(PcsfError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(PcsfError::from)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DummyMode;

    #[test]
    fn test_default_is_valid() {
        assert!(PcsfConfig::default().validate().is_ok());
        assert!(PcsfConfig::quick().validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PcsfConfig::quick()
            .with_name("tp53")
            .with_params(PcsfParams::new(2.0, 4.0).with_dummy_mode(DummyMode::Others))
            .with_consensus_threshold(0.3);
        let yaml = config.to_yaml().unwrap();
        let back = PcsfConfig::from_yaml(&yaml).unwrap();
        assert_eq!(back.name, "tp53");
        assert_eq!(back.params.w, 2.0);
        assert_eq!(back.params.dummy_mode, DummyMode::Others);
        assert_eq!(back.consensus_threshold, 0.3);
        assert_eq!(back.ensemble.map(|e| e.noisy_edge_reps), Some(10));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = PcsfConfig::from_yaml("name: partial\nparams:\n  w: 3.0\n").unwrap();
        assert_eq!(config.params.w, 3.0);
        assert_eq!(config.params.b, 1.0);
        assert_eq!(config.community.min_size, 3);
        assert_eq!(config.consensus_threshold, 0.5);
    }

    #[test]
    fn test_invalid_sections() {
        let bad_threshold = PcsfConfig::default().with_consensus_threshold(1.5);
        assert!(bad_threshold.validate().is_err());

        let bad_params = PcsfConfig::default().with_params(PcsfParams::new(-1.0, 1.0));
        assert!(bad_params.validate().is_err());

        let no_noise_runs = PcsfConfig::default()
            .with_ensemble(Some(EnsembleConfig::default().with_noisy_edge_reps(0)));
        assert!(no_noise_runs.validate().is_err());
    }

    #[test]
    fn test_random_terminal_only_ensemble_rejected() {
        let ensemble = EnsembleConfig::default()
            .with_noisy_edge_reps(0)
            .with_random_terminal_reps(5);
        let config = PcsfConfig::default().with_ensemble(Some(ensemble));
        match config.validate() {
            Err(PcsfError::InvalidParameter(msg)) => assert!(msg.contains("noisy-edge")),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }
}
