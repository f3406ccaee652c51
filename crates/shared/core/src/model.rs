//! Model variant descriptions
//!
//! The models themselves live behind the inference boundary. The core only
//! needs each variant's identifier and sequence length; the remaining fields
//! are descriptive constants reported with every response.

use crate::error::{Error, Result};
use crate::features::VALUES_PER_LEVEL;
use serde::{Deserialize, Serialize};

/// One participating model variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Key used in responses and engine URLs (e.g., "tlob")
    pub id: String,
    pub name: String,
    pub architecture: String,
    /// Window length fed to this model
    pub sequence_size: usize,
    pub num_layers: u32,
    pub hidden_dim: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_heads: Option<u32>,
    /// Feature width expected by the model (4 · depth)
    pub features: usize,
    #[serde(default)]
    pub description: String,
}

impl ModelSpec {
    /// Transformer-based short-horizon model
    pub fn tlob() -> Self {
        Self {
            id: "tlob".to_string(),
            name: "TLOB (Transformer for Limit Order Books)".to_string(),
            architecture: "Transformer-based".to_string(),
            sequence_size: 128,
            num_layers: 4,
            hidden_dim: 40,
            num_heads: Some(1),
            features: 40,
            description: "Uses multi-head attention to capture complex temporal patterns"
                .to_string(),
        }
    }

    /// MLP-based long-horizon model
    pub fn mlplob() -> Self {
        Self {
            id: "mlplob".to_string(),
            name: "MLPLOB (Multi-Layer Perceptron LOB)".to_string(),
            architecture: "MLP-based".to_string(),
            sequence_size: 384,
            num_layers: 3,
            hidden_dim: 40,
            num_heads: None,
            features: 40,
            description: "Efficient baseline model using deep MLP layers".to_string(),
        }
    }

    /// The two variants served by default
    pub fn defaults() -> Vec<Self> {
        vec![Self::tlob(), Self::mlplob()]
    }

    /// Check this spec against the configured book depth
    pub fn validate(&self, depth: usize) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfig("model id must not be empty".to_string()));
        }
        if self.sequence_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "model {}: sequence_size must be at least 1",
                self.id
            )));
        }
        let width = depth.checked_mul(VALUES_PER_LEVEL).ok_or_else(|| {
            Error::InvalidConfig(format!("model {}: depth {} is out of range", self.id, depth))
        })?;
        if self.features != width {
            return Err(Error::InvalidConfig(format!(
                "model {}: expects {} features but depth {} yields {}",
                self.id, self.features, depth, width
            )));
        }
        Ok(())
    }

    /// Validate a whole set of variants (unique ids, each valid)
    pub fn validate_all(models: &[Self], depth: usize) -> Result<()> {
        if models.is_empty() {
            return Err(Error::InvalidConfig("no models configured".to_string()));
        }
        for (i, model) in models.iter().enumerate() {
            model.validate(depth)?;
            if models[..i].iter().any(|m| m.id == model.id) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate model id: {}",
                    model.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(ModelSpec::validate_all(&ModelSpec::defaults(), 10).is_ok());
    }

    #[test]
    fn test_feature_width_must_match_depth() {
        assert!(ModelSpec::tlob().validate(5).is_err());
    }

    #[test]
    fn test_huge_depth_is_config_error() {
        match ModelSpec::tlob().validate(usize::MAX) {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("out of range")),
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let models = vec![ModelSpec::tlob(), ModelSpec::tlob()];
        assert!(ModelSpec::validate_all(&models, 10).is_err());
    }
}
