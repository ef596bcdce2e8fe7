use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Evaluation Parameters
    pub triangle_weight: i32,
    pub threat_weight: i32,
    pub double_threat_weight: i32,

    // Search Parameters
    pub capture_scale: i32, // per triangle completed along the searched line
    pub win_score: i32,
    pub quiescence_depth: u8,
    pub tt_size_mb: usize,
    pub use_transposition_table: bool,
    /// Shuffles root moves before ordering so equal scores break ties randomly.
    pub shuffle_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            triangle_weight: 100,
            threat_weight: 10,
            double_threat_weight: 50,

            capture_scale: 1000,
            win_score: 1_000_000,
            quiescence_depth: 3,
            tt_size_mb: 16,
            use_transposition_table: true,
            shuffle_seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed engine config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
}

#[derive(Deserialize)]
struct EngineConfigJson {
    triangle_weight: Option<f32>,
    threat_weight: Option<f32>,
    double_threat_weight: Option<f32>,

    capture_scale: Option<f32>,
    win_score: Option<i32>,
    quiescence_depth: Option<u8>,
    tt_size_mb: Option<usize>,
    use_transposition_table: Option<bool>,
    shuffle_seed: Option<u64>,
}

impl EngineConfig {
    /// Weights are given as scale factors of the defaults; other fields are absolute.
    pub fn load_from_json(json_str: &str) -> Result<Self, ConfigError> {
        let json_config: EngineConfigJson = serde_json::from_str(json_str)?;
        let default = Self::default();

        let config = Self {
            triangle_weight: apply_scale(default.triangle_weight, json_config.triangle_weight),
            threat_weight: apply_scale(default.threat_weight, json_config.threat_weight),
            double_threat_weight: apply_scale(
                default.double_threat_weight,
                json_config.double_threat_weight,
            ),

            capture_scale: apply_scale(default.capture_scale, json_config.capture_scale),
            win_score: json_config.win_score.unwrap_or(default.win_score),
            quiescence_depth: json_config
                .quiescence_depth
                .unwrap_or(default.quiescence_depth),
            tt_size_mb: json_config.tt_size_mb.unwrap_or(default.tt_size_mb),
            use_transposition_table: json_config
                .use_transposition_table
                .unwrap_or(default.use_transposition_table),
            shuffle_seed: json_config.shuffle_seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.win_score <= 0 {
            return Err(ConfigError::NotPositive { field: "win_score" });
        }
        if self.capture_scale <= 0 {
            return Err(ConfigError::NotPositive {
                field: "capture_scale",
            });
        }
        Ok(())
    }

    /// Iterative deepening ceiling for a given line length. Longer lines mean
    /// fewer candidate moves, so the search can afford to go deeper.
    pub const fn max_depth_for(required_line_length: u8) -> u8 {
        match required_line_length {
            1 => 5,
            2 => 6,
            3 => 7,
            4 | 5 => 8,
            _ => 6,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn apply_scale(default_val: i32, scale: Option<f32>) -> i32 {
    scale.map_or(default_val, |s| (default_val as f32 * s) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_default() {
        let config = EngineConfig::load_from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.triangle_weight, 100);
        assert_eq!(config.win_score, 1_000_000);
    }

    #[test]
    fn test_load_config_scaled() {
        let json = r#"{
            "threat_weight": 1.5,
            "capture_scale": 0.5
        }"#;
        let config = EngineConfig::load_from_json(json).unwrap();
        assert_eq!(config.threat_weight, 15);
        assert_eq!(config.capture_scale, 500);
        assert_eq!(config.double_threat_weight, 50);
    }

    #[test]
    fn test_load_config_absolute_fields() {
        let json = r#"{
            "quiescence_depth": 5,
            "tt_size_mb": 4,
            "use_transposition_table": false,
            "shuffle_seed": 7
        }"#;
        let config = EngineConfig::load_from_json(json).unwrap();
        assert_eq!(config.quiescence_depth, 5);
        assert_eq!(config.tt_size_mb, 4);
        assert!(!config.use_transposition_table);
        assert_eq!(config.shuffle_seed, Some(7));
    }

    #[test]
    fn test_load_config_invalid_json() {
        let result = EngineConfig::load_from_json("{ invalid json }");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_config_rejects_non_positive() {
        let result = EngineConfig::load_from_json(r#"{ "capture_scale": 0.0 }"#);
        assert!(matches!(
            result,
            Err(ConfigError::NotPositive {
                field: "capture_scale"
            })
        ));
    }

    #[test]
    fn test_deserialize_absolute_config() {
        let json = r#"{
            "triangle_weight": 123,
            "win_score": 5000
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.triangle_weight, 123);
        assert_eq!(config.win_score, 5000);
        assert_eq!(config.threat_weight, 10);
    }

    #[test]
    fn test_depth_policy() {
        assert_eq!(EngineConfig::max_depth_for(1), 5);
        assert_eq!(EngineConfig::max_depth_for(2), 6);
        assert_eq!(EngineConfig::max_depth_for(3), 7);
        assert_eq!(EngineConfig::max_depth_for(4), 8);
        assert_eq!(EngineConfig::max_depth_for(5), 8);
        assert_eq!(EngineConfig::max_depth_for(9), 6);
    }
}
