//! Session configuration handed over by the lobby/matchmaking collaborator.

use log::warn;
use shared::{Aabb, Vec3, DEFAULT_FINISH_SCORE, DEFAULT_ROUND_SECS};
use std::collections::HashMap;

/// Tunables supplied at session start. Values the lobby omits or garbles
/// fall back to defaults.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Star count at which a player wins the game.
    pub finish_score: u32,
    /// Host-enforced round duration in seconds.
    pub round_secs: u64,
    /// Spawn points players are reset to at round start.
    pub spawn_points: Vec<Vec3>,
    /// Static level geometry placements may not overlap.
    pub static_geometry: Vec<Aabb>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            finish_score: DEFAULT_FINISH_SCORE,
            round_secs: DEFAULT_ROUND_SECS,
            spawn_points: Vec::new(),
            static_geometry: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Builds a config from the lobby's string property bag.
    pub fn from_properties(properties: &HashMap<String, String>) -> Self {
        let mut config = Self::default();

        config.finish_score = parse_or(properties, "finish_score", DEFAULT_FINISH_SCORE);
        config.round_secs = parse_or(properties, "round_secs", DEFAULT_ROUND_SECS);

        config
    }
}

fn parse_or<T: std::str::FromStr + Copy>(
    properties: &HashMap<String, String>,
    key: &str,
    default: T,
) -> T {
    match properties.get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Unparsable session property {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.finish_score, DEFAULT_FINISH_SCORE);
        assert_eq!(config.round_secs, DEFAULT_ROUND_SECS);
        assert!(config.spawn_points.is_empty());
    }

    #[test]
    fn test_from_properties() {
        let mut properties = HashMap::new();
        properties.insert("finish_score".to_string(), "8".to_string());
        properties.insert("round_secs".to_string(), "45".to_string());

        let config = SessionConfig::from_properties(&properties);
        assert_eq!(config.finish_score, 8);
        assert_eq!(config.round_secs, 45);
    }

    #[test]
    fn test_unparsable_property_falls_back() {
        let mut properties = HashMap::new();
        properties.insert("finish_score".to_string(), "lots".to_string());

        let config = SessionConfig::from_properties(&properties);
        assert_eq!(config.finish_score, DEFAULT_FINISH_SCORE);
    }
}
