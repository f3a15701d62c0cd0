//! Tunable thresholds for every stage of the simulation.
//!
//! Each stage owns a config struct with a `Default`; the whole tree can be
//! loaded from TOML, and missing keys keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the stochastic gossip path.
    pub seed: u64,
    pub lifecycle: LifecycleConfig,
    pub qualia: QualiaConfig,
    pub interpretation: InterpretationConfig,
    pub relations: RelationsConfig,
    pub hierarchy: HierarchyConfig,
    pub crucible: CrucibleConfig,
    pub lore: LoreConfig,
    pub gossip: GossipConfig,
    pub director: DirectorConfig,
    pub composer: ComposerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            lifecycle: LifecycleConfig::default(),
            qualia: QualiaConfig::default(),
            interpretation: InterpretationConfig::default(),
            relations: RelationsConfig::default(),
            hierarchy: HierarchyConfig::default(),
            crucible: CrucibleConfig::default(),
            lore: LoreConfig::default(),
            gossip: GossipConfig::default(),
            director: DirectorConfig::default(),
            composer: ComposerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would break engine invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.qualia.group_blend) {
            return Err(ConfigError::OutOfRange {
                field: "qualia.group_blend",
                value: self.qualia.group_blend,
            });
        }
        // Self-image must move strictly further than personality.
        if !self.crucible.self_amplifier.is_finite() || self.crucible.self_amplifier <= 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "crucible.self_amplifier",
                value: self.crucible.self_amplifier,
            });
        }
        if !(0.0..=1.0).contains(&self.gossip.auto_spread_probability) {
            return Err(ConfigError::OutOfRange {
                field: "gossip.auto_spread_probability",
                value: self.gossip.auto_spread_probability as f32,
            });
        }
        if self.composer.max_chars == 0 {
            return Err(ConfigError::OutOfRange {
                field: "composer.max_chars",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Tier promotion, freezing, and garbage collection thresholds (in turns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub secondary_mentions: u32,
    pub main_mentions: u32,
    /// Absent longer than this, a MAIN character is capped at SECONDARY.
    pub demote_after_turns: u64,
    pub freeze_after_turns: u64,
    /// Absent longer than this, a low-interaction EXTRA is removed.
    pub gc_after_turns: u64,
    pub gc_max_interactions: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            secondary_mentions: 3,
            main_mentions: 10,
            demote_after_turns: 40,
            freeze_after_turns: 20,
            gc_after_turns: 60,
            gc_max_interactions: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualiaConfig {
    /// Intensity at which witnesses feel an event, relative to participants.
    pub witness_scale: f32,
    /// Pull toward the group mean per resonance pass.
    pub group_blend: f32,
    /// Fraction of the gap to baseline recovered per off-screen hour.
    pub settle_per_hour: f32,
}

impl Default for QualiaConfig {
    fn default() -> Self {
        Self {
            witness_scale: 0.5,
            group_blend: 0.15,
            settle_per_hour: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpretationConfig {
    pub positive_valence: f32,
    pub suspicious_tension: f32,
    pub warm_amplifier: f32,
    pub warm_dampener: f32,
    /// Multiplier applied to positive events read suspiciously (negative inverts).
    pub suspicious_inversion: f32,
    pub hostile_amplifier: f32,
    pub suspicion_trust_penalty: f32,
    pub warmth_trust_bonus: f32,
    /// Strength of legend feedback on perception.
    pub legend_gain: f32,
    pub legend_potential_scale: f32,
}

impl Default for InterpretationConfig {
    fn default() -> Self {
        Self {
            positive_valence: 0.7,
            suspicious_tension: 0.8,
            warm_amplifier: 1.5,
            warm_dampener: 0.5,
            suspicious_inversion: -0.5,
            hostile_amplifier: 1.25,
            suspicion_trust_penalty: -5.0,
            warmth_trust_bonus: 2.0,
            legend_gain: 0.5,
            legend_potential_scale: 500.0,
        }
    }
}

/// Which relationship representation receives event deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RelationMode {
    #[default]
    Perception,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationsConfig {
    pub mode: RelationMode,
    /// Share of an event the actor takes in about its own target.
    pub reciprocity: f32,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            mode: RelationMode::Perception,
            reciprocity: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Witnesses must respect the actor above this to amplify.
    pub witness_respect_cutoff: f32,
    pub witness_weight: f32,
    pub max_amplification: f32,
    /// Largest capital-equivalent bonus from external performance signals.
    pub performance_bonus_cap: f32,
    pub influential_capital: f32,
    pub outcast_capital: f32,
    pub rising_star_bonus: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            witness_respect_cutoff: 60.0,
            witness_weight: 0.25,
            max_amplification: 2.0,
            performance_bonus_cap: 25.0,
            influential_capital: 200.0,
            outcast_capital: 30.0,
            rising_star_bonus: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrucibleConfig {
    /// Relation swings at or beyond this magnitude are formative.
    pub formative_magnitude: f32,
    /// Personality shift per 100 points of relation change.
    pub relation_rate: f32,
    pub goal_rate: f32,
    pub rumor_rate: f32,
    pub rumor_min_spread: u32,
    pub rumor_spread_cap: u32,
    /// Self-concept nudge relative to the personality nudge.
    pub self_amplifier: f32,
    pub divergence_threshold: f32,
}

impl Default for CrucibleConfig {
    fn default() -> Self {
        Self {
            formative_magnitude: 40.0,
            relation_rate: 0.1,
            goal_rate: 0.03,
            rumor_rate: 0.01,
            rumor_min_spread: 2,
            rumor_spread_cap: 10,
            self_amplifier: 1.5,
            divergence_threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoreConfig {
    pub potential_threshold: f32,
    /// Events to skip after a legend forms.
    pub cooldown_events: u32,
    pub archive_after_turns: u64,
}

impl Default for LoreConfig {
    fn default() -> Self {
        Self {
            potential_threshold: 150.0,
            cooldown_events: 3,
            archive_after_turns: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    /// Events below this impact do not start rumors.
    pub min_impact: f32,
    pub spin_threshold: f32,
    pub base_distortion: f32,
    pub bias_weight: f32,
    pub hop_drift: f32,
    pub auto_spread_probability: f64,
    pub reputation_scale: f32,
    pub max_rumor_age: u64,
    /// Spread at which a negative rumor reaches its subject's psyche.
    pub crucible_spread: u32,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            min_impact: 10.0,
            spin_threshold: 2.0,
            base_distortion: 0.1,
            bias_weight: 0.4,
            hop_drift: 0.05,
            auto_spread_probability: 0.1,
            reputation_scale: 20.0,
            max_rumor_age: 100,
            crucible_spread: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Distance of affection from neutral that makes a bond "strong".
    pub strong_relation_margin: f32,
    pub relation_drift: f32,
    /// Scheduled events closer than this (in hours) trigger preparation.
    pub prep_window_hours: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            strong_relation_margin: 30.0,
            relation_drift: 2.0,
            prep_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Hard budget on the rendered summary, in characters.
    pub max_chars: usize,
    pub max_legends: usize,
    pub max_perceptions_per_character: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            max_legends: 3,
            max_perceptions_per_character: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            seed = 7

            [crucible]
            divergence_threshold = 0.3

            [relations]
            mode = "Legacy"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.crucible.divergence_threshold, 0.3);
        assert_eq!(config.crucible.formative_magnitude, 40.0);
        assert_eq!(config.relations.mode, RelationMode::Legacy);
        assert_eq!(config.lore, LoreConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SimConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(SimConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_out_of_range_blend() {
        let err = SimConfig::from_toml_str("[qualia]\ngroup_blend = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "qualia.group_blend", .. }));
    }

    #[test]
    fn test_rejects_flat_self_amplifier() {
        let err = SimConfig::from_toml_str("[crucible]\nself_amplifier = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "crucible.self_amplifier", .. }));

        let mut config = SimConfig::default();
        config.gossip.auto_spread_probability = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            SimConfig::from_toml_str("seed = ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
