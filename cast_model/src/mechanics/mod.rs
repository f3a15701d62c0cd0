//! Simulation mechanics: tiers, statuses, trait axes, and value bounds.

use serde::{Deserialize, Serialize};

/// Upper bound for perception sub-scores and reputation.
pub const SCORE_MAX: f32 = 100.0;

/// Upper bound for social capital.
pub const CAPITAL_MAX: f32 = 300.0;

/// Clamp a value into the unit interval. NaN collapses to the midpoint.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp a value into `[0, SCORE_MAX]`. NaN collapses to the midpoint.
pub fn clamp_score(value: f32) -> f32 {
    if value.is_nan() {
        SCORE_MAX / 2.0
    } else {
        value.clamp(0.0, SCORE_MAX)
    }
}

/// Clamp social capital into `[0, CAPITAL_MAX]`.
pub fn clamp_capital(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, CAPITAL_MAX)
    }
}

/// Narrative importance of a character, derived from mentions and recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Tier {
    #[default]
    Extra,
    Secondary,
    Main,
}

impl Tier {
    /// How strongly formative events reshape characters of this tier.
    pub fn evolution_scale(&self) -> f32 {
        match self {
            Tier::Main => 1.0,
            Tier::Secondary => 0.6,
            Tier::Extra => 0.05,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Main => "MAIN",
            Tier::Secondary => "SECONDARY",
            Tier::Extra => "EXTRA",
        }
    }
}

/// Whether a character takes part in simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CharacterStatus {
    #[default]
    Active,
    /// Absent for a long time. State is retained but not simulated or rendered.
    Frozen,
}

/// Standing within the group, recomputed from capital percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum SocialStatus {
    Outcast,
    #[default]
    Member,
    Respected,
    Influential,
    Leader,
}

impl SocialStatus {
    /// Map a percentile in `[0, 1]` to a status band.
    pub fn from_percentile(percentile: f32) -> Self {
        match percentile {
            p if p >= 0.9 => SocialStatus::Leader,
            p if p >= 0.7 => SocialStatus::Influential,
            p if p >= 0.4 => SocialStatus::Respected,
            p if p >= 0.1 => SocialStatus::Member,
            _ => SocialStatus::Outcast,
        }
    }
}

/// The four personality axes, mirrored by the self-concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitAxis {
    Trust,
    Bravery,
    Idealism,
    Aggression,
}

impl TraitAxis {
    pub const ALL: [TraitAxis; 4] = [
        TraitAxis::Trust,
        TraitAxis::Bravery,
        TraitAxis::Idealism,
        TraitAxis::Aggression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TraitAxis::Trust => "trust",
            TraitAxis::Bravery => "bravery",
            TraitAxis::Idealism => "idealism",
            TraitAxis::Aggression => "aggression",
        }
    }

    /// Adjectives for a high and a low reading of this axis.
    pub fn adjectives(&self) -> (&'static str, &'static str) {
        match self {
            TraitAxis::Trust => ("trusting", "guarded"),
            TraitAxis::Bravery => ("brave", "cautious"),
            TraitAxis::Idealism => ("idealistic", "pragmatic"),
            TraitAxis::Aggression => ("aggressive", "gentle"),
        }
    }
}

/// The four sub-scores of one character's view of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerceptionAxis {
    Affection,
    Trust,
    Respect,
    Rivalry,
}
