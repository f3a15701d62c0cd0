//! Norms: how the group has come to judge each kind of story.

use cast_model::{clamp_unit, Character};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Legend;

/// Strength every norm starts at before any legend pulls on it.
pub const NEUTRAL_NORM: f32 = 0.5;

/// Coarse reading of a norm's strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormStance {
    Accepted,
    Neutral,
    Taboo,
}

/// Norm strength per legend-kind key, each in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormsEngine {
    strengths: BTreeMap<String, f32>,
}

impl NormsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strength of a norm; unseen keys are neutral.
    pub fn norm_strength(&self, key: &str) -> f32 {
        self.strengths.get(key).copied().unwrap_or(NEUTRAL_NORM)
    }

    pub fn stance(&self, key: &str) -> NormStance {
        match self.norm_strength(key) {
            s if s >= 0.6 => NormStance::Accepted,
            s if s <= 0.4 => NormStance::Taboo,
            _ => NormStance::Neutral,
        }
    }

    /// Pull the legend's norm toward accepted or taboo.
    ///
    /// The pull grows with the legend's potential and shrinks as the norm
    /// approaches its pole, so strength stays in `[0, 1]`.
    pub fn absorb_legend(&mut self, legend: &Legend) {
        let valence = legend.kind.moral_valence();
        if valence == 0.0 {
            return;
        }
        let potential = legend.potential.max(0.0);
        let weight = 0.05 + 0.15 * potential / (potential + 500.0);
        let pole = if valence > 0.0 { 1.0 } else { 0.0 };

        let key = legend.kind.key();
        let strength = self.strengths.entry(key.clone()).or_insert(NEUTRAL_NORM);
        *strength = clamp_unit(*strength + valence.abs() * weight * (pole - *strength));

        tracing::trace!(target: "lore.norms", norm = %key, strength = *strength, "norm shifted");
    }

    /// Nudge a character's conformity for acting out a norm.
    pub fn observe_conduct(&self, character: &mut Character, key: &str) {
        let delta = match self.stance(key) {
            NormStance::Accepted => 0.02,
            NormStance::Taboo => -0.05,
            NormStance::Neutral => return,
        };
        character.social.conformity = clamp_unit(character.social.conformity + delta);
    }

    /// All norms that have moved off neutral.
    pub fn strengths(&self) -> &BTreeMap<String, f32> {
        &self.strengths
    }

    /// Clamp every stored strength.
    pub fn sanitize(&mut self) {
        for strength in self.strengths.values_mut() {
            *strength = clamp_unit(*strength);
        }
    }
}
