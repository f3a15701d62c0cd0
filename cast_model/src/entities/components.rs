//! Component definitions for characters.
//!
//! Every bounded component exposes `clamp()` so callers can restore its
//! invariants after a mutation, and `sanitize` paths after a reload.

use serde::{Deserialize, Serialize};

use crate::mechanics::{
    clamp_capital, clamp_score, clamp_unit, PerceptionAxis, SocialStatus, TraitAxis,
};

/// Objective personality, each axis in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    pub trust: f32,
    pub bravery: f32,
    pub idealism: f32,
    pub aggression: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            trust: 0.5,
            bravery: 0.5,
            idealism: 0.5,
            aggression: 0.3,
        }
    }
}

impl Personality {
    pub fn get(&self, axis: TraitAxis) -> f32 {
        match axis {
            TraitAxis::Trust => self.trust,
            TraitAxis::Bravery => self.bravery,
            TraitAxis::Idealism => self.idealism,
            TraitAxis::Aggression => self.aggression,
        }
    }

    /// Shift one axis, returning the delta actually applied after clamping.
    pub fn shift(&mut self, axis: TraitAxis, delta: f32) -> f32 {
        let slot = match axis {
            TraitAxis::Trust => &mut self.trust,
            TraitAxis::Bravery => &mut self.bravery,
            TraitAxis::Idealism => &mut self.idealism,
            TraitAxis::Aggression => &mut self.aggression,
        };
        let before = *slot;
        *slot = clamp_unit(before + delta);
        *slot - before
    }

    pub fn clamp(&mut self) {
        self.trust = clamp_unit(self.trust);
        self.bravery = clamp_unit(self.bravery);
        self.idealism = clamp_unit(self.idealism);
        self.aggression = clamp_unit(self.aggression);
    }
}

/// What a character believes about its own personality.
///
/// Mirrors [`Personality`] but evolves independently and may diverge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfConcept {
    pub perceived_trust: f32,
    pub perceived_bravery: f32,
    pub perceived_idealism: f32,
    pub perceived_aggression: f32,
}

impl Default for SelfConcept {
    fn default() -> Self {
        Self::mirror(&Personality::default())
    }
}

impl SelfConcept {
    /// A self-concept that matches the given personality exactly.
    pub fn mirror(personality: &Personality) -> Self {
        Self {
            perceived_trust: personality.trust,
            perceived_bravery: personality.bravery,
            perceived_idealism: personality.idealism,
            perceived_aggression: personality.aggression,
        }
    }

    pub fn get(&self, axis: TraitAxis) -> f32 {
        match axis {
            TraitAxis::Trust => self.perceived_trust,
            TraitAxis::Bravery => self.perceived_bravery,
            TraitAxis::Idealism => self.perceived_idealism,
            TraitAxis::Aggression => self.perceived_aggression,
        }
    }

    /// Shift one axis, returning the delta actually applied after clamping.
    pub fn shift(&mut self, axis: TraitAxis, delta: f32) -> f32 {
        let slot = match axis {
            TraitAxis::Trust => &mut self.perceived_trust,
            TraitAxis::Bravery => &mut self.perceived_bravery,
            TraitAxis::Idealism => &mut self.perceived_idealism,
            TraitAxis::Aggression => &mut self.perceived_aggression,
        };
        let before = *slot;
        *slot = clamp_unit(before + delta);
        *slot - before
    }

    pub fn clamp(&mut self) {
        self.perceived_trust = clamp_unit(self.perceived_trust);
        self.perceived_bravery = clamp_unit(self.perceived_bravery);
        self.perceived_idealism = clamp_unit(self.perceived_idealism);
        self.perceived_aggression = clamp_unit(self.perceived_aggression);
    }
}

/// Ephemeral phenomenal state that colors how events are read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualiaState {
    pub somatic_tension: f32,
    pub valence: f32,
    /// How widely attention is spread. Narrows under threat.
    pub focus_aperture: f32,
    pub energy_level: f32,
}

impl Default for QualiaState {
    fn default() -> Self {
        Self::baseline()
    }
}

impl QualiaState {
    /// The neutral resting state.
    pub const fn baseline() -> Self {
        Self {
            somatic_tension: 0.3,
            valence: 0.5,
            focus_aperture: 0.5,
            energy_level: 0.6,
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [
            self.somatic_tension,
            self.valence,
            self.focus_aperture,
            self.energy_level,
        ]
    }

    pub fn from_array(values: [f32; 4]) -> Self {
        let mut state = Self {
            somatic_tension: values[0],
            valence: values[1],
            focus_aperture: values[2],
            energy_level: values[3],
        };
        state.clamp();
        state
    }

    pub fn clamp(&mut self) {
        self.somatic_tension = clamp_unit(self.somatic_tension);
        self.valence = clamp_unit(self.valence);
        self.focus_aperture = clamp_unit(self.focus_aperture);
        self.energy_level = clamp_unit(self.energy_level);
    }

    /// Short mood word for summaries.
    pub fn mood_label(&self) -> &'static str {
        if self.somatic_tension > 0.8 {
            "on edge"
        } else if self.valence > 0.7 {
            "buoyant"
        } else if self.valence < 0.3 {
            "downcast"
        } else if self.energy_level < 0.25 {
            "drained"
        } else {
            "steady"
        }
    }
}

/// One character's asymmetric view of another, each sub-score in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Perception {
    pub affection: f32,
    pub trust: f32,
    pub respect: f32,
    pub rivalry: f32,
}

impl Default for Perception {
    fn default() -> Self {
        Self {
            affection: 50.0,
            trust: 50.0,
            respect: 50.0,
            rivalry: 0.0,
        }
    }
}

impl Perception {
    /// Seed a perception from a legacy scalar relation in `[-100, 100]`.
    pub fn from_legacy(score: f32) -> Self {
        let mut perception = Self {
            affection: 50.0 + score / 2.0,
            trust: 50.0 + score / 4.0,
            ..Self::default()
        };
        perception.clamp();
        perception
    }

    pub fn get(&self, axis: PerceptionAxis) -> f32 {
        match axis {
            PerceptionAxis::Affection => self.affection,
            PerceptionAxis::Trust => self.trust,
            PerceptionAxis::Respect => self.respect,
            PerceptionAxis::Rivalry => self.rivalry,
        }
    }

    /// Adjust one sub-score, returning the delta actually applied.
    pub fn adjust(&mut self, axis: PerceptionAxis, delta: f32) -> f32 {
        let slot = match axis {
            PerceptionAxis::Affection => &mut self.affection,
            PerceptionAxis::Trust => &mut self.trust,
            PerceptionAxis::Respect => &mut self.respect,
            PerceptionAxis::Rivalry => &mut self.rivalry,
        };
        let before = *slot;
        *slot = clamp_score(before + delta);
        *slot - before
    }

    pub fn clamp(&mut self) {
        self.affection = clamp_score(self.affection);
        self.trust = clamp_score(self.trust);
        self.respect = clamp_score(self.respect);
        self.rivalry = clamp_score(self.rivalry);
    }
}

/// Social standing within the group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialStanding {
    pub status: SocialStatus,
    /// Influence proxy in `[0, 300]`.
    pub capital: f32,
    /// Alignment with group norms in `[0, 1]`.
    pub conformity: f32,
}

impl Default for SocialStanding {
    fn default() -> Self {
        Self {
            status: SocialStatus::Member,
            capital: 100.0,
            conformity: 0.5,
        }
    }
}

impl SocialStanding {
    pub fn clamp(&mut self) {
        self.capital = clamp_capital(self.capital);
        self.conformity = clamp_unit(self.conformity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personality_shift_reports_clamped_delta() {
        let mut personality = Personality {
            trust: 0.95,
            ..Default::default()
        };
        let applied = personality.shift(TraitAxis::Trust, 0.2);
        assert!((applied - 0.05).abs() < 1e-6);
        assert_eq!(personality.trust, 1.0);
    }

    #[test]
    fn test_self_concept_mirrors_personality() {
        let personality = Personality {
            trust: 0.2,
            bravery: 0.9,
            idealism: 0.4,
            aggression: 0.1,
        };
        let concept = SelfConcept::mirror(&personality);
        for axis in TraitAxis::ALL {
            assert_eq!(concept.get(axis), personality.get(axis));
        }
    }

    #[test]
    fn test_perception_adjust_clamps() {
        let mut perception = Perception::default();
        let applied = perception.adjust(PerceptionAxis::Affection, 80.0);
        assert_eq!(perception.affection, 100.0);
        assert_eq!(applied, 50.0);
        perception.adjust(PerceptionAxis::Rivalry, -10.0);
        assert_eq!(perception.rivalry, 0.0);
    }

    #[test]
    fn test_perception_from_legacy() {
        let warm = Perception::from_legacy(60.0);
        assert_eq!(warm.affection, 80.0);
        let cold = Perception::from_legacy(-200.0);
        assert_eq!(cold.affection, 0.0);
    }

    #[test]
    fn test_qualia_from_array_clamps() {
        let state = QualiaState::from_array([1.5, -0.1, 0.5, 0.5]);
        assert_eq!(state.somatic_tension, 1.0);
        assert_eq!(state.valence, 0.0);
    }

    #[test]
    fn test_mood_label() {
        let tense = QualiaState {
            somatic_tension: 0.9,
            ..QualiaState::baseline()
        };
        assert_eq!(tense.mood_label(), "on edge");
        assert_eq!(QualiaState::baseline().mood_label(), "steady");
    }
}
