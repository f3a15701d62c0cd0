//! Information engine - the same event means different things to different
//! people.
//!
//! A character's qualia decides how an event is read before it touches any
//! relationship: a tense character hears a compliment as sarcasm, a content
//! one hears it as sincere. Remembered legends of the same kind make the
//! reading louder.

use cast_model::{CastState, Character, CharacterId, InterpretationConfig, Perception, PerceptionAxis};
use serde::{Deserialize, Serialize};

use crate::events::{EventKind, InteractionCategory, StoryEvent};
use crate::lore::{LegendId, LegendKind, LoreEngine, NormsEngine};

/// How an observer read an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reading {
    Sincere,
    Playful,
    Sarcasm,
    Hostile,
    Neutral,
}

impl Reading {
    pub fn label(&self) -> &'static str {
        match self {
            Reading::Sincere => "sincere",
            Reading::Playful => "playful",
            Reading::Sarcasm => "sarcasm",
            Reading::Hostile => "hostile",
            Reading::Neutral => "neutral",
        }
    }

    pub fn is_suspicious(&self) -> bool {
        matches!(self, Reading::Sarcasm | Reading::Hostile)
    }
}

/// One observer's subjective take on one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub reading: Reading,
    /// Signed affection change the observer will apply.
    pub subjective_modifier: f32,
    pub trust_modifier: Option<f32>,
    pub respect_modifier: f32,
    pub rivalry_modifier: f32,
    /// Legend that amplified this reading, if any.
    pub legend: Option<LegendId>,
}

impl Interpretation {
    pub fn label(&self) -> &'static str {
        self.reading.label()
    }

    /// Scale every change, e.g. for the actor's weaker reciprocal reading.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            subjective_modifier: self.subjective_modifier * factor,
            trust_modifier: self.trust_modifier.map(|t| t * factor),
            respect_modifier: self.respect_modifier * factor,
            rivalry_modifier: self.rivalry_modifier * factor,
            ..self.clone()
        }
    }
}

/// Respect and rivalry weights applied to the subjective modifier.
fn perception_weights(kind: &EventKind) -> (f32, f32) {
    match kind {
        EventKind::Interaction { category, .. } => match category {
            InteractionCategory::Social => (0.1, 0.0),
            InteractionCategory::Combat => (0.3, 0.3),
            InteractionCategory::Romance => (0.0, 0.0),
            InteractionCategory::Betrayal => (0.2, 0.4),
            InteractionCategory::Achievement => (0.5, 0.1),
            InteractionCategory::Sacrifice => (0.5, 0.0),
            InteractionCategory::Loss => (0.0, 0.0),
            InteractionCategory::Discovery => (0.2, 0.0),
        },
        EventKind::RelationChange { .. } => (0.1, 0.2),
        EventKind::GoalComplete { .. } => (0.5, 0.1),
        EventKind::RumorSpread { .. } => (0.3, 0.0),
        EventKind::Unknown { .. } => (0.0, 0.0),
    }
}

#[derive(Debug, Clone, Default)]
pub struct InformationEngine {
    config: InterpretationConfig,
}

impl InformationEngine {
    pub fn new(config: InterpretationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterpretationConfig {
        &self.config
    }

    /// Read an event through a character's current qualia.
    ///
    /// Tension is checked before valence: a character on edge reads
    /// suspiciously even when otherwise in a good mood.
    pub fn interpret(
        &self,
        character: &Character,
        event: &StoryEvent,
        lore: &LoreEngine,
        norms: &NormsEngine,
    ) -> Interpretation {
        let config = &self.config;
        let base = event.kind.signed_modifier() * event.intensity;
        let positive = base >= 0.0;
        let qualia = &character.qualia;

        let (reading, mut modifier, trust_modifier) =
            if base.abs() < f32::EPSILON || !base.is_finite() {
                // Nothing to read into.
                (Reading::Neutral, 0.0, None)
            } else if qualia.somatic_tension > config.suspicious_tension {
                if positive {
                    (
                        Reading::Sarcasm,
                        base * config.suspicious_inversion,
                        Some(config.suspicion_trust_penalty),
                    )
                } else {
                    (
                        Reading::Hostile,
                        base * config.hostile_amplifier,
                        Some(config.suspicion_trust_penalty),
                    )
                }
            } else if qualia.valence > config.positive_valence {
                if positive {
                    (
                        Reading::Sincere,
                        base * config.warm_amplifier,
                        Some(config.warmth_trust_bonus),
                    )
                } else {
                    (Reading::Playful, base * config.warm_dampener, None)
                }
            } else {
                (Reading::Neutral, base, None)
            };

        let kind = LegendKind::from_event(&event.kind);
        let legend = lore.relevant_legend(&kind).map(|legend| {
            let potential = legend.potential.max(0.0);
            let saturation =
                potential / (potential + config.legend_potential_scale.max(f32::EPSILON));
            modifier *=
                1.0 + config.legend_gain * saturation * (0.5 + norms.norm_strength(&kind.key()));
            legend.id
        });

        tracing::trace!(
            target: "information.interpret",
            observer = %character.id,
            reading = reading.label(),
            modifier,
            "event interpreted"
        );

        let (respect_weight, rivalry_weight) = perception_weights(&event.kind);
        Interpretation {
            reading,
            subjective_modifier: modifier,
            trust_modifier,
            respect_modifier: modifier * respect_weight,
            rivalry_modifier: -modifier * rivalry_weight,
            legend,
        }
    }

    /// Apply an interpretation to the observer's view of the subject.
    ///
    /// Only the observer's perception changes; the subject's view of the
    /// observer is untouched. A pair known only through a legacy scalar is
    /// seeded from it. Returns the affection delta actually applied.
    pub fn update_perception(
        &self,
        cast: &mut CastState,
        observer: &CharacterId,
        subject: &CharacterId,
        interpretation: &Interpretation,
    ) -> f32 {
        if observer == subject || observer.is_blank() || subject.is_blank() {
            return 0.0;
        }
        let legacy = cast.legacy_relation(observer, subject);
        let perception = cast
            .ensure(observer)
            .perceptions
            .entry(subject.clone())
            .or_insert_with(|| legacy.map(Perception::from_legacy).unwrap_or_default());

        let applied = perception.adjust(PerceptionAxis::Affection, interpretation.subjective_modifier);
        if let Some(trust) = interpretation.trust_modifier {
            perception.adjust(PerceptionAxis::Trust, trust);
        }
        perception.adjust(PerceptionAxis::Respect, interpretation.respect_modifier);
        perception.adjust(PerceptionAxis::Rivalry, interpretation.rivalry_modifier);
        applied
    }
}
