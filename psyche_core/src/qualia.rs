//! Qualia engine - how events feel, before anyone thinks about them.

use cast_model::{CastState, Character, CharacterId, QualiaConfig, QualiaState};

use crate::events::{EventKind, InteractionCategory, Spin, StoryEvent};

/// Per-event shift applied to the four qualia fields at intensity 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualiaEffect {
    pub tension: f32,
    pub valence: f32,
    pub focus: f32,
    pub energy: f32,
}

impl QualiaEffect {
    const fn new(tension: f32, valence: f32, focus: f32, energy: f32) -> Self {
        Self {
            tension,
            valence,
            focus,
            energy,
        }
    }

    fn scaled(self, factor: f32) -> Self {
        Self::new(
            self.tension * factor,
            self.valence * factor,
            self.focus * factor,
            self.energy * factor,
        )
    }
}

/// Declared effects for specific actions, checked before category defaults.
const ACTION_EFFECTS: &[(InteractionCategory, &str, QualiaEffect)] = &[
    (InteractionCategory::Social, "compliment", QualiaEffect::new(-0.05, 0.12, 0.05, 0.05)),
    (InteractionCategory::Social, "insult", QualiaEffect::new(0.15, -0.15, -0.05, 0.05)),
    (InteractionCategory::Social, "comfort", QualiaEffect::new(-0.15, 0.1, 0.05, 0.0)),
    (InteractionCategory::Social, "threaten", QualiaEffect::new(0.25, -0.1, -0.15, 0.1)),
    (InteractionCategory::Social, "gift", QualiaEffect::new(-0.05, 0.15, 0.0, 0.05)),
    (InteractionCategory::Combat, "attack", QualiaEffect::new(0.3, -0.1, -0.2, 0.15)),
    (InteractionCategory::Combat, "defend", QualiaEffect::new(0.2, 0.0, -0.1, 0.1)),
    (InteractionCategory::Romance, "kiss", QualiaEffect::new(0.05, 0.2, -0.05, 0.1)),
    (InteractionCategory::Romance, "reject", QualiaEffect::new(0.15, -0.2, 0.0, -0.1)),
];

fn category_effect(category: InteractionCategory) -> QualiaEffect {
    match category {
        InteractionCategory::Social => QualiaEffect::new(0.0, 0.02, 0.0, 0.0),
        InteractionCategory::Combat => QualiaEffect::new(0.25, -0.05, -0.15, 0.1),
        InteractionCategory::Romance => QualiaEffect::new(0.0, 0.12, 0.0, 0.05),
        InteractionCategory::Betrayal => QualiaEffect::new(0.25, -0.25, -0.1, -0.05),
        InteractionCategory::Achievement => QualiaEffect::new(-0.1, 0.15, 0.05, 0.1),
        InteractionCategory::Sacrifice => QualiaEffect::new(0.1, -0.05, 0.1, -0.1),
        InteractionCategory::Loss => QualiaEffect::new(0.1, -0.2, -0.05, -0.15),
        InteractionCategory::Discovery => QualiaEffect::new(0.0, 0.05, 0.15, 0.05),
    }
}

/// Updates each character's phenomenal state from events and from the room.
#[derive(Debug, Clone, Default)]
pub struct QualiaEngine {
    config: QualiaConfig,
}

impl QualiaEngine {
    pub fn new(config: QualiaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualiaConfig {
        &self.config
    }

    /// The declared effect vector for an event, before intensity.
    pub fn effect_for(&self, event: &StoryEvent) -> QualiaEffect {
        match &event.kind {
            EventKind::Interaction {
                category, action, ..
            } => ACTION_EFFECTS
                .iter()
                .find(|(c, a, _)| c == category && *a == action.as_str())
                .map(|(_, _, effect)| *effect)
                .unwrap_or_else(|| category_effect(*category)),
            EventKind::RelationChange { change } => {
                let swing = (change / 200.0).clamp(-0.5, 0.5);
                QualiaEffect::new(swing.abs() * 0.3, swing, 0.0, 0.0)
            }
            EventKind::GoalComplete { success: true } => QualiaEffect::new(-0.1, 0.2, 0.05, 0.1),
            EventKind::GoalComplete { success: false } => QualiaEffect::new(0.1, -0.15, 0.0, -0.1),
            EventKind::RumorSpread {
                spin: Spin::Negative,
                ..
            } => QualiaEffect::new(0.1, -0.1, -0.05, 0.0),
            EventKind::RumorSpread {
                spin: Spin::Positive,
                ..
            } => QualiaEffect::new(-0.05, 0.08, 0.0, 0.0),
            EventKind::RumorSpread { .. } | EventKind::Unknown { .. } => QualiaEffect::default(),
        }
    }

    /// Apply an event's effect to a character at full intensity.
    pub fn resonate(&self, character: &mut Character, event: &StoryEvent) {
        self.resonate_scaled(character, event, 1.0);
    }

    /// Apply an event's effect scaled by `event.intensity * scale`.
    pub fn resonate_scaled(&self, character: &mut Character, event: &StoryEvent, scale: f32) {
        let effect = self.effect_for(event).scaled(event.intensity * scale);
        let qualia = &mut character.qualia;
        qualia.somatic_tension += effect.tension;
        qualia.valence += effect.valence;
        qualia.focus_aperture += effect.focus;
        qualia.energy_level += effect.energy;
        qualia.clamp();
    }

    /// Resonate every participant of an event; witnesses feel it less.
    pub fn resonate_event(&self, cast: &mut CastState, event: &StoryEvent) {
        for id in std::iter::once(&event.actor).chain(event.target.iter()) {
            if let Some(character) = cast.character_mut(id) {
                self.resonate(character, event);
            }
        }
        for id in &event.witnesses {
            if let Some(character) = cast.character_mut(id) {
                self.resonate_scaled(character, event, self.config.witness_scale);
            }
        }
    }

    /// Pull each named character's qualia toward the group mean.
    ///
    /// Each field moves to `x + blend * (mean - x)`, a convex combination,
    /// so bounds hold and the spread around the mean shrinks by `(1 - blend)`.
    pub fn run_group_resonance(&self, cast: &mut CastState, ids: &[CharacterId], blend_factor: f32) {
        let blend = if blend_factor.is_finite() {
            blend_factor.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut members: Vec<&CharacterId> = Vec::new();
        let mut sum = [0.0f32; 4];
        for id in ids {
            if members.contains(&id) {
                continue;
            }
            if let Some(character) = cast.character(id).filter(|c| c.is_active()) {
                for (slot, value) in sum.iter_mut().zip(character.qualia.as_array()) {
                    *slot += value;
                }
                members.push(id);
            }
        }
        if members.len() < 2 || blend == 0.0 {
            return;
        }

        let count = members.len() as f32;
        let mean = sum.map(|total| total / count);
        for id in members {
            if let Some(character) = cast.character_mut(id) {
                let current = character.qualia.as_array();
                let mut next = [0.0f32; 4];
                for idx in 0..4 {
                    next[idx] = current[idx] + blend * (mean[idx] - current[idx]);
                }
                character.qualia = QualiaState::from_array(next);
            }
        }
    }

    /// Relax toward the resting state over `hours` of off-screen time.
    pub fn settle(&self, character: &mut Character, hours: u32) {
        let rate = (self.config.settle_per_hour * hours as f32).clamp(0.0, 1.0);
        if rate == 0.0 {
            return;
        }
        let baseline = QualiaState::baseline().as_array();
        let current = character.qualia.as_array();
        let mut next = [0.0f32; 4];
        for idx in 0..4 {
            next[idx] = current[idx] * (1.0 - rate) + baseline[idx] * rate;
        }
        character.qualia = QualiaState::from_array(next);
    }
}
