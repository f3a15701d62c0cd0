//! Crucible engine - formative events reshape who a character is and,
//! more sharply, who they believe they are.
//!
//! Every nudge lands on the self-concept amplified, and the personality
//! moves no further than the self-concept actually did. Repeated pressure
//! therefore opens a gap between the two, which surfaces as an internal
//! conflict on that axis.

use cast_model::{CastState, CharacterId, CrucibleConfig, TraitAxis};
use serde::{Deserialize, Serialize};

use crate::events::{EventKind, Spin, StoryEvent};

/// An event capable of reshaping one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrucibleEvent {
    RelationChange {
        character: CharacterId,
        change: f32,
    },
    GoalComplete {
        character: CharacterId,
        success: bool,
    },
    RumorSpread {
        character: CharacterId,
        spin: Spin,
        spread_count: u32,
    },
}

impl CrucibleEvent {
    pub fn character(&self) -> &CharacterId {
        match self {
            CrucibleEvent::RelationChange { character, .. }
            | CrucibleEvent::GoalComplete { character, .. }
            | CrucibleEvent::RumorSpread { character, .. } => character,
        }
    }

    /// Crucible events carried by a story event.
    ///
    /// A relation change forms both parties, a goal forms whoever pursued it,
    /// and a rumor forms its subject (the target when named).
    pub fn from_story_event(event: &StoryEvent) -> Vec<Self> {
        match &event.kind {
            EventKind::RelationChange { change } => std::iter::once(&event.actor)
                .chain(event.target.iter())
                .map(|id| CrucibleEvent::RelationChange {
                    character: id.clone(),
                    change: change * event.intensity,
                })
                .collect(),
            EventKind::GoalComplete { success } => vec![CrucibleEvent::GoalComplete {
                character: event.actor.clone(),
                success: *success,
            }],
            EventKind::RumorSpread { spin, spread_count } => vec![CrucibleEvent::RumorSpread {
                character: event.target.clone().unwrap_or_else(|| event.actor.clone()),
                spin: *spin,
                spread_count: *spread_count,
            }],
            EventKind::Interaction { .. } | EventKind::Unknown { .. } => Vec::new(),
        }
    }
}

/// How one axis moved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitShift {
    pub axis: TraitAxis,
    pub personality_delta: f32,
    pub self_delta: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrucibleOutcome {
    pub character: CharacterId,
    pub shifts: Vec<TraitShift>,
    /// Narrator-facing line describing the change. Never empty.
    pub message: String,
    /// Axes in conflict after the change.
    pub conflicts: Vec<TraitAxis>,
}

#[derive(Debug, Clone, Default)]
pub struct CrucibleEngine {
    config: CrucibleConfig,
}

impl CrucibleEngine {
    pub fn new(config: CrucibleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CrucibleConfig {
        &self.config
    }

    /// Whether an affection swing is large enough to be formative.
    pub fn is_formative(&self, change: f32) -> bool {
        change.abs() >= self.config.formative_magnitude
    }

    /// Per-axis personality nudges before tier scaling.
    fn nudges(&self, event: &CrucibleEvent) -> Vec<(TraitAxis, f32)> {
        let config = &self.config;
        match event {
            CrucibleEvent::RelationChange { change, .. } => {
                if !change.is_finite() || !self.is_formative(*change) {
                    return Vec::new();
                }
                let nudge = change.signum() * config.relation_rate * (change.abs() / 100.0).min(1.0);
                vec![(TraitAxis::Trust, nudge), (TraitAxis::Idealism, nudge)]
            }
            CrucibleEvent::GoalComplete { success: true, .. } => vec![
                (TraitAxis::Bravery, config.goal_rate),
                (TraitAxis::Idealism, config.goal_rate),
            ],
            CrucibleEvent::GoalComplete { success: false, .. } => {
                vec![(TraitAxis::Bravery, -config.goal_rate)]
            }
            CrucibleEvent::RumorSpread {
                spin: Spin::Negative,
                spread_count,
                ..
            } if *spread_count >= config.rumor_min_spread => {
                let nudge = -config.rumor_rate * (*spread_count).min(config.rumor_spread_cap) as f32;
                vec![(TraitAxis::Trust, nudge), (TraitAxis::Bravery, nudge)]
            }
            CrucibleEvent::RumorSpread { .. } => Vec::new(),
        }
    }

    /// Reshape a character from a formative event.
    ///
    /// Returns `None` when the event is not formative or the character is
    /// unknown or frozen.
    pub fn analyze_event(&self, cast: &mut CastState, event: &CrucibleEvent) -> Option<CrucibleOutcome> {
        let nudges = self.nudges(event);
        if nudges.is_empty() {
            return None;
        }
        let character = cast.character_mut(event.character()).filter(|c| c.is_active())?;
        let scale = character.tier.evolution_scale();
        let amplifier = self.config.self_amplifier.max(1.0);

        let mut shifts = Vec::with_capacity(nudges.len());
        for (axis, nudge) in nudges {
            let nudge = nudge * scale;
            let self_delta = character.self_concept.shift(axis, nudge * amplifier);
            let bounded = if nudge.abs() > self_delta.abs() {
                self_delta
            } else {
                nudge
            };
            let personality_delta = character.personality.shift(axis, bounded);
            shifts.push(TraitShift {
                axis,
                personality_delta,
                self_delta,
            });
        }
        character.refresh_conflicts(self.config.divergence_threshold);

        let outcome = CrucibleOutcome {
            character: character.id.clone(),
            message: narrate(&character.id, event, &shifts),
            conflicts: character.conflicts.iter().copied().collect(),
            shifts,
        };
        tracing::debug!(
            target: "crucible",
            character = %outcome.character,
            tier = character.tier.label(),
            conflicts = outcome.conflicts.len(),
            "formative event"
        );
        Some(outcome)
    }
}

fn narrate(id: &CharacterId, event: &CrucibleEvent, shifts: &[TraitShift]) -> String {
    let name = if id.is_blank() { "Someone".to_string() } else { id.to_string() };
    let mut message = match event {
        CrucibleEvent::RelationChange { change, .. } if *change < 0.0 => format!(
            "{} has been wounded by a falling-out and trusts the world a little less.",
            name
        ),
        CrucibleEvent::RelationChange { .. } => format!(
            "{} has been warmed by a new bond and believes a little more in others.",
            name
        ),
        CrucibleEvent::GoalComplete { success: true, .. } => {
            format!("{} has seen a goal through and stands taller for it.", name)
        }
        CrucibleEvent::GoalComplete { success: false, .. } => {
            format!("{} has failed at something that mattered and doubts their nerve.", name)
        }
        CrucibleEvent::RumorSpread { spread_count, .. } => format!(
            "{} feels the weight of a rumor told {} times and grows wary.",
            name, spread_count
        ),
    };
    if let Some(gap) = shifts
        .iter()
        .filter(|s| (s.self_delta - s.personality_delta).abs() > f32::EPSILON)
        .max_by(|a, b| {
            (a.self_delta - a.personality_delta)
                .abs()
                .partial_cmp(&(b.self_delta - b.personality_delta).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    {
        let (high, low) = gap.axis.adjectives();
        let seen_as = if gap.self_delta > 0.0 { high } else { low };
        message.push_str(&format!(" They now see themselves as more {} than they are.", seen_as));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawEvent;
    use cast_model::{Character, Tier};

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    fn cast_with(tier: Tier) -> CastState {
        let mut cast = CastState::new();
        cast.insert(Character::new("mara", 0).with_tier(tier));
        cast
    }

    fn falling_out() -> CrucibleEvent {
        CrucibleEvent::RelationChange {
            character: id("mara"),
            change: -50.0,
        }
    }

    #[test]
    fn test_relation_change_on_main() {
        let engine = CrucibleEngine::default();
        let mut cast = cast_with(Tier::Main);
        let before = cast.character(&id("mara")).unwrap().clone();

        let outcome = engine.analyze_event(&mut cast, &falling_out()).unwrap();
        let after = cast.character(&id("mara")).unwrap();

        assert!(after.personality.trust < before.personality.trust);
        assert!(after.personality.idealism < before.personality.idealism);
        let trust_drop = before.personality.trust - after.personality.trust;
        let perceived_drop = before.self_concept.perceived_trust - after.self_concept.perceived_trust;
        assert!(perceived_drop > trust_drop);
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn test_small_change_is_not_formative() {
        let engine = CrucibleEngine::default();
        let mut cast = cast_with(Tier::Main);
        let event = CrucibleEvent::RelationChange {
            character: id("mara"),
            change: -39.0,
        };
        assert!(engine.analyze_event(&mut cast, &event).is_none());
    }

    #[test]
    fn test_goal_completions_rise_monotonically() {
        let engine = CrucibleEngine::default();
        let mut cast = cast_with(Tier::Main);
        let event = CrucibleEvent::GoalComplete {
            character: id("mara"),
            success: true,
        };
        let mut last = cast.character(&id("mara")).unwrap().personality;
        for _ in 0..10 {
            engine.analyze_event(&mut cast, &event).unwrap();
            let now = cast.character(&id("mara")).unwrap().personality;
            assert!(now.bravery > last.bravery);
            assert!(now.idealism > last.idealism);
            assert!(now.bravery <= 1.0 && now.idealism <= 1.0);
            last = now;
        }
    }

    #[test]
    fn test_self_shift_dominates_at_bounds() {
        let engine = CrucibleEngine::default();
        let mut cast = cast_with(Tier::Main);
        let event = CrucibleEvent::GoalComplete {
            character: id("mara"),
            success: true,
        };
        for _ in 0..60 {
            let outcome = engine.analyze_event(&mut cast, &event).unwrap();
            for shift in outcome.shifts {
                assert!(shift.self_delta.abs() >= shift.personality_delta.abs());
            }
        }
        let mara = cast.character(&id("mara")).unwrap();
        assert!(mara.self_concept.perceived_bravery <= 1.0);
        assert!(mara.personality.bravery <= mara.self_concept.perceived_bravery);
    }

    #[test]
    fn test_tier_scales_evolution() {
        let engine = CrucibleEngine::default();
        let mut main = cast_with(Tier::Main);
        let mut extra = cast_with(Tier::Extra);
        let main_outcome = engine.analyze_event(&mut main, &falling_out()).unwrap();
        let extra_outcome = engine.analyze_event(&mut extra, &falling_out()).unwrap();
        assert!(
            main_outcome.shifts[0].personality_delta.abs()
                > extra_outcome.shifts[0].personality_delta.abs()
        );
    }

    #[test]
    fn test_negative_rumor_needs_spread() {
        let engine = CrucibleEngine::default();
        let mut cast = cast_with(Tier::Main);
        let whisper = CrucibleEvent::RumorSpread {
            character: id("mara"),
            spin: Spin::Negative,
            spread_count: 1,
        };
        assert!(engine.analyze_event(&mut cast, &whisper).is_none());

        let scandal = CrucibleEvent::RumorSpread {
            character: id("mara"),
            spin: Spin::Negative,
            spread_count: 50,
        };
        let outcome = engine.analyze_event(&mut cast, &scandal).unwrap();
        let capped = -CrucibleConfig::default().rumor_rate * 10.0;
        assert!((outcome.shifts[0].personality_delta - capped).abs() < 1e-6);
    }

    #[test]
    fn test_conflicts_flag_and_clear() {
        let engine = CrucibleEngine::new(CrucibleConfig {
            self_amplifier: 3.0,
            ..Default::default()
        });
        let mut cast = cast_with(Tier::Main);
        let event = CrucibleEvent::RelationChange {
            character: id("mara"),
            change: -100.0,
        };
        let mut flagged = false;
        for _ in 0..3 {
            let outcome = engine.analyze_event(&mut cast, &event).unwrap();
            flagged |= outcome.conflicts.contains(&TraitAxis::Trust);
        }
        assert!(flagged);

        let mara = cast.character_mut(&id("mara")).unwrap();
        mara.personality.trust = mara.self_concept.perceived_trust;
        mara.personality.idealism = mara.self_concept.perceived_idealism;
        let outcome = engine
            .analyze_event(&mut cast, &CrucibleEvent::GoalComplete { character: id("mara"), success: false })
            .unwrap();
        assert!(!outcome.conflicts.contains(&TraitAxis::Trust));
    }

    #[test]
    fn test_unknown_and_frozen_characters() {
        let engine = CrucibleEngine::default();
        let mut cast = cast_with(Tier::Main);
        let ghost = CrucibleEvent::RelationChange {
            character: id("ghost"),
            change: -80.0,
        };
        assert!(engine.analyze_event(&mut cast, &ghost).is_none());

        cast.character_mut(&id("mara")).unwrap().status = cast_model::CharacterStatus::Frozen;
        assert!(engine.analyze_event(&mut cast, &falling_out()).is_none());
    }

    #[test]
    fn test_from_story_event() {
        let event = RawEvent::new("RELATION_CHANGE", "", "mara")
            .with_target("jon")
            .with_modifier(-50.0)
            .normalize()
            .unwrap();
        let events = CrucibleEvent::from_story_event(&event);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].character(), &id("jon"));

        let chat = RawEvent::new("SOCIAL", "chat", "mara").normalize().unwrap();
        assert!(CrucibleEvent::from_story_event(&chat).is_empty());
    }

    #[test]
    fn test_messages_never_empty() {
        let engine = CrucibleEngine::default();
        let events = [
            falling_out(),
            CrucibleEvent::RelationChange { character: id("mara"), change: 60.0 },
            CrucibleEvent::GoalComplete { character: id("mara"), success: true },
            CrucibleEvent::GoalComplete { character: id("mara"), success: false },
            CrucibleEvent::RumorSpread { character: id("mara"), spin: Spin::Negative, spread_count: 3 },
        ];
        for event in events {
            let mut cast = cast_with(Tier::Secondary);
            let outcome = engine.analyze_event(&mut cast, &event).unwrap();
            assert!(outcome.message.contains("mara"));
        }
    }
}
