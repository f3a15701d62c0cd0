//! Relations engine - routes an event into relationship state.
//!
//! In perception mode every observer forms their own reading of the actor.
//! Legacy mode keeps the old flat scalar per pair.

use cast_model::{CastState, CharacterId, Perception, RelationMode, RelationsConfig};
use serde::{Deserialize, Serialize};

use crate::events::StoryEvent;
use crate::information::InformationEngine;
use crate::lore::{LoreEngine, NormsEngine};

/// Relationship data held for a pair, in whichever shape exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Relation {
    Perception(Perception),
    Legacy(f32),
}

/// One observer's affection change toward a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionSwing {
    pub observer: CharacterId,
    pub subject: CharacterId,
    pub affection_delta: f32,
}

#[derive(Debug, Clone, Default)]
pub struct RelationsEngine {
    config: RelationsConfig,
}

impl RelationsEngine {
    pub fn new(config: RelationsConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> RelationMode {
        self.config.mode
    }

    /// Update relationships for everyone who saw the event.
    ///
    /// The target and each witness re-read the actor; the actor re-reads the
    /// target at the reciprocity factor. Legacy mode moves the scalar between
    /// actor and target and reports no swings.
    pub fn apply_event(
        &self,
        cast: &mut CastState,
        event: &StoryEvent,
        information: &InformationEngine,
        lore: &LoreEngine,
        norms: &NormsEngine,
    ) -> Vec<PerceptionSwing> {
        match self.config.mode {
            RelationMode::Legacy => {
                if let Some(target) = &event.target {
                    self.apply_legacy_delta(
                        cast,
                        &event.actor,
                        target,
                        event.kind.signed_modifier() * event.intensity,
                    );
                }
                Vec::new()
            }
            RelationMode::Perception => self.apply_perceptions(cast, event, information, lore, norms),
        }
    }

    fn apply_perceptions(
        &self,
        cast: &mut CastState,
        event: &StoryEvent,
        information: &InformationEngine,
        lore: &LoreEngine,
        norms: &NormsEngine,
    ) -> Vec<PerceptionSwing> {
        let mut swings = Vec::new();
        let observers = event.target.iter().chain(event.witnesses.iter());

        for observer in observers {
            let Some(character) = cast.character(observer).filter(|c| c.is_active()) else {
                continue;
            };
            let interpretation = information.interpret(character, event, lore, norms);
            let delta = information.update_perception(cast, observer, &event.actor, &interpretation);
            swings.push(PerceptionSwing {
                observer: observer.clone(),
                subject: event.actor.clone(),
                affection_delta: delta,
            });
        }

        if let Some(target) = &event.target {
            if let Some(actor) = cast.character(&event.actor).filter(|c| c.is_active()) {
                let interpretation = information
                    .interpret(actor, event, lore, norms)
                    .scaled(self.config.reciprocity);
                let delta = information.update_perception(cast, &event.actor, target, &interpretation);
                swings.push(PerceptionSwing {
                    observer: event.actor.clone(),
                    subject: target.clone(),
                    affection_delta: delta,
                });
            }
        }

        tracing::trace!(target: "relations", event = %event.type_key(), swings = swings.len(), "perceptions updated");
        swings
    }

    /// Move the flat scalar for a pair, returning the new value.
    pub fn apply_legacy_delta(
        &self,
        cast: &mut CastState,
        a: &CharacterId,
        b: &CharacterId,
        delta: f32,
    ) -> f32 {
        if a == b {
            return cast.legacy_relation(a, b).unwrap_or(0.0);
        }
        cast.adjust_legacy(a, b, delta)
    }

    /// What `a` holds about `b`: their perception first, then the legacy scalar.
    pub fn get_relation(&self, cast: &CastState, a: &CharacterId, b: &CharacterId) -> Option<Relation> {
        cast.character(a)
            .and_then(|c| c.perception_of(b))
            .map(|p| Relation::Perception(*p))
            .or_else(|| cast.legacy_relation(a, b).map(Relation::Legacy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawEvent;
    use cast_model::{Character, QualiaState};

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    fn cast() -> CastState {
        let mut cast = CastState::new();
        cast.insert(Character::new("mara", 0));
        cast.insert(Character::new("jon", 0).with_qualia(QualiaState {
            valence: 0.8,
            somatic_tension: 0.2,
            ..QualiaState::baseline()
        }));
        cast.insert(Character::new("ana", 0).with_qualia(QualiaState {
            valence: 0.5,
            somatic_tension: 0.9,
            ..QualiaState::baseline()
        }));
        cast
    }

    fn compliment() -> StoryEvent {
        RawEvent::new("SOCIAL", "compliment", "mara")
            .with_target("jon")
            .with_modifier(5.0)
            .with_witnesses(["ana"])
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_each_observer_reads_independently() {
        let engine = RelationsEngine::default();
        let mut cast = cast();
        let swings = engine.apply_event(
            &mut cast,
            &compliment(),
            &InformationEngine::default(),
            &LoreEngine::default(),
            &NormsEngine::new(),
        );

        assert_eq!(swings.len(), 3);
        let jon_view = cast.character(&id("jon")).unwrap().perception_of(&id("mara")).unwrap();
        let ana_view = cast.character(&id("ana")).unwrap().perception_of(&id("mara")).unwrap();
        assert!(jon_view.affection > 50.0);
        assert!(jon_view.trust > 50.0);
        assert!(ana_view.affection < 50.0);
        assert!(ana_view.trust < 50.0);
    }

    #[test]
    fn test_actor_reciprocity_is_weaker() {
        let engine = RelationsEngine::default();
        let mut cast = cast();
        let swings = engine.apply_event(
            &mut cast,
            &compliment(),
            &InformationEngine::default(),
            &LoreEngine::default(),
            &NormsEngine::new(),
        );
        let target_swing = swings.iter().find(|s| s.observer == id("jon")).unwrap();
        let actor_swing = swings.iter().find(|s| s.observer == id("mara")).unwrap();
        assert_eq!(actor_swing.subject, id("jon"));
        assert!(actor_swing.affection_delta.abs() < target_swing.affection_delta.abs());
    }

    #[test]
    fn test_frozen_observers_are_skipped() {
        let engine = RelationsEngine::default();
        let mut cast = cast();
        cast.character_mut(&id("ana")).unwrap().status = cast_model::CharacterStatus::Frozen;
        engine.apply_event(
            &mut cast,
            &compliment(),
            &InformationEngine::default(),
            &LoreEngine::default(),
            &NormsEngine::new(),
        );
        assert!(cast.character(&id("ana")).unwrap().perceptions.is_empty());
    }

    #[test]
    fn test_legacy_mode() {
        let engine = RelationsEngine::new(RelationsConfig {
            mode: RelationMode::Legacy,
            ..Default::default()
        });
        let mut cast = cast();
        let swings = engine.apply_event(
            &mut cast,
            &compliment().with_intensity(2.0),
            &InformationEngine::default(),
            &LoreEngine::default(),
            &NormsEngine::new(),
        );
        assert!(swings.is_empty());
        assert_eq!(
            engine.get_relation(&cast, &id("jon"), &id("mara")),
            Some(Relation::Legacy(10.0))
        );
    }

    #[test]
    fn test_get_relation_prefers_perception() {
        let engine = RelationsEngine::default();
        let mut cast = cast();
        assert_eq!(engine.get_relation(&cast, &id("jon"), &id("mara")), None);

        engine.apply_legacy_delta(&mut cast, &id("jon"), &id("mara"), -30.0);
        assert_eq!(
            engine.get_relation(&cast, &id("mara"), &id("jon")),
            Some(Relation::Legacy(-30.0))
        );

        cast.character_mut(&id("jon")).unwrap().perception_mut(&id("mara"));
        assert!(matches!(
            engine.get_relation(&cast, &id("jon"), &id("mara")),
            Some(Relation::Perception(_))
        ));
    }
}
