//! Hierarchy engine - social capital and the status ladder.

use cast_model::{clamp_capital, CastState, CharacterId, HierarchyConfig, SocialStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::events::StoryEvent;

/// Tags owned by the hierarchy. Each recalculation re-derives them.
pub const HIERARCHY_TAGS: [&str; 4] = ["influential", "outcast", "rising_star", "faltering"];

/// Recent performance per character in `[-1, 1]`, fed in by the caller.
pub type PerformanceSignals = BTreeMap<CharacterId, f32>;

/// What a character did, as far as their standing is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub label: String,
    /// Capital change before witness amplification.
    pub base_delta: f32,
}

impl ActionDescriptor {
    pub fn new(label: impl Into<String>, base_delta: f32) -> Self {
        Self {
            label: label.into(),
            base_delta,
        }
    }

    /// The actor's capital change implied by an event.
    pub fn from_event(event: &StoryEvent) -> Self {
        let action = event.kind.action();
        let label = if action.is_empty() {
            event.type_key().to_lowercase()
        } else {
            action.to_string()
        };
        Self::new(label, event.kind.signed_modifier() * event.intensity)
    }
}

/// A status that moved during a recalculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub character: CharacterId,
    pub from: SocialStatus,
    pub to: SocialStatus,
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyEngine {
    config: HierarchyConfig,
}

impl HierarchyEngine {
    pub fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    /// Witness multiplier: respected onlookers make a deed count for more.
    fn amplification(&self, cast: &CastState, actor: &CharacterId, witnesses: &[CharacterId]) -> f32 {
        let config = &self.config;
        let sum: f32 = witnesses
            .iter()
            .filter(|w| *w != actor)
            .filter_map(|w| cast.character(w).filter(|c| c.is_active()))
            .filter_map(|c| c.perception_of(actor))
            .filter(|p| p.respect > config.witness_respect_cutoff)
            .map(|p| (p.affection + p.respect) / 200.0 * config.witness_weight)
            .sum();
        (1.0 + sum).min(config.max_amplification.max(1.0))
    }

    /// Apply an action's capital change, returning the delta actually applied.
    pub fn update_capital(
        &self,
        cast: &mut CastState,
        actor: &CharacterId,
        action: &ActionDescriptor,
        witnesses: &[CharacterId],
    ) -> f32 {
        if !action.base_delta.is_finite() || action.base_delta == 0.0 {
            return 0.0;
        }
        let multiplier = self.amplification(cast, actor, witnesses);
        let Some(character) = cast.character_mut(actor) else {
            return 0.0;
        };
        let before = character.social.capital;
        character.social.capital = clamp_capital(before + action.base_delta * multiplier);
        let applied = character.social.capital - before;

        tracing::trace!(
            target: "hierarchy.capital",
            character = %actor,
            action = %action.label,
            multiplier,
            applied,
            "capital updated"
        );
        applied
    }

    /// Recompute every ACTIVE character's status and hierarchy tags.
    ///
    /// Status follows the percentile of effective capital (capital plus a
    /// bounded performance bonus). The bonus is never stored, so repeated
    /// calls with the same signals yield the same result.
    pub fn recalculate_status(&self, cast: &mut CastState, signals: &PerformanceSignals) -> Vec<StatusChange> {
        let config = &self.config;
        let ranked: Vec<(CharacterId, f32, f32)> = cast
            .characters()
            .filter(|c| c.is_active())
            .map(|c| {
                let signal = signals.get(&c.id).copied().unwrap_or(0.0);
                let signal = if signal.is_finite() { signal.clamp(-1.0, 1.0) } else { 0.0 };
                let bonus = signal * config.performance_bonus_cap;
                (c.id.clone(), c.social.capital + bonus, bonus)
            })
            .collect();

        let count = ranked.len();
        let mut changes = Vec::new();
        for (id, effective, bonus) in &ranked {
            let percentile = if count <= 1 {
                0.5
            } else {
                // Tied characters share the midpoint of their band.
                let below = ranked.iter().filter(|(_, other, _)| other < effective).count();
                let tied = ranked.iter().filter(|(_, other, _)| other == effective).count() - 1;
                (below as f32 + tied as f32 / 2.0) / (count - 1) as f32
            };
            let status = SocialStatus::from_percentile(percentile);

            let Some(character) = cast.character_mut(id) else {
                continue;
            };
            if character.social.status != status {
                changes.push(StatusChange {
                    character: id.clone(),
                    from: character.social.status,
                    to: status,
                });
                character.social.status = status;
            }

            for tag in HIERARCHY_TAGS {
                character.tags.remove(tag);
            }
            if *effective >= config.influential_capital {
                character.tags.insert("influential".to_string());
            }
            if *effective <= config.outcast_capital {
                character.tags.insert("outcast".to_string());
            }
            if *bonus >= config.rising_star_bonus {
                character.tags.insert("rising_star".to_string());
            } else if *bonus <= -config.rising_star_bonus {
                character.tags.insert("faltering".to_string());
            }
        }

        if !changes.is_empty() {
            tracing::debug!(target: "hierarchy.status", ranked = count, changed = changes.len(), "status recalculated");
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawEvent;
    use cast_model::{Character, CharacterStatus};

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    fn ladder() -> CastState {
        let mut cast = CastState::new();
        for (idx, name) in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"].iter().enumerate() {
            let mut character = Character::new(*name, 0);
            character.social.capital = 20.0 + idx as f32 * 25.0;
            cast.insert(character);
        }
        cast
    }

    #[test]
    fn test_action_from_event() {
        let event = RawEvent::new("COMBAT", "defend", "mara")
            .with_modifier(8.0)
            .with_intensity(2.0)
            .normalize()
            .unwrap();
        let action = ActionDescriptor::from_event(&event);
        assert_eq!(action.label, "defend");
        assert_eq!(action.base_delta, 16.0);
    }

    #[test]
    fn test_respected_witnesses_amplify() {
        let engine = HierarchyEngine::default();
        let mut cast = CastState::new();
        cast.insert(Character::new("hero", 0));
        cast.insert(Character::new("solo", 0));
        for name in ["w1", "w2"] {
            let mut witness = Character::new(name, 0);
            let view = witness.perception_mut(&id("hero"));
            view.respect = 90.0;
            view.affection = 90.0;
            cast.insert(witness);
        }
        let action = ActionDescriptor::new("rescue", 10.0);
        let witnesses = [id("w1"), id("w2")];

        let amplified = engine.update_capital(&mut cast, &id("hero"), &action, &witnesses);
        let plain = engine.update_capital(&mut cast, &id("solo"), &action, &witnesses);
        assert!(amplified > plain);
        assert_eq!(plain, 10.0);
    }

    #[test]
    fn test_amplification_is_capped() {
        let engine = HierarchyEngine::default();
        let mut cast = CastState::new();
        cast.insert(Character::new("hero", 0));
        let mut witnesses = Vec::new();
        for idx in 0..40 {
            let name = format!("w{}", idx);
            let mut witness = Character::new(name.as_str(), 0);
            let view = witness.perception_mut(&id("hero"));
            view.respect = 100.0;
            view.affection = 100.0;
            cast.insert(witness);
            witnesses.push(id(&name));
        }
        let applied = engine.update_capital(&mut cast, &id("hero"), &ActionDescriptor::new("rescue", 10.0), &witnesses);
        assert_eq!(applied, 20.0);
    }

    #[test]
    fn test_capital_is_clamped() {
        let engine = HierarchyEngine::default();
        let mut cast = CastState::new();
        cast.insert(Character::new("hero", 0));
        engine.update_capital(&mut cast, &id("hero"), &ActionDescriptor::new("legend", 1000.0), &[]);
        assert_eq!(cast.character(&id("hero")).unwrap().social.capital, 300.0);
        engine.update_capital(&mut cast, &id("hero"), &ActionDescriptor::new("disgrace", -1000.0), &[]);
        assert_eq!(cast.character(&id("hero")).unwrap().social.capital, 0.0);
    }

    #[test]
    fn test_status_from_percentile() {
        let engine = HierarchyEngine::default();
        let mut cast = ladder();
        engine.recalculate_status(&mut cast, &PerformanceSignals::new());

        assert_eq!(cast.character(&id("j")).unwrap().social.status, SocialStatus::Leader);
        assert_eq!(cast.character(&id("a")).unwrap().social.status, SocialStatus::Outcast);
        assert!(cast.character(&id("a")).unwrap().tags.contains("outcast"));
        assert!(cast.character(&id("j")).unwrap().tags.contains("influential"));
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let engine = HierarchyEngine::default();
        let mut cast = ladder();
        let mut signals = PerformanceSignals::new();
        signals.insert(id("c"), 1.0);
        signals.insert(id("h"), -1.0);

        engine.recalculate_status(&mut cast, &signals);
        let first = cast.clone();
        let changes = engine.recalculate_status(&mut cast, &signals);

        assert!(changes.is_empty());
        assert_eq!(cast, first);
        assert!(cast.character(&id("c")).unwrap().tags.contains("rising_star"));
        assert!(cast.character(&id("h")).unwrap().tags.contains("faltering"));
        assert_eq!(cast.character(&id("c")).unwrap().social.capital, 70.0);
    }

    #[test]
    fn test_stale_tags_are_cleared() {
        let engine = HierarchyEngine::default();
        let mut cast = ladder();
        let mut signals = PerformanceSignals::new();
        signals.insert(id("c"), 1.0);
        engine.recalculate_status(&mut cast, &signals);
        engine.recalculate_status(&mut cast, &PerformanceSignals::new());
        assert!(!cast.character(&id("c")).unwrap().tags.contains("rising_star"));
    }

    #[test]
    fn test_frozen_excluded() {
        let engine = HierarchyEngine::default();
        let mut cast = ladder();
        cast.character_mut(&id("j")).unwrap().status = CharacterStatus::Frozen;
        let before = cast.character(&id("j")).unwrap().clone();
        engine.recalculate_status(&mut cast, &PerformanceSignals::new());
        assert_eq!(cast.character(&id("j")).unwrap(), &before);
        assert_eq!(cast.character(&id("i")).unwrap().social.status, SocialStatus::Leader);
    }

    #[test]
    fn test_ties_share_status() {
        let engine = HierarchyEngine::default();
        let mut cast = CastState::new();
        for name in ["a", "b", "c"] {
            cast.insert(Character::new(name, 0));
        }
        engine.recalculate_status(&mut cast, &PerformanceSignals::new());
        let statuses: Vec<SocialStatus> = cast.characters().map(|c| c.social.status).collect();
        assert!(statuses.iter().all(|s| *s == SocialStatus::Respected));
    }
}
