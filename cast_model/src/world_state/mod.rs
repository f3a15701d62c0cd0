//! Cast state management - the character store, legacy relations, and the
//! narrative clock.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::LifecycleConfig;
use crate::entities::{Character, CharacterId};
use crate::mechanics::{CharacterStatus, Tier};

/// Narrative time tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NarrativeClock {
    /// Narrative turns processed so far.
    pub turn: u64,
    pub day: u32,
    pub hour: u8,
    /// Label of the current scene, if the narrator set one.
    pub scene: Option<String>,
    /// Turns spent in the current scene.
    pub scene_turns: u32,
}

impl NarrativeClock {
    /// Absolute narrative hour, for comparing against scheduled events.
    pub fn absolute_hour(&self) -> u64 {
        self.day as u64 * 24 + self.hour as u64
    }

    /// Advance one narrative turn.
    pub fn advance_turn(&mut self) {
        self.turn += 1;
        self.scene_turns = self.scene_turns.saturating_add(1);
    }

    /// Advance by given hours, rolling over into days.
    pub fn advance_hours(&mut self, hours: u32) {
        let total_hours = (self.hour as u32).saturating_add(hours);
        self.hour = (total_hours % 24) as u8;
        self.day = self.day.saturating_add(total_hours / 24);
    }

    /// Enter a new scene, resetting the scene counter.
    pub fn set_scene(&mut self, label: impl Into<String>) {
        self.scene = Some(label.into());
        self.scene_turns = 0;
    }
}

/// Flag value types for character bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl FlagValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Bool(value) => *value,
            FlagValue::Int(value) => *value != 0,
            FlagValue::Float(value) => *value != 0.0,
            FlagValue::String(value) => !value.is_empty(),
        }
    }
}

/// Characters touched by one lifecycle pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    pub frozen: Vec<CharacterId>,
    pub demoted: Vec<CharacterId>,
    pub removed: Vec<CharacterId>,
}

/// The character store plus the relationships that predate perceptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CastState {
    pub clock: NarrativeClock,

    /// All characters keyed by ID. Ordered so batch passes are deterministic.
    characters: BTreeMap<CharacterId, Character>,

    /// Flat scalar relations in `[-100, 100]`, keyed by the ordered pair.
    legacy_relations: BTreeMap<CharacterId, BTreeMap<CharacterId, f32>>,
}

impl CastState {
    /// Create a new empty cast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tier earned by a mention count and recency.
    pub fn tier_for(config: &LifecycleConfig, mentions: u32, turns_absent: u64) -> Tier {
        let earned = if mentions >= config.main_mentions {
            Tier::Main
        } else if mentions >= config.secondary_mentions {
            Tier::Secondary
        } else {
            Tier::Extra
        };
        if turns_absent > config.demote_after_turns {
            earned.min(Tier::Secondary)
        } else {
            earned
        }
    }

    /// Get character by ID.
    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Get mutable character by ID.
    pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    /// Get a character, creating a default record for an unknown reference.
    pub fn ensure(&mut self, id: &CharacterId) -> &mut Character {
        let turn = self.clock.turn;
        self.characters.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(target: "cast.lifecycle", character = %id, turn, "created on first reference");
            Character::new(id.clone(), turn)
        })
    }

    /// Add or replace a character record.
    pub fn insert(&mut self, character: Character) -> CharacterId {
        let id = character.id.clone();
        self.characters.insert(id.clone(), character);
        id
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.characters.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// All characters in ID order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// All characters in ID order, mutably.
    pub fn characters_mut(&mut self) -> impl Iterator<Item = &mut Character> {
        self.characters.values_mut()
    }

    /// IDs of ACTIVE characters in ID order.
    pub fn active_ids(&self) -> Vec<CharacterId> {
        self.characters
            .values()
            .filter(|c| c.is_active())
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn is_active(&self, id: &CharacterId) -> bool {
        self.characters.get(id).is_some_and(|c| c.is_active())
    }

    /// Register a mention on the current turn: creates, unfreezes, and
    /// re-tiers the character.
    pub fn record_mention(&mut self, id: &CharacterId, config: &LifecycleConfig) -> &mut Character {
        let turn = self.clock.turn;
        let character = self.ensure(id);
        character.mentions = character.mentions.saturating_add(1);
        character.last_seen = turn;
        if character.is_frozen() {
            tracing::debug!(target: "cast.lifecycle", character = %character.id, turn, "unfrozen on mention");
            character.status = CharacterStatus::Active;
        }
        character.tier = Self::tier_for(config, character.mentions, 0);
        character
    }

    /// Freeze absent characters, re-derive tiers, and remove long-gone
    /// EXTRA characters with almost no interaction history.
    pub fn apply_lifecycle(&mut self, config: &LifecycleConfig) -> LifecycleReport {
        let turn = self.clock.turn;
        let mut report = LifecycleReport::default();

        for character in self.characters.values_mut() {
            let absent = turn.saturating_sub(character.last_seen);

            let tier = Self::tier_for(config, character.mentions, absent);
            if tier < character.tier {
                report.demoted.push(character.id.clone());
            }
            character.tier = tier;

            if character.is_active() && absent > config.freeze_after_turns {
                character.status = CharacterStatus::Frozen;
                report.frozen.push(character.id.clone());
            }

            if character.tier == Tier::Extra
                && absent > config.gc_after_turns
                && character.interactions <= config.gc_max_interactions
            {
                report.removed.push(character.id.clone());
            }
        }

        for id in &report.removed {
            self.remove(id);
        }

        if !report.frozen.is_empty() || !report.removed.is_empty() {
            tracing::debug!(
                target: "cast.lifecycle",
                turn,
                frozen = report.frozen.len(),
                demoted = report.demoted.len(),
                removed = report.removed.len(),
                "lifecycle pass"
            );
        }
        report
    }

    /// Hard-delete a character and every relation that points at it.
    fn remove(&mut self, id: &CharacterId) {
        self.characters.remove(id);
        for character in self.characters.values_mut() {
            character.perceptions.remove(id);
        }
        self.legacy_relations.remove(id);
        for inner in self.legacy_relations.values_mut() {
            inner.remove(id);
        }
        self.legacy_relations.retain(|_, inner| !inner.is_empty());
    }

    fn ordered<'a>(a: &'a CharacterId, b: &'a CharacterId) -> (&'a CharacterId, &'a CharacterId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Legacy scalar relation between two characters, if recorded.
    pub fn legacy_relation(&self, a: &CharacterId, b: &CharacterId) -> Option<f32> {
        let (low, high) = Self::ordered(a, b);
        self.legacy_relations.get(low)?.get(high).copied()
    }

    /// Apply a delta to the legacy relation, returning the new value.
    pub fn adjust_legacy(&mut self, a: &CharacterId, b: &CharacterId, delta: f32) -> f32 {
        let (low, high) = Self::ordered(a, b);
        let slot = self
            .legacy_relations
            .entry(low.clone())
            .or_default()
            .entry(high.clone())
            .or_insert(0.0);
        let next = *slot + delta;
        *slot = if next.is_nan() { 0.0 } else { next.clamp(-100.0, 100.0) };
        *slot
    }

    /// Whether two characters know each other in either representation.
    pub fn acquainted(&self, a: &CharacterId, b: &CharacterId) -> bool {
        let perceived = |from: &CharacterId, to: &CharacterId| {
            self.characters
                .get(from)
                .is_some_and(|c| c.perceptions.contains_key(to))
        };
        perceived(a, b) || perceived(b, a) || self.legacy_relation(a, b).is_some()
    }

    /// Clamp every bounded field of every record.
    pub fn sanitize(&mut self) {
        for (id, character) in self.characters.iter_mut() {
            if &character.id != id {
                character.id = id.clone();
            }
            character.sanitize();
        }
        for inner in self.legacy_relations.values_mut() {
            for value in inner.values_mut() {
                *value = if value.is_nan() { 0.0 } else { value.clamp(-100.0, 100.0) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    #[test]
    fn test_clock_advance_hours() {
        let mut clock = NarrativeClock {
            day: 1,
            hour: 23,
            ..Default::default()
        };
        clock.advance_hours(2);
        assert_eq!(clock.hour, 1);
        assert_eq!(clock.day, 2);
        assert_eq!(clock.absolute_hour(), 2 * 24 + 1);
    }

    #[test]
    fn test_clock_saturates_on_huge_jump() {
        let mut clock = NarrativeClock {
            day: u32::MAX - 1,
            hour: 23,
            ..Default::default()
        };
        clock.advance_hours(u32::MAX);
        assert_eq!(clock.day, u32::MAX);
        assert!(clock.hour < 24);
    }

    #[test]
    fn test_scene_counter() {
        let mut clock = NarrativeClock::default();
        clock.set_scene("tavern");
        clock.advance_turn();
        clock.advance_turn();
        assert_eq!(clock.scene_turns, 2);
        clock.set_scene("road");
        assert_eq!(clock.scene_turns, 0);
        assert_eq!(clock.turn, 2);
    }

    #[test]
    fn test_first_mention_creates_default() {
        let mut cast = CastState::new();
        let config = LifecycleConfig::default();
        cast.record_mention(&id("mara"), &config);
        let mara = cast.character(&id("mara")).unwrap();
        assert_eq!(mara.mentions, 1);
        assert_eq!(mara.tier, Tier::Extra);
    }

    #[test]
    fn test_promotion_by_mentions() {
        let mut cast = CastState::new();
        let config = LifecycleConfig::default();
        for _ in 0..3 {
            cast.record_mention(&id("mara"), &config);
        }
        assert_eq!(cast.character(&id("mara")).unwrap().tier, Tier::Secondary);
        for _ in 0..7 {
            cast.record_mention(&id("mara"), &config);
        }
        assert_eq!(cast.character(&id("mara")).unwrap().tier, Tier::Main);
    }

    #[test]
    fn test_freeze_and_unfreeze() {
        let mut cast = CastState::new();
        let config = LifecycleConfig::default();
        cast.record_mention(&id("mara"), &config);
        cast.character_mut(&id("mara")).unwrap().interactions = 10;

        cast.clock.turn = config.freeze_after_turns + 1;
        let report = cast.apply_lifecycle(&config);
        assert_eq!(report.frozen, vec![id("mara")]);
        assert!(cast.character(&id("mara")).unwrap().is_frozen());

        cast.record_mention(&id("mara"), &config);
        assert!(cast.character(&id("mara")).unwrap().is_active());
    }

    #[test]
    fn test_demotion_after_long_absence() {
        let mut cast = CastState::new();
        let config = LifecycleConfig::default();
        for _ in 0..config.main_mentions {
            cast.record_mention(&id("mara"), &config);
        }
        cast.clock.turn = config.demote_after_turns + 1;
        let report = cast.apply_lifecycle(&config);
        assert_eq!(report.demoted, vec![id("mara")]);
        assert_eq!(cast.character(&id("mara")).unwrap().tier, Tier::Secondary);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_gc_only_low_interaction_extras() {
        let mut cast = CastState::new();
        let config = LifecycleConfig::default();
        cast.record_mention(&id("passerby"), &config);
        cast.record_mention(&id("regular"), &config);
        cast.character_mut(&id("regular")).unwrap().interactions = 50;
        cast.character_mut(&id("regular"))
            .unwrap()
            .perception_mut(&id("passerby"));
        cast.adjust_legacy(&id("regular"), &id("passerby"), 10.0);

        cast.clock.turn = config.gc_after_turns + 1;
        let report = cast.apply_lifecycle(&config);

        assert_eq!(report.removed, vec![id("passerby")]);
        assert!(!cast.contains(&id("passerby")));
        let regular = cast.character(&id("regular")).unwrap();
        assert!(regular.is_frozen());
        assert!(regular.perceptions.is_empty());
        assert!(cast.legacy_relation(&id("regular"), &id("passerby")).is_none());
    }

    #[test]
    fn test_legacy_relation_is_unordered_and_clamped() {
        let mut cast = CastState::new();
        cast.adjust_legacy(&id("b"), &id("a"), 70.0);
        assert_eq!(cast.legacy_relation(&id("a"), &id("b")), Some(70.0));
        assert_eq!(cast.adjust_legacy(&id("a"), &id("b"), 70.0), 100.0);
        assert!(cast.acquainted(&id("a"), &id("b")));
        assert!(!cast.acquainted(&id("a"), &id("c")));
    }

    #[test]
    fn test_cast_serializes_with_string_keys() {
        let mut cast = CastState::new();
        cast.ensure(&id("mara")).perception_mut(&id("jon")).trust = 70.0;
        cast.adjust_legacy(&id("mara"), &id("jon"), -20.0);

        let json = serde_json::to_string(&cast).unwrap();
        let restored: CastState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cast);
    }
}
