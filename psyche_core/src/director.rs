//! Living world director - what characters do while the story looks away.
//!
//! Each time jump, every ACTIVE character takes one step toward whatever
//! moves them most: an unfinished plan, a bond that pulls at them, or an
//! appointment coming up. Every lookup goes through a per-character index,
//! so one cycle is linear in the size of the cast.

use cast_model::{CharacterId, DirectorConfig, FlagValue, PerceptionAxis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crucible::{CrucibleEvent, CrucibleOutcome};
use crate::error::DirectorError;
use crate::lore::{GoalId, PlanAdvance};
use crate::simulation::Simulation;

/// An appointment on the narrative calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScheduledEvent {
    pub label: String,
    /// Absolute narrative hour (`day * 24 + hour`).
    pub at_hour: u64,
    pub participants: Vec<CharacterId>,
}

/// Upcoming events indexed by participant.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    events: Vec<ScheduledEvent>,
    by_participant: BTreeMap<CharacterId, Vec<usize>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(events: Vec<ScheduledEvent>) -> Self {
        let mut schedule = Self::new();
        for event in events {
            schedule.add(event);
        }
        schedule
    }

    pub fn add(&mut self, event: ScheduledEvent) {
        let index = self.events.len();
        for participant in &event.participants {
            let slots = self.by_participant.entry(participant.clone()).or_default();
            if !slots.contains(&index) {
                slots.push(index);
            }
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    /// The soonest event for a participant starting within `window` hours of `now`.
    pub fn next_for(&self, id: &CharacterId, now: u64, window: u64) -> Option<&ScheduledEvent> {
        self.by_participant
            .get(id)?
            .iter()
            .filter_map(|idx| self.events.get(*idx))
            .filter(|e| e.at_hour >= now && e.at_hour - now <= window)
            .min_by_key(|e| e.at_hour)
    }

    /// Forget events that have already happened.
    pub fn drop_past(&mut self, now: u64) -> usize {
        let before = self.events.len();
        let kept: Vec<ScheduledEvent> = self
            .events
            .drain(..)
            .filter(|e| e.at_hour >= now)
            .collect();
        *self = Self::restore(kept);
        before - self.events.len()
    }
}

/// Length of an off-screen interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeJump {
    pub hours: u32,
}

impl TimeJump {
    pub fn hours(hours: u32) -> Self {
        Self { hours }
    }

    pub fn days(days: u32) -> Self {
        Self {
            hours: days.saturating_mul(24),
        }
    }
}

/// What one character did during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum OffScreenAction {
    AdvancedGoal { goal: GoalId, completed: bool },
    NurturedBond { other: CharacterId, affection_delta: f32 },
    Prepared { label: String },
    Idle,
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub hours: u32,
    pub actions: Vec<(CharacterId, OffScreenAction)>,
    pub failures: Vec<(CharacterId, DirectorError)>,
    pub crucible: Vec<CrucibleOutcome>,
}

#[derive(Debug, Clone, Default)]
pub struct LivingWorldDirector {
    config: DirectorConfig,
}

impl LivingWorldDirector {
    pub fn new(config: DirectorConfig) -> Self {
        Self { config }
    }

    /// Advance the clock and give every ACTIVE character one off-screen step.
    ///
    /// A failing character is logged and recorded; the rest of the batch
    /// still runs. FROZEN characters are never touched.
    pub fn run_off_screen_cycle(&self, sim: &mut Simulation, jump: TimeJump) -> CycleReport {
        sim.cast.clock.advance_hours(jump.hours);
        let now = sim.cast.clock.absolute_hour();
        let mut report = CycleReport {
            hours: jump.hours,
            ..Default::default()
        };

        for id in sim.cast.active_ids() {
            match self.step_character(sim, &id, now, &mut report) {
                Ok(action) => report.actions.push((id.clone(), action)),
                Err(err) => {
                    tracing::warn!(target: "director", character = %id, error = %err, "off-screen step failed");
                    report.failures.push((id.clone(), err));
                }
            }
            if let Some(character) = sim.cast.character_mut(&id) {
                sim.qualia.settle(character, jump.hours);
            }
        }

        sim.schedule.drop_past(now);
        tracing::debug!(
            target: "director",
            hours = jump.hours,
            acted = report.actions.len(),
            failed = report.failures.len(),
            "off-screen cycle complete"
        );
        report
    }

    fn step_character(
        &self,
        sim: &mut Simulation,
        id: &CharacterId,
        now: u64,
        report: &mut CycleReport,
    ) -> Result<OffScreenAction, DirectorError> {
        if let Some(goal) = sim.goals.active_goal_for(id) {
            match sim.goals.advance_plan(goal) {
                PlanAdvance::Advanced => {
                    return Ok(OffScreenAction::AdvancedGoal {
                        goal,
                        completed: false,
                    });
                }
                PlanAdvance::Completed => {
                    let event = CrucibleEvent::GoalComplete {
                        character: id.clone(),
                        success: true,
                    };
                    if let Some(outcome) = sim.crucible.analyze_event(&mut sim.cast, &event) {
                        report.crucible.push(outcome);
                    }
                    return Ok(OffScreenAction::AdvancedGoal {
                        goal,
                        completed: true,
                    });
                }
                PlanAdvance::Stalled => {
                    // Drop it so the next cycle moves on.
                    sim.goals.abandon(goal);
                    return Err(DirectorError::StalledGoal {
                        character: id.clone(),
                        goal,
                    });
                }
                PlanAdvance::Inactive => {}
            }
        }

        if let Some(action) = self.nurture_bond(sim, id) {
            return Ok(action);
        }

        let window = self.config.prep_window_hours;
        if let Some(label) = sim.schedule.next_for(id, now, window).map(|e| e.label.clone()) {
            if let Some(character) = sim.cast.character_mut(id) {
                character.set_flag(format!("prep:{}", label), FlagValue::Bool(true));
                return Ok(OffScreenAction::Prepared { label });
            }
        }

        Ok(OffScreenAction::Idle)
    }

    /// Deepen the first strong bond with another ACTIVE character.
    ///
    /// Warm bonds grow with the character's valence, hostile ones with
    /// their tension. The pair also trade rumors.
    fn nurture_bond(&self, sim: &mut Simulation, id: &CharacterId) -> Option<OffScreenAction> {
        let margin = self.config.strong_relation_margin;
        let character = sim.cast.character(id)?;

        let (other, warm) = character
            .perceptions
            .iter()
            .filter(|(other, _)| sim.cast.is_active(other))
            .find(|(_, p)| (p.affection - 50.0).abs() >= margin)
            .map(|(other, p)| (other.clone(), p.affection > 50.0))?;

        let mood = if warm {
            0.5 + character.qualia.valence
        } else {
            -(0.5 + character.qualia.somatic_tension)
        };
        let drift = self.config.relation_drift * mood;

        let affection_delta = sim
            .cast
            .character_mut(id)?
            .perception_mut(&other)
            .adjust(PerceptionAxis::Affection, drift);

        sim.gossip
            .auto_propagate(id, &other, &sim.cast, &mut sim.rng);

        Some(OffScreenAction::NurturedBond {
            other,
            affection_delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lore::{Goal, GoalsEngine, PlanStep, StepStatus};
    use cast_model::{Character, CharacterStatus, QualiaState, SimConfig};
    use std::time::{Duration, Instant};

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    fn sim_with(names: &[&str]) -> Simulation {
        let mut sim = Simulation::new(SimConfig::default());
        for name in names {
            sim.cast.insert(Character::new(*name, 0));
        }
        sim
    }

    #[test]
    fn test_empty_cast() {
        let mut sim = Simulation::new(SimConfig::default());
        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(8));
        assert!(report.actions.is_empty());
        assert_eq!(sim.cast.clock.hour, 8);
    }

    #[test]
    fn test_goal_takes_priority_and_completes() {
        let mut sim = sim_with(&["mara", "jon"]);
        sim.cast.character_mut(&id("mara")).unwrap().perception_mut(&id("jon")).affection = 95.0;
        let goal = sim.goals.create_goal(&id("mara"), "Find the map", vec!["Ask around".into()]);
        let before = sim.cast.character(&id("mara")).unwrap().personality.bravery;

        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(4));

        assert!(report.actions.contains(&(
            id("mara"),
            OffScreenAction::AdvancedGoal { goal, completed: true }
        )));
        assert_eq!(report.crucible.len(), 1);
        assert!(sim.cast.character(&id("mara")).unwrap().personality.bravery > before);
    }

    #[test]
    fn test_strong_bond_drifts_further() {
        let mut sim = sim_with(&["mara", "jon", "bo"]);
        {
            let mara = sim.cast.character_mut(&id("mara")).unwrap();
            mara.perception_mut(&id("jon")).affection = 90.0;
            mara.qualia = QualiaState {
                valence: 0.9,
                ..QualiaState::baseline()
            };
        }
        sim.cast.character_mut(&id("bo")).unwrap().perception_mut(&id("jon")).affection = 5.0;

        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(1));

        let mara_view = sim.cast.character(&id("mara")).unwrap().perception_of(&id("jon")).unwrap();
        let bo_view = sim.cast.character(&id("bo")).unwrap().perception_of(&id("jon")).unwrap();
        assert!(mara_view.affection > 90.0);
        assert!(bo_view.affection < 5.0);
        assert!(matches!(
            report.actions.iter().find(|(who, _)| who == &id("jon")),
            Some((_, OffScreenAction::Idle))
        ));
    }

    #[test]
    fn test_bond_with_frozen_character_is_ignored() {
        let mut sim = sim_with(&["mara", "jon"]);
        sim.cast.character_mut(&id("mara")).unwrap().perception_mut(&id("jon")).affection = 90.0;
        sim.cast.character_mut(&id("jon")).unwrap().status = CharacterStatus::Frozen;

        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(1));
        assert_eq!(report.actions, vec![(id("mara"), OffScreenAction::Idle)]);
    }

    #[test]
    fn test_upcoming_event_sets_prep_flag() {
        let mut sim = sim_with(&["mara", "jon"]);
        sim.schedule.add(ScheduledEvent {
            label: "duel".into(),
            at_hour: 20,
            participants: vec![id("mara")],
        });

        LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(2));

        assert_eq!(
            sim.cast.character(&id("mara")).unwrap().flag("prep:duel"),
            Some(&FlagValue::Bool(true))
        );
        assert!(sim.cast.character(&id("jon")).unwrap().flags.is_empty());
    }

    #[test]
    fn test_frozen_flags_untouched() {
        let mut sim = sim_with(&["mara", "jon"]);
        let jon = sim.cast.character_mut(&id("jon")).unwrap();
        jon.status = CharacterStatus::Frozen;
        jon.set_flag("oath", FlagValue::Int(3));
        jon.qualia = QualiaState::from_array([1.0, 0.0, 0.0, 0.0]);
        sim.schedule.add(ScheduledEvent {
            label: "feast".into(),
            at_hour: 5,
            participants: vec![id("jon"), id("mara")],
        });
        let before = sim.cast.character(&id("jon")).unwrap().clone();

        LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(1));

        assert_eq!(sim.cast.character(&id("jon")).unwrap(), &before);
    }

    #[test]
    fn test_abandoned_goal_falls_through() {
        let mut sim = sim_with(&["mara", "jon"]);
        let goal = sim.goals.create_goal(&id("mara"), "Escape", vec![]);
        sim.goals.abandon(goal);
        sim.schedule.add(ScheduledEvent {
            label: "trial".into(),
            at_hour: 3,
            participants: vec![id("mara"), id("jon")],
        });

        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::hours(1));
        assert!(report.failures.is_empty());
        assert_eq!(report.actions.len(), 2);
    }

    #[test]
    fn test_stalled_goal_fails_alone() {
        let mut sim = sim_with(&["jon", "bo"]);
        let stalled = Goal {
            character: id("mara"),
            text: "Hold the gate".into(),
            steps: vec![PlanStep {
                description: "Hold the gate".into(),
                status: StepStatus::Done,
            }],
            plan_progress: 1,
            ..Default::default()
        };
        let goal = stalled.id;
        sim.goals = GoalsEngine::restore(vec![stalled]);
        sim.cast.insert(Character::new("mara", 0));
        let jon_goal = sim.goals.create_goal(&id("jon"), "Mend the net", vec!["Knot".into(), "Dry".into()]);
        sim.schedule.add(ScheduledEvent {
            label: "market".into(),
            at_hour: 6,
            participants: vec![id("bo")],
        });

        let director = LivingWorldDirector::default();
        let report = director.run_off_screen_cycle(&mut sim, TimeJump::hours(2));

        assert_eq!(
            report.failures,
            vec![(
                id("mara"),
                DirectorError::StalledGoal {
                    character: id("mara"),
                    goal
                }
            )]
        );
        assert_eq!(report.actions.len(), 2);
        assert!(report.actions.contains(&(
            id("jon"),
            OffScreenAction::AdvancedGoal {
                goal: jon_goal,
                completed: false
            }
        )));
        assert!(report.actions.contains(&(id("bo"), OffScreenAction::Prepared { label: "market".into() })));

        let report = director.run_off_screen_cycle(&mut sim, TimeJump::hours(1));
        assert!(report.failures.is_empty());
        assert!(report.actions.contains(&(id("mara"), OffScreenAction::Idle)));
    }

    #[test]
    fn test_huge_jump_saturates() {
        assert_eq!(TimeJump::days(u32::MAX).hours, u32::MAX);
        let mut sim = sim_with(&["mara"]);
        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::days(u32::MAX));
        assert_eq!(report.actions.len(), 1);
    }

    #[test]
    fn test_large_cast_is_fast() {
        let names: Vec<String> = (0..300).map(|i| format!("c{:03}", i)).collect();
        let mut sim = Simulation::new(SimConfig::default());
        for (idx, name) in names.iter().enumerate() {
            let mut character = Character::new(name.as_str(), 0);
            let next = &names[(idx + 1) % names.len()];
            character.perception_mut(&id(next)).affection = if idx % 2 == 0 { 95.0 } else { 10.0 };
            sim.cast.insert(character);
        }
        for name in names.iter().step_by(3) {
            sim.goals.create_goal(&id(name), "Train", vec!["Drill".into(), "Spar".into()]);
        }

        let start = Instant::now();
        let report = LivingWorldDirector::default().run_off_screen_cycle(&mut sim, TimeJump::days(1));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(report.actions.len() + report.failures.len(), 300);
    }

    #[test]
    fn test_schedule_window() {
        let mut schedule = Schedule::new();
        schedule.add(ScheduledEvent {
            label: "later".into(),
            at_hour: 100,
            participants: vec![id("mara")],
        });
        schedule.add(ScheduledEvent {
            label: "soon".into(),
            at_hour: 30,
            participants: vec![id("mara")],
        });
        assert_eq!(schedule.next_for(&id("mara"), 10, 24).unwrap().label, "soon");
        assert!(schedule.next_for(&id("mara"), 0, 24).is_none());
        assert!(schedule.next_for(&id("jon"), 10, 100).is_none());

        assert_eq!(schedule.drop_past(50), 1);
        assert_eq!(schedule.next_for(&id("mara"), 80, 24).unwrap().label, "later");
    }
}
