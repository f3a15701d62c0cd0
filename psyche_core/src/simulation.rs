//! The simulation - owns every piece of state and runs the event cascade.
//!
//! One call to [`Simulation::process_event`] runs the whole cascade for one
//! event before returning, so there is never more than one event in flight.

use cast_model::{CastState, CharacterId, LifecycleReport, SimConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::context_composer::{ContextComposer, Summary};
use crate::crucible::{CrucibleEngine, CrucibleEvent, CrucibleOutcome};
use crate::director::{CycleReport, LivingWorldDirector, Schedule, ScheduledEvent, TimeJump};
use crate::error::GossipError;
use crate::events::{EventKind, RawEvent, Spin, StoryEvent};
use crate::gossip::{GossipEngine, RumorId};
use crate::hierarchy::{ActionDescriptor, HierarchyEngine, PerformanceSignals, StatusChange};
use crate::information::InformationEngine;
use crate::lore::{GoalId, GoalsEngine, LegendId, LegendKind, LoreEngine, NormsEngine};
use crate::qualia::QualiaEngine;
use crate::relations::{PerceptionSwing, RelationsEngine};
use crate::secrets::SecretLedger;

/// Everything one event changed.
#[derive(Debug, Clone, Default)]
pub struct EventReport {
    pub swings: Vec<PerceptionSwing>,
    pub capital_delta: f32,
    pub crucible: Vec<CrucibleOutcome>,
    pub legend: Option<LegendId>,
    pub inspired_goals: Vec<GoalId>,
    pub rumor: Option<RumorId>,
}

/// Result of telling a rumor to someone new.
#[derive(Debug, Clone, Default)]
pub struct SpreadOutcome {
    pub spread: bool,
    /// Set when the rumor reached enough ears to shake its subject.
    pub crucible: Option<CrucibleOutcome>,
}

pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) cast: CastState,
    pub(crate) qualia: QualiaEngine,
    pub(crate) information: InformationEngine,
    pub(crate) relations: RelationsEngine,
    pub(crate) hierarchy: HierarchyEngine,
    pub(crate) crucible: CrucibleEngine,
    pub(crate) lore: LoreEngine,
    pub(crate) norms: NormsEngine,
    pub(crate) goals: GoalsEngine,
    pub(crate) gossip: GossipEngine,
    pub(crate) secrets: SecretLedger,
    pub(crate) schedule: Schedule,
    pub(crate) rng: StdRng,
}

impl Simulation {
    /// Create an empty simulation.
    ///
    /// An invalid config is logged, not rejected; engines clamp what they read.
    pub fn new(config: SimConfig) -> Self {
        if let Err(error) = config.validate() {
            tracing::warn!(target: "simulation", %error, "config failed validation");
        }
        Self {
            cast: CastState::new(),
            qualia: QualiaEngine::new(config.qualia.clone()),
            information: InformationEngine::new(config.interpretation.clone()),
            relations: RelationsEngine::new(config.relations.clone()),
            hierarchy: HierarchyEngine::new(config.hierarchy.clone()),
            crucible: CrucibleEngine::new(config.crucible.clone()),
            lore: LoreEngine::new(config.lore.clone()),
            norms: NormsEngine::new(),
            goals: GoalsEngine::new(),
            gossip: GossipEngine::new(config.gossip.clone()),
            secrets: SecretLedger::new(),
            schedule: Schedule::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn cast(&self) -> &CastState {
        &self.cast
    }

    pub fn cast_mut(&mut self) -> &mut CastState {
        &mut self.cast
    }

    pub fn lore(&self) -> &LoreEngine {
        &self.lore
    }

    pub fn norms(&self) -> &NormsEngine {
        &self.norms
    }

    pub fn goals(&self) -> &GoalsEngine {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut GoalsEngine {
        &mut self.goals
    }

    pub fn gossip(&self) -> &GossipEngine {
        &self.gossip
    }

    pub fn secrets(&self) -> &SecretLedger {
        &self.secrets
    }

    pub fn secrets_mut(&mut self) -> &mut SecretLedger {
        &mut self.secrets
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn relations(&self) -> &RelationsEngine {
        &self.relations
    }

    pub fn information(&self) -> &InformationEngine {
        &self.information
    }

    /// Put an appointment on the calendar.
    pub fn schedule_event(&mut self, label: impl Into<String>, at_hour: u64, participants: Vec<CharacterId>) {
        self.schedule.add(ScheduledEvent {
            label: label.into(),
            at_hour,
            participants,
        });
    }

    pub fn set_scene(&mut self, label: impl Into<String>) {
        self.cast.clock.set_scene(label);
    }

    /// Validate a detector event and run it through the cascade.
    ///
    /// Events without a usable actor are ignored.
    pub fn process_event(&mut self, raw: &RawEvent) -> Option<EventReport> {
        let Some(event) = raw.normalize() else {
            tracing::debug!(target: "simulation", "event without actor ignored");
            return None;
        };
        Some(self.process_story_event(&event))
    }

    /// Run the full cascade for one validated event.
    pub fn process_story_event(&mut self, event: &StoryEvent) -> EventReport {
        let turn = self.cast.clock.turn;
        let involved = event.involved();
        let mut report = EventReport::default();

        for id in &involved {
            let character = self.cast.record_mention(id, &self.config.lifecycle);
            character.interactions = character.interactions.saturating_add(1);
        }

        self.qualia.resonate_event(&mut self.cast, event);
        self.qualia
            .run_group_resonance(&mut self.cast, &involved, self.config.qualia.group_blend);

        report.swings = self.relations.apply_event(
            &mut self.cast,
            event,
            &self.information,
            &self.lore,
            &self.norms,
        );

        report.capital_delta = self.hierarchy.update_capital(
            &mut self.cast,
            &event.actor,
            &ActionDescriptor::from_event(event),
            &event.witnesses,
        );

        let mut formative = CrucibleEvent::from_story_event(event);
        if !matches!(event.kind, EventKind::RelationChange { .. }) {
            formative.extend(
                report
                    .swings
                    .iter()
                    .filter(|s| self.crucible.is_formative(s.affection_delta))
                    .map(|s| CrucibleEvent::RelationChange {
                        character: s.observer.clone(),
                        change: s.affection_delta,
                    }),
            );
        }
        for crucible_event in &formative {
            if let Some(outcome) = self.crucible.analyze_event(&mut self.cast, crucible_event) {
                report.crucible.push(outcome);
            }
        }

        report.legend = self.lore.consider(event, turn);
        if let Some(legend) = report.legend.and_then(|id| self.lore.legend(id)) {
            self.norms.absorb_legend(legend);
            for id in &involved {
                if let Some(goal) = self.goals.synthesize_from_legend(id, legend, &self.norms) {
                    report.inspired_goals.push(goal);
                }
            }
        }

        if let Some(actor) = self.cast.character_mut(&event.actor) {
            let key = LegendKind::from_event(&event.kind).key();
            self.norms.observe_conduct(actor, &key);
        }

        let teller = event.witnesses.first().or(event.target.as_ref());
        if let Some(teller) = teller {
            report.rumor = self.gossip.observe(event, teller, &self.cast, turn);
            if let Some(rumor) = report.rumor {
                if let Err(error) = self.gossip.update_reputation(rumor) {
                    tracing::warn!(target: "simulation", %error, "reputation update skipped");
                }
            }
        }

        tracing::debug!(
            target: "simulation",
            turn,
            event = %event.type_key(),
            actor = %event.actor,
            swings = report.swings.len(),
            formative = report.crucible.len(),
            legend = report.legend.is_some(),
            "event processed"
        );
        report
    }

    /// Move to the next narrative turn and run lifecycle upkeep.
    pub fn advance_turn(&mut self) -> LifecycleReport {
        self.cast.clock.advance_turn();
        let turn = self.cast.clock.turn;
        let report = self.cast.apply_lifecycle(&self.config.lifecycle);
        self.lore.archive_stale(turn);
        self.gossip.prune(turn, self.config.gossip.max_rumor_age);
        report
    }

    pub fn recalculate_status(&mut self, signals: &PerformanceSignals) -> Vec<StatusChange> {
        self.hierarchy.recalculate_status(&mut self.cast, signals)
    }

    /// Tell a rumor from one character to another.
    ///
    /// A negative rumor that reaches the configured number of hops becomes
    /// a formative event for its subject.
    pub fn spread_rumor(&mut self, id: RumorId, from: &CharacterId, to: &CharacterId) -> Result<SpreadOutcome, GossipError> {
        let spread = self.gossip.spread_rumor(id, from, to)?;
        if !spread {
            return Ok(SpreadOutcome::default());
        }
        self.gossip.update_reputation(id)?;

        let mut outcome = SpreadOutcome {
            spread: true,
            crucible: None,
        };
        let trigger = self.config.gossip.crucible_spread;
        if let Some(rumor) = self.gossip.rumor(id) {
            if rumor.spin == Spin::Negative && rumor.hops == trigger {
                let event = CrucibleEvent::RumorSpread {
                    character: rumor.subject.clone(),
                    spin: rumor.spin,
                    spread_count: rumor.hops,
                };
                outcome.crucible = self.crucible.analyze_event(&mut self.cast, &event);
            }
        }
        Ok(outcome)
    }

    /// Let two characters trade whatever rumors one of them has not heard.
    pub fn exchange_gossip(&mut self, a: &CharacterId, b: &CharacterId) -> Vec<RumorId> {
        self.gossip.auto_propagate(a, b, &self.cast, &mut self.rng)
    }

    /// Summarize the focus characters for the text generator.
    pub fn compose(&self, focus: &[CharacterId]) -> Summary {
        ContextComposer::new(self.config.composer.clone()).compose(self, focus)
    }

    /// Run one off-screen cycle with the configured director.
    pub fn run_off_screen_cycle(&mut self, jump: TimeJump) -> CycleReport {
        LivingWorldDirector::new(self.config.director.clone()).run_off_screen_cycle(self, jump)
    }
}
