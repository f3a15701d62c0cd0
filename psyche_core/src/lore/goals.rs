//! Goals: multi-step plans characters pursue on and off screen.

use cast_model::CharacterId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Legend, LegendId, NormStance, NormsEngine};

/// Unique identifier for goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoalId(pub Uuid);

impl GoalId {
    /// Create a new random goal ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GoalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanStep {
    pub description: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
    pub id: GoalId,
    pub character: CharacterId,
    pub text: String,
    pub status: GoalStatus,
    pub steps: Vec<PlanStep>,
    /// Index of the next pending step.
    pub plan_progress: usize,
    pub inspired_by: Option<LegendId>,
}

impl Default for Goal {
    fn default() -> Self {
        Self {
            id: GoalId::new(),
            character: CharacterId::default(),
            text: String::new(),
            status: GoalStatus::Active,
            steps: Vec::new(),
            plan_progress: 0,
            inspired_by: None,
        }
    }
}

impl Goal {
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    pub fn current_step(&self) -> Option<&PlanStep> {
        self.steps.get(self.plan_progress)
    }
}

/// Result of advancing a plan by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAdvance {
    Advanced,
    Completed,
    /// Active, but every step is already done. Only reachable from saved state.
    Stalled,
    /// Unknown, finished, or abandoned goal.
    Inactive,
}

/// Owns every goal, indexed by character.
#[derive(Debug, Clone, Default)]
pub struct GoalsEngine {
    goals: BTreeMap<GoalId, Goal>,
    by_character: BTreeMap<CharacterId, Vec<GoalId>>,
}

impl GoalsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted goals, repairing out-of-range progress.
    pub fn restore(goals: Vec<Goal>) -> Self {
        let mut engine = Self::new();
        for mut goal in goals {
            if goal.steps.is_empty() {
                goal.steps.push(PlanStep {
                    description: goal.text.clone(),
                    status: StepStatus::Pending,
                });
            }
            goal.plan_progress = goal.plan_progress.min(goal.steps.len());
            engine.insert(goal);
        }
        engine
    }

    fn insert(&mut self, goal: Goal) -> GoalId {
        let id = goal.id;
        self.by_character
            .entry(goal.character.clone())
            .or_default()
            .push(id);
        self.goals.insert(id, goal);
        id
    }

    /// Create an active goal. An empty plan becomes a single step named after the goal.
    pub fn create_goal(
        &mut self,
        character: &CharacterId,
        text: impl Into<String>,
        steps: Vec<String>,
    ) -> GoalId {
        let text = text.into();
        let mut steps: Vec<PlanStep> = steps
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(|description| PlanStep {
                description,
                status: StepStatus::Pending,
            })
            .collect();
        if steps.is_empty() {
            steps.push(PlanStep {
                description: text.clone(),
                status: StepStatus::Pending,
            });
        }
        self.insert(Goal {
            id: GoalId::new(),
            character: character.clone(),
            text,
            status: GoalStatus::Active,
            steps,
            plan_progress: 0,
            inspired_by: None,
        })
    }

    pub fn goal(&self, id: GoalId) -> Option<&Goal> {
        self.goals.get(&id)
    }

    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values()
    }

    /// Every goal a character has held, in creation order.
    pub fn goals_for(&self, character: &CharacterId) -> Vec<&Goal> {
        self.by_character
            .get(character)
            .map(|ids| ids.iter().filter_map(|id| self.goals.get(id)).collect())
            .unwrap_or_default()
    }

    /// The character's first active goal, if any.
    pub fn active_goal_for(&self, character: &CharacterId) -> Option<GoalId> {
        self.by_character.get(character)?.iter().copied().find(|id| {
            self.goals.get(id).is_some_and(Goal::is_active)
        })
    }

    /// Complete the current step and move to the next.
    pub fn advance_plan(&mut self, id: GoalId) -> PlanAdvance {
        let Some(goal) = self.goals.get_mut(&id) else {
            return PlanAdvance::Inactive;
        };
        if !goal.is_active() {
            return PlanAdvance::Inactive;
        }
        if goal.plan_progress >= goal.steps.len() {
            return PlanAdvance::Stalled;
        }
        if let Some(step) = goal.steps.get_mut(goal.plan_progress) {
            step.status = StepStatus::Done;
        }
        goal.plan_progress = (goal.plan_progress + 1).min(goal.steps.len());
        if goal.plan_progress >= goal.steps.len() {
            goal.status = GoalStatus::Completed;
            tracing::debug!(target: "lore.goals", goal = %id, character = %goal.character, "goal completed");
            PlanAdvance::Completed
        } else {
            PlanAdvance::Advanced
        }
    }

    pub fn abandon(&mut self, id: GoalId) -> bool {
        match self.goals.get_mut(&id) {
            Some(goal) if goal.is_active() => {
                goal.status = GoalStatus::Abandoned;
                true
            }
            _ => false,
        }
    }

    /// Create a goal inspired by a remembered legend.
    ///
    /// Accepted legends are emulated, taboo legends are guarded against,
    /// neutral ones inspire nothing. A legend inspires a character once.
    pub fn synthesize_from_legend(
        &mut self,
        character: &CharacterId,
        legend: &Legend,
        norms: &NormsEngine,
    ) -> Option<GoalId> {
        let already = self
            .goals_for(character)
            .iter()
            .any(|g| g.inspired_by == Some(legend.id));
        if already {
            return None;
        }

        let noun = legend.kind.noun();
        let hero = legend
            .participants
            .first()
            .filter(|id| !id.is_blank())
            .map(|id| id.to_string())
            .unwrap_or_else(|| "the old story".to_string());

        let (text, steps) = match norms.stance(&legend.kind.key()) {
            NormStance::Accepted => (
                format!("Earn a {} to rival that of {}", noun, hero),
                vec![
                    format!("Seek out those who remember the {}", noun),
                    "Find a moment that calls for the same courage".to_string(),
                    "Act where the group can see it".to_string(),
                ],
            ),
            NormStance::Taboo => (
                format!("Make sure the {} of {} is never repeated", noun, hero),
                vec![
                    "Learn who was wronged and how".to_string(),
                    "Win allies who share the worry".to_string(),
                    format!("Confront the next sign of {}", noun),
                ],
            ),
            NormStance::Neutral => return None,
        };

        let id = self.create_goal(character, text, steps);
        if let Some(goal) = self.goals.get_mut(&id) {
            goal.inspired_by = Some(legend.id);
        }
        Some(id)
    }
}
