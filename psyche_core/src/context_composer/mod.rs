//! Context Composer - turns inner state into a short prompt summary.
//!
//! Composition works as follows:
//! 1. **Focus**: keep the requested characters that exist and are not frozen
//! 2. **Collection**: gather conflict, secret, legend, qualia, perception
//!    and trait lines for each of them
//! 3. **Ordering**: sort lines by kind priority, stable within a kind
//! 4. **Budget**: drop lines from the low-priority end until the rendered
//!    summary fits the character budget

mod summary;

pub use summary::*;

use cast_model::{Character, CharacterId, ComposerConfig, Perception, TraitAxis};
use std::collections::BTreeSet;

use crate::lore::LegendId;
use crate::simulation::Simulation;

/// Builds summaries from simulation state.
#[derive(Debug, Clone, Default)]
pub struct ContextComposer {
    config: ComposerConfig,
}

impl ContextComposer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// Compose a summary for the focus characters.
    ///
    /// Unknown and frozen ids are skipped. Legends shared by several focus
    /// characters appear once.
    pub fn compose(&self, sim: &Simulation, focus: &[CharacterId]) -> Summary {
        let mut seen: BTreeSet<&CharacterId> = BTreeSet::new();
        let mut legends_used: BTreeSet<LegendId> = BTreeSet::new();
        let mut lines = Vec::new();

        for id in focus {
            if !seen.insert(id) {
                continue;
            }
            let Some(character) = sim.cast().character(id).filter(|c| !c.is_frozen()) else {
                tracing::trace!(target: "composer", character = %id, "focus skipped");
                continue;
            };

            lines.extend(conflict_lines(character));

            for secret in sim.secrets().kept_by(id) {
                lines.push(SummaryLine::new(
                    LineKind::Secret,
                    format!("{} is hiding a {} secret: {}", id, secret.severity.label(), secret.text),
                ));
            }

            for legend in sim.lore().legends_involving(id) {
                if legend.archived || legends_used.len() >= self.config.max_legends {
                    continue;
                }
                if legends_used.insert(legend.id) {
                    lines.push(SummaryLine::new(LineKind::Legend, legend.text.clone()));
                }
            }

            lines.push(qualia_line(character));
            lines.extend(self.perception_lines(sim, character));
            lines.push(trait_line(character));
        }

        lines.sort_by_key(|l| l.kind);
        let mut summary = Summary { lines, omitted: 0 };
        while summary.rendered_len() > self.config.max_chars {
            if summary.lines.pop().is_none() {
                break;
            }
            summary.omitted += 1;
        }

        tracing::debug!(
            target: "composer",
            lines = summary.lines.len(),
            omitted = summary.omitted,
            chars = summary.rendered_len(),
            "summary composed"
        );
        summary
    }

    /// The strongest feelings first, measured by distance from neutral affection.
    /// Views of FROZEN or unknown characters stay out of the summary.
    fn perception_lines(&self, sim: &Simulation, character: &Character) -> Vec<SummaryLine> {
        let mut views: Vec<(&CharacterId, &Perception)> = character
            .perceptions
            .iter()
            .filter(|(other, _)| sim.cast().is_active(other))
            .collect();
        views.sort_by(|a, b| {
            strength(b.1)
                .partial_cmp(&strength(a.1))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        views
            .into_iter()
            .take(self.config.max_perceptions_per_character)
            .map(|(other, p)| {
                SummaryLine::new(
                    LineKind::Perception,
                    format!(
                        "{} sees {}: affection {:.0}, trust {:.0}, respect {:.0}, rivalry {:.0}",
                        character.id, other, p.affection, p.trust, p.respect, p.rivalry
                    ),
                )
            })
            .collect()
    }
}

fn strength(p: &Perception) -> f32 {
    (p.affection - 50.0).abs()
}

fn adjective(axis: TraitAxis, value: f32) -> &'static str {
    let (high, low) = axis.adjectives();
    if value >= 0.5 {
        high
    } else {
        low
    }
}

fn conflict_lines(character: &Character) -> Vec<SummaryLine> {
    character
        .conflicts
        .iter()
        .map(|&axis| {
            SummaryLine::new(
                LineKind::Conflict,
                format!(
                    "{} believes they are {} but acts {}",
                    character.id,
                    adjective(axis, character.self_concept.get(axis)),
                    adjective(axis, character.personality.get(axis))
                ),
            )
        })
        .collect()
}

fn qualia_line(character: &Character) -> SummaryLine {
    let q = &character.qualia;
    SummaryLine::new(
        LineKind::Qualia,
        format!(
            "{} is {} (tension {:.2}, valence {:.2}, focus {:.2}, energy {:.2})",
            character.id,
            q.mood_label(),
            q.somatic_tension,
            q.valence,
            q.focus_aperture,
            q.energy_level
        ),
    )
}

fn trait_line(character: &Character) -> SummaryLine {
    let adjectives: Vec<&str> = TraitAxis::ALL
        .iter()
        .map(|&axis| adjective(axis, character.self_concept.get(axis)))
        .collect();
    SummaryLine::new(
        LineKind::Trait,
        format!("{} sees themselves as {}", character.id, adjectives.join(", ")),
    )
}
