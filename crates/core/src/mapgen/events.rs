//! Weighted node-content assignment and power-sorted difficulty tiers.

use rand_chacha::rand_core::Rng;
use tracing::warn;

use crate::config::EventConfig;
use crate::content::{ArchetypeLookup, Encounter, NarrativeId, SplitDefinition};
use crate::error::SplitError;
use crate::types::{Difficulty, NodeKind, NodeType};

use super::random::RollExt;

/// Per-split lookup tables, built once before any node is assigned.
#[derive(Clone, Debug)]
pub struct ContentTables {
    type_table: Vec<(NodeType, u32)>,
    tiers: [Vec<Encounter>; 3],
    narrative_events: Vec<NarrativeId>,
    major_battles: Vec<Encounter>,
    difficulty_curve: [[u32; 3]; 3],
}

impl ContentTables {
    pub fn build(
        definition: &SplitDefinition,
        archetypes: &dyn ArchetypeLookup,
        config: &EventConfig,
    ) -> Result<Self, SplitError> {
        for encounter in definition.battles.iter().chain(&definition.major_battles) {
            for enemy in &encounter.enemies {
                if archetypes.power_level(enemy).is_none() {
                    warn!(split = %definition.name, enemy = %enemy, "unknown archetype counts as zero power");
                }
            }
        }

        let mut sorted_battles: Vec<(u32, &Encounter)> =
            definition.battles.iter().map(|encounter| (encounter.power(archetypes), encounter)).collect();
        sorted_battles.sort_by_key(|(power, _)| *power);
        let sorted_battles: Vec<Encounter> =
            sorted_battles.into_iter().map(|(_, encounter)| encounter.clone()).collect();

        let type_table = weighted_types(definition, config);
        if type_table.is_empty() {
            return Err(SplitError::NoEventTypes);
        }

        let mut major_battles = definition.major_battles.clone();
        if major_battles.is_empty() {
            let Some(strongest) = sorted_battles.last() else {
                return Err(SplitError::NoMajorEncounter);
            };
            warn!(split = %definition.name, "no major battles defined, using the strongest battle");
            major_battles.push(strongest.clone());
        }

        Ok(Self {
            type_table,
            tiers: partition_tiers(&sorted_battles),
            narrative_events: definition.narrative_events.clone(),
            major_battles,
            difficulty_curve: config.difficulty_curve,
        })
    }

    pub fn tier(&self, difficulty: Difficulty) -> &[Encounter] {
        &self.tiers[difficulty.index()]
    }

    pub fn available_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.type_table.iter().map(|(node_type, _)| *node_type)
    }

    /// Content for a node in an intermediate column.
    pub(super) fn assign<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        floor: usize,
        column_count: usize,
    ) -> NodeKind {
        let weights: Vec<u32> = self.type_table.iter().map(|(_, weight)| *weight).collect();
        let node_type = rng
            .weighted_index(&weights)
            .map_or(self.type_table[0].0, |index| self.type_table[index].0);

        match node_type {
            NodeType::Battle => {
                let difficulty = self.draw_difficulty(rng, floor, column_count);
                let tier = self.tier(difficulty);
                NodeKind::Battle { difficulty, encounter: tier[rng.below(tier.len())].clone() }
            }
            NodeType::Narrative => {
                let event = self.narrative_events[rng.below(self.narrative_events.len())].clone();
                NodeKind::Narrative { event }
            }
            NodeType::Reward => NodeKind::Reward,
            NodeType::Rest => NodeKind::Rest,
            NodeType::Omen | NodeType::Origin | NodeType::MajorBattle => NodeKind::Omen,
        }
    }

    pub(super) fn major<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeKind {
        let encounter = self.major_battles[rng.below(self.major_battles.len())].clone();
        NodeKind::MajorBattle { encounter }
    }

    fn draw_difficulty<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        floor: usize,
        column_count: usize,
    ) -> Difficulty {
        let last = column_count.saturating_sub(1).max(1);
        let stage = (floor * 3 / last).min(2);
        rng.weighted_index(&self.difficulty_curve[stage])
            .map_or(Difficulty::Normal, |index| Difficulty::ALL[index])
    }
}

fn weighted_types(definition: &SplitDefinition, config: &EventConfig) -> Vec<(NodeType, u32)> {
    let candidates = [
        (NodeType::Battle, config.battle_weight, !definition.battles.is_empty()),
        (NodeType::Narrative, config.narrative_weight, !definition.narrative_events.is_empty()),
        (NodeType::Reward, config.reward_weight, true),
        (NodeType::Rest, config.rest_weight, true),
        (NodeType::Omen, config.omen_weight, true),
    ];

    let mut table = Vec::new();
    for (node_type, weight, has_content) in candidates {
        if !has_content {
            if weight > 0 {
                warn!(split = %definition.name, ?node_type, "content pool empty, type excluded");
            }
            continue;
        }
        if weight > 0 {
            table.push((node_type, weight));
        }
    }
    table
}

/// Splits power-sorted encounters into Easy/Normal/Hard thirds, backfilling empty tiers.
pub(super) fn partition_tiers(sorted: &[Encounter]) -> [Vec<Encounter>; 3] {
    let total = sorted.len();
    let bounds = [0, total / 3, total * 2 / 3, total];
    let original: [Vec<Encounter>; 3] =
        [0, 1, 2].map(|tier| sorted[bounds[tier]..bounds[tier + 1]].to_vec());

    let mut tiers = original.clone();
    for (tier, slot) in tiers.iter_mut().enumerate() {
        if !slot.is_empty() {
            continue;
        }
        if let Some(donor) = nearest_non_empty(&original, tier) {
            *slot = original[donor].clone();
        }
    }
    tiers
}

fn nearest_non_empty(tiers: &[Vec<Encounter>; 3], tier: usize) -> Option<usize> {
    for distance in 1..3 {
        let harder = tier + distance;
        if harder < 3 && !tiers[harder].is_empty() {
            return Some(harder);
        }
        if let Some(easier) = tier.checked_sub(distance)
            && !tiers[easier].is_empty()
        {
            return Some(easier);
        }
    }
    None
}
