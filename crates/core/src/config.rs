//! Tunable generation constants, grouped per pipeline stage.
//!
//! Every section deserializes with `#[serde(default)]`, so a config file only
//! needs to name the values it overrides.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub layout: LayoutConfig,
    pub paths: PathConfig,
    pub events: EventConfig,
    pub scenery: SceneryConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub column_spacing: f32,
    pub row_spacing: f32,
    pub row_slots: usize,
    pub margin: f32,
    pub jitter_x: f32,
    pub min_nodes: usize,
    pub max_nodes: usize,
    pub max_count_rerolls: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_spacing: 180.0,
            row_spacing: 80.0,
            row_slots: 7,
            margin: 96.0,
            jitter_x: 18.0,
            min_nodes: 2,
            max_nodes: 3,
            max_count_rerolls: 8,
        }
    }
}

impl LayoutConfig {
    pub fn map_width(&self, column_count: usize) -> usize {
        let span = column_count.saturating_sub(1) as f32 * self.column_spacing;
        (span + self.margin * 2.0).ceil() as usize
    }

    pub fn map_height(&self) -> usize {
        let span = self.row_slots.saturating_sub(1) as f32 * self.row_spacing;
        (span + self.margin * 2.0).ceil() as usize
    }

    pub fn column_x(&self, floor: usize) -> f32 {
        self.margin + floor as f32 * self.column_spacing
    }

    pub fn center_y(&self) -> f32 {
        self.map_height() as f32 / 2.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub segment_length: f32,
    pub wiggle_amplitude: f32,
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub branch_chance: f32,
    /// Paths meeting at a node may touch inside this radius around it.
    pub endpoint_exemption_radius: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            segment_length: 24.0,
            wiggle_amplitude: 9.0,
            repulsion_radius: 56.0,
            repulsion_strength: 24.0,
            branch_chance: 0.35,
            endpoint_exemption_radius: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub battle_weight: u32,
    pub narrative_weight: u32,
    pub reward_weight: u32,
    pub rest_weight: u32,
    pub omen_weight: u32,
    /// Easy/Normal/Hard weights for the early, middle, and late thirds of a split.
    pub difficulty_curve: [[u32; 3]; 3],
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            battle_weight: 50,
            narrative_weight: 25,
            reward_weight: 10,
            rest_weight: 10,
            omen_weight: 5,
            difficulty_curve: [[60, 30, 10], [25, 50, 25], [10, 35, 55]],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneryConfig {
    pub stride: usize,
    pub placement_frequency: f32,
    pub placement_threshold: f32,
    pub node_clearing_radius: f32,
    /// Fraction of the clearing radius the radial noise may add or remove.
    pub clearing_jaggedness: f32,
    /// Radius of the circle the radial noise is sampled on; higher means more bumps.
    pub radial_frequency: f32,
    pub path_clearance: f32,
    pub clearing_frequency: f32,
    pub clearing_threshold: f32,
    pub min_canopy_radius: usize,
    pub max_canopy_radius: usize,
    pub trunk_height: usize,
}

impl Default for SceneryConfig {
    fn default() -> Self {
        Self {
            stride: 10,
            placement_frequency: 0.045,
            placement_threshold: 0.05,
            node_clearing_radius: 64.0,
            clearing_jaggedness: 0.25,
            radial_frequency: 1.6,
            path_clearance: 18.0,
            clearing_frequency: 0.006,
            clearing_threshold: 0.45,
            min_canopy_radius: 5,
            max_canopy_radius: 7,
            trunk_height: 4,
        }
    }
}

impl SceneryConfig {
    /// Farthest a tree sprite reaches from its anchor point, plus one pixel of anchor rounding.
    pub fn max_sprite_reach(&self) -> f32 {
        (self.trunk_height + self.max_canopy_radius * 2 + 1) as f32
    }

    /// Radius around every node that never receives a sprite pixel: the narrowest jagged clearing.
    pub fn guaranteed_clear_radius(&self) -> f32 {
        (self.node_clearing_radius * (1.0 - self.clearing_jaggedness)).max(0.0)
    }
}
