//! Generated split graph: node and path arenas plus the baked scenery layer.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::types::{Difficulty, NodeId, NodeKind, NodeType, PathId};

use super::geometry::{PixelPos, Vec2};
use super::scenery::PixelBuffer;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDefinition {
    pub id: NodeId,
    pub floor: usize,
    pub position: Vec2,
    pub kind: NodeKind,
    pub incoming: Vec<PathId>,
    pub outgoing: Vec<PathId>,
}

impl NodeDefinition {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathDefinition {
    pub id: PathId,
    pub from: NodeId,
    pub to: NodeId,
    /// Sparse wiggly centerline.
    pub render_points: Vec<Vec2>,
    /// Dense rasterization of `render_points`.
    pub pixel_points: Vec<PixelPos>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Node count per column before pruning.
    pub placed_per_column: Vec<usize>,
    pub pruned_nodes: usize,
    pub rejected_candidates: usize,
    pub secondary_paths: usize,
    /// Non-terminal nodes left without an outgoing path.
    pub dead_ends: usize,
    pub scenery_objects: usize,
}

#[derive(Clone, Debug)]
pub struct SplitMap {
    pub name: String,
    pub nodes: SlotMap<NodeId, NodeDefinition>,
    pub paths: SlotMap<PathId, PathDefinition>,
    /// Node ids per floor, sorted top to bottom.
    pub columns: Vec<Vec<NodeId>>,
    pub origin: NodeId,
    pub terminal: NodeId,
    pub width: usize,
    pub height: usize,
    pub scenery: PixelBuffer,
    pub stats: GenerationStats,
}

impl SplitMap {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.nodes.get(id)
    }

    pub fn path(&self, id: PathId) -> Option<&PathDefinition> {
        self.paths.get(id)
    }

    pub fn column(&self, floor: usize) -> &[NodeId] {
        self.columns.get(floor).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn outgoing_targets(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        node.outgoing.iter().filter_map(|&path| self.paths.get(path)).map(|path| path.to).collect()
    }

    pub fn reachable_from_origin(&self) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::from([self.origin]);
        let mut open = VecDeque::from([self.origin]);
        while let Some(current) = open.pop_front() {
            for next in self.outgoing_targets(current) {
                if seen.insert(next) {
                    open.push_back(next);
                }
            }
        }
        seen
    }

    /// Stable byte encoding of the graph structure, independent of arena handles.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let slot_of: BTreeMap<NodeId, (u32, u32)> = self
            .columns
            .iter()
            .enumerate()
            .flat_map(|(floor, column)| {
                column.iter().enumerate().map(move |(row, &id)| (id, (floor as u32, row as u32)))
            })
            .collect();

        let mut bytes = Vec::new();
        bytes.extend((self.width as u32).to_le_bytes());
        bytes.extend((self.height as u32).to_le_bytes());
        bytes.extend((self.columns.len() as u32).to_le_bytes());
        for column in &self.columns {
            bytes.extend((column.len() as u32).to_le_bytes());
            for &id in column {
                let node = &self.nodes[id];
                bytes.extend(node.position.x.to_bits().to_le_bytes());
                bytes.extend(node.position.y.to_bits().to_le_bytes());
                bytes.push(node_type_code(node.node_type()));
                bytes.push(node.kind.difficulty().map_or(0, difficulty_code));
            }
        }

        let mut edges: Vec<((u32, u32), (u32, u32))> = self
            .paths
            .values()
            .filter_map(|path| Some((*slot_of.get(&path.from)?, *slot_of.get(&path.to)?)))
            .collect();
        edges.sort_unstable();
        bytes.extend((edges.len() as u32).to_le_bytes());
        for ((from_floor, from_row), (to_floor, to_row)) in edges {
            for value in [from_floor, from_row, to_floor, to_row] {
                bytes.extend(value.to_le_bytes());
            }
        }
        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }

    pub fn summary(&self) -> SplitSummary {
        let mut node_types = BTreeMap::new();
        for node in self.nodes.values() {
            *node_types.entry(node.node_type()).or_insert(0) += 1;
        }
        SplitSummary {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            nodes_per_column: self.columns.iter().map(Vec::len).collect(),
            node_types,
            path_count: self.paths.len(),
            stats: self.stats.clone(),
            fingerprint: self.fingerprint(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub nodes_per_column: Vec<usize>,
    pub node_types: BTreeMap<NodeType, usize>,
    pub path_count: usize,
    pub stats: GenerationStats,
    pub fingerprint: u64,
}

fn node_type_code(node_type: NodeType) -> u8 {
    match node_type {
        NodeType::Origin => 0,
        NodeType::Battle => 1,
        NodeType::Narrative => 2,
        NodeType::Reward => 3,
        NodeType::Rest => 4,
        NodeType::Omen => 5,
        NodeType::MajorBattle => 6,
    }
}

fn difficulty_code(difficulty: Difficulty) -> u8 {
    difficulty.index() as u8 + 1
}
