//! Split generation orchestration: columns, content, paths, then scenery.

use rand_chacha::rand_core::Rng;
use slotmap::SlotMap;
use tracing::{Level, debug, info, span};

use crate::config::GeneratorConfig;
use crate::content::{ArchetypeLookup, SplitDefinition};
use crate::error::SplitError;
use crate::types::{NodeId, NodeKind, PathId};

use super::connector::{ConnectContext, connect_columns};
use super::events::ContentTables;
use super::geometry::{PixelPos, Vec2};
use super::model::{GenerationStats, NodeDefinition, PathDefinition, SplitMap};
use super::noise_field::SceneryNoise;
use super::placement::{ColumnRequest, place_column};
use super::random::RollExt;
use super::scenery::{BakeContext, bake};
use super::wiggle;

#[derive(Clone, Debug, Default)]
pub struct SplitGenerator {
    config: GeneratorConfig,
}

/// Node graph before scenery is baked.
struct GraphDraft {
    nodes: SlotMap<NodeId, NodeDefinition>,
    paths: SlotMap<PathId, PathDefinition>,
    columns: Vec<Vec<NodeId>>,
    origin: NodeId,
    terminal: NodeId,
    stats: GenerationStats,
}

impl SplitGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        definition: &SplitDefinition,
        archetypes: &dyn ArchetypeLookup,
    ) -> Result<SplitMap, SplitError> {
        let span = span!(Level::DEBUG, "generate_split", split = %definition.name);
        let _guard = span.enter();

        let draft = self.build_graph(rng, definition, archetypes)?;
        let noise = SceneryNoise::perlin(rng, &self.config.scenery);
        Ok(self.finish(rng, definition, draft, &noise))
    }

    /// Same as [`SplitGenerator::generate`] but bakes scenery with caller-provided noise fields.
    pub fn generate_with_noise<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        definition: &SplitDefinition,
        archetypes: &dyn ArchetypeLookup,
        noise: &SceneryNoise,
    ) -> Result<SplitMap, SplitError> {
        let span = span!(Level::DEBUG, "generate_split", split = %definition.name);
        let _guard = span.enter();

        let draft = self.build_graph(rng, definition, archetypes)?;
        Ok(self.finish(rng, definition, draft, noise))
    }

    fn build_graph<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        definition: &SplitDefinition,
        archetypes: &dyn ArchetypeLookup,
    ) -> Result<GraphDraft, SplitError> {
        let range = definition.columns;
        if range.min < 2 || range.min > range.max {
            return Err(SplitError::InvalidColumnRange { min: range.min, max: range.max });
        }
        let tables = ContentTables::build(definition, archetypes, &self.config.events)?;
        let layout = &self.config.layout;
        let column_count = rng.range_inclusive(range.min, range.max);

        let mut nodes: SlotMap<NodeId, NodeDefinition> = SlotMap::with_key();
        let mut paths: SlotMap<PathId, PathDefinition> = SlotMap::with_key();
        let mut columns: Vec<Vec<NodeId>> = Vec::with_capacity(column_count);
        let mut stats = GenerationStats::default();

        let mut previous_count = 0;
        let mut anchor = Vec2::new(layout.column_x(0), layout.center_y());
        for floor in 0..column_count {
            let request = ColumnRequest { floor, column_count, previous_count, anchor };
            let positions = place_column(rng, layout, &request);

            let mut column = Vec::with_capacity(positions.len());
            for &position in &positions {
                let kind = if floor == 0 {
                    NodeKind::Origin
                } else if floor + 1 == column_count {
                    tables.major(rng)
                } else {
                    tables.assign(rng, floor, column_count)
                };
                let id = nodes.insert_with_key(|id| NodeDefinition {
                    id,
                    floor,
                    position,
                    kind,
                    incoming: Vec::new(),
                    outgoing: Vec::new(),
                });
                column.push(id);
            }
            debug!(floor, nodes = column.len(), "placed column");

            if !positions.is_empty() {
                let sum = positions.iter().fold(Vec2::ZERO, |total, &position| total + position);
                anchor = sum * (1.0 / positions.len() as f32);
            }
            previous_count = column.len();
            stats.placed_per_column.push(column.len());
            columns.push(column);
        }

        for floor in 1..column_count {
            let repellers: Vec<Vec2> = nodes.values().map(|node| node.position).collect();
            let (before, after) = columns.split_at_mut(floor);
            let (Some(previous), Some(next)) = (before.last(), after.first_mut()) else {
                continue;
            };
            let outcome = connect_columns(
                rng,
                &mut ConnectContext {
                    config: &self.config.paths,
                    nodes: &mut nodes,
                    paths: &mut paths,
                    repellers: &repellers,
                },
                previous,
                next,
            );
            debug!(
                floor,
                created = outcome.created,
                rejected = outcome.rejected,
                pruned = outcome.pruned,
                "connected columns"
            );
            stats.pruned_nodes += outcome.pruned;
            stats.rejected_candidates += outcome.rejected;
            stats.secondary_paths += outcome.secondary;
            stats.dead_ends += outcome.dead_ends;
            if next.is_empty() {
                return Err(SplitError::Unconnectable { floor });
            }
        }

        for path in paths.values_mut() {
            path.pixel_points = wiggle::rasterize(&path.render_points);
        }

        let origin = columns.first().and_then(|column| column.first().copied());
        let terminal = columns.last().and_then(|column| column.first().copied());
        let (Some(origin), Some(terminal)) = (origin, terminal) else {
            return Err(SplitError::Unconnectable { floor: column_count.saturating_sub(1) });
        };

        Ok(GraphDraft { nodes, paths, columns, origin, terminal, stats })
    }

    fn finish<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        definition: &SplitDefinition,
        draft: GraphDraft,
        noise: &SceneryNoise,
    ) -> SplitMap {
        let GraphDraft { nodes, paths, columns, origin, terminal, mut stats } = draft;
        let width = self.config.layout.map_width(columns.len());
        let height = self.config.layout.map_height();

        let node_positions: Vec<Vec2> = nodes.values().map(|node| node.position).collect();
        let path_pixels: Vec<&[PixelPos]> =
            paths.values().map(|path| path.pixel_points.as_slice()).collect();
        let (scenery, trees) = bake(
            rng,
            &BakeContext {
                config: &self.config.scenery,
                theme: &definition.theme,
                noise,
                width,
                height,
                node_positions: &node_positions,
                path_pixels: &path_pixels,
            },
        );
        stats.scenery_objects = trees;

        info!(
            split = %definition.name,
            columns = columns.len(),
            nodes = nodes.len(),
            paths = paths.len(),
            trees,
            "generated split"
        );

        SplitMap {
            name: definition.name.clone(),
            nodes,
            paths,
            columns,
            origin,
            terminal,
            width,
            height,
            scenery,
            stats,
        }
    }
}
