//! Wires two adjacent columns with non-crossing wiggly paths and prunes unreachable nodes.
//!
//! Passes run in a fixed order: primary (one path per source), reachability
//! (every target gets an incoming path if geometry allows), branching (optional
//! second path per source), pruning (targets still without incoming are removed).

use std::collections::BTreeMap;

use rand_chacha::rand_core::Rng;
use slotmap::SlotMap;
use tracing::debug;

use crate::config::PathConfig;
use crate::types::{NodeId, PathId};

use super::geometry::{Vec2, polylines_cross};
use super::model::{NodeDefinition, PathDefinition};
use super::random::RollExt;
use super::wiggle;

pub(super) struct ConnectContext<'a> {
    pub(super) config: &'a PathConfig,
    pub(super) nodes: &'a mut SlotMap<NodeId, NodeDefinition>,
    pub(super) paths: &'a mut SlotMap<PathId, PathDefinition>,
    /// Every placed node position; paths bend away from these.
    pub(super) repellers: &'a [Vec2],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct ConnectOutcome {
    pub(super) created: usize,
    pub(super) secondary: usize,
    pub(super) rejected: usize,
    pub(super) pruned: usize,
    pub(super) dead_ends: usize,
}

pub(super) fn connect_columns<R: Rng + ?Sized>(
    rng: &mut R,
    context: &mut ConnectContext<'_>,
    previous: &[NodeId],
    next: &mut Vec<NodeId>,
) -> ConnectOutcome {
    let mut outcome = ConnectOutcome::default();
    let mut sources = previous.to_vec();
    sources.sort_by(|&a, &b| position(context, a).y.total_cmp(&position(context, b).y));
    next.sort_by(|&a, &b| position(context, a).y.total_cmp(&position(context, b).y));

    let mut primary_targets: BTreeMap<NodeId, NodeId> = BTreeMap::new();

    for &source in &sources {
        let origin = position(context, source);
        let mut candidates = next.clone();
        candidates.sort_by(|&a, &b| {
            has_incoming(context, a)
                .cmp(&has_incoming(context, b))
                .then(distance_squared(context, origin, a).total_cmp(&distance_squared(context, origin, b)))
        });
        for target in candidates {
            if try_connect(rng, context, source, target, &mut outcome).is_some() {
                primary_targets.insert(source, target);
                break;
            }
        }
    }

    for &target in next.iter() {
        if has_incoming(context, target) {
            continue;
        }
        let destination = position(context, target);
        let mut candidates = sources.clone();
        candidates.sort_by(|&a, &b| {
            distance_squared(context, destination, a).total_cmp(&distance_squared(context, destination, b))
        });
        for source in candidates {
            if try_connect(rng, context, source, target, &mut outcome).is_some() {
                primary_targets.entry(source).or_insert(target);
                break;
            }
        }
    }

    for &source in &sources {
        let Some(&primary) = primary_targets.get(&source) else {
            continue;
        };
        if !rng.chance(context.config.branch_chance) {
            continue;
        }
        let Some(index) = next.iter().position(|&target| target == primary) else {
            continue;
        };
        let mut neighbours: Vec<NodeId> = [index.checked_sub(1), Some(index + 1)]
            .into_iter()
            .flatten()
            .filter_map(|neighbour| next.get(neighbour).copied())
            .collect();
        if neighbours.len() == 2 && rng.chance(0.5) {
            neighbours.swap(0, 1);
        }
        for target in neighbours {
            if reaches(context, source, target) {
                continue;
            }
            if try_connect(rng, context, source, target, &mut outcome).is_some() {
                outcome.secondary += 1;
                break;
            }
        }
    }

    let orphans: Vec<NodeId> =
        next.iter().copied().filter(|&target| !has_incoming(context, target)).collect();
    for &orphan in &orphans {
        remove_node(context, orphan);
        debug!(node = ?orphan, "pruned unreachable node");
    }
    next.retain(|target| !orphans.contains(target));
    outcome.pruned = orphans.len();

    outcome.dead_ends = sources
        .iter()
        .filter(|&&source| context.nodes.get(source).is_some_and(|node| node.outgoing.is_empty()))
        .count();
    outcome
}

fn try_connect<R: Rng + ?Sized>(
    rng: &mut R,
    context: &mut ConnectContext<'_>,
    source: NodeId,
    target: NodeId,
    outcome: &mut ConnectOutcome,
) -> Option<PathId> {
    let from = position(context, source);
    let to = position(context, target);
    let render_points = wiggle::synthesize(rng, context.config, from, to, context.repellers);

    let exemption = context.config.endpoint_exemption_radius;
    if context
        .paths
        .values()
        .any(|existing| polylines_cross(&existing.render_points, &render_points, exemption))
    {
        outcome.rejected += 1;
        return None;
    }

    let id = context.paths.insert_with_key(|id| PathDefinition {
        id,
        from: source,
        to: target,
        render_points,
        pixel_points: Vec::new(),
    });
    if let Some(node) = context.nodes.get_mut(source) {
        node.outgoing.push(id);
    }
    if let Some(node) = context.nodes.get_mut(target) {
        node.incoming.push(id);
    }
    outcome.created += 1;
    Some(id)
}

/// Removes a node along with every path touching it and the matching edge ids on the far ends.
fn remove_node(context: &mut ConnectContext<'_>, id: NodeId) {
    let touching: Vec<PathId> = context
        .paths
        .iter()
        .filter(|(_, path)| path.from == id || path.to == id)
        .map(|(path_id, _)| path_id)
        .collect();
    for path_id in touching {
        if let Some(path) = context.paths.remove(path_id) {
            for end in [path.from, path.to] {
                if let Some(node) = context.nodes.get_mut(end) {
                    node.incoming.retain(|&edge| edge != path_id);
                    node.outgoing.retain(|&edge| edge != path_id);
                }
            }
        }
    }
    context.nodes.remove(id);
}

fn reaches(context: &ConnectContext<'_>, source: NodeId, target: NodeId) -> bool {
    context.nodes.get(source).is_some_and(|node| {
        node.outgoing.iter().any(|&edge| context.paths.get(edge).is_some_and(|path| path.to == target))
    })
}

fn has_incoming(context: &ConnectContext<'_>, id: NodeId) -> bool {
    context.nodes.get(id).is_some_and(|node| !node.incoming.is_empty())
}

fn position(context: &ConnectContext<'_>, id: NodeId) -> Vec2 {
    context.nodes.get(id).map_or(Vec2::ZERO, |node| node.position)
}

fn distance_squared(context: &ConnectContext<'_>, from: Vec2, id: NodeId) -> f32 {
    from.distance_squared(position(context, id))
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;
    use crate::types::NodeKind;

    struct Fixture {
        nodes: SlotMap<NodeId, NodeDefinition>,
        paths: SlotMap<PathId, PathDefinition>,
    }

    impl Fixture {
        fn new() -> Self {
            Self { nodes: SlotMap::with_key(), paths: SlotMap::with_key() }
        }

        fn node(&mut self, floor: usize, x: f32, y: f32) -> NodeId {
            self.nodes.insert_with_key(|id| NodeDefinition {
                id,
                floor,
                position: Vec2::new(x, y),
                kind: NodeKind::Rest,
                incoming: Vec::new(),
                outgoing: Vec::new(),
            })
        }

        fn connect(
            &mut self,
            config: &PathConfig,
            seed: u64,
            previous: &[NodeId],
            next: &mut Vec<NodeId>,
        ) -> ConnectOutcome {
            let repellers: Vec<Vec2> = previous
                .iter()
                .chain(next.iter())
                .map(|&id| self.nodes[id].position)
                .collect();
            let mut context = ConnectContext {
                config,
                nodes: &mut self.nodes,
                paths: &mut self.paths,
                repellers: &repellers,
            };
            connect_columns(&mut ChaCha8Rng::seed_from_u64(seed), &mut context, previous, next)
        }

        fn assert_no_crossings(&self, config: &PathConfig) {
            let paths: Vec<&PathDefinition> = self.paths.values().collect();
            for (index, a) in paths.iter().enumerate() {
                for b in &paths[index + 1..] {
                    assert!(!polylines_cross(
                        &a.render_points,
                        &b.render_points,
                        config.endpoint_exemption_radius
                    ));
                }
            }
        }
    }

    #[test]
    fn parallel_columns_connect_straight_across() {
        let config = PathConfig { branch_chance: 0.0, ..PathConfig::default() };
        let mut fixture = Fixture::new();
        let top = fixture.node(0, 0.0, 100.0);
        let bottom = fixture.node(0, 0.0, 400.0);
        let mut next = vec![fixture.node(1, 200.0, 400.0), fixture.node(1, 200.0, 100.0)];

        let outcome = fixture.connect(&config, 1, &[top, bottom], &mut next);

        assert_eq!(outcome, ConnectOutcome { created: 2, ..ConnectOutcome::default() });
        assert_eq!(fixture.nodes[next[0]].position.y, 100.0, "next column is sorted by y");
        let top_path = fixture.paths[fixture.nodes[top].outgoing[0]].to;
        let bottom_path = fixture.paths[fixture.nodes[bottom].outgoing[0]].to;
        assert_eq!(top_path, next[0]);
        assert_eq!(bottom_path, next[1]);
        fixture.assert_no_crossings(&config);
    }

    #[test]
    fn single_source_reaches_every_target() {
        let config = PathConfig { branch_chance: 0.0, ..PathConfig::default() };
        let mut fixture = Fixture::new();
        let source = fixture.node(0, 0.0, 300.0);
        let mut next = vec![
            fixture.node(1, 180.0, 100.0),
            fixture.node(1, 180.0, 300.0),
            fixture.node(1, 180.0, 500.0),
        ];

        let outcome = fixture.connect(&config, 2, &[source], &mut next);

        assert_eq!(outcome.created, 3);
        assert_eq!(outcome.pruned, 0);
        assert_eq!(fixture.nodes[source].outgoing.len(), 3);
        for &target in &next {
            assert_eq!(fixture.nodes[target].incoming.len(), 1);
        }
        fixture.assert_no_crossings(&config);
    }

    #[test]
    fn blocked_target_is_pruned_with_its_edges() {
        let config = PathConfig { branch_chance: 0.0, ..PathConfig::default() };
        let mut fixture = Fixture::new();
        let wall_top = fixture.node(9, 150.0, 200.0);
        let wall_bottom = fixture.node(9, 150.0, 600.0);
        fixture.paths.insert_with_key(|id| PathDefinition {
            id,
            from: wall_top,
            to: wall_bottom,
            render_points: vec![Vec2::new(150.0, 200.0), Vec2::new(150.0, 600.0)],
            pixel_points: Vec::new(),
        });

        let source = fixture.node(0, 0.0, 100.0);
        let open = fixture.node(1, 200.0, 100.0);
        let blocked = fixture.node(1, 200.0, 400.0);
        let mut next = vec![open, blocked];

        let outcome = fixture.connect(&config, 3, &[source], &mut next);

        assert_eq!(next, vec![open]);
        assert_eq!(outcome.pruned, 1);
        assert!(outcome.rejected >= 1);
        assert!(!fixture.nodes.contains_key(blocked));
        assert!(fixture.paths.values().all(|path| path.to != blocked));
        assert_eq!(fixture.nodes[source].outgoing.len(), 1);
    }

    #[test]
    fn branching_adds_secondary_path_only_when_it_does_not_cross() {
        let config = PathConfig { branch_chance: 1.0, ..PathConfig::default() };
        let mut fixture = Fixture::new();
        let top = fixture.node(0, 0.0, 100.0);
        let bottom = fixture.node(0, 0.0, 500.0);
        let mut next = vec![fixture.node(1, 200.0, 100.0), fixture.node(1, 200.0, 500.0)];

        let outcome = fixture.connect(&config, 4, &[top, bottom], &mut next);

        assert_eq!(outcome.secondary, 1);
        assert_eq!(fixture.paths.len(), 3);
        assert_eq!(fixture.nodes[top].outgoing.len(), 2);
        assert_eq!(fixture.nodes[bottom].outgoing.len(), 1);
        fixture.assert_no_crossings(&config);
    }

    #[test]
    fn sources_without_any_path_are_counted_as_dead_ends() {
        let config = PathConfig { branch_chance: 0.0, ..PathConfig::default() };
        let mut fixture = Fixture::new();
        let upper = fixture.node(0, 0.0, 100.0);
        let lower = fixture.node(0, 0.0, 500.0);
        let target = fixture.node(1, 200.0, 100.0);
        // Walls off the lower source from everything to its right.
        let wall_top = fixture.node(9, 100.0, 250.0);
        let wall_bottom = fixture.node(9, 100.0, 900.0);
        fixture.paths.insert_with_key(|id| PathDefinition {
            id,
            from: wall_top,
            to: wall_bottom,
            render_points: vec![Vec2::new(100.0, 250.0), Vec2::new(100.0, 900.0)],
            pixel_points: Vec::new(),
        });
        let mut next = vec![target];

        let outcome = fixture.connect(&config, 5, &[upper, lower], &mut next);

        assert_eq!(outcome.dead_ends, 1);
        assert!(fixture.nodes[lower].outgoing.is_empty());
        assert_eq!(fixture.nodes[target].incoming.len(), 1);
    }
}
