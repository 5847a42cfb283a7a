//! Player progress through a generated split.

use slotmap::SecondaryMap;

use crate::error::SplitError;
use crate::mapgen::SplitMap;
use crate::types::{NodeId, PathId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeRuntimeState {
    /// Reachable in one move from the current node.
    pub reachable: bool,
    pub visited: bool,
    pub completed: bool,
}

/// Mutable per-run state kept beside an immutable [`SplitMap`].
#[derive(Clone, Debug)]
pub struct SplitProgress {
    current: NodeId,
    states: SecondaryMap<NodeId, NodeRuntimeState>,
}

impl SplitProgress {
    pub fn new(map: &SplitMap) -> Self {
        let mut states = SecondaryMap::new();
        for id in map.nodes.keys() {
            states.insert(id, NodeRuntimeState::default());
        }
        if let Some(origin) = states.get_mut(map.origin) {
            origin.visited = true;
        }
        let mut progress = Self { current: map.origin, states };
        progress.refresh_reachable(map);
        progress
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn state(&self, id: NodeId) -> Option<NodeRuntimeState> {
        self.states.get(id).copied()
    }

    pub fn reachable_nodes(&self) -> Vec<NodeId> {
        self.states.iter().filter(|(_, state)| state.reachable).map(|(id, _)| id).collect()
    }

    pub fn is_finished(&self, map: &SplitMap) -> bool {
        self.current == map.terminal
    }

    /// Completes the current node and follows `path` to its target.
    pub fn move_along(&mut self, map: &SplitMap, path: PathId) -> Result<NodeId, SplitError> {
        let Some(target) = map.path(path).filter(|edge| edge.from == self.current).map(|edge| edge.to)
        else {
            return Err(SplitError::NotConnected { from: self.current, path });
        };

        if let Some(state) = self.states.get_mut(self.current) {
            state.completed = true;
        }
        if let Some(state) = self.states.get_mut(target) {
            state.visited = true;
        }
        self.current = target;
        self.refresh_reachable(map);
        Ok(target)
    }

    fn refresh_reachable(&mut self, map: &SplitMap) {
        for state in self.states.values_mut() {
            state.reachable = false;
        }
        for target in map.outgoing_targets(self.current) {
            if let Some(state) = self.states.get_mut(target) {
                state.reachable = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;
    use crate::content::SplitCatalog;
    use crate::mapgen::SplitGenerator;

    fn sample_map() -> SplitMap {
        let catalog = SplitCatalog::build_default();
        let definition = catalog.find("greenwood").expect("default split");
        SplitGenerator::default()
            .generate(&mut ChaCha8Rng::seed_from_u64(31), definition, &catalog.archetypes)
            .expect("greenwood generates")
    }

    #[test]
    fn progress_starts_on_origin_with_its_targets_reachable() {
        let map = sample_map();
        let progress = SplitProgress::new(&map);

        assert_eq!(progress.current(), map.origin);
        let origin = progress.state(map.origin).expect("origin state");
        assert!(origin.visited && !origin.completed);

        let mut reachable = progress.reachable_nodes();
        let mut expected = map.outgoing_targets(map.origin);
        reachable.sort();
        expected.sort();
        assert_eq!(reachable, expected);
    }

    /// Follows incoming edges back from the terminal; every non-origin node has one.
    fn route_to_terminal(map: &SplitMap) -> Vec<PathId> {
        let mut route = Vec::new();
        let mut node = map.terminal;
        while node != map.origin {
            let path = map.nodes[node].incoming[0];
            route.push(path);
            node = map.paths[path].from;
        }
        route.reverse();
        route
    }

    #[test]
    fn walking_a_route_reaches_the_terminal() {
        let map = sample_map();
        let mut progress = SplitProgress::new(&map);
        let route = route_to_terminal(&map);
        assert_eq!(route.len(), map.column_count() - 1);

        for path in route {
            let previous = progress.current();
            let target = progress.move_along(&map, path).expect("path leaves current node");
            assert!(progress.state(previous).expect("state").completed);
            assert!(progress.state(target).expect("state").visited);
        }
        assert!(progress.is_finished(&map));
        assert!(progress.reachable_nodes().is_empty());
    }

    #[test]
    fn unrelated_path_is_rejected_without_changing_state() {
        let map = sample_map();
        let mut progress = SplitProgress::new(&map);
        let foreign = map
            .paths
            .values()
            .find(|path| path.from != map.origin)
            .map(|path| path.id)
            .expect("split has paths beyond the origin");

        let result = progress.move_along(&map, foreign);
        assert!(matches!(result, Err(SplitError::NotConnected { .. })));
        assert_eq!(progress.current(), map.origin);
        assert!(!progress.state(map.origin).expect("origin state").completed);
    }
}
