use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::content::{Encounter, NarrativeId};

new_key_type! {
    pub struct NodeId;
    pub struct PathId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }
}

/// Fieldless tag of a [`NodeKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Origin,
    Battle,
    Narrative,
    Reward,
    Rest,
    Omen,
    MajorBattle,
}

/// Node content; each variant carries exactly the payload its type needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Origin,
    Battle { difficulty: Difficulty, encounter: Encounter },
    Narrative { event: NarrativeId },
    Reward,
    Rest,
    Omen,
    MajorBattle { encounter: Encounter },
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Origin => NodeType::Origin,
            NodeKind::Battle { .. } => NodeType::Battle,
            NodeKind::Narrative { .. } => NodeType::Narrative,
            NodeKind::Reward => NodeType::Reward,
            NodeKind::Rest => NodeType::Rest,
            NodeKind::Omen => NodeType::Omen,
            NodeKind::MajorBattle { .. } => NodeType::MajorBattle,
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match self {
            NodeKind::Battle { difficulty, .. } => Some(*difficulty),
            _ => None,
        }
    }

    pub fn encounter(&self) -> Option<&Encounter> {
        match self {
            NodeKind::Battle { encounter, .. } | NodeKind::MajorBattle { encounter } => {
                Some(encounter)
            }
            _ => None,
        }
    }
}
