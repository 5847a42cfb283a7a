//! In-memory content records for splits, plus a JSON loader and a built-in demo pack.

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::rand_core::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::mapgen::random::RollExt;

pub mod keys {
    pub const SLIME: &str = "slime";
    pub const BANDIT: &str = "bandit";
    pub const WOLF: &str = "wolf";
    pub const CULTIST: &str = "cultist";
    pub const KNIGHT: &str = "knight";
    pub const WRAITH: &str = "wraith";
    pub const OGRE: &str = "ogre";
    pub const FOREST_WARDEN: &str = "forest_warden";

    pub const EVENT_LOST_PILGRIM: &str = "event_lost_pilgrim";
    pub const EVENT_ABANDONED_CART: &str = "event_abandoned_cart";
    pub const EVENT_WHISPERING_WELL: &str = "event_whispering_well";
}

/// One fight: the archetype ids of every enemy in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub enemies: Vec<String>,
}

impl Encounter {
    pub fn new(enemies: &[&str]) -> Self {
        Self { enemies: enemies.iter().map(|&enemy| enemy.to_owned()).collect() }
    }

    pub fn power(&self, archetypes: &dyn ArchetypeLookup) -> u32 {
        self.enemies.iter().map(|enemy| archetypes.power_level(enemy).unwrap_or(0)).sum()
    }
}

/// Opaque narrative event id, resolved by the narration system at play time.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NarrativeId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: usize,
    pub max: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitTheme {
    pub foliage: [u8; 4],
    pub foliage_shade: [u8; 4],
    pub trunk: [u8; 4],
    pub shadow: [u8; 4],
}

impl Default for SplitTheme {
    fn default() -> Self {
        Self {
            foliage: [58, 122, 64, 255],
            foliage_shade: [38, 88, 52, 255],
            trunk: [92, 64, 40, 255],
            shadow: [0, 0, 0, 72],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitDefinition {
    pub name: String,
    pub columns: ColumnRange,
    #[serde(default)]
    pub battles: Vec<Encounter>,
    #[serde(default)]
    pub narrative_events: Vec<NarrativeId>,
    #[serde(default)]
    pub major_battles: Vec<Encounter>,
    #[serde(default)]
    pub theme: SplitTheme,
}

/// Power level per enemy archetype, used to bucket battles by difficulty.
pub trait ArchetypeLookup {
    fn power_level(&self, archetype: &str) -> Option<u32>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeTable {
    power_levels: BTreeMap<String, u32>,
}

impl ArchetypeTable {
    pub fn insert(&mut self, archetype: &str, power_level: u32) {
        self.power_levels.insert(archetype.to_owned(), power_level);
    }
}

impl ArchetypeLookup for ArchetypeTable {
    fn power_level(&self, archetype: &str) -> Option<u32> {
        self.power_levels.get(archetype).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitCatalog {
    #[serde(default)]
    pub splits: Vec<SplitDefinition>,
    #[serde(default)]
    pub archetypes: ArchetypeTable,
}

impl SplitCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ContentError> {
        let mut names = BTreeSet::new();
        for split in &self.splits {
            if !names.insert(split.name.as_str()) {
                return Err(ContentError::DuplicateSplit(split.name.clone()));
            }
            if split
                .battles
                .iter()
                .chain(&split.major_battles)
                .any(|encounter| encounter.enemies.is_empty())
            {
                return Err(ContentError::EmptyEncounter { name: split.name.clone() });
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&SplitDefinition> {
        self.splits.iter().find(|split| split.name == name)
    }

    /// Uniformly picks a split; `None` when the catalog is empty.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SplitDefinition> {
        if self.splits.is_empty() {
            return None;
        }
        self.splits.get(rng.below(self.splits.len()))
    }

    pub fn build_default() -> Self {
        let mut archetypes = ArchetypeTable::default();
        for (archetype, power_level) in [
            (keys::SLIME, 2),
            (keys::BANDIT, 4),
            (keys::WOLF, 3),
            (keys::CULTIST, 5),
            (keys::KNIGHT, 8),
            (keys::WRAITH, 7),
            (keys::OGRE, 11),
            (keys::FOREST_WARDEN, 20),
        ] {
            archetypes.insert(archetype, power_level);
        }

        let greenwood = SplitDefinition {
            name: "greenwood".to_owned(),
            columns: ColumnRange { min: 5, max: 7 },
            battles: vec![
                Encounter::new(&[keys::SLIME]),
                Encounter::new(&[keys::SLIME, keys::SLIME]),
                Encounter::new(&[keys::WOLF]),
                Encounter::new(&[keys::BANDIT, keys::SLIME]),
                Encounter::new(&[keys::WOLF, keys::WOLF]),
                Encounter::new(&[keys::CULTIST, keys::BANDIT]),
                Encounter::new(&[keys::KNIGHT]),
                Encounter::new(&[keys::WRAITH, keys::CULTIST]),
                Encounter::new(&[keys::OGRE, keys::WOLF]),
            ],
            narrative_events: vec![
                NarrativeId(keys::EVENT_LOST_PILGRIM.to_owned()),
                NarrativeId(keys::EVENT_ABANDONED_CART.to_owned()),
                NarrativeId(keys::EVENT_WHISPERING_WELL.to_owned()),
            ],
            major_battles: vec![
                Encounter::new(&[keys::FOREST_WARDEN]),
                Encounter::new(&[keys::OGRE, keys::OGRE]),
            ],
            theme: SplitTheme::default(),
        };

        let ashen_road = SplitDefinition {
            name: "ashen_road".to_owned(),
            columns: ColumnRange { min: 6, max: 8 },
            battles: vec![
                Encounter::new(&[keys::BANDIT]),
                Encounter::new(&[keys::CULTIST]),
                Encounter::new(&[keys::WRAITH]),
                Encounter::new(&[keys::KNIGHT, keys::BANDIT]),
            ],
            narrative_events: Vec::new(),
            major_battles: Vec::new(),
            theme: SplitTheme {
                foliage: [112, 98, 76, 255],
                foliage_shade: [84, 70, 58, 255],
                trunk: [60, 52, 48, 255],
                shadow: [0, 0, 0, 64],
            },
        };

        Self { splits: vec![greenwood, ashen_road], archetypes }
    }
}
