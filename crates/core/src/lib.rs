pub mod config;
pub mod content;
pub mod error;
pub mod mapgen;
pub mod runtime;
pub mod types;

pub use config::GeneratorConfig;
pub use content::{ArchetypeLookup, ArchetypeTable, SplitCatalog, SplitDefinition};
pub use error::{ContentError, SplitError};
pub use mapgen::{SplitGenerator, SplitMap, generate_split};
pub use runtime::{NodeRuntimeState, SplitProgress};
pub use types::*;
