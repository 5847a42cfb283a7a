//! Procedural split generation split into coherent submodules.

pub mod geometry;
pub mod model;
pub mod noise_field;
pub mod scenery;

pub(crate) mod random;

mod connector;
mod events;
mod generator;
mod placement;
mod wiggle;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::content::{ArchetypeLookup, SplitDefinition};
use crate::error::SplitError;

pub use events::ContentTables;
pub use generator::SplitGenerator;
pub use model::{GenerationStats, NodeDefinition, PathDefinition, SplitMap, SplitSummary};
pub use noise_field::{ConstantField, NoiseField, PerlinField, SceneryNoise};
pub use scenery::{PixelBuffer, Rgba};

/// Generates a split with the default configuration from a plain seed.
pub fn generate_split(
    seed: u64,
    definition: &SplitDefinition,
    archetypes: &dyn ArchetypeLookup,
) -> Result<SplitMap, SplitError> {
    SplitGenerator::default().generate(&mut ChaCha8Rng::seed_from_u64(seed), definition, archetypes)
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::SplitGenerator;
    use crate::content::SplitCatalog;

    #[test]
    fn generate_split_matches_split_generator_output() {
        let catalog = SplitCatalog::build_default();
        let definition = catalog.find("ashen_road").expect("default split");
        let seed = 123_u64;

        let from_helper =
            super::generate_split(seed, definition, &catalog.archetypes).expect("helper");
        let from_generator = SplitGenerator::default()
            .generate(&mut ChaCha8Rng::seed_from_u64(seed), definition, &catalog.archetypes)
            .expect("generator");

        assert_eq!(from_helper.canonical_bytes(), from_generator.canonical_bytes());
        assert_eq!(from_helper.scenery, from_generator.scenery);
    }
}
