//! Noise-field seam used by scenery baking, with a Perlin-backed implementation.

use std::f32::consts::TAU;

use noise::{NoiseFn, Perlin};
use rand_chacha::rand_core::Rng;

use crate::config::SceneryConfig;

pub trait NoiseField {
    /// Sample at map-space coordinates; values lie roughly in `[-1, 1]`.
    fn sample(&self, x: f32, y: f32) -> f32;
}

pub struct PerlinField {
    perlin: Perlin,
    frequency: f64,
}

impl PerlinField {
    pub fn new(seed: u32, frequency: f32) -> Self {
        Self { perlin: Perlin::new(seed), frequency: f64::from(frequency) }
    }
}

impl NoiseField for PerlinField {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let point = [f64::from(x) * self.frequency, f64::from(y) * self.frequency];
        self.perlin.get(point) as f32
    }
}

/// Field returning the same value everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantField(pub f32);

impl NoiseField for ConstantField {
    fn sample(&self, _x: f32, _y: f32) -> f32 {
        self.0
    }
}

/// Samples `field` on a circle so the result wraps seamlessly at `TAU`.
pub fn radial_sample(field: &dyn NoiseField, angle: f32, radius: f32) -> f32 {
    let angle = angle.rem_euclid(TAU);
    field.sample(angle.cos() * radius, angle.sin() * radius)
}

pub struct SceneryNoise {
    pub placement: Box<dyn NoiseField>,
    pub radial: Box<dyn NoiseField>,
    pub clearing: Box<dyn NoiseField>,
}

impl SceneryNoise {
    pub fn perlin<R: Rng + ?Sized>(rng: &mut R, config: &SceneryConfig) -> Self {
        let placement_seed = rng.next_u32();
        let radial_seed = rng.next_u32();
        let clearing_seed = rng.next_u32();
        Self {
            placement: Box::new(PerlinField::new(placement_seed, config.placement_frequency)),
            // Frequency one: the circle radius alone sets how many bumps a clearing has.
            radial: Box::new(PerlinField::new(radial_seed, 1.0)),
            clearing: Box::new(PerlinField::new(clearing_seed, config.clearing_frequency)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perlin_field_is_deterministic_per_seed() {
        let a = PerlinField::new(7, 0.05);
        let b = PerlinField::new(7, 0.05);
        for step in 0..20 {
            let x = step as f32 * 13.7;
            let y = step as f32 * 5.3;
            assert_eq!(a.sample(x, y), b.sample(x, y));
            assert!(a.sample(x, y).abs() <= 1.5);
        }
    }

    #[test]
    fn radial_sample_wraps_around_full_turn() {
        let field = PerlinField::new(3, 1.0);
        let start = radial_sample(&field, 0.0, 1.6);
        let wrapped = radial_sample(&field, TAU, 1.6);
        assert!((start - wrapped).abs() < 1e-4);
    }
}
