//! Hand-drawn path synthesis: tapered perpendicular wobble plus node repulsion.

use rand_chacha::rand_core::Rng;

use crate::config::PathConfig;

use super::geometry::{PixelPos, Vec2, ease_in_quad, rasterize_polyline, sine_taper};
use super::random::RollExt;

/// Sparse polyline from `from` to `to`; endpoints are kept exact.
pub(super) fn synthesize<R: Rng + ?Sized>(
    rng: &mut R,
    config: &PathConfig,
    from: Vec2,
    to: Vec2,
    repellers: &[Vec2],
) -> Vec<Vec2> {
    let delta = to - from;
    let distance = delta.length();
    if distance < config.segment_length || config.segment_length <= 0.0 {
        return vec![from, to];
    }

    let segments = (distance / config.segment_length).floor() as usize;
    let normal = delta.perpendicular().normalized();
    let mut points = Vec::with_capacity(segments + 1);
    points.push(from);
    for step in 1..segments {
        let t = step as f32 / segments as f32;
        let base = from + delta * t;
        let wobble = normal * (rng.signed_unit() * config.wiggle_amplitude * sine_taper(t));
        let push = repulsion(config, base, from, to, repellers);
        points.push(base + wobble + push);
    }
    points.push(to);
    points
}

/// Summed push away from every repeller within the radius, except the path's own endpoints.
fn repulsion(config: &PathConfig, point: Vec2, from: Vec2, to: Vec2, repellers: &[Vec2]) -> Vec2 {
    let radius = config.repulsion_radius;
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    let mut total = Vec2::ZERO;
    for &node in repellers {
        if node == from || node == to {
            continue;
        }
        let away = point - node;
        let distance = away.length();
        if distance >= radius {
            continue;
        }
        let strength = config.repulsion_strength * ease_in_quad(1.0 - distance / radius);
        let direction = if distance <= f32::EPSILON { Vec2::new(0.0, 1.0) } else { away.normalized() };
        total = total + direction * strength;
    }
    total
}

pub(super) fn rasterize(points: &[Vec2]) -> Vec<PixelPos> {
    rasterize_polyline(points)
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    #[test]
    fn short_distance_returns_straight_segment() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = PathConfig::default();
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(config.segment_length - 1.0, 0.0);
        assert_eq!(synthesize(&mut rng, &config, from, to, &[]), vec![from, to]);
    }

    #[test]
    fn long_path_keeps_exact_endpoints_and_bounded_wobble() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let config = PathConfig::default();
        let from = Vec2::new(0.0, 100.0);
        let to = Vec2::new(180.0, 100.0);
        let points = synthesize(&mut rng, &config, from, to, &[]);

        assert_eq!(points.first(), Some(&from));
        assert_eq!(points.last(), Some(&to));
        assert_eq!(points.len(), 8);
        for point in &points {
            assert!((point.y - 100.0).abs() <= config.wiggle_amplitude);
        }
    }

    #[test]
    fn nearby_node_pushes_the_path_away() {
        let config = PathConfig { wiggle_amplitude: 0.0, ..PathConfig::default() };
        let from = Vec2::new(0.0, 100.0);
        let to = Vec2::new(192.0, 100.0);
        let obstacle = Vec2::new(96.0, 110.0);

        let points = synthesize(&mut ChaCha8Rng::seed_from_u64(3), &config, from, to, &[obstacle]);
        let middle = points[points.len() / 2];
        assert!(middle.y < 100.0, "path should bend away from the obstacle, got {middle:?}");
    }

    #[test]
    fn endpoints_do_not_repel_their_own_path() {
        let config = PathConfig { wiggle_amplitude: 0.0, ..PathConfig::default() };
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(96.0, 0.0);
        let points = synthesize(&mut ChaCha8Rng::seed_from_u64(4), &config, from, to, &[from, to]);
        assert!(points.iter().all(|point| point.y.abs() < 1e-4));
    }

    #[test]
    fn rasterized_path_is_contiguous() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let config = PathConfig::default();
        let points = synthesize(&mut rng, &config, Vec2::new(10.0, 10.0), Vec2::new(190.0, 90.0), &[]);
        let pixels = rasterize(&points);
        assert_eq!(pixels.first(), Some(&PixelPos { x: 10, y: 10 }));
        assert_eq!(pixels.last(), Some(&PixelPos { x: 190, y: 90 }));
        for pair in pixels.windows(2) {
            assert!(pair[0].x.abs_diff(pair[1].x) <= 1 && pair[0].y.abs_diff(pair[1].y) <= 1);
        }
    }
}
