//! Per-column node counts and jittered slot positions.

use rand_chacha::rand_core::Rng;
use tracing::debug;

use crate::config::LayoutConfig;

use super::geometry::Vec2;
use super::random::RollExt;

pub(super) struct ColumnRequest {
    pub(super) floor: usize,
    pub(super) column_count: usize,
    pub(super) previous_count: usize,
    /// Average position of the previous column.
    pub(super) anchor: Vec2,
}

/// Node positions for one column, sorted top to bottom.
pub(super) fn place_column<R: Rng + ?Sized>(
    rng: &mut R,
    layout: &LayoutConfig,
    request: &ColumnRequest,
) -> Vec<Vec2> {
    let base_x = layout.column_x(request.floor);
    if request.floor == 0 || request.floor + 1 >= request.column_count {
        return vec![Vec2::new(base_x, layout.center_y())];
    }

    let wanted = draw_node_count(rng, layout, request.previous_count);
    let palette = slot_palette(layout, request.floor);
    let mut available = vec![true; palette.len()];
    let mut positions = Vec::with_capacity(wanted);

    for placed in 0..wanted {
        let slot = if placed == 0 {
            pick_entry_slot(rng, &palette, &available, request.anchor.y)
        } else {
            pick_any_slot(rng, &available)
        };
        let Some(slot) = slot else {
            debug!(floor = request.floor, wanted, placed, "slot palette exhausted");
            break;
        };
        for neighbour in slot.saturating_sub(1)..=(slot + 1).min(palette.len() - 1) {
            available[neighbour] = false;
        }
        let x = base_x + rng.signed_unit() * layout.jitter_x;
        positions.push(Vec2::new(x, palette[slot]));
    }

    positions.sort_by(|a, b| a.y.total_cmp(&b.y));
    positions
}

pub(super) fn draw_node_count<R: Rng + ?Sized>(
    rng: &mut R,
    layout: &LayoutConfig,
    previous_count: usize,
) -> usize {
    let min_nodes = layout.min_nodes.max(1);
    let max_nodes = layout.max_nodes.max(min_nodes);
    let mut count = rng.range_inclusive(min_nodes, max_nodes);
    if min_nodes == max_nodes {
        return count;
    }
    // Capped so a narrow range cannot spin forever on unlucky draws.
    for _ in 0..layout.max_count_rerolls {
        if count != previous_count {
            break;
        }
        count = rng.range_inclusive(min_nodes, max_nodes);
    }
    count
}

/// Row positions available to a column; odd columns sit half a row lower with one slot fewer.
pub(super) fn slot_palette(layout: &LayoutConfig, floor: usize) -> Vec<f32> {
    let staggered = floor % 2 == 1 && layout.row_slots > 1;
    let (count, offset) = if staggered {
        (layout.row_slots - 1, layout.row_spacing / 2.0)
    } else {
        (layout.row_slots.max(1), 0.0)
    };
    (0..count).map(|slot| layout.margin + offset + slot as f32 * layout.row_spacing).collect()
}

/// The first node of a column comes from the central band, near the previous column's average.
fn pick_entry_slot<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &[f32],
    available: &[bool],
    anchor_y: f32,
) -> Option<usize> {
    let band_start = palette.len() / 4;
    let band_end = palette.len() - 1 - palette.len() / 4;
    let nearest = palette
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - anchor_y).abs().total_cmp(&(*b - anchor_y).abs()))
        .map_or(band_start, |(slot, _)| slot)
        .clamp(band_start, band_end);

    let near_anchor: Vec<usize> = (nearest.saturating_sub(1)..=(nearest + 1).min(band_end))
        .filter(|&slot| slot >= band_start && available[slot])
        .collect();
    if near_anchor.is_empty() {
        return pick_any_slot(rng, available);
    }
    Some(near_anchor[rng.below(near_anchor.len())])
}

fn pick_any_slot<R: Rng + ?Sized>(rng: &mut R, available: &[bool]) -> Option<usize> {
    let open: Vec<usize> = (0..available.len()).filter(|&slot| available[slot]).collect();
    if open.is_empty() {
        return None;
    }
    Some(open[rng.below(open.len())])
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    fn request(floor: usize, previous_count: usize, layout: &LayoutConfig) -> ColumnRequest {
        ColumnRequest {
            floor,
            column_count: 6,
            previous_count,
            anchor: Vec2::new(layout.column_x(floor.saturating_sub(1)), layout.center_y()),
        }
    }

    #[test]
    fn origin_and_terminal_columns_hold_exactly_one_centered_node() {
        let layout = LayoutConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for floor in [0, 5] {
            let positions = place_column(&mut rng, &layout, &request(floor, 1, &layout));
            assert_eq!(positions, vec![Vec2::new(layout.column_x(floor), layout.center_y())]);
        }
    }

    #[test]
    fn intermediate_columns_respect_count_range_spacing_and_jitter() {
        let layout = LayoutConfig::default();
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let floor = 1 + (seed as usize % 4);
            let positions = place_column(&mut rng, &layout, &request(floor, 2, &layout));

            assert!(!positions.is_empty() && positions.len() <= layout.max_nodes);
            for position in &positions {
                assert!((position.x - layout.column_x(floor)).abs() <= layout.jitter_x);
            }
            for pair in positions.windows(2) {
                assert!(pair[1].y - pair[0].y >= layout.row_spacing * 2.0 - 1e-3);
            }
        }
    }

    #[test]
    fn node_count_rerolls_away_from_previous_count() {
        let layout = LayoutConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let differing = (0..100).filter(|_| draw_node_count(&mut rng, &layout, 2) != 2).count();
        assert!(differing >= 95, "only {differing} of 100 draws moved away from 2");
    }

    #[test]
    fn single_value_range_never_rerolls() {
        let layout = LayoutConfig { min_nodes: 2, max_nodes: 2, ..LayoutConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(draw_node_count(&mut rng, &layout, 2), 2);
    }

    #[test]
    fn exhausted_palette_places_fewer_nodes() {
        let layout =
            LayoutConfig { row_slots: 3, min_nodes: 3, max_nodes: 3, ..LayoutConfig::default() };
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let positions = place_column(&mut rng, &layout, &request(2, 1, &layout));
            assert!((1..3).contains(&positions.len()));
        }
    }

    #[test]
    fn first_node_stays_in_the_central_band() {
        let layout = LayoutConfig { min_nodes: 1, max_nodes: 1, ..LayoutConfig::default() };
        let palette = slot_palette(&layout, 2);
        let band = palette[palette.len() / 4]..=palette[palette.len() - 1 - palette.len() / 4];
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut column = request(2, 1, &layout);
            column.anchor.y = if seed % 2 == 0 { 0.0 } else { 10_000.0 };
            let positions = place_column(&mut rng, &layout, &column);
            assert_eq!(positions.len(), 1);
            assert!(band.contains(&positions[0].y));
        }
    }

    #[test]
    fn odd_columns_are_staggered() {
        let layout = LayoutConfig::default();
        let even = slot_palette(&layout, 2);
        let odd = slot_palette(&layout, 3);
        assert_eq!(odd.len(), even.len() - 1);
        assert!((odd[0] - even[0] - layout.row_spacing / 2.0).abs() < 1e-4);
    }
}
