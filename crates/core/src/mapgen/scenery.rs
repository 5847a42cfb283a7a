//! Decorative tree placement and the one-time bake into an offscreen pixel buffer.

use rand_chacha::rand_core::Rng;
use tracing::debug;

use crate::config::SceneryConfig;
use crate::content::SplitTheme;

use super::geometry::{PixelPos, Vec2};
use super::noise_field::{SceneryNoise, radial_sample};
use super::random::RollExt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);

    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Porter-Duff "over" with `self` as the source.
    fn over(self, destination: Self) -> Self {
        let source_alpha = u32::from(self.alpha());
        if source_alpha == 255 {
            return self;
        }
        if source_alpha == 0 {
            return destination;
        }
        let destination_alpha = u32::from(destination.alpha()) * (255 - source_alpha) / 255;
        let out_alpha = source_alpha + destination_alpha;
        let mut out = [0_u8; 4];
        for channel in 0..3 {
            let mixed = u32::from(self.0[channel]) * source_alpha
                + u32::from(destination.0[channel]) * destination_alpha;
            out[channel] = (mixed / out_alpha) as u8;
        }
        out[3] = out_alpha as u8;
        Self(out)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![Rgba::TRANSPARENT; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|index| self.pixels[index])
    }

    pub fn is_transparent(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_none_or(|pixel| pixel.alpha() == 0)
    }

    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|pixel| pixel.alpha() > 0).count()
    }

    /// Composites `color` over the pixel at `(x, y)`; out-of-bounds writes are dropped.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color.over(self.pixels[index]);
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }
}

pub(super) struct BakeContext<'a> {
    pub(super) config: &'a SceneryConfig,
    pub(super) theme: &'a SplitTheme,
    pub(super) noise: &'a SceneryNoise,
    pub(super) width: usize,
    pub(super) height: usize,
    pub(super) node_positions: &'a [Vec2],
    pub(super) path_pixels: &'a [&'a [PixelPos]],
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TreePlacement {
    anchor: Vec2,
    canopy_radius: i32,
    flipped_shade: bool,
}

/// Returns the baked buffer and the number of trees drawn into it.
pub(super) fn bake<R: Rng + ?Sized>(
    rng: &mut R,
    context: &BakeContext<'_>,
) -> (PixelBuffer, usize) {
    let mut buffer = PixelBuffer::new(context.width, context.height);
    let stride = context.config.stride.max(1);
    let columns = context.width.div_ceil(stride);
    let rows = context.height.div_ceil(stride);

    let mut candidates = Vec::with_capacity(columns * rows);
    let jitter = stride as f32 / 3.0;
    for row in 0..rows {
        for column in 0..columns {
            let cell_center = Vec2::new(
                (column * stride) as f32 + stride as f32 / 2.0,
                (row * stride) as f32 + stride as f32 / 2.0,
            );
            let offset = Vec2::new(rng.signed_unit(), rng.signed_unit()) * jitter;
            candidates.push(cell_center + offset);
        }
    }

    let near_path = path_clearance_mask(
        &candidates,
        columns,
        rows,
        stride,
        context.path_pixels,
        context.config.path_clearance,
    );

    let mut placements = Vec::new();
    for (index, &anchor) in candidates.iter().enumerate() {
        if near_path[index] || !inside(anchor, context.width, context.height) {
            continue;
        }
        if context.noise.placement.sample(anchor.x, anchor.y) <= context.config.placement_threshold
        {
            continue;
        }
        if context.noise.clearing.sample(anchor.x, anchor.y) > context.config.clearing_threshold {
            continue;
        }
        if inside_node_clearing(anchor, context) {
            continue;
        }
        let canopy_radius = rng.range_inclusive(
            context.config.min_canopy_radius,
            context.config.max_canopy_radius.max(context.config.min_canopy_radius),
        ) as i32;
        placements.push(TreePlacement { anchor, canopy_radius, flipped_shade: rng.chance(0.5) });
    }

    placements.sort_by(|a, b| {
        a.anchor.y.total_cmp(&b.anchor.y).then(a.anchor.x.total_cmp(&b.anchor.x))
    });
    for placement in &placements {
        draw_tree(&mut buffer, placement, context.config.trunk_height as i32, context.theme);
    }

    debug!(
        candidates = candidates.len(),
        trees = placements.len(),
        "baked scenery layer {}x{}",
        context.width,
        context.height
    );
    (buffer, placements.len())
}

fn inside(point: Vec2, width: usize, height: usize) -> bool {
    point.x >= 0.0 && point.y >= 0.0 && point.x < width as f32 && point.y < height as f32
}

fn inside_node_clearing(anchor: Vec2, context: &BakeContext<'_>) -> bool {
    let base_radius = context.config.node_clearing_radius;
    let jaggedness = context.config.clearing_jaggedness;
    // The whole sprite, not just its anchor, has to stay outside the clearing.
    let reach = context.config.max_sprite_reach();
    let widest = base_radius * (1.0 + jaggedness) + reach;
    context.node_positions.iter().any(|&node| {
        let offset = anchor - node;
        let distance_squared = offset.length_squared();
        if distance_squared >= widest * widest {
            return false;
        }
        let angle = offset.y.atan2(offset.x);
        let bump = radial_sample(context.noise.radial.as_ref(), angle, context.config.radial_frequency)
            .clamp(-1.0, 1.0);
        let radius = base_radius * (1.0 + jaggedness * bump) + reach;
        distance_squared < radius * radius
    })
}

fn path_clearance_mask(
    candidates: &[Vec2],
    columns: usize,
    rows: usize,
    stride: usize,
    path_pixels: &[&[PixelPos]],
    clearance: f32,
) -> Vec<bool> {
    let mut blocked = vec![false; candidates.len()];
    if columns == 0 || rows == 0 {
        return blocked;
    }
    let clearance_squared = clearance * clearance;
    // Candidates sit within a third of a stride of their cell centre.
    let reach = clearance + stride as f32;
    let cell = stride as f32;
    for pixel in path_pixels.iter().flat_map(|pixels| pixels.iter()) {
        let point = Vec2::new(pixel.x as f32, pixel.y as f32);
        let first_column = ((point.x - reach) / cell).floor().max(0.0) as usize;
        let last_column = (((point.x + reach) / cell).ceil().max(0.0) as usize).min(columns - 1);
        let first_row = ((point.y - reach) / cell).floor().max(0.0) as usize;
        let last_row = (((point.y + reach) / cell).ceil().max(0.0) as usize).min(rows - 1);
        for row in first_row..=last_row {
            for column in first_column..=last_column {
                let index = row * columns + column;
                if !blocked[index] && candidates[index].distance_squared(point) < clearance_squared
                {
                    blocked[index] = true;
                }
            }
        }
    }
    blocked
}

fn draw_tree(buffer: &mut PixelBuffer, tree: &TreePlacement, trunk_height: i32, theme: &SplitTheme) {
    let base = tree.anchor.round();
    let radius = tree.canopy_radius;

    for dy in -1..=1 {
        for dx in -radius..=radius {
            if dx * dx * 4 + dy * dy * radius * radius <= radius * radius * 4 {
                buffer.blend(base.x + dx, base.y + dy, Rgba(theme.shadow));
            }
        }
    }

    for dy in 0..trunk_height {
        for dx in -1..=0 {
            buffer.blend(base.x + dx, base.y - dy, Rgba(theme.trunk));
        }
    }

    let center = PixelPos { x: base.x, y: base.y - trunk_height - radius };
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let lit_side = if tree.flipped_shade { -dx } else { dx };
            let color = if lit_side + dy > radius / 3 { theme.foliage_shade } else { theme.foliage };
            buffer.blend(center.x + dx, center.y + dy, Rgba(color));
        }
    }
}
