//! Map-space vectors, segment orientation and intersection tests, and line rasterization.

use std::f32::consts::PI;
use std::ops::{Add, Mul, Sub};

const COLLINEAR_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Left-hand perpendicular of the same length.
    pub fn perpendicular(self) -> Self {
        Self { x: -self.y, y: self.x }
    }

    pub fn normalized(self) -> Self {
        let length = self.length();
        if length <= f32::EPSILON { Self::ZERO } else { self * (1.0 / length) }
    }

    pub fn round(self) -> PixelPos {
        PixelPos { x: self.x.round() as i32, y: self.y.round() as i32 }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

pub fn orientation(p: Vec2, q: Vec2, r: Vec2) -> Orientation {
    let value = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if value.abs() <= COLLINEAR_EPSILON {
        Orientation::Collinear
    } else if value > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether `q` lies inside the bounding box of segment `p..r`; only meaningful for collinear points.
pub fn on_segment(p: Vec2, q: Vec2, r: Vec2) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Segment intersection; segments sharing an exact endpoint never count as crossing.
pub fn segments_intersect(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> bool {
    if p1 == p2 || p1 == q2 || q1 == p2 || q1 == q2 {
        return false;
    }

    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

/// Whether two polylines visually cross.
///
/// Polylines that start or end on the same anchor are allowed to touch near it:
/// any sub-segment with an endpoint within `exemption_radius` of a shared anchor
/// is skipped.
pub fn polylines_cross(a: &[Vec2], b: &[Vec2], exemption_radius: f32) -> bool {
    let shared_anchors = shared_anchors(a, b);
    let exemption_squared = exemption_radius * exemption_radius;
    let near_anchor = |start: Vec2, end: Vec2| {
        shared_anchors.iter().any(|&anchor| {
            start.distance_squared(anchor) <= exemption_squared
                || end.distance_squared(anchor) <= exemption_squared
        })
    };

    for a_segment in a.windows(2) {
        if near_anchor(a_segment[0], a_segment[1]) {
            continue;
        }
        for b_segment in b.windows(2) {
            if near_anchor(b_segment[0], b_segment[1]) {
                continue;
            }
            if segments_intersect(a_segment[0], a_segment[1], b_segment[0], b_segment[1]) {
                return true;
            }
        }
    }
    false
}

fn shared_anchors(a: &[Vec2], b: &[Vec2]) -> Vec<Vec2> {
    let mut anchors = Vec::new();
    let (Some(&a_first), Some(&a_last), Some(&b_first), Some(&b_last)) =
        (a.first(), a.last(), b.first(), b.last())
    else {
        return anchors;
    };
    for anchor in [a_first, a_last] {
        if (anchor == b_first || anchor == b_last) && !anchors.contains(&anchor) {
            anchors.push(anchor);
        }
    }
    anchors
}

/// Integer Bresenham line including both endpoints.
pub fn rasterize_line(start: PixelPos, end: PixelPos) -> Vec<PixelPos> {
    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    let step_x = if start.x < end.x { 1 } else { -1 };
    let step_y = if start.y < end.y { 1 } else { -1 };

    let mut points = Vec::with_capacity(dx.max(-dy) as usize + 1);
    let mut error = dx + dy;
    let mut current = start;
    loop {
        points.push(current);
        if current == end {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            current.x += step_x;
        }
        if doubled <= dx {
            error += dx;
            current.y += step_y;
        }
    }
    points
}

pub fn rasterize_polyline(points: &[Vec2]) -> Vec<PixelPos> {
    let mut pixels: Vec<PixelPos> = Vec::new();
    for segment in points.windows(2) {
        let line = rasterize_line(segment[0].round(), segment[1].round());
        let skip = usize::from(pixels.last() == line.first());
        pixels.extend(line.into_iter().skip(skip));
    }
    if pixels.is_empty()
        && let Some(&only) = points.first()
    {
        pixels.push(only.round());
    }
    pixels
}

pub fn ease_in_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Zero at both ends of `0..=1`, one at the midpoint.
pub fn sine_taper(t: f32) -> f32 {
    (t.clamp(0.0, 1.0) * PI).sin()
}
