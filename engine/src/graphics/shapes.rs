//! Geometry shared by the physics side and the drawing side.

use std::f32::consts::TAU;

use super::{vec2, Vec2};
use crate::PIXELS_PER_METER;

/// physics meters (y up) to surface pixels (y down)
pub fn to_screen(point: Vec2, surface_height: f32) -> Vec2 {
    vec2(
        point.x * PIXELS_PER_METER,
        surface_height - point.y * PIXELS_PER_METER,
    )
}

/// vertices of a regular polygon centered on the origin, counterclockwise, first vertex on the +x axis
pub fn regular_polygon(sides: usize, radius: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let angle = TAU * i as f32 / sides as f32;
            vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// triangles fanning out from the first vertex. only correct for convex polygons, which is all a collider ever is
pub fn fan_triangles(points: &[Vec2]) -> impl Iterator<Item = [Vec2; 3]> + '_ {
    let first = points.first().copied().unwrap_or(Vec2::ZERO);
    points
        .windows(2)
        .skip(1)
        .map(move |pair| [first, pair[0], pair[1]])
}
