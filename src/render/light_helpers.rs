use crate::scene::lighting::{LightId, PointLight};
use crate::scene::Rgb;
use glam::Vec3;

/// Marker size matching a point-light helper sphere of radius 0.2.
pub const MARKER_SIZE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMarker {
    pub light: LightId,
    pub position: Vec3,
    pub color: Rgb,
    pub size: f32,
}

pub fn markers_for(lights: &[PointLight]) -> Vec<LightMarker> {
    lights
        .iter()
        .map(|light| LightMarker {
            light: light.id,
            position: light.position,
            color: light.color,
            size: MARKER_SIZE,
        })
        .collect()
}

const OCTAHEDRON_POSITIONS: [[f32; 3]; 6] = [
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

const OCTAHEDRON_TRIANGLES: [[u16; 3]; 8] = [
    [0, 2, 4],
    [0, 4, 3],
    [0, 3, 5],
    [0, 5, 2],
    [1, 4, 2],
    [1, 3, 4],
    [1, 5, 3],
    [1, 2, 5],
];

/// Marker triangles in world space.
pub fn marker_triangles(marker: &LightMarker) -> impl Iterator<Item = [Vec3; 3]> + '_ {
    OCTAHEDRON_TRIANGLES.iter().map(move |&tri| {
        tri.map(|i| marker.position + Vec3::from_array(OCTAHEDRON_POSITIONS[i as usize]) * marker.size)
    })
}
