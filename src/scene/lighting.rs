use crate::render::light_helpers::{markers_for, LightMarker};
use crate::scene::Rgb;
use glam::Vec3;

/// Stable identity of one of the three point lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightId {
    Light1,
    Light2,
    Light3,
}

impl LightId {
    pub const ALL: [LightId; 3] = [LightId::Light1, LightId::Light2, LightId::Light3];

    pub fn as_str(self) -> &'static str {
        match self {
            LightId::Light1 => "light1",
            LightId::Light2 => "light2",
            LightId::Light3 => "light3",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        LightId::ALL.into_iter().find(|id| id.as_str() == name)
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            LightId::Light1 => 0,
            LightId::Light2 => 1,
            LightId::Light3 => 2,
        }
    }
}

impl std::fmt::Display for LightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Rgb,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub id: LightId,
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
}

impl PointLight {
    /// Documented defaults: warm key, cool fill, purple accent.
    pub fn default_for(id: LightId) -> Self {
        let (color, position) = match id {
            LightId::Light1 => (0xffbf7f, Vec3::new(2.3, 2.7, 1.634)),
            LightId::Light2 => (0x6699f2, Vec3::new(-3.796, 5.113, 5.763)),
            LightId::Light3 => (0xddb9ff, Vec3::new(-3.774, 5.806, -3.477)),
        };
        Self {
            id,
            color: Rgb::from_hex_u32(color),
            intensity: 15.0,
            position,
        }
    }
}

/// One ambient light plus exactly three point lights; the topology never changes.
#[derive(Debug, Clone)]
pub struct LightingRig {
    ambient: AmbientLight,
    points: [PointLight; 3],
    debug_visible: bool,
}

impl Default for LightingRig {
    fn default() -> Self {
        Self::new()
    }
}

impl LightingRig {
    pub fn new() -> Self {
        Self {
            ambient: AmbientLight::default(),
            points: LightId::ALL.map(PointLight::default_for),
            debug_visible: false,
        }
    }

    pub fn ambient(&self) -> AmbientLight {
        self.ambient
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.points
    }

    pub fn light(&self, id: LightId) -> &PointLight {
        &self.points[id.slot()]
    }

    pub fn set_ambient(&mut self, color: Rgb, intensity: f32) {
        self.ambient = AmbientLight { color, intensity };
    }

    /// Updates a light by its string key. Unknown keys are ignored.
    pub fn set_light(&mut self, id: &str, color: Rgb, intensity: f32, position: Vec3) {
        match LightId::parse(id) {
            Some(id) => self.set_point_light(id, color, intensity, position),
            None => log::debug!("ignoring update for unknown light '{}'", id),
        }
    }

    pub fn set_point_light(&mut self, id: LightId, color: Rgb, intensity: f32, position: Vec3) {
        self.points[id.slot()] = PointLight {
            id,
            color,
            intensity,
            position,
        };
    }

    pub fn set_debug_visible(&mut self, visible: bool) {
        self.debug_visible = visible;
    }

    pub fn debug_visible(&self) -> bool {
        self.debug_visible
    }

    /// Debug markers for all three lights, or none when hidden.
    pub fn markers(&self) -> Vec<LightMarker> {
        if self.debug_visible {
            markers_for(&self.points)
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_rig() {
        let rig = LightingRig::new();
        assert_eq!(rig.ambient(), AmbientLight::default());
        assert_eq!(rig.point_lights().len(), 3);
        let key = rig.light(LightId::Light1);
        assert_eq!(key.color.to_hex(), "#ffbf7f");
        assert_eq!(key.intensity, 15.0);
        assert_eq!(key.position, Vec3::new(2.3, 2.7, 1.634));
        assert_eq!(rig.light(LightId::Light2).color.to_hex(), "#6699f2");
        assert_eq!(rig.light(LightId::Light3).color.to_hex(), "#ddb9ff");
    }

    #[test]
    fn set_light_updates_only_the_named_light() {
        let mut rig = LightingRig::new();
        rig.set_light("light2", Rgb::WHITE, 3.0, Vec3::ONE);
        assert_eq!(rig.light(LightId::Light2).intensity, 3.0);
        assert_eq!(rig.light(LightId::Light2).position, Vec3::ONE);
        assert_eq!(rig.light(LightId::Light1), &PointLight::default_for(LightId::Light1));
        assert_eq!(rig.light(LightId::Light3), &PointLight::default_for(LightId::Light3));
    }

    #[test]
    fn unknown_light_id_is_a_no_op() {
        let mut rig = LightingRig::new();
        let before = rig.point_lights().to_vec();
        rig.set_light("light4", Rgb::WHITE, 99.0, Vec3::ZERO);
        rig.set_light("", Rgb::WHITE, 99.0, Vec3::ZERO);
        assert_eq!(rig.point_lights(), before.as_slice());
    }

    #[test]
    fn debug_markers_toggle_uniformly() {
        let mut rig = LightingRig::new();
        assert!(rig.markers().is_empty());
        rig.set_debug_visible(true);
        assert_eq!(rig.markers().len(), 3);
        rig.set_debug_visible(false);
        assert!(rig.markers().is_empty());
    }
}
