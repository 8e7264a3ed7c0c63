pub mod animation;
pub mod environment;
pub mod lighting;
pub mod serialization;
pub mod stage;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGB color with components in `0.0..=1.0`, exchanged as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);

    pub fn from_hex_u32(value: u32) -> Self {
        let r = ((value >> 16) & 0xFF) as f32 / 255.0;
        let g = ((value >> 8) & 0xFF) as f32 / 255.0;
        let b = (value & 0xFF) as f32 / 255.0;
        Self([r, g, b])
    }

    /// Parses `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        u32::from_str_radix(&expanded, 16).ok().map(Self::from_hex_u32)
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::from_array(self.0)
    }

    pub fn scaled(self, factor: f32) -> Vec3 {
        self.to_vec3() * factor
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Rgb::parse_hex(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{text}'")))
    }
}

/// Rotation from Euler degrees applied in X, then Y, then Z order.
pub fn rotation_from_degrees(rotation_deg: Vec3) -> Quat {
    Quat::from_rotation_x(rotation_deg.x.to_radians())
        * Quat::from_rotation_y(rotation_deg.y.to_radians())
        * Quat::from_rotation_z(rotation_deg.z.to_radians())
}

pub fn compose_transform_matrix(position: Vec3, rotation_deg: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation_from_degrees(rotation_deg), position)
}
