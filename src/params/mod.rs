//! Named live parameters and their routing to the scene rigs.

mod controller;
mod snapshot;

pub use controller::{ParameterController, SceneTargets};
pub use snapshot::{LightParams, ParameterSnapshot};

use crate::scene::lighting::LightId;
use crate::scene::Rgb;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("value for '{id}' is not finite")]
    NotFinite { id: String },
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("parameter '{id}' expects a {expected}")]
    WrongKind { id: String, expected: &'static str },
}

/// A parsed control value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Color(Rgb),
}

impl ParamValue {
    /// Parses raw control text: `#rrggbb` colors or finite decimal numbers.
    pub fn from_input(text: &str) -> Result<Self, ParameterError> {
        let trimmed = text.trim();
        if trimmed.starts_with('#') {
            return Rgb::parse_hex(trimmed)
                .map(ParamValue::Color)
                .ok_or_else(|| ParameterError::InvalidColor(trimmed.to_string()));
        }
        let value: f32 = trimmed
            .parse()
            .map_err(|_| ParameterError::InvalidNumber(trimmed.to_string()))?;
        if !value.is_finite() {
            return Err(ParameterError::InvalidNumber(trimmed.to_string()));
        }
        Ok(ParamValue::Number(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn suffix(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    fn parse(suffix: &str) -> Option<Self> {
        Axis::ALL.into_iter().find(|axis| axis.suffix() == suffix)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Identity of one live control, e.g. `camX`, `light2Intensity` or `envBlur`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    CameraPosition(Axis),
    LookAt(Axis),
    FieldOfView,
    Rotation(Axis),
    AmbientColor,
    AmbientIntensity,
    LightColor(LightId),
    LightIntensity(LightId),
    LightPosition(LightId, Axis),
    EnvBlur,
    EnvIntensity,
}

/// Rig that owns a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamFamily {
    Camera,
    Rotation,
    Ambient,
    Light(LightId),
    Environment,
}

impl ParameterId {
    /// Every control, in the order they are applied by a full refresh.
    pub fn all() -> Vec<ParameterId> {
        let mut ids = Vec::new();
        ids.extend(Axis::ALL.map(ParameterId::CameraPosition));
        ids.extend(Axis::ALL.map(ParameterId::LookAt));
        ids.push(ParameterId::FieldOfView);
        ids.extend(Axis::ALL.map(ParameterId::Rotation));
        ids.push(ParameterId::AmbientColor);
        ids.push(ParameterId::AmbientIntensity);
        for light in LightId::ALL {
            ids.push(ParameterId::LightColor(light));
            ids.push(ParameterId::LightIntensity(light));
            ids.extend(Axis::ALL.map(|axis| ParameterId::LightPosition(light, axis)));
        }
        ids.push(ParameterId::EnvBlur);
        ids.push(ParameterId::EnvIntensity);
        ids
    }

    /// Resolves a control key by its family prefix. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        if key == "fov" {
            return Some(ParameterId::FieldOfView);
        }
        if let Some(rest) = key.strip_prefix("cam") {
            return Axis::parse(rest).map(ParameterId::CameraPosition);
        }
        if let Some(rest) = key.strip_prefix("look") {
            return Axis::parse(rest).map(ParameterId::LookAt);
        }
        if let Some(rest) = key.strip_prefix("rot") {
            return Axis::parse(rest).map(ParameterId::Rotation);
        }
        if let Some(rest) = key.strip_prefix("ambient") {
            return match rest {
                "Color" => Some(ParameterId::AmbientColor),
                "Intensity" => Some(ParameterId::AmbientIntensity),
                _ => None,
            };
        }
        if let Some(rest) = key.strip_prefix("env") {
            return match rest {
                "Blur" => Some(ParameterId::EnvBlur),
                "Intensity" => Some(ParameterId::EnvIntensity),
                _ => None,
            };
        }
        let light = LightId::ALL
            .into_iter()
            .find(|light| key.starts_with(light.as_str()))?;
        match &key[light.as_str().len()..] {
            "Color" => Some(ParameterId::LightColor(light)),
            "Intensity" => Some(ParameterId::LightIntensity(light)),
            rest => Axis::parse(rest).map(|axis| ParameterId::LightPosition(light, axis)),
        }
    }

    pub fn key(self) -> String {
        match self {
            ParameterId::CameraPosition(axis) => format!("cam{}", axis.suffix()),
            ParameterId::LookAt(axis) => format!("look{}", axis.suffix()),
            ParameterId::FieldOfView => "fov".to_string(),
            ParameterId::Rotation(axis) => format!("rot{}", axis.suffix()),
            ParameterId::AmbientColor => "ambientColor".to_string(),
            ParameterId::AmbientIntensity => "ambientIntensity".to_string(),
            ParameterId::LightColor(light) => format!("{light}Color"),
            ParameterId::LightIntensity(light) => format!("{light}Intensity"),
            ParameterId::LightPosition(light, axis) => format!("{light}{}", axis.suffix()),
            ParameterId::EnvBlur => "envBlur".to_string(),
            ParameterId::EnvIntensity => "envIntensity".to_string(),
        }
    }

    pub fn family(self) -> ParamFamily {
        match self {
            ParameterId::CameraPosition(_) | ParameterId::LookAt(_) | ParameterId::FieldOfView => {
                ParamFamily::Camera
            }
            ParameterId::Rotation(_) => ParamFamily::Rotation,
            ParameterId::AmbientColor | ParameterId::AmbientIntensity => ParamFamily::Ambient,
            ParameterId::LightColor(light)
            | ParameterId::LightIntensity(light)
            | ParameterId::LightPosition(light, _) => ParamFamily::Light(light),
            ParameterId::EnvBlur | ParameterId::EnvIntensity => ParamFamily::Environment,
        }
    }

    pub fn is_color(self) -> bool {
        matches!(self, ParameterId::AmbientColor | ParameterId::LightColor(_))
    }
}

impl std::fmt::Display for ParameterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_roundtrip_through_parse() {
        let ids = ParameterId::all();
        assert_eq!(ids.len(), 29);
        for id in ids {
            assert_eq!(ParameterId::parse(&id.key()), Some(id), "{}", id);
        }
    }

    #[test]
    fn families_follow_key_prefixes() {
        assert_eq!(ParameterId::parse("camZ").map(ParameterId::family), Some(ParamFamily::Camera));
        assert_eq!(ParameterId::parse("lookY").map(ParameterId::family), Some(ParamFamily::Camera));
        assert_eq!(ParameterId::parse("rotX").map(ParameterId::family), Some(ParamFamily::Rotation));
        assert_eq!(
            ParameterId::parse("light3Y").map(ParameterId::family),
            Some(ParamFamily::Light(LightId::Light3))
        );
        assert_eq!(
            ParameterId::parse("envIntensity").map(ParameterId::family),
            Some(ParamFamily::Environment)
        );
    }

    #[test]
    fn unknown_keys_do_not_route() {
        for key in ["light4Color", "camW", "envExposure", "", "background", "light1"] {
            assert_eq!(ParameterId::parse(key), None, "{key}");
        }
    }

    #[test]
    fn input_parsing_rejects_non_numbers() {
        assert_eq!(ParamValue::from_input(" 2.5 "), Ok(ParamValue::Number(2.5)));
        assert_eq!(
            ParamValue::from_input("#ffffff"),
            Ok(ParamValue::Color(Rgb::WHITE))
        );
        assert!(matches!(ParamValue::from_input("abc"), Err(ParameterError::InvalidNumber(_))));
        assert!(matches!(ParamValue::from_input("NaN"), Err(ParameterError::InvalidNumber(_))));
        assert!(matches!(ParamValue::from_input("inf"), Err(ParameterError::InvalidNumber(_))));
        assert!(matches!(ParamValue::from_input("#zzz"), Err(ParameterError::InvalidColor(_))));
    }
}
