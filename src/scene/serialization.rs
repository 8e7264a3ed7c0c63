use crate::render::{CameraState, ProjectionKind};
use crate::scene::Rgb;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Vector exchanged as `{ "x": .., "y": .., "z": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3Doc {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Doc {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Doc> for Vec3 {
    fn from(v: Vec3Doc) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveDoc {
    pub field_of_view: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDoc {
    #[serde(rename = "type", default)]
    pub kind: ProjectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<PerspectiveDoc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDoc {
    pub position: Vec3Doc,
    pub look_at: Vec3Doc,
    pub projection: ProjectionDoc,
}

impl CameraDoc {
    pub fn from_state(camera: &CameraState) -> Self {
        Self {
            position: camera.position.into(),
            look_at: camera.look_at.into(),
            projection: ProjectionDoc {
                kind: camera.projection,
                perspective: Some(PerspectiveDoc {
                    field_of_view: camera.fov_deg,
                }),
            },
        }
    }

    /// Missing field of view falls back to the default camera's.
    pub fn to_state(&self) -> CameraState {
        CameraState {
            position: self.position.into(),
            look_at: self.look_at.into(),
            fov_deg: self
                .projection
                .perspective
                .map(|p| p.field_of_view)
                .unwrap_or(CameraState::default().fov_deg),
            projection: self.projection.kind,
        }
    }
}

impl Default for CameraDoc {
    fn default() -> Self {
        Self::from_state(&CameraState::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionDoc {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPropertiesDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3Doc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<Vec3Doc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraDoc>,
}

/// Options consumed once when a viewer session is constructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Host container label; only recorded, the host owns the actual surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionDoc>,
    pub model_properties: ModelPropertiesDoc,
    pub is_interactable: bool,
    pub is_animatable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Configured camera. A camera holding non-finite numbers is replaced by the default.
    pub fn initial_camera(&self) -> CameraState {
        let Some(camera) = self.model_properties.camera.map(|camera| camera.to_state()) else {
            return CameraState::default();
        };
        if camera.position.is_finite() && camera.look_at.is_finite() && camera.fov_deg.is_finite() {
            camera
        } else {
            log::warn!("ignoring non-finite configured camera {:?}", camera);
            CameraState::default()
        }
    }

    pub fn model_scale(&self) -> Vec3 {
        finite_or(self.model_properties.scale, Vec3::ONE, "scale")
    }

    pub fn model_rotation(&self) -> Vec3 {
        finite_or(self.model_properties.rotate, Vec3::ZERO, "rotate")
    }
}

fn finite_or(doc: Option<Vec3Doc>, fallback: Vec3, what: &str) -> Vec3 {
    match doc.map(Vec3::from) {
        Some(value) if value.is_finite() => value,
        Some(value) => {
            log::warn!("ignoring non-finite configured {} {:?}", what, value);
            fallback
        }
        None => fallback,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedModelProperties {
    pub rotate: Vec3Doc,
    pub camera: CameraDoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvSettingsDoc {
    pub blur: f32,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientDoc {
    pub color: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDoc {
    pub name: String,
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3Doc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingSettingsDoc {
    pub ambient: AmbientDoc,
    pub lights: Vec<LightDoc>,
}

/// The "copy settings" document: every live parameter in structured form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedConfig {
    pub model_properties: ExportedModelProperties,
    pub env_settings: EnvSettingsDoc,
    pub lighting_settings: LightingSettingsDoc,
}

impl ExportedConfig {
    /// Pretty JSON indented by four spaces.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub fn save_exported_config_to_file(config: &ExportedConfig, path: &Path) -> Result<()> {
    std::fs::write(path, config.to_json_pretty()?)?;
    Ok(())
}

pub fn load_exported_config_from_file(path: &Path) -> Result<ExportedConfig> {
    let json = std::fs::read_to_string(path)?;
    ExportedConfig::from_json_str(&json)
}

pub fn save_session_config_to_file(config: &SessionConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_session_config_from_file(path: &Path) -> Result<SessionConfig> {
    let json = std::fs::read_to_string(path)?;
    SessionConfig::from_json_str(&json)
}
