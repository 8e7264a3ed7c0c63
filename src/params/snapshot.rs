use super::{ParamValue, ParameterError, ParameterId};
use crate::render::{CameraState, ProjectionKind};
use crate::scene::lighting::{LightId, PointLight};
use crate::scene::serialization::{
    AmbientDoc, CameraDoc, EnvSettingsDoc, ExportedConfig, ExportedModelProperties, LightDoc,
    LightingSettingsDoc, SessionConfig,
};
use crate::scene::Rgb;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
}

impl LightParams {
    fn factory(id: LightId) -> Self {
        let light = PointLight::default_for(id);
        Self {
            color: light.color,
            intensity: light.intensity,
            position: light.position,
        }
    }
}

/// Complete set of live parameter values; the single source of truth for the rigs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub camera_position: Vec3,
    pub look_at: Vec3,
    pub fov_deg: f32,
    pub projection: ProjectionKind,
    pub rotation_deg: Vec3,
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub lights: [LightParams; 3],
    pub env_blur: f32,
    pub env_intensity: f32,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self::factory_defaults()
    }
}

impl ParameterSnapshot {
    /// Values restored by "reset to defaults".
    pub fn factory_defaults() -> Self {
        Self {
            camera_position: Vec3::new(0.0, 0.0, 30.0),
            look_at: Vec3::ZERO,
            fov_deg: 75.0,
            projection: ProjectionKind::Perspective,
            rotation_deg: Vec3::ZERO,
            ambient_color: Rgb::WHITE,
            ambient_intensity: 1.0,
            lights: LightId::ALL.map(LightParams::factory),
            env_blur: 0.0,
            env_intensity: 1.0,
        }
    }

    /// Initial values of a session: configured camera and rotation, factory lighting.
    pub fn from_config(config: &SessionConfig) -> Self {
        let camera = config.initial_camera();
        Self {
            rotation_deg: config.model_rotation(),
            ..Self::factory_defaults()
        }
        .with_camera(&camera)
    }

    pub fn with_camera(mut self, camera: &CameraState) -> Self {
        self.camera_position = camera.position;
        self.look_at = camera.look_at;
        self.fov_deg = camera.fov_deg;
        self.projection = camera.projection;
        self
    }

    pub fn camera(&self) -> CameraState {
        CameraState {
            position: self.camera_position,
            look_at: self.look_at,
            fov_deg: self.fov_deg,
            projection: self.projection,
        }
    }

    pub fn light(&self, id: LightId) -> &LightParams {
        &self.lights[id.slot()]
    }

    pub fn get(&self, id: ParameterId) -> ParamValue {
        use ParamValue::{Color, Number};
        match id {
            ParameterId::CameraPosition(axis) => Number(self.camera_position[axis.index()]),
            ParameterId::LookAt(axis) => Number(self.look_at[axis.index()]),
            ParameterId::FieldOfView => Number(self.fov_deg),
            ParameterId::Rotation(axis) => Number(self.rotation_deg[axis.index()]),
            ParameterId::AmbientColor => Color(self.ambient_color),
            ParameterId::AmbientIntensity => Number(self.ambient_intensity),
            ParameterId::LightColor(light) => Color(self.light(light).color),
            ParameterId::LightIntensity(light) => Number(self.light(light).intensity),
            ParameterId::LightPosition(light, axis) => {
                Number(self.light(light).position[axis.index()])
            }
            ParameterId::EnvBlur => Number(self.env_blur),
            ParameterId::EnvIntensity => Number(self.env_intensity),
        }
    }

    /// Stores one value. Nothing changes when the value is rejected.
    pub fn set(&mut self, id: ParameterId, value: ParamValue) -> Result<(), ParameterError> {
        match (id.is_color(), value) {
            (true, ParamValue::Color(color)) => {
                match id {
                    ParameterId::AmbientColor => self.ambient_color = color,
                    ParameterId::LightColor(light) => self.lights[light.slot()].color = color,
                    _ => {}
                }
                Ok(())
            }
            (true, ParamValue::Number(_)) => Err(ParameterError::WrongKind {
                id: id.key(),
                expected: "color",
            }),
            (false, ParamValue::Color(_)) => Err(ParameterError::WrongKind {
                id: id.key(),
                expected: "number",
            }),
            (false, ParamValue::Number(n)) if !n.is_finite() => {
                Err(ParameterError::NotFinite { id: id.key() })
            }
            (false, ParamValue::Number(n)) => {
                *self.number_slot(id) = n;
                Ok(())
            }
        }
    }

    fn number_slot(&mut self, id: ParameterId) -> &mut f32 {
        match id {
            ParameterId::CameraPosition(axis) => &mut self.camera_position[axis.index()],
            ParameterId::LookAt(axis) => &mut self.look_at[axis.index()],
            ParameterId::FieldOfView => &mut self.fov_deg,
            ParameterId::Rotation(axis) => &mut self.rotation_deg[axis.index()],
            ParameterId::LightIntensity(light) => &mut self.lights[light.slot()].intensity,
            ParameterId::LightPosition(light, axis) => {
                &mut self.lights[light.slot()].position[axis.index()]
            }
            ParameterId::EnvBlur => &mut self.env_blur,
            ParameterId::EnvIntensity => &mut self.env_intensity,
            // Colors never reach here; `set` dispatches them separately.
            ParameterId::AmbientIntensity | ParameterId::AmbientColor | ParameterId::LightColor(_) => {
                &mut self.ambient_intensity
            }
        }
    }

    /// First parameter holding a non-finite number, if any.
    pub fn first_invalid(&self) -> Option<ParameterId> {
        ParameterId::all().into_iter().find(|id| match self.get(*id) {
            ParamValue::Number(n) => !n.is_finite(),
            ParamValue::Color(_) => false,
        })
    }

    pub fn to_exported(&self) -> ExportedConfig {
        ExportedConfig {
            model_properties: ExportedModelProperties {
                rotate: self.rotation_deg.into(),
                camera: CameraDoc::from_state(&self.camera()),
            },
            env_settings: EnvSettingsDoc {
                blur: self.env_blur,
                intensity: self.env_intensity,
            },
            lighting_settings: LightingSettingsDoc {
                ambient: AmbientDoc {
                    color: self.ambient_color,
                    intensity: self.ambient_intensity,
                },
                lights: LightId::ALL
                    .iter()
                    .map(|&id| {
                        let light = self.light(id);
                        LightDoc {
                            name: id.as_str().to_string(),
                            color: light.color,
                            intensity: light.intensity,
                            position: light.position.into(),
                        }
                    })
                    .collect(),
            },
        }
    }

    /// Reads an exported document. Lights missing from it keep factory values.
    pub fn from_exported(config: &ExportedConfig) -> Result<Self, ParameterError> {
        let mut snapshot = Self::factory_defaults()
            .with_camera(&config.model_properties.camera.to_state());
        snapshot.rotation_deg = config.model_properties.rotate.into();
        snapshot.env_blur = config.env_settings.blur;
        snapshot.env_intensity = config.env_settings.intensity;
        snapshot.ambient_color = config.lighting_settings.ambient.color;
        snapshot.ambient_intensity = config.lighting_settings.ambient.intensity;
        for doc in &config.lighting_settings.lights {
            match LightId::parse(&doc.name) {
                Some(id) => {
                    snapshot.lights[id.slot()] = LightParams {
                        color: doc.color,
                        intensity: doc.intensity,
                        position: doc.position.into(),
                    }
                }
                None => log::debug!("ignoring settings for unknown light '{}'", doc.name),
            }
        }
        match snapshot.first_invalid() {
            Some(id) => Err(ParameterError::NotFinite { id: id.key() }),
            None => Ok(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Axis;

    #[test]
    fn factory_defaults_match_reset_values() {
        let s = ParameterSnapshot::factory_defaults();
        assert_eq!(s.camera_position, Vec3::new(0.0, 0.0, 30.0));
        assert_eq!(s.fov_deg, 75.0);
        assert_eq!(s.light(LightId::Light2).position, Vec3::new(-3.796, 5.113, 5.763));
        assert_eq!(s.light(LightId::Light3).color.to_hex(), "#ddb9ff");
        assert_eq!((s.env_blur, s.env_intensity), (0.0, 1.0));
    }

    #[test]
    fn set_rejects_wrong_kind_and_non_finite() {
        let mut s = ParameterSnapshot::factory_defaults();
        let before = s;
        assert!(matches!(
            s.set(ParameterId::AmbientColor, ParamValue::Number(1.0)),
            Err(ParameterError::WrongKind { .. })
        ));
        assert!(matches!(
            s.set(ParameterId::FieldOfView, ParamValue::Number(f32::NAN)),
            Err(ParameterError::NotFinite { .. })
        ));
        assert_eq!(s, before);
        s.set(ParameterId::LightPosition(LightId::Light2, Axis::Y), ParamValue::Number(9.0))
            .unwrap();
        assert_eq!(s.light(LightId::Light2).position.y, 9.0);
    }

    #[test]
    fn exported_document_reads_back() {
        let mut s = ParameterSnapshot::factory_defaults();
        s.rotation_deg = Vec3::new(5.0, 10.0, 15.0);
        s.env_blur = 0.4;
        s.lights[0].color = Rgb::from_hex_u32(0x123456);
        let json = s.to_exported().to_json_pretty().unwrap();
        let doc = ExportedConfig::from_json_str(&json).unwrap();
        assert_eq!(ParameterSnapshot::from_exported(&doc).unwrap(), s);
    }

    #[test]
    fn non_finite_export_is_rejected() {
        let mut doc = ParameterSnapshot::factory_defaults().to_exported();
        doc.env_settings.intensity = f32::INFINITY;
        assert!(matches!(
            ParameterSnapshot::from_exported(&doc),
            Err(ParameterError::NotFinite { .. })
        ));
    }

    #[test]
    fn config_seeds_camera_and_rotation() {
        let config = SessionConfig::from_json_str(
            r#"{ "modelProperties": { "rotate": { "x": 0, "y": 45, "z": 0 } } }"#,
        )
        .unwrap();
        let s = ParameterSnapshot::from_config(&config);
        assert_eq!(s.rotation_deg, Vec3::new(0.0, 45.0, 0.0));
        assert_eq!(s.camera(), CameraState::default());
        assert_eq!(s.light(LightId::Light1).intensity, 15.0);
    }
}
