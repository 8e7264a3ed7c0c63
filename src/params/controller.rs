use super::{ParamFamily, ParamValue, ParameterError, ParameterId, ParameterSnapshot};
use crate::render::{CameraState, RenderBackend, ViewportRig};
use crate::scene::environment::EnvironmentRig;
use crate::scene::lighting::{LightId, LightingRig};
use crate::scene::serialization::ExportedConfig;
use crate::scene::stage::ModelStage;
use std::collections::VecDeque;

/// Mutable borrows of every rig a parameter can reach.
pub struct SceneTargets<'a> {
    pub viewport: &'a mut ViewportRig,
    pub stage: &'a mut ModelStage,
    pub lighting: &'a mut LightingRig,
    pub environment: &'a mut EnvironmentRig,
    pub backend: &'a mut dyn RenderBackend,
}

/// Routes parameter edits to the rig that owns them, one family at a time.
#[derive(Debug, Default)]
pub struct ParameterController {
    snapshot: ParameterSnapshot,
    pending: VecDeque<(String, String)>,
    display_refresh: bool,
}

impl ParameterController {
    pub fn new(snapshot: ParameterSnapshot) -> Self {
        Self {
            snapshot,
            pending: VecDeque::new(),
            display_refresh: true,
        }
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    /// Applies one edit. Returns `Ok(false)` for ids no rig owns.
    ///
    /// Invalid values are rejected before any rig sees them.
    pub fn apply(
        &mut self,
        targets: &mut SceneTargets<'_>,
        id: &str,
        value: ParamValue,
    ) -> Result<bool, ParameterError> {
        let Some(parsed) = ParameterId::parse(id) else {
            log::debug!("ignoring unknown parameter '{}'", id);
            return Ok(false);
        };
        self.snapshot.set(parsed, value)?;
        self.push(targets, parsed.family());
        Ok(true)
    }

    /// Replaces the whole snapshot and pushes camera, rotation, lighting, then environment.
    pub fn apply_all(
        &mut self,
        targets: &mut SceneTargets<'_>,
        snapshot: ParameterSnapshot,
        force_display_refresh: bool,
    ) -> Result<(), ParameterError> {
        if let Some(id) = snapshot.first_invalid() {
            return Err(ParameterError::NotFinite { id: id.key() });
        }
        self.snapshot = snapshot;
        self.push(targets, ParamFamily::Camera);
        self.push(targets, ParamFamily::Rotation);
        self.push(targets, ParamFamily::Ambient);
        for light in LightId::ALL {
            self.push(targets, ParamFamily::Light(light));
        }
        self.push(targets, ParamFamily::Environment);
        if force_display_refresh {
            self.display_refresh = true;
        }
        Ok(())
    }

    pub fn export_snapshot(&self) -> ExportedConfig {
        self.snapshot.to_exported()
    }

    /// Records a camera moved by direct interaction without re-pushing it.
    pub fn sync_camera(&mut self, camera: &CameraState) {
        self.snapshot = self.snapshot.with_camera(camera);
        self.display_refresh = true;
    }

    /// Queues raw control text for the next [`drain`](Self::drain).
    pub fn queue(&mut self, id: impl Into<String>, raw: impl Into<String>) {
        self.pending.push_back((id.into(), raw.into()));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies queued edits in order. A failing edit is logged and skipped.
    pub fn drain(&mut self, targets: &mut SceneTargets<'_>) -> usize {
        let mut applied = 0;
        while let Some((id, raw)) = self.pending.pop_front() {
            let result =
                ParamValue::from_input(&raw).and_then(|value| self.apply(targets, &id, value));
            match result {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(err) => log::warn!("rejected '{}' = '{}': {}", id, raw, err),
            }
        }
        applied
    }

    /// Whether displayed control values must be re-read; clears the flag.
    pub fn take_display_refresh(&mut self) -> bool {
        std::mem::take(&mut self.display_refresh)
    }

    fn push(&self, targets: &mut SceneTargets<'_>, family: ParamFamily) {
        let s = &self.snapshot;
        match family {
            ParamFamily::Camera => {
                targets.viewport.set_camera_position(s.camera_position);
                targets.viewport.set_look_at(s.look_at);
                targets.viewport.set_field_of_view(s.fov_deg);
                targets.viewport.set_projection(s.projection);
            }
            ParamFamily::Rotation => targets.stage.update_rotation(s.rotation_deg),
            ParamFamily::Ambient => targets.lighting.set_ambient(s.ambient_color, s.ambient_intensity),
            ParamFamily::Light(id) => {
                let light = s.light(id);
                targets
                    .lighting
                    .set_point_light(id, light.color, light.intensity, light.position);
            }
            ParamFamily::Environment => {
                if let Err(err) =
                    targets
                        .environment
                        .set_parameters(targets.backend, s.env_blur, s.env_intensity)
                {
                    log::warn!("environment update failed: {}", err);
                }
            }
        }
    }
}
