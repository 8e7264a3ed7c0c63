use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;
/// Half height of the orthographic frustum in world units.
pub const ORTHO_HALF_HEIGHT: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

/// The single camera of a viewport, mutated in place.
///
/// `fov_deg` only affects [`ProjectionKind::Perspective`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at: Vec3,
    pub fov_deg: f32,
    pub projection: ProjectionKind,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
            fov_deg: 45.0,
            projection: ProjectionKind::Perspective,
        }
    }
}

impl CameraState {
    pub fn forward(&self) -> Vec3 {
        let dir = self.look_at - self.position;
        if dir.length_squared() > 1e-12 {
            dir.normalize()
        } else {
            Vec3::NEG_Z
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.forward();
        let up = if forward.cross(Vec3::Y).length_squared() > 1e-8 {
            Vec3::Y
        } else {
            Vec3::Z
        };
        Mat4::look_to_rh(self.position, forward, up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        match self.projection {
            ProjectionKind::Perspective => {
                let fov = self.fov_deg.clamp(1.0, 179.0).to_radians();
                Mat4::perspective_rh(fov, aspect, NEAR_PLANE, FAR_PLANE)
            }
            ProjectionKind::Orthographic => {
                let h = ORTHO_HALF_HEIGHT;
                Mat4::orthographic_rh(-h * aspect, h * aspect, -h, h, NEAR_PLANE, FAR_PLANE)
            }
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Pointer-driven orbit around the camera's look-at target.
#[derive(Debug, Clone, Copy)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 0.05,
        }
    }
}

impl OrbitController {
    /// Orbits by a pointer delta in pixels, keeping the distance to the target.
    pub fn drag(&self, camera: &mut CameraState, dx: f32, dy: f32) {
        let offset = camera.position - camera.look_at;
        let distance = offset.length().max(self.min_distance);
        let (mut yaw, mut pitch) = offset_to_yaw_pitch(offset);
        yaw -= dx * self.rotate_speed;
        pitch += dy * self.rotate_speed;
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        pitch = pitch.clamp(-limit, limit);
        wrap_angle(&mut yaw);
        camera.position = camera.look_at + yaw_pitch_to_offset(yaw, pitch) * distance;
    }

    /// Moves toward (positive steps) or away from the target.
    pub fn dolly(&self, camera: &mut CameraState, steps: f32) {
        let offset = camera.position - camera.look_at;
        let distance = offset.length();
        if distance <= 1e-6 {
            return;
        }
        let factor = (1.0 - self.zoom_speed).powf(steps);
        let next = (distance * factor).max(self.min_distance);
        camera.position = camera.look_at + offset / distance * next;
    }
}

fn offset_to_yaw_pitch(offset: Vec3) -> (f32, f32) {
    let len = offset.length().max(1e-6);
    let n = offset / len;
    (n.x.atan2(n.z), n.y.clamp(-1.0, 1.0).asin())
}

fn yaw_pitch_to_offset(yaw: f32, pitch: f32) -> Vec3 {
    let cos_pitch = pitch.cos();
    Vec3::new(yaw.sin() * cos_pitch, pitch.sin(), yaw.cos() * cos_pitch)
}

fn wrap_angle(angle: &mut f32) {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if angle.is_finite() {
        *angle = (*angle + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_target_projects_to_center() {
        let camera = CameraState::default();
        let clip = camera.view_projection(16.0 / 9.0) * camera.look_at.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn degenerate_camera_stays_finite() {
        let camera = CameraState {
            position: Vec3::new(0.0, 5.0, 0.0),
            look_at: Vec3::ZERO,
            ..CameraState::default()
        };
        let m = camera.view_projection(1.0);
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));

        let same = CameraState {
            look_at: Vec3::ZERO,
            position: Vec3::ZERO,
            ..CameraState::default()
        };
        assert!(same.view_matrix().to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn orbit_drag_preserves_distance() {
        let mut camera = CameraState::default();
        OrbitController::default().drag(&mut camera, 120.0, -40.0);
        assert!((camera.position.length() - 5.0).abs() < 1e-4);
        assert!(camera.position.is_finite());
    }

    #[test]
    fn dolly_moves_toward_target() {
        let mut camera = CameraState::default();
        OrbitController::default().dolly(&mut camera, 1.0);
        assert!((camera.position.z - 4.5).abs() < 1e-4);
        OrbitController::default().dolly(&mut camera, -1.0);
        assert!((camera.position.z - 5.0).abs() < 1e-4);
    }
}
