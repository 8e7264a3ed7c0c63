use super::{CameraState, FrameScene, OrbitController, ProjectionKind, RenderBackend, RenderError, Viewport};
use glam::Vec3;

/// Edge length of still captures, independent of the viewport size.
pub const CAPTURE_SIZE: u32 = 1080;

/// Render surface plus the camera that looks through it.
#[derive(Debug, Clone)]
pub struct ViewportRig {
    size: Viewport,
    camera: CameraState,
    helpers_visible: bool,
    orbit: Option<OrbitController>,
}

impl ViewportRig {
    pub fn new(width: u32, height: u32, camera: CameraState, interactable: bool) -> Self {
        Self {
            size: Viewport {
                width: width.max(1),
                height: height.max(1),
            },
            camera,
            helpers_visible: false,
            orbit: interactable.then(OrbitController::default),
        }
    }

    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn aspect(&self) -> f32 {
        self.size.aspect()
    }

    /// Follows the container size; zero-sized containers are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if self.size.width != width || self.size.height != height {
            log::debug!("viewport resized to {}x{}", width, height);
            self.size = Viewport { width, height };
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera.position = position;
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        self.camera.look_at = target;
    }

    pub fn set_field_of_view(&mut self, fov_deg: f32) {
        if self.camera.projection == ProjectionKind::Orthographic {
            log::debug!("field of view {} stored but unused by orthographic camera", fov_deg);
        }
        self.camera.fov_deg = fov_deg;
    }

    pub fn set_projection(&mut self, projection: ProjectionKind) {
        self.camera.projection = projection;
    }

    pub fn is_interactable(&self) -> bool {
        self.orbit.is_some()
    }

    /// Orbits the camera from a pointer drag. Returns whether the camera moved.
    pub fn orbit_drag(&mut self, dx: f32, dy: f32) -> bool {
        match &self.orbit {
            Some(orbit) if dx != 0.0 || dy != 0.0 => {
                orbit.drag(&mut self.camera, dx, dy);
                true
            }
            _ => false,
        }
    }

    pub fn dolly(&mut self, steps: f32) -> bool {
        match &self.orbit {
            Some(orbit) if steps != 0.0 => {
                orbit.dolly(&mut self.camera, steps);
                true
            }
            _ => false,
        }
    }

    pub fn set_helpers_visible(&mut self, visible: bool) {
        self.helpers_visible = visible;
    }

    pub fn helpers_visible(&self) -> bool {
        self.helpers_visible
    }

    pub fn render(
        &self,
        backend: &mut dyn RenderBackend,
        frame: &FrameScene<'_>,
    ) -> Result<(), RenderError> {
        backend.render(frame, self.size)
    }

    /// Renders a `size`×`size` PNG and restores the viewport afterwards.
    pub fn capture_still(
        &mut self,
        backend: &mut dyn RenderBackend,
        frame: &FrameScene<'_>,
        size: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let saved = self.size;
        self.size = Viewport {
            width: size,
            height: size,
        };
        let pixels = backend.read_pixels(frame, self.size);
        self.size = saved;
        let pixels = pixels?;

        let mut out = std::io::Cursor::new(Vec::new());
        pixels.write_to(&mut out, image::ImageFormat::Png)?;
        log::info!(
            "captured {}x{} still ({} bytes)",
            pixels.width(),
            pixels.height(),
            out.get_ref().len()
        );
        Ok(out.into_inner())
    }
}
