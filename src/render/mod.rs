mod camera;
pub mod light_helpers;
mod preview;
mod viewport;

pub use camera::{
    CameraState, OrbitController, ProjectionKind, FAR_PLANE, NEAR_PLANE, ORTHO_HALF_HEIGHT,
};
pub use light_helpers::LightMarker;
pub use preview::PreviewBackend;
pub use viewport::{ViewportRig, CAPTURE_SIZE};

use crate::assets::hdr::EquirectImage;
use crate::assets::{Aabb, GeometryAsset};
use crate::scene::lighting::{AmbientLight, PointLight};
use glam::Mat4;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown GPU resource {0:?}")]
    UnknownResource(ResourceHandle),
    #[error("resource {handle:?} is a {actual:?}, expected {expected:?}")]
    WrongResourceKind {
        handle: ResourceHandle,
        expected: ResourceKind,
        actual: ResourceKind,
    },
    #[error("invalid render target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to encode capture: {0}")]
    Encode(#[from] image::ImageError),
}

/// Opaque handle to a GPU-resident resource owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
    EnvironmentSource,
    PrefilteredEnvironment,
}

/// Pixel size of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Installed model as seen by the renderer.
#[derive(Debug, Clone, Copy)]
pub struct StagedModel<'a> {
    pub asset: &'a GeometryAsset,
    pub root: Mat4,
}

/// Active image-based lighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentBinding {
    pub prefiltered: ResourceHandle,
    pub intensity: f32,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct FrameScene<'a> {
    pub camera: CameraState,
    pub model: Option<StagedModel<'a>>,
    pub bounds_overlay: Option<Aabb>,
    pub ambient: AmbientLight,
    pub point_lights: &'a [PointLight],
    pub light_markers: Vec<LightMarker>,
    pub environment: Option<EnvironmentBinding>,
    pub helpers_visible: bool,
}

/// Rendering capability. Owns all GPU-resident resources and hands out handles.
pub trait RenderBackend {
    /// Uploads an asset's geometries, materials and textures.
    fn upload_asset(&mut self, asset: &GeometryAsset) -> Result<Vec<ResourceHandle>, RenderError>;

    fn upload_environment(&mut self, image: &EquirectImage) -> Result<ResourceHandle, RenderError>;

    /// Convolves an environment source into a prefiltered reflection/irradiance map.
    fn prefilter_environment(
        &mut self,
        source: ResourceHandle,
        blurriness: f32,
    ) -> Result<ResourceHandle, RenderError>;

    fn release(&mut self, handle: ResourceHandle);

    fn render(&mut self, frame: &FrameScene<'_>, viewport: Viewport) -> Result<(), RenderError>;

    /// Renders offscreen and reads the RGBA8 result back.
    fn read_pixels(
        &mut self,
        frame: &FrameScene<'_>,
        viewport: Viewport,
    ) -> Result<image::RgbaImage, RenderError>;

    fn resident_count(&self) -> usize;
}
