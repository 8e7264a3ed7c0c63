use crate::assets::{Aabb, ChannelSample, GeometryAsset};
use crate::render::{RenderBackend, RenderError, ResourceHandle, StagedModel};
use crate::scene::rotation_from_degrees;
use glam::{Mat4, Vec3};

/// Target size used when a model is the whole scene.
pub const SCENE_TARGET_SIZE: f32 = 5.0;
/// Target size used for embedded/library viewer instances.
pub const LIBRARY_TARGET_SIZE: f32 = 2.0;

/// Explicit placement applied to the model root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub scale: Vec3,
    pub rotation_deg: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation_deg: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Center at the origin and scale uniformly so the largest side equals `target`.
    Normalize { target: f32 },
    Explicit(ModelTransform),
}

/// Figures shown in the model info panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelStats {
    pub vertices: usize,
    pub faces: usize,
    pub original_size: Vec3,
    pub scale_factor: f32,
}

#[derive(Debug)]
struct Installed {
    asset: GeometryAsset,
    handles: Vec<ResourceHandle>,
    offset: Vec3,
    scale: Vec3,
    rotation_deg: Vec3,
    stats: ModelStats,
}

impl Installed {
    fn root_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            rotation_from_degrees(self.rotation_deg),
            Vec3::ZERO,
        ) * Mat4::from_translation(self.offset)
    }
}

/// Holds the one displayed model. Every operation on an empty stage is a no-op.
#[derive(Debug, Default)]
pub struct ModelStage {
    installed: Option<Installed>,
    bounds_visible: bool,
}

impl ModelStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `asset`, then releases the previous model's resources.
    ///
    /// On upload failure the previous model stays installed.
    pub fn install(
        &mut self,
        backend: &mut dyn RenderBackend,
        asset: GeometryAsset,
        placement: Placement,
    ) -> Result<(), RenderError> {
        let handles = backend.upload_asset(&asset)?;
        let original_size = asset.bounding_box().size();

        let (offset, scale, rotation_deg) = match placement {
            Placement::Normalize { target } => {
                let max_dim = original_size.max_element();
                let factor = if max_dim > f32::EPSILON && target > 0.0 {
                    target / max_dim
                } else {
                    log::warn!("cannot normalize '{}' with extent {:?}", asset.name, original_size);
                    1.0
                };
                (-asset.bounding_box().center(), Vec3::splat(factor), Vec3::ZERO)
            }
            Placement::Explicit(transform) => (Vec3::ZERO, transform.scale, transform.rotation_deg),
        };

        let stats = ModelStats {
            vertices: asset.vertex_count(),
            faces: asset.face_count(),
            original_size,
            scale_factor: scale.max_element(),
        };
        log::info!(
            "installed '{}': {} vertices, {} faces, scale {:.4}",
            asset.name,
            stats.vertices,
            stats.faces,
            stats.scale_factor
        );

        let previous = self.installed.replace(Installed {
            asset,
            handles,
            offset,
            scale,
            rotation_deg,
            stats,
        });
        if let Some(previous) = previous {
            release_all(backend, previous);
        }
        Ok(())
    }

    /// Releases the installed model's resources and empties the stage.
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(previous) = self.installed.take() {
            release_all(backend, previous);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_none()
    }

    pub fn asset(&self) -> Option<&GeometryAsset> {
        self.installed.as_ref().map(|installed| &installed.asset)
    }

    pub fn update_rotation(&mut self, rotation_deg: Vec3) {
        if let Some(installed) = &mut self.installed {
            installed.rotation_deg = rotation_deg;
        }
    }

    pub fn rotation(&self) -> Option<Vec3> {
        self.installed.as_ref().map(|installed| installed.rotation_deg)
    }

    /// Current world-space size, including scale and rotation.
    pub fn compute_dimensions(&self) -> Option<Vec3> {
        self.world_bounds().map(|bounds| bounds.size())
    }

    pub fn set_debug_bounds_visible(&mut self, visible: bool) {
        self.bounds_visible = visible;
    }

    pub fn debug_bounds_visible(&self) -> bool {
        self.bounds_visible
    }

    pub fn bounds_overlay(&self) -> Option<Aabb> {
        if self.bounds_visible {
            self.world_bounds()
        } else {
            None
        }
    }

    pub fn stats(&self) -> Option<ModelStats> {
        self.installed.as_ref().map(|installed| installed.stats)
    }

    pub fn resident_handles(&self) -> usize {
        self.installed.as_ref().map_or(0, |installed| installed.handles.len())
    }

    pub fn staged(&self) -> Option<StagedModel<'_>> {
        self.installed.as_ref().map(|installed| StagedModel {
            asset: &installed.asset,
            root: installed.root_matrix(),
        })
    }

    /// Writes sampled animation values onto the installed asset's nodes.
    pub fn apply_pose(&mut self, samples: &[(usize, ChannelSample)]) {
        if let Some(installed) = &mut self.installed {
            for (node, sample) in samples {
                installed.asset.apply_sample(*node, *sample);
            }
        }
    }

    fn world_bounds(&self) -> Option<Aabb> {
        self.installed
            .as_ref()
            .map(|installed| installed.asset.world_bounds(installed.root_matrix()))
    }
}

fn release_all(backend: &mut dyn RenderBackend, installed: Installed) {
    for handle in &installed.handles {
        backend.release(*handle);
    }
    log::debug!(
        "released {} resources of '{}'",
        installed.handles.len(),
        installed.asset.name
    );
}
