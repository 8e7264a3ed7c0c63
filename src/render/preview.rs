//! Software renderer used for headless runs and tests.
//!
//! Flat-shaded triangles with a depth buffer, line helpers and a box-blur
//! environment prefilter. Output quality is a preview, not a match for a GPU path.

use super::light_helpers::marker_triangles;
use super::{FrameScene, RenderBackend, RenderError, ResourceHandle, ResourceKind, Viewport};
use crate::assets::hdr::EquirectImage;
use crate::assets::{Aabb, GeometryAsset};
use glam::{Mat4, Vec3};
use std::collections::HashMap;

const BACKGROUND: Vec3 = Vec3::new(0.12, 0.12, 0.13);
const GRID_SIZE: f32 = 10.0;
const GRID_DIVISIONS: u32 = 10;
const AXES_LENGTH: f32 = 5.0;
const PREFILTER_WIDTH: u32 = 64;
const PREFILTER_MAX_RADIUS: f32 = 16.0;

#[derive(Debug)]
enum Resident {
    Geometry,
    Material,
    Texture,
    EnvironmentSource(EquirectImage),
    Prefiltered { average: Vec3 },
}

impl Resident {
    fn kind(&self) -> ResourceKind {
        match self {
            Resident::Geometry => ResourceKind::Geometry,
            Resident::Material => ResourceKind::Material,
            Resident::Texture => ResourceKind::Texture,
            Resident::EnvironmentSource(_) => ResourceKind::EnvironmentSource,
            Resident::Prefiltered { .. } => ResourceKind::PrefilteredEnvironment,
        }
    }
}

#[derive(Debug, Default)]
pub struct PreviewBackend {
    resources: HashMap<ResourceHandle, Resident>,
    next_handle: u64,
    prefilter_passes: usize,
    frames_rendered: usize,
}

impl PreviewBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of environment prefilter convolutions performed so far.
    pub fn prefilter_passes(&self) -> usize {
        self.prefilter_passes
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    pub fn kind_of(&self, handle: ResourceHandle) -> Option<ResourceKind> {
        self.resources.get(&handle).map(Resident::kind)
    }

    fn insert(&mut self, resident: Resident) -> ResourceHandle {
        self.next_handle += 1;
        let handle = ResourceHandle(self.next_handle);
        self.resources.insert(handle, resident);
        handle
    }

    fn environment_average(&self, frame: &FrameScene<'_>) -> Option<Vec3> {
        let binding = frame.environment?;
        match self.resources.get(&binding.prefiltered) {
            Some(Resident::Prefiltered { average }) => Some(*average * binding.intensity),
            _ => {
                log::warn!("frame references missing environment {:?}", binding.prefiltered);
                None
            }
        }
    }

    fn rasterize(&mut self, frame: &FrameScene<'_>, viewport: Viewport) -> Result<Canvas, RenderError> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(RenderError::InvalidSize {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let environment = self.environment_average(frame);
        let mut canvas = Canvas::new(
            viewport.width,
            viewport.height,
            environment.unwrap_or(BACKGROUND),
            frame.camera.view_projection(viewport.aspect()),
        );

        if let Some(model) = frame.model {
            let shading = Shading {
                frame,
                environment: environment.unwrap_or(Vec3::ZERO),
            };
            draw_asset(&mut canvas, model.asset, model.root, &shading);
        }
        for marker in &frame.light_markers {
            let color = marker.color.to_vec3();
            for tri in marker_triangles(marker) {
                canvas.fill_triangle(tri, color);
            }
        }
        if frame.helpers_visible {
            draw_helpers(&mut canvas);
        }
        if let Some(bounds) = frame.bounds_overlay {
            draw_box(&mut canvas, &bounds, Vec3::new(1.0, 0.0, 0.0));
        }
        self.frames_rendered += 1;
        Ok(canvas)
    }
}

impl RenderBackend for PreviewBackend {
    fn upload_asset(&mut self, asset: &GeometryAsset) -> Result<Vec<ResourceHandle>, RenderError> {
        let footprint = asset.footprint();
        let mut handles = Vec::with_capacity(footprint.total());
        handles.extend((0..footprint.geometries).map(|_| self.insert(Resident::Geometry)));
        handles.extend((0..footprint.materials).map(|_| self.insert(Resident::Material)));
        handles.extend((0..footprint.textures).map(|_| self.insert(Resident::Texture)));
        log::debug!("uploaded '{}' as {} resources", asset.name, handles.len());
        Ok(handles)
    }

    fn upload_environment(&mut self, image: &EquirectImage) -> Result<ResourceHandle, RenderError> {
        if image.width == 0 || image.height == 0 {
            return Err(RenderError::InvalidSize {
                width: image.width,
                height: image.height,
            });
        }
        Ok(self.insert(Resident::EnvironmentSource(image.clone())))
    }

    fn prefilter_environment(
        &mut self,
        source: ResourceHandle,
        blurriness: f32,
    ) -> Result<ResourceHandle, RenderError> {
        let image = match self.resources.get(&source) {
            Some(Resident::EnvironmentSource(image)) => image,
            Some(other) => {
                return Err(RenderError::WrongResourceKind {
                    handle: source,
                    expected: ResourceKind::EnvironmentSource,
                    actual: other.kind(),
                })
            }
            None => return Err(RenderError::UnknownResource(source)),
        };
        let filtered = prefilter(image, blurriness);
        let average = Vec3::from_array(filtered.average());
        self.prefilter_passes += 1;
        log::debug!(
            "prefiltered environment {:?} at blur {:.3} ({}x{})",
            source,
            blurriness,
            filtered.width,
            filtered.height
        );
        Ok(self.insert(Resident::Prefiltered { average }))
    }

    fn release(&mut self, handle: ResourceHandle) {
        if self.resources.remove(&handle).is_none() {
            log::warn!("release of unknown resource {:?}", handle);
        }
    }

    fn render(&mut self, frame: &FrameScene<'_>, viewport: Viewport) -> Result<(), RenderError> {
        self.rasterize(frame, viewport).map(|_| ())
    }

    fn read_pixels(
        &mut self,
        frame: &FrameScene<'_>,
        viewport: Viewport,
    ) -> Result<image::RgbaImage, RenderError> {
        Ok(self.rasterize(frame, viewport)?.into_image())
    }

    fn resident_count(&self) -> usize {
        self.resources.len()
    }
}

struct Shading<'f, 'a> {
    frame: &'f FrameScene<'a>,
    environment: Vec3,
}

impl Shading<'_, '_> {
    fn light(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let ambient = self.frame.ambient;
        let mut total = ambient.color.scaled(ambient.intensity) + self.environment;
        for light in self.frame.point_lights {
            let to_light = light.position - point;
            let dist_sq = to_light.length_squared();
            if dist_sq <= 1e-12 {
                continue;
            }
            let lambert = normal.dot(to_light / dist_sq.sqrt()).max(0.0);
            total += light.color.scaled(light.intensity) * lambert / dist_sq.max(1.0);
        }
        total
    }
}

fn draw_asset(canvas: &mut Canvas, asset: &GeometryAsset, root: Mat4, shading: &Shading<'_, '_>) {
    let globals = asset.node_globals(root);
    let eye = shading.frame.camera.position;
    for (node, mesh_index) in asset.mesh_instances() {
        let Some(mesh) = asset.meshes.get(mesh_index) else {
            continue;
        };
        let base = mesh
            .material
            .and_then(|m| asset.materials.get(m))
            .map(|m| m.base_color.to_vec3())
            .unwrap_or(Vec3::splat(0.53));
        let matrix = globals[node];
        for [a, b, c] in mesh.triangles() {
            let tri = [a, b, c].map(|i| matrix.transform_point3(Vec3::from_array(mesh.positions[i])));
            let mut normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
            if normal.length_squared() <= 1e-20 {
                continue;
            }
            normal = normal.normalize();
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            if normal.dot(eye - centroid) < 0.0 {
                normal = -normal;
            }
            canvas.fill_triangle(tri, base * shading.light(centroid, normal));
        }
    }
}

fn draw_helpers(canvas: &mut Canvas) {
    let half = GRID_SIZE * 0.5;
    let step = GRID_SIZE / GRID_DIVISIONS as f32;
    let grid = Vec3::splat(0.35);
    for i in 0..=GRID_DIVISIONS {
        let t = -half + step * i as f32;
        canvas.draw_line(Vec3::new(t, 0.0, -half), Vec3::new(t, 0.0, half), grid);
        canvas.draw_line(Vec3::new(-half, 0.0, t), Vec3::new(half, 0.0, t), grid);
    }
    canvas.draw_line(Vec3::ZERO, Vec3::X * AXES_LENGTH, Vec3::new(1.0, 0.0, 0.0));
    canvas.draw_line(Vec3::ZERO, Vec3::Y * AXES_LENGTH, Vec3::new(0.0, 1.0, 0.0));
    canvas.draw_line(Vec3::ZERO, Vec3::Z * AXES_LENGTH, Vec3::new(0.0, 0.0, 1.0));
}

fn draw_box(canvas: &mut Canvas, bounds: &Aabb, color: Vec3) {
    const EDGES: [(usize, usize); 12] = [
        (0, 1), (2, 3), (4, 5), (6, 7),
        (0, 2), (1, 3), (4, 6), (5, 7),
        (0, 4), (1, 5), (2, 6), (3, 7),
    ];
    let corners = bounds.corners();
    for (a, b) in EDGES {
        canvas.draw_line(corners[a], corners[b], color);
    }
}

/// Downsamples to at most 64 columns, then box-blurs with a radius proportional to `blurriness`.
fn prefilter(image: &EquirectImage, blurriness: f32) -> EquirectImage {
    let width = image.width.min(PREFILTER_WIDTH).max(1);
    let height = (width / 2).max(1).min(image.height.max(1));
    let mut small = EquirectImage::solid(width, height, [0.0; 3]);
    for y in 0..height {
        for x in 0..width {
            let x0 = x * image.width / width;
            let x1 = ((x + 1) * image.width / width).max(x0 + 1);
            let y0 = y * image.height / height;
            let y1 = ((y + 1) * image.height / height).max(y0 + 1);
            let mut sum = Vec3::ZERO;
            let mut count = 0.0;
            for sy in y0..y1 {
                for sx in x0..x1 {
                    sum += Vec3::from_array(image.texel(sx, sy));
                    count += 1.0;
                }
            }
            small.pixels[(y * width + x) as usize] = (sum / count).to_array();
        }
    }

    let radius = (blurriness.clamp(0.0, 1.0) * PREFILTER_MAX_RADIUS).round() as i64;
    if radius == 0 {
        return small;
    }
    let (w, h) = (width as i64, height as i64);
    let mut horizontal = small.clone();
    for y in 0..h {
        for x in 0..w {
            let mut sum = Vec3::ZERO;
            for k in -radius..=radius {
                let sx = (x + k).rem_euclid(w);
                sum += Vec3::from_array(small.pixels[(y * w + sx) as usize]);
            }
            horizontal.pixels[(y * w + x) as usize] = (sum / (2 * radius + 1) as f32).to_array();
        }
    }
    let mut out = horizontal.clone();
    for y in 0..h {
        for x in 0..w {
            let mut sum = Vec3::ZERO;
            for k in -radius..=radius {
                let sy = (y + k).clamp(0, h - 1);
                sum += Vec3::from_array(horizontal.pixels[(sy * w + x) as usize]);
            }
            out.pixels[(y * w + x) as usize] = (sum / (2 * radius + 1) as f32).to_array();
        }
    }
    out
}

struct Canvas {
    width: u32,
    height: u32,
    color: Vec<Vec3>,
    depth: Vec<f32>,
    view_projection: Mat4,
}

impl Canvas {
    fn new(width: u32, height: u32, clear: Vec3, view_projection: Mat4) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![clear; len],
            depth: vec![f32::INFINITY; len],
            view_projection,
        }
    }

    /// World point to (pixel x, pixel y, ndc depth); `None` behind the camera.
    fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection * point.extend(1.0);
        if clip.w <= 1e-5 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(
            (ndc.x * 0.5 + 0.5) * self.width as f32,
            (0.5 - ndc.y * 0.5) * self.height as f32,
            ndc.z,
        ))
    }

    fn plot(&mut self, x: i64, y: i64, z: f32, color: Vec3) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || !(0.0..=1.0).contains(&z) {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        if z < self.depth[index] {
            self.depth[index] = z;
            self.color[index] = color;
        }
    }

    fn fill_triangle(&mut self, tri: [Vec3; 3], color: Vec3) {
        let (Some(a), Some(b), Some(c)) = (self.project(tri[0]), self.project(tri[1]), self.project(tri[2])) else {
            return;
        };
        let area = edge(a, b, c);
        if area.abs() <= 1e-12 {
            return;
        }
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i64;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(self.width as f32 - 1.0) as i64;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i64;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(self.height as f32 - 1.0) as i64;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                self.plot(x, y, w0 * a.z + w1 * b.z + w2 * c.z, color);
            }
        }
    }

    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Vec3) {
        let (Some(a), Some(b)) = (self.project(from), self.project(to)) else {
            return;
        };
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().clamp(1.0, 8192.0) as usize;
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            // Lines win depth ties against the surfaces they outline.
            self.plot(p.x as i64, p.y as i64, p.z - 1e-4, color);
        }
    }

    fn into_image(self) -> image::RgbaImage {
        let mut out = image::RgbaImage::new(self.width, self.height);
        for (pixel, color) in out.pixels_mut().zip(self.color) {
            let mapped = color.max(Vec3::ZERO) / (Vec3::ONE + color.max(Vec3::ZERO));
            let [r, g, b] = mapped.to_array().map(|c| (c.powf(1.0 / 2.2) * 255.0).round() as u8);
            *pixel = image::Rgba([r, g, b, 255]);
        }
        out
    }
}

fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CameraState, EnvironmentBinding, StagedModel};
    use crate::scene::lighting::LightingRig;

    fn frame<'a>(lights: &'a LightingRig, model: Option<StagedModel<'a>>) -> FrameScene<'a> {
        FrameScene {
            camera: CameraState::default(),
            model,
            bounds_overlay: None,
            ambient: lights.ambient(),
            point_lights: lights.point_lights(),
            light_markers: Vec::new(),
            environment: None,
            helpers_visible: false,
        }
    }

    #[test]
    fn upload_and_release_track_residency() {
        let mut backend = PreviewBackend::new();
        let cube = GeometryAsset::default_cube();
        let handles = backend.upload_asset(&cube).unwrap();
        assert_eq!(handles.len(), cube.footprint().total());
        assert_eq!(backend.resident_count(), handles.len());
        for handle in handles {
            backend.release(handle);
        }
        assert_eq!(backend.resident_count(), 0);
    }

    #[test]
    fn cube_covers_center_pixel() {
        let lights = LightingRig::new();
        let cube = GeometryAsset::default_cube();
        let mut backend = PreviewBackend::new();
        let model = StagedModel {
            asset: &cube,
            root: Mat4::IDENTITY,
        };
        let viewport = Viewport { width: 64, height: 64 };
        let empty = backend.read_pixels(&frame(&lights, None), viewport).unwrap();
        let lit = backend.read_pixels(&frame(&lights, Some(model)), viewport).unwrap();
        assert_ne!(empty.get_pixel(32, 32), lit.get_pixel(32, 32));
        assert_eq!(empty.get_pixel(0, 0), lit.get_pixel(0, 0));
        assert_eq!(backend.frames_rendered(), 2);
    }

    #[test]
    fn prefilter_rejects_wrong_kind_and_counts_passes() {
        let mut backend = PreviewBackend::new();
        let cube = backend.upload_asset(&GeometryAsset::default_cube()).unwrap();
        assert!(matches!(
            backend.prefilter_environment(cube[0], 0.5),
            Err(RenderError::WrongResourceKind { .. })
        ));
        let source = backend
            .upload_environment(&EquirectImage::solid(8, 4, [2.0, 1.0, 0.5]))
            .unwrap();
        let filtered = backend.prefilter_environment(source, 0.5).unwrap();
        assert_eq!(backend.prefilter_passes(), 1);
        assert_eq!(backend.kind_of(filtered), Some(ResourceKind::PrefilteredEnvironment));
    }

    #[test]
    fn environment_tints_background() {
        let lights = LightingRig::new();
        let mut backend = PreviewBackend::new();
        let source = backend
            .upload_environment(&EquirectImage::solid(8, 4, [0.0, 0.0, 4.0]))
            .unwrap();
        let prefiltered = backend.prefilter_environment(source, 0.0).unwrap();
        let mut scene = frame(&lights, None);
        scene.environment = Some(EnvironmentBinding {
            prefiltered,
            intensity: 1.0,
        });
        let image = backend
            .read_pixels(&scene, Viewport { width: 4, height: 4 })
            .unwrap();
        let px = image.get_pixel(0, 0);
        assert!(px[2] > px[0]);
    }

    #[test]
    fn blur_preserves_average_energy() {
        let mut image = EquirectImage::solid(16, 8, [0.0; 3]);
        image.pixels[0] = [16.0 * 8.0, 0.0, 0.0];
        let sharp = prefilter(&image, 0.0);
        let blurred = prefilter(&image, 1.0);
        assert!((sharp.average()[0] - 1.0).abs() < 1e-3);
        assert!(blurred.pixels.iter().filter(|p| p[0] > 0.0).count() > 1);
    }

    #[test]
    fn zero_sized_target_is_rejected() {
        let lights = LightingRig::new();
        let mut backend = PreviewBackend::new();
        assert!(matches!(
            backend.render(&frame(&lights, None), Viewport { width: 0, height: 10 }),
            Err(RenderError::InvalidSize { .. })
        ));
    }
}
