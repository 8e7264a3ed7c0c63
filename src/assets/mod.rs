pub mod clip;
pub mod fetch;
mod gltf_import;
pub mod hdr;
mod obj_import;
mod stl_import;

pub use clip::{Channel, ChannelSample, ChannelValues, Clip, Interpolation};
pub use fetch::{AssetSource, Fetch, FetchedBytes, SourceFetcher};

use crate::scene::Rgb;
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;

/// Material applied to meshes that arrive without one (OBJ, STL).
pub const DEFAULT_MESH_COLOR: u32 = 0x888888;
/// Color of the built-in placeholder cube.
pub const DEFAULT_CUBE_COLOR: u32 = 0x4CAF50;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("unsupported model format: {name}")]
    UnsupportedFormat { name: String },
    #[error("failed to parse {format} data for {name}: {message}")]
    Parse {
        format: &'static str,
        name: String,
        message: String,
    },
    #[error("model {name} has no triangle geometry")]
    Empty { name: String },
    #[error("{capability} unavailable; cannot decode {name}")]
    MissingCapability {
        capability: &'static str,
        name: String,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
}

/// Which importer a payload is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    /// Mesh-only text format without embedded material (OBJ).
    MeshOnly,
    /// Binary triangle soup with a pre-baked material (STL).
    TriangleSoup,
    /// Full scene graph with materials and animation (glTF text or GLB container).
    SceneGraph,
}

impl FormatHint {
    pub fn label(self) -> &'static str {
        match self {
            FormatHint::MeshOnly => "OBJ",
            FormatHint::TriangleSoup => "STL",
            FormatHint::SceneGraph => "glTF",
        }
    }

    /// Resolves the importer from a file name, falling back to sniffing GLB magic.
    pub fn detect(name: &str, bytes: &[u8]) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let extension = lower
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string());
        match extension.as_deref() {
            Some("gltf") | Some("glb") => return Some(FormatHint::SceneGraph),
            Some("obj") => return Some(FormatHint::MeshOnly),
            Some("stl") => return Some(FormatHint::TriangleSoup),
            _ => {}
        }
        if bytes.starts_with(b"glTF") {
            Some(FormatHint::SceneGraph)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self {
            min: center - size * 0.5,
            max: center + size * 0.5,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub children: Vec<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub mesh: Option<usize>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Triangle corner indices, synthesizing them for non-indexed meshes.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let count = self.triangle_count();
        (0..count).filter_map(move |tri| {
            let corner = |k: usize| -> Option<usize> {
                if self.indices.is_empty() {
                    Some(tri * 3 + k)
                } else {
                    self.indices.get(tri * 3 + k).map(|&i| i as usize)
                }
            };
            let (a, b, c) = (corner(0)?, corner(1)?, corner(2)?);
            let len = self.positions.len();
            (a < len && b < len && c < len).then_some([a, b, c])
        })
    }
}

#[derive(Debug, Clone)]
pub struct MaterialData {
    pub name: String,
    pub base_color: Rgb,
    pub base_color_texture: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
}

/// Counts of GPU-resident resources an asset needs once uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceFootprint {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl ResourceFootprint {
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.textures
    }
}

/// Loaded scene graph: nodes, meshes, materials and embedded animation clips.
#[derive(Debug, Clone)]
pub struct GeometryAsset {
    pub name: String,
    pub nodes: Vec<SceneNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub textures: Vec<TextureData>,
    pub clips: Vec<Arc<Clip>>,
    bounds: Aabb,
}

impl GeometryAsset {
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<SceneNode>,
        roots: Vec<usize>,
        meshes: Vec<MeshData>,
        materials: Vec<MaterialData>,
        textures: Vec<TextureData>,
        clips: Vec<Clip>,
    ) -> Result<Self, AssetError> {
        let asset = Self::assemble(name.into(), nodes, roots, meshes, materials, textures, clips);
        if asset.bounds.is_empty() {
            return Err(AssetError::Empty { name: asset.name });
        }
        Ok(asset)
    }

    fn assemble(
        name: String,
        nodes: Vec<SceneNode>,
        roots: Vec<usize>,
        meshes: Vec<MeshData>,
        materials: Vec<MaterialData>,
        textures: Vec<TextureData>,
        clips: Vec<Clip>,
    ) -> Self {
        let mut asset = Self {
            name,
            nodes,
            roots,
            meshes,
            materials,
            textures,
            clips: clips.into_iter().map(Arc::new).collect(),
            bounds: Aabb::EMPTY,
        };
        asset.bounds = asset.world_bounds(Mat4::IDENTITY);
        asset
    }

    /// Single-node asset wrapping one mesh.
    pub fn from_mesh(
        name: impl Into<String>,
        mut mesh: MeshData,
        material: MaterialData,
    ) -> Result<Self, AssetError> {
        let name = name.into();
        mesh.material = Some(0);
        let mut node = SceneNode::new(name.clone());
        node.mesh = Some(0);
        Self::new(name, vec![node], vec![0], vec![mesh], vec![material], Vec::new(), Vec::new())
    }

    /// Placeholder cube of unit size.
    pub fn default_cube() -> Self {
        let mut mesh = box_mesh(Vec3::ONE);
        mesh.material = Some(0);
        let material = MaterialData {
            name: "cube".to_string(),
            base_color: Rgb::from_hex_u32(DEFAULT_CUBE_COLOR),
            base_color_texture: None,
        };
        let mut node = SceneNode::new("cube");
        node.mesh = Some(0);
        Self::assemble(
            "cube".to_string(),
            vec![node],
            vec![0],
            vec![mesh],
            vec![material],
            Vec::new(),
            Vec::new(),
        )
    }

    /// Model-space bounding box computed at load time.
    pub fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    pub fn footprint(&self) -> ResourceFootprint {
        ResourceFootprint {
            geometries: self.meshes.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh_instances()
            .filter_map(|(_, mesh)| self.meshes.get(mesh))
            .map(|mesh| mesh.positions.len())
            .sum()
    }

    pub fn face_count(&self) -> usize {
        self.mesh_instances()
            .filter_map(|(_, mesh)| self.meshes.get(mesh))
            .map(MeshData::triangle_count)
            .sum()
    }

    /// Global matrix of every node under `root`.
    pub fn node_globals(&self, root: Mat4) -> Vec<Mat4> {
        let mut globals = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> = self.roots.iter().map(|&r| (r, root)).collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            let global = parent * node.local_matrix();
            globals[index] = global;
            stack.extend(node.children.iter().map(|&child| (child, global)));
        }
        globals
    }

    /// (node, mesh) pairs reachable from the roots.
    pub fn mesh_instances(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = self.roots.clone();
        while let Some(index) = stack.pop() {
            if index >= reachable.len() || reachable[index] {
                continue;
            }
            reachable[index] = true;
            stack.extend(self.nodes[index].children.iter().copied());
        }
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(index, _)| reachable[*index])
            .filter_map(|(index, node)| node.mesh.map(|mesh| (index, mesh)))
    }

    /// Exact bounding box of all vertices under the `root` transform.
    pub fn world_bounds(&self, root: Mat4) -> Aabb {
        let globals = self.node_globals(root);
        let mut bounds = Aabb::EMPTY;
        for (node, mesh) in self.mesh_instances() {
            let Some(mesh) = self.meshes.get(mesh) else {
                continue;
            };
            let matrix = globals[node];
            for position in &mesh.positions {
                bounds.extend(matrix.transform_point3(Vec3::from_array(*position)));
            }
        }
        bounds
    }

    pub fn apply_sample(&mut self, node: usize, sample: ChannelSample) {
        let Some(node) = self.nodes.get_mut(node) else {
            return;
        };
        match sample {
            ChannelSample::Translation(v) => node.translation = v,
            ChannelSample::Rotation(q) => node.rotation = q,
            ChannelSample::Scale(v) => node.scale = v,
        }
    }
}

/// Axis-aligned box centered at the origin, 12 triangles.
pub fn box_mesh(size: Vec3) -> MeshData {
    let h = size * 0.5;
    let positions: Vec<[f32; 3]> = Aabb {
        min: -h,
        max: h,
    }
    .corners()
    .iter()
    .map(|c| c.to_array())
    .collect();
    let indices: Vec<u32> = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    MeshData {
        positions,
        normals: None,
        indices,
        material: None,
    }
}

/// Importer capability: turns raw bytes plus a format hint into a scene graph.
pub trait AssetLoader {
    fn parse(&self, bytes: &[u8], hint: FormatHint, name: &str)
        -> Result<GeometryAsset, AssetError>;
}

/// Built-in importer set covering glTF/GLB, OBJ and STL.
///
/// No compressed-mesh decoder is bundled: glTF files requiring Draco fail with
/// [`AssetError::MissingCapability`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelImporter;

impl AssetLoader for ModelImporter {
    fn parse(
        &self,
        bytes: &[u8],
        hint: FormatHint,
        name: &str,
    ) -> Result<GeometryAsset, AssetError> {
        match hint {
            FormatHint::SceneGraph => gltf_import::parse_gltf(bytes, name),
            FormatHint::MeshOnly => obj_import::parse_obj(bytes, name),
            FormatHint::TriangleSoup => stl_import::parse_stl(bytes, name),
        }
    }
}

pub(crate) fn default_material(name: &str) -> MaterialData {
    MaterialData {
        name: name.to_string(),
        base_color: Rgb::from_hex_u32(DEFAULT_MESH_COLOR),
        base_color_texture: None,
    }
}

/// File name without directories or extension, used for capture names.
pub fn display_stem(name: &str) -> String {
    let file = name
        .split(['?', '#'])
        .next()
        .unwrap_or(name)
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn box_asset(size: Vec3, offset: Vec3) -> GeometryAsset {
        let mut mesh = box_mesh(size);
        for p in &mut mesh.positions {
            p[0] += offset.x;
            p[1] += offset.y;
            p[2] += offset.z;
        }
        GeometryAsset::from_mesh("box", mesh, default_material("box")).unwrap()
    }

    #[test]
    fn detects_formats_by_extension() {
        assert_eq!(FormatHint::detect("Model.GLB", &[]), Some(FormatHint::SceneGraph));
        assert_eq!(FormatHint::detect("a/b/scene.gltf", &[]), Some(FormatHint::SceneGraph));
        assert_eq!(FormatHint::detect("mesh.obj", &[]), Some(FormatHint::MeshOnly));
        assert_eq!(FormatHint::detect("part.stl", &[]), Some(FormatHint::TriangleSoup));
        assert_eq!(
            FormatHint::detect("https://host/x.glb?token=1", &[]),
            Some(FormatHint::SceneGraph)
        );
        assert_eq!(FormatHint::detect("notes.txt", b"hello"), None);
    }

    #[test]
    fn detects_glb_by_magic() {
        assert_eq!(FormatHint::detect("blob", b"glTF\x02\0\0\0"), Some(FormatHint::SceneGraph));
    }

    #[test]
    fn bounds_follow_node_hierarchy() {
        let mut asset = box_asset(Vec3::new(2.0, 4.0, 6.0), Vec3::ZERO);
        assert!((asset.bounding_box().size() - Vec3::new(2.0, 4.0, 6.0)).length() < 1e-5);
        asset.nodes[0].translation = Vec3::new(10.0, 0.0, 0.0);
        let moved = asset.world_bounds(Mat4::IDENTITY);
        assert!((moved.center() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let mesh = MeshData {
            positions: Vec::new(),
            normals: None,
            indices: Vec::new(),
            material: None,
        };
        let result = GeometryAsset::from_mesh("nothing", mesh, default_material("m"));
        assert!(matches!(result, Err(AssetError::Empty { .. })));
    }

    #[test]
    fn default_cube_counts() {
        let cube = GeometryAsset::default_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 12);
        assert_eq!(cube.footprint().total(), 2);
        assert!((cube.bounding_box().size() - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn importer_reports_missing_draco_decoder() {
        let doc = serde_json::json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": ["KHR_draco_mesh_compression"],
            "extensionsRequired": ["KHR_draco_mesh_compression"]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        let result = ModelImporter.parse(&bytes, FormatHint::SceneGraph, "packed.gltf");
        assert!(matches!(
            result,
            Err(AssetError::MissingCapability { capability: "compressed-mesh decoder", .. })
        ));
    }

    #[test]
    fn display_stem_strips_paths_and_extensions() {
        assert_eq!(display_stem("models/Duck.glb"), "Duck");
        assert_eq!(display_stem("https://x.y/a/Fox.gltf?v=2"), "Fox");
        assert_eq!(display_stem("noext"), "noext");
    }
}
