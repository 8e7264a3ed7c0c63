use super::clip::{Channel, ChannelValues, Clip, Interpolation};
use super::{default_material, AssetError, GeometryAsset, MaterialData, MeshData, SceneNode, TextureData};
use crate::scene::Rgb;
use glam::{Quat, Vec3};
use std::collections::HashMap;

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Parses glTF/GLB. Draco-compressed files need a decoder this importer does not carry.
pub(super) fn parse_gltf(bytes: &[u8], name: &str) -> Result<GeometryAsset, AssetError> {
    let parse_error = |message: String| AssetError::Parse {
        format: "glTF",
        name: name.to_string(),
        message,
    };

    if required_extensions(bytes).iter().any(|ext| ext == DRACO_EXTENSION) {
        log::error!("compressed-mesh decoder not configured; cannot decode {}", name);
        return Err(AssetError::MissingCapability {
            capability: "compressed-mesh decoder",
            name: name.to_string(),
        });
    }

    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).map_err(|err| parse_error(err.to_string()))?;
    let buffers = gltf::import_buffers(&document, None, blob)
        .map_err(|err| parse_error(err.to_string()))?;
    let read_buffer = |buffer: gltf::Buffer<'_>| buffers.get(buffer.index()).map(|data| data.0.as_slice());

    let mut materials: Vec<MaterialData> = document
        .materials()
        .enumerate()
        .map(|(index, material)| {
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            MaterialData {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material_{index}")),
                base_color: Rgb([r, g, b]),
                base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
            }
        })
        .collect();
    let mut fallback_material: Option<usize> = None;

    let textures: Vec<TextureData> = document
        .textures()
        .map(|texture| TextureData {
            name: texture
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("texture_{}", texture.index())),
        })
        .collect();

    // glTF mesh index -> our per-primitive mesh indices
    let mut meshes: Vec<MeshData> = Vec::new();
    let mut primitive_meshes: HashMap<usize, Vec<usize>> = HashMap::new();
    for mesh in document.meshes() {
        let mut slots = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(read_buffer);
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            if positions.is_empty() {
                continue;
            }
            let normals = reader
                .read_normals()
                .map(|iter| iter.collect::<Vec<_>>())
                .filter(|normals| normals.len() == positions.len());
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let material = match primitive.material().index() {
                Some(index) => index,
                None => *fallback_material.get_or_insert_with(|| {
                    materials.push(default_material("material_default"));
                    materials.len() - 1
                }),
            };
            slots.push(meshes.len());
            meshes.push(MeshData {
                positions,
                normals,
                indices,
                material: Some(material),
            });
        }
        primitive_meshes.insert(mesh.index(), slots);
    }

    let mut nodes: Vec<SceneNode> = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            let mut out = SceneNode::new(
                node.name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
            );
            out.translation = Vec3::from_array(translation);
            out.rotation = Quat::from_array(rotation).normalize();
            out.scale = Vec3::from_array(scale);
            out.children = node.children().map(|child| child.index()).collect();
            out
        })
        .collect();

    // Extra primitives hang off synthetic children so node indices match animation targets.
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let Some(slots) = primitive_meshes.get(&mesh.index()) else {
            continue;
        };
        let mut slots = slots.iter().copied();
        nodes[node.index()].mesh = slots.next();
        for (part, slot) in slots.enumerate() {
            let mut child = SceneNode::new(format!("{}_part{}", nodes[node.index()].name, part + 1));
            child.mesh = Some(slot);
            nodes.push(child);
            let child_index = nodes.len() - 1;
            nodes[node.index()].children.push(child_index);
        }
    }

    let roots: Vec<usize> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|node| node.index()).collect(),
        None => {
            let mut is_child = vec![false; nodes.len()];
            for node in &nodes {
                for &child in &node.children {
                    if let Some(flag) = is_child.get_mut(child) {
                        *flag = true;
                    }
                }
            }
            (0..nodes.len()).filter(|&index| !is_child[index]).collect()
        }
    };

    let clips = document
        .animations()
        .enumerate()
        .map(|(index, animation)| {
            let channels = animation
                .channels()
                .filter_map(|channel| read_channel(&channel, read_buffer))
                .collect();
            let clip_name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Animation {}", index + 1));
            Clip::new(clip_name, channels)
        })
        .collect();

    GeometryAsset::new(name, nodes, roots, meshes, materials, textures, clips)
}

fn read_channel<'a, 's, F>(channel: &gltf::animation::Channel<'a>, read_buffer: F) -> Option<Channel>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    use gltf::animation::util::ReadOutputs;

    let reader = channel.reader(read_buffer);
    let times: Vec<f32> = reader.read_inputs()?.collect();
    let cubic = channel.sampler().interpolation() == gltf::animation::Interpolation::CubicSpline;
    let interpolation = match channel.sampler().interpolation() {
        gltf::animation::Interpolation::Step => Interpolation::Step,
        _ => Interpolation::Linear,
    };
    // Cubic spline outputs are (in-tangent, value, out-tangent) triples; keep the values.
    fn keyframes<T>(values: Vec<T>, cubic: bool) -> Vec<T> {
        if cubic {
            values.into_iter().skip(1).step_by(3).collect()
        } else {
            values
        }
    }
    let values = match reader.read_outputs()? {
        ReadOutputs::Translations(iter) => ChannelValues::Translation(keyframes(
            iter.map(Vec3::from_array).collect(),
            cubic,
        )),
        ReadOutputs::Rotations(rotations) => ChannelValues::Rotation(keyframes(
            rotations
                .into_f32()
                .map(|q| Quat::from_array(q).normalize())
                .collect(),
            cubic,
        )),
        ReadOutputs::Scales(iter) => {
            ChannelValues::Scale(keyframes(iter.map(Vec3::from_array).collect(), cubic))
        }
        ReadOutputs::MorphTargetWeights(_) => return None,
    };
    Some(Channel {
        node: channel.target().node().index(),
        interpolation,
        times,
        values,
    })
}

/// `extensionsRequired` of a glTF JSON document or GLB container, read before validation.
fn required_extensions(bytes: &[u8]) -> Vec<String> {
    let json: std::borrow::Cow<'_, [u8]> = if bytes.starts_with(b"glTF") {
        match gltf::binary::Glb::from_slice(bytes) {
            Ok(glb) => glb.json,
            Err(_) => return Vec::new(),
        }
    } else {
        std::borrow::Cow::Borrowed(bytes)
    };
    serde_json::from_slice::<serde_json::Value>(&json)
        .ok()
        .and_then(|value| value.get("extensionsRequired").cloned())
        .and_then(|value| serde_json::from_value::<Vec<String>>(value).ok())
        .unwrap_or_default()
}
