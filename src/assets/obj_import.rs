use super::{default_material, AssetError, GeometryAsset, MeshData, SceneNode};
use std::io::{BufReader, Cursor};

pub(super) fn parse_obj(bytes: &[u8], name: &str) -> Result<GeometryAsset, AssetError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let mut reader = BufReader::new(Cursor::new(bytes));
    // Material libraries are external files; OBJ input is treated as material-less.
    let (models, _) = tobj::load_obj_buf(&mut reader, &options, |_path| {
        Ok((Vec::new(), Default::default()))
    })
    .map_err(|err| AssetError::Parse {
        format: "OBJ",
        name: name.to_string(),
        message: err.to_string(),
    })?;

    let mut nodes = Vec::new();
    let mut meshes = Vec::new();
    for model in models {
        let mesh = model.mesh;
        if mesh.positions.len() % 3 != 0 || mesh.positions.is_empty() {
            continue;
        }
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|v| [v[0], v[1], v[2]])
            .collect();
        let normals = (mesh.normals.len() == mesh.positions.len()).then(|| {
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect()
        });
        let mut node = SceneNode::new(if model.name.is_empty() {
            format!("object_{}", nodes.len())
        } else {
            model.name
        });
        node.mesh = Some(meshes.len());
        meshes.push(MeshData {
            positions,
            normals,
            indices: mesh.indices,
            material: Some(0),
        });
        nodes.push(node);
    }

    let roots = (0..nodes.len()).collect();
    GeometryAsset::new(
        name,
        nodes,
        roots,
        meshes,
        vec![default_material("obj_default")],
        Vec::new(),
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const TETRA: &str = "\
o tetra
v 0 0 0
v 1 0 0
v 0 2 0
v 0 0 3
f 1 2 3
f 1 2 4
f 1 3 4
f 2 3 4
";

    #[test]
    fn parses_objects_with_default_material() {
        let asset = parse_obj(TETRA.as_bytes(), "tetra.obj").unwrap();
        assert_eq!(asset.meshes.len(), 1);
        assert_eq!(asset.face_count(), 4);
        assert_eq!(asset.materials.len(), 1);
        assert_eq!(asset.materials[0].base_color.to_hex(), "#888888");
        assert!((asset.bounding_box().size() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn text_without_geometry_is_empty() {
        let result = parse_obj(b"# just a comment\n", "empty.obj");
        assert!(result.is_err());
    }
}
