use super::{default_material, AssetError, GeometryAsset, MeshData};

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

pub(super) fn parse_stl(bytes: &[u8], name: &str) -> Result<GeometryAsset, AssetError> {
    let parse_error = |message: &str| AssetError::Parse {
        format: "STL",
        name: name.to_string(),
        message: message.to_string(),
    };

    let (positions, normals) = if is_binary(bytes) {
        read_binary(bytes)
    } else {
        let text = std::str::from_utf8(bytes).map_err(|_| parse_error("not binary and not UTF-8"))?;
        read_ascii(text).ok_or_else(|| parse_error("malformed vertex record"))?
    };
    if positions.is_empty() {
        return Err(parse_error("no facets"));
    }

    let mesh = MeshData {
        positions,
        normals: Some(normals),
        indices: Vec::new(),
        material: None,
    };
    GeometryAsset::from_mesh(name, mesh, default_material("stl_default"))
}

fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    count
        .checked_mul(TRIANGLE_LEN)
        .and_then(|len| len.checked_add(HEADER_LEN + 4))
        .is_some_and(|expected| expected == bytes.len())
}

fn read_f32x3(bytes: &[u8]) -> [f32; 3] {
    let f = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    [f(0), f(4), f(8)]
}

fn read_binary(bytes: &[u8]) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    for record in bytes[HEADER_LEN + 4..].chunks_exact(TRIANGLE_LEN) {
        let normal = read_f32x3(&record[0..12]);
        for corner in 0..3 {
            let start = 12 + corner * 12;
            positions.push(read_f32x3(&record[start..start + 12]));
            normals.push(normal);
        }
    }
    (positions, normals)
}

fn read_ascii(text: &str) -> Option<(Vec<[f32; 3]>, Vec<[f32; 3]>)> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut normal = [0.0f32; 3];
    for line in text.lines() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("facet") => {
                let values: Vec<f32> = words.skip(1).filter_map(|w| w.parse().ok()).collect();
                if values.len() == 3 {
                    normal = [values[0], values[1], values[2]];
                }
            }
            Some("vertex") => {
                let values: Vec<f32> = words.map(|w| w.parse().ok()).collect::<Option<_>>()?;
                if values.len() != 3 {
                    return None;
                }
                positions.push([values[0], values[1], values[2]]);
                normals.push(normal);
            }
            _ => {}
        }
    }
    positions.truncate(positions.len() - positions.len() % 3);
    normals.truncate(positions.len());
    Some((positions, normals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn binary_triangle() -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes.extend(1u32.to_le_bytes());
        for v in [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 4.0, 0.0] {
            bytes.extend(v.to_le_bytes());
        }
        bytes.extend([0u8, 0u8]);
        bytes
    }

    #[test]
    fn parses_binary_facets() {
        let asset = parse_stl(&binary_triangle(), "tri.stl").unwrap();
        assert_eq!(asset.face_count(), 1);
        assert_eq!(asset.vertex_count(), 3);
        assert!((asset.bounding_box().size() - Vec3::new(2.0, 4.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn parses_ascii_facets() {
        let text = "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n";
        let asset = parse_stl(text.as_bytes(), "tri.stl").unwrap();
        assert_eq!(asset.face_count(), 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_stl(b"solid x\nvertex a b c\n", "bad.stl").is_err());
        assert!(parse_stl(&[0xFF, 0xFE, 0x00], "bad.stl").is_err());
    }
}
