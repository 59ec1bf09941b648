//! Wavefront OBJ import and export.
//!
//! Import understands `v`, `vn`, `vt`, `usemtl` and triangular `f` lines in
//! the four index forms `a`, `a/t`, `a//n` and `a/t/n`. Anything else is
//! ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use densemesh_math::{Point2, Point3, Vec3};
use tracing::info;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Mesh, Triangle};

/// A mesh read from OBJ text with its per-face attributes.
#[derive(Debug, Clone, Default)]
pub struct ObjMesh {
    /// Points and triangles.
    pub mesh: Mesh,
    /// `vn` entries.
    pub normals: Vec<Vec3>,
    /// `vt` entries.
    pub uvs: Vec<Point2>,
    /// Per triangle, indices into `normals` when the face carried them.
    pub triangle_normals: Vec<Option<[usize; 3]>>,
    /// Per triangle, indices into `uvs` when the face carried them.
    pub triangle_uvs: Vec<Option<[usize; 3]>>,
    /// Per triangle, index into `materials`; `None` before the first `usemtl`.
    pub triangle_materials: Vec<Option<usize>>,
    /// Material names in first-seen order.
    pub materials: Vec<String>,
}

/// One `f` vertex: point, optional uv and optional normal index (0-based).
type FaceVertex = (usize, Option<usize>, Option<usize>);

fn parse_error(line: usize, message: impl Into<String>) -> MeshError {
    MeshError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_floats<const N: usize>(line: usize, fields: &[&str]) -> MeshResult<[f64; N]> {
    if fields.len() < N {
        return Err(parse_error(line, format!("expected {N} numbers, found {}", fields.len())));
    }
    let mut out = [0.0; N];
    for (o, f) in out.iter_mut().zip(fields) {
        *o = f
            .parse()
            .map_err(|_| parse_error(line, format!("invalid number '{f}'")))?;
    }
    Ok(out)
}

fn parse_index(line: usize, s: &str) -> MeshResult<usize> {
    let i: i64 = s
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{s}'")))?;
    if i < 1 {
        return Err(parse_error(line, format!("index {i} must be 1-based and positive")));
    }
    usize::try_from(i - 1).map_err(|_| parse_error(line, format!("index {i} too large")))
}

fn parse_face_vertex(line: usize, token: &str) -> MeshResult<FaceVertex> {
    let parts: Vec<&str> = token.split('/').collect();
    match parts.as_slice() {
        [v] => Ok((parse_index(line, v)?, None, None)),
        [v, t] => Ok((parse_index(line, v)?, Some(parse_index(line, t)?), None)),
        [v, "", n] => Ok((parse_index(line, v)?, None, Some(parse_index(line, n)?))),
        [v, t, n] => Ok((
            parse_index(line, v)?,
            Some(parse_index(line, t)?),
            Some(parse_index(line, n)?),
        )),
        _ => Err(parse_error(line, format!("malformed face vertex '{token}'"))),
    }
}

/// Per-face attribute triple, present only if all three vertices carry it.
fn attribute(line: usize, values: [Option<usize>; 3]) -> MeshResult<Option<[usize; 3]>> {
    match values {
        [Some(a), Some(b), Some(c)] => Ok(Some([a, b, c])),
        [None, None, None] => Ok(None),
        _ => Err(parse_error(line, "face mixes index forms")),
    }
}

/// Parse OBJ text.
///
/// Fails on faces that are not triangles, malformed numbers or indices, and
/// on input without any point or face.
pub fn read_obj<R: BufRead>(reader: R) -> MeshResult<ObjMesh> {
    let mut points = Vec::new();
    let mut triangles = Vec::new();
    let mut obj = ObjMesh::default();
    let mut material_ids: HashMap<String, usize> = HashMap::new();
    let mut current_material = None;

    for (n, line) in reader.lines().enumerate() {
        let line_no = n + 1;
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some((&keyword, rest)) = fields.split_first() else {
            continue;
        };
        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(line_no, rest)?;
                points.push(Point3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(line_no, rest)?;
                obj.normals.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(line_no, rest)?;
                obj.uvs.push(Point2::new(u, v));
            }
            "usemtl" => {
                let name = rest.join(" ");
                let next = material_ids.len();
                let id = *material_ids.entry(name.clone()).or_insert_with(|| {
                    obj.materials.push(name);
                    next
                });
                current_material = Some(id);
            }
            "f" => {
                if rest.len() != 3 {
                    return Err(parse_error(
                        line_no,
                        format!("expected a triangle, face has {} vertices", rest.len()),
                    ));
                }
                let mut verts = [(0, None, None); 3];
                for (v, token) in verts.iter_mut().zip(rest) {
                    *v = parse_face_vertex(line_no, token)?;
                }
                triangles.push(Triangle::new(verts[0].0, verts[1].0, verts[2].0));
                obj.triangle_uvs
                    .push(attribute(line_no, verts.map(|v| v.1))?);
                obj.triangle_normals
                    .push(attribute(line_no, verts.map(|v| v.2))?);
                obj.triangle_materials.push(current_material);
            }
            _ => {}
        }
    }

    if points.is_empty() || triangles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    obj.mesh = Mesh::from_parts(points, triangles)?;
    info!(
        points = obj.mesh.point_count(),
        triangles = obj.mesh.triangle_count(),
        normals = obj.normals.len(),
        uvs = obj.uvs.len(),
        materials = obj.materials.len(),
        "read obj"
    );
    Ok(obj)
}

/// Write `mesh` as OBJ text with a single group and 1-based faces.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &Mesh) -> MeshResult<()> {
    writeln!(writer, "# Wavefront OBJ file")?;
    writeln!(writer, "g Mesh")?;
    for p in mesh.points() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for t in mesh.triangles() {
        writeln!(writer, "f {} {} {}", t.v[0] + 1, t.v[1] + 1, t.v[2] + 1)?;
    }
    Ok(())
}

/// Load an OBJ file.
pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<ObjMesh> {
    read_obj(BufReader::new(File::open(path)?))
}

/// Save `mesh` to an OBJ file.
pub fn save_obj(path: impl AsRef<Path>, mesh: &Mesh) -> MeshResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_obj(&mut w, mesh)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_quad;
    use std::io::Cursor;

    fn parse(text: &str) -> MeshResult<ObjMesh> {
        read_obj(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn test_plain_faces() {
        let obj = parse("# comment\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(obj.mesh.point_count(), 3);
        assert_eq!(obj.mesh.triangle(0).v, [0, 1, 2]);
        assert_eq!(obj.triangle_uvs, vec![None]);
        assert_eq!(obj.triangle_normals, vec![None]);
        assert_eq!(obj.triangle_materials, vec![None]);
    }

    #[test]
    fn test_all_index_forms() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
                    vt 0 0\nvt 1 0\nvt 0 1\n\
                    vn 0 0 1\n\
                    f 1/1 2/2 3/3\n\
                    f 1//1 2//1 3//1\n\
                    f 3/3/1 2/2/1 1/1/1\n";
        let obj = parse(text).unwrap();
        assert_eq!(obj.mesh.triangle_count(), 3);
        assert_eq!(obj.uvs.len(), 3);
        assert_eq!(obj.triangle_uvs, vec![Some([0, 1, 2]), None, Some([2, 1, 0])]);
        assert_eq!(obj.triangle_normals, vec![None, Some([0, 0, 0]), Some([0, 0, 0])]);
    }

    #[test]
    fn test_materials_in_first_seen_order() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
                    f 1 2 3\n\
                    usemtl wood\nf 2 4 3\n\
                    usemtl stone\nf 1 2 4\n\
                    usemtl wood\nf 1 3 4\n";
        let obj = parse(text).unwrap();
        assert_eq!(obj.materials, vec!["wood".to_string(), "stone".to_string()]);
        assert_eq!(obj.triangle_materials, vec![None, Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_rejects_quads() {
        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 4 3\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 5, .. }));
    }

    #[test]
    fn test_rejects_bad_indices() {
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n"),
            Err(MeshError::Parse { line: 4, .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n"),
            Err(MeshError::PointIndexOutOfRange { index: 8, .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1 2 3\n"),
            Err(MeshError::Parse { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_number() {
        assert!(matches!(
            parse("v 0 zero 0\n"),
            Err(MeshError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse("# nothing\n"), Err(MeshError::EmptyMesh)));
        assert!(matches!(parse("v 0 0 0\n"), Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_write_then_read() {
        let m = unit_quad();
        let mut buf = Vec::new();
        write_obj(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("g Mesh"));
        assert!(text.contains("f 1 3 4"));
        let back = read_obj(Cursor::new(buf)).unwrap();
        assert_eq!(back.mesh, m);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("densemesh_obj_{}.obj", std::process::id()));
        let m = unit_quad();
        save_obj(&path, &m).unwrap();
        let back = load_obj(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.mesh, m);
    }
}
