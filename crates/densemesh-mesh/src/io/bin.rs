//! Binary mesh dump.
//!
//! Layout, little-endian: `i32` point count, `(f64, f64, f64)` per point,
//! `i32` triangle count, then a 16-byte record per triangle: three `i32`
//! point indices, a `u8` liveness flag and three zero padding bytes.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use densemesh_math::Point3;

use super::{read_count, read_f64, write_count};
use crate::error::MeshResult;
use crate::mesh::{Mesh, Triangle};

/// Write `mesh` in the binary dump layout.
pub fn write_bin<W: Write>(writer: &mut W, mesh: &Mesh) -> MeshResult<()> {
    write_count(writer, mesh.point_count(), "point count")?;
    for p in mesh.points() {
        writer.write_all(&p.x.to_le_bytes())?;
        writer.write_all(&p.y.to_le_bytes())?;
        writer.write_all(&p.z.to_le_bytes())?;
    }
    write_count(writer, mesh.triangle_count(), "triangle count")?;
    for t in mesh.triangles() {
        for &i in &t.v {
            write_count(writer, i, "point index")?;
        }
        writer.write_all(&[u8::from(t.alive), 0, 0, 0])?;
    }
    Ok(())
}

/// Read a mesh from the binary dump layout.
///
/// Short reads, negative counts or indices and out-of-range indices are
/// errors; nothing is returned on failure.
pub fn read_bin<R: Read>(reader: &mut R) -> MeshResult<Mesh> {
    let npts = read_count(reader, "point count")?;
    let mut points = Vec::new();
    for _ in 0..npts {
        let x = read_f64(reader)?;
        let y = read_f64(reader)?;
        let z = read_f64(reader)?;
        points.push(Point3::new(x, y, z));
    }

    let ntris = read_count(reader, "triangle count")?;
    let mut triangles = Vec::new();
    for _ in 0..ntris {
        let a = read_count(reader, "point index")?;
        let b = read_count(reader, "point index")?;
        let c = read_count(reader, "point index")?;
        let mut flags = [0u8; 4];
        reader.read_exact(&mut flags)?;
        triangles.push(Triangle {
            v: [a, b, c],
            alive: flags[0] != 0,
        });
    }
    Mesh::from_parts(points, triangles)
}

/// Write `mesh` to a binary dump file.
pub fn save_bin(path: impl AsRef<Path>, mesh: &Mesh) -> MeshResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_bin(&mut w, mesh)?;
    w.flush()?;
    Ok(())
}

/// Load a binary dump file.
pub fn load_bin(path: impl AsRef<Path>) -> MeshResult<Mesh> {
    let mut r = BufReader::new(File::open(path)?);
    read_bin(&mut r)
}
