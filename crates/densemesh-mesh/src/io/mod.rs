//! Mesh persistence: the little-endian binary dump and Wavefront OBJ text.

pub mod bin;
pub mod obj;

pub use bin::{load_bin, read_bin, save_bin, write_bin};
pub use obj::{load_obj, read_obj, save_obj, write_obj, ObjMesh};

use std::io::{Read, Write};

use crate::error::{MeshError, MeshResult};

/// Read a little-endian `i32`.
pub fn read_i32<R: Read>(reader: &mut R) -> MeshResult<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read a little-endian `f32`.
pub fn read_f32<R: Read>(reader: &mut R) -> MeshResult<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a little-endian `f64`.
pub fn read_f64<R: Read>(reader: &mut R) -> MeshResult<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read an `i32` that must be a count or index, i.e. non-negative.
pub fn read_count<R: Read>(reader: &mut R, what: &str) -> MeshResult<usize> {
    let v = read_i32(reader)?;
    usize::try_from(v).map_err(|_| MeshError::InvalidRecord(format!("negative {what}: {v}")))
}

/// Write a count or index as a little-endian `i32`.
pub fn write_count<W: Write>(writer: &mut W, value: usize, what: &str) -> MeshResult<()> {
    let v = i32::try_from(value)
        .map_err(|_| MeshError::InvalidRecord(format!("{what} {value} does not fit in i32")))?;
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}
