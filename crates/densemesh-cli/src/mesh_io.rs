//! Mesh files picked by extension: `.obj` text or `.bin` dumps.

use std::path::Path;

use anyhow::{Context, Result};
use densemesh_mesh::{io, Mesh};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Bin,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "obj" => Ok(Self::Obj),
            "bin" => Ok(Self::Bin),
            _ => anyhow::bail!("Unknown mesh format: '{}' (expected .obj or .bin)", path.display()),
        }
    }
}

pub fn load_mesh(path: &Path) -> Result<Mesh> {
    let mesh = match MeshFormat::from_path(path)? {
        MeshFormat::Obj => io::load_obj(path).map(|obj| obj.mesh),
        MeshFormat::Bin => io::load_bin(path),
    };
    mesh.with_context(|| format!("loading {}", path.display()))
}

pub fn save_mesh(path: &Path, mesh: &Mesh) -> Result<()> {
    match MeshFormat::from_path(path)? {
        MeshFormat::Obj => io::save_obj(path, mesh),
        MeshFormat::Bin => io::save_bin(path, mesh),
    }
    .with_context(|| format!("saving {}", path.display()))
}

/// One-line description printed after every command.
pub fn summary(path: &Path, mesh: &Mesh) -> String {
    format!(
        "{}: {} points, {} triangles",
        path.display(),
        mesh.point_count(),
        mesh.triangle_count()
    )
}
