//! Adaptive edge-bisection subdivision.
//!
//! Each pass flags triangles by a criterion, marks every edge that touches a
//! flagged triangle, inserts one midpoint per marked edge and retriangulates
//! every triangle owning a marked edge from a fixed 1/2/3-edge case table.
//! Marking edges rather than triangles keeps shared edges split on both
//! sides, so no cracks appear.

use densemesh_camera::CameraModel;
use densemesh_math::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Mesh, Triangle};
use crate::progress::ProgressSink;

/// Which triangles a pass splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubdivisionCriterion {
    /// Longest 3D edge above this length.
    MaxEdgeLength(f64),
    /// Projected area in pixels above this value in any of the triangle's cameras.
    MaxProjectedArea(f64),
}

/// Parameters for [`Mesh::subdivide`] and friends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionSettings {
    /// Split criterion.
    pub criterion: SubdivisionCriterion,
    /// Stop once the mesh holds this many points.
    pub max_points: usize,
    /// Stop after a pass that retriangulates no more than this many triangles.
    pub min_splits_per_pass: usize,
}

impl Default for SubdivisionSettings {
    fn default() -> Self {
        Self {
            criterion: SubdivisionCriterion::MaxEdgeLength(1.0),
            max_points: 10_000_000,
            min_splits_per_pass: 10,
        }
    }
}

impl SubdivisionSettings {
    /// Subdivide by edge length up to `max_points`.
    pub fn max_edge_length(length: f64, max_points: usize) -> Self {
        Self {
            criterion: SubdivisionCriterion::MaxEdgeLength(length),
            max_points,
            ..Default::default()
        }
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> MeshResult<()> {
        let threshold = match self.criterion {
            SubdivisionCriterion::MaxEdgeLength(v) => v,
            SubdivisionCriterion::MaxProjectedArea(v) => v,
        };
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(MeshError::InvalidSettings(format!(
                "subdivision threshold must be positive and finite, got {threshold}"
            )));
        }
        if self.max_points == 0 {
            return Err(MeshError::InvalidSettings("max_points must be > 0".into()));
        }
        Ok(())
    }
}

/// Result of a subdivision run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdivisionOutcome {
    /// For every output triangle, the id of the input triangle it descends from.
    pub provenance: Vec<usize>,
    /// Passes executed.
    pub passes: usize,
    /// Points added.
    pub new_points: usize,
}

impl SubdivisionOutcome {
    /// Carry per-triangle camera lists of the input mesh over to the output.
    pub fn remap_triangle_cameras(&self, triangle_cameras: &[Vec<usize>]) -> Vec<Vec<usize>> {
        self.provenance
            .iter()
            .map(|&o| triangle_cameras.get(o).cloned().unwrap_or_default())
            .collect()
    }
}

impl Mesh {
    /// Subdivide by longest edge length.
    ///
    /// The projected-area criterion needs cameras; use
    /// [`Mesh::subdivide_with_cameras`] for it.
    pub fn subdivide(&mut self, settings: &SubdivisionSettings, progress: &dyn ProgressSink) -> MeshResult<SubdivisionOutcome> {
        settings.validate()?;
        let SubdivisionCriterion::MaxEdgeLength(max_edge) = settings.criterion else {
            return Err(MeshError::InvalidSettings(
                "projected-area subdivision needs cameras".into(),
            ));
        };
        self.run_subdivision(settings, progress, |m, t, _| {
            m.triangle_max_edge_length(t) > max_edge
        })
    }

    /// Subdivide with either criterion.
    ///
    /// `triangle_cameras[t]` lists indices into `cameras` that see input
    /// triangle `t`; descendants look up their ancestor's list.
    pub fn subdivide_with_cameras<C>(
        &mut self,
        settings: &SubdivisionSettings,
        cameras: &[C],
        triangle_cameras: &[Vec<usize>],
        progress: &dyn ProgressSink,
    ) -> MeshResult<SubdivisionOutcome>
    where
        C: CameraModel + Sync,
    {
        settings.validate()?;
        match settings.criterion {
            SubdivisionCriterion::MaxEdgeLength(_) => self.subdivide(settings, progress),
            SubdivisionCriterion::MaxProjectedArea(max_area) => {
                if triangle_cameras.len() != self.triangle_count() {
                    return Err(MeshError::SizeMismatch {
                        what: "triangle cameras",
                        expected: self.triangle_count(),
                        found: triangle_cameras.len(),
                    });
                }
                if let Some(&camera) = triangle_cameras.iter().flatten().find(|&&c| c >= cameras.len()) {
                    return Err(MeshError::CameraOutOfRange {
                        camera,
                        camera_count: cameras.len(),
                    });
                }
                self.run_subdivision(settings, progress, |m, t, origin| {
                    triangle_cameras[origin].iter().any(|&c| {
                        m.triangle_projected_area(t, &cameras[c])
                            .is_some_and(|area| area > max_area)
                    })
                })
            }
        }
    }

    /// Subdivide by edge length and extend `point_cameras` to the new points.
    ///
    /// Each midpoint gets the distinct union of the cameras of the three
    /// original vertices of its ancestor triangle.
    pub fn subdivide_updating_point_cameras(
        &mut self,
        max_edge_length: f64,
        max_points: usize,
        point_cameras: &mut Vec<Vec<usize>>,
        progress: &dyn ProgressSink,
    ) -> MeshResult<SubdivisionOutcome> {
        self.check_per_point("point cameras", point_cameras.len())?;
        let old_points = self.point_count();
        let old_triangles = self.triangles().to_vec();

        let settings = SubdivisionSettings::max_edge_length(max_edge_length, max_points);
        let outcome = self.subdivide(&settings, progress)?;

        let mut ancestor: Vec<Option<usize>> = vec![None; self.point_count() - old_points];
        for (tri, &origin) in self.triangles().iter().zip(&outcome.provenance) {
            for &p in &tri.v {
                if p >= old_points {
                    ancestor[p - old_points] = Some(origin);
                }
            }
        }

        point_cameras.reserve(ancestor.len());
        for origin in ancestor {
            let mut cams = Vec::new();
            if let Some(o) = origin {
                let corners = old_triangles[o].v;
                debug_assert!(
                    corners.iter().all(|&p| p < old_points),
                    "ancestor triangle {o} references a point created by subdivision"
                );
                for &p in &corners {
                    for &c in &point_cameras[p] {
                        if !cams.contains(&c) {
                            cams.push(c);
                        }
                    }
                }
            }
            point_cameras.push(cams);
        }
        Ok(outcome)
    }

    fn run_subdivision<F>(
        &mut self,
        settings: &SubdivisionSettings,
        progress: &dyn ProgressSink,
        needs_split: F,
    ) -> MeshResult<SubdivisionOutcome>
    where
        F: Fn(&Mesh, usize, usize) -> bool + Sync,
    {
        let start_points = self.point_count();
        let mut provenance: Vec<usize> = (0..self.triangle_count()).collect();
        let mut passes = 0;

        while self.point_count() < settings.max_points {
            let split = self.subdivision_pass(&mut provenance, &needs_split)?;
            passes += 1;
            progress.report("subdivide", self.point_count(), settings.max_points);
            debug!(
                pass = passes,
                split,
                points = self.point_count(),
                triangles = self.triangle_count(),
                "subdivision pass"
            );
            if split <= settings.min_splits_per_pass {
                break;
            }
        }

        let new_points = self.point_count() - start_points;
        info!(
            passes,
            new_points,
            triangles = self.triangle_count(),
            "subdivision finished"
        );
        Ok(SubdivisionOutcome {
            provenance,
            passes,
            new_points,
        })
    }

    /// One pass. Returns the number of retriangulated triangles.
    fn subdivision_pass<F>(&mut self, provenance: &mut Vec<usize>, needs_split: &F) -> MeshResult<usize>
    where
        F: Fn(&Mesh, usize, usize) -> bool + Sync,
    {
        let edges = self.extract_undirected_edges();
        let triangle_edges = self.triangle_edge_ids(&edges)?;

        let flagged: Vec<bool> = (0..self.triangle_count())
            .into_par_iter()
            .map(|t| self.triangle(t).alive && needs_split(self, t, provenance[t]))
            .collect();

        let mut midpoint: Vec<Option<usize>> = vec![None; edges.len()];
        let mut new_points = Vec::new();
        for (e, tris) in edges.edge_triangles.iter().enumerate() {
            if tris.iter().any(|&t| flagged[t]) {
                midpoint[e] = Some(self.point_count() + new_points.len());
                let [a, b] = edges.edge_points[e];
                let (pa, pb) = (self.points()[a], self.points()[b]);
                new_points.push(Point3::from((pa.coords + pb.coords) * 0.5));
            }
        }
        if new_points.is_empty() {
            return Ok(0);
        }

        let mut triangles = Vec::with_capacity(self.triangle_count() + 3 * new_points.len());
        let mut origins = Vec::with_capacity(triangles.capacity());
        let mut split = 0;
        for (t, tri) in self.triangles().iter().enumerate() {
            let mids = triangle_edges[t].map(|e| midpoint[e]);
            let (pieces, count) = split_triangle(tri.v, mids);
            if count > 1 {
                split += 1;
            }
            for v in &pieces[..count] {
                triangles.push(Triangle { v: *v, alive: tri.alive });
                origins.push(provenance[t]);
            }
        }

        for p in new_points {
            self.add_point(p);
        }
        self.replace_triangles(triangles);
        *provenance = origins;
        Ok(split)
    }
}

/// Retriangulate `v` given the midpoint on each side (side `k` joins
/// `v[k]` and `v[k + 1]`). Winding is preserved. Returns up to four
/// triangles and how many are used.
fn split_triangle(v: [usize; 3], mids: [Option<usize>; 3]) -> ([[usize; 3]; 4], usize) {
    let mut out = [[0; 3]; 4];
    let marked = mids.iter().filter(|m| m.is_some()).count();
    match marked {
        1 => {
            let k = mids.iter().position(|m| m.is_some()).unwrap_or(0);
            let (a, b, c) = (v[k], v[(k + 1) % 3], v[(k + 2) % 3]);
            let m = mids[k].unwrap_or(a);
            out[0] = [a, m, c];
            out[1] = [m, b, c];
            (out, 2)
        }
        2 => {
            // The two marked sides are consecutive: a-b then b-c.
            let k = (0..3)
                .find(|&k| mids[k].is_some() && mids[(k + 1) % 3].is_some())
                .unwrap_or(0);
            let (a, b, c) = (v[k], v[(k + 1) % 3], v[(k + 2) % 3]);
            let (m1, m2) = (mids[k].unwrap_or(a), mids[(k + 1) % 3].unwrap_or(b));
            out[0] = [a, m1, m2];
            out[1] = [m1, b, m2];
            out[2] = [m2, c, a];
            (out, 3)
        }
        3 => {
            let [a, b, c] = v;
            let (mab, mbc, mca) = (
                mids[0].unwrap_or(a),
                mids[1].unwrap_or(b),
                mids[2].unwrap_or(c),
            );
            out[0] = [a, mab, mca];
            out[1] = [mab, b, mbc];
            out[2] = [mbc, c, mca];
            out[3] = [mab, mbc, mca];
            (out, 4)
        }
        _ => {
            out[0] = v;
            (out, 1)
        }
    }
}
