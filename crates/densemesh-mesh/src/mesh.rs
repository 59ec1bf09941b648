//! The mesh entity: owned points and triangles with per-triangle queries.

use densemesh_camera::CameraModel;
use densemesh_geom::{triangle_area_2d, Aabb3, Plane};
use densemesh_math::{heron_area, Point3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MeshError, MeshResult};

/// Three point indices in winding order plus a liveness flag.
///
/// Dead triangles stay in the array during incremental edits and are
/// dropped by [`Mesh::remove_dead_triangles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    /// Point indices.
    pub v: [usize; 3],
    /// False once the triangle has been discarded.
    pub alive: bool,
}

impl Triangle {
    /// A live triangle.
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self {
            v: [a, b, c],
            alive: true,
        }
    }

    /// Position of point `p` within the triangle.
    pub fn slot_of(&self, p: usize) -> Option<usize> {
        self.v.iter().position(|&q| q == p)
    }

    /// True if `p` is one of the vertices.
    pub fn contains(&self, p: usize) -> bool {
        self.v.contains(&p)
    }

    /// Directed edges `(v0, v1)`, `(v1, v2)`, `(v2, v0)`.
    pub fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }

    fn has_repeated_index(&self) -> bool {
        let [a, b, c] = self.v;
        a == b || b == c || a == c
    }
}

/// A triangle mesh owning its point and triangle sequences.
///
/// Every triangle references three distinct, in-range points. Points that no
/// triangle references are allowed and can be purged with
/// [`Mesh::remove_free_points`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    points: Vec<Point3>,
    triangles: Vec<Triangle>,
}

fn check_triangle(index: usize, tri: &Triangle, point_count: usize) -> MeshResult<()> {
    if let Some(&bad) = tri.v.iter().find(|&&p| p >= point_count) {
        return Err(MeshError::PointIndexOutOfRange {
            triangle: index,
            index: bad,
            point_count,
        });
    }
    if tri.has_repeated_index() {
        return Err(MeshError::RepeatedPointIndex { triangle: index });
    }
    Ok(())
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from raw sequences, validating every triangle.
    pub fn from_parts(points: Vec<Point3>, triangles: Vec<Triangle>) -> MeshResult<Self> {
        for (i, t) in triangles.iter().enumerate() {
            check_triangle(i, t, points.len())?;
        }
        Ok(Self { points, triangles })
    }

    /// Build a mesh from points and live index triples.
    pub fn from_indexed(points: Vec<Point3>, faces: &[[usize; 3]]) -> MeshResult<Self> {
        let triangles = faces.iter().map(|&[a, b, c]| Triangle::new(a, b, c)).collect();
        Self::from_parts(points, triangles)
    }

    /// Assemble without validation; callers guarantee the invariants.
    pub(crate) fn from_parts_unchecked(points: Vec<Point3>, triangles: Vec<Triangle>) -> Self {
        Self { points, triangles }
    }

    /// Swap in a new triangle sequence whose indices are already valid.
    pub(crate) fn replace_triangles(&mut self, triangles: Vec<Triangle>) {
        self.triangles = triangles;
    }

    /// Take the point and triangle sequences.
    pub fn into_parts(self) -> (Vec<Point3>, Vec<Triangle>) {
        (self.points, self.triangles)
    }

    /// All points.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Mutable point coordinates. The number of points cannot change.
    pub fn points_mut(&mut self) -> &mut [Point3] {
        &mut self.points
    }

    /// All triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of triangles, dead ones included.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangle `t`.
    ///
    /// # Panics
    ///
    /// If `t` is out of range.
    pub fn triangle(&self, t: usize) -> &Triangle {
        &self.triangles[t]
    }

    /// Mark triangle `t` dead or alive.
    pub fn set_alive(&mut self, t: usize, alive: bool) -> MeshResult<()> {
        let count = self.triangles.len();
        let tri = self
            .triangles
            .get_mut(t)
            .ok_or(MeshError::TriangleIndexOutOfRange {
                triangle: t,
                triangle_count: count,
            })?;
        tri.alive = alive;
        Ok(())
    }

    /// Append a point and return its index.
    pub fn add_point(&mut self, p: Point3) -> usize {
        self.points.push(p);
        self.points.len() - 1
    }

    /// Append a validated triangle and return its index.
    pub fn add_triangle(&mut self, tri: Triangle) -> MeshResult<usize> {
        check_triangle(self.triangles.len(), &tri, self.points.len())?;
        self.triangles.push(tri);
        Ok(self.triangles.len() - 1)
    }

    pub(crate) fn check_triangle_id(&self, t: usize) -> MeshResult<()> {
        if t < self.triangles.len() {
            Ok(())
        } else {
            Err(MeshError::TriangleIndexOutOfRange {
                triangle: t,
                triangle_count: self.triangles.len(),
            })
        }
    }

    // Geometric queries on triangle `t` below share the panic of `triangle_points`.

    /// Corner positions of triangle `t`.
    ///
    /// # Panics
    ///
    /// If `t` is out of range.
    pub fn triangle_points(&self, t: usize) -> [Point3; 3] {
        self.triangles[t].v.map(|i| self.points[i])
    }

    /// Unit normal of triangle `t` from its winding, `None` if degenerate.
    pub fn triangle_normal(&self, t: usize) -> Option<Vec3> {
        let [a, b, c] = self.triangle_points(t);
        Plane::from_triangle(&a, &b, &c).map(|p| p.normal.into_inner())
    }

    /// Supporting plane of triangle `t`, `None` if degenerate.
    pub fn triangle_plane(&self, t: usize) -> Option<Plane> {
        let [a, b, c] = self.triangle_points(t);
        Plane::from_triangle(&a, &b, &c)
    }

    /// Centroid of triangle `t`.
    pub fn triangle_center_of_gravity(&self, t: usize) -> Point3 {
        let [a, b, c] = self.triangle_points(t);
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    fn edge_lengths(&self, t: usize) -> [f64; 3] {
        let [a, b, c] = self.triangle_points(t);
        [(b - a).norm(), (c - b).norm(), (a - c).norm()]
    }

    /// Area of triangle `t` (Heron's formula).
    pub fn triangle_area(&self, t: usize) -> f64 {
        let [a, b, c] = self.edge_lengths(t);
        heron_area(a, b, c)
    }

    /// Longest edge of triangle `t`.
    pub fn triangle_max_edge_length(&self, t: usize) -> f64 {
        self.edge_lengths(t).into_iter().fold(0.0, f64::max)
    }

    /// Shortest edge of triangle `t`.
    pub fn triangle_min_edge_length(&self, t: usize) -> f64 {
        self.edge_lengths(t)
            .into_iter()
            .fold(f64::INFINITY, f64::min)
    }

    /// True if some interior angle of triangle `t` exceeds 90 degrees.
    pub fn is_triangle_obtuse(&self, t: usize) -> bool {
        let p = self.triangle_points(t);
        (0..3).any(|k| {
            let (a, b, c) = (p[k], p[(k + 1) % 3], p[(k + 2) % 3]);
            (b - a).dot(&(c - a)) < 0.0
        })
    }

    /// Area of triangle `t` projected into `camera` at native resolution.
    ///
    /// `None` if a vertex projects to non-finite coordinates.
    pub fn triangle_projected_area<C: CameraModel + ?Sized>(&self, t: usize, camera: &C) -> Option<f64> {
        let [a, b, c] = self.triangle_points(t).map(|p| camera.project(&p));
        if [a, b, c].iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            Some(triangle_area_2d(&a, &b, &c))
        } else {
            None
        }
    }

    /// Mean over all triangles of the longest edge length; 0 for an empty mesh.
    pub fn average_max_edge_length(&self) -> f64 {
        if self.triangles.is_empty() {
            return 0.0;
        }
        let sum: f64 = (0..self.triangles.len())
            .map(|t| self.triangle_max_edge_length(t))
            .sum();
        sum / self.triangles.len() as f64
    }

    /// Bounding box of all points.
    pub fn bounding_box(&self) -> Aabb3 {
        Aabb3::from_points(self.points.iter())
    }

    /// Slot (0, 1 or 2) of point `p` in triangle `t`.
    pub fn triangle_point_slot(&self, t: usize, p: usize) -> MeshResult<usize> {
        self.check_triangle_id(t)?;
        self.triangles[t]
            .slot_of(p)
            .ok_or(MeshError::PointNotInTriangle { triangle: t, point: p })
    }

    /// The two other vertices of triangle `t`, following the winding after `p`.
    pub fn triangle_other_points(&self, t: usize, p: usize) -> MeshResult<[usize; 2]> {
        let slot = self.triangle_point_slot(t, p)?;
        let v = self.triangles[t].v;
        Ok([v[(slot + 1) % 3], v[(slot + 2) % 3]])
    }

    /// Replace vertex `old` of triangle `t` with `new`.
    pub fn change_triangle_point(&mut self, t: usize, old: usize, new: usize) -> MeshResult<()> {
        let slot = self.triangle_point_slot(t, old)?;
        let mut tri = self.triangles[t];
        tri.v[slot] = new;
        check_triangle(t, &tri, self.points.len())?;
        self.triangles[t] = tri;
        Ok(())
    }

    /// True if triangles `t1` and `t2` sharing edge `(a, b)` have compatible
    /// winding, i.e. they traverse the shared edge in opposite directions.
    pub fn are_triangles_same_oriented(&self, t1: usize, t2: usize, a: usize, b: usize) -> MeshResult<bool> {
        let step = |t: usize| -> MeshResult<usize> {
            let ia = self.triangle_point_slot(t, a)?;
            let ib = self.triangle_point_slot(t, b)?;
            Ok((ib + 3 - ia) % 3)
        };
        Ok(step(t1)? != step(t2)?)
    }

    /// Flip the winding of every triangle.
    pub fn invert_triangle_orientations(&mut self) {
        for t in &mut self.triangles {
            t.v.swap(1, 2);
        }
    }

    /// Append another mesh's points and index-shifted triangles.
    ///
    /// Returns the number of triangles skipped as malformed, which is always
    /// zero for a validated `other`.
    pub fn merge(&mut self, other: &Mesh) -> usize {
        self.merge_parts(other.points.clone(), &other.triangles)
    }

    /// Append raw points and triangles whose indices refer to `points`.
    ///
    /// Triangles with out-of-range or repeated indices are skipped and
    /// counted instead of aborting the merge.
    pub fn merge_parts(&mut self, points: Vec<Point3>, triangles: &[Triangle]) -> usize {
        let offset = self.points.len();
        let incoming = points.len();
        self.points.extend(points);
        self.triangles.reserve(triangles.len());

        let mut skipped = 0;
        for (i, t) in triangles.iter().enumerate() {
            if let Err(e) = check_triangle(i, t, incoming) {
                warn!("merge: skipping triangle: {e}");
                skipped += 1;
                continue;
            }
            self.triangles.push(Triangle {
                v: t.v.map(|p| p + offset),
                alive: t.alive,
            });
        }
        if skipped > 0 {
            warn!("merge: skipped {skipped} of {} triangles", triangles.len());
        }
        skipped
    }

    /// Keep only the triangles listed in `ids`, in that order.
    ///
    /// Points are left untouched; follow with [`Mesh::remove_free_points`]
    /// to compact them.
    pub fn retain_triangle_ids(&mut self, ids: &[usize]) -> MeshResult<()> {
        for &t in ids {
            self.check_triangle_id(t)?;
        }
        self.triangles = ids.iter().map(|&t| self.triangles[t]).collect();
        Ok(())
    }

    /// Drop every dead triangle. Returns how many were removed.
    pub fn remove_dead_triangles(&mut self) -> usize {
        let before = self.triangles.len();
        self.triangles.retain(|t| t.alive);
        before - self.triangles.len()
    }

    /// New mesh holding the triangles `ids` and only the points they use.
    ///
    /// Also returns the old-to-new point remap (`None` for dropped points).
    pub fn subset(&self, ids: &[usize]) -> MeshResult<(Mesh, Vec<Option<usize>>)> {
        for &t in ids {
            self.check_triangle_id(t)?;
        }
        let mut used = vec![false; self.points.len()];
        for &t in ids {
            for &p in &self.triangles[t].v {
                used[p] = true;
            }
        }
        let (points, new_ids, remap) = self.compact_points(&used);
        let triangles = ids
            .iter()
            .map(|&t| {
                let tri = self.triangles[t];
                Triangle {
                    v: tri.v.map(|p| new_ids[p]),
                    alive: tri.alive,
                }
            })
            .collect();
        Ok((Mesh::from_parts_unchecked(points, triangles), remap))
    }

    /// Drop points no triangle references and reindex the triangles.
    ///
    /// Returns the old-to-new remap (`None` for removed points) so parallel
    /// per-point arrays can follow with [`apply_point_remap`].
    pub fn remove_free_points(&mut self) -> Vec<Option<usize>> {
        let mut used = vec![false; self.points.len()];
        for t in &self.triangles {
            for &p in &t.v {
                used[p] = true;
            }
        }
        let (points, new_ids, remap) = self.compact_points(&used);
        for t in &mut self.triangles {
            t.v = t.v.map(|p| new_ids[p]);
        }
        self.points = points;
        remap
    }

    /// Kept points, dense old-to-new ids (meaningful only where `used`) and
    /// the optional remap.
    fn compact_points(&self, used: &[bool]) -> (Vec<Point3>, Vec<usize>, Vec<Option<usize>>) {
        let mut points = Vec::with_capacity(used.iter().filter(|&&u| u).count());
        let mut new_ids = vec![0; used.len()];
        let mut remap = vec![None; used.len()];
        for (old, &keep) in used.iter().enumerate() {
            if keep {
                new_ids[old] = points.len();
                remap[old] = Some(points.len());
                points.push(self.points[old]);
            }
        }
        (points, new_ids, remap)
    }
}

/// Re-align a per-point array after compaction.
///
/// `values[i]` moves to `remap[i]`; entries whose point was dropped are discarded.
pub fn apply_point_remap<T>(remap: &[Option<usize>], values: Vec<T>) -> MeshResult<Vec<T>> {
    if remap.len() != values.len() {
        return Err(MeshError::SizeMismatch {
            what: "per-point array",
            expected: remap.len(),
            found: values.len(),
        });
    }
    let kept = remap.iter().filter(|r| r.is_some()).count();
    let mut slots: Vec<Option<T>> = (0..kept).map(|_| None).collect();
    for (value, target) in values.into_iter().zip(remap) {
        if let Some(new) = *target {
            if let Some(slot) = slots.get_mut(new) {
                *slot = Some(value);
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}
