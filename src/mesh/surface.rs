//! Indexed triangle surface mesh.
//!
//! [`SurfaceMesh`] owns a flat vertex array and a flat face array, the
//! domain metadata that travels with the surface, and (lazily) the
//! per-vertex [`Adjacency`] fans used by the optimization passes.
//!
//! # Deletion
//!
//! Vertices and faces are never flagged in place with sentinel markers.
//! Removal is expressed as explicit removal lists that are handed to
//! [`SurfaceMesh::compact`], which performs a stable, order-preserving
//! compaction and returns the [`IndexRemap`] from old to new indices.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::adjacency::Adjacency;

/// A vertex of the surface mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// User or domain tag. Carried through every operation untouched.
    pub marker: i32,

    /// Unselected vertices are locked: they are never relocated or removed.
    pub selected: bool,
}

impl Vertex {
    /// Create a new selected vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            marker: 0,
            selected: true,
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

/// A triangular face.
///
/// The three vertex indices are ordered counter-clockwise when seen from the
/// side the face normal points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Vertex indices in counter-clockwise order.
    pub vertices: [usize; 3],

    /// Domain or group tag.
    pub marker: i32,

    /// Selection flag.
    pub selected: bool,
}

impl Face {
    /// Create a new selected face.
    pub fn new(vertices: [usize; 3]) -> Self {
        Self {
            vertices,
            marker: 0,
            selected: true,
        }
    }

    /// Check whether the face uses vertex `v`.
    #[inline]
    pub fn contains(&self, v: usize) -> bool {
        self.vertices.contains(&v)
    }

    /// Rotate the index triple so that `v` comes first, keeping the winding.
    ///
    /// Returns `None` if the face does not use `v`.
    pub fn rotated_to(&self, v: usize) -> Option<[usize; 3]> {
        let [a, b, c] = self.vertices;
        if a == v {
            Some([a, b, c])
        } else if b == v {
            Some([b, c, a])
        } else if c == v {
            Some([c, a, b])
        } else {
            None
        }
    }
}

impl Default for Face {
    fn default() -> Self {
        Self::new([0, 0, 0])
    }
}

/// Metadata describing the domain a surface bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainInfo {
    /// Whether the surface is expected to be closed.
    pub closed: bool,
    /// Domain marker.
    pub marker: i32,
    /// Optional volume constraint for downstream tetrahedral meshing.
    pub volume_constraint: Option<f64>,
    /// Whether the enclosed domain is a hole.
    pub hole: bool,
}

impl Default for DomainInfo {
    fn default() -> Self {
        Self {
            closed: true,
            marker: 1,
            volume_constraint: None,
            hole: false,
        }
    }
}

/// Old-to-new index map produced by a compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRemap {
    /// New index of every old vertex, `None` if it was removed.
    pub vertices: Vec<Option<usize>>,
    /// New index of every old face, `None` if it was removed.
    pub faces: Vec<Option<usize>>,
}

impl IndexRemap {
    /// Identity remap for a mesh of the given size.
    pub fn identity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: (0..num_vertices).map(Some).collect(),
            faces: (0..num_faces).map(Some).collect(),
        }
    }

    /// New index of an old vertex.
    #[inline]
    pub fn vertex(&self, old: usize) -> Option<usize> {
        self.vertices.get(old).copied().flatten()
    }

    /// New index of an old face.
    #[inline]
    pub fn face(&self, old: usize) -> Option<usize> {
        self.faces.get(old).copied().flatten()
    }

    /// Number of removed vertices.
    pub fn removed_vertices(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_none()).count()
    }

    /// Number of removed faces.
    pub fn removed_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.is_none()).count()
    }

    /// Whether nothing was removed.
    pub fn is_identity(&self) -> bool {
        self.removed_vertices() == 0 && self.removed_faces() == 0
    }
}

/// A triangle surface mesh with lazily built vertex adjacency.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) faces: Vec<Face>,
    pub(crate) adjacency: Option<Adjacency>,

    /// Domain metadata.
    pub domain: DomainInfo,
}

impl SurfaceMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-sized buffers.
    ///
    /// Vertices start at the origin and faces as `[0, 0, 0]`; fill them through
    /// [`vertices_mut`](Self::vertices_mut) and [`faces_mut`](Self::faces_mut).
    pub fn with_size(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: (0..num_vertices).into_par_iter().map(|_| Vertex::default()).collect(),
            faces: (0..num_faces).into_par_iter().map(|_| Face::default()).collect(),
            adjacency: None,
            domain: DomainInfo::default(),
        }
    }

    /// Assemble a mesh from owned buffers without validation.
    pub(crate) fn from_parts(vertices: Vec<Vertex>, faces: Vec<Face>, domain: DomainInfo) -> Self {
        Self {
            vertices,
            faces,
            adjacency: None,
            domain,
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// All vertices.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All faces.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Mutable access to the vertex buffer. Positions may change freely; the
    /// adjacency stays valid because the vertex count cannot change.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Mutable access to the face buffer.
    ///
    /// Drops the adjacency, since face connectivity may change.
    pub fn faces_mut(&mut self) -> &mut [Face] {
        self.adjacency = None;
        &mut self.faces
    }

    /// Get a vertex by index.
    #[inline]
    pub fn vertex(&self, v: usize) -> &Vertex {
        &self.vertices[v]
    }

    /// Get a face by index.
    #[inline]
    pub fn face(&self, f: usize) -> &Face {
        &self.faces[f]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: usize) -> &Point3<f64> {
        &self.vertices[v].position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: usize, pos: Point3<f64>) {
        self.vertices[v].position = pos;
    }

    /// The vertex adjacency, if it has been built.
    #[inline]
    pub fn adjacency(&self) -> Option<&Adjacency> {
        self.adjacency.as_ref()
    }

    /// Get the positions of the three vertices of a face.
    pub fn face_positions(&self, f: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[f].vertices;
        [
            self.vertices[a].position,
            self.vertices[b].position,
            self.vertices[c].position,
        ]
    }

    /// Select every vertex and face.
    pub fn select_all(&mut self) {
        self.vertices.iter_mut().for_each(|v| v.selected = true);
        self.faces.iter_mut().for_each(|f| f.selected = true);
    }

    // ==================== Interop ====================

    /// Export as a position list and index-triple list.
    pub fn to_face_vertex(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = self.vertices.iter().map(|v| v.position).collect();
        let triangles = self.faces.iter().map(|f| f.vertices).collect();
        (positions, triangles)
    }

    /// Export as flat `[x, y, z, ...]` positions and `[a, b, c, ...]` indices.
    pub fn to_flat_buffers(&self) -> (Vec<f64>, Vec<u32>) {
        let positions = self
            .vertices
            .par_iter()
            .flat_map_iter(|v| [v.position.x, v.position.y, v.position.z])
            .collect();
        let indices = self
            .faces
            .par_iter()
            .flat_map_iter(|f| f.vertices.map(|i| i as u32))
            .collect();
        (positions, indices)
    }

    // ==================== Geometry ====================

    /// Compute the unit normal of a face (zero for degenerate faces).
    pub fn face_normal(&self, f: usize) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        let n = (p1 - p0).cross(&(p2 - p0));
        let len = n.norm();
        if len > f64::EPSILON {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: usize) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        (0..self.faces.len())
            .into_par_iter()
            .map(|f| self.face_area(f))
            .sum()
    }

    /// Compute the length of the segment between two vertices.
    #[inline]
    pub fn edge_length(&self, a: usize, b: usize) -> f64 {
        (self.vertices[b].position - self.vertices[a].position).norm()
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Mean length over the unique undirected edges.
    ///
    /// Returns 0 for a mesh without faces.
    pub fn average_edge_length(&self) -> f64 {
        let edges: Vec<(usize, usize)> = self.unique_edges().into_iter().collect();
        if edges.is_empty() {
            return 0.0;
        }
        let total: f64 = edges.par_iter().map(|&(a, b)| self.edge_length(a, b)).sum();
        total / edges.len() as f64
    }

    /// Count the unique undirected edges.
    pub fn edge_count(&self) -> usize {
        self.unique_edges().len()
    }

    /// Every face edge once, as `(lower, upper)` endpoint pairs.
    fn unique_edges(&self) -> HashSet<(usize, usize)> {
        let mut edges = HashSet::with_capacity(self.faces.len() * 3 / 2);
        for f in &self.faces {
            let [a, b, c] = f.vertices;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                edges.insert((u.min(v), u.max(v)));
            }
        }
        edges
    }

    // ==================== Transformations ====================

    /// Translate every vertex.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        let offset = Vector3::new(dx, dy, dz);
        self.vertices
            .par_iter_mut()
            .for_each(|v| v.position += offset);
    }

    /// Scale every vertex about the origin, per axis.
    pub fn scale(&mut self, sx: f64, sy: f64, sz: f64) {
        self.vertices.par_iter_mut().for_each(|v| {
            v.position.x *= sx;
            v.position.y *= sy;
            v.position.z *= sz;
        });
    }

    /// Scale every vertex uniformly about the origin.
    pub fn scale_uniform(&mut self, s: f64) {
        self.scale(s, s, s);
    }

    /// Move the bounding box center to the origin.
    pub fn center(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            let c = (min.coords + max.coords) * 0.5;
            self.translate(-c.x, -c.y, -c.z);
        }
    }

    /// Reverse the winding of every face.
    pub fn flip_normals(&mut self) {
        self.faces.par_iter_mut().for_each(|f| f.vertices.swap(1, 2));
        self.adjacency = None;
    }

    // ==================== Removal ====================

    /// Delete the listed vertices and every face that uses one of them.
    pub fn delete_vertices(&mut self, doomed: &[usize]) -> IndexRemap {
        let mut removed_vertices = vec![false; self.vertices.len()];
        for &v in doomed {
            if let Some(slot) = removed_vertices.get_mut(v) {
                *slot = true;
            }
        }
        let removed_faces = vec![false; self.faces.len()];
        self.compact(&removed_vertices, &removed_faces)
    }

    /// Delete the listed faces, then every vertex left without a face.
    pub fn delete_faces(&mut self, doomed: &[usize]) -> IndexRemap {
        let mut removed_faces = vec![false; self.faces.len()];
        for &f in doomed {
            if let Some(slot) = removed_faces.get_mut(f) {
                *slot = true;
            }
        }

        let mut used = vec![false; self.vertices.len()];
        for (f, face) in self.faces.iter().enumerate() {
            if !removed_faces[f] {
                for &v in &face.vertices {
                    used[v] = true;
                }
            }
        }
        let removed_vertices: Vec<bool> = used.iter().map(|&u| !u).collect();
        self.compact(&removed_vertices, &removed_faces)
    }

    /// Delete every vertex not used by any face.
    pub fn remove_unconnected_vertices(&mut self) -> IndexRemap {
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &v in &face.vertices {
                used[v] = true;
            }
        }
        let removed_vertices: Vec<bool> = used.iter().map(|&u| !u).collect();
        let removed_faces = vec![false; self.faces.len()];
        self.compact(&removed_vertices, &removed_faces)
    }

    /// Remove the flagged vertices and faces with a stable compaction.
    ///
    /// A surviving face that references a removed vertex is removed as well.
    /// The adjacency, if present, is remapped; when it cannot be remapped
    /// consistently it is dropped and rebuilt on next use.
    pub fn compact(&mut self, removed_vertices: &[bool], removed_faces: &[bool]) -> IndexRemap {
        let is_removed_vertex = |v: usize| removed_vertices.get(v).copied().unwrap_or(false);
        let is_removed_face = |f: usize| removed_faces.get(f).copied().unwrap_or(false);

        let mut vertex_map = Vec::with_capacity(self.vertices.len());
        let mut next = 0;
        for v in 0..self.vertices.len() {
            if is_removed_vertex(v) {
                vertex_map.push(None);
            } else {
                vertex_map.push(Some(next));
                next += 1;
            }
        }

        let mut face_map = Vec::with_capacity(self.faces.len());
        let mut next = 0;
        for (f, face) in self.faces.iter().enumerate() {
            let dead = is_removed_face(f) || face.vertices.iter().any(|&v| vertex_map[v].is_none());
            if dead {
                face_map.push(None);
            } else {
                face_map.push(Some(next));
                next += 1;
            }
        }

        let remap = IndexRemap {
            vertices: vertex_map,
            faces: face_map,
        };
        if remap.is_identity() {
            return remap;
        }

        let old_vertices = std::mem::take(&mut self.vertices);
        self.vertices = old_vertices
            .into_iter()
            .enumerate()
            .filter(|(v, _)| remap.vertices[*v].is_some())
            .map(|(_, vertex)| vertex)
            .collect();

        let old_faces = std::mem::take(&mut self.faces);
        self.faces = old_faces
            .into_iter()
            .enumerate()
            .filter_map(|(f, mut face)| {
                remap.faces[f]?;
                for v in face.vertices.iter_mut() {
                    *v = remap.vertices[*v]?;
                }
                Some(face)
            })
            .collect();

        self.adjacency = self.adjacency.take().and_then(|adj| adj.remap(&remap));
        remap
    }
}
