//! Uniform 1-to-4 midpoint refinement.

use nalgebra::Point3;

use crate::algo::Progress;
use crate::mesh::{Face, SurfaceMesh, Vertex};

/// Unique edges bucketed by their lower endpoint.
///
/// `offsets[v]..offsets[v + 1]` is the slot range of vertex `v`; the first
/// `filled[v]` slots hold the upper endpoints seen so far, with the index of
/// the midpoint vertex created for each.
struct EdgeTable {
    offsets: Vec<usize>,
    filled: Vec<usize>,
    upper: Vec<usize>,
    midpoint: Vec<usize>,
    count: usize,
}

impl EdgeTable {
    fn build(faces: &[Face], num_vertices: usize) -> Self {
        // Every face edge counted once at its lower end; duplicates reserve
        // room they never use.
        let mut offsets = vec![0usize; num_vertices + 1];
        for face in faces {
            let [a, b, c] = face.vertices;
            for (u, w) in [(a, b), (b, c), (c, a)] {
                offsets[u.min(w) + 1] += 1;
            }
        }
        for v in 0..num_vertices {
            offsets[v + 1] += offsets[v];
        }

        let slots = offsets[num_vertices];
        let mut table = Self {
            offsets,
            filled: vec![0; num_vertices],
            upper: vec![0; slots],
            midpoint: vec![0; slots],
            count: 0,
        };
        for face in faces {
            let [a, b, c] = face.vertices;
            for (u, w) in [(a, b), (b, c), (c, a)] {
                table.insert(u.min(w), u.max(w), num_vertices);
            }
        }
        table
    }

    fn insert(&mut self, lo: usize, hi: usize, first_midpoint: usize) {
        let start = self.offsets[lo];
        let end = start + self.filled[lo];
        if self.upper[start..end].contains(&hi) {
            return;
        }
        self.upper[end] = hi;
        self.midpoint[end] = first_midpoint + self.count;
        self.filled[lo] += 1;
        self.count += 1;
    }

    fn get(&self, u: usize, w: usize) -> usize {
        let (lo, hi) = (u.min(w), u.max(w));
        let start = self.offsets[lo];
        let end = start + self.filled[lo];
        let slot = (start..end).find(|&s| self.upper[s] == hi).unwrap_or(start);
        self.midpoint[slot]
    }

    fn edges(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.filled.len()).flat_map(move |lo| {
            let start = self.offsets[lo];
            (start..start + self.filled[lo]).map(move |s| (lo, self.upper[s], self.midpoint[s]))
        })
    }
}

/// Split every face into four through its edge midpoints.
///
/// A mesh with `V` vertices, `E` edges and `F` faces becomes one with
/// `V + E` vertices and `4F` faces. Original vertices keep their index and
/// position; midpoints follow in edge order. Each face `(a, b, c)` becomes the
/// inner face `(ab, bc, ca)` and the corner faces `(a, ab, ca)`,
/// `(b, bc, ab)` and `(c, ca, bc)`, all inheriting its marker.
///
/// The source mesh is left untouched; the result has its adjacency built.
pub fn refine(mesh: &SurfaceMesh) -> SurfaceMesh {
    let num_vertices = mesh.num_vertices();
    let table = EdgeTable::build(mesh.faces(), num_vertices);

    let mut vertices = Vec::with_capacity(num_vertices + table.count);
    vertices.extend_from_slice(mesh.vertices());
    vertices.resize(num_vertices + table.count, Vertex::default());
    for (lo, hi, m) in table.edges() {
        let (p, q) = (mesh.vertex(lo), mesh.vertex(hi));
        let position = Point3::from((p.position.coords + q.position.coords) * 0.5);
        let mut vertex = Vertex::new(position);
        vertex.marker = if p.marker == q.marker { p.marker } else { 0 };
        vertices[m] = vertex;
    }

    let mut faces = Vec::with_capacity(4 * mesh.num_faces());
    for face in mesh.faces() {
        let [a, b, c] = face.vertices;
        let ab = table.get(a, b);
        let bc = table.get(b, c);
        let ca = table.get(c, a);
        for vertices in [[ab, bc, ca], [a, ab, ca], [b, bc, ab], [c, ca, bc]] {
            faces.push(Face {
                vertices,
                ..*face
            });
        }
    }

    let mut refined = SurfaceMesh::from_parts(vertices, faces, mesh.domain.clone());
    refined.build_adjacency();
    refined
}

/// Refine `iterations` times with progress reporting.
pub fn refine_with_progress(mesh: &SurfaceMesh, iterations: usize, progress: &Progress) -> SurfaceMesh {
    let mut current = mesh.clone();
    for i in 0..iterations {
        progress.report(i, iterations, "Refining");
        current = refine(&current);
    }
    progress.report(iterations, iterations, "Refining");
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_flat_quad_counts() {
        let mesh = primitives::flat_quad();
        let refined = refine(&mesh);

        // 4 vertices, 5 edges, 2 faces.
        assert_eq!(refined.num_vertices(), 9);
        assert_eq!(refined.num_faces(), 8);
        assert!(refined.adjacency().unwrap().is_consistent(refined.faces()));
    }

    #[test]
    fn test_original_vertices_unchanged() {
        let mesh = primitives::tetrahedron();
        let refined = refine(&mesh);
        for v in 0..mesh.num_vertices() {
            assert_eq!(refined.position(v), mesh.position(v));
        }
        assert_eq!(refined.num_vertices(), 4 + 6);
        assert_eq!(refined.num_faces(), 16);
    }

    #[test]
    fn test_shared_midpoint() {
        let mesh = primitives::flat_quad();
        let refined = refine(&mesh);
        // The diagonal 0-2 gets one midpoint used by both halves.
        let mid = (0..refined.num_vertices())
            .find(|&v| *refined.position(v) == Point3::new(0.0, 0.0, 0.0))
            .unwrap();
        let users = refined.faces().iter().filter(|f| f.contains(mid)).count();
        assert_eq!(users, 6);
    }

    #[test]
    fn test_markers() {
        let mut mesh = primitives::flat_quad();
        for v in mesh.vertices_mut() {
            v.marker = 7;
        }
        mesh.vertices_mut()[1].marker = 3;
        mesh.faces_mut()[1].marker = 42;

        let refined = refine(&mesh);
        let markers: Vec<i32> = refined.vertices()[4..].iter().map(|v| v.marker).collect();
        assert_eq!(markers.iter().filter(|&&m| m == 7).count(), 3);
        assert_eq!(markers.iter().filter(|&&m| m == 0).count(), 2);
        assert_eq!(refined.faces().iter().filter(|f| f.marker == 42).count(), 4);
    }

    #[test]
    fn test_orientation_is_kept() {
        let refined = refine(&primitives::grid(2));
        for f in 0..refined.num_faces() {
            assert!(refined.face_normal(f).z > 0.0);
        }
    }

    #[test]
    fn test_repeated_with_progress() {
        let mesh = primitives::icosahedron();
        let refined = refine_with_progress(&mesh, 2, &Progress::none());
        assert_eq!(refined.num_vertices(), 162);
        assert_eq!(refined.num_faces(), 320);
        assert_eq!(mesh.num_vertices(), 12);
    }
}
