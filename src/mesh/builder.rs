//! Mesh construction from externally supplied geometry.
//!
//! Surfaces arrive either as a position list with index triples, or as the
//! flat buffers a renderer or exporter hands over. Both paths validate the
//! indices before anything is built.

use nalgebra::Point3;
use rayon::prelude::*;

use super::surface::{Face, SurfaceMesh, Vertex};
use crate::error::{MeshError, Result};

fn validate(num_vertices: usize, triangles: &[[usize; 3]]) -> Result<()> {
    for (fi, face) in triangles.iter().enumerate() {
        for &vi in face {
            if vi >= num_vertices {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }
    Ok(())
}

impl SurfaceMesh {
    /// Build a mesh from vertex positions and triangle index triples.
    ///
    /// The adjacency is not built yet; it is created on first use or with
    /// [`build_adjacency`](SurfaceMesh::build_adjacency).
    ///
    /// # Example
    /// ```
    /// use omesh::mesh::SurfaceMesh;
    /// use nalgebra::Point3;
    ///
    /// let positions = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let mesh = SurfaceMesh::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
    /// assert_eq!(mesh.num_vertices(), 3);
    /// assert_eq!(mesh.num_faces(), 1);
    /// ```
    pub fn from_triangles(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        validate(positions.len(), triangles)?;

        let mut mesh = SurfaceMesh::with_size(positions.len(), triangles.len());
        mesh.vertices
            .par_iter_mut()
            .zip(positions.par_iter())
            .for_each(|(v, &p)| *v = Vertex::new(p));
        mesh.faces
            .par_iter_mut()
            .zip(triangles.par_iter())
            .for_each(|(f, &t)| *f = Face::new(t));
        Ok(mesh)
    }

    /// Build a mesh from flat `[x, y, z, ...]` positions and `[a, b, c, ...]`
    /// triangle indices.
    pub fn from_buffers(positions: &[f64], indices: &[u32]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::InvalidBuffer {
                buffer: "position",
                len: positions.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::InvalidBuffer {
                buffer: "index",
                len: indices.len(),
            });
        }

        let points: Vec<Point3<f64>> = positions
            .par_chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let triangles: Vec<[usize; 3]> = indices
            .par_chunks_exact(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
            .collect();

        Self::from_triangles(&points, &triangles)
    }
}
