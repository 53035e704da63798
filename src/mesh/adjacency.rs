//! Per-vertex triangle fans.
//!
//! For every vertex `v` the adjacency keeps a [`Fan`]: the list of incident
//! faces as `(a, b, face)` records, where `face` is the triangle `(v, a, b)`
//! in counter-clockwise order. After ordering, consecutive records share an
//! endpoint (`entries[i].b == entries[i + 1].a`), so the fan walks the ring of
//! neighbors counter-clockwise. An interior manifold vertex has a closed fan
//! (`last.b == first.a`); a boundary vertex has an open one.
//!
//! Fans are plain `Vec`s indexed by vertex; there are no linked nodes to free.
//! Vertices whose fan cannot be ordered are deselected instead of aborting
//! the build.

use log::{debug, warn};

use super::surface::{Face, IndexRemap, SurfaceMesh};
use crate::error::Status;

/// One incident face of a vertex `v`: the triangle `(v, a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FanEntry {
    /// The neighbor following `v` in the face.
    pub a: usize,
    /// The neighbor following `a` in the face.
    pub b: usize,
    /// Index of the face.
    pub face: usize,
}

/// Shape of an ordered fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanShape {
    /// No incident faces.
    #[default]
    Isolated,
    /// A closed counter-clockwise cycle (interior manifold vertex).
    Closed,
    /// A single counter-clockwise path (boundary vertex).
    Open,
    /// Entries that cannot be chained into one cycle or path.
    Broken,
}

/// The ordered ring of faces around one vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fan {
    entries: Vec<FanEntry>,
    shape: FanShape,
}

impl Fan {
    /// Build an ordered fan from unordered entries.
    pub fn from_entries(mut entries: Vec<FanEntry>) -> Self {
        let shape = order(&mut entries);
        Self { entries, shape }
    }

    /// The entries, in counter-clockwise order unless the fan is broken.
    #[inline]
    pub fn entries(&self) -> &[FanEntry] {
        &self.entries
    }

    /// The shape of the fan.
    #[inline]
    pub fn shape(&self) -> FanShape {
        self.shape
    }

    /// Whether the fan is a closed cycle.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shape == FanShape::Closed
    }

    /// Whether the entries form a single chain (closed or open).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        matches!(self.shape, FanShape::Closed | FanShape::Open)
    }

    /// Number of incident faces.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the vertex has no incident faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Neighboring vertices in fan order (deduplicated for broken fans).
    pub fn neighbors(&self) -> Vec<usize> {
        match self.shape {
            FanShape::Isolated => Vec::new(),
            FanShape::Closed => self.entries.iter().map(|e| e.a).collect(),
            FanShape::Open => {
                let mut out: Vec<usize> = self.entries.iter().map(|e| e.a).collect();
                if let Some(last) = self.entries.last() {
                    out.push(last.b);
                }
                out
            }
            FanShape::Broken => {
                let mut out: Vec<usize> = self.entries.iter().flat_map(|e| [e.a, e.b]).collect();
                out.sort_unstable();
                out.dedup();
                out
            }
        }
    }

    /// Number of distinct neighbors.
    pub fn valence(&self) -> usize {
        match self.shape {
            FanShape::Isolated => 0,
            FanShape::Closed => self.entries.len(),
            FanShape::Open => self.entries.len() + 1,
            FanShape::Broken => self.neighbors().len(),
        }
    }

    /// Whether `w` is a neighbor.
    pub fn has_neighbor(&self, w: usize) -> bool {
        self.entries.iter().any(|e| e.a == w || e.b == w)
    }

    /// Incident face indices.
    pub fn faces(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.face)
    }

    /// Whether two fans describe the same cyclic order, up to rotation.
    ///
    /// Open and broken fans have no rotational freedom; they compare equal
    /// when they hold the same entries.
    pub fn rotation_equivalent(&self, other: &Fan) -> bool {
        if self.shape != other.shape || self.entries.len() != other.entries.len() {
            return false;
        }
        let n = self.entries.len();
        if n == 0 {
            return true;
        }
        match self.shape {
            FanShape::Closed => (0..n).any(|k| {
                (0..n).all(|i| self.entries[(i + k) % n] == other.entries[i])
            }),
            _ => {
                let mut lhs = self.entries.clone();
                let mut rhs = other.entries.clone();
                lhs.sort_unstable();
                rhs.sort_unstable();
                lhs == rhs
            }
        }
    }
}

/// Splice the entries into one chain with a local linear search.
///
/// O(d²) in the fan size, no auxiliary index.
fn order(entries: &mut [FanEntry]) -> FanShape {
    let n = entries.len();
    if n == 0 {
        return FanShape::Isolated;
    }

    // A neighbor appearing twice on the same side means more than two faces
    // meet at an edge, or two fans touch at the vertex.
    for i in 0..n {
        for j in (i + 1)..n {
            if entries[i].a == entries[j].a || entries[i].b == entries[j].b {
                return FanShape::Broken;
            }
        }
    }

    // A boundary path must start at the entry whose `a` closes no other entry.
    let start = (0..n).find(|&i| !entries.iter().any(|e| e.b == entries[i].a));
    if let Some(s) = start {
        entries.swap(0, s);
    }

    for i in 0..n - 1 {
        let want = entries[i].b;
        match ((i + 1)..n).find(|&j| entries[j].a == want) {
            Some(j) => entries.swap(i + 1, j),
            None => return FanShape::Broken,
        }
    }

    if start.is_some() {
        FanShape::Open
    } else if entries[n - 1].b == entries[0].a {
        FanShape::Closed
    } else {
        FanShape::Broken
    }
}

/// Vertex adjacency for a whole mesh: one [`Fan`] per vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    fans: Vec<Fan>,
}

impl Adjacency {
    /// Build and order the fans of every vertex.
    ///
    /// Each face `(a, b, c)` contributes `(b, c)` to `a`, `(c, a)` to `b` and
    /// `(a, b)` to `c`.
    pub fn build(faces: &[Face], num_vertices: usize) -> Self {
        let mut raw: Vec<Vec<FanEntry>> = vec![Vec::new(); num_vertices];
        for (face, f) in faces.iter().enumerate() {
            let [a, b, c] = f.vertices;
            raw[a].push(FanEntry { a: b, b: c, face });
            raw[b].push(FanEntry { a: c, b: a, face });
            raw[c].push(FanEntry { a, b, face });
        }

        Self {
            fans: raw.into_iter().map(Fan::from_entries).collect(),
        }
    }

    /// Number of vertices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.fans.len()
    }

    /// Whether no vertex is covered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fans.is_empty()
    }

    /// The fan of vertex `v`.
    #[inline]
    pub fn fan(&self, v: usize) -> &Fan {
        &self.fans[v]
    }

    /// All fans, indexed by vertex.
    #[inline]
    pub fn fans(&self) -> &[Fan] {
        &self.fans
    }

    /// Rebuild the fan of `v` from a candidate face set.
    ///
    /// Candidates that do not use `v` are ignored; duplicates are collapsed.
    pub(crate) fn refan(&mut self, faces: &[Face], v: usize, candidates: &[usize]) {
        let mut seen: Vec<usize> = Vec::with_capacity(candidates.len());
        let mut entries = Vec::with_capacity(candidates.len());
        for &f in candidates {
            if seen.contains(&f) {
                continue;
            }
            seen.push(f);
            if let Some([_, a, b]) = faces[f].rotated_to(v) {
                entries.push(FanEntry { a, b, face: f });
            }
        }
        self.fans[v] = Fan::from_entries(entries);
    }

    /// Drop the fan of `v`.
    pub(crate) fn clear_fan(&mut self, v: usize) {
        self.fans[v] = Fan::default();
    }

    /// Rewrite every index through a compaction map.
    ///
    /// Returns `None` if a surviving fan refers to a removed vertex or face.
    pub(crate) fn remap(self, remap: &IndexRemap) -> Option<Adjacency> {
        let mut fans = Vec::with_capacity(self.fans.len());
        for (v, fan) in self.fans.into_iter().enumerate() {
            if remap.vertex(v).is_none() {
                continue;
            }
            let mut entries = Vec::with_capacity(fan.entries.len());
            for e in &fan.entries {
                entries.push(FanEntry {
                    a: remap.vertex(e.a)?,
                    b: remap.vertex(e.b)?,
                    face: remap.face(e.face)?,
                });
            }
            fans.push(Fan {
                entries,
                shape: fan.shape,
            });
        }
        Some(Adjacency { fans })
    }

    /// `NonManifoldSkipped` if any fan is open or broken, `Ok` otherwise.
    pub fn status(&self) -> Status {
        let skipped = self
            .fans
            .iter()
            .any(|fan| matches!(fan.shape, FanShape::Open | FanShape::Broken));
        if skipped {
            Status::NonManifoldSkipped
        } else {
            Status::Ok
        }
    }

    /// Check that every entry matches its face and that every face corner is
    /// listed exactly once.
    pub fn is_consistent(&self, faces: &[Face]) -> bool {
        let mut corners = 0;
        for (v, fan) in self.fans.iter().enumerate() {
            for e in &fan.entries {
                match faces.get(e.face).and_then(|f| f.rotated_to(v)) {
                    Some([_, a, b]) if a == e.a && b == e.b => corners += 1,
                    _ => return false,
                }
            }
        }
        corners == faces.len() * 3
    }
}

/// Summary of an adjacency build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyReport {
    /// Vertices removed because no face used them.
    pub pruned_vertices: usize,
    /// Boundary vertices (open fans), deselected.
    pub open_fans: usize,
    /// Vertices whose fan could not be ordered, deselected.
    pub broken_fans: Vec<usize>,
    /// Overall outcome.
    pub status: Status,
}

impl SurfaceMesh {
    /// Build the vertex adjacency from scratch.
    ///
    /// Unconnected vertices are pruned first (which reindexes the faces), so
    /// every surviving vertex has at least one fan entry. Vertices with open
    /// or broken fans are deselected.
    pub fn build_adjacency(&mut self) -> AdjacencyReport {
        let mut report = AdjacencyReport::default();
        self.adjacency = None;

        if self.faces.is_empty() {
            report.status = Status::EmptyInput;
            return report;
        }

        loop {
            let mut touched = vec![false; self.vertices.len()];
            for face in &self.faces {
                for &v in &face.vertices {
                    touched[v] = true;
                }
            }
            if touched.iter().all(|&t| t) {
                break;
            }
            let remap = self.remove_unconnected_vertices();
            report.pruned_vertices += remap.removed_vertices();
        }
        if report.pruned_vertices > 0 {
            debug!("pruned {} unconnected vertices", report.pruned_vertices);
        }

        let adjacency = Adjacency::build(&self.faces, self.vertices.len());
        for (v, fan) in adjacency.fans.iter().enumerate() {
            match fan.shape {
                FanShape::Open => {
                    report.open_fans += 1;
                    self.vertices[v].selected = false;
                }
                FanShape::Broken => {
                    report.broken_fans.push(v);
                    self.vertices[v].selected = false;
                }
                FanShape::Closed | FanShape::Isolated => {}
            }
        }

        if !report.broken_fans.is_empty() {
            warn!(
                "{} vertices have non-manifold neighborhoods and were deselected",
                report.broken_fans.len()
            );
        }
        if report.open_fans > 0 || !report.broken_fans.is_empty() {
            report.status = Status::NonManifoldSkipped;
        }

        self.adjacency = Some(adjacency);
        report
    }

    /// Build the adjacency unless it is already present.
    ///
    /// An existing adjacency reports the status of its current fans, so a
    /// boundary or non-manifold mesh is flagged on every call.
    pub fn ensure_adjacency(&mut self) -> Status {
        match &self.adjacency {
            Some(adjacency) => adjacency.status(),
            None => self.build_adjacency().status,
        }
    }

    /// Release the adjacency.
    pub fn clear_adjacency(&mut self) {
        self.adjacency = None;
    }

    /// The fan of `v`, if the adjacency is built.
    #[inline]
    pub fn fan(&self, v: usize) -> Option<&Fan> {
        self.adjacency.as_ref().map(|adj| adj.fan(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use crate::mesh::Vertex;

    fn entry(a: usize, b: usize, face: usize) -> FanEntry {
        FanEntry { a, b, face }
    }

    #[test]
    fn test_order_closed_fan() {
        let fan = Fan::from_entries(vec![entry(3, 1, 2), entry(1, 2, 0), entry(2, 3, 1)]);
        assert_eq!(fan.shape(), FanShape::Closed);
        for w in fan.entries().windows(2) {
            assert_eq!(w[0].b, w[1].a);
        }
        assert_eq!(fan.valence(), 3);
    }

    #[test]
    fn test_order_open_fan_starts_at_boundary() {
        let fan = Fan::from_entries(vec![entry(2, 3, 1), entry(1, 2, 0)]);
        assert_eq!(fan.shape(), FanShape::Open);
        assert_eq!(fan.entries()[0], entry(1, 2, 0));
        assert_eq!(fan.neighbors(), vec![1, 2, 3]);
        assert_eq!(fan.valence(), 3);
    }

    #[test]
    fn test_order_bowtie_is_broken() {
        // Two separate closed triangles fans touching at the vertex.
        let fan = Fan::from_entries(vec![
            entry(1, 2, 0),
            entry(2, 3, 1),
            entry(3, 1, 2),
            entry(4, 5, 3),
            entry(5, 6, 4),
            entry(6, 4, 5),
        ]);
        assert_eq!(fan.shape(), FanShape::Broken);
    }

    #[test]
    fn test_build_closed_mesh() {
        let mut mesh = primitives::icosahedron();
        let report = mesh.build_adjacency();

        assert_eq!(report.status, Status::Ok);
        assert_eq!(report.pruned_vertices, 0);
        let adj = mesh.adjacency().unwrap();
        assert!(adj.is_consistent(mesh.faces()));
        for fan in adj.fans() {
            assert!(fan.is_closed());
            assert_eq!(fan.valence(), 5);
        }
    }

    #[test]
    fn test_build_open_mesh_deselects_boundary() {
        let mut mesh = primitives::grid(2);
        let report = mesh.build_adjacency();

        assert_eq!(report.status, Status::NonManifoldSkipped);
        assert_eq!(report.open_fans, 8);
        assert!(report.broken_fans.is_empty());
        // Only the center vertex is interior.
        for (v, vertex) in mesh.vertices().iter().enumerate() {
            assert_eq!(vertex.selected, v == 4, "vertex {v}");
        }
    }

    #[test]
    fn test_ensure_reports_existing_boundary() {
        let mut mesh = primitives::grid(3);
        assert_eq!(mesh.ensure_adjacency(), Status::NonManifoldSkipped);
        assert!(mesh.adjacency().is_some());
        assert_eq!(mesh.ensure_adjacency(), Status::NonManifoldSkipped);

        let mut closed = primitives::icosahedron();
        closed.build_adjacency();
        assert_eq!(closed.ensure_adjacency(), Status::Ok);
    }

    #[test]
    fn test_build_prunes_unconnected() {
        let mut mesh = primitives::tetrahedron();
        mesh.vertices.insert(0, Vertex::from_coords(5.0, 5.0, 5.0));
        for face in mesh.faces.iter_mut() {
            for v in face.vertices.iter_mut() {
                *v += 1;
            }
        }

        let report = mesh.build_adjacency();
        assert_eq!(report.pruned_vertices, 1);
        assert_eq!(mesh.num_vertices(), 4);
        assert!(mesh.adjacency().unwrap().is_consistent(mesh.faces()));
    }

    #[test]
    fn test_build_empty_faces() {
        let mut mesh = SurfaceMesh::with_size(3, 0);
        let report = mesh.build_adjacency();
        assert_eq!(report.status, Status::EmptyInput);
        assert!(mesh.adjacency().is_none());
    }

    #[test]
    fn test_rebuild_is_rotation_equivalent() {
        let mut mesh = primitives::icosphere(1);
        mesh.build_adjacency();
        let first = mesh.adjacency().unwrap().clone();
        mesh.build_adjacency();
        let second = mesh.adjacency().unwrap();

        for (lhs, rhs) in first.fans().iter().zip(second.fans()) {
            assert!(lhs.rotation_equivalent(rhs));
        }
    }

    #[test]
    fn test_refan_after_face_edit() {
        let mut mesh = primitives::flat_quad();
        mesh.build_adjacency();

        // Flip the diagonal 0-2 to 1-3 by hand.
        mesh.faces[0].vertices = [0, 1, 3];
        mesh.faces[1].vertices = [1, 2, 3];
        let faces = mesh.faces.clone();
        let adj = mesh.adjacency.as_mut().unwrap();
        for v in 0..4 {
            adj.refan(&faces, v, &[0, 1]);
        }
        assert!(adj.is_consistent(&faces));
        assert_eq!(adj.fan(0).len(), 1);
        assert_eq!(adj.fan(1).len(), 2);
    }

    #[test]
    fn test_remap_after_compaction() {
        let mut mesh = primitives::icosahedron();
        mesh.build_adjacency();
        // Removing nothing keeps the adjacency intact.
        let remap = mesh.compact(&[], &[]);
        assert!(remap.is_identity());
        assert!(mesh.adjacency().is_some());

        // Removing a vertex leaves dangling fan entries, so it is dropped.
        mesh.delete_vertices(&[0]);
        assert!(mesh.adjacency().is_none());
    }
}
