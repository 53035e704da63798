//! Triangle angle quality statistics.
//!
//! The smoother's stopping rule and the decimator's reports are both phrased
//! in terms of the smallest and largest interior angle of the mesh. Angles at
//! a corner with a zero-length edge are undefined; they are counted as
//! degenerate and never enter the min/max.

use nalgebra::Point3;
use rayon::prelude::*;

use crate::mesh::SurfaceMesh;

/// Number of 10° histogram bins covering [0°, 180°].
pub const HISTOGRAM_BINS: usize = 18;

const MIN_EDGE: f64 = 1e-12;

/// Global angle statistics over every corner of every face.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleStats {
    /// Smallest angle in degrees (180 if no angle was measured).
    pub min: f64,
    /// Largest angle in degrees (0 if no angle was measured).
    pub max: f64,
    /// Number of angles strictly below the lower threshold.
    pub below: usize,
    /// Number of angles strictly above the upper threshold.
    pub above: usize,
    /// Counts per 10° bin.
    pub histogram: [usize; HISTOGRAM_BINS],
    /// Number of angles measured.
    pub count: usize,
    /// Number of undefined angles skipped.
    pub degenerate: usize,
}

impl Default for AngleStats {
    fn default() -> Self {
        Self {
            min: 180.0,
            max: 0.0,
            below: 0,
            above: 0,
            histogram: [0; HISTOGRAM_BINS],
            count: 0,
            degenerate: 0,
        }
    }
}

impl AngleStats {
    fn record(&mut self, angle: Option<f64>, min_threshold: f64, max_threshold: f64) {
        let Some(angle) = angle else {
            self.degenerate += 1;
            return;
        };
        self.min = self.min.min(angle);
        self.max = self.max.max(angle);
        if angle < min_threshold {
            self.below += 1;
        }
        if angle > max_threshold {
            self.above += 1;
        }
        let bin = ((angle / 10.0) as usize).min(HISTOGRAM_BINS - 1);
        self.histogram[bin] += 1;
        self.count += 1;
    }

    fn merge(mut self, other: AngleStats) -> AngleStats {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.below += other.below;
        self.above += other.above;
        for (lhs, rhs) in self.histogram.iter_mut().zip(other.histogram) {
            *lhs += rhs;
        }
        self.count += other.count;
        self.degenerate += other.degenerate;
        self
    }

    /// Whether every measured angle lies within `(min_angle, max_angle)`.
    pub fn within(&self, min_angle: f64, max_angle: f64) -> bool {
        self.count > 0 && self.min > min_angle && self.max < max_angle
    }
}

/// Interior angle at `apex` in degrees, `None` if an adjacent edge is degenerate.
pub fn corner_angle(apex: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<f64> {
    let u = b - apex;
    let w = c - apex;
    let lu = u.norm();
    let lw = w.norm();
    if lu < MIN_EDGE || lw < MIN_EDGE {
        return None;
    }
    let cos = (u.dot(&w) / (lu * lw)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// The three interior angles of a triangle, in degrees.
pub fn face_angles(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> [Option<f64>; 3] {
    [
        corner_angle(p0, p1, p2),
        corner_angle(p1, p2, p0),
        corner_angle(p2, p0, p1),
    ]
}

/// Smallest defined angle of a triangle, or 0 when all are undefined.
pub fn triangle_min_angle(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    face_angles(p0, p1, p2)
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<f64>, a| Some(acc.map_or(a, |m| m.min(a))))
        .unwrap_or(0.0)
}

/// Smallest angle over a set of faces (180 for an empty set).
pub fn min_angle_of_faces(mesh: &SurfaceMesh, faces: impl IntoIterator<Item = usize>) -> f64 {
    faces
        .into_iter()
        .map(|f| {
            let [p0, p1, p2] = mesh.face_positions(f);
            triangle_min_angle(&p0, &p1, &p2)
        })
        .fold(180.0, f64::min)
}

/// Compute global angle statistics.
///
/// Angles below `min_threshold` and above `max_threshold` (degrees) are
/// counted separately.
pub fn angle_statistics(mesh: &SurfaceMesh, min_threshold: f64, max_threshold: f64) -> AngleStats {
    (0..mesh.num_faces())
        .into_par_iter()
        .fold(AngleStats::default, |mut stats, f| {
            let [p0, p1, p2] = mesh.face_positions(f);
            for angle in face_angles(&p0, &p1, &p2) {
                stats.record(angle, min_threshold, max_threshold);
            }
            stats
        })
        .reduce(AngleStats::default, AngleStats::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_equilateral_angles() {
        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(0.5, 3.0_f64.sqrt() / 2.0, 0.0);
        for a in face_angles(&p0, &p1, &p2) {
            assert!((a.unwrap() - 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_edge_is_excluded() {
        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(1.0, 0.0, 0.0);
        let angles = face_angles(&p0, &p1, &p2);
        assert!(angles[0].is_none());
        assert!(angles[1].is_none());
        assert!(angles[2].is_some());
        assert!(!angles[2].unwrap().is_nan());
    }

    #[test]
    fn test_grid_statistics() {
        let mesh = primitives::grid(2);
        let stats = angle_statistics(&mesh, 50.0, 80.0);

        assert_eq!(stats.count, 24);
        assert_eq!(stats.degenerate, 0);
        assert!((stats.min - 45.0).abs() < 1e-9);
        assert!((stats.max - 90.0).abs() < 1e-9);
        assert_eq!(stats.below + stats.above, 24);
        assert_eq!(stats.below, 16);
        assert_eq!(stats.above, 8);
        assert_eq!(stats.histogram.iter().sum::<usize>(), 24);
        assert_eq!(stats.histogram[4], 16);
        // Right angles land on the 80-90 / 90-100 bin edge.
        assert_eq!(stats.histogram[8] + stats.histogram[9], 8);
    }

    #[test]
    fn test_statistics_with_degenerate_face() {
        let mut mesh = primitives::grid(1);
        let p = *mesh.position(0);
        mesh.set_position(1, p);
        let stats = angle_statistics(&mesh, 30.0, 120.0);
        assert_eq!(stats.degenerate, 2);
        assert!(stats.min.is_finite());
        assert!(stats.max.is_finite());
    }

    #[test]
    fn test_within() {
        let mesh = primitives::icosahedron();
        let stats = angle_statistics(&mesh, 30.0, 90.0);
        assert!(stats.within(59.0, 61.0));
        assert!(!stats.within(60.5, 61.0));
        assert!(!AngleStats::default().within(0.0, 180.0));
    }
}
