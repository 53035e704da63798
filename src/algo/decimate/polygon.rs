//! Triangulation of the hole left by a removed vertex.

/// Triangulate a star-shaped boundary cycle.
///
/// `ring` lists the polygon's vertices counter-clockwise. The polygon is split
/// repeatedly along the diagonal joining the two non-adjacent corners of
/// lowest valence, skipping diagonals for which `has_edge` reports an existing
/// edge. Valences are counted locally, so each new diagonal raises the valence
/// of both its ends for later splits.
///
/// Work is kept on an explicit stack of sub-polygons. Returns `ring.len() - 2`
/// counter-clockwise triangles, or `None` if some sub-polygon admits no
/// diagonal.
pub fn subdivide_polygon<V, E>(ring: &[usize], valence: V, has_edge: E) -> Option<Vec<[usize; 3]>>
where
    V: Fn(usize) -> usize,
    E: Fn(usize, usize) -> bool,
{
    let d = ring.len();
    if d < 3 {
        return None;
    }

    let mut local: Vec<usize> = ring.iter().map(|&w| valence(w)).collect();
    let mut diagonals: Vec<(usize, usize)> = Vec::with_capacity(d - 3);
    let mut triangles = Vec::with_capacity(d - 2);

    // Sub-polygons hold positions into `ring`, in cyclic order.
    let mut stack: Vec<Vec<usize>> = vec![(0..d).collect()];
    while let Some(poly) = stack.pop() {
        let n = poly.len();
        if n == 3 {
            triangles.push([ring[poly[0]], ring[poly[1]], ring[poly[2]]]);
            continue;
        }

        let mut best: Option<(usize, usize, usize)> = None;
        for i in 0..n {
            // Skip the neighbor and, for i = 0, the wrap-around neighbor.
            let last = if i == 0 { n - 1 } else { n };
            for j in (i + 2)..last {
                let (pi, pj) = (poly[i], poly[j]);
                let (a, b) = (ring[pi], ring[pj]);
                if has_edge(a, b) || diagonals.contains(&(pi.min(pj), pi.max(pj))) {
                    continue;
                }
                let cost = local[pi] + local[pj];
                if best.map_or(true, |(c, _, _)| cost < c) {
                    best = Some((cost, i, j));
                }
            }
        }

        let (_, i, j) = best?;
        let (pi, pj) = (poly[i], poly[j]);
        local[pi] += 1;
        local[pj] += 1;
        diagonals.push((pi.min(pj), pi.max(pj)));

        let first: Vec<usize> = poly[i..=j].to_vec();
        let second: Vec<usize> = poly[j..].iter().chain(&poly[..=i]).copied().collect();
        stack.push(first);
        stack.push(second);
    }

    Some(triangles)
}
