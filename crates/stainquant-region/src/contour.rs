//! Outline tracing and shape measures
//!
//! The outer outline of a component is followed along pixel edges
//! ("cracks") with the component on the right-hand side, starting at the
//! top-left corner of its first pixel. The resulting polygon keeps only
//! the vertices where the direction changes.
//!
//! Directions: 0 = east, 1 = south, 2 = west, 3 = north. Vertex `(vx, vy)`
//! is the top-left corner of pixel `(vx, vy)`.

use crate::conncomp::{Component, Connectivity, LabelMap};
use std::f64::consts::PI;

const STEP: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Pixels ahead of vertex `(vx, vy)` when moving in direction `d`:
/// (left, right) of the edge that would be traversed next.
fn ahead(vx: i64, vy: i64, d: usize) -> ((i64, i64), (i64, i64)) {
    match d {
        0 => ((vx, vy - 1), (vx, vy)),
        1 => ((vx, vy), (vx - 1, vy)),
        2 => ((vx - 1, vy), (vx - 1, vy - 1)),
        _ => ((vx - 1, vy - 1), (vx, vy - 1)),
    }
}

/// Trace the outer outline of `component` and return its polygon vertices.
///
/// Holes are ignored. With 8-connectivity the outline passes through
/// diagonal contacts; with 4-connectivity it turns away from them.
pub fn trace_outline(
    labels: &LabelMap,
    component: &Component,
    connectivity: Connectivity,
) -> Vec<(i64, i64)> {
    let label = component.label;
    let inside = |p: (i64, i64)| labels.get(p.0, p.1) == label;

    let start = (component.first.0 as i64, component.first.1 as i64);
    let mut vertices = vec![start];
    let (mut vx, mut vy) = start;
    let mut d = 0usize;
    // Each pixel contributes at most four edges to the outline
    let max_steps = 4 * component.area as usize + 4;

    for _ in 0..max_steps {
        let (l, r) = ahead(vx, vy, d);
        let nd = match (inside(l), inside(r)) {
            (true, true) => (d + 3) % 4,
            (false, true) => d,
            (true, false) if connectivity == Connectivity::Eight => (d + 3) % 4,
            _ => (d + 1) % 4,
        };
        if nd != d && (vx, vy) != start {
            vertices.push((vx, vy));
        }
        d = nd;
        vx += STEP[d].0;
        vy += STEP[d].1;
        if (vx, vy) == start {
            break;
        }
    }
    vertices
}

/// Perimeter of a traced polygon with corner correction.
///
/// The raw length `Σ|dx| + Σ|dy|` overestimates diagonal boundaries, so
/// every counted corner shortens the result by `2 - √2`. Corners are
/// counted on alternating unit-length sides, and always after a longer
/// side.
pub fn traced_perimeter(vertices: &[(i64, i64)]) -> f64 {
    let n = vertices.len();
    if n < 2 {
        return 0.0;
    }
    let mut sum_dx = 0i64;
    let mut sum_dy = 0i64;
    let mut corners = 0u64;

    let (mut dx1, mut dy1) = (
        vertices[0].0 - vertices[n - 1].0,
        vertices[0].1 - vertices[n - 1].1,
    );
    let mut side1 = dx1.abs() + dy1.abs();
    let mut corner = false;
    for i in 0..n {
        let next = (i + 1) % n;
        let dx2 = vertices[next].0 - vertices[i].0;
        let dy2 = vertices[next].1 - vertices[i].1;
        sum_dx += dx1.abs();
        sum_dy += dy1.abs();
        let side2 = dx2.abs() + dy2.abs();
        if side1 > 1 || !corner {
            corner = true;
            corners += 1;
        } else {
            corner = false;
        }
        dx1 = dx2;
        dy1 = dy2;
        side1 = side2;
    }
    (sum_dx + sum_dy) as f64 - corners as f64 * (2.0 - 2f64.sqrt())
}

/// Circularity `4π·area / perimeter²`, clamped to 1.0.
///
/// A zero perimeter yields 0.
pub fn circularity(area: u64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    (4.0 * PI * area as f64 / (perimeter * perimeter)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conncomp::label_components;
    use stainquant_core::{Pix, PixelDepth};

    fn labelled(rows: &[&str], connectivity: Connectivity) -> LabelMap {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        let mut pm = Pix::new(w, h, PixelDepth::Bit1).unwrap().to_mut();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    pm.set_pixel(x as u32, y as u32, 1).unwrap();
                }
            }
        }
        label_components(&pm.into(), connectivity).unwrap()
    }

    #[test]
    fn test_single_pixel() {
        let lm = labelled(&["...", ".#.", "..."], Connectivity::Eight);
        let poly = trace_outline(&lm, &lm.components()[0], Connectivity::Eight);
        assert_eq!(poly, vec![(1, 1), (2, 1), (2, 2), (1, 2)]);
        let p = traced_perimeter(&poly);
        assert!((p - (4.0 - 2.0 * (2.0 - 2f64.sqrt()))).abs() < 1e-12);
        assert_eq!(circularity(1, p), 1.0);
    }

    #[test]
    fn test_rectangle() {
        let lm = labelled(&["....", ".###", ".###"], Connectivity::Eight);
        let poly = trace_outline(&lm, &lm.components()[0], Connectivity::Eight);
        assert_eq!(poly, vec![(1, 1), (4, 1), (4, 3), (1, 3)]);
        // Sides 3, 2, 3, 2: every vertex follows a long side
        let p = traced_perimeter(&poly);
        assert!((p - (10.0 - 4.0 * (2.0 - 2f64.sqrt()))).abs() < 1e-12);
    }

    #[test]
    fn test_l_shape() {
        let lm = labelled(&["#.", "##"], Connectivity::Four);
        let poly = trace_outline(&lm, &lm.components()[0], Connectivity::Four);
        assert_eq!(poly, vec![(0, 0), (1, 0), (1, 1), (2, 1), (2, 2), (0, 2)]);
    }

    #[test]
    fn test_diagonal_contact_eight() {
        let lm = labelled(&["#.", ".#"], Connectivity::Eight);
        assert_eq!(lm.len(), 1);
        let poly = trace_outline(&lm, &lm.components()[0], Connectivity::Eight);
        // Outline crosses the shared corner twice and still closes
        assert_eq!(poly.first(), Some(&(0, 0)));
        assert_eq!(poly.len(), 8);
        let p = traced_perimeter(&poly);
        assert!(p > 0.0 && p < 8.0);
    }

    #[test]
    fn test_circularity_bounds() {
        assert_eq!(circularity(10, 0.0), 0.0);
        let c = circularity(100, 60.0);
        assert!(c > 0.0 && c < 1.0);
    }
}
