//! Static 2D spatial index for cursor picking
//!
//! Bulk-built once per dataset from the scaled node positions and queried
//! read-only afterwards. Reflecting a changed dataset means rebuilding the
//! whole index; there is no incremental update path.

use glam::Vec2;

use crate::constants::pick;

/// Axis-aligned bounding box used for range queries.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Uniform-grid point index over a fixed set of positions.
pub struct SpatialIndex {
    origin: Vec2,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
    positions: Vec<Vec2>,
}

impl SpatialIndex {
    /// Bulk-loads the index from node positions. Cell size is chosen so a
    /// typical cell holds a handful of points.
    pub fn build(positions: &[[f32; 2]]) -> Self {
        let pts: Vec<Vec2> = positions.iter().map(|p| Vec2::new(p[0], p[1])).collect();

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in &pts {
            min = min.min(*p);
            max = max.max(*p);
        }
        if pts.is_empty() {
            min = Vec2::ZERO;
            max = Vec2::ZERO;
        }

        let extent = (max - min).max(Vec2::splat(1.0));
        let n = pts.len().max(1) as f32;
        let cell_size = ((extent.x * extent.y / n).sqrt()).max(1.0);
        let cols = ((extent.x / cell_size).ceil() as usize).max(1);
        let rows = ((extent.y / cell_size).ceil() as usize).max(1);

        let mut cells = vec![Vec::new(); cols * rows];
        for (i, p) in pts.iter().enumerate() {
            let (cx, cy) = Self::cell_of(*p, min, cell_size, cols, rows);
            cells[cy * cols + cx].push(i as u32);
        }

        Self {
            origin: min,
            cell_size,
            cols,
            rows,
            cells,
            positions: pts,
        }
    }

    fn cell_of(p: Vec2, origin: Vec2, cell_size: f32, cols: usize, rows: usize) -> (usize, usize) {
        let cx = (((p.x - origin.x) / cell_size) as usize).min(cols - 1);
        let cy = (((p.y - origin.y) / cell_size) as usize).min(rows - 1);
        (cx, cy)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned range query: indices of all points inside `bbox`.
    pub fn query(&self, bbox: Aabb) -> Vec<usize> {
        if self.positions.is_empty() {
            return Vec::new();
        }
        let (cx0, cy0) = Self::cell_of(bbox.min, self.origin, self.cell_size, self.cols, self.rows);
        let (cx1, cy1) = Self::cell_of(bbox.max, self.origin, self.cell_size, self.cols, self.rows);

        let mut hits = Vec::new();
        for cy in cy0..=cy1 {
            for cx in cx0..=cx1 {
                for &i in &self.cells[cy * self.cols + cx] {
                    if bbox.contains(self.positions[i as usize]) {
                        hits.push(i as usize);
                    }
                }
            }
        }
        hits
    }

    /// Resolves the cursor's world position to the nearest node index.
    ///
    /// Two stages: a bounding-box prune through the grid, then an exact
    /// minimum-distance pass over the candidates. Candidates farther than the
    /// search radius are rejected, so the result is `None` over empty space.
    pub fn raycast(&self, cursor: Vec2, zoom: f32, device_pixel_ratio: f32) -> Option<usize> {
        let radius = pick_radius(zoom, device_pixel_ratio);
        let candidates = self.query(Aabb::new(
            cursor - Vec2::splat(radius),
            cursor + Vec2::splat(radius),
        ));

        let mut best: Option<(usize, f32)> = None;
        for i in candidates {
            let d = self.positions[i].distance(cursor);
            if d > radius {
                continue;
            }
            match best {
                Some((_, bd)) if bd <= d => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Search radius in world units: a fixed pixel base with logarithmic zoom
/// compensation, scaled by the device pixel ratio.
pub fn pick_radius(zoom: f32, device_pixel_ratio: f32) -> f32 {
    pick::BASE_RADIUS * (zoom.min(1.0) + zoom.max(1.0).log2()) * device_pixel_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_positions() -> Vec<[f32; 2]> {
        let mut out = Vec::new();
        for y in 0..10 {
            for x in 0..10 {
                out.push([x as f32 * 50.0, y as f32 * 50.0]);
            }
        }
        out
    }

    #[test]
    fn test_range_query() {
        let index = SpatialIndex::build(&grid_positions());
        let hits = index.query(Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(51.0, 51.0)));
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_raycast_exact_position() {
        let index = SpatialIndex::build(&grid_positions());
        // A point at the cursor's exact position is always returned.
        assert_eq!(index.raycast(Vec2::new(100.0, 150.0), 1.0, 1.0), Some(32));
    }

    #[test]
    fn test_raycast_idempotent() {
        let index = SpatialIndex::build(&grid_positions());
        let cursor = Vec2::new(102.0, 151.0);
        let first = index.raycast(cursor, 1.0, 1.0);
        for _ in 0..5 {
            assert_eq!(index.raycast(cursor, 1.0, 1.0), first);
        }
    }

    #[test]
    fn test_raycast_respects_radius() {
        let index = SpatialIndex::build(&[[0.0, 0.0]]);
        let radius = pick_radius(1.0, 1.0);
        // Just outside the search radius: never returned.
        assert_eq!(index.raycast(Vec2::new(radius + 0.5, 0.0), 1.0, 1.0), None);
        // Inside the radius: returned.
        assert_eq!(index.raycast(Vec2::new(radius - 0.5, 0.0), 1.0, 1.0), Some(0));
    }

    #[test]
    fn test_raycast_picks_nearest() {
        let index = SpatialIndex::build(&[[0.0, 0.0], [6.0, 0.0]]);
        assert_eq!(index.raycast(Vec2::new(2.0, 0.0), 1.0, 1.0), Some(0));
        assert_eq!(index.raycast(Vec2::new(4.0, 0.0), 1.0, 1.0), Some(1));
    }

    #[test]
    fn test_pick_radius_zoom_compensation() {
        // zoom = 1: plain base radius
        assert!((pick_radius(1.0, 1.0) - pick::BASE_RADIUS).abs() < 1e-6);
        // zoomed in: base * (1 + log2 zoom)
        assert!((pick_radius(4.0, 1.0) - pick::BASE_RADIUS * 3.0).abs() < 1e-5);
        // zoomed out: shrinks linearly with the zoom factor
        assert!((pick_radius(0.5, 1.0) - pick::BASE_RADIUS * 0.5).abs() < 1e-6);
        // device pixel ratio scales the whole term
        assert!((pick_radius(1.0, 2.0) - pick::BASE_RADIUS * 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.raycast(Vec2::ZERO, 1.0, 1.0), None);
    }
}
