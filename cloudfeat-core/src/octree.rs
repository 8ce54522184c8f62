//! Linear octree over a point cloud, used for spherical neighborhood extraction
//!
//! Points are sorted by their Morton code at the deepest level. A cell at any
//! coarser level is then a contiguous run of that sorted array, found with two
//! binary searches.

use crate::point::Point3d;
use crate::traits::SpatialIndex;
use serde::{Deserialize, Serialize};

/// Deepest supported level (3 bits per level in a 64-bit code)
pub const MAX_OCTREE_LEVEL: u8 = 21;

/// Octree construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Deepest subdivision level, clamped to `1..=MAX_OCTREE_LEVEL`
    pub max_level: u8,
    /// Cells targeted for a neighborhood extraction are about `radius / factor` wide
    pub extraction_factor: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_level: MAX_OCTREE_LEVEL,
            extraction_factor: 2.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    min_corner: Point3d,
    box_size: f64,
    /// (morton code at max level, point index), sorted
    codes: Vec<(u64, usize)>,
    positions: Vec<Point3d>,
}

impl Octree {
    /// Build an octree with default parameters
    pub fn build(points: &[Point3d]) -> Self {
        Self::with_config(points, OctreeConfig::default())
    }

    pub fn with_config(points: &[Point3d], config: OctreeConfig) -> Self {
        let config = OctreeConfig {
            max_level: config.max_level.clamp(1, MAX_OCTREE_LEVEL),
            ..config
        };

        let (min_corner, box_size) = bounding_cube(points);
        let mut octree = Self {
            config,
            min_corner,
            box_size,
            codes: Vec::with_capacity(points.len()),
            positions: points.to_vec(),
        };

        let last_cell = (1u64 << config.max_level) - 1;
        let max_level = config.max_level;
        let codes: Vec<(u64, usize)> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let [x, y, z] = octree.cell_pos(p, max_level).map(|c| c.clamp(0, last_cell as i64) as u64);
                (morton_code(x, y, z), idx)
            })
            .collect();
        octree.codes = codes;
        octree.codes.sort_unstable();
        octree
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn max_level(&self) -> u8 {
        self.config.max_level
    }

    /// Edge length of a cell at `level`
    pub fn cell_size(&self, level: u8) -> f64 {
        self.box_size / f64::from(1u32 << level.min(MAX_OCTREE_LEVEL))
    }

    /// Integer position of the cell including `point` at `level` (may be out of the grid)
    fn cell_pos(&self, point: &Point3d, level: u8) -> [i64; 3] {
        let cs = self.cell_size(level);
        [
            ((point.x - self.min_corner.x) / cs).floor() as i64,
            ((point.y - self.min_corner.y) / cs).floor() as i64,
            ((point.z - self.min_corner.z) / cs).floor() as i64,
        ]
    }

    /// Squared distance from `query` to the closest point of a cell
    fn cell_distance2(&self, query: &Point3d, cell: [i64; 3], cs: f64) -> f64 {
        let q = [query.x, query.y, query.z];
        let o = [self.min_corner.x, self.min_corner.y, self.min_corner.z];
        (0..3)
            .map(|a| {
                let lo = o[a] + cell[a] as f64 * cs;
                let hi = lo + cs;
                let d = if q[a] < lo {
                    lo - q[a]
                } else if q[a] > hi {
                    q[a] - hi
                } else {
                    0.0
                };
                d * d
            })
            .sum()
    }
}

impl SpatialIndex for Octree {
    fn best_level_for(&self, radius: f64) -> u8 {
        let aim = radius / self.config.extraction_factor;

        let mut best_level = 1u8;
        let mut best_delta = (self.cell_size(1) - aim).powi(2);
        for level in 2..self.config.max_level {
            let delta = (self.cell_size(level) - aim).powi(2);
            if delta < best_delta {
                best_level = level;
                best_delta = delta;
            } else {
                // cell sizes shrink monotonically: past the optimum, it only gets worse
                break;
            }
        }
        best_level
    }

    fn spherical_range_query(&self, query: &Point3d, level: u8, radius: f64) -> Vec<usize> {
        let mut neighbors = Vec::new();
        if self.codes.is_empty() || !(radius >= 0.0) {
            return neighbors;
        }

        let level = level.clamp(1, self.config.max_level);
        let cs = self.cell_size(level);
        let last_cell = (1i64 << level) - 1;
        let shift = 3 * u32::from(self.config.max_level - level);
        let squared_radius = radius * radius;

        let lo = self.cell_pos(&Point3d::new(query.x - radius, query.y - radius, query.z - radius), level);
        let hi = self.cell_pos(&Point3d::new(query.x + radius, query.y + radius, query.z + radius), level);
        if (0..3).any(|a| hi[a] < 0 || lo[a] > last_cell) {
            return neighbors;
        }
        let lo = lo.map(|c| c.clamp(0, last_cell));
        let hi = hi.map(|c| c.clamp(0, last_cell));

        for i in lo[0]..=hi[0] {
            for j in lo[1]..=hi[1] {
                for k in lo[2]..=hi[2] {
                    if self.cell_distance2(query, [i, j, k], cs) > squared_radius {
                        continue;
                    }

                    let prefix = morton_code(i as u64, j as u64, k as u64);
                    let start = prefix << shift;
                    let end = (prefix + 1) << shift;
                    let first = self.codes.partition_point(|&(code, _)| code < start);

                    neighbors.extend(
                        self.codes[first..]
                            .iter()
                            .take_while(|&&(code, _)| code < end)
                            .map(|&(_, idx)| idx)
                            .filter(|&idx| nalgebra::distance_squared(&self.positions[idx], query) <= squared_radius),
                    );
                }
            }
        }

        neighbors
    }
}

/// Smallest axis-aligned cube enclosing all points (slightly enlarged)
fn bounding_cube(points: &[Point3d]) -> (Point3d, f64) {
    let Some(first) = points.first() else {
        return (Point3d::origin(), 1.0);
    };

    let mut min = *first;
    let mut max = *first;
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);

        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    let extent = (max - min).max();
    let size = if extent > 0.0 { extent * (1.0 + 1e-9) } else { 1.0 };
    (min, size)
}

/// Spread the 21 low bits of `v` so that two zero bits separate each of them
fn spread_bits(v: u64) -> u64 {
    let mut x = v & 0x1f_ffff;
    x = (x | x << 32) & 0x001f_0000_0000_ffff;
    x = (x | x << 16) & 0x001f_0000_ff00_00ff;
    x = (x | x << 8) & 0x100f_00f0_0f00_f00f;
    x = (x | x << 4) & 0x10c3_0c30_c30c_30c3;
    x = (x | x << 2) & 0x1249_2492_4924_9249;
    x
}

fn morton_code(x: u64, y: u64, z: u64) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}
