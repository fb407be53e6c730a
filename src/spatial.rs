//! Broad phase: a uniform grid hash and a Verlet neighbor list built on it.
//!
//! Testing every pair is O(n²). The grid buckets particles by cell so a
//! proximity query only visits nearby cells; the neighbor list caches the
//! result of those queries for several frames. Its cutoff is padded by a skin
//! margin, so pairs that drift closer between rebuilds are still listed as long
//! as they moved less than the skin.

use std::collections::HashMap;

use tracing::debug;

use crate::constraint::Particles;
use crate::float::Float;
use crate::vec::Vec2;

type Cell = (i64, i64);

/// Uniform grid hash over an unbounded plane.
#[derive(Clone, Debug)]
pub struct SpatialGrid<F: Float = f64> {
    cell_size: F,
    inv_cell_size: F,
    cells: HashMap<Cell, Vec<usize>>,
}

impl<F: Float> SpatialGrid<F> {
    pub fn new(cell_size: F) -> Self {
        let mut grid = SpatialGrid { cell_size: F::one(), inv_cell_size: F::one(), cells: HashMap::new() };
        grid.set_cell_size(cell_size);
        grid
    }

    /// Cell sizes below 1 (or non-finite) fall back to 1.
    pub fn set_cell_size(&mut self, cell_size: F) {
        self.cell_size = if cell_size.is_finite() { cell_size.max(F::one()) } else { F::one() };
        self.inv_cell_size = F::one() / self.cell_size;
        self.cells.clear();
    }

    pub fn cell_size(&self) -> F {
        self.cell_size
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn coord(&self, v: F) -> i64 {
        (v * self.inv_cell_size).floor().to_f64() as i64
    }

    pub fn cell_of(&self, pos: Vec2<F>) -> (i64, i64) {
        (self.coord(pos.x), self.coord(pos.y))
    }

    /// Insert a point. Non-finite positions are ignored.
    pub fn insert(&mut self, index: usize, pos: Vec2<F>) {
        if !pos.is_finite() {
            return;
        }
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Append every index stored in a cell overlapping the square of half-size
    /// `radius` around `pos`. Callers filter by exact distance.
    pub fn query(&self, pos: Vec2<F>, radius: F, out: &mut Vec<usize>) {
        if !pos.is_finite() || !radius.is_finite() {
            return;
        }
        let (min_x, min_y) = self.cell_of(Vec2::new(pos.x - radius, pos.y - radius));
        let (max_x, max_y) = self.cell_of(Vec2::new(pos.x + radius, pos.y + radius));
        let span = (max_x - min_x + 1).saturating_mul(max_y - min_y + 1);

        if span > self.cells.len() as i64 {
            // Fewer occupied cells than cells in range: scan the occupied ones.
            for (&(cx, cy), items) in &self.cells {
                if cx >= min_x && cx <= max_x && cy >= min_y && cy <= max_y {
                    out.extend_from_slice(items);
                }
            }
            return;
        }

        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                if let Some(items) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(items);
                }
            }
        }
    }
}

/// Cached per-particle neighbor lists, indexed by particle slot.
#[derive(Clone, Debug, Default)]
pub struct NeighborList<F: Float = f64> {
    neighbors: Vec<Vec<usize>>,
    pairs: Vec<(usize, usize)>,
    cutoff: F,
    built_for: Option<(usize, u64)>,
    scratch: Vec<usize>,
}

impl<F: Float> NeighborList<F> {
    pub fn new() -> Self {
        NeighborList {
            neighbors: Vec::new(),
            pairs: Vec::new(),
            cutoff: F::zero(),
            built_for: None,
            scratch: Vec::new(),
        }
    }

    /// Rebuild when never built, when particles were added or removed since
    /// the last build, or every `rebuild_freq` frames.
    pub fn needs_rebuild(&self, frame: u64, rebuild_freq: usize, count: usize, version: u64) -> bool {
        match self.built_for {
            None => true,
            Some((built_count, built_version)) => {
                built_count != count
                    || built_version != version
                    || frame % (rebuild_freq.max(1) as u64) == 0
            }
        }
    }

    /// Forget the cached lists; the next check always rebuilds.
    pub fn invalidate(&mut self) {
        self.built_for = None;
    }

    pub fn rebuild(&mut self, particles: &Particles<F>, grid: &mut SpatialGrid<F>, skin: F, version: u64) {
        let slots = particles.slot_capacity();
        let mut max_radius = F::zero();
        for p in particles.values() {
            max_radius = max_radius.max(p.radius);
        }
        self.cutoff = F::two() * max_radius + skin.max(F::zero());
        let cutoff_sq = self.cutoff * self.cutoff;

        grid.clear();
        for slot in 0..slots {
            if let Some(p) = particles.get_by_slot(slot) {
                grid.insert(slot, p.pos);
            }
        }

        self.neighbors.resize_with(slots, Vec::new);
        self.neighbors.truncate(slots);
        for list in self.neighbors.iter_mut() {
            list.clear();
        }
        self.pairs.clear();

        for i in 0..slots {
            let Some(pi) = particles.get_by_slot(i) else {
                continue;
            };
            self.scratch.clear();
            grid.query(pi.pos, self.cutoff, &mut self.scratch);
            for &j in &self.scratch {
                if j == i {
                    continue;
                }
                let Some(pj) = particles.get_by_slot(j) else {
                    continue;
                };
                if pi.pos.distance_sq(pj.pos) <= cutoff_sq {
                    self.neighbors[i].push(j);
                    if i < j {
                        self.pairs.push((i, j));
                    }
                }
            }
            self.neighbors[i].sort_unstable();
            self.neighbors[i].dedup();
        }
        self.pairs.sort_unstable();
        self.pairs.dedup();
        self.built_for = Some((particles.len(), version));
        debug!(pairs = self.pairs.len(), cutoff = ?self.cutoff, "neighbor list rebuilt");
    }

    /// Unique unordered candidate pairs `(i, j)` with `i < j`, sorted.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Slots within the cutoff of `slot` at the last rebuild.
    pub fn neighbors(&self, slot: usize) -> &[usize] {
        self.neighbors.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cutoff(&self) -> F {
        self.cutoff
    }

    pub fn is_built(&self) -> bool {
        self.built_for.is_some()
    }
}
