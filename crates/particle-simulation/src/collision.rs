//! Grid-based particle collision resolution
//!
//! Every occupied cell is checked against itself and four neighbors: right,
//! below-right, below, below-left. That stencil visits each unordered pair of
//! adjacent cells exactly once. A full 9-cell stencil would visit corner pairs
//! from two column stripes and corrupt positions when stripes run in parallel.
//!
//! Parallel scan: columns are cut into `2 * threads` stripes. Even stripes run
//! first, then odd stripes, with a drain in between. A task over columns `a..b`
//! touches columns `a - 1..=b`, so same-parity stripes at least two columns wide
//! never touch a common column and need no locks.

use std::ops::Range;

use glam::Vec2;
use particle_physics::{Particle, SpatialGrid};

use crate::slots::ParticleSlots;
use crate::ThreadPool;

/// Neighbor offsets as (column, row), the cell itself included
pub const STENCIL: [(i32, i32); 5] = [(1, 0), (1, 1), (0, 0), (0, 1), (-1, 1)];

/// Narrowest stripe whose footprint stays clear of the next same-parity stripe
const MIN_STRIPE_WIDTH: usize = 2;

/// Push two overlapping particles apart along the line between their centers
///
/// The overlap is half the penetration depth, and each particle moves half of
/// the overlap. That closes half the gap per visit and leaves the midpoint in
/// place.
pub fn resolve_pair(p1: &mut Particle, p2: &mut Particle) {
    let axis = p1.position - p2.position;
    let min_dist = p1.radius + p2.radius;
    let dist_sq = axis.length_squared();
    if dist_sq >= min_dist * min_dist {
        return;
    }

    let dist = dist_sq.sqrt();
    // Coincident centers have no axis, separate them horizontally
    let normal = if dist > 0.0 { axis / dist } else { Vec2::X };
    let delta = 0.25 * (min_dist - dist);
    p1.position += normal * delta;
    p2.position -= normal * delta;

    // An unequal-mass split would scale each push by the other particle's mass
    // ratio; all particles currently share one mass.
}

/// Resolve every pair with one particle in `cell_1` and the other in `cell_2`
///
/// # Safety
///
/// No other task may touch the particles listed in either cell.
unsafe fn resolve_cell_pair(slots: &ParticleSlots, cell_1: &[usize], cell_2: &[usize]) {
    for &id_1 in cell_1 {
        for &id_2 in cell_2 {
            if id_1 == id_2 {
                continue;
            }
            resolve_pair(slots.get_mut(id_1), slots.get_mut(id_2));
        }
    }
}

/// Apply the stencil to every occupied cell in `columns`
///
/// # Safety
///
/// No other task may touch cells in `columns.start - 1..=columns.end`.
unsafe fn process_columns(grid: &SpatialGrid, slots: &ParticleSlots, columns: Range<usize>) {
    for col in columns {
        let col = col as i32;
        for row in 0..grid.rows() as i32 {
            let cell = grid.cell(col, row);
            if cell.is_empty() {
                continue;
            }
            for (d_col, d_row) in STENCIL {
                let other = grid.cell(col + d_col, row + d_row);
                if !other.is_empty() {
                    resolve_cell_pair(slots, cell, other);
                }
            }
        }
    }
}

/// Column ranges processed by the two passes of the striped scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripePlan {
    columns: usize,
    passes: [Vec<Range<usize>>; 2],
}

impl StripePlan {
    pub fn new(columns: usize, thread_count: usize) -> Self {
        // Fewer stripes when the grid is too narrow for two per thread
        let threads = thread_count.min(columns / (2 * MIN_STRIPE_WIDTH));
        if threads == 0 {
            return Self {
                columns,
                passes: [vec![0..columns], Vec::new()],
            };
        }

        let stripe_width = columns / (2 * threads);
        let stripe = |i: usize| i * stripe_width..(i + 1) * stripe_width;

        let mut even: Vec<_> = (0..threads).map(|i| stripe(2 * i)).collect();
        let covered = 2 * threads * stripe_width;
        if covered < columns {
            even.push(covered..columns);
        }
        let odd = (0..threads).map(|i| stripe(2 * i + 1)).collect();

        Self {
            columns,
            passes: [even, odd],
        }
    }

    pub fn passes(&self) -> &[Vec<Range<usize>>; 2] {
        &self.passes
    }

    /// Columns read or written while processing `range`
    pub fn footprint(&self, range: &Range<usize>) -> Range<usize> {
        range.start.saturating_sub(1)..(range.end + 1).min(self.columns)
    }
}

/// Resolve all particle overlaps visible through the grid, in parallel
///
/// Grid rows and columns must come from the current `particles`.
pub fn resolve_collisions(pool: &ThreadPool, grid: &SpatialGrid, particles: &mut [Particle]) {
    let plan = StripePlan::new(grid.columns(), pool.thread_count());
    let slots = ParticleSlots::new(particles);

    for pass in plan.passes() {
        pool.scope(|scope| {
            for columns in pass {
                let columns = columns.clone();
                let slots = &slots;
                // SAFETY: ranges within a pass have disjoint footprints and the
                // scope drains before the next pass starts.
                scope.submit(move || unsafe { process_columns(grid, slots, columns) });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(x: f32, y: f32, radius: f32, id: usize) -> Particle {
        Particle::new(Vec2::new(x, y), radius, 0, 0, id)
    }

    fn grid_for(particles: &[Particle], world_size: f32, cell_size: f32) -> SpatialGrid {
        let mut grid = SpatialGrid::new(world_size, cell_size);
        grid.rebuild(particles);
        grid
    }

    fn pair_gap(pair: &[Particle]) -> f32 {
        pair[0].position.distance(pair[1].position) - (pair[0].radius + pair[1].radius)
    }

    #[test]
    fn test_pair_closes_half_the_gap() {
        let mut a = particle(100.0, 100.0, 10.0, 0);
        let mut b = particle(110.0, 100.0, 10.0, 1);
        resolve_pair(&mut a, &mut b);

        assert_eq!(a.position, Vec2::new(97.5, 100.0));
        assert_eq!(b.position, Vec2::new(112.5, 100.0));
    }

    #[test]
    fn test_separated_pair_untouched() {
        let mut a = particle(100.0, 100.0, 2.0, 0);
        let mut b = particle(104.0, 100.0, 2.0, 1);
        resolve_pair(&mut a, &mut b);

        assert_eq!(a.position, Vec2::new(100.0, 100.0));
        assert_eq!(b.position, Vec2::new(104.0, 100.0));
    }

    #[test]
    fn test_midpoint_is_preserved() {
        let mut a = particle(50.0, 50.0, 2.0, 0);
        let mut b = particle(51.5, 52.0, 2.0, 1);
        let midpoint = (a.position + b.position) * 0.5;
        resolve_pair(&mut a, &mut b);

        assert!(((a.position + b.position) * 0.5).distance(midpoint) < 1e-5);
        assert!((a.position.distance(b.position) - 3.25).abs() < 1e-4);
    }

    #[test]
    fn test_coincident_particles_are_split() {
        let mut a = particle(20.0, 20.0, 2.0, 0);
        let mut b = particle(20.0, 20.0, 2.0, 1);
        resolve_pair(&mut a, &mut b);

        assert_eq!(a.position, Vec2::new(21.0, 20.0));
        assert_eq!(b.position, Vec2::new(19.0, 20.0));
    }

    #[test]
    fn test_two_particles_overlapping_by_ten() {
        let pool = ThreadPool::new(2).unwrap();
        let mut particles = vec![particle(100.0, 100.0, 10.0, 0), particle(110.0, 100.0, 10.0, 1)];
        let grid = grid_for(&particles, 400.0, 20.0);

        resolve_collisions(&pool, &grid, &mut particles);

        // Same cell, so the pair is visited once from each side: 10 -> 15 -> 17.5
        assert_eq!(particles[0].position, Vec2::new(96.25, 100.0));
        assert_eq!(particles[1].position, Vec2::new(113.75, 100.0));
    }

    #[test]
    fn test_repeated_passes_converge_to_contact() {
        let pool = ThreadPool::new(2).unwrap();
        let mut particles = vec![particle(100.0, 100.0, 10.0, 0), particle(110.0, 100.0, 10.0, 1)];

        for _ in 0..12 {
            let grid = grid_for(&particles, 400.0, 20.0);
            resolve_collisions(&pool, &grid, &mut particles);
        }

        let dist = particles[0].position.distance(particles[1].position);
        assert!(dist < 20.0 && dist > 19.99, "distance {dist}");
        assert!((particles[0].position.x + particles[1].position.x - 210.0).abs() < 1e-3);
    }

    #[test]
    fn test_neighbor_cell_pairs_are_visited_once() {
        let pool = ThreadPool::new(4).unwrap();
        // One pair per stencil direction, each straddling a cell border
        let mut particles = vec![
            particle(63.0, 101.0, 2.0, 0),
            particle(65.5, 101.0, 2.0, 1),
            particle(201.0, 203.0, 2.0, 2),
            particle(201.0, 205.5, 2.0, 3),
            particle(303.0, 303.0, 2.0, 4),
            particle(305.0, 305.0, 2.0, 5),
            particle(405.0, 403.0, 2.0, 6),
            particle(403.0, 405.0, 2.0, 7),
        ];
        let grid = grid_for(&particles, 512.0, 4.0);
        let before: Vec<f32> = particles.chunks(2).map(pair_gap).collect();
        assert!(before.iter().all(|&gap| gap < -1.0));

        resolve_collisions(&pool, &grid, &mut particles);

        // One visit per pair halves its gap; a second visit would shrink it further
        for (pair, gap) in particles.chunks(2).zip(before) {
            assert!((pair_gap(pair) - 0.5 * gap).abs() < 1e-4, "{:?}", pair);
        }
    }

    fn dense_block() -> Vec<Particle> {
        let mut particles = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                let id = particles.len();
                particles.push(particle(100.0 + i as f32 * 3.0, 100.0 + j as f32 * 3.0, 2.0, id));
            }
        }
        particles
    }

    #[test]
    fn test_dense_block_resolution_is_repeatable() {
        let pool = ThreadPool::new(4).unwrap();
        let mut first = dense_block();
        let mut second = dense_block();
        let grid = grid_for(&first, 512.0, 4.0);

        resolve_collisions(&pool, &grid, &mut first);
        resolve_collisions(&pool, &grid, &mut second);

        // Tasks of one pass own disjoint particles, so timing cannot change the result
        assert_eq!(first, second);
        for p in &first {
            assert!(p.position.is_finite());
            assert!(p.position.cmpge(Vec2::splat(90.0)).all());
            assert!(p.position.cmple(Vec2::splat(170.0)).all());
        }
    }

    #[test]
    fn test_stripe_passes_cover_all_columns() {
        for columns in [1, 3, 4, 7, 8, 9, 31, 64, 127, 128, 350] {
            for threads in [1, 2, 3, 4, 8, 16, 64] {
                let plan = StripePlan::new(columns, threads);
                let mut ranges: Vec<_> = plan.passes().iter().flatten().cloned().collect();
                ranges.sort_by_key(|r| r.start);

                let mut next = 0;
                for range in ranges {
                    assert_eq!(range.start, next, "{columns} columns, {threads} threads");
                    next = range.end;
                }
                assert_eq!(next, columns);
            }
        }
    }

    #[test]
    fn test_stripes_in_a_pass_never_touch() {
        for columns in [1, 3, 4, 7, 8, 9, 31, 64, 127, 128, 350] {
            for threads in [1, 2, 3, 4, 8, 16, 64] {
                let plan = StripePlan::new(columns, threads);
                for pass in plan.passes() {
                    let mut footprints: Vec<_> = pass.iter().map(|r| plan.footprint(r)).collect();
                    footprints.sort_by_key(|r| r.start);
                    for pair in footprints.windows(2) {
                        assert!(
                            pair[0].end <= pair[1].start,
                            "{columns} columns, {threads} threads: {:?} meets {:?}",
                            pair[0],
                            pair[1]
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_stencil_reaches_only_adjacent_columns() {
        for (d_col, d_row) in STENCIL {
            assert!((-1..=1).contains(&d_col));
            assert!((0..=1).contains(&d_row));
        }
    }

    #[test]
    fn test_stencil_visits_each_neighbor_pair_once() {
        // For every ordered offset, exactly one of it and its mirror is in the stencil
        for d_col in -1..=1 {
            for d_row in -1..=1 {
                if (d_col, d_row) == (0, 0) {
                    continue;
                }
                let forward = STENCIL.contains(&(d_col, d_row));
                let backward = STENCIL.contains(&(-d_col, -d_row));
                assert!(forward != backward, "offset ({d_col}, {d_row})");
            }
        }
    }
}
