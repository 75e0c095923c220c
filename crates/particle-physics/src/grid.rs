//! Uniform spatial grid for broad-phase collision culling
//!
//! The grid covers the square world `[0, world_size)²` with square cells whose
//! edge is one particle diameter, so two particles can only overlap when they sit
//! in the same or in adjacent cells. Cells hold particle ids, never references.
//!
//! Columns are derived from x and rows from y. Storage is column-major so that a
//! contiguous range of columns is a contiguous range of cells.

use glam::Vec2;

use crate::particle::Particle;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    columns: usize,
    rows: usize,
    cell_size: f32,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid covering a square world of edge `world_size`
    pub fn new(world_size: f32, cell_size: f32) -> Self {
        let count = (world_size / cell_size).ceil().max(0.0) as usize;
        Self {
            columns: count,
            rows: count,
            cell_size,
            cells: vec![Vec::new(); count * count],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Column and row of the cell containing `position`
    ///
    /// The result may lie outside the grid; check with [`SpatialGrid::contains`].
    pub fn cell_coords(&self, position: Vec2) -> (i32, i32) {
        let scaled = (position / self.cell_size).floor();
        (scaled.x as i32, scaled.y as i32)
    }

    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.columns && (row as usize) < self.rows
    }

    /// Record `id` in the given cell
    ///
    /// Returns `false` without storing anything when the cell is outside the grid.
    pub fn insert(&mut self, id: usize, col: i32, row: i32) -> bool {
        if !self.contains(col, row) {
            return false;
        }
        let index = self.index(col as usize, row as usize);
        self.cells[index].push(id);
        true
    }

    /// Ids stored in a cell, empty when the cell is outside the grid
    pub fn cell(&self, col: i32, row: i32) -> &[usize] {
        if !self.contains(col, row) {
            return &[];
        }
        &self.cells[self.index(col as usize, row as usize)]
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Clear and repopulate every cell from particle positions
    ///
    /// Particles outside the grid are skipped and take no part in collisions until
    /// they come back in.
    pub fn rebuild(&mut self, particles: &[Particle]) {
        self.clear();
        for particle in particles {
            let (col, row) = self.cell_coords(particle.position);
            self.insert(particle.id, col, row);
        }
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    fn index(&self, col: usize, row: usize) -> usize {
        col * self.rows + row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_covers_world() {
        let grid = SpatialGrid::new(512.0, 4.0);
        assert_eq!(grid.columns(), 128);
        assert_eq!(grid.rows(), 128);

        // Partial cells at the far edge are still covered
        let grid = SpatialGrid::new(10.0, 4.0);
        assert_eq!(grid.columns(), 3);
    }

    #[test]
    fn test_cell_coords() {
        let grid = SpatialGrid::new(512.0, 4.0);
        assert_eq!(grid.cell_coords(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid.cell_coords(Vec2::new(7.9, 4.0)), (1, 1));
        assert_eq!(grid.cell_coords(Vec2::new(-0.5, 600.0)), (-1, 150));
    }

    #[test]
    fn test_insert_skips_out_of_bounds() {
        let mut grid = SpatialGrid::new(16.0, 4.0);
        assert!(grid.insert(0, 1, 2));
        assert!(!grid.insert(1, -1, 0));
        assert!(!grid.insert(2, 0, 4));

        assert_eq!(grid.cell(1, 2), &[0]);
        assert!(grid.cell(-1, 0).is_empty());
        assert_eq!(grid.occupied_cells(), 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut grid = SpatialGrid::new(16.0, 4.0);
        let mut particles = vec![
            Particle::new(Vec2::new(1.0, 1.0), 2.0, 0, 0, 0),
            Particle::new(Vec2::new(2.0, 3.0), 2.0, 0, 0, 1),
            Particle::new(Vec2::new(13.0, 1.0), 2.0, 0, 0, 2),
        ];
        grid.rebuild(&particles);
        assert_eq!(grid.cell(0, 0), &[0, 1]);
        assert_eq!(grid.cell(3, 0), &[2]);

        particles[1].position = Vec2::new(-20.0, 3.0);
        particles[2].position = Vec2::new(5.0, 9.0);
        grid.rebuild(&particles);
        assert_eq!(grid.cell(0, 0), &[0]);
        assert!(grid.cell(3, 0).is_empty());
        assert_eq!(grid.cell(1, 2), &[2]);
        assert_eq!(grid.occupied_cells(), 2);
    }

    #[test]
    fn test_clear_empties_all_cells() {
        let mut grid = SpatialGrid::new(16.0, 4.0);
        grid.insert(3, 2, 2);
        grid.clear();
        assert_eq!(grid.occupied_cells(), 0);
    }
}
