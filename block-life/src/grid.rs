use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::SetupError;

/// Two-dimensional field of binary cell states stored in row-major order.
///
/// A value of `1` denotes a live cell while `0` denotes a dead one.
/// The grid is always owned exclusively by one component at a time:
/// the global grid by the runner during seeding and merging, each block
/// by its worker during evolution.
///
/// ```
/// # use block_life::Grid;
/// let mut grid = Grid::new(3, 3);
/// grid.set(1, 1, 1);
/// assert_eq!(grid.get(1, 1), 1);
/// assert_eq!(grid.n_live(), 1);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Construct a new all-dead grid with the given dimensions.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![0; height * width],
        }
    }

    /// Number of rows of the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Obtain the state of the cell at position `(y, x)`.
    pub fn get(&self, y: usize, x: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    /// Set the state of the cell at position `(y, x)`.
    /// Any nonzero state is stored as a live cell.
    pub fn set(&mut self, y: usize, x: usize, state: u8) {
        self.cells[y * self.width + x] = (state != 0) as u8;
    }

    /// Total number of live cells currently contained in the grid.
    pub fn n_live(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }

    /// Iterate over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.width.max(1))
    }

    /// Overwrite every cell with a random binary state drawn from `rng`.
    pub fn fill_random<R>(&mut self, rng: &mut R)
    where
        R: Rng,
    {
        for cell in self.cells.iter_mut() {
            *cell = rng.gen_range(0..=1);
        }
    }

    /// Count the live cells among the 8 neighbors of position `(y, x)`.
    ///
    /// Positions outside of the grid contribute nothing. There is no
    /// wraparound: cells on the border simply have fewer neighbors.
    ///
    /// ```
    /// # use block_life::Grid;
    /// let mut grid = Grid::new(2, 2);
    /// grid.set(0, 0, 1);
    /// grid.set(0, 1, 1);
    /// assert_eq!(grid.neighbor_count(1, 0), 2);
    /// assert_eq!(grid.neighbor_count(0, 0), 1);
    /// ```
    pub fn neighbor_count(&self, y: usize, x: usize) -> u8 {
        let mut count = 0;
        for dy in [-1_isize, 0, 1] {
            for dx in [-1_isize, 0, 1] {
                if dy == 0 && dx == 0 {
                    continue;
                }
                let ny = y as isize + dy;
                let nx = x as isize + dx;
                if ny >= 0 && ny < self.height as isize && nx >= 0 && nx < self.width as isize {
                    count += self.get(ny as usize, nx as usize);
                }
            }
        }
        count
    }

    /// Advance the automaton by one generation, writing the successor of
    /// `self` into `next`.
    ///
    /// Every cell of `next` is overwritten according to the standard
    /// Conway rule: a live cell survives with 2 or 3 live neighbors, a
    /// dead cell becomes alive with exactly 3. `self` is never mutated
    /// and `next` is never read, so the caller can ping-pong two buffers
    /// over repeated generations.
    pub fn step_into(&self, next: &mut Grid) {
        assert_eq!(
            (self.height, self.width),
            (next.height, next.width),
            "step buffers must have identical dimensions"
        );
        for y in 0..self.height {
            for x in 0..self.width {
                let neighbors = self.neighbor_count(y, x);
                next.cells[y * self.width + x] = match (self.get(y, x), neighbors) {
                    (1, 2) | (1, 3) => 1,
                    (0, 3) => 1,
                    _ => 0,
                };
            }
        }
    }

    /// Copy the contents of `block` into `self` at the given offset.
    ///
    /// Returns an error when the block does not fit inside the target
    /// region, which indicates a violated layout contract.
    pub fn blit_from(
        &mut self,
        offset_y: usize,
        offset_x: usize,
        block: &Grid,
    ) -> Result<(), SetupError> {
        if offset_y + block.height > self.height || offset_x + block.width > self.width {
            return Err(SetupError(format!(
                "block of size {}x{} does not fit at offset ({}, {}) in {}x{} grid",
                block.height, block.width, offset_y, offset_x, self.height, self.width
            )));
        }
        for (y, row) in block.rows().enumerate() {
            let start = (offset_y + y) * self.width + offset_x;
            self.cells[start..start + block.width].copy_from_slice(row);
        }
        Ok(())
    }

    /// Split the grid into `divisions`×`divisions` mutable block tiles.
    ///
    /// The tiles are returned in row-major block order and borrow
    /// pairwise disjoint regions of the underlying storage, so every
    /// tile can be handed to a different task and mutated concurrently
    /// without any locking. Disjointness is guaranteed by construction
    /// through [slice::chunks_mut].
    pub fn partition_tiles_mut(
        &mut self,
        divisions: usize,
    ) -> Result<Vec<TileMut<'_>>, SetupError> {
        if divisions == 0 {
            return Err(SetupError(
                "cannot partition a grid into zero divisions".into(),
            ));
        }
        if self.height % divisions != 0 || self.width % divisions != 0 {
            return Err(SetupError(format!(
                "grid of size {}x{} cannot be divided into {divisions}x{divisions} blocks",
                self.height, self.width
            )));
        }
        let block_height = self.height / divisions;
        let block_width = self.width / divisions;
        let mut tiles: Vec<TileMut> = (0..divisions * divisions)
            .map(|_| TileMut { rows: Vec::new() })
            .collect();
        for (row_index, row) in self.cells.chunks_mut(self.width).enumerate() {
            let block_row = row_index / block_height;
            for (block_col, segment) in row.chunks_mut(block_width).enumerate() {
                tiles[block_row * divisions + block_col].rows.push(segment);
            }
        }
        Ok(tiles)
    }
}

impl core::fmt::Display for Grid {
    /// Render the grid with `O` for live cells and `.` for dead ones,
    /// one row per line.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for row in self.rows() {
            for &cell in row {
                write!(f, "{}", if cell == 1 { 'O' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Mutable view of one block-shaped region of a [Grid].
///
/// Holds one mutable row segment per block row. Two tiles produced by
/// the same [Grid::partition_tiles_mut] call can never overlap.
pub struct TileMut<'a> {
    rows: Vec<&'a mut [u8]>,
}

impl TileMut<'_> {
    /// Overwrite every cell of the tile with a random binary state.
    pub fn fill_random<R>(&mut self, rng: &mut R)
    where
        R: Rng,
    {
        for row in self.rows.iter_mut() {
            for cell in row.iter_mut() {
                *cell = rng.gen_range(0..=1);
            }
        }
    }
}
