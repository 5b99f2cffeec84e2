use std::collections::HashMap;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, SetupError, SimulationError};
use crate::grid::Grid;

/// Position of one block inside the square arrangement of blocks.
///
/// Both coordinates live in `[0, divisions)`. The index identifies the
/// sub-square of the global grid starting at offset
/// `(row * block_size, col * block_size)`.
#[derive(Clone, Copy, Debug, Deserialize, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize)]
pub struct BlockIndex {
    /// Row of the block inside the block arrangement.
    pub row: usize,
    /// Column of the block inside the block arrangement.
    pub col: usize,
}

/// Decomposition of a square `dimension`×`dimension` grid into
/// `divisions`×`divisions` equally sized square blocks.
///
/// Constructing a layout validates the decomposition, so every layout
/// in existence satisfies `dimension == divisions * block_size`.
///
/// ```
/// # use block_life::BlockLayout;
/// let layout = BlockLayout::new(20, 4).unwrap();
/// assert_eq!(layout.block_size(), 5);
/// assert_eq!(layout.n_blocks(), 16);
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct BlockLayout {
    dimension: usize,
    divisions: usize,
    block_size: usize,
}

impl BlockLayout {
    /// Construct a layout for a `dimension`×`dimension` grid divided
    /// `divisions` times along each axis.
    ///
    /// Fails when either value is zero or when `dimension` is not
    /// evenly divisible by `divisions`.
    pub fn new(dimension: usize, divisions: usize) -> Result<Self, SetupError> {
        if dimension == 0 || divisions == 0 {
            return Err(SetupError(
                "grid dimension and number of divisions must both be nonzero".into(),
            ));
        }
        if dimension % divisions != 0 {
            return Err(SetupError(
                "A dimensao deve ser divisivel pelo numero de divisoes".into(),
            ));
        }
        Ok(Self {
            dimension,
            divisions,
            block_size: dimension / divisions,
        })
    }

    /// Side length of the global grid.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of divisions along each axis.
    pub fn divisions(&self) -> usize {
        self.divisions
    }

    /// Side length of one block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of blocks in the layout.
    pub fn n_blocks(&self) -> usize {
        self.divisions * self.divisions
    }

    /// Iterate over every block index of the layout in row-major order.
    pub fn indices(&self) -> impl Iterator<Item = BlockIndex> {
        iproduct!(0..self.divisions, 0..self.divisions).map(|(row, col)| BlockIndex { row, col })
    }

    /// Offset `(y, x)` of the given block inside the global grid.
    pub fn offset(&self, index: BlockIndex) -> (usize, usize) {
        (index.row * self.block_size, index.col * self.block_size)
    }
}

/// Assemble the global grid from the collection of finished blocks.
///
/// Every block index of the layout must be present exactly once and
/// every block must have the layout's block size. Since the collection
/// is only handed over after all workers joined, a violation means the
/// fork-join discipline was broken and is reported as an [IndexError].
pub fn merge_blocks(
    layout: &BlockLayout,
    mut blocks: HashMap<BlockIndex, Grid>,
) -> Result<Grid, SimulationError> {
    let mut global = Grid::new(layout.dimension(), layout.dimension());
    for index in layout.indices() {
        let block = blocks.remove(&index).ok_or(IndexError(format!(
            "no block was produced for index [{},{}]",
            index.row, index.col
        )))?;
        if block.height() != layout.block_size() || block.width() != layout.block_size() {
            return Err(IndexError(format!(
                "block [{},{}] has size {}x{} but the layout requires {}x{}",
                index.row,
                index.col,
                block.height(),
                block.width(),
                layout.block_size(),
                layout.block_size()
            ))
            .into());
        }
        let (offset_y, offset_x) = layout.offset(index);
        global.blit_from(offset_y, offset_x, &block)?;
    }
    if let Some(index) = blocks.keys().next() {
        return Err(IndexError(format!(
            "block [{},{}] lies outside of the layout",
            index.row, index.col
        ))
        .into());
    }
    Ok(global)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout_rejects_indivisible_dimension() {
        assert!(BlockLayout::new(10, 3).is_err());
        assert!(BlockLayout::new(7, 2).is_err());
        assert!(BlockLayout::new(10, 5).is_ok());
    }

    #[test]
    fn layout_rejects_zero_values() {
        assert!(BlockLayout::new(0, 2).is_err());
        assert!(BlockLayout::new(8, 0).is_err());
    }

    #[test]
    fn indices_enumerate_every_block_once() {
        let layout = BlockLayout::new(6, 3).unwrap();
        let indices: Vec<_> = layout.indices().collect();
        assert_eq!(indices.len(), 9);
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(
                    indices
                        .iter()
                        .filter(|i| i.row == row && i.col == col)
                        .count(),
                    1
                );
            }
        }
    }

    #[test]
    fn offsets_are_disjoint_multiples_of_block_size() {
        let layout = BlockLayout::new(12, 4).unwrap();
        let offsets: Vec<_> = layout.indices().map(|i| layout.offset(i)).collect();
        for offset in offsets.iter() {
            assert_eq!(offset.0 % 3, 0);
            assert_eq!(offset.1 % 3, 0);
            assert_eq!(offsets.iter().filter(|o| o == &offset).count(), 1);
        }
    }

    fn four_marked_blocks(layout: &BlockLayout) -> HashMap<BlockIndex, Grid> {
        // Mark each block with a single live cell at (row, col) so the
        // merged result reveals which block ended up where.
        layout
            .indices()
            .map(|index| {
                let mut block = Grid::new(layout.block_size(), layout.block_size());
                block.set(index.row, index.col, 1);
                (index, block)
            })
            .collect()
    }

    #[test]
    fn merge_places_every_block_at_its_offset() {
        let layout = BlockLayout::new(4, 2).unwrap();
        let blocks = four_marked_blocks(&layout);
        let global = merge_blocks(&layout, blocks).unwrap();
        assert_eq!(global.height(), 4);
        assert_eq!(global.width(), 4);
        assert_eq!(global.n_live(), 4);
        assert_eq!(global.get(0, 0), 1);
        assert_eq!(global.get(0, 3), 1);
        assert_eq!(global.get(3, 0), 1);
        assert_eq!(global.get(3, 3), 1);
    }

    #[test]
    fn merge_single_block_is_the_identity() {
        let layout = BlockLayout::new(5, 1).unwrap();
        let mut block = Grid::new(5, 5);
        block.set(2, 3, 1);
        block.set(4, 0, 1);
        let expected = block.clone();
        let blocks = HashMap::from([(BlockIndex { row: 0, col: 0 }, block)]);
        assert_eq!(merge_blocks(&layout, blocks).unwrap(), expected);
    }

    #[test]
    fn merge_rejects_missing_block() {
        let layout = BlockLayout::new(4, 2).unwrap();
        let mut blocks = four_marked_blocks(&layout);
        blocks.remove(&BlockIndex { row: 1, col: 0 });
        assert!(merge_blocks(&layout, blocks).is_err());
    }

    #[test]
    fn merge_rejects_stray_block() {
        let layout = BlockLayout::new(4, 2).unwrap();
        let mut blocks = four_marked_blocks(&layout);
        blocks.insert(BlockIndex { row: 5, col: 5 }, Grid::new(2, 2));
        assert!(merge_blocks(&layout, blocks).is_err());
    }

    #[test]
    fn merge_rejects_block_of_wrong_size() {
        let layout = BlockLayout::new(4, 2).unwrap();
        let mut blocks = four_marked_blocks(&layout);
        blocks.insert(BlockIndex { row: 0, col: 0 }, Grid::new(3, 3));
        assert!(merge_blocks(&layout, blocks).is_err());
    }

    #[test]
    fn merged_tiles_match_independently_seeded_blocks() {
        use rand::SeedableRng;

        // Seeding through disjoint tiles of a shared grid must yield
        // exactly the same result as seeding separate blocks and
        // merging them afterwards.
        let layout = BlockLayout::new(6, 3).unwrap();
        let mut shared = Grid::new(6, 6);
        let tiles = shared.partition_tiles_mut(3).unwrap();
        for (n, mut tile) in tiles.into_iter().enumerate() {
            let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(n as u64);
            tile.fill_random(&mut rng);
        }

        let blocks: HashMap<_, _> = layout
            .indices()
            .enumerate()
            .map(|(n, index)| {
                let mut block = Grid::new(2, 2);
                let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(n as u64);
                block.fill_random(&mut rng);
                (index, block)
            })
            .collect();
        let merged = merge_blocks(&layout, blocks).unwrap();
        assert_eq!(shared, merged);
    }
}
