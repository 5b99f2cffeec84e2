use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use kdam::BarExt;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::domain::BlockIndex;
use crate::errors::{SimulationError, TimeError};
use crate::grid::Grid;

/// Finished block tagged with its position in the block arrangement.
///
/// This is the only message type exchanged between a worker and the
/// runner. Ownership of the contained grid transfers to the receiver;
/// the block is never mutated again after being sent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BlockMessage {
    /// Row of the originating block.
    pub row: usize,
    /// Column of the originating block.
    pub col: usize,
    /// Final state of the block after evolution.
    pub block: Grid,
}

/// Derive the seed for the task with the given id.
///
/// Without a base seed the current wall-clock time is used, combined
/// with the task id so that tasks started within the same instant still
/// produce diverging random states. A fixed base seed makes the whole
/// run reproducible.
pub fn derive_seed(base: Option<u64>, id: usize) -> u64 {
    let base = match base {
        Some(base) => base,
        None => std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|duration| duration.as_nanos() as u64)
            .unwrap_or_default(),
    };
    base.wrapping_add(id as u64)
}

/// Evolves one block of the global grid for a fixed number of
/// generations.
///
/// The worker owns its block exclusively: it allocates a fresh grid,
/// seeds it from its own RNG and never communicates with other workers.
/// The only output is a single [BlockMessage] handed to the merge sink.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BlockWorker {
    /// Unique task id, used for seed derivation.
    pub id: usize,
    /// Position of the owned block.
    pub index: BlockIndex,
    /// Side length of the owned block.
    pub block_size: usize,
    /// Number of generations to run.
    pub iterations: usize,
    /// RNG seed for the initial block state.
    pub seed: u64,
    /// Display a progress bar over the generations of this worker.
    pub show_progress: bool,
}

impl BlockWorker {
    /// Allocate and randomly seed the initial state of the owned block.
    pub fn seeded_block(&self) -> Grid {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(self.seed);
        let mut block = Grid::new(self.block_size, self.block_size);
        block.fill_random(&mut rng);
        block
    }

    fn initialize_bar(&self) -> Result<kdam::Bar, TimeError> {
        let bar_format = "\
        {desc}{percentage:3.0}%|{animation}| \
        {count}/{total} \
        [{elapsed}, \
        {rate:.2}{unit}/s{postfix}]";
        Ok(kdam::BarBuilder::default()
            .total(self.iterations)
            .bar_format(bar_format)
            .dynamic_ncols(true)
            .build()?)
    }

    /// Seed the block, evolve it and publish the result to `sink`.
    ///
    /// The generation loop checks the `stop` token before every step; a
    /// cancelled worker abandons its remaining generations but still
    /// emits its block so the merge stays complete. Completion is
    /// announced on stdout for observability only, never for
    /// synchronization.
    pub fn run(&self, sink: &Sender<BlockMessage>, stop: &AtomicBool) -> Result<(), SimulationError> {
        tracing::trace!(
            id = self.id,
            row = self.index.row,
            col = self.index.col,
            iterations = self.iterations,
            "starting block evolution"
        );
        let mut progress_bar = match self.show_progress {
            true => Some(self.initialize_bar()?),
            false => None,
        };

        let mut current = self.seeded_block();
        let mut next = Grid::new(self.block_size, self.block_size);
        for _ in 0..self.iterations {
            if stop.load(Ordering::Relaxed) {
                tracing::debug!(
                    row = self.index.row,
                    col = self.index.col,
                    "evolution cancelled"
                );
                break;
            }
            current.step_into(&mut next);
            std::mem::swap(&mut current, &mut next);
            if let Some(bar) = &mut progress_bar {
                let _ = bar.update(1)?;
            }
        }

        sink.send(BlockMessage {
            row: self.index.row,
            col: self.index.col,
            block: current,
        })?;
        println!("Thread [{},{}] finalizou", self.index.row, self.index.col);
        Ok(())
    }
}
