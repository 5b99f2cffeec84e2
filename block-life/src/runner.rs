use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{merge_blocks, BlockIndex, BlockLayout};
use crate::errors::{IndexError, SetupError, SimulationError};
use crate::grid::Grid;
use crate::worker::{derive_seed, BlockWorker};

/// Specify settings surrounding execution and observability.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Number of threads used for executing the simulation in parallel.
    /// The number of logical tasks is given by the block layout and may
    /// exceed this value; tasks are then scheduled onto the pool.
    pub n_threads: core::num::NonZeroUsize,
    /// Number of generations every block is evolved for.
    pub iterations: usize,
    /// Base seed for all random state. `None` seeds from the wall
    /// clock, reproducing independent state on every run.
    pub rng_seed: Option<u64>,
    /// Determines if a progress bar should be shown during execution.
    pub show_progressbar: bool,
}

impl Settings {
    /// Construct settings with as many threads as the system offers.
    pub fn with_available_parallelism(iterations: usize) -> Result<Self, SimulationError> {
        Ok(Self {
            n_threads: std::thread::available_parallelism()?,
            iterations,
            rng_seed: None,
            show_progressbar: false,
        })
    }
}

/// Execution phase of a [SimulationRunner].
///
/// Phases advance strictly in declaration order and no phase is ever
/// revisited. Between [InitialReady](Phase::InitialReady) and
/// [Evolving](Phase::Evolving) the caller is expected to render the
/// initial grid.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Phase {
    /// No work has happened yet.
    Idle,
    /// The initial-state tasks are filling the shared display grid.
    SeedingInitial,
    /// The initial grid has been produced and can be rendered.
    InitialReady,
    /// The block workers are evolving their blocks.
    Evolving,
    /// All workers joined; blocks are being assembled.
    Merging,
    /// The final grid has been produced and can be rendered.
    FinalReady,
    /// The run is complete.
    Done,
}

/// Drives one complete simulation run through its phases.
///
/// The runner owns the thread pool and suspends only at the two
/// fork-join barriers: once after the initial-state tasks and once
/// after the block workers. Workers never wait on each other since
/// every task owns a disjoint region of memory.
///
/// ```no_run
/// # use block_life::{BlockLayout, Settings, SimulationRunner};
/// let layout = BlockLayout::new(20, 4)?;
/// let settings = Settings::with_available_parallelism(10)?;
/// let mut runner = SimulationRunner::new(layout, settings)?;
/// let initial = runner.build_initial()?;
/// print!("{initial}");
/// let final_grid = runner.simulate()?;
/// print!("{final_grid}");
/// runner.finish()?;
/// # Result::<(), block_life::SimulationError>::Ok(())
/// ```
pub struct SimulationRunner {
    layout: BlockLayout,
    settings: Settings,
    pool: rayon::ThreadPool,
    stop: Arc<AtomicBool>,
    phase: Phase,
}

impl SimulationRunner {
    /// Construct a runner for the given layout and settings.
    pub fn new(layout: BlockLayout, settings: Settings) -> Result<Self, SimulationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.n_threads.get())
            .build()?;
        Ok(Self {
            layout,
            settings,
            pool,
            stop: Arc::new(AtomicBool::new(false)),
            phase: Phase::Idle,
        })
    }

    /// Current phase of the run.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Block layout this runner operates on.
    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Request cooperative cancellation of the evolution phase.
    ///
    /// Workers observe the token at the start of every generation and
    /// abandon their remaining steps; already finished blocks are not
    /// affected and the merge still receives every block.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn expect_phase(&self, expected: Phase, operation: &str) -> Result<(), SetupError> {
        if self.phase != expected {
            return Err(SetupError(format!(
                "cannot {} while the runner is in the {:?} phase",
                operation, self.phase
            )));
        }
        Ok(())
    }

    /// Run the initial-state phase and return the filled global grid.
    ///
    /// One task per block fills its own tile of the shared grid with
    /// random state. The tiles are pairwise disjoint views into the
    /// same allocation, so the tasks mutate shared memory without any
    /// locking. This grid exists for display only and is not the state
    /// the evolution phase starts from; the workers reseed
    /// independently.
    pub fn build_initial(&mut self) -> Result<Grid, SimulationError> {
        self.expect_phase(Phase::Idle, "build the initial state")?;
        self.phase = Phase::SeedingInitial;
        tracing::debug!(
            dimension = self.layout.dimension(),
            divisions = self.layout.divisions(),
            "seeding initial grid"
        );

        let mut grid = Grid::new(self.layout.dimension(), self.layout.dimension());
        let tiles = grid.partition_tiles_mut(self.layout.divisions())?;
        let seeds: Vec<u64> = (0..self.layout.n_blocks())
            .map(|id| derive_seed(self.settings.rng_seed, id))
            .collect();
        self.pool.install(|| {
            tiles
                .into_par_iter()
                .zip(seeds.into_par_iter())
                .for_each(|(mut tile, seed)| {
                    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
                    tile.fill_random(&mut rng);
                });
        });

        self.phase = Phase::InitialReady;
        Ok(grid)
    }

    /// Run the evolution phase and return the merged final grid.
    ///
    /// Spawns one worker per block, joins them all and only then drains
    /// the result channel, so every block is guaranteed to have arrived
    /// before the merge reads the collection.
    pub fn simulate(&mut self) -> Result<Grid, SimulationError> {
        self.expect_phase(Phase::InitialReady, "simulate")?;
        self.phase = Phase::Evolving;
        let n_blocks = self.layout.n_blocks();
        tracing::debug!(
            n_blocks,
            iterations = self.settings.iterations,
            "evolving blocks"
        );

        let (sender, receiver) = crossbeam_channel::bounded(n_blocks);
        let workers: Vec<BlockWorker> = self
            .layout
            .indices()
            .enumerate()
            .map(|(n, index)| {
                // The evolution phase draws from a seed range disjoint
                // from the initial-state phase.
                let id = n_blocks + n;
                BlockWorker {
                    id,
                    index,
                    block_size: self.layout.block_size(),
                    iterations: self.settings.iterations,
                    seed: derive_seed(self.settings.rng_seed, id),
                    show_progress: self.settings.show_progressbar && n == 0,
                }
            })
            .collect();
        let stop = Arc::clone(&self.stop);
        self.pool.install(|| {
            workers
                .into_par_iter()
                .map(|worker| worker.run(&sender, &stop))
                .collect::<Result<Vec<_>, SimulationError>>()
        })?;
        drop(sender);

        self.phase = Phase::Merging;
        tracing::debug!(n_blocks, "merging blocks");
        let mut blocks = HashMap::with_capacity(n_blocks);
        for message in receiver.try_iter() {
            let index = BlockIndex {
                row: message.row,
                col: message.col,
            };
            if blocks.insert(index, message.block).is_some() {
                return Err(IndexError(format!(
                    "received two blocks for index [{},{}]",
                    index.row, index.col
                ))
                .into());
            }
        }
        let global = merge_blocks(&self.layout, blocks)?;

        self.phase = Phase::FinalReady;
        Ok(global)
    }

    /// Mark the run as complete.
    pub fn finish(&mut self) -> Result<(), SimulationError> {
        self.expect_phase(Phase::FinalReady, "finish")?;
        self.phase = Phase::Done;
        tracing::debug!("simulation run complete");
        Ok(())
    }
}
