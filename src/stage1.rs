//! Stage 1: drives the walker fleet in batches across a CPU pool and hands
//! every batch of DP buffers to the serial merger. The scope join at the end
//! of each batch is the only synchronization point; walkers share nothing
//! while stepping.

use std::thread;

use crate::config::Params;
use crate::error::Error;
use crate::hash::ChainHash;
use crate::table::{ChainTable, DpCollision, Merger};
use crate::walker::Walker;

/// Per-batch observables, handed to the monitor callback after the merge.
#[derive(Debug, Clone, Copy)]
pub struct BatchStats {
    pub batch: u64,
    pub total_hashes: u64,
    pub chains: usize,
    pub max_dp: usize,
    pub dropped: u64,
}

/// Stage-1 outcome: totals plus the first cross-chain DP hit, if the batch
/// budget allowed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOneResult {
    pub collision: Option<DpCollision>,
    pub total_hashes: u64,
    pub batches: u64,
}

pub struct Collider<H: ChainHash> {
    hash: H,
    params: Params,
    walkers: Vec<Walker>,
    merger: Merger,
    pool: usize,
}

impl<H: ChainHash> Collider<H> {
    pub fn new(hash: H, params: Params) -> Result<Self, Error> {
        params.validate(hash.output_len())?;
        let walkers = (0..params.threads)
            .map(|w| Walker::seed(&hash, &params, w as u32))
            .collect();
        let merger = Merger::new(hash.output_len(), &params);
        let pool = num_cpus::get().max(1);
        Ok(Collider {
            hash,
            params,
            walkers,
            merger,
            pool,
        })
    }

    pub fn hash(&self) -> &H {
        &self.hash
    }

    pub fn table(&self) -> &ChainTable {
        self.merger.table()
    }

    /// Runs batches until the merger reports a cross-chain hit or the soft
    /// batch budget runs out. `on_batch` observes every completed,
    /// non-terminal batch.
    pub fn run<F: FnMut(&BatchStats)>(&mut self, mut on_batch: F) -> Result<StageOneResult, Error> {
        let mut batches = 0u64;
        loop {
            self.run_batch();
            batches += 1;

            let total_hashes = self.walkers.iter().map(|w| w.hash_count()).sum();
            let max_dp = self.walkers.iter().map(|w| w.buffer().len()).max().unwrap_or(0);
            let dropped = self.walkers.iter().map(|w| w.buffer().dropped()).sum();

            let hit = self
                .merger
                .merge(self.walkers.iter().map(|w| w.buffer()), &self.params)?;
            for walker in &mut self.walkers {
                walker.buffer.clear();
            }

            if let Some(collision) = hit {
                return Ok(StageOneResult {
                    collision: Some(collision),
                    total_hashes,
                    batches,
                });
            }

            on_batch(&BatchStats {
                batch: batches,
                total_hashes,
                chains: self.merger.table().len(),
                max_dp,
                dropped,
            });

            if let Some(cap) = self.params.max_batches {
                if batches >= cap {
                    return Ok(StageOneResult {
                        collision: None,
                        total_hashes,
                        batches,
                    });
                }
            }
        }
    }

    /// Steps every walker `batch_size` times. The walker vector is split
    /// into one disjoint chunk per pool core; the scope join is the batch
    /// barrier.
    fn run_batch(&mut self) {
        let hash = &self.hash;
        let params = &self.params;
        let batch_size = self.params.batch_size;
        let chunk_len = self.walkers.len().div_ceil(self.pool);
        thread::scope(|scope| {
            for chunk in self.walkers.chunks_mut(chunk_len) {
                scope.spawn(move || {
                    for walker in chunk {
                        for _ in 0..batch_size {
                            walker.step(hash, params);
                        }
                    }
                });
            }
        });
    }
}
