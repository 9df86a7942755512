//! Compile-time search configuration. Every knob of the engine lives in the
//! constant block below; [`Params`] carries a copy through the engine so the
//! reduced test hashes can run with their own values.

use crate::error::Error;
use crate::hash::HashVariant;

/// SHA-2 variant the search runs against.
pub const VARIANT: HashVariant = HashVariant::Sha256;

/// Partial-collision width in bytes; also the width of the variable middle
/// of every input.
pub const N: usize = 8;

/// Distinguishable-point discriminator width in bytes (k <= n). A digest is
/// a DP when its first `K` bytes are zero, so DPs occur once per 2^(8K)
/// hashes on average.
pub const K: usize = 2;

/// Fixed leading bytes of every input.
pub const PREFIX: &[u8] = &[0x00, 0x11, 0x22, 0x33];

/// Fixed trailing bytes of every input.
pub const SUFFIX: &[u8] = &[0x33, 0x22, 0x11, 0x00];

/// Logical walkers stepped in parallel each batch.
pub const THREADS: usize = 20_000;

/// Steps every walker performs between host-side merges.
pub const BATCH_SIZE: u64 = 100_000;

/// Per-walker DP buffer capacity. Must comfortably exceed the expected
/// `BATCH_SIZE / 2^(8K)` DPs per batch; overflow records are dropped.
pub const DP_ARRAY_LEN: usize = 100;

/// Soft cap on stage-1 batches. `None` runs until the first cross-chain hit.
pub const MAX_BATCHES: Option<u64> = None;

#[derive(Debug, Clone)]
pub struct Params {
    pub n: usize,
    pub k: usize,
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
    pub threads: usize,
    pub batch_size: u64,
    pub dp_array_len: usize,
    pub max_batches: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            n: N,
            k: K,
            prefix: PREFIX.to_vec(),
            suffix: SUFFIX.to_vec(),
            threads: THREADS,
            batch_size: BATCH_SIZE,
            dp_array_len: DP_ARRAY_LEN,
            max_batches: MAX_BATCHES,
        }
    }
}

impl Params {
    /// Total input length: `|prefix| + n + |suffix|`.
    pub fn input_len(&self) -> usize {
        self.prefix.len() + self.n + self.suffix.len()
    }

    pub fn validate(&self, digest_len: usize) -> Result<(), Error> {
        if self.n == 0 {
            return Err(Error::ZeroParam("n"));
        }
        if self.k == 0 {
            return Err(Error::ZeroParam("k"));
        }
        if self.threads == 0 {
            return Err(Error::ZeroParam("threads"));
        }
        if self.batch_size == 0 {
            return Err(Error::ZeroParam("batch_size"));
        }
        if self.dp_array_len == 0 {
            return Err(Error::ZeroParam("dp_array_len"));
        }
        if self.k > self.n {
            return Err(Error::KExceedsN {
                k: self.k,
                n: self.n,
            });
        }
        if self.n > digest_len {
            return Err(Error::NExceedsDigest {
                n: self.n,
                digest_len,
            });
        }
        Ok(())
    }
}
