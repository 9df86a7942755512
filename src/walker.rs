//! Stage-1 walkers: the fixed-point iteration `h -> SHA(prefix ‖ h[0..n] ‖
//! suffix)` plus the per-walker bookkeeping that turns DP sightings into
//! bounded buffers the host merges between batches.

use crate::config::Params;
use crate::hash::ChainHash;

/// Builds `prefix ‖ digest[0..n] ‖ suffix`.
pub fn format_input(params: &Params, digest: &[u8]) -> Vec<u8> {
    let mut input = vec![0u8; params.input_len()];
    input[..params.prefix.len()].copy_from_slice(&params.prefix);
    input[params.prefix.len() + params.n..].copy_from_slice(&params.suffix);
    write_middle(params, digest, &mut input);
    input
}

/// Overwrites only the middle section; prefix and suffix never change.
pub(crate) fn write_middle(params: &Params, digest: &[u8], input: &mut [u8]) {
    let p = params.prefix.len();
    input[p..p + params.n].copy_from_slice(&digest[..params.n]);
}

/// A digest is a distinguishable point when its first `k` bytes are zero.
pub fn is_dp(digest: &[u8], k: usize) -> bool {
    digest[..k].iter().all(|&b| b == 0)
}

/// Deterministic starting digest for walker `seed`: the 32-bit seed written
/// little-endian into the low bytes of a zeroed digest-sized buffer.
pub fn seed_digest(digest_len: usize, seed: u32) -> Vec<u8> {
    let mut digest = vec![0u8; digest_len];
    let len = digest_len.min(4);
    digest[..len].copy_from_slice(&seed.to_le_bytes()[..len]);
    digest
}

/// One recorded DP: the input that hashed to it, the digest itself, and the
/// walk length since the previous recorded DP (or since the chain start).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpRecord {
    pub input: Vec<u8>,
    pub digest: Vec<u8>,
    pub steps_since_last_dp: u64,
}

/// Bounded append-only list of the DPs one walker produced in one batch.
#[derive(Debug)]
pub struct DpBuffer {
    records: Vec<DpRecord>,
    capacity: usize,
    dropped: u64,
}

impl DpBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub(crate) fn try_push(&mut self, record: DpRecord) -> bool {
        if self.records.len() == self.capacity {
            self.dropped += 1;
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[DpRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that could not be stored this batch because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
    }
}

/// Per-walker iteration state. Walkers never share state; the host reads
/// their buffers only at batch boundaries.
#[derive(Debug)]
pub struct Walker {
    pub(crate) input: Vec<u8>,
    pub(crate) digest: Vec<u8>,
    pub(crate) last_dp_input: Vec<u8>,
    pub(crate) hash_count: u64,
    pub(crate) steps_since_last_dp: u64,
    pub(crate) buffer: DpBuffer,
}

impl Walker {
    /// Seeds a walker and performs its first iteration. The seed digest
    /// itself is never DP-tested: its bytes are deterministic, not hash
    /// output, and small seeds would read as spurious DPs.
    pub fn seed<H: ChainHash>(hash: &H, params: &Params, seed: u32) -> Self {
        let digest = seed_digest(hash.output_len(), seed);
        let input = format_input(params, &digest);
        let mut walker = Walker {
            last_dp_input: input.clone(),
            input,
            digest,
            hash_count: 0,
            steps_since_last_dp: 0,
            buffer: DpBuffer::new(params.dp_array_len),
        };
        hash.hash(&walker.input, &mut walker.digest);
        walker.hash_count = 1;
        walker.steps_since_last_dp = 1;
        walker
    }

    /// One fixed-point iteration: format, hash, DP-test, maybe record.
    pub fn step<H: ChainHash>(&mut self, hash: &H, params: &Params) {
        write_middle(params, &self.digest, &mut self.input);
        hash.hash(&self.input, &mut self.digest);
        self.hash_count += 1;
        self.steps_since_last_dp += 1;

        if is_dp(&self.digest, params.k) {
            let recorded = self.buffer.try_push(DpRecord {
                input: self.input.clone(),
                digest: self.digest.clone(),
                steps_since_last_dp: self.steps_since_last_dp,
            });
            // A dropped record is treated as an ordinary point, so the next
            // recorded DP still measures its distance from the last recorded
            // one and chain bookkeeping stays intact.
            if recorded {
                self.last_dp_input.copy_from_slice(&self.input);
                self.steps_since_last_dp = 0;
            }
        }
    }

    pub fn hash_count(&self) -> u64 {
        self.hash_count
    }

    pub fn buffer(&self) -> &DpBuffer {
        &self.buffer
    }
}
