//! Host-side chain table: maps DP keys to the chain start that reached them,
//! and detects the first cross-chain hit while draining per-walker buffers.

use core::hash::{Hash, Hasher};
use std::collections::HashMap;

use crate::config::Params;
use crate::error::Error;
use crate::walker::{format_input, seed_digest, DpBuffer};

/// Key over a DP digest. Equality compares the first `n` digest bytes; the
/// bucket hash is a little-endian word read at byte offset `k`, clamped to
/// `n`. Bytes [0..k) are forced zero on every DP and carry no bucketing
/// entropy, but they stay part of the equality, which is authoritative.
#[derive(Debug, Clone)]
pub struct DpKey {
    prefix: Vec<u8>,
    word: u64,
}

impl DpKey {
    pub fn new(digest: &[u8], params: &Params) -> Self {
        let hi = params.n.min(params.k + 8);
        let mut word = [0u8; 8];
        word[..hi - params.k].copy_from_slice(&digest[params.k..hi]);
        DpKey {
            prefix: digest[..params.n].to_vec(),
            word: u64::from_le_bytes(word),
        }
    }
}

impl PartialEq for DpKey {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}

impl Eq for DpKey {}

impl Hash for DpKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.word);
    }
}

/// A chain as the table stores it: the input that opened it and the number
/// of fixed-point iterations from there to the keyed DP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub start: Vec<u8>,
    pub length: u64,
}

#[derive(Debug, Default)]
pub struct ChainTable {
    map: HashMap<DpKey, ChainEntry>,
}

impl ChainTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &DpKey) -> Option<&ChainEntry> {
        self.map.get(key)
    }

    /// Inserts, surfacing allocation failure instead of aborting the process.
    pub fn insert(&mut self, key: DpKey, entry: ChainEntry) -> Result<(), Error> {
        self.map
            .try_reserve(1)
            .map_err(|_| Error::ChainTableFull)?;
        self.map.insert(key, entry);
        Ok(())
    }
}

/// First cross-chain DP hit: two chain starts whose walks reach the same
/// DP key after the recorded step counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpCollision {
    pub x: Vec<u8>,
    pub x_steps: u64,
    pub y: Vec<u8>,
    pub y_steps: u64,
    pub dp_digest: Vec<u8>,
}

/// Serial DP merger. Owns the chain table plus one chain tail per walker;
/// only the host thread ever touches it, between batches.
pub struct Merger {
    table: ChainTable,
    last_dp: Vec<Vec<u8>>,
}

impl Merger {
    /// Every walker's tail opens at its formatted seed digest, so the first
    /// DP it reports chains from the seeding iteration onward.
    pub fn new(digest_len: usize, params: &Params) -> Self {
        let last_dp = (0..params.threads)
            .map(|w| format_input(params, &seed_digest(digest_len, w as u32)))
            .collect();
        Merger {
            table: ChainTable::new(),
            last_dp,
        }
    }

    pub fn table(&self) -> &ChainTable {
        &self.table
    }

    /// Drains one batch of DP buffers in canonical order (walker index
    /// ascending, then production order) and returns the first key already
    /// present in the table. The stored entry may come from any earlier
    /// walker, including the reporting one.
    pub fn merge<'a, I>(&mut self, buffers: I, params: &Params) -> Result<Option<DpCollision>, Error>
    where
        I: IntoIterator<Item = &'a DpBuffer>,
    {
        for (w, buffer) in buffers.into_iter().enumerate() {
            for record in buffer.records() {
                let key = DpKey::new(&record.digest, params);
                if let Some(entry) = self.table.get(&key) {
                    return Ok(Some(DpCollision {
                        x: entry.start.clone(),
                        x_steps: entry.length,
                        y: self.last_dp[w].clone(),
                        y_steps: record.steps_since_last_dp,
                        dp_digest: record.digest.clone(),
                    }));
                }
                self.table.insert(
                    key,
                    ChainEntry {
                        start: self.last_dp[w].clone(),
                        length: record.steps_since_last_dp,
                    },
                )?;
                // The next DP from this walker chains from the freshly
                // formatted DP digest, not from the recorded input.
                self.last_dp[w] = format_input(params, &record.digest);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::DpRecord;
    use rand::{Rng, SeedableRng};

    fn params() -> Params {
        Params {
            n: 4,
            k: 1,
            prefix: vec![0xaa],
            suffix: vec![0xbb],
            threads: 2,
            batch_size: 16,
            dp_array_len: 8,
            max_batches: None,
        }
    }

    fn dp_digest(tail: &[u8]) -> Vec<u8> {
        // k leading zero bytes, then the distinguishing tail.
        let mut digest = vec![0u8];
        digest.extend_from_slice(tail);
        digest
    }

    fn buffer(records: &[DpRecord], capacity: usize) -> DpBuffer {
        let mut buf = DpBuffer::new(capacity);
        for r in records {
            assert!(buf.try_push(r.clone()));
        }
        buf
    }

    #[test]
    fn key_equality_covers_exactly_n_bytes() {
        let p = params();
        let a = DpKey::new(&[0, 1, 2, 3, 4, 5], &p);
        let b = DpKey::new(&[0, 1, 2, 3, 9, 9], &p);
        let c = DpKey::new(&[0, 1, 2, 9, 4, 5], &p);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn equal_keys_share_a_bucket_word() {
        // HashMap requires eq keys to hash identically even when the digests
        // diverge past byte n.
        let p = params();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let mut x = vec![0u8; 8];
            rng.fill(&mut x[1..]);
            let mut y = x.clone();
            rng.fill(&mut y[p.n..]);
            let (kx, ky) = (DpKey::new(&x, &p), DpKey::new(&y, &p));
            assert_eq!(kx, ky);
            assert_eq!(kx.word, ky.word);
        }
    }

    #[test]
    fn table_insert_and_lookup_round_trip() {
        let p = params();
        let mut table = ChainTable::new();
        let entry = ChainEntry {
            start: vec![1, 2, 3],
            length: 9,
        };
        table
            .insert(DpKey::new(&dp_digest(&[1, 2, 3, 4]), &p), entry.clone())
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&DpKey::new(&dp_digest(&[1, 2, 3, 4]), &p)),
            Some(&entry)
        );
        assert!(table.get(&DpKey::new(&dp_digest(&[9, 2, 3, 4]), &p)).is_none());
    }

    #[test]
    fn merge_chains_forward_per_walker() {
        let p = params();
        let mut merger = Merger::new(5, &p);
        let first = DpRecord {
            input: vec![0xaa, 1, 1, 1, 1, 0xbb],
            digest: dp_digest(&[1, 1, 1, 7]),
            steps_since_last_dp: 5,
        };
        let second = DpRecord {
            input: vec![0xaa, 2, 2, 2, 2, 0xbb],
            digest: dp_digest(&[2, 2, 2, 7]),
            steps_since_last_dp: 3,
        };
        let buffers = [buffer(&[first.clone(), second.clone()], 8), buffer(&[], 8)];
        let hit = merger.merge(buffers.iter(), &p).unwrap();
        assert!(hit.is_none());
        assert_eq!(merger.table().len(), 2);

        // The first entry opens at the seed tail, the second at the
        // formatted digest of the first DP.
        let seed_tail = format_input(&p, &seed_digest(5, 0));
        let e1 = merger
            .table()
            .get(&DpKey::new(&first.digest, &p))
            .unwrap()
            .clone();
        assert_eq!(e1, ChainEntry { start: seed_tail, length: 5 });
        let e2 = merger
            .table()
            .get(&DpKey::new(&second.digest, &p))
            .unwrap()
            .clone();
        assert_eq!(
            e2,
            ChainEntry {
                start: format_input(&p, &first.digest),
                length: 3
            }
        );
    }

    #[test]
    fn merge_reports_the_stored_chain_on_a_repeat_key() {
        let p = params();
        let mut merger = Merger::new(5, &p);
        let dp = dp_digest(&[5, 5, 5, 1]);
        let original = DpRecord {
            input: vec![0xaa, 9, 9, 9, 9, 0xbb],
            digest: dp.clone(),
            steps_since_last_dp: 11,
        };
        merger
            .merge([buffer(&[original], 8), buffer(&[], 8)].iter(), &p)
            .unwrap();

        // Same key from the other walker, differing past byte n.
        let mut later_digest = dp.clone();
        later_digest.push(0xff);
        let repeat = DpRecord {
            input: vec![0xaa, 8, 8, 8, 8, 0xbb],
            digest: later_digest.clone(),
            steps_since_last_dp: 4,
        };
        let hit = merger
            .merge([buffer(&[], 8), buffer(&[repeat], 8)].iter(), &p)
            .unwrap()
            .expect("repeat key must collide");
        assert_eq!(hit.x, format_input(&p, &seed_digest(5, 0)));
        assert_eq!(hit.x_steps, 11);
        assert_eq!(hit.y, format_input(&p, &seed_digest(5, 1)));
        assert_eq!(hit.y_steps, 4);
        assert_eq!(hit.dp_digest, later_digest);
    }

    #[test]
    fn merge_tie_break_prefers_the_lowest_walker_index() {
        let p = params();
        let mut merger = Merger::new(5, &p);
        let dp = dp_digest(&[3, 3, 3, 3]);
        let stored = DpRecord {
            input: vec![0xaa, 1, 1, 1, 1, 0xbb],
            digest: dp.clone(),
            steps_since_last_dp: 2,
        };
        merger
            .merge([buffer(&[], 8), buffer(&[stored], 8)].iter(), &p)
            .unwrap();

        // Both walkers report the stored key in the same batch; the hit must
        // come from walker 0.
        let from_w0 = DpRecord {
            input: vec![0xaa, 4, 4, 4, 4, 0xbb],
            digest: dp.clone(),
            steps_since_last_dp: 6,
        };
        let from_w1 = DpRecord {
            input: vec![0xaa, 5, 5, 5, 5, 0xbb],
            digest: dp.clone(),
            steps_since_last_dp: 7,
        };
        let hit = merger
            .merge([buffer(&[from_w0], 8), buffer(&[from_w1], 8)].iter(), &p)
            .unwrap()
            .expect("both walkers repeat the key");
        assert_eq!(hit.y_steps, 6);
        assert_eq!(hit.y, format_input(&p, &seed_digest(5, 0)));
    }

    #[test]
    fn with_k_equal_to_n_any_two_dps_collide() {
        // The DP predicate and the collision predicate coincide: every DP
        // digest carries the all-zero key, so the second record seen is the
        // hit.
        let mut p = params();
        p.k = 4;
        let mut merger = Merger::new(5, &p);
        let first = DpRecord {
            input: vec![0xaa, 1, 1, 1, 1, 0xbb],
            digest: vec![0, 0, 0, 0, 0x07],
            steps_since_last_dp: 9,
        };
        let second = DpRecord {
            input: vec![0xaa, 2, 2, 2, 2, 0xbb],
            digest: vec![0, 0, 0, 0, 0x31],
            steps_since_last_dp: 2,
        };
        let hit = merger
            .merge([buffer(&[first], 8), buffer(&[second], 8)].iter(), &p)
            .unwrap()
            .expect("all zero-key DPs collide");
        assert_eq!(hit.x_steps, 9);
        assert_eq!(hit.y_steps, 2);
        assert_eq!(merger.table().len(), 1);
    }

    #[test]
    fn empty_buffers_leave_the_merger_untouched() {
        let p = params();
        let mut merger = Merger::new(5, &p);
        let tails_before = merger.last_dp.clone();
        let hit = merger
            .merge([buffer(&[], 8), buffer(&[], 8)].iter(), &p)
            .unwrap();
        assert!(hit.is_none());
        assert!(merger.table().is_empty());
        assert_eq!(merger.last_dp, tails_before);
    }
}
