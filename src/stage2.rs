//! Stage 2: deterministic backtracking. Replays the two colliding chains,
//! advances the longer one until both have the same number of steps left,
//! then walks them together to the point where their digests first agree on
//! the leading `n` bytes.

use crate::config::Params;
use crate::hash::ChainHash;
use crate::table::DpCollision;
use crate::walker::write_middle;

/// One replayed chain: current input, its digest, and the hashes spent.
#[derive(Debug, Clone)]
pub struct ChainState {
    pub input: Vec<u8>,
    pub digest: Vec<u8>,
    pub hash_count: u64,
}

impl ChainState {
    /// Hashes the given input once, so the state sits one iteration into
    /// the chain, mirroring how step counts were recorded in stage 1.
    pub fn new<H: ChainHash>(hash: &H, input: Vec<u8>) -> Self {
        let mut digest = vec![0u8; hash.output_len()];
        hash.hash(&input, &mut digest);
        ChainState {
            input,
            digest,
            hash_count: 1,
        }
    }

    pub fn step<H: ChainHash>(&mut self, hash: &H, params: &Params) {
        write_middle(params, &self.digest, &mut self.input);
        hash.hash(&self.input, &mut self.digest);
        self.hash_count += 1;
    }

    /// Chain-state equality: the first `n` digest bytes are identical.
    pub fn matches(&self, other: &Self, n: usize) -> bool {
        self.digest[..n] == other.digest[..n]
    }
}

/// How the joint walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Two distinct inputs whose digests agree on the first `n` bytes.
    Collision,
    /// The two chains were one walk all along; the meeting point is a single
    /// input hashed twice, not a collision.
    SameChain,
    /// The step counters ran out before the digests matched.
    NoMeet,
}

/// Backtracks a stage-1 DP hit to the colliding inputs.
pub struct Aligner {
    pub x: ChainState,
    pub y: ChainState,
    pub x_remaining: u64,
    pub y_remaining: u64,
}

impl Aligner {
    pub fn new<H: ChainHash>(hash: &H, collision: &DpCollision) -> Self {
        Aligner {
            x: ChainState::new(hash, collision.x.clone()),
            y: ChainState::new(hash, collision.y.clone()),
            x_remaining: collision.x_steps,
            y_remaining: collision.y_steps,
        }
    }

    /// Advances the longer chain until both have equally many steps left.
    /// At most one of the two loops runs.
    pub fn align<H: ChainHash>(&mut self, hash: &H, params: &Params) {
        while self.x_remaining > self.y_remaining {
            self.x.step(hash, params);
            self.x_remaining -= 1;
        }
        while self.y_remaining > self.x_remaining {
            self.y.step(hash, params);
            self.y_remaining -= 1;
        }
    }

    /// Walks both chains in lockstep until they meet or run out of steps.
    pub fn walk<H: ChainHash>(&mut self, hash: &H, params: &Params) {
        while !self.x.matches(&self.y, params.n)
            && self.x_remaining > 0
            && self.y_remaining > 0
        {
            self.x.step(hash, params);
            self.y.step(hash, params);
            self.x_remaining -= 1;
            self.y_remaining -= 1;
        }
    }

    pub fn outcome(&self, n: usize) -> Outcome {
        if !self.x.matches(&self.y, n) {
            Outcome::NoMeet
        } else if self.x.input == self.y.input {
            Outcome::SameChain
        } else {
            Outcome::Collision
        }
    }
}
