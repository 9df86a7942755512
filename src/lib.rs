//! Parallel Van Oorschot-Wiener partial-collision search over the SHA-2
//! family. Inputs have the fixed shape `prefix ‖ middle ‖ suffix`; walkers
//! iterate `h -> SHA(prefix ‖ h[0..n] ‖ suffix)` and record distinguishable
//! points (digests with `k` leading zero bytes). A host-side chain table
//! detects the first two chains ending in the same DP, and stage 2
//! backtracks them to two distinct inputs whose digests share their first
//! `n` bytes.

pub mod config;
pub mod error;
pub mod hash;
pub mod report;
pub mod stage1;
pub mod stage2;
pub mod table;
pub mod walker;

pub use crate::config::Params;
pub use crate::error::Error;
pub use crate::hash::{ChainHash, HashVariant, Sha2};
pub use crate::stage1::{BatchStats, Collider, StageOneResult};
pub use crate::stage2::{Aligner, ChainState, Outcome};
pub use crate::table::DpCollision;
