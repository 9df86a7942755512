use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("dp width k = {k} exceeds collision width n = {n}")]
    KExceedsN { k: usize, n: usize },
    #[error("collision width n = {n} exceeds digest width {digest_len}")]
    NExceedsDigest { n: usize, digest_len: usize },
    #[error("{0} must be nonzero")]
    ZeroParam(&'static str),
    #[error("chain table exhausted host memory")]
    ChainTableFull,
}
