use core::marker::PhantomData;
use sha2::Digest;

/// One application of the underlying hash primitive. The engine only ever
/// needs the digest width and a single-shot `input -> digest` call, so the
/// primitive stays a black box behind this seam.
pub trait ChainHash: Sync {
    /// Digest width in bytes.
    fn output_len(&self) -> usize;
    /// Hashes `input` into `out`; `out` must be exactly `output_len` bytes.
    fn hash(&self, input: &[u8], out: &mut [u8]);
}

/// SHA-2 variant tag used for dispatch at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashVariant {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
}

impl HashVariant {
    pub fn name(self) -> &'static str {
        match self {
            HashVariant::Sha224 => "SHA-224",
            HashVariant::Sha256 => "SHA-256",
            HashVariant::Sha384 => "SHA-384",
            HashVariant::Sha512 => "SHA-512",
            HashVariant::Sha512_224 => "SHA-512/224",
            HashVariant::Sha512_256 => "SHA-512/256",
        }
    }
}

/// [`ChainHash`] over any RustCrypto SHA-2 implementation.
pub struct Sha2<D>(PhantomData<D>);

impl<D> Sha2<D> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<D> Default for Sha2<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Digest + Sync> ChainHash for Sha2<D> {
    fn output_len(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn hash(&self, input: &[u8], out: &mut [u8]) {
        out.copy_from_slice(&D::digest(input));
    }
}

/// Reduced stand-in hash for tests: two output bytes of folded FNV-1a, so
/// whole chains fit in a 2^16 space and collisions show up in milliseconds.
#[cfg(test)]
pub(crate) struct ToyHash;

#[cfg(test)]
impl ChainHash for ToyHash {
    fn output_len(&self) -> usize {
        2
    }

    fn hash(&self, input: &[u8], out: &mut [u8]) {
        let mut acc: u32 = 0x811c_9dc5;
        for &b in input {
            acc ^= u32::from(b);
            acc = acc.wrapping_mul(0x0100_0193);
        }
        acc ^= acc >> 16;
        out.copy_from_slice(&(acc as u16).to_le_bytes());
    }
}
