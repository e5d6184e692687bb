use rand::rngs::OsRng;
use rand::RngCore;

/// A type with the ability to produce cryptographically secure random byte sequences.
///
/// Token values are digests of this output, so a predictable source is a direct path to
/// forgery. Implementations must draw from a cryptographically secure generator and must
/// report failure instead of falling back to a weaker one.
pub trait RandomSource {
    /// Produce a fresh sequence of random bytes.
    ///
    /// Any non-empty output is sufficient, as it is hashed before use.
    fn generate(&mut self) -> Result<Vec<u8>, rand::Error>;
}

/// The default random source with focus on security.
/// It reads `ENTROPY_LENGTH` bytes from [`OsRng`], the entropy source of the operating system.
/// The default of 32 bytes gives 256 bits of entropy, which is more than enough for an
/// unguessable token.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomSource<const ENTROPY_LENGTH: usize = 32>;

impl<const ENTROPY_LENGTH: usize> RandomSource for OsRandomSource<ENTROPY_LENGTH> {
    fn generate(&mut self) -> Result<Vec<u8>, rand::Error> {
        let mut entropy = vec![0; ENTROPY_LENGTH];
        OsRng.try_fill_bytes(&mut entropy)?;
        Ok(entropy)
    }
}

/// A debug random source that produces an ascending sequence of integers, encoded as
/// big-endian bytes. Its output is trivially predictable, so it must not be used outside
/// of tests.
#[derive(Debug, Default)]
#[allow(missing_copy_implementations)]
pub struct DebugRandomSource {
    next_index: u64,
}

impl RandomSource for DebugRandomSource {
    fn generate(&mut self) -> Result<Vec<u8>, rand::Error> {
        let entropy = self.next_index.to_be_bytes().to_vec();
        self.next_index += 1;
        Ok(entropy)
    }
}
