use crate::csrf_token::random_source::{OsRandomSource, RandomSource};
use crate::error::Error;
use crate::token_store::{TokenSegment, TokenStoreImplementation};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Sources of cryptographically secure randomness for token minting.
pub(crate) mod random_source;

/// The default key under which the anti-forgery token of a session is stored.
pub const DEFAULT_KEY: &str = "value";

/// Anti-forgery tokens for a single session.
///
/// This is the user-facing interface of the crate.
/// It composes a [`TokenSegment`] scoped to one session with a [`RandomSource`] and
/// orchestrates minting, storage, retrieval, validation and rotation of token values.
///
/// A stored token value is always the SHA-512 hex digest of entropy drawn from the
/// random source. The entropy itself is never stored, and neither is any
/// attacker-influenced input.
#[derive(Debug)]
pub struct CsrfTokens<Implementation, Generator = OsRandomSource> {
    segment: TokenSegment<Implementation>,
    random_source: Generator,
}

impl<Implementation: TokenStoreImplementation> CsrfTokens<Implementation> {
    /// Create a new token manager over the given segment, drawing entropy from the
    /// default [`OsRandomSource`].
    pub fn new(segment: TokenSegment<Implementation>) -> Self {
        Self::new_with_random_source(segment, OsRandomSource::default())
    }
}

impl<Implementation: TokenStoreImplementation, Generator: RandomSource>
    CsrfTokens<Implementation, Generator>
{
    /// Create a new token manager over the given segment, drawing entropy from the given
    /// random source.
    pub fn new_with_random_source(
        segment: TokenSegment<Implementation>,
        random_source: Generator,
    ) -> Self {
        Self {
            segment,
            random_source,
        }
    }

    /// Returns the current outgoing token for the [default key](DEFAULT_KEY).
    ///
    /// See [`value_for`](Self::value_for).
    pub async fn value(&mut self) -> Result<String, Error<Implementation::Error>> {
        self.value_for(DEFAULT_KEY).await
    }

    /// Returns the current outgoing token for `key`, to be embedded in an outgoing
    /// response, e.g. as a hidden form field or a header.
    ///
    /// If no token is currently stored under `key`, a fresh one is minted first, so the
    /// returned value is never empty. Repeated calls return the same value until a
    /// validation attempt rotates it.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use session_csrf::{CsrfTokens, MemoryStore, TokenSegment};
    /// # fn main() -> Result<(), session_csrf::Error<std::convert::Infallible>> {
    /// # async_std::task::block_on(async {
    /// let segment = TokenSegment::new(MemoryStore::new(), "session-1");
    /// let mut tokens = CsrfTokens::new(segment);
    /// let first = tokens.value_for("login-form").await?;
    /// let second = tokens.value_for("login-form").await?;
    /// assert_eq!(first, second);
    /// # Ok(()) }) }
    /// ```
    pub async fn value_for(&mut self, key: &str) -> Result<String, Error<Implementation::Error>> {
        if let Some(value) = self.segment.get(key).await? {
            Ok(value)
        } else {
            self.mint_value(key).await
        }
    }

    /// Checks whether an incoming token value is valid for the
    /// [default key](DEFAULT_KEY).
    ///
    /// See [`is_valid_for`](Self::is_valid_for).
    pub async fn is_valid(&mut self, value: &str) -> Result<bool, Error<Implementation::Error>> {
        self.is_valid_for(value, DEFAULT_KEY).await
    }

    /// Checks whether an incoming token `value` is valid for `key`.
    ///
    /// The token stored under `key` is rotated before the result is computed, regardless
    /// of the outcome. A token is therefore valid for at most one validation attempt,
    /// which closes the replay window for intercepted values.
    ///
    /// The submitted value is compared to the stored one in constant time, so the
    /// running time is independent of where or whether the two values first differ.
    ///
    /// Returns `Ok(false)` both if no token was ever issued for `key` and if the
    /// submitted value does not match the issued one. The two cases are not
    /// distinguishable by the caller, and a mismatch is an expected, non-exceptional
    /// outcome. Errors are only reported when the random source or the store fail.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use session_csrf::{CsrfTokens, MemoryStore, TokenSegment};
    /// # fn main() -> Result<(), session_csrf::Error<std::convert::Infallible>> {
    /// # async_std::task::block_on(async {
    /// let segment = TokenSegment::new(MemoryStore::new(), "session-1");
    /// let mut tokens = CsrfTokens::new(segment);
    /// let value = tokens.value_for("login-form").await?;
    /// assert!(tokens.is_valid_for(&value, "login-form").await?);
    /// // The token was rotated by the validation above, so it is no longer valid.
    /// assert!(!tokens.is_valid_for(&value, "login-form").await?);
    /// # Ok(()) }) }
    /// ```
    pub async fn is_valid_for(
        &mut self,
        value: &str,
        key: &str,
    ) -> Result<bool, Error<Implementation::Error>> {
        // The expected value must be read before rotation, and rotation must complete
        // before the comparison result is produced.
        let expected = self.segment.get(key).await?;
        self.mint_value(key).await?;

        Ok(match expected {
            Some(expected) => value.as_bytes().ct_eq(expected.as_bytes()).into(),
            None => false,
        })
    }

    /// Replaces the token stored under the [default key](DEFAULT_KEY) with a freshly
    /// minted one.
    ///
    /// See [`regenerate_value_for`](Self::regenerate_value_for).
    pub async fn regenerate_value(&mut self) -> Result<(), Error<Implementation::Error>> {
        self.regenerate_value_for(DEFAULT_KEY).await
    }

    /// Replaces the token stored under `key` with a freshly minted one, unconditionally
    /// discarding any prior value. Tokens stored under other keys are not affected.
    pub async fn regenerate_value_for(
        &mut self,
        key: &str,
    ) -> Result<(), Error<Implementation::Error>> {
        self.mint_value(key).await.map(|_| ())
    }

    /// Draws fresh entropy from the random source, hashes it, and stores the digest
    /// under `key`. This is the sole place where new token values are minted.
    async fn mint_value(&mut self, key: &str) -> Result<String, Error<Implementation::Error>> {
        let entropy = self
            .random_source
            .generate()
            .map_err(Error::EntropyUnavailable)?;
        let value = hex::encode(Sha512::digest(entropy));
        self.segment.set(key, &value).await?;
        tracing::trace!(key, "minted a fresh anti-forgery token");
        Ok(value)
    }

    /// Extract the token segment, consuming the token manager.
    pub fn into_inner(self) -> TokenSegment<Implementation> {
        self.segment
    }
}
