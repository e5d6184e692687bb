//! Async anti-forgery tokens for session-based web applications.
//!
//! This crate generates an unpredictable token bound to a user session, exposes
//! it for embedding in outgoing requests, and validates that a subsequently
//! submitted token matches the one previously issued. This defends against
//! cross-site request forgery by ensuring a state-changing request could only
//! have originated from a page the legitimate session itself rendered.
//!
//! # Token lifecycle
//!
//! Tokens are minted lazily: the first read of a key mints a value, and further
//! reads return the same value. Every validation attempt rotates the stored
//! value, successful or not, so a token is valid for at most one validation.
//! Independent keys hold independent tokens, which allows e.g. per-form tokens
//! within one session.
//!
//! # Security
//!
//! * Entropy is drawn from a cryptographically secure source, by default the
//!   entropy source of the operating system. If the source fails, the operation
//!   fails; there is no fallback to a weaker generator.
//! * The stored token value is the SHA-512 hex digest of the entropy, never the
//!   entropy itself and never attacker-influenced input.
//! * Submitted values are compared to stored ones in constant time.
//! * Tokens are single use: validation rotates the stored value before the
//!   result is computed.
//!
//! # Concurrent validation
//!
//! The crate performs no cross-request locking. If two requests validate
//! against the same session and key concurrently, the second reader may observe
//! an already rotated value and a legitimate submission fails. This is a known
//! limitation: the crate assumes the session store serializes access per
//! session, or that the caller accepts last-writer-wins races across concurrent
//! submissions for the same key.
//!
//! # Example
//!
//! ```
//! use session_csrf::{CsrfTokens, MemoryStore, TokenSegment};
//!
//! # fn main() -> Result<(), session_csrf::Error<std::convert::Infallible>> {
//! # async_std::task::block_on(async {
//! #
//! // Bind a token manager to one session's slice of the store.
//! // In a deployment, implement `TokenStoreImplementation` against your real
//! // session storage instead of using the in-memory store.
//! let segment = TokenSegment::new(MemoryStore::new(), "session-1");
//! let mut tokens = CsrfTokens::new(segment);
//!
//! // Render the token into an outgoing form.
//! let outgoing = tokens.value().await?;
//!
//! // Validate the value submitted with the next request.
//! assert!(tokens.is_valid(&outgoing).await?);
//!
//! // Tokens are single use, so the same value does not validate twice.
//! assert!(!tokens.is_valid(&outgoing).await?);
//! #
//! # Ok(()) }) }
//! ```

#![forbid(unsafe_code)]
#![deny(
    future_incompatible,
    missing_debug_implementations,
    nonstandard_style,
    missing_docs,
    unreachable_pub,
    missing_copy_implementations,
    unused_qualifications
)]

mod csrf_token;
mod error;
mod memory_store;
mod token_store;

pub use csrf_token::random_source::{DebugRandomSource, OsRandomSource, RandomSource};
pub use csrf_token::{CsrfTokens, DEFAULT_KEY};
pub use error::Error;
pub use memory_store::{MemoryStore, NoLogger, Operation, OperationLogger, VecLogger};
pub use token_store::{TokenSegment, TokenStoreImplementation, DEFAULT_NAMESPACE};
