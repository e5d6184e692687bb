/// All errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error<TokenStoreError> {
    /// The secure random source could not produce output.
    /// Token minting never falls back to a weaker generator, so the operation that
    /// requested the entropy fails instead.
    #[error("the secure random source could not produce output: {0}")]
    EntropyUnavailable(rand::Error),

    /// An error occurred in the token store.
    #[error("{0}")]
    TokenStore(TokenStoreError),
}

impl<TokenStoreError> From<TokenStoreError> for Error<TokenStoreError> {
    fn from(error: TokenStoreError) -> Self {
        Self::TokenStore(error)
    }
}

mod expect_impl_error {
    trait ExpectImplError: std::error::Error {}

    impl<TokenStoreError: std::error::Error> ExpectImplError for super::Error<TokenStoreError> {}
}
