use async_trait::async_trait;
use session_csrf::{
    CsrfTokens, DebugRandomSource, Error, MemoryStore, Operation, OsRandomSource, RandomSource,
    TokenSegment, TokenStoreImplementation, DEFAULT_KEY, DEFAULT_NAMESPACE,
};
use sha2::{Digest, Sha512};

/// The token the [`DebugRandomSource`] mints on its `index`th draw.
fn debug_token(index: u64) -> String {
    hex::encode(Sha512::digest(index.to_be_bytes()))
}

fn new_debug_tokens() -> CsrfTokens<MemoryStore, DebugRandomSource> {
    let segment = TokenSegment::new(MemoryStore::new(), "session-1");
    CsrfTokens::new_with_random_source(segment, DebugRandomSource::default())
}

/// The first read of a key mints a token, and further reads return the same token.
#[async_std::test]
async fn test_value_mints_lazily_and_is_idempotent() {
    let segment = TokenSegment::new(MemoryStore::new(), "session-1");
    let mut tokens = CsrfTokens::new(segment);

    let first = tokens.value().await.unwrap();
    assert_eq!(first.len(), 128);
    assert!(first
        .chars()
        .all(|character| character.is_ascii_hexdigit() && !character.is_ascii_uppercase()));

    let second = tokens.value().await.unwrap();
    assert_eq!(first, second);
}

/// The minted token is the SHA-512 hex digest of the entropy drawn from the random source.
#[async_std::test]
async fn test_token_is_digest_of_entropy() {
    let mut tokens = new_debug_tokens();
    assert_eq!(tokens.value().await.unwrap(), debug_token(0));
}

/// Regenerating replaces the stored token with a fresh one.
#[async_std::test]
async fn test_regenerate_replaces_value() {
    let mut tokens = new_debug_tokens();
    let before = tokens.value().await.unwrap();
    tokens.regenerate_value().await.unwrap();
    let after = tokens.value().await.unwrap();
    assert_ne!(before, after);
    assert_eq!(after, debug_token(1));
}

/// A token validates exactly once: the validation rotates it, so a replayed value fails.
#[async_std::test]
async fn test_token_is_single_use() {
    let mut tokens = new_debug_tokens();
    let value = tokens.value().await.unwrap();
    assert!(tokens.is_valid(&value).await.unwrap());
    assert!(!tokens.is_valid(&value).await.unwrap());
}

/// A failed validation rotates the stored token as well.
#[async_std::test]
async fn test_mismatch_rotates_value() {
    let mut tokens = new_debug_tokens();
    let before = tokens.value().await.unwrap();
    assert!(!tokens.is_valid("wrong-value").await.unwrap());
    let after = tokens.value().await.unwrap();
    assert_ne!(before, after);
    // The previously issued token was discarded by the rotation.
    assert!(!tokens.is_valid(&before).await.unwrap());
}

/// Validating against a session that never issued a token fails, but still mints one.
#[async_std::test]
async fn test_validation_without_issued_token() {
    let mut tokens = new_debug_tokens();
    assert!(!tokens.is_valid("anything").await.unwrap());
    // The failed attempt transitioned the key into the issued state.
    let value = tokens.value().await.unwrap();
    assert!(tokens.is_valid(&value).await.unwrap());
}

/// Values that differ from the issued token in any position are rejected.
#[async_std::test]
async fn test_near_miss_values_are_rejected() {
    let mut tokens = new_debug_tokens();

    let value = tokens.value().await.unwrap();
    let mut first_differs = value.clone();
    first_differs.replace_range(0..1, if value.starts_with('0') { "1" } else { "0" });
    assert!(!tokens.is_valid(&first_differs).await.unwrap());

    let value = tokens.value().await.unwrap();
    let mut last_differs = value.clone();
    last_differs.replace_range(127..128, if value.ends_with('0') { "1" } else { "0" });
    assert!(!tokens.is_valid(&last_differs).await.unwrap());

    let value = tokens.value().await.unwrap();
    assert!(!tokens.is_valid(&value[..127]).await.unwrap());

    let value = tokens.value().await.unwrap();
    assert!(!tokens.is_valid(&format!("{value}0")).await.unwrap());

    tokens.value().await.unwrap();
    assert!(!tokens.is_valid("").await.unwrap());
}

/// Independent keys hold independent tokens; rotating one does not affect the other.
#[async_std::test]
async fn test_independent_keys() {
    let mut tokens = new_debug_tokens();
    let form_a = tokens.value_for("form-a").await.unwrap();
    let form_b = tokens.value_for("form-b").await.unwrap();
    assert_ne!(form_a, form_b);

    tokens.regenerate_value_for("form-a").await.unwrap();
    assert_ne!(tokens.value_for("form-a").await.unwrap(), form_a);
    assert_eq!(tokens.value_for("form-b").await.unwrap(), form_b);
    assert!(tokens.is_valid_for(&form_b, "form-b").await.unwrap());
}

/// The token manager accesses the store in the documented order: the expected value is
/// read before the rotation writes the replacement.
#[async_std::test]
async fn test_store_access_pattern() {
    let segment = TokenSegment::new(MemoryStore::new_with_logger(), "session-1");
    let mut tokens = CsrfTokens::new_with_random_source(segment, DebugRandomSource::default());

    let value = tokens.value().await.unwrap();
    assert!(tokens.is_valid(&value).await.unwrap());

    let operations = tokens.into_inner().into_inner().into_logger().into_inner();
    assert_eq!(
        operations.as_slice(),
        &[
            Operation::ReadValue {
                session_id: "session-1".to_string(),
                namespace: DEFAULT_NAMESPACE.to_string(),
                key: DEFAULT_KEY.to_string(),
            },
            Operation::WriteValue {
                session_id: "session-1".to_string(),
                namespace: DEFAULT_NAMESPACE.to_string(),
                key: DEFAULT_KEY.to_string(),
                value: debug_token(0),
            },
            Operation::ReadValue {
                session_id: "session-1".to_string(),
                namespace: DEFAULT_NAMESPACE.to_string(),
                key: DEFAULT_KEY.to_string(),
            },
            Operation::WriteValue {
                session_id: "session-1".to_string(),
                namespace: DEFAULT_NAMESPACE.to_string(),
                key: DEFAULT_KEY.to_string(),
                value: debug_token(1),
            },
        ]
    );
}

/// Namespaces isolate equal keys from each other within the same session.
#[async_std::test]
async fn test_namespaces_isolate_keys() {
    let mut store = MemoryStore::new();
    store
        .write_value("session-1", "csrf", "value", "first")
        .await
        .unwrap();
    store
        .write_value("session-1", "unrelated", "value", "second")
        .await
        .unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(
        store
            .read_value("session-1", "csrf", "value")
            .await
            .unwrap()
            .as_deref(),
        Some("first")
    );
    assert_eq!(
        store
            .read_value("session-1", "unrelated", "value")
            .await
            .unwrap()
            .as_deref(),
        Some("second")
    );
    assert_eq!(
        store
            .read_value("session-2", "csrf", "value")
            .await
            .unwrap(),
        None
    );
}

/// A random source that always reports an exhausted entropy source.
#[derive(Debug, Default)]
struct FailingRandomSource;

impl RandomSource for FailingRandomSource {
    fn generate(&mut self) -> Result<Vec<u8>, rand::Error> {
        Err(rand::Error::new("the entropy source is exhausted"))
    }
}

/// Entropy failure is fatal to minting and propagates to the caller.
#[async_std::test]
async fn test_entropy_failure_propagates() {
    let segment = TokenSegment::new(MemoryStore::new(), "session-1");
    let mut tokens = CsrfTokens::new_with_random_source(segment, FailingRandomSource);

    assert!(matches!(
        tokens.value().await,
        Err(Error::EntropyUnavailable(_))
    ));
    assert!(matches!(
        tokens.regenerate_value().await,
        Err(Error::EntropyUnavailable(_))
    ));
    assert!(matches!(
        tokens.is_valid("anything").await,
        Err(Error::EntropyUnavailable(_))
    ));
}

#[derive(Debug, thiserror::Error)]
#[error("the token store is unreachable")]
struct StoreUnreachable;

/// A store whose reads succeed but whose writes always fail.
#[derive(Debug, Default)]
struct ReadOnlyStore;

#[async_trait]
impl TokenStoreImplementation for ReadOnlyStore {
    type Error = StoreUnreachable;

    async fn read_value(
        &mut self,
        _session_id: &str,
        _namespace: &str,
        _key: &str,
    ) -> Result<Option<String>, StoreUnreachable> {
        Ok(Some("previously-issued".to_string()))
    }

    async fn write_value(
        &mut self,
        _session_id: &str,
        _namespace: &str,
        _key: &str,
        _value: &str,
    ) -> Result<(), StoreUnreachable> {
        Err(StoreUnreachable)
    }
}

/// A store failure during the rotation step aborts validation with an error instead of
/// silently reporting the request as invalid.
#[async_std::test]
async fn test_store_failure_aborts_validation() {
    let segment = TokenSegment::new(ReadOnlyStore, "session-1");
    let mut tokens = CsrfTokens::new(segment);

    assert!(matches!(
        tokens.is_valid("previously-issued").await,
        Err(Error::TokenStore(StoreUnreachable))
    ));
}

/// The operating system random source emits the requested amount of entropy and does not
/// repeat itself.
#[test]
fn test_os_random_source() {
    let mut source = OsRandomSource::<32>::default();
    let first = source.generate().unwrap();
    let second = source.generate().unwrap();
    assert_eq!(first.len(), 32);
    assert_eq!(second.len(), 32);
    assert_ne!(first, second);
}
