use async_trait::async_trait;

/// The default namespace under which token values are stored.
///
/// The namespace isolates the keys written by this crate from unrelated data living in
/// the same session store.
pub const DEFAULT_NAMESPACE: &str = "csrf";

/// This is the backend-facing interface of the token store.
/// It defines keyed read and write operations on string values scoped to a session.
///
/// The triple of session id, namespace and key uniquely identifies a stored value.
/// Persistence, expiry and serialization of the session itself are entirely the concern
/// of the implementation; this crate neither creates nor destroys sessions.
#[async_trait]
pub trait TokenStoreImplementation {
    /// The error type reported by this store when a value cannot be read or written.
    type Error: std::error::Error;

    /// Read the value stored under `key`, or `None` if no value was ever stored.
    async fn read_value(
        &mut self,
        session_id: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, overwriting any prior value.
    /// The written value must be visible to subsequent reads within the same session for
    /// the remainder of its lifetime.
    async fn write_value(
        &mut self,
        session_id: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Self::Error>;
}

/// A keyed value store scoped to a single session.
///
/// This is the user-facing interface of the token store.
/// It binds a backend implementation to one session id and one namespace and exposes
/// plain get and set operations by key. Pass it explicitly to the consumers that need
/// session-scoped storage instead of routing them through global state.
#[derive(Debug, Clone)]
pub struct TokenSegment<Implementation> {
    implementation: Implementation,
    session_id: String,
    namespace: String,
}

impl<Implementation: TokenStoreImplementation> TokenSegment<Implementation> {
    /// Create a new segment over the given implementation, scoped to `session_id` and
    /// the [default namespace](DEFAULT_NAMESPACE).
    pub fn new(implementation: Implementation, session_id: impl Into<String>) -> Self {
        Self::new_with_namespace(implementation, session_id, DEFAULT_NAMESPACE)
    }

    /// Create a new segment over the given implementation, scoped to `session_id` and a
    /// custom `namespace`.
    pub fn new_with_namespace(
        implementation: Implementation,
        session_id: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            implementation,
            session_id: session_id.into(),
            namespace: namespace.into(),
        }
    }

    /// Get the value stored under `key` within this segment, or `None` if no value was
    /// ever stored.
    pub async fn get(&mut self, key: &str) -> Result<Option<String>, Implementation::Error> {
        self.implementation
            .read_value(&self.session_id, &self.namespace, key)
            .await
    }

    /// Set the value stored under `key` within this segment, overwriting any prior value.
    pub async fn set(&mut self, key: &str, value: &str) -> Result<(), Implementation::Error> {
        self.implementation
            .write_value(&self.session_id, &self.namespace, key, value)
            .await
    }

    /// Extract the backend implementation, consuming the segment.
    pub fn into_inner(self) -> Implementation {
        self.implementation
    }
}
