use crate::token_store::TokenStoreImplementation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::convert::Infallible;

/// # in-memory token store
/// Because there is no external persistence, this store is ephemeral and will be cleared
/// on server restart.
///
/// # ***READ THIS BEFORE USING IN A PRODUCTION DEPLOYMENT***
///
/// Storing token values only in memory brings the following problems:
///
/// 1. All values are lost on shutdown, invalidating every form rendered before the
///    restart
/// 2. Values are never cleaned up, not even when the enclosing session is destroyed in
///    the actual session backend, so long-running services accumulate memory
/// 3. If the service is clustered, a token minted on one instance is unknown to the
///    others, so validation only works with sticky sessions
///
/// Use a store backed by the real session storage of your deployment instead.
/// This store is intended for tests and single-process development setups.
#[derive(Debug, Clone)]
pub struct MemoryStore<Logger = NoLogger> {
    values: HashMap<(String, String, String), String>,
    logger: Logger,
}

/// An operation performed on a [`MemoryStore`], as recorded by an [`OperationLogger`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Operation {
    /// A value was read.
    ReadValue {
        /// The id of the session the value belongs to.
        session_id: String,
        /// The namespace the value was read from.
        namespace: String,
        /// The key the value was read from.
        key: String,
    },
    /// A value was written.
    WriteValue {
        /// The id of the session the value belongs to.
        session_id: String,
        /// The namespace the value was written to.
        namespace: String,
        /// The key the value was written to.
        key: String,
        /// The written value.
        value: String,
    },
}

/// A logger for [`MemoryStore`] operations.
/// Used in tests to assert on the exact sequence of store accesses.
pub trait OperationLogger {
    /// Record a single store operation.
    fn log(&mut self, operation: Operation);
}

/// An operation logger that discards all operations. This is the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogger;

impl OperationLogger for NoLogger {
    fn log(&mut self, _operation: Operation) {}
}

/// An operation logger that records all operations in a vector.
#[derive(Debug, Default, Clone)]
pub struct VecLogger {
    operations: Vec<Operation>,
}

impl VecLogger {
    /// Extract the recorded operations, consuming the logger.
    pub fn into_inner(self) -> Vec<Operation> {
        self.operations
    }
}

impl OperationLogger for VecLogger {
    fn log(&mut self, operation: Operation) {
        self.operations.push(operation);
    }
}

#[async_trait]
impl<Logger: OperationLogger + Send> TokenStoreImplementation for MemoryStore<Logger> {
    type Error = Infallible;

    async fn read_value(
        &mut self,
        session_id: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, Infallible> {
        self.logger.log(Operation::ReadValue {
            session_id: session_id.to_string(),
            namespace: namespace.to_string(),
            key: key.to_string(),
        });
        Ok(self
            .values
            .get(&(
                session_id.to_string(),
                namespace.to_string(),
                key.to_string(),
            ))
            .cloned())
    }

    async fn write_value(
        &mut self,
        session_id: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Infallible> {
        self.logger.log(Operation::WriteValue {
            session_id: session_id.to_string(),
            namespace: namespace.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        self.values.insert(
            (
                session_id.to_string(),
                namespace.to_string(),
                key.to_string(),
            ),
            value.to_string(),
        );
        Ok(())
    }
}

impl MemoryStore {
    /// Create a new empty memory store that does not log its operations.
    pub fn new() -> Self {
        Default::default()
    }
}

impl MemoryStore<VecLogger> {
    /// Create a new empty memory store that records all operations in a [`VecLogger`].
    pub fn new_with_logger() -> Self {
        Default::default()
    }

    /// Extract the operation logger, consuming the store.
    pub fn into_logger(self) -> VecLogger {
        self.logger
    }
}

impl<Logger> MemoryStore<Logger> {
    /// Returns the number of values in the memory store.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the memory store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<Logger: Default> Default for MemoryStore<Logger> {
    fn default() -> Self {
        Self {
            values: Default::default(),
            logger: Default::default(),
        }
    }
}
