use async_trait::async_trait;

use crate::{ByteStream, NewUpload, TusError, TusResult, UploadKey, UploadResource};

/// Operations a store can implement. `Write` and `Stats` are required; the
/// rest enable protocol extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Write,
    Stats,
    Create,
    SetDeferredUploadLength,
    UploadsExpire,
    Delete,
    Concat,
    ConcatUnfinished,
}

impl StoreOperation {
    pub fn name(&self) -> &'static str {
        match self {
            StoreOperation::Write => "write",
            StoreOperation::Stats => "stats",
            StoreOperation::Create => "create",
            StoreOperation::SetDeferredUploadLength => "setDeferredUploadLength",
            StoreOperation::UploadsExpire => "uploadsExpire",
            StoreOperation::Delete => "delete",
            StoreOperation::Concat => "concat",
            StoreOperation::ConcatUnfinished => "concatUnfinished",
        }
    }
}

/// The operations a store declares it implements.
///
/// Negotiation reads this once at startup; see [`crate::CapabilitySet`].
#[derive(Debug, Clone, Default)]
pub struct StoreOperations {
    pub implemented: Vec<StoreOperation>,
}

impl StoreOperations {
    /// Only the two required operations
    pub fn basic() -> Self {
        Self::from_operations(vec![StoreOperation::Write, StoreOperation::Stats])
    }

    /// Helper for building from a list.
    pub fn from_operations(operations: Vec<StoreOperation>) -> Self {
        Self {
            implemented: operations,
        }
    }

    pub fn with(mut self, operation: StoreOperation) -> Self {
        if !self.implemented.contains(&operation) {
            self.implemented.push(operation);
        }
        self
    }

    pub fn contains(&self, operation: StoreOperation) -> bool {
        self.implemented.contains(&operation)
    }
}

/// Persistence backend for uploads.
///
/// `write` and `stats` must be implemented. Every other operation has a
/// default body answering [`TusError::ExtensionUnsupported`]; a store that
/// overrides one must also list it in [`UploadStore::operations`], otherwise
/// the matching extension is never advertised or used.
///
/// Per-key write ordering is the store's job: `write` must commit atomically
/// and only if the upload is still at `offset`, answering
/// [`TusError::ConcurrentWrite`] when another writer got there first. A
/// stream that ends in an error must leave the stored offset untouched.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Operations this store implements
    fn operations(&self) -> StoreOperations {
        StoreOperations::basic()
    }

    /// Largest upload this store accepts, `None` for unbounded
    fn max_size(&self) -> Option<u64> {
        None
    }

    /// Append the stream at `offset` and return the new offset
    async fn write(&self, key: &UploadKey, offset: u64, stream: ByteStream) -> TusResult<u64>;

    /// Current state of an upload, `None` if it does not exist
    async fn stats(&self, key: &UploadKey) -> TusResult<Option<UploadResource>>;

    /// Create a new upload and return its key
    async fn create(&self, _upload: NewUpload) -> TusResult<UploadKey> {
        Err(TusError::ExtensionUnsupported("creation"))
    }

    /// Resolve a deferred length; called at most once per upload
    async fn set_deferred_upload_length(&self, _key: &UploadKey, _length: u64) -> TusResult<()> {
        Err(TusError::ExtensionUnsupported("creation-defer-length"))
    }

    /// Remove an upload and its content
    async fn delete(&self, _key: &UploadKey) -> TusResult<()> {
        Err(TusError::ExtensionUnsupported("termination"))
    }

    /// Concatenate finished partial uploads into a new upload
    async fn concat(&self, _keys: &[UploadKey]) -> TusResult<UploadKey> {
        Err(TusError::ExtensionUnsupported("concatenation"))
    }

    /// Concatenate partial uploads that may still be receiving bytes
    async fn concat_unfinished(&self, _keys: &[UploadKey]) -> TusResult<UploadKey> {
        Err(TusError::ExtensionUnsupported("concatenation-unfinished"))
    }

    /// Expire stale uploads, returning how many were removed
    async fn uploads_expire(&self) -> TusResult<u64> {
        Err(TusError::ExtensionUnsupported("expiration"))
    }
}
