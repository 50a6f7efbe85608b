use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::RwLock;
use tracing::debug;

use crate::store::{StoreOperation, StoreOperations};
use crate::{
    ByteStream, NewUpload, TusError, TusResult, UploadKey, UploadResource, UploadStore,
};

struct Entry {
    resource: UploadResource,
    data: Vec<u8>,
}

/// In-memory store for testing and development
///
/// Supports creation, deferred lengths and termination. Bytes of an append
/// are staged outside the lock and committed in one step, so a failed or
/// interrupted body never moves the offset.
#[derive(Clone, Default)]
pub struct MemoryStore {
    uploads: Arc<RwLock<HashMap<UploadKey, Entry>>>,
    max_size: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse uploads larger than `bytes`
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Bytes received so far for an upload
    pub fn contents(&self, key: &UploadKey) -> Option<Bytes> {
        self.uploads
            .read()
            .get(key)
            .map(|entry| Bytes::copy_from_slice(&entry.data))
    }

    pub fn len(&self) -> usize {
        self.uploads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.read().is_empty()
    }
}

#[async_trait]
impl UploadStore for MemoryStore {
    fn operations(&self) -> StoreOperations {
        StoreOperations::basic()
            .with(StoreOperation::Create)
            .with(StoreOperation::SetDeferredUploadLength)
            .with(StoreOperation::Delete)
    }

    fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    async fn create(&self, upload: NewUpload) -> TusResult<UploadKey> {
        let key = UploadKey::new();
        let length = if upload.deferred { None } else { upload.upload_length };
        let resource = UploadResource::new(key.clone(), length, upload.metadata);

        self.uploads.write().insert(
            key.clone(),
            Entry {
                resource,
                data: Vec::new(),
            },
        );
        debug!("Created upload {}", key);
        Ok(key)
    }

    async fn write(&self, key: &UploadKey, offset: u64, mut stream: ByteStream) -> TusResult<u64> {
        let length = {
            let uploads = self.uploads.read();
            let entry = uploads
                .get(key)
                .ok_or_else(|| TusError::unknown_resource(key.as_str()))?;
            if entry.resource.offset != offset {
                return Err(TusError::ConcurrentWrite);
            }
            entry.resource.upload_length
        };

        let mut staged: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            staged.extend_from_slice(&chunk?);
        }

        let new_offset = offset + staged.len() as u64;
        if let Some(length) = length {
            if new_offset > length {
                return Err(TusError::precondition(format!(
                    "Write of {} bytes at offset {} exceeds upload length {}",
                    staged.len(),
                    offset,
                    length
                )));
            }
        }

        let mut uploads = self.uploads.write();
        let entry = uploads
            .get_mut(key)
            .ok_or_else(|| TusError::unknown_resource(key.as_str()))?;
        // Someone else committed while we were reading the body
        if entry.resource.offset != offset {
            return Err(TusError::ConcurrentWrite);
        }
        entry.data.extend_from_slice(&staged);
        entry.resource.offset = new_offset;
        Ok(new_offset)
    }

    async fn stats(&self, key: &UploadKey) -> TusResult<Option<UploadResource>> {
        Ok(self
            .uploads
            .read()
            .get(key)
            .map(|entry| entry.resource.clone()))
    }

    async fn set_deferred_upload_length(&self, key: &UploadKey, length: u64) -> TusResult<()> {
        let mut uploads = self.uploads.write();
        let entry = uploads
            .get_mut(key)
            .ok_or_else(|| TusError::unknown_resource(key.as_str()))?;
        if entry.resource.upload_length.is_some() {
            return Err(TusError::LengthAlreadySet { length });
        }
        entry.resource.upload_length = Some(length);
        Ok(())
    }

    async fn delete(&self, key: &UploadKey) -> TusResult<()> {
        match self.uploads.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(TusError::unknown_resource(key.as_str())),
        }
    }
}
