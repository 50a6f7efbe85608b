use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::headers::{CONTENT_TYPE, OFFSET_OCTET_STREAM, UPLOAD_DEFER_LENGTH, UPLOAD_LENGTH, UPLOAD_OFFSET};
use crate::meter::MeteredStream;
use crate::{
    parse_metadata, ByteStream, CapabilitySet, Extension, NewUpload, NoopHooks, TusConfig,
    TusError, TusHeaders, TusResult, UploadHooks, UploadKey, UploadResource, UploadStatus,
    UploadStore,
};

/// The upload state machine - this is what transport adapters embed
///
/// Owns the store, the completion hooks and the capability set negotiated
/// when it was built. Cheap to share behind an `Arc`; it keeps no
/// per-request state of its own.
pub struct TusServer {
    store: Arc<dyn UploadStore>,
    hooks: Arc<dyn UploadHooks>,
    capabilities: CapabilitySet,
}

impl TusServer {
    /// Build a server around a store, negotiating its extensions.
    pub fn new<S: UploadStore + 'static>(store: S, config: TusConfig) -> TusResult<Self> {
        Self::from_arc(Arc::new(store), config)
    }

    /// Same as [`TusServer::new`] for a store that is shared elsewhere too.
    pub fn from_arc(store: Arc<dyn UploadStore>, config: TusConfig) -> TusResult<Self> {
        let capabilities =
            CapabilitySet::negotiate(store.as_ref())?.with_max_size_limit(config.max_size);
        info!(
            "tus server ready: extensions=[{}] max_size={:?}",
            capabilities.extension_header(),
            capabilities.max_size
        );
        Ok(Self {
            store,
            hooks: Arc::new(NoopHooks),
            capabilities,
        })
    }

    /// Run `hooks` at upload lifecycle points
    pub fn with_hooks<H: UploadHooks + 'static>(mut self, hooks: H) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn max_size(&self) -> Option<u64> {
        self.capabilities.max_size
    }

    fn require(&self, extension: Extension) -> TusResult<()> {
        if self.capabilities.supports(extension) {
            Ok(())
        } else {
            Err(TusError::ExtensionUnsupported(extension.name()))
        }
    }

    fn check_max_size(&self, length: u64) -> TusResult<()> {
        match self.capabilities.max_size {
            Some(max_size) if length > max_size => {
                Err(TusError::EntityTooLarge { length, max_size })
            }
            _ => Ok(()),
        }
    }

    async fn lookup(&self, key: &UploadKey) -> TusResult<UploadResource> {
        self.store
            .stats(key)
            .await?
            .ok_or_else(|| TusError::unknown_resource(key.as_str()))
    }

    async fn completed(&self, upload: &UploadResource) -> TusResult<()> {
        info!("Upload {} completed at {} bytes", upload.key, upload.offset);
        self.hooks
            .on_upload_completed(upload)
            .await
            .map_err(TusError::HookFailed)
    }

    /// Create a new upload resource and return its key.
    #[instrument(skip_all, fields(length = ?headers.upload_length, deferred = headers.upload_defer_length))]
    pub async fn create(&self, headers: &TusHeaders) -> TusResult<UploadKey> {
        self.require(Extension::Creation)?;

        let deferred = headers.upload_defer_length;
        match (headers.upload_length, deferred) {
            (None, false) => {
                return Err(TusError::PreconditionFailed {
                    message: "Missing Upload-Length header".to_string(),
                    headers: vec![(UPLOAD_LENGTH.to_string(), String::new())],
                })
            }
            (Some(length), true) => {
                return Err(TusError::PreconditionFailed {
                    message: "Choose one of Upload-Length OR Upload-Defer-Length".to_string(),
                    headers: vec![
                        (UPLOAD_LENGTH.to_string(), length.to_string()),
                        (UPLOAD_DEFER_LENGTH.to_string(), "1".to_string()),
                    ],
                })
            }
            (Some(0), false) => return Err(TusError::invalid_header(UPLOAD_LENGTH, "0")),
            _ => {}
        }

        if deferred {
            self.require(Extension::CreationDeferLength)?;
        }
        if let Some(length) = headers.upload_length {
            self.check_max_size(length)?;
        }

        let metadata = parse_metadata(headers.upload_metadata.as_deref());
        let key = self
            .store
            .create(NewUpload {
                deferred,
                metadata,
                upload_length: headers.upload_length,
            })
            .await?;
        debug!("Created upload {}", key);
        Ok(key)
    }

    /// Report an upload's offset, length and metadata without touching it.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn inspect(&self, key: &UploadKey) -> TusResult<UploadStatus> {
        self.lookup(key).await.map(UploadStatus::from)
    }

    /// Append `body` at the claimed offset and return the new offset.
    #[instrument(skip_all, fields(key = %key, offset = ?headers.upload_offset))]
    pub async fn append(
        &self,
        key: &UploadKey,
        headers: &TusHeaders,
        body: ByteStream,
    ) -> TusResult<u64> {
        let claimed = headers
            .upload_offset
            .ok_or_else(|| TusError::missing_header(UPLOAD_OFFSET))?;

        match headers.content_type.as_deref() {
            None => return Err(TusError::missing_header(CONTENT_TYPE)),
            Some(content_type) if content_type != OFFSET_OCTET_STREAM => {
                return Err(TusError::invalid_header(CONTENT_TYPE, content_type))
            }
            Some(_) => {}
        }

        let mut upload = self.lookup(key).await?;
        if claimed != upload.offset {
            return Err(TusError::OffsetConflict {
                claimed,
                actual: upload.offset,
            });
        }

        let mut length_resolved = false;
        if let Some(length) = headers.upload_length {
            if !upload.is_deferred() {
                return Err(TusError::LengthAlreadySet { length });
            }
            if !self.capabilities.supports(Extension::CreationDeferLength) {
                return Err(TusError::PreconditionFailed {
                    message: "Store does not support creation-defer-length extension".to_string(),
                    headers: vec![(UPLOAD_LENGTH.to_string(), length.to_string())],
                });
            }
            if length < upload.offset {
                return Err(TusError::PreconditionFailed {
                    message: format!(
                        "Upload-Length ({}) is smaller than the current offset ({})",
                        length, upload.offset
                    ),
                    headers: vec![(UPLOAD_LENGTH.to_string(), length.to_string())],
                });
            }
            self.check_max_size(length)?;
            self.store.set_deferred_upload_length(key, length).await?;
            upload.upload_length = Some(length);
            length_resolved = true;
        }

        // Deferred uploads are still bounded by the size policy
        let limit = match upload.upload_length {
            Some(length) => Some(length.saturating_sub(upload.offset)),
            None => self
                .capabilities
                .max_size
                .map(|max| max.saturating_sub(upload.offset)),
        };

        let metered = MeteredStream::new(body, limit);
        let meter = metered.handle();
        let written = self
            .store
            .write(key, upload.offset, metered.into_byte_stream())
            .await;

        if meter.overflowed() {
            let limit = limit.unwrap_or_default();
            warn!("Append to {} exceeded its {} byte allowance", key, limit);
            return Err(TusError::BodyLimitExceeded { limit });
        }
        let new_offset = written?;
        debug!("Upload {} advanced {} -> {}", key, upload.offset, new_offset);

        let advanced = new_offset > upload.offset;
        if upload.upload_length == Some(new_offset) && (advanced || length_resolved) {
            upload.offset = new_offset;
            self.completed(&upload).await?;
        }

        Ok(new_offset)
    }

    /// Delete an upload and its content.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn terminate(&self, key: &UploadKey) -> TusResult<()> {
        self.require(Extension::Termination)?;
        self.lookup(key).await?;
        self.store.delete(key).await?;
        info!("Terminated upload {}", key);
        Ok(())
    }
}
