use anyhow::Result;

use crate::UploadResource;

/// Callbacks run by [`crate::TusServer`] at points of an upload's lifecycle.
///
/// Hooks are awaited before the response that triggered them is produced;
/// a failing hook turns that response into a server error.
#[async_trait::async_trait]
pub trait UploadHooks: Send + Sync {
    /// Runs exactly once per upload, when its offset reaches its length.
    async fn on_upload_completed(&self, upload: &UploadResource) -> Result<()>;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait::async_trait]
impl UploadHooks for NoopHooks {
    async fn on_upload_completed(&self, _upload: &UploadResource) -> Result<()> {
        Ok(())
    }
}
