//! # tus-core: resumable uploads for DogRS applications
//!
//! `tus-core` is the transport-agnostic heart of a tus 1.0.0 server: it
//! decides whether a request is well-formed, what an upload's observable
//! state is, how offsets advance, and which protocol extensions a store
//! can back.
//!
//! ## Key Features
//!
//! - **Streaming-first**: append bodies flow through a byte meter, never buffered by the core
//! - **Negotiated extensions**: `creation`, `creation-defer-length`, `termination` and friends are
//!   advertised only when the store implements them
//! - **Storage agnostic**: implement [`UploadStore`] for any backend; [`MemoryStore`] ships for tests
//! - **Server agnostic**: no HTTP coupling, see `tus-axum` for the HTTP surface
//!
//! ## Quick Start
//!
//! ```rust
//! use tus_core::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> TusResult<()> {
//! let server = TusServer::new(MemoryStore::new(), TusConfig::default())?;
//!
//! let key = server
//!     .create(&TusHeaders::default().with_upload_length(5))
//!     .await?;
//!
//! let body = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(b"hello"))]);
//! let offset = server
//!     .append(&key, &TusHeaders::append_at(0), Box::pin(body))
//!     .await?;
//! assert_eq!(offset, 5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Transport     │  ← HTTP, headers in, status codes out
//! ├─────────────────┤
//! │   TusServer     │  ← Protocol state machine
//! ├─────────────────┤
//! │   UploadStore   │  ← Storage primitives
//! └─────────────────┘
//! ```

mod capabilities;
mod config;
mod error;
pub mod headers;
mod hooks;
mod memory_store;
mod metadata;
pub mod meter;
mod server;
pub mod store;
mod types;

// Re-export main types for clean API
pub use capabilities::{CapabilitySet, Extension};
pub use config::TusConfig;
pub use error::{ErrorKind, TusError, TusResult};
pub use headers::{validate_header_syntax, TusHeaders};
pub use hooks::{NoopHooks, UploadHooks};
pub use memory_store::MemoryStore;
pub use metadata::{encode_metadata, parse_metadata, Metadata};
pub use server::TusServer;
pub use store::{StoreOperation, StoreOperations, UploadStore};
pub use types::{
    ByteStream, NewUpload, UploadKey, UploadLength, UploadResource, UploadStatus,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ByteStream, MemoryStore, TusConfig, TusError, TusHeaders, TusResult, TusServer,
        UploadHooks, UploadKey, UploadStore,
    };
}
