//! Extension negotiation.
//!
//! Which optional protocol extensions a server advertises is derived from
//! the operations its store implements, using a fixed table. The result is
//! computed once when a [`crate::TusServer`] is built.

use crate::store::{StoreOperation, StoreOperations};
use crate::{TusError, TusResult, UploadStore};

/// Operations every store must implement
const REQUIRED: &[StoreOperation] = &[StoreOperation::Write, StoreOperation::Stats];

/// Optional protocol extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Creation,
    CreationDeferLength,
    Expiration,
    Termination,
    Concatenation,
    ConcatenationUnfinished,
}

/// extension -> store operations it needs, in advertisement order
const EXTENSIONS: &[(Extension, &[StoreOperation])] = &[
    (Extension::Creation, &[StoreOperation::Create]),
    (Extension::CreationDeferLength, &[StoreOperation::SetDeferredUploadLength]),
    (Extension::Expiration, &[StoreOperation::UploadsExpire]),
    (Extension::Termination, &[StoreOperation::Delete]),
    (Extension::Concatenation, &[StoreOperation::Concat]),
    (
        Extension::ConcatenationUnfinished,
        &[StoreOperation::Concat, StoreOperation::ConcatUnfinished],
    ),
];

impl Extension {
    /// Name used in the `Tus-Extension` header
    pub fn name(&self) -> &'static str {
        match self {
            Extension::Creation => "creation",
            Extension::CreationDeferLength => "creation-defer-length",
            Extension::Expiration => "expiration",
            Extension::Termination => "termination",
            Extension::Concatenation => "concatenation",
            Extension::ConcatenationUnfinished => "concatenation-unfinished",
        }
    }
}

/// Extensions a store supports plus the maximum upload size policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    pub extensions: Vec<Extension>,
    /// `None` means unbounded
    pub max_size: Option<u64>,
}

impl CapabilitySet {
    /// Derive the capability set of a store.
    ///
    /// Fails with [`TusError::MissingStoreOperations`] when the store does not
    /// implement `write` and `stats`.
    pub fn negotiate(store: &dyn UploadStore) -> TusResult<Self> {
        let operations = store.operations();
        Ok(Self {
            extensions: Self::extensions_for(&operations)?,
            max_size: store.max_size(),
        })
    }

    fn extensions_for(operations: &StoreOperations) -> TusResult<Vec<Extension>> {
        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .filter(|op| !operations.contains(**op))
            .map(|op| op.name())
            .collect();
        if !missing.is_empty() {
            return Err(TusError::MissingStoreOperations(missing));
        }

        Ok(EXTENSIONS
            .iter()
            .filter(|(_, needs)| needs.iter().all(|op| operations.contains(*op)))
            .map(|(extension, _)| *extension)
            .collect())
    }

    /// Cap the size policy further; the smaller bound wins.
    pub fn with_max_size_limit(mut self, limit: Option<u64>) -> Self {
        self.max_size = match (self.max_size, limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self
    }

    pub fn supports(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    /// Extension names, comma-joined for `Tus-Extension`
    pub fn extension_header(&self) -> String {
        self.extensions
            .iter()
            .map(Extension::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}
