//! Protocol header names, per-header syntax rules and the typed view of a
//! request's protocol headers.

use crate::metadata;
use crate::{TusError, TusResult};

/// Protocol version spoken by this server.
pub const TUS_RESUMABLE: &str = "1.0.0";

/// Versions accepted in `Tus-Version`.
pub const TUS_VERSIONS: &[&str] = &["1.0.0"];

/// The only media type accepted on append requests.
pub const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// How long discovery responses may be cached, in seconds.
pub const MAX_AGE: u64 = 86400;

pub const CONTENT_TYPE: &str = "content-type";
pub const LOCATION: &str = "location";
pub const TUS_EXTENSION: &str = "tus-extension";
pub const TUS_MAX_SIZE: &str = "tus-max-size";
pub const TUS_RESUMABLE_HEADER: &str = "tus-resumable";
pub const TUS_VERSION: &str = "tus-version";
pub const UPLOAD_DEFER_LENGTH: &str = "upload-defer-length";
pub const UPLOAD_LENGTH: &str = "upload-length";
pub const UPLOAD_METADATA: &str = "upload-metadata";
pub const UPLOAD_OFFSET: &str = "upload-offset";
pub const X_HTTP_METHOD_OVERRIDE: &str = "x-http-method-override";
pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// Headers clients may send and read, for CORS.
pub const PROTOCOL_HEADERS: &[&str] = &[
    CONTENT_TYPE,
    LOCATION,
    TUS_EXTENSION,
    TUS_MAX_SIZE,
    TUS_RESUMABLE_HEADER,
    TUS_VERSION,
    UPLOAD_DEFER_LENGTH,
    UPLOAD_LENGTH,
    UPLOAD_METADATA,
    UPLOAD_OFFSET,
    X_HTTP_METHOD_OVERRIDE,
    X_REQUESTED_WITH,
];

fn parse_u64(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn is_valid(name: &str, value: &str) -> bool {
    match name.to_ascii_lowercase().as_str() {
        TUS_RESUMABLE_HEADER => value == TUS_RESUMABLE,
        TUS_VERSION => TUS_VERSIONS.contains(&value),
        // Always must be equal to 1
        UPLOAD_DEFER_LENGTH => value.trim() == "1",
        UPLOAD_LENGTH => parse_u64(value).is_some_and(|length| length >= 1),
        UPLOAD_OFFSET => parse_u64(value).is_some(),
        UPLOAD_METADATA => metadata::is_well_formed(value),
        _ => true,
    }
}

/// Apply per-header syntax rules. Returns every `(name, value)` pair that
/// fails its rule; unknown headers are always valid.
pub fn validate_header_syntax<'a, I>(headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    headers
        .into_iter()
        .filter(|(name, value)| !is_valid(name, value))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Protocol-relevant values of a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TusHeaders {
    pub tus_resumable: Option<String>,
    pub upload_offset: Option<u64>,
    pub upload_length: Option<u64>,
    pub upload_defer_length: bool,
    pub upload_metadata: Option<String>,
    pub content_type: Option<String>,
}

impl TusHeaders {
    /// Validate and extract the protocol headers. Fails with
    /// [`TusError::InvalidHeaders`] listing every offending header.
    pub fn parse<'a, I>(headers: I) -> TusResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let headers: Vec<(&str, &str)> = headers.into_iter().collect();
        let invalid = validate_header_syntax(headers.iter().copied());
        if !invalid.is_empty() {
            return Err(TusError::InvalidHeaders(invalid));
        }

        let mut out = Self::default();
        for (name, value) in headers {
            match name.to_ascii_lowercase().as_str() {
                TUS_RESUMABLE_HEADER => out.tus_resumable = Some(value.to_string()),
                UPLOAD_OFFSET => out.upload_offset = parse_u64(value),
                UPLOAD_LENGTH => out.upload_length = parse_u64(value),
                UPLOAD_DEFER_LENGTH => out.upload_defer_length = true,
                UPLOAD_METADATA => out.upload_metadata = Some(value.to_string()),
                CONTENT_TYPE => out.content_type = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn with_upload_offset(mut self, offset: u64) -> Self {
        self.upload_offset = Some(offset);
        self
    }

    pub fn with_upload_length(mut self, length: u64) -> Self {
        self.upload_length = Some(length);
        self
    }

    pub fn with_defer_length(mut self) -> Self {
        self.upload_defer_length = true;
        self
    }

    pub fn with_metadata<S: Into<String>>(mut self, metadata: S) -> Self {
        self.upload_metadata = Some(metadata.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Headers of a well-formed append at `offset`.
    pub fn append_at(offset: u64) -> Self {
        Self::default()
            .with_upload_offset(offset)
            .with_content_type(OFFSET_OCTET_STREAM)
    }
}
