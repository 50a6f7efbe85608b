use axum::{
    body::Body,
    extract::{OriginalUri, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{self, MethodRouter},
    Router,
};
use futures::TryStreamExt;
use tracing::warn;
use tus_core::headers::{
    MAX_AGE, TUS_EXTENSION, TUS_MAX_SIZE, TUS_VERSION, TUS_VERSIONS, UPLOAD_DEFER_LENGTH,
    UPLOAD_LENGTH, UPLOAD_METADATA, UPLOAD_OFFSET,
};
use tus_core::{encode_metadata, ByteStream, TusHeaders, UploadKey, UploadLength};

use crate::{TusAxumError, TusState};

/// `(name, value)` pairs of every header with a textual value
pub(crate) fn header_pairs(headers: &HeaderMap) -> Vec<(&str, &str)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
        .collect()
}

fn tus_headers(headers: &HeaderMap) -> Result<TusHeaders, TusAxumError> {
    Ok(TusHeaders::parse(header_pairs(headers))?)
}

/// Address of a new upload: the creation path, then the key.
fn location_for(path: &str, key: &UploadKey) -> String {
    format!("{}/{}", path.trim_end_matches('/'), key)
}

async fn create(
    State(state): State<TusState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, TusAxumError> {
    let headers = tus_headers(&headers)?;
    let key = state.server.create(&headers).await?;
    let location = location_for(uri.path(), &key);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

async fn inspect(
    State(state): State<TusState>,
    Path(key): Path<String>,
) -> Result<Response, TusAxumError> {
    let status = state.server.inspect(&UploadKey::from_string(key)).await?;

    let mut res = StatusCode::OK.into_response();
    let headers = res.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(UPLOAD_OFFSET, HeaderValue::from(status.offset));
    match status.length {
        UploadLength::Known(length) => {
            headers.insert(UPLOAD_LENGTH, HeaderValue::from(length));
        }
        UploadLength::Deferred => {
            headers.insert(UPLOAD_DEFER_LENGTH, HeaderValue::from_static("1"));
        }
    }
    let metadata = encode_metadata(&status.metadata);
    if !metadata.is_empty() {
        match HeaderValue::from_str(&metadata) {
            Ok(value) => {
                headers.insert(UPLOAD_METADATA, value);
            }
            Err(e) => warn!("omitting Upload-Metadata {:?}: {}", metadata, e),
        }
    }
    Ok(res)
}

async fn append(
    State(state): State<TusState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, TusAxumError> {
    let headers = tus_headers(&headers)?;
    let stream: ByteStream = Box::pin(body.into_data_stream().map_err(std::io::Error::other));

    let offset = state
        .server
        .append(&UploadKey::from_string(key), &headers, stream)
        .await?;
    Ok((StatusCode::NO_CONTENT, [(UPLOAD_OFFSET, offset.to_string())]).into_response())
}

async fn terminate(
    State(state): State<TusState>,
    Path(key): Path<String>,
) -> Result<Response, TusAxumError> {
    state.server.terminate(&UploadKey::from_string(key)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn discover(State(state): State<TusState>) -> Response {
    let capabilities = state.server.capabilities();

    let mut res = StatusCode::NO_CONTENT.into_response();
    let headers = res.headers_mut();
    if let Ok(versions) = HeaderValue::from_str(&TUS_VERSIONS.join(",")) {
        headers.insert(TUS_VERSION, versions);
    }
    if !capabilities.extensions.is_empty() {
        if let Ok(extensions) = HeaderValue::from_str(&capabilities.extension_header()) {
            headers.insert(TUS_EXTENSION, extensions);
        }
    }
    if let Some(max_size) = capabilities.max_size {
        headers.insert(TUS_MAX_SIZE, HeaderValue::from(max_size));
    }
    if let Ok(cache) = HeaderValue::from_str(&format!("max-age={}", MAX_AGE)) {
        headers.insert(header::CACHE_CONTROL, cache);
    }
    res
}

pub(crate) async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn collection() -> MethodRouter<TusState> {
    routing::post(create).options(discover)
}

/// The collection endpoint alone, for serving its trailing-slash path
/// next to a nested [`upload_router`].
pub fn collection_route(state: TusState) -> MethodRouter<()> {
    collection().with_state(state)
}

/// Routes for one upload collection: `POST /` creates, `/{key}` is the
/// upload resource. Mount it under the collection's path.
pub fn upload_router(state: TusState) -> Router<()> {
    Router::new()
        .route("/", collection())
        .route(
            "/{key}",
            routing::head(inspect)
                .patch(append)
                .delete(terminate)
                .options(discover),
        )
        .with_state(state)
}
