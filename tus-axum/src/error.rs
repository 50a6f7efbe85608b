use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::{debug, error, warn};
use tus_core::headers::{TUS_MAX_SIZE, TUS_RESUMABLE, TUS_RESUMABLE_HEADER, TUS_VERSION, TUS_VERSIONS};
use tus_core::TusError;

#[derive(Debug)]
pub struct TusAxumError(pub TusError);

impl From<TusError> for TusAxumError {
    fn from(e: TusError) -> Self {
        Self(e)
    }
}

impl IntoResponse for TusAxumError {
    fn into_response(self) -> Response {
        let err = self.0;

        // Oversized bodies get no answer: the body fails at once and hyper drops the connection
        if err.aborts_connection() {
            warn!("aborting connection: {}", err);
            let message = err.to_string();
            let body = Body::from_stream(futures::stream::once(async move {
                Err::<Bytes, std::io::Error>(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    message,
                ))
            }));
            let mut res = (StatusCode::PAYLOAD_TOO_LARGE, body).into_response();
            res.headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
            return res;
        }

        let status =
            StatusCode::from_u16(err.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("request failed: {:?}", err);
        } else {
            debug!("request rejected ({}): {}", status.as_u16(), err);
        }

        let mut res = (status, Json(err.to_json())).into_response();
        let headers = res.headers_mut();
        headers.insert(TUS_RESUMABLE_HEADER, HeaderValue::from_static(TUS_RESUMABLE));
        if matches!(err, TusError::VersionMissing) {
            if let Ok(versions) = HeaderValue::from_str(&TUS_VERSIONS.join(",")) {
                headers.insert(TUS_VERSION, versions);
            }
        }
        if let Some(max_size) = err.max_size() {
            headers.insert(TUS_MAX_SIZE, HeaderValue::from(max_size));
        }
        res
    }
}
