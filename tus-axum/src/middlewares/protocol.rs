use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use tus_core::headers::{TUS_RESUMABLE, TUS_RESUMABLE_HEADER};
use tus_core::{validate_header_syntax, TusError, TusResult};

use crate::routes::header_pairs;
use crate::TusAxumError;

/// Protocol checks shared by every upload route.
///
/// Non-`OPTIONS` requests must carry `Tus-Resumable` and pass the per-header
/// syntax rules before they reach a handler. Every response leaves with
/// `Tus-Resumable` set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TusProtocol;

impl TusProtocol {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TusProtocol {
    type Service = TusProtocolService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TusProtocolService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct TusProtocolService<S> {
    inner: S,
}

fn check_request(headers: &HeaderMap) -> TusResult<()> {
    if !headers.contains_key(TUS_RESUMABLE_HEADER) {
        return Err(TusError::VersionMissing);
    }
    let invalid = validate_header_syntax(header_pairs(headers));
    if !invalid.is_empty() {
        return Err(TusError::InvalidHeaders(invalid));
    }
    Ok(())
}

impl<S> Service<Request<Body>> for TusProtocolService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let checked = if req.method() == Method::OPTIONS {
                Ok(())
            } else {
                check_request(req.headers())
            };

            let mut res = match checked {
                Ok(()) => inner.call(req).await?,
                Err(e) => TusAxumError(e).into_response(),
            };
            res.headers_mut()
                .insert(TUS_RESUMABLE_HEADER, HeaderValue::from_static(TUS_RESUMABLE));
            Ok(res)
        })
    }
}
