use std::sync::Arc;

use axum::http::{HeaderName, Method};
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tus_core::headers::{MAX_AGE, PROTOCOL_HEADERS};
use tus_core::TusServer;

use crate::middlewares::TusProtocol;
use crate::routes;
use crate::{ServerConfig, TusState};

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone)]
pub struct TusApp {
    pub server: Arc<TusServer>,
    pub router: Router<()>,
}

impl TusApp {
    /// Mount the upload collection at `base_path` ("/" or "" for the root).
    pub fn new(server: TusServer, base_path: &str) -> Self {
        let state = TusState::new(server);
        let server = Arc::clone(&state.server);

        let base_path = base_path.trim_end_matches('/');
        let router = if base_path.is_empty() {
            routes::upload_router(state)
        } else {
            // `POST /files/` reaches the same endpoint as `POST /files`
            Router::new()
                .route(&format!("{}/", base_path), routes::collection_route(state.clone()))
                .nest(base_path, routes::upload_router(state))
        };

        // Outside the nest so unmatched paths carry `Tus-Resumable` too
        let router = router
            .fallback(routes::not_found)
            .layer(TusProtocol::new());

        let request_id = HeaderName::from_static(REQUEST_ID);
        let router = router
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

        Self { server, router }
    }

    pub fn from_config(server: TusServer, config: &ServerConfig) -> Self {
        let app = Self::new(server, &config.base_path);
        if config.cors {
            app.with_cors()
        } else {
            app
        }
    }

    /// Let browsers talk to the server from any origin.
    pub fn with_cors(mut self) -> Self {
        let headers: Vec<HeaderName> = PROTOCOL_HEADERS
            .iter()
            .copied()
            .map(HeaderName::from_static)
            .collect();

        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods([
                Method::POST,
                Method::HEAD,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(headers.clone())
            .expose_headers(headers)
            .max_age(std::time::Duration::from_secs(MAX_AGE));

        self.router = self.router.layer(cors);
        self
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
