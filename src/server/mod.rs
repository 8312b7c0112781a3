//! HTTP Server module
//!
//! Binds the listener and dispatches the routes registered from the snapshot.

use crate::config::Snapshot;
use crate::forward::build_client;
use crate::routes::{RouteHandler, RouteTable};
use axum::{
    response::IntoResponse,
    routing::{on, MethodFilter},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the router for a snapshot
pub fn create_server_router(snapshot: &Snapshot) -> anyhow::Result<Router> {
    let client = build_client(&snapshot.forward)?;
    let table = RouteTable::build(snapshot, &client);
    Ok(router_from_table(&table))
}

/// Turn a route table into an axum router
pub fn router_from_table(table: &RouteTable) -> Router {
    let mut router = Router::new();

    for route in table.routes() {
        let filter = match MethodFilter::try_from(route.method.clone()) {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!(error = %e, path = %route.path, "Unsupported method, skipping route");
                continue;
            }
        };

        router = match route.handler.clone() {
            RouteHandler::Key(response) => router.route(
                &route.path,
                on(filter, move || {
                    let response = response.clone();
                    async move { response.into_response() }
                }),
            ),
            RouteHandler::Forward(forwarder) => router.route(
                &route.path,
                on(filter, move || {
                    let forwarder = forwarder.clone();
                    async move { forwarder.handle().await }
                }),
            ),
        };
    }

    router.layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn start_server(snapshot: Snapshot) -> anyhow::Result<()> {
    let addr = snapshot.server.addr();
    let app = create_server_router(&snapshot)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server is listening on port: {}", snapshot.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
