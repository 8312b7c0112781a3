//! Route table module
//!
//! Turns the configuration snapshot into an explicit method + path table.
//! Keys register before forwards. A repeated path keeps its first handler.

use crate::config::Snapshot;
use crate::forward::{forward_path, Forwarder};
use crate::responder::{key_path, KeyResponse};
use axum::http::Method;
use reqwest::Client;
use std::collections::HashSet;

/// What a route does when hit
#[derive(Clone)]
pub enum RouteHandler {
    Key(KeyResponse),
    Forward(Forwarder),
}

/// A single registered route
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub handler: RouteHandler,
}

/// Immutable set of routes built at startup
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the table from a snapshot, sharing one upstream client
    pub fn build(snapshot: &Snapshot, client: &Client) -> Self {
        let mut table = Self::default();
        let mut seen = HashSet::new();

        for entry in &snapshot.keys {
            let path = key_path(&entry.name);
            if !seen.insert(path.clone()) {
                tracing::warn!(path = %path, "Duplicate key route, keeping the first");
                continue;
            }

            tracing::info!("Listening for {} -> {}", path, entry.value);
            table.routes.push(Route {
                method: Method::GET,
                path,
                handler: RouteHandler::Key(KeyResponse::new(entry, snapshot.key_style)),
            });
        }

        for entry in &snapshot.forwards {
            let path = forward_path(&entry.name);
            if !seen.insert(path.clone()) {
                tracing::warn!(path = %path, "Duplicate forward route, keeping the first");
                continue;
            }

            tracing::info!("Forwarding {} to {}", path, entry.target_url);
            table.routes.push(Route {
                method: Method::GET,
                path,
                handler: RouteHandler::Forward(Forwarder::new(client.clone(), entry.clone())),
            });
        }

        table
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
impl RouteTable {
    fn len(&self) -> usize {
        self.routes.len()
    }

    fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| &r.method == method && r.path == path)
    }
}
