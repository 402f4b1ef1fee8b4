//! Maps UI channel requests onto the export service.

use std::sync::Arc;

use tracing::debug;

use crate::domain::models::{Request, RequestEnvelope, Response};
use crate::services::export_service::ExportService;

/// Version reported to `ping`.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Answers channel requests.
///
/// `cancel` and `ping` are answered immediately; `export` and `copy` resolve
/// once the operation reaches a terminal state.
#[derive(Clone)]
pub struct MessageRouter {
    service: Arc<ExportService>,
    default_full_load: bool,
}

impl MessageRouter {
    /// Route requests to `service`; full load defaults to on.
    pub fn new(service: Arc<ExportService>) -> Self {
        Self {
            service,
            default_full_load: true,
        }
    }

    /// Full-load setting for requests that do not carry `fullLoad`.
    #[must_use]
    pub fn with_default_full_load(mut self, full_load: bool) -> Self {
        self.default_full_load = full_load;
        self
    }

    /// The service requests are routed to.
    pub fn service(&self) -> &Arc<ExportService> {
        &self.service
    }

    /// Handle one request.
    pub async fn handle(&self, request: Request) -> Response {
        debug!(?request, "received message");
        if let Some(operation) = request.operation_or(self.default_full_load) {
            return self.service.run(operation).await.into();
        }
        match request {
            Request::Cancel => {
                self.service.cancel();
                Response::ok()
            }
            Request::Ping => Response::pong(PROTOCOL_VERSION),
            Request::Export { .. } | Request::Copy { .. } => {
                Response::error(format!("unhandled request: {request:?}"))
            }
        }
    }

    /// Handle a request, echoing its correlation id.
    pub async fn handle_envelope(&self, envelope: RequestEnvelope) -> Response {
        let RequestEnvelope { id, request } = envelope;
        self.handle(request).await.with_id(id)
    }

    /// Whether this request starts a long-running operation.
    pub fn is_long_running(request: &Request) -> bool {
        request.operation().is_some()
    }
}
