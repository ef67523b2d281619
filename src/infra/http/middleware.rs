use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::{error::ErrorReport, negotiation::OutputMode};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Representation a handler chose for its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedOutput {
    Markdown(OutputMode),
    Rss,
    Html,
}

impl ServedOutput {
    pub fn as_str(self) -> &'static str {
        match self {
            ServedOutput::Markdown(OutputMode::Resource) => "markdown_resource",
            ServedOutput::Markdown(OutputMode::CommentFeed) => "markdown_comment_feed",
            ServedOutput::Markdown(OutputMode::AggregateFeed) => "markdown_feed",
            ServedOutput::Rss => "rss",
            ServedOutput::Html => "html",
        }
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Logs the served representation of every response; failures at warn or error.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let accept = request
        .headers()
        .get(axum::http::header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    let output = response
        .extensions()
        .get::<ServedOutput>()
        .map_or("none", |served| served.as_str());

    if !(status.is_client_error() || status.is_server_error()) {
        debug!(
            target = "postdown::http::response",
            status = status.as_u16(),
            path = %uri.path(),
            output,
            accept = %accept,
            elapsed_ms,
            request_id = request_id,
            "request served",
        );
        return response;
    }

    let report = response.extensions_mut().remove::<ErrorReport>();
    let (source, messages) = match report {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());

    if status.is_server_error() {
        error!(
            target = "postdown::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            accept = %accept,
            elapsed_ms,
            source,
            detail = %detail,
            chain = ?messages,
            request_id = request_id,
            "render failed",
        );
    } else {
        warn!(
            target = "postdown::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            accept = %accept,
            elapsed_ms,
            source,
            detail = %detail,
            request_id = request_id,
            "client request error",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn served_output_labels_name_the_document() {
        assert_eq!(
            ServedOutput::Markdown(OutputMode::CommentFeed).as_str(),
            "markdown_comment_feed"
        );
        assert_eq!(ServedOutput::Markdown(OutputMode::AggregateFeed).as_str(), "markdown_feed");
        assert_eq!(ServedOutput::Rss.as_str(), "rss");
    }
}
