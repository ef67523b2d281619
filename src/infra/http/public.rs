use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{ACCEPT, CONTENT_TYPE, VARY},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        feed::FeedService,
        negotiation::{MARKDOWN_MEDIA_TYPE, Negotiator, OutputMode, RouteState},
        render::RenderError,
        repos::{ResourcesRepo, SettingsRepo},
        resource::ResourceRenderer,
        syndication::SyndicationService,
    },
    domain::entities::{ResourceRecord, SiteSettingsRecord},
};

use super::middleware::{ServedOutput, log_responses, set_request_context};

const RSS_CONTENT_TYPE: &str = "application/rss+xml";

#[derive(Clone)]
pub struct HttpState {
    pub negotiator: Arc<Negotiator>,
    pub feed: Arc<FeedService>,
    pub renderer: Arc<ResourceRenderer>,
    pub syndication: Arc<SyndicationService>,
    pub resources: Arc<dyn ResourcesRepo>,
    pub site: Arc<dyn SettingsRepo>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/feed", get(site_feed))
        .route("/feed/", get(site_feed))
        .route("/feed/markdown", get(markdown_feed))
        .route("/feed/markdown/", get(markdown_feed))
        .route("/{slug}", get(resource_detail))
        .route("/{slug}/", get(resource_detail))
        .route("/{slug}/feed", get(comment_feed))
        .route("/{slug}/feed/", get(comment_feed))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// `?format=markdown` selects Markdown without an Accept header; `?feed`
/// asks a resource URL for its comment feed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputQuery {
    format: Option<String>,
    feed: Option<String>,
}

fn accept_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(ACCEPT).and_then(|value| value.to_str().ok())
}

fn negotiate(
    state: &HttpState,
    headers: &HeaderMap,
    query: &OutputQuery,
    route: &RouteState,
) -> Option<OutputMode> {
    let mode = state
        .negotiator
        .resolve(accept_header(headers), query.format.as_deref(), route);
    debug!(
        target = "postdown::http::negotiation",
        mode = mode.map(OutputMode::as_str).unwrap_or("none"),
        resource_type = route.resource_type.as_deref().unwrap_or(""),
        "Output negotiated"
    );
    mode
}

async fn markdown_feed(State(state): State<HttpState>) -> Response {
    let result = state.feed.markdown_feed().await;
    render_markdown(&state, OutputMode::AggregateFeed, result).await
}

async fn site_feed(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<OutputQuery>,
) -> Response {
    if negotiate(&state, &headers, &query, &RouteState::feed()).is_some() {
        let result = state.feed.markdown_feed().await;
        return render_markdown(&state, OutputMode::AggregateFeed, result).await;
    }

    match state.syndication.rss_feed().await {
        Ok(body) => xml_response(body),
        Err(err) => render_error("infra::http::public::rss", err),
    }
}

async fn resource_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Query(query): Query<OutputQuery>,
) -> Response {
    let resource = match find_resource(&state, &slug).await {
        Ok(resource) => resource,
        Err(response) => return response,
    };

    let route = if query.feed.is_some() {
        RouteState::comment_feed(resource.resource_type.clone())
    } else {
        RouteState::resource(resource.resource_type.clone())
    };

    match negotiate(&state, &headers, &query, &route) {
        Some(OutputMode::CommentFeed) => {
            let result = state.renderer.render_resource_with_comments(&resource).await;
            render_markdown(&state, OutputMode::CommentFeed, result).await
        }
        Some(OutputMode::Resource) => {
            let result = state.renderer.render_resource(&resource).await;
            render_markdown(&state, OutputMode::Resource, result).await
        }
        Some(OutputMode::AggregateFeed) | None => resource_page(&state, &resource).await,
    }
}

async fn comment_feed(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Query(query): Query<OutputQuery>,
) -> Response {
    let resource = match find_resource(&state, &slug).await {
        Ok(resource) => resource,
        Err(response) => return response,
    };

    let route = RouteState::comment_feed(resource.resource_type.clone());
    if negotiate(&state, &headers, &query, &route).is_some() {
        let result = state.renderer.render_resource_with_comments(&resource).await;
        return render_markdown(&state, OutputMode::CommentFeed, result).await;
    }

    match state.syndication.comment_rss(&resource).await {
        Ok(body) => xml_response(body),
        Err(err) => render_error("infra::http::public::comment_rss", err),
    }
}

async fn index(State(state): State<HttpState>) -> Response {
    let site = match load_site(&state).await {
        Ok(site) => site,
        Err(response) => return response,
    };

    let config = state.feed.configuration();
    let resources = match state
        .resources
        .list_published(&config.resource_types, config.max_posts)
        .await
    {
        Ok(resources) => resources,
        Err(err) => return render_error("infra::http::public::index", err.into()),
    };

    let mut items = String::new();
    for resource in &resources {
        items.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            html_escape(&site.resource_url(&resource.slug)),
            resource.title
        ));
    }

    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<ul>\n{}</ul>\n",
        html_escape(&site.name),
        html_escape(&site.description),
        items
    );
    let alternate = site.markdown_feed_url();
    html_response(&site, &site.name, &alternate, &body)
}

async fn resource_page(state: &HttpState, resource: &ResourceRecord) -> Response {
    let site = match load_site(state).await {
        Ok(site) => site,
        Err(response) => return response,
    };

    let alternate = format!("{}?format=markdown", site.resource_url(&resource.slug));
    let body = format!(
        "<article>\n<h1>{}</h1>\n{}\n</article>\n",
        resource.title, resource.body_html
    );
    html_response(&site, &resource.title, &alternate, &body)
}

async fn find_resource(state: &HttpState, slug: &str) -> Result<ResourceRecord, Response> {
    match state.renderer.find(slug).await {
        Ok(Some(resource)) => Ok(resource),
        Ok(None) => Err(HttpError::not_found(
            "infra::http::public::find_resource",
            format!("no published resource with slug `{slug}`"),
        )
        .into_response()),
        Err(err) => Err(render_error("infra::http::public::find_resource", err)),
    }
}

async fn load_site(state: &HttpState) -> Result<SiteSettingsRecord, Response> {
    state
        .site
        .load_site_settings()
        .await
        .map_err(|err| render_error("infra::http::public::site", err.into()))
}

async fn render_markdown(
    state: &HttpState,
    mode: OutputMode,
    result: Result<String, RenderError>,
) -> Response {
    let body = match result {
        Ok(body) => body,
        Err(err) => return render_error("infra::http::public::markdown", err),
    };
    let site = match load_site(state).await {
        Ok(site) => site,
        Err(response) => return response,
    };
    markdown_response(body, &site.charset, mode)
}

fn render_error(source: &'static str, err: RenderError) -> Response {
    let mut response = HttpError::from(err).into_response();
    if let Some(report) = response.extensions_mut().get_mut::<ErrorReport>() {
        report.source = source;
    }
    response
}

fn markdown_response(body: String, charset: &str, mode: OutputMode) -> Response {
    let content_type = format!("{MARKDOWN_MEDIA_TYPE}; charset={charset}");
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(VARY, HeaderValue::from_static("Accept"))
        .body(Body::from(body));
    served(response, ServedOutput::Markdown(mode))
}

fn html_response(
    site: &SiteSettingsRecord,
    title: &str,
    markdown_alternate: &str,
    body: &str,
) -> Response {
    let document = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"{charset}\">\n<title>{title}</title>\n<link rel=\"alternate\" type=\"{MARKDOWN_MEDIA_TYPE}\" href=\"{alternate}\">\n</head>\n<body>\n{body}</body>\n</html>\n",
        charset = html_escape(&site.charset),
        title = html_escape(title),
        alternate = html_escape(markdown_alternate),
    );
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, format!("text/html; charset={}", site.charset))
        .header(VARY, HeaderValue::from_static("Accept"))
        .body(Body::from(document));
    served(response, ServedOutput::Html)
}

fn xml_response(body: String) -> Response {
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, RSS_CONTENT_TYPE)
        .header(VARY, HeaderValue::from_static("Accept"))
        .body(Body::from(body));
    served(response, ServedOutput::Rss)
}

fn served(built: Result<Response, axum::http::Error>, output: ServedOutput) -> Response {
    match built {
        Ok(mut response) => {
            response.extensions_mut().insert(output);
            response
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_response_sets_charset_and_vary() {
        let response =
            markdown_response("# Hi\n".to_string(), "ISO-8859-1", OutputMode::Resource);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/markdown; charset=ISO-8859-1"
        );
        assert_eq!(response.headers()[VARY], "Accept");
        assert_eq!(
            response.extensions().get::<ServedOutput>(),
            Some(&ServedOutput::Markdown(OutputMode::Resource))
        );
    }

    #[test]
    fn escapes_attribute_text() {
        assert_eq!(html_escape("a\"<b>&"), "a&quot;&lt;b&gt;&amp;");
    }
}
