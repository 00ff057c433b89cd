//! HTTP request handlers

use super::state::AppState;
use crate::error::SearchError;
use crate::locales::{self, MessageKey};
use crate::search::SearchQuery;
use axum::{
    extract::{Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::{error, info};

/// Query parameters for search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search keyword
    pub q: Option<String>,
    /// Page number, defaults to 1
    pub page: Option<String>,
    /// Providers (comma-separated), defaults to all
    pub engines: Option<String>,
}

/// JSON envelope returned by every search response
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success { data: T },
    Error { message: String },
}

impl Envelope<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            message: message.into(),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(Envelope::error(message))).into_response()
}

/// Map a request-level error to its status and localized message
fn search_error_response(lang: &str, err: &SearchError) -> Response {
    let key = match err {
        SearchError::EmptyKeyword => MessageKey::MissingKeyword,
        SearchError::InvalidPage(_) => MessageKey::InvalidPage,
        SearchError::NoValidProviders { .. } => MessageKey::NoValidProviders,
        SearchError::Internal(detail) => {
            error!("Search failed: {}", detail);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                locales::search_failed(lang, detail),
            );
        }
    };
    info!(error = %err, "rejected search request");
    error_response(StatusCode::BAD_REQUEST, locales::message(lang, key))
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Response {
    let lang = locales::negotiate(
        headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()),
        state.default_locale(),
    );

    let query = match SearchQuery::from_params(
        params.q.as_deref(),
        params.page.as_deref(),
        params.engines.as_deref(),
    ) {
        Ok(query) => query,
        Err(e) => return search_error_response(&lang, &e),
    };

    let result = match state.search.aggregate(&query).await {
        Ok(result) => result,
        Err(e) => return search_error_response(&lang, &e),
    };

    // Zero records from valid providers is a soft failure, still 200
    if result.is_empty() {
        return (
            StatusCode::OK,
            Json(Envelope::error(locales::message(&lang, MessageKey::NoResults))),
        )
            .into_response();
    }

    match serde_json::to_value(Envelope::Success { data: &result }) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => search_error_response(&lang, &SearchError::from(e)),
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "instance": state.instance_name(),
        "engines": state.search.registry().names(),
    }))
}

/// Turn a handler panic into a JSON 500
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        locales::search_failed(locales::FALLBACK_LANGUAGE, &detail),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_envelope_shapes() {
        let value = serde_json::to_value(Envelope::Success { data: 1 }).unwrap();
        assert_eq!(value, serde_json::json!({"status": "success", "data": 1}));

        let value = serde_json::to_value(Envelope::error("nope")).unwrap();
        assert_eq!(value, serde_json::json!({"status": "error", "message": "nope"}));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let response = search_error_response("en", &SearchError::EmptyKeyword);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Please provide a search keyword (q parameter)"
        );

        let response = search_error_response("zh", &SearchError::Internal("boom".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "搜索失败: boom");
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "搜索失败: exploded");
    }
}
