// HTTP request handlers
use crate::application::live_updates::{StreamSignal, Subscription};
use crate::domain::access::UpdateRequest;
use crate::domain::dashboard::Dashboard;
use crate::domain::user::User;
use crate::infrastructure::config::load_addon_options;
use crate::presentation::app_state::AppState;
use crate::presentation::page::render_page;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// The panel page, with current users and dashboards embedded
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let options = load_addon_options(&state.options_path).await;
    let users = state.dashboard_service.list_users().await;
    let dashboards = state.dashboard_service.list_dashboard_details().await;
    Html(render_page(&users, &dashboards, options.base_url()))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.dashboard_service.list_users().await)
}

pub async fn list_structure(State(state): State<Arc<AppState>>) -> Json<Vec<Dashboard>> {
    Json(state.dashboard_service.list_dashboard_details().await)
}

/// Apply one visibility change. The body is parsed by hand so a bad payload
/// gets the same JSON envelope as every other failure.
pub async fn update_access(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: UpdateRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Rejecting update payload: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(UpdateResponse::failure("Invalid JSON")),
            )
                .into_response();
        }
    };

    match state.access_service.update_access(&request).await {
        Ok(()) => Json(UpdateResponse::ok()).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UpdateResponse::failure(e.to_string())),
        )
            .into_response(),
    }
}

/// Server-sent refresh signals. The stream owns its subscription, so closing
/// the tab drops it and unregisters the handle.
pub async fn stream_updates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let subscription = state.broadcaster.subscribe();
    tracing::debug!("Stream {} opened", subscription.id());

    (
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(signal_stream(subscription)),
    )
}

fn signal_stream(
    mut subscription: Subscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(signal) = subscription.recv().await {
            let event = match signal {
                StreamSignal::Update => Event::default().data("update"),
                StreamSignal::Heartbeat => Event::default().comment("ping"),
            };
            yield Ok(event);
        }
    }
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
