use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/announcements",
    tag = "sse",
    responses((status = 200, description = "Chat announcement stream", content_type = "text/event-stream", body = String))
)]
/// Stream chat announcements to the relay.
pub async fn announcement_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_announcements(&state);
    info!("new announcement SSE connection");
    sse_service::to_sse_stream(receiver, sse_service::announcement_handshake())
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/announcements", get(announcement_stream))
}
