use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the spectator controller.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::announcement_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::public::list_servers,
        crate::routes::public::current_server,
        crate::routes::public::player_summary,
        crate::routes::public::top_players,
        crate::routes::public::join_target,
        crate::routes::public::custom_commands,
        crate::routes::admin::join_server,
        crate::routes::admin::ignore_server,
        crate::routes::admin::notice_server,
        crate::routes::admin::forward_command,
        crate::routes::admin::reload_rotation,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::AnnouncementEvent,
            crate::dto::spectator::ServerDto,
            crate::dto::spectator::SpectatorOutboundMessage,
            crate::state::phase::GamePhase,
            crate::state::spectator::ForwardedCommand,
            crate::config::Role,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "spectator", description = "WebSocket channel of the spectator client"),
        (name = "public", description = "Read-only rotation and server information"),
        (name = "admin", description = "Operator actions, guarded by the application key"),
    )
)]
pub struct ApiDoc;
