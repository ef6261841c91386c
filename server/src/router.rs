use axum::{
    Router,
    http::Method,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::oauth::oauth_router;
use crate::{
    handlers::{
        auth_handlers::{current_user_handler, logout_handler},
        canvas_handlers::{
            create_canvas_handler, create_idea_handler, delete_canvas_handler,
            delete_idea_handler, get_canvas_handler, list_canvases_handler, list_ideas_handler,
            update_idea_handler,
        },
        chat_handlers::{list_chat_messages_handler, post_chat_message_handler},
        health_handlers::health_handler,
        voice_handlers::{
            count_active_participants_handler, end_session_handler, get_session_handler,
            join_session_handler, leave_session_handler, list_active_participants_handler,
            list_all_participants_handler, list_sessions_handler, move_member_handler,
            start_session_handler,
        },
        workspace_handlers::{
            create_workspace_handler, delete_workspace_handler, get_workspace_handler,
            join_workspace_handler, list_members_handler, list_workspaces_handler,
            remove_member_handler,
        },
    },
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/user", get(current_user_handler))
        .route("/logout", post(logout_handler))
        // Workspaces & membership
        .route(
            "/workspaces",
            post(create_workspace_handler).get(list_workspaces_handler),
        )
        .route(
            "/workspaces/{workspace_id}",
            get(get_workspace_handler).delete(delete_workspace_handler),
        )
        .route(
            "/workspaces/{workspace_id}/members",
            post(join_workspace_handler).get(list_members_handler),
        )
        .route(
            "/workspaces/{workspace_id}/members/{user_id}",
            axum::routing::delete(remove_member_handler),
        )
        // Canvases & ideas
        .route(
            "/workspaces/{workspace_id}/canvases",
            post(create_canvas_handler).get(list_canvases_handler),
        )
        .route(
            "/workspaces/{workspace_id}/canvases/{canvas_id}",
            get(get_canvas_handler).delete(delete_canvas_handler),
        )
        .route(
            "/workspaces/{workspace_id}/canvases/{canvas_id}/ideas",
            post(create_idea_handler).get(list_ideas_handler),
        )
        .route(
            "/workspaces/{workspace_id}/canvases/{canvas_id}/ideas/{idea_id}",
            patch(update_idea_handler).delete(delete_idea_handler),
        )
        // Chat
        .route(
            "/workspaces/{workspace_id}/chat",
            post(post_chat_message_handler).get(list_chat_messages_handler),
        )
        // Voice sessions
        .route(
            "/workspaces/{workspace_id}/voice",
            post(start_session_handler).get(list_sessions_handler),
        )
        .route(
            "/workspaces/{workspace_id}/voice/{session_id}",
            get(get_session_handler).patch(end_session_handler),
        )
        .route(
            "/workspaces/{workspace_id}/voice/{session_id}/users",
            post(join_session_handler).get(list_active_participants_handler),
        )
        .route(
            "/workspaces/{workspace_id}/voice/{session_id}/users/move",
            post(move_member_handler),
        )
        .route(
            "/workspaces/{workspace_id}/voice/{session_id}/users/all",
            get(list_all_participants_handler),
        )
        .route(
            "/workspaces/{workspace_id}/voice/{session_id}/users/count",
            get(count_active_participants_handler),
        )
        .route(
            "/workspaces/{workspace_id}/voice/{session_id}/users/{workspace_user_id}",
            axum::routing::delete(leave_session_handler),
        )
        .merge(oauth_router());

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
