use std::fmt;

use anyhow::Error as AnyError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use tracing::error;

#[derive(Debug, Clone, Copy)]
struct ErrorDescriptor {
    status: StatusCode,
    name: &'static str,
    error_type: &'static str,
    default_message: &'static str,
}

const BAD_REQUEST_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::BAD_REQUEST,
    name: "BAD_REQUEST",
    error_type: "BAD_REQUEST",
    default_message: "Bad request.",
};

const UNAUTHORIZED_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::UNAUTHORIZED,
    name: "AUTHENTICATION_REQUIRED",
    error_type: "AUTHENTICATION_REQUIRED",
    default_message: "You must sign in first to access this resource.",
};

const CONFLICT_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::CONFLICT,
    name: "RESOURCE_ALREADY_EXISTS",
    error_type: "RESOURCE_ALREADY_EXISTS",
    default_message: "Resource already exists.",
};

const NOT_FOUND_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::NOT_FOUND,
    name: "NOT_FOUND",
    error_type: "RESOURCE_NOT_FOUND",
    default_message: "Resource not found.",
};

const FORBIDDEN_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::FORBIDDEN,
    name: "ACTION_FORBIDDEN",
    error_type: "ACTION_FORBIDDEN",
    default_message: "Action forbidden.",
};

const INTERNAL_SERVER_ERROR_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    name: "INTERNAL_SERVER_ERROR",
    error_type: "INTERNAL_SERVER_ERROR",
    default_message: "An internal error occurred.",
};

#[derive(Debug)]
pub struct AppError {
    descriptor: &'static ErrorDescriptor,
    name: String,
    error_type: String,
    message: String,
    data: Option<JsonValue>,
    source: Option<AnyError>,
}

impl AppError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::from_descriptor(&BAD_REQUEST_DESCRIPTOR, Some(message.into()))
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::from_descriptor(&UNAUTHORIZED_DESCRIPTOR, Some(message.into()))
    }

    pub(crate) fn internal(error: AnyError) -> Self {
        error!(?error, "internal server error");
        Self::from_descriptor(&INTERNAL_SERVER_ERROR_DESCRIPTOR, None).with_source(error)
    }

    pub(crate) fn from_anyhow(error: AnyError) -> Self {
        Self::internal(error)
    }

    /// Stable machine-readable name, used by callers that branch on a
    /// specific failure without parsing messages.
    pub(crate) fn kind(&self) -> &str {
        &self.name
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        let field = field.to_owned();
        let message = format!("Missing required field {field}.");

        Self::from_descriptor(&BAD_REQUEST_DESCRIPTOR, Some(message))
            .with_name("MISSING_FIELD")
            .with_data(json!({ "field": field }))
    }

    pub(crate) fn workspace_not_found(workspace_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let message = format!("Workspace {workspace_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("WORKSPACE_NOT_FOUND")
            .with_data(json!({ "workspaceId": workspace_id }))
    }

    pub(crate) fn membership_not_found(workspace_id: &str, member_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let member_id = member_id.to_owned();
        let message = format!("Membership {member_id} not found in Workspace {workspace_id}.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("MEMBERSHIP_NOT_FOUND")
            .with_data(json!({ "workspaceId": workspace_id, "workspaceUserId": member_id }))
    }

    pub(crate) fn not_a_member(workspace_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let message = format!("You are not a member of Workspace {workspace_id}.");

        Self::from_descriptor(&FORBIDDEN_DESCRIPTOR, Some(message))
            .with_name("NOT_A_MEMBER")
            .with_error_type("NO_PERMISSION")
            .with_data(json!({ "workspaceId": workspace_id }))
    }

    pub(crate) fn insufficient_role(workspace_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let message = format!("Only an owner of Workspace {workspace_id} may do this.");

        Self::from_descriptor(&FORBIDDEN_DESCRIPTOR, Some(message))
            .with_name("INSUFFICIENT_ROLE")
            .with_error_type("NO_PERMISSION")
            .with_data(json!({ "workspaceId": workspace_id }))
    }

    pub(crate) fn already_joined_workspace(workspace_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let message = format!("You are already a member of Workspace {workspace_id}.");

        Self::from_descriptor(&CONFLICT_DESCRIPTOR, Some(message))
            .with_name("ALREADY_JOINED_WORKSPACE")
            .with_data(json!({ "workspaceId": workspace_id }))
    }

    pub(crate) fn workspace_mismatch(workspace_id: &str, member_id: &str) -> Self {
        let workspace_id = workspace_id.to_owned();
        let member_id = member_id.to_owned();
        let message =
            format!("Membership {member_id} does not belong to Workspace {workspace_id}.");

        Self::from_descriptor(&FORBIDDEN_DESCRIPTOR, Some(message))
            .with_name("WORKSPACE_MISMATCH")
            .with_error_type("WORKSPACE_MISMATCH")
            .with_data(json!({ "workspaceId": workspace_id, "workspaceUserId": member_id }))
    }

    pub(crate) fn canvas_not_found(canvas_id: &str) -> Self {
        let canvas_id = canvas_id.to_owned();
        let message = format!("Canvas {canvas_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("CANVAS_NOT_FOUND")
            .with_data(json!({ "canvasId": canvas_id }))
    }

    pub(crate) fn idea_not_found(idea_id: &str) -> Self {
        let idea_id = idea_id.to_owned();
        let message = format!("Idea {idea_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("IDEA_NOT_FOUND")
            .with_data(json!({ "ideaId": idea_id }))
    }

    pub(crate) fn session_not_found(session_id: &str) -> Self {
        let session_id = session_id.to_owned();
        let message = format!("Voice session {session_id} not found.");

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("VOICE_SESSION_NOT_FOUND")
            .with_data(json!({ "sessionId": session_id }))
    }

    pub(crate) fn session_not_in_workspace(session_id: &str, workspace_id: &str) -> Self {
        let session_id = session_id.to_owned();
        let workspace_id = workspace_id.to_owned();
        let message =
            format!("Voice session {session_id} does not belong to Workspace {workspace_id}.");

        Self::from_descriptor(&FORBIDDEN_DESCRIPTOR, Some(message))
            .with_name("SESSION_NOT_IN_WORKSPACE")
            .with_error_type("SESSION_NOT_IN_WORKSPACE")
            .with_data(json!({ "sessionId": session_id, "workspaceId": workspace_id }))
    }

    pub(crate) fn session_closed(session_id: &str) -> Self {
        let session_id = session_id.to_owned();
        let message = format!("Voice session {session_id} has already ended.");

        Self::from_descriptor(&FORBIDDEN_DESCRIPTOR, Some(message))
            .with_name("SESSION_CLOSED")
            .with_error_type("SESSION_CLOSED")
            .with_data(json!({ "sessionId": session_id }))
    }

    pub(crate) fn already_joined(session_id: &str, member_id: &str) -> Self {
        let session_id = session_id.to_owned();
        let member_id = member_id.to_owned();
        let message =
            format!("Membership {member_id} is already an active participant of session {session_id}.");

        Self::from_descriptor(&BAD_REQUEST_DESCRIPTOR, Some(message))
            .with_name("ALREADY_JOINED")
            .with_error_type("ALREADY_JOINED")
            .with_data(json!({ "sessionId": session_id, "workspaceUserId": member_id }))
    }

    pub(crate) fn active_participant_not_found(session_id: &str, member_id: &str) -> Self {
        let session_id = session_id.to_owned();
        let member_id = member_id.to_owned();
        let message = format!(
            "Membership {member_id} is not an active participant of session {session_id}."
        );

        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some(message))
            .with_name("ACTIVE_PARTICIPANT_NOT_FOUND")
            .with_data(json!({ "sessionId": session_id, "workspaceUserId": member_id }))
    }

    pub(crate) fn into_payload(self) -> (StatusCode, UserFriendlyPayload) {
        let AppError {
            descriptor,
            name,
            error_type,
            message,
            data,
            source: _,
        } = self;

        let status = descriptor.status;
        let (code, reason) = code_and_reason(status);
        let payload = UserFriendlyPayload {
            status: status.as_u16(),
            code,
            reason,
            error_type,
            name,
            message,
            data,
        };

        (status, payload)
    }

    fn from_descriptor(descriptor: &'static ErrorDescriptor, message: Option<String>) -> Self {
        Self {
            descriptor,
            name: descriptor.name.to_owned(),
            error_type: descriptor.error_type.to_owned(),
            message: message.unwrap_or_else(|| descriptor.default_message.to_owned()),
            data: None,
            source: None,
        }
    }

    fn with_source(mut self, error: AnyError) -> Self {
        self.source = Some(error);
        self
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    pub(crate) fn with_data(mut self, data: JsonValue) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = self.into_payload();
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UserFriendlyPayload {
    pub(crate) status: u16,
    pub(crate) code: String,
    pub(crate) reason: String,
    #[serde(rename = "type")]
    pub(crate) error_type: String,
    pub(crate) name: String,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<JsonValue>,
}

fn code_and_reason(status: StatusCode) -> (String, String) {
    let reason = status
        .canonical_reason()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Status {}", status.as_u16()));

    let code = reason
        .chars()
        .map(|ch| match ch {
            'a'..='z' => ch.to_ascii_uppercase(),
            'A'..='Z' | '0'..='9' => ch,
            _ => '_',
        })
        .collect::<String>();

    (code, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn http_error_payload_matches_contract() {
        let response = AppError::bad_request("name must not be empty").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["reason"], "Bad Request");
        assert_eq!(json["type"], "BAD_REQUEST");
        assert_eq!(json["name"], "BAD_REQUEST");
        assert_eq!(json["message"], "name must not be empty");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn session_closed_uses_forbidden_contract() {
        let response = AppError::session_closed("session-123").into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(json["status"], 403);
        assert_eq!(json["type"], "SESSION_CLOSED");
        assert_eq!(json["name"], "SESSION_CLOSED");
        assert_eq!(
            json["message"],
            "Voice session session-123 has already ended."
        );

        let data = json["data"].as_object().expect("data present");
        assert_eq!(
            data.get("sessionId"),
            Some(&serde_json::Value::String("session-123".into()))
        );
    }

    #[tokio::test]
    async fn active_participant_not_found_is_404() {
        let response = AppError::active_participant_not_found("s-1", "m-1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn already_joined_voice_is_400_while_workspace_join_conflict_is_409() {
        let voice = AppError::already_joined("s-1", "m-1").into_response();
        assert_eq!(voice.status(), StatusCode::BAD_REQUEST);

        let workspace = AppError::already_joined_workspace("w-1").into_response();
        assert_eq!(workspace.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn kind_exposes_stable_name() {
        assert_eq!(
            AppError::active_participant_not_found("s1", "m1").kind(),
            "ACTIVE_PARTICIPANT_NOT_FOUND"
        );
        assert_eq!(AppError::missing_field("workspaceUserId").kind(), "MISSING_FIELD");
    }
}
