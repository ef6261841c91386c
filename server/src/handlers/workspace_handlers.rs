use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;

use crate::{
    auth::authenticate,
    error::AppError,
    state::AppState,
    types::{CreateWorkspaceRequest, MemberResponse, MemberWithUserResponse, WorkspaceResponse},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWorkspaceResponse {
    pub workspace: WorkspaceResponse,
    pub member: MemberResponse,
}

pub async fn create_workspace_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<CreatedWorkspaceResponse>), AppError> {
    let user = authenticate(&state, &headers).await?;

    let (workspace, member) = state
        .workspace_service
        .create(user.id.as_str(), payload.name.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedWorkspaceResponse {
            workspace: workspace.into(),
            member: member.into(),
        }),
    ))
}

pub async fn list_workspaces_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<WorkspaceResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;

    let workspaces = state.workspace_service.list_for_user(user.id.as_str()).await?;
    Ok(Json(workspaces.into_iter().map(Into::into).collect()))
}

pub async fn get_workspace_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<Json<WorkspaceResponse>, AppError> {
    let user = authenticate(&state, &headers).await?;

    state
        .workspace_service
        .require_member(&workspace_id, user.id.as_str())
        .await?;
    let workspace = state.workspace_service.fetch_workspace(&workspace_id).await?;
    Ok(Json(workspace.into()))
}

pub async fn delete_workspace_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = authenticate(&state, &headers).await?;

    state
        .workspace_service
        .delete(&workspace_id, user.id.as_str())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_workspace_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<(StatusCode, Json<MemberResponse>), AppError> {
    let user = authenticate(&state, &headers).await?;

    let member = state
        .workspace_service
        .join(&workspace_id, user.id.as_str())
        .await?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

pub async fn list_members_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<MemberWithUserResponse>>, AppError> {
    let user = authenticate(&state, &headers).await?;

    let members = state
        .workspace_service
        .list_members(&workspace_id, user.id.as_str())
        .await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((workspace_id, target_user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user = authenticate(&state, &headers).await?;

    state
        .workspace_service
        .remove_member(&workspace_id, user.id.as_str(), &target_user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
