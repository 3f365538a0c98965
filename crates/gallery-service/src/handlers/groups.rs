//! Group handlers.
//!
//! - `POST /groups` - create a group from the request's attributes
//! - `GET /groups` - list all groups
//! - `DELETE /groups/{groupId}` - delete a group

use crate::errors::ApiError;
use crate::middleware::Principal;
use crate::models::{parse_attributes, ItemsResponse, NewItemResponse};
use crate::repositories::GroupsRepository;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Message for bodies that are not JSON objects.
pub(crate) const INVALID_BODY: &str = "Request body must be a JSON object";

/// Handler for POST /groups
///
/// Returns 201 with `{ "newItem": Group }`.
#[instrument(skip_all, name = "gallery.handlers.create_group")]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<(StatusCode, Json<NewItemResponse>), ApiError> {
    let attributes =
        parse_attributes(&body).ok_or_else(|| ApiError::BadRequest(INVALID_BODY.to_string()))?;

    let repo = GroupsRepository::new(state.store.as_ref(), &state.groups_table);
    let group = repo.create(attributes).await?;

    tracing::info!(
        target: "gallery.handlers.groups",
        group_id = ?group.get("id"),
        principal = ?principal,
        "Group created"
    );

    Ok((StatusCode::CREATED, Json(NewItemResponse { new_item: group })))
}

/// Handler for GET /groups
///
/// Returns 200 with `{ "items": Group[] }`.
#[instrument(skip_all, name = "gallery.handlers.list_groups")]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let repo = GroupsRepository::new(state.store.as_ref(), &state.groups_table);
    let items = repo.list().await?;

    tracing::debug!(target: "gallery.handlers.groups", count = items.len(), "Groups listed");

    Ok(Json(ItemsResponse { items }))
}

/// Handler for DELETE /groups/{groupId}
///
/// Returns 204 whether or not the group existed.
#[instrument(skip_all, name = "gallery.handlers.delete_group", fields(group_id = %group_id))]
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = GroupsRepository::new(state.store.as_ref(), &state.groups_table);
    repo.delete(&group_id).await?;

    tracing::info!(target: "gallery.handlers.groups", group_id = %group_id, "Group deleted");

    Ok(StatusCode::NO_CONTENT)
}
