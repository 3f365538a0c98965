//! Image handlers.
//!
//! - `POST /groups/{groupId}/images` - register an image and hand out an upload URL
//! - `GET /groups/{groupId}/images` - list a group's images, newest first
//! - `GET /images/{imageId}` - fetch one image record

use crate::errors::ApiError;
use crate::middleware::Principal;
use crate::handlers::groups::INVALID_BODY;
use crate::models::{parse_attributes, ItemsResponse, NewImageResponse};
use crate::repositories::{GroupsRepository, ImagesRepository};
use crate::routes::AppState;
use crate::store::Item;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const GROUP_NOT_FOUND: &str = "Group does not exist";
const IMAGE_NOT_FOUND: &str = "Image does not exist";

async fn ensure_group_exists(state: &AppState, group_id: &str) -> Result<(), ApiError> {
    let groups = GroupsRepository::new(state.store.as_ref(), &state.groups_table);
    if groups.exists(group_id).await? {
        Ok(())
    } else {
        tracing::debug!(target: "gallery.handlers.images", group_id = %group_id, "Group not found");
        Err(ApiError::NotFound(GROUP_NOT_FOUND.to_string()))
    }
}

fn images_repo(state: &AppState) -> ImagesRepository<'_> {
    ImagesRepository::new(
        state.store.as_ref(),
        &state.images_table,
        &state.config.image_id_index,
    )
}

/// Handler for POST /groups/{groupId}/images
///
/// Returns 201 with `{ "newItem": Image, "uploadUrl": string }`, or 404 if
/// the group does not exist.
#[instrument(skip_all, name = "gallery.handlers.create_image", fields(group_id = %group_id))]
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<(StatusCode, Json<NewImageResponse>), ApiError> {
    ensure_group_exists(&state, &group_id).await?;

    let attributes =
        parse_attributes(&body).ok_or_else(|| ApiError::BadRequest(INVALID_BODY.to_string()))?;

    let image_id = Uuid::new_v4().to_string();
    let upload_url = state.object_store.upload_url(&image_id).map_err(|e| {
        tracing::error!(target: "gallery.handlers.images", error = %e, "Failed to presign upload URL");
        ApiError::Internal
    })?;
    let image_url = state.object_store.object_url(&image_id);

    let image = images_repo(&state)
        .create(&group_id, &image_id, image_url, attributes)
        .await?;

    tracing::info!(
        target: "gallery.handlers.images",
        group_id = %group_id,
        image_id = %image_id,
        principal = ?principal,
        "Image created"
    );

    Ok((
        StatusCode::CREATED,
        Json(NewImageResponse {
            new_item: image,
            upload_url,
        }),
    ))
}

/// Handler for GET /groups/{groupId}/images
///
/// Returns 200 with `{ "items": Image[] }` newest first, or 404 if the
/// group does not exist.
#[instrument(skip_all, name = "gallery.handlers.list_group_images", fields(group_id = %group_id))]
pub async fn list_group_images(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<ItemsResponse>, ApiError> {
    ensure_group_exists(&state, &group_id).await?;

    let items = images_repo(&state).list_for_group(&group_id).await?;

    Ok(Json(ItemsResponse { items }))
}

/// Handler for GET /images/{imageId}
///
/// Returns 200 with the image record, or 404 if it does not exist.
#[instrument(skip_all, name = "gallery.handlers.get_image", fields(image_id = %image_id))]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    images_repo(&state)
        .find_by_id(&image_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(IMAGE_NOT_FOUND.to_string()))
}
