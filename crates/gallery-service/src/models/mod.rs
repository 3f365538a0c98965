//! Gallery service models.
//!
//! Groups and images are schemaless documents: clients choose their
//! attributes and the service adds its own identifiers on top.

use crate::store::Item;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute holding a group's ID.
pub const GROUP_ID: &str = "id";

/// Attribute linking an image to its group.
pub const IMAGE_GROUP_ID: &str = "groupId";

/// Attribute holding an image's ID.
pub const IMAGE_ID: &str = "imageId";

/// Attribute holding an image's creation time (RFC 3339).
pub const IMAGE_TIMESTAMP: &str = "timestamp";

/// Attribute holding an image's public URL.
pub const IMAGE_URL: &str = "imageUrl";

/// Parse a request body into client attributes.
///
/// Returns `None` unless the body is a JSON object.
pub fn parse_attributes(body: &[u8]) -> Option<Item> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(attributes)) => Some(attributes),
        _ => None,
    }
}

/// Health check response.
///
/// Returned by the `/v1/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status.
    pub status: String,
}

/// Listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
}

/// Response to a group creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemResponse {
    pub new_item: Item,
}

/// Response to an image creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImageResponse {
    pub new_item: Item,

    /// Pre-signed URL the client uploads the image bytes to.
    pub upload_url: String,
}
