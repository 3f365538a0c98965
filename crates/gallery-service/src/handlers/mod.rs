//! HTTP request handlers for the gallery service.

pub mod authorize;
pub mod groups;
pub mod health;
pub mod images;
pub mod metrics;

pub use authorize::authorize;
pub use groups::{create_group, delete_group, list_groups};
pub use health::health_check;
pub use images::{create_image, get_image, list_group_images};
pub use metrics::metrics_handler;
