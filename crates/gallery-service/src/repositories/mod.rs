//! Repository layer for the gallery service.
//!
//! Repositories own the document layout of each table and talk to the
//! store through the `DocumentStore` trait.

pub mod groups;
pub mod images;

pub use groups::{groups_table, GroupsRepository};
pub use images::{images_table, ImagesRepository};
