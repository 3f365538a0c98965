//! External service clients.

pub mod object_store;

pub use object_store::{AwsCredentials, ObjectStore, ObjectStoreError, S3ObjectStore};
