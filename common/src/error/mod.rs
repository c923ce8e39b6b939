pub mod auth_blob_error;
pub mod error_location;
