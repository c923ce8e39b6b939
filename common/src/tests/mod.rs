mod auth_blob;
mod error_location;
mod result_code;
