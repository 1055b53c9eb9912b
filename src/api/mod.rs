//! The public facade and its result codes.

mod client;
pub mod error;

pub use client::{ATTR_PREVIEW, ATTR_THUMBNAIL, Collaborators, MegaApi, UploadOptions};
pub use error::{ApiError, ErrorCode};
