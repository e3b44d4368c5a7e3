//! HTTP API module.
//!
//! This module provides the upload server, its response types, upload
//! handling and the log stream.

pub mod bundle;
pub mod logs;
pub mod server;
pub mod types;
pub mod upload;

pub use bundle::{zip_bundle, BUNDLE_NAME};
pub use logs::*;
pub use server::{respond, router, start_server, AppState};
pub use types::*;
pub use upload::{csv_name, is_allowed, secure_filename, UploadWorkspace, UploadedFile};
