pub mod client;
pub mod error;
pub mod models;

// Re-export main client types for convenience
pub use client::{BlobReader, Session, DEFAULT_SERVICE, DEFAULT_TOKEN_ENDPOINT};
pub use error::{Error, Result};
pub use models::{AuthResponse, FsLayer, Manifest};
