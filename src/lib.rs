pub mod actions;
pub mod assets; // embedded stylesheet and script
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod openapi;
pub mod pages;
pub mod rate_limit; // in-memory rate limiting
pub mod render;
pub mod repo;
pub mod routes;
pub mod security;
pub mod storage; // filesystem / S3 blobs
pub mod sync;
pub mod telemetry;
pub mod view;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
