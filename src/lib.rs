pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod openapi;
pub mod rate_limit; // in-memory rate limiting
pub mod routes;
pub mod search;
pub mod security;
pub mod session;
pub mod thread_state;
pub mod timer;
pub mod validation;
pub mod views;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
pub use session::SESSION_HEADER;
