//! HTTP API handlers for aiwd-api

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod health;
pub mod text_tools;

pub use admin::admin_routes;
pub use analysis::analysis_routes;
pub use auth::auth_middleware;
pub use health::health_routes;
pub use text_tools::text_tool_routes;
