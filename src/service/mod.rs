//! Service layer for the briscola-lobby queue service
//!
//! This module contains the async queue facade, the HTTP surface, and the
//! application state that wires them together for the production binary.

pub mod app;
pub mod http;
pub mod lobby;

pub use app::{AppState, ServiceError};
pub use http::{create_router, ApiError, HttpServer, HttpServerConfig, HttpState};
pub use lobby::QueueService;
