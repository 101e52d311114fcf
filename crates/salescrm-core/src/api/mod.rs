//! REST client for the sales CRM backend.
//!
//! Every path lives under `/api`. Authenticated calls take a
//! `RequestContext` carrying the bearer token for that one request.

pub mod client;
pub mod context;
pub mod error;

pub use client::ApiClient;
pub use context::{AuthToken, RequestContext};
pub use error::{user_message, ApiError, Reply};
pub use reqwest::StatusCode;
