//! Core library for the sales CRM client.
//!
//! Holds everything that is not terminal UI: the REST client, the session
//! state machine, token persistence, role routing, the panel read/write
//! contract and the display rules shared by the dashboards.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod panel;
pub mod router;
pub mod rules;
pub mod utils;

pub use api::{user_message, ApiClient, ApiError, AuthToken, RequestContext};
pub use auth::{SessionState, SessionStore, TokenStore};
pub use config::Config;
pub use router::{select_view, ViewKind};
