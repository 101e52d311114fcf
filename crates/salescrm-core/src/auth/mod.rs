//! Authentication: the session state machine and token persistence.
//!
//! - `SessionStore`: resolves a persisted token at startup, logs in and out
//! - `TokenStore`: pluggable storage for the bearer token (file, keychain, memory)

pub mod session;
pub mod store;

pub use session::{AuthBackend, LoginError, SessionState, SessionStore, LOGIN_FAILED};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
