use std::fmt;

/// Opaque bearer token issued by `/auth/login`.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<{} bytes>)", self.0.len())
    }
}

/// Credentials for a single request. Every authenticated call on
/// `ApiClient` takes one of these; the client itself holds no token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    token: AuthToken,
}

impl RequestContext {
    pub fn new(token: AuthToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AuthToken::new("eyJhbGciOiJIUzI1NiJ9.secret");
        let rendered = format!("{:?}", RequestContext::new(token.clone()));
        assert!(!rendered.contains("secret"));
        assert_eq!(token.as_str(), "eyJhbGciOiJIUzI1NiJ9.secret");
    }
}
