//! Picks the top-level view from the session state.

use crate::models::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Loading,
    Login,
    SuperAdmin,
    Admin,
    Agent,
    /// Authenticated, but with a role this client has no dashboard for.
    UnknownRole,
}

/// Loading wins over everything so that no role-specific view is shown
/// before the startup token check has settled.
pub fn select_view(identity: Option<&Identity>, loading: bool) -> ViewKind {
    if loading {
        return ViewKind::Loading;
    }
    match identity.map(|i| &i.role) {
        None => ViewKind::Login,
        Some(Role::SuperAdmin) => ViewKind::SuperAdmin,
        Some(Role::Admin) => ViewKind::Admin,
        Some(Role::Agent) => ViewKind::Agent,
        Some(Role::Unknown(_)) => ViewKind::UnknownRole,
    }
}

impl ViewKind {
    /// True for the three role dashboards.
    pub fn is_dashboard(&self) -> bool {
        matches!(self, ViewKind::SuperAdmin | ViewKind::Admin | ViewKind::Agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            id: "1".into(),
            username: "user".into(),
            role: Role::from(role),
            name: None,
            coins: None,
            deposits: None,
            target_monthly: None,
        }
    }

    #[test]
    fn test_loading_wins() {
        assert_eq!(select_view(None, true), ViewKind::Loading);
        assert_eq!(select_view(Some(&identity("admin")), true), ViewKind::Loading);
    }

    #[test]
    fn test_no_identity_shows_login() {
        assert_eq!(select_view(None, false), ViewKind::Login);
    }

    #[test]
    fn test_role_dispatch() {
        assert_eq!(select_view(Some(&identity("super_admin")), false), ViewKind::SuperAdmin);
        assert_eq!(select_view(Some(&identity("admin")), false), ViewKind::Admin);
        assert_eq!(select_view(Some(&identity("agent")), false), ViewKind::Agent);
    }

    #[test]
    fn test_unrecognized_role_falls_back() {
        let view = select_view(Some(&identity("ghost")), false);
        assert_eq!(view, ViewKind::UnknownRole);
        assert!(!view.is_dashboard());
    }
}
