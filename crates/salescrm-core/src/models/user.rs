use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Account role as sent by the backend.
///
/// The wire value is a plain string. Anything the client does not recognize
/// is kept verbatim in `Unknown` so routing can fall back instead of failing
/// to parse the whole identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    Admin,
    Agent,
    Unknown(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Unknown(raw) => raw.as_str(),
        }
    }

    /// Human-readable label for headers and status lines.
    pub fn display_name(&self) -> &str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Agent => "Agent",
            Role::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "super_admin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "agent" => Role::Agent,
            _ => Role::Unknown(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logged-in user as returned by `/auth/login` and `/auth/me`.
///
/// `coins` and `deposits` are only populated for agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coins: Option<f64>,
    #[serde(default)]
    pub deposits: Option<f64>,
    #[serde(default)]
    pub target_monthly: Option<f64>,
}

impl Identity {
    /// Name shown in the header, falling back to the username when the
    /// account has no display name.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }

    pub fn coin_balance(&self) -> f64 {
        self.coins.unwrap_or(0.0)
    }
}

/// An admin or agent account as listed in the management panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub target_monthly: Option<f64>,
    #[serde(default)]
    pub coins: Option<f64>,
    #[serde(default)]
    pub deposits: Option<f64>,
    #[serde(default)]
    pub total_sales: Option<f64>,
    #[serde(default)]
    pub has_password: Option<bool>,
}

fn default_active() -> bool {
    true
}

impl UserAccount {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Payload for creating an admin or agent account.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Payload for `PUT /super-admin/users/{id}/credentials`.
///
/// Blank username/password are left unchanged by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CredentialsUpdate {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_wire() {
        assert_eq!(Role::from("super_admin"), Role::SuperAdmin);
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("agent"), Role::Agent);
        assert_eq!(Role::from("ghost"), Role::Unknown("ghost".to_string()));
        assert_eq!(Role::from("Agent"), Role::Unknown("Agent".to_string()));
    }

    #[test]
    fn test_role_serializes_as_wire_string() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
        let json = serde_json::to_string(&Role::Unknown("ghost".into())).unwrap();
        assert_eq!(json, "\"ghost\"");
    }

    #[test]
    fn test_identity_parses_me_response_for_admin() {
        let json = r#"{"id":"a1","username":"boss","role":"admin","name":"","coins":null,"deposits":null}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.coins, None);
        assert_eq!(identity.display_name(), "boss");
    }

    #[test]
    fn test_identity_parses_unknown_role() {
        let json = r#"{"id":"x","username":"who","role":"ghost"}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.role, Role::Unknown("ghost".to_string()));
        assert_eq!(identity.coin_balance(), 0.0);
    }

    #[test]
    fn test_user_account_parses_listing() {
        let json = r#"{
            "_id": "665f0c",
            "id": "u-1",
            "username": "jane",
            "role": "agent",
            "name": "Jane Doe",
            "created_at": "2024-05-01T12:00:00.123456",
            "created_by": "sa-1",
            "coins": 3.5,
            "deposits": 4.0,
            "total_sales": 850.0,
            "target_monthly": 10.0,
            "has_password": true
        }"#;
        let account: UserAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.role, Role::Agent);
        assert!(account.is_active);
        assert_eq!(account.display_name(), "Jane Doe");
        assert!(account.created_at.is_some());
        assert_eq!(account.has_password, Some(true));
    }
}
