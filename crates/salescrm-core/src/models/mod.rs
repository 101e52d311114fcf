//! Data models for CRM entities.
//!
//! This module contains the wire records exchanged with the backend:
//!
//! - `Identity`, `Role`, `UserAccount`: accounts and the logged-in user
//! - `Prize`, `RewardBagItem`, `RewardStatus`: the prize shop and reward bag
//! - `SaleRequest`, `AgentDashboard`, `LeaderboardEntry`: sales and standings
//! - `ActionResponse`, `LoginResponse`: write acknowledgements

pub mod sales;
pub mod shop;
pub mod user;

use serde::{Deserialize, Serialize};

pub use sales::{AgentDashboard, AgentInfo, LeaderboardEntry, SaleRequest};
pub use shop::{Prize, PrizeDraft, RewardBagItem, RewardStatus};
pub use user::{CredentialsUpdate, Identity, NewUser, Role, UserAccount};

/// Response to `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: Identity,
}

/// Acknowledgement returned by every write endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "admin_id", alias = "agent_id", alias = "prize_id")]
    pub created_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"access_token":"eyJ.abc","token_type":"bearer",
            "user":{"id":"sa","username":"tharme.ritta","role":"super_admin","name":"Super Administrator"}}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "eyJ.abc");
        assert_eq!(resp.user.role, Role::SuperAdmin);
    }

    #[test]
    fn test_action_response_created_id_aliases() {
        let resp: ActionResponse =
            serde_json::from_str(r#"{"message":"Prize created successfully","prize_id":"p9"}"#)
                .unwrap();
        assert_eq!(resp.created_id.as_deref(), Some("p9"));

        let resp: ActionResponse =
            serde_json::from_str(r#"{"message":"Sale request approved successfully"}"#).unwrap();
        assert_eq!(resp.created_id, None);
    }
}
