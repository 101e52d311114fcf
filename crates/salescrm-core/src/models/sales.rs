use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A pending sale awaiting approval. The admin panel calls these
/// "sale requests"; the super-admin panel lists the same records as
/// "coin requests".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub id: String,
    pub agent_id: String,
    pub sale_amount: String,
    pub coins_requested: f64,
    pub deposits_requested: f64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub agent_username: Option<String>,
}

fn default_status() -> String {
    "pending".to_string()
}

impl SaleRequest {
    /// Who submitted the request: display name, then username, then raw id.
    pub fn agent_label(&self) -> &str {
        self.agent_name
            .as_deref()
            .or(self.agent_username.as_deref())
            .unwrap_or(&self.agent_id)
    }
}

/// Agent's own statistics block from `/agent/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coins: f64,
    #[serde(default)]
    pub deposits: f64,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub target_monthly: f64,
    #[serde(default)]
    pub achievement_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDashboard {
    pub agent_info: AgentInfo,
    #[serde(default)]
    pub pending_requests: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    #[serde(default)]
    pub deposits: f64,
    #[serde(default)]
    pub coins_redeemed: f64,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub is_current_user: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sale_request_with_agent_info() {
        let json = r#"{"id":"s1","agent_id":"a1","sale_amount":"250","coins_requested":1.0,
            "deposits_requested":1.5,"status":"pending","created_at":"2024-06-01T09:30:00.5",
            "agent_name":"Jane","agent_username":"jane"}"#;
        let request: SaleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.sale_amount, "250");
        assert_eq!(request.agent_label(), "Jane");
    }

    #[test]
    fn test_agent_label_fallbacks() {
        let json = r#"{"id":"s1","agent_id":"a1","sale_amount":"100","coins_requested":0.5,
            "deposits_requested":1}"#;
        let mut request: SaleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status, "pending");
        assert_eq!(request.agent_label(), "a1");
        request.agent_username = Some("jane".into());
        assert_eq!(request.agent_label(), "jane");
    }

    #[test]
    fn test_parse_dashboard() {
        let json = r#"{"agent_info":{"name":"Jane","coins":3,"deposits":7.5,"total_sales":1350,
            "target_monthly":10,"achievement_percentage":75.0},"pending_requests":2}"#;
        let dashboard: AgentDashboard = serde_json::from_str(json).unwrap();
        assert_eq!(dashboard.agent_info.coins, 3.0);
        assert_eq!(dashboard.pending_requests, 2);
    }

    #[test]
    fn test_parse_leaderboard() {
        let json = r#"[{"name":"Jane","deposits":7.5,"coins_redeemed":5,"total_sales":1350,
            "is_current_user":true,"rank":1}]"#;
        let board: Vec<LeaderboardEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(board[0].rank, 1);
        assert!(board[0].is_current_user);
    }
}
