use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A prize in the shop catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub coin_cost: f64,
    #[serde(default)]
    pub is_limited: bool,
    #[serde(default)]
    pub quantity_available: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

fn default_active() -> bool {
    true
}

impl Prize {
    /// True when the prize is limited and nothing is left.
    pub fn is_out_of_stock(&self) -> bool {
        self.is_limited && self.quantity_available.unwrap_or(0) <= 0
    }

    /// "Limited: N left" / "Unlimited" line for the catalog.
    pub fn stock_display(&self) -> String {
        if self.is_limited {
            format!("Limited: {} left", self.quantity_available.unwrap_or(0))
        } else {
            "Unlimited".to_string()
        }
    }
}

/// Payload for creating or editing a prize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrizeDraft {
    pub name: String,
    pub description: String,
    pub coin_cost: f64,
    pub is_limited: bool,
    pub quantity_available: Option<i64>,
}

impl Default for PrizeDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            coin_cost: 0.0,
            is_limited: false,
            quantity_available: None,
        }
    }
}

impl From<&Prize> for PrizeDraft {
    fn from(prize: &Prize) -> Self {
        Self {
            name: prize.name.clone(),
            description: prize.description.clone(),
            coin_cost: prize.coin_cost,
            is_limited: prize.is_limited,
            quantity_available: prize.quantity_available,
        }
    }
}

/// Lifecycle of a redeemed prize in an agent's reward bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RewardStatus {
    Unused,
    PendingUse,
    Used,
    Other(String),
}

impl RewardStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RewardStatus::Unused => "unused",
            RewardStatus::PendingUse => "pending_use",
            RewardStatus::Used => "used",
            RewardStatus::Other(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RewardStatus::Unused => "Ready to Use",
            RewardStatus::PendingUse => "Pending Admin Approval",
            RewardStatus::Used | RewardStatus::Other(_) => "Used",
        }
    }

    /// Only unused rewards can be submitted for admin approval.
    pub fn can_request_use(&self) -> bool {
        matches!(self, RewardStatus::Unused)
    }
}

impl From<String> for RewardStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "unused" => RewardStatus::Unused,
            "pending_use" => RewardStatus::PendingUse,
            "used" => RewardStatus::Used,
            _ => RewardStatus::Other(raw),
        }
    }
}

impl From<RewardStatus> for String {
    fn from(status: RewardStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A redeemed prize, either in the agent's bag or in the admin's
/// pending-use queue (where `agent_name` is filled in).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBagItem {
    pub id: String,
    pub agent_id: String,
    pub prize_id: String,
    pub prize_name: String,
    pub status: RewardStatus,
    #[serde(default)]
    pub redeemed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub used_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
}
