//! Display-only business rules.
//!
//! The server is the authority for every one of these; the client uses them
//! to label options, draw progress bars and disable actions that would be
//! rejected anyway.

use crate::models::Prize;

/// Sale tiers an agent can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleAmount {
    Small,
    Medium,
    Large,
}

/// Coins and deposits credited for an approved sale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleReward {
    pub coins: f64,
    pub deposits: f64,
}

impl SaleAmount {
    pub const ALL: [SaleAmount; 3] = [SaleAmount::Small, SaleAmount::Medium, SaleAmount::Large];

    pub fn dollars(&self) -> u32 {
        match self {
            SaleAmount::Small => 100,
            SaleAmount::Medium => 250,
            SaleAmount::Large => 500,
        }
    }

    /// Value sent as `sale_amount`.
    pub fn wire_value(&self) -> &'static str {
        match self {
            SaleAmount::Small => "100",
            SaleAmount::Medium => "250",
            SaleAmount::Large => "500",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "100" => Some(SaleAmount::Small),
            "250" => Some(SaleAmount::Medium),
            "500" => Some(SaleAmount::Large),
            _ => None,
        }
    }

    pub fn reward(&self) -> SaleReward {
        match self {
            SaleAmount::Small => SaleReward { coins: 0.5, deposits: 1.0 },
            SaleAmount::Medium => SaleReward { coins: 1.0, deposits: 1.5 },
            SaleAmount::Large => SaleReward { coins: 3.0, deposits: 3.0 },
        }
    }

    /// Option label, e.g. "$250 (1 coin, 1.5 deposits)".
    pub fn label(&self) -> String {
        let reward = self.reward();
        format!(
            "${} ({} {}, {} {})",
            self.dollars(),
            format_amount(reward.coins),
            if reward.coins == 1.0 { "coin" } else { "coins" },
            format_amount(reward.deposits),
            if reward.deposits == 1.0 { "deposit" } else { "deposits" },
        )
    }
}

/// Render a number without a trailing ".0" for whole values.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Monthly target progress, as the backend computes it: percent of target
/// reached, rounded to two decimals; zero when no target is set.
pub fn achievement_percentage(deposits: f64, target_monthly: f64) -> f64 {
    if target_monthly > 0.0 {
        (deposits / target_monthly * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    }
}

/// Colour band of the target progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    Complete,
    Near,
    Behind,
}

pub fn progress_band(percentage: f64) -> ProgressBand {
    if percentage >= 100.0 {
        ProgressBand::Complete
    } else if percentage >= 75.0 {
        ProgressBand::Near
    } else {
        ProgressBand::Behind
    }
}

/// Fraction of the progress bar to fill, capped at a full bar.
pub fn progress_ratio(percentage: f64) -> f64 {
    (percentage / 100.0).clamp(0.0, 1.0)
}

/// Whether the shop should offer the redeem action for a prize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemEligibility {
    Redeemable,
    InsufficientCoins,
    OutOfStock,
}

impl RedeemEligibility {
    pub fn label(&self) -> &'static str {
        match self {
            RedeemEligibility::Redeemable => "Redeem",
            RedeemEligibility::InsufficientCoins => "Insufficient Coins",
            RedeemEligibility::OutOfStock => "Out of Stock",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, RedeemEligibility::Redeemable)
    }
}

/// Balance is checked before stock, so a prize that is both too expensive
/// and sold out reads "Insufficient Coins".
pub fn redeem_eligibility(coins: f64, prize: &Prize) -> RedeemEligibility {
    if coins < prize.coin_cost {
        RedeemEligibility::InsufficientCoins
    } else if prize.is_out_of_stock() {
        RedeemEligibility::OutOfStock
    } else {
        RedeemEligibility::Redeemable
    }
}
