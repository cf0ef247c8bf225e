//! Lucky wheel models

use crate::{CommissionGrant, Currency};
use serde::{Deserialize, Serialize};

/// One slice of the wheel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelPrize {
    pub currency: Currency,
    pub amount: i64,
    /// Relative likelihood; zero-weight slices never land
    pub weight: u32,
}

/// Spin price and prize table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelConfig {
    /// Tickets debited per spin
    pub spin_cost: i64,
    pub prizes: Vec<WheelPrize>,
}

impl WheelConfig {
    pub fn is_valid(&self) -> bool {
        self.spin_cost > 0
            && self.prizes.iter().all(|p| p.amount > 0)
            && self.prizes.iter().any(|p| p.weight > 0)
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        let prize = |currency, amount, weight| WheelPrize {
            currency,
            amount,
            weight,
        };
        Self {
            spin_cost: 1,
            prizes: vec![
                prize(Currency::Tickets, 5, 40),
                prize(Currency::Tickets, 10, 25),
                prize(Currency::Tickets, 25, 10),
                prize(Currency::Points, 50, 15),
                prize(Currency::Points, 100, 7),
                prize(Currency::Tickets, 100, 3),
            ],
        }
    }
}

/// Result of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    pub prize: WheelPrize,
    /// Balance of the prize currency after the credit
    pub balance: i64,
    /// Commission paid to the spinner's referrer, if any
    pub commission: Option<CommissionGrant>,
}
