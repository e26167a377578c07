use chrono::NaiveDate;
use domain::{ClientId, Money};
use serde::{Deserialize, Serialize};

/// Count and summed amount of a set of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub order_count: u64,
    #[serde(rename = "total_amount_cents")]
    pub total_amount: Money,
}

/// Orders created on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyOrderStats {
    pub date: NaiveDate,
    pub order_count: u64,
    #[serde(rename = "total_amount_cents")]
    pub total_amount: Money,
}

/// A customer ranked by number of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOrderCount {
    pub client_id: ClientId,
    pub order_count: u64,
    #[serde(rename = "total_amount_cents")]
    pub total_amount: Money,
}
