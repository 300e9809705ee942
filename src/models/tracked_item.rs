use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::generate_id;

/// One subscriber's interest in one product's price.
///
/// `alert_sent` is monotonic: false at creation, true exactly once when
/// a drop notification has been confirmed dispatched. A record with
/// `alert_sent = true` is terminal and never enters another scan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub id: String,
    pub url: String,
    pub email: String,
    /// Last known price, currency-agnostic unit.
    pub price: f64,
    pub alert_sent: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrackedItem {
    pub url: String,
    pub email: String,
    pub price: f64,
}

/// Partial update applied by the orchestrator. Only the fields set here
/// are written; `update_by_id` performs them as a single statement.
#[derive(Debug, Clone, Default)]
pub struct TrackedItemUpdate {
    pub price: Option<f64>,
    pub alert_sent: Option<bool>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl TrackedItem {
    pub fn new(new_item: NewTrackedItem) -> Self {
        Self {
            id: generate_id(),
            url: new_item.url,
            email: new_item.email,
            price: new_item.price,
            alert_sent: false,
            last_checked: None,
            created_at: Utc::now(),
        }
    }
}

impl TrackedItemUpdate {
    /// Update written after a confirmed drop notification: new price,
    /// terminal alert flag and check timestamp in one statement.
    pub fn alerted(new_price: f64, now: DateTime<Utc>) -> Self {
        Self {
            price: Some(new_price),
            alert_sent: Some(true),
            last_checked: Some(now),
        }
    }

    /// Update written when the price did not drop.
    pub fn checked(now: DateTime<Utc>) -> Self {
        Self {
            price: None,
            alert_sent: None,
            last_checked: Some(now),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.alert_sent.is_none() && self.last_checked.is_none()
    }
}
