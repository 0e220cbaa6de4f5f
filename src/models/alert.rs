use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }

    pub fn parse(s: &str) -> Option<Direction> {
        match s {
            "above" => Some(Direction::Above),
            "below" => Some(Direction::Below),
            _ => None,
        }
    }

    /// True when `price` sits on the triggering side of `reference`.
    pub fn crossed(&self, price: f64, reference: f64) -> bool {
        match self {
            Direction::Above => price > reference,
            Direction::Below => price < reference,
        }
    }
}

/// One variant per alert kind; each carries only the fields that kind needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertCondition {
    Price {
        target_price: f64,
        direction: Direction,
    },
    Sma {
        period: u32,
        direction: Direction,
    },
    CustomLine {
        date1: NaiveDate,
        price1: f64,
        date2: NaiveDate,
        price2: f64,
        threshold: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "_id")]
    pub id: i64,

    pub user_id: i64,
    pub ticker: String,
    pub condition: AlertCondition,

    pub created_at: i64,
}

impl Alert {
    /// One-line summary used by list views and log output.
    pub fn describe(&self) -> String {
        match &self.condition {
            AlertCondition::Price {
                target_price,
                direction,
            } => format!("{}: {} {:.2}", self.ticker, direction.as_str(), target_price),
            AlertCondition::Sma { period, direction } => {
                format!("{}: {} SMA({})", self.ticker, direction.as_str(), period)
            }
            AlertCondition::CustomLine {
                date1,
                date2,
                threshold,
                ..
            } => format!(
                "{}: trend line {} to {} (±{})",
                self.ticker, date1, date2, threshold
            ),
        }
    }
}
