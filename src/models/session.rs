use chrono::NaiveDate;

use crate::models::{AlertCondition, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Price,
    Sma,
    CustomLine,
}

impl AlertKind {
    pub fn parse(s: &str) -> Option<AlertKind> {
        match s {
            "price" => Some(AlertKind::Price),
            "sma" => Some(AlertKind::Sma),
            "custom_line" => Some(AlertKind::CustomLine),
            _ => None,
        }
    }
}

/// Cursor over the authoring dialogue. Each numeric-entry step self-loops on
/// invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SelectType,
    EnterTicker,
    EnterPeriod,
    EnterPrice,
    EnterDirection,
    EnterDate1,
    ResolvePrice1,
    EnterDate2,
    ResolvePrice2,
    EnterThreshold,
}

/// Fields collected so far. Only the subset relevant to `kind` ever fills in.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub kind: Option<AlertKind>,
    pub ticker: Option<String>,
    pub period: Option<u32>,
    pub target_price: Option<f64>,
    pub direction: Option<Direction>,
    pub date1: Option<NaiveDate>,
    pub price1: Option<f64>,
    pub date2: Option<NaiveDate>,
    pub price2: Option<f64>,
    pub threshold: Option<f64>,
}

impl Draft {
    /// Assembles the finished condition once the terminal step has run.
    /// Returns `None` while required fields are still missing.
    pub fn into_condition(self) -> Option<AlertCondition> {
        match self.kind? {
            AlertKind::Price => Some(AlertCondition::Price {
                target_price: self.target_price?,
                direction: self.direction?,
            }),
            AlertKind::Sma => Some(AlertCondition::Sma {
                period: self.period?,
                direction: self.direction?,
            }),
            AlertKind::CustomLine => Some(AlertCondition::CustomLine {
                date1: self.date1?,
                price1: self.price1?,
                date2: self.date2?,
                price2: self.price2?,
                threshold: self.threshold?,
            }),
        }
    }
}

/// One in-progress authoring dialogue. Ephemeral: lives in the session map
/// until the draft completes or the user cancels.
#[derive(Debug, Clone)]
pub struct Session {
    pub step: Step,
    pub draft: Draft,
}

impl Session {
    pub fn new() -> Self {
        Session {
            step: Step::SelectType,
            draft: Draft::default(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
