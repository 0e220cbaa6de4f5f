use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;

/// Pure calendar queries for the reference exchange (NYSE). All methods take
/// `now` explicitly; nothing here reads the wall clock.
#[derive(Clone)]
pub struct MarketClock {
    open: NaiveTime,
    close: NaiveTime,
    holidays: Arc<HashSet<NaiveDate>>,
}

impl MarketClock {
    /// NYSE regular session, 09:30–16:00 America/New_York. Half-days trade
    /// as full days here.
    pub fn nyse() -> Self {
        MarketClock {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            holidays: Arc::new(nyse_holidays()),
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&New_York);
        if !self.is_trading_day(local.date_naive()) {
            return false;
        }
        let t = local.time();
        self.open <= t && t < self.close
    }

    /// Delay until the next session open. Strictly positive whenever the
    /// market is closed; callers must not invoke this while it is open.
    pub fn duration_until_open(&self, now: DateTime<Utc>) -> Duration {
        let local = now.with_timezone(&New_York);
        let mut day = local.date_naive();

        // today only counts if the bell has not rung yet
        if !self.is_trading_day(day) || local.time() >= self.open {
            day = next_day(day);
        }

        loop {
            if self.is_trading_day(day) {
                if let Some(instant) = self.open_instant(day) {
                    let wait = instant - now;
                    if wait > Duration::zero() {
                        return wait;
                    }
                }
            }
            day = next_day(day);
        }
    }

    fn is_trading_day(&self, day: NaiveDate) -> bool {
        match day.weekday() {
            Weekday::Sat | Weekday::Sun => false,
            _ => !self.holidays.contains(&day),
        }
    }

    fn open_instant(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        // 09:30 never falls inside a DST transition gap
        New_York
            .from_local_datetime(&day.and_time(self.open))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }
}

fn next_day(d: NaiveDate) -> NaiveDate {
    d.succ_opt().unwrap_or(NaiveDate::MAX)
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap_or_default()
}

/// Full-session NYSE closures for the covered years (observed dates).
fn nyse_holidays() -> HashSet<NaiveDate> {
    [
        // 2024
        d(2024, 1, 1),
        d(2024, 1, 15),
        d(2024, 2, 19),
        d(2024, 3, 29),
        d(2024, 5, 27),
        d(2024, 6, 19),
        d(2024, 7, 4),
        d(2024, 9, 2),
        d(2024, 11, 28),
        d(2024, 12, 25),
        // 2025
        d(2025, 1, 1),
        d(2025, 1, 20),
        d(2025, 2, 17),
        d(2025, 4, 18),
        d(2025, 5, 26),
        d(2025, 6, 19),
        d(2025, 7, 4),
        d(2025, 9, 1),
        d(2025, 11, 27),
        d(2025, 12, 25),
        // 2026
        d(2026, 1, 1),
        d(2026, 1, 19),
        d(2026, 2, 16),
        d(2026, 4, 3),
        d(2026, 5, 25),
        d(2026, 6, 19),
        d(2026, 7, 3),
        d(2026, 9, 7),
        d(2026, 11, 26),
        d(2026, 12, 25),
        // 2027
        d(2027, 1, 1),
        d(2027, 1, 18),
        d(2027, 2, 15),
        d(2027, 3, 26),
        d(2027, 5, 31),
        d(2027, 6, 18),
        d(2027, 7, 5),
        d(2027, 9, 6),
        d(2027, 11, 25),
        d(2027, 12, 24),
    ]
    .into_iter()
    .collect()
}
