use chrono::{Datelike, NaiveDate, Weekday};

/// Business days (Mon–Fri, no holiday adjustment) strictly after `a` up to
/// and including `b`. Zero when `b <= a`.
pub fn trading_days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    if b <= a {
        return 0;
    }

    let mut count = 0;
    let mut day = a;
    while day < b {
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
    }
    count
}

/// Affine extrapolation through `(date1, price1)` and `(date2, price2)` with
/// trading-day count as the x-axis, so weekends do not distort the slope.
/// A zero-trading-day span degrades to `price2` instead of dividing by zero.
pub fn project(
    date1: NaiveDate,
    price1: f64,
    date2: NaiveDate,
    price2: f64,
    target: NaiveDate,
) -> f64 {
    let span = trading_days_between(date1, date2);
    if span == 0 {
        return price2;
    }

    let slope = (price2 - price1) / span as f64;
    price1 + slope * trading_days_between(date1, target) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn counts_skip_weekends() {
        // Mon 2026-08-03 .. Mon 2026-08-10: Tue-Fri + Mon
        assert_eq!(trading_days_between(day(2026, 8, 3), day(2026, 8, 10)), 5);
        // Fri .. Mon spans only the Monday
        assert_eq!(trading_days_between(day(2026, 8, 7), day(2026, 8, 10)), 1);
    }

    #[test]
    fn zero_span_for_same_or_reversed_dates() {
        assert_eq!(trading_days_between(day(2026, 8, 3), day(2026, 8, 3)), 0);
        assert_eq!(trading_days_between(day(2026, 8, 10), day(2026, 8, 3)), 0);
    }

    #[test]
    fn projection_is_exact_at_the_second_anchor() {
        let (d1, d2) = (day(2026, 6, 1), day(2026, 7, 15));
        let p = project(d1, 100.0, d2, 132.0, d2);
        assert_eq!(p, 132.0);
    }

    #[test]
    fn degenerate_anchors_project_to_price2_everywhere() {
        let d1 = day(2026, 6, 1);
        assert_eq!(project(d1, 100.0, d1, 115.0, day(2026, 9, 30)), 115.0);
        assert_eq!(project(d1, 100.0, d1, 115.0, day(2026, 1, 2)), 115.0);
    }

    #[test]
    fn extrapolates_past_the_second_anchor() {
        // one trading day per step: Mon..Fri
        let d1 = day(2026, 8, 3);
        let d2 = day(2026, 8, 7); // span 4, slope 1.0
        let p = project(d1, 10.0, d2, 14.0, day(2026, 8, 12)); // +3 more
        assert!((p - 17.0).abs() < 1e-9);
    }
}
