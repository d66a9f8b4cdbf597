use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How often a recurring template produces a new expense occurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Date of occurrence `k` (0-based) for a series anchored at `start`.
    ///
    /// Monthly and yearly series keep the start date's day-of-month,
    /// clamped to the target month's last valid day. Occurrence dates are
    /// always derived from the anchor, never by re-stepping an already
    /// clamped date, so a Jan-31 monthly series yields Feb-29 (leap year)
    /// and then Mar-31.
    pub fn add_periods(self, start: NaiveDate, k: u32) -> NaiveDate {
        match self {
            Frequency::Daily => start + Duration::days(k as i64),
            Frequency::Weekly => start + Duration::weeks(k as i64),
            Frequency::Monthly => shift_month(start, k as i32),
            Frequency::Yearly => shift_year(start, k as i32),
        }
    }

    /// First occurrence date `>= cutoff` for a series anchored at `start`,
    /// together with its occurrence index.
    pub fn first_on_or_after(self, start: NaiveDate, cutoff: NaiveDate) -> (u32, NaiveDate) {
        let mut k = 0u32;
        loop {
            let date = self.add_periods(start, k);
            if date >= cutoff {
                return (k, date);
            }
            k += 1;
        }
    }

    /// First occurrence date strictly after `previous`.
    pub fn next_after(self, start: NaiveDate, previous: NaiveDate) -> NaiveDate {
        let mut k = 0u32;
        loop {
            let date = self.add_periods(start, k);
            if date > previous {
                return date;
            }
            k += 1;
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }
}

fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = date.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap_or(date)
}

fn shift_year(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_next) => (first_next - Duration::days(1)).day(),
        None => 28,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_clamps_but_keeps_anchor_day() {
        let start = date(2024, 1, 31);
        assert_eq!(Frequency::Monthly.add_periods(start, 1), date(2024, 2, 29));
        assert_eq!(Frequency::Monthly.add_periods(start, 2), date(2024, 3, 31));
        assert_eq!(Frequency::Monthly.add_periods(start, 13), date(2025, 2, 28));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let start = date(2024, 2, 29);
        assert_eq!(Frequency::Yearly.add_periods(start, 1), date(2025, 2, 28));
        assert_eq!(Frequency::Yearly.add_periods(start, 4), date(2028, 2, 29));
    }

    #[test]
    fn daily_and_weekly_are_plain_arithmetic() {
        let start = date(2025, 1, 1);
        assert_eq!(Frequency::Daily.add_periods(start, 3), date(2025, 1, 4));
        assert_eq!(Frequency::Weekly.add_periods(start, 2), date(2025, 1, 15));
    }

    #[test]
    fn first_on_or_after_fast_forwards() {
        let start = date(2024, 1, 31);
        let (k, due) = Frequency::Monthly.first_on_or_after(start, date(2024, 6, 15));
        assert_eq!((k, due), (6, date(2024, 7, 31)));
        let (k, due) = Frequency::Monthly.first_on_or_after(start, date(2024, 1, 1));
        assert_eq!((k, due), (0, date(2024, 1, 31)));
    }

    #[test]
    fn next_after_never_repeats_a_date() {
        let start = date(2024, 1, 31);
        assert_eq!(
            Frequency::Monthly.next_after(start, date(2024, 2, 29)),
            date(2024, 3, 31)
        );
    }
}
