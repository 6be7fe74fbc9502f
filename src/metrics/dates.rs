use anyhow::Context;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` unless `month` is 1 through 12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month that `date` falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The number of days in the month.
    pub fn days(&self) -> u32 {
        let first = self.first_day();
        let next = self.next().first_day();
        next.signed_duration_since(first).num_days() as u32
    }

    pub fn first_day(&self) -> NaiveDate {
        // Both fields are range checked on construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// The date with `day` in this month, moved back to the last day of the month when the month
    /// is shorter. Day 0 is treated as day 1.
    pub fn day_clamped(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days());
        self.first_day().with_day(day).unwrap_or_else(|| self.first_day())
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("Expected a month like 2025-03, got '{s}'"))?;
        let year: i32 = year
            .parse()
            .with_context(|| format!("Invalid year in '{s}'"))?;
        let month: u32 = month
            .parse()
            .with_context(|| format!("Invalid month in '{s}'"))?;
        YearMonth::new(year, month)
            .with_context(|| format!("The month in '{s}' must be between 01 and 12"))
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        YearMonth::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Adds `n` months to `date`, clamping the day to the end of the resulting month, e.g. January 31
/// plus one month is February 28 (or 29).
pub fn add_months(date: NaiveDate, n: u32) -> NaiveDate {
    date.checked_add_months(Months::new(n)).unwrap_or(date)
}

/// Days from `today` until the next occurrence of the monthly `due_day`.
///
/// If the day has not yet passed this month the answer is this month's occurrence, including 0
/// when it is today. Otherwise it is next month's. A due day past the end of a month falls on that
/// month's last day.
pub fn days_until_due(due_day: u32, today: NaiveDate) -> i64 {
    let this_month = YearMonth::of(today);
    let mut due = this_month.day_clamped(due_day);
    if due < today {
        due = this_month.next().day_clamped(due_day);
    }
    days_until(due, today)
}

/// The signed number of days from `today` to `date`. Negative means `date` has passed.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::date;

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2025-03".parse().unwrap();
        assert_eq!(ym.to_string(), "2025-03");
        assert_eq!(ym.previous().to_string(), "2025-02");
        assert_eq!(
            YearMonth::new(2024, 12).unwrap().next().to_string(),
            "2025-01"
        );
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("March".parse::<YearMonth>().is_err());
        assert_eq!(
            serde_json::to_string(&ym).unwrap(),
            "\"2025-03\"".to_string()
        );
    }

    #[test]
    fn test_year_month_days() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().days(), 29);
        assert_eq!(YearMonth::new(2025, 2).unwrap().days(), 28);
        assert_eq!(YearMonth::new(2025, 12).unwrap().days(), 31);
        assert_eq!(
            YearMonth::new(2025, 4).unwrap().day_clamped(31),
            date("2025-04-30")
        );
    }

    #[test]
    fn test_days_until_due_same_day_is_zero() {
        assert_eq!(days_until_due(12, date("2025-03-12")), 0);
    }

    #[test]
    fn test_days_until_due_later_this_month() {
        assert_eq!(days_until_due(25, date("2025-03-12")), 13);
    }

    #[test]
    fn test_days_until_due_rolls_to_next_month() {
        assert_eq!(days_until_due(10, date("2025-03-12")), 29);
        assert_eq!(days_until_due(30, date("2025-01-31")), 28);
    }

    #[test]
    fn test_days_until_due_clamps_to_month_end() {
        assert_eq!(days_until_due(31, date("2025-04-10")), 20);
        assert_eq!(days_until_due(31, date("2025-02-28")), 0);
    }

    #[test]
    fn test_days_until() {
        assert_eq!(days_until(date("2025-03-10"), date("2025-03-12")), -2);
        assert_eq!(days_until(date("2025-03-25"), date("2025-03-12")), 13);
    }

    #[test]
    fn test_add_months_clamps() {
        assert_eq!(add_months(date("2025-01-31"), 1), date("2025-02-28"));
        assert_eq!(add_months(date("2024-02-29"), 12), date("2025-02-28"));
    }
}
