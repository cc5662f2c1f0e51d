use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Day of month that anchors the first half of a semimonthly cycle.
const SEMIMONTHLY_MID_DAY: u32 = 15;

/// Recurrence rule for installment due dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentCadence {
    /// Every 7 days
    Weekly,
    /// Every 14 days
    Biweekly,
    /// Twice a month: on the 15th and on the last day of the month
    Semimonthly,
    /// Same day each calendar month
    #[default]
    Monthly,
}

impl InstallmentCadence {
    /// The date `steps` cadence periods after `start`.
    ///
    /// Monthly steps are measured from `start` rather than chained, so a plan
    /// starting on the 30th returns to the 30th after February. A monthly plan
    /// that starts on the last day of a month stays on month ends.
    pub fn advance(self, start: NaiveDate, steps: u32) -> NaiveDate {
        match self {
            InstallmentCadence::Weekly => add_days(start, 7 * u64::from(steps)),
            InstallmentCadence::Biweekly => add_days(start, 14 * u64::from(steps)),
            InstallmentCadence::Semimonthly => {
                (0..steps).fold(start, |date, _| next_semimonthly(date))
            }
            InstallmentCadence::Monthly => {
                let moved = add_months(start, steps);
                if is_last_day_of_month(start) {
                    last_day_of_month(moved)
                } else {
                    moved
                }
            }
        }
    }

    /// Successive due dates from `start`, one per cadence step.
    ///
    /// Semimonthly dates chain from the previous entry so each step costs the
    /// same however long the schedule runs.
    pub fn dates(self, start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        let mut step = 0u32;
        let mut previous = start;
        std::iter::from_fn(move || {
            let date = match self {
                InstallmentCadence::Semimonthly if step > 0 => next_semimonthly(previous),
                InstallmentCadence::Semimonthly => start,
                _ => self.advance(start, step),
            };
            step = step.saturating_add(1);
            previous = date;
            Some(date)
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            InstallmentCadence::Weekly => "weekly",
            InstallmentCadence::Biweekly => "biweekly",
            InstallmentCadence::Semimonthly => "semimonthly",
            InstallmentCadence::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for InstallmentCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for InstallmentCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "weekly" => Ok(InstallmentCadence::Weekly),
            "biweekly" => Ok(InstallmentCadence::Biweekly),
            "semimonthly" => Ok(InstallmentCadence::Semimonthly),
            "monthly" => Ok(InstallmentCadence::Monthly),
            other => Err(format!("unknown installment cadence '{other}'")),
        }
    }
}

/// On or before the 15th moves to the month's last day; after it, to the 15th of next month.
fn next_semimonthly(date: NaiveDate) -> NaiveDate {
    if date.day() <= SEMIMONTHLY_MID_DAY {
        last_day_of_month(date)
    } else {
        let next = add_months(date.with_day(1).unwrap_or(date), 1);
        next.with_day(SEMIMONTHLY_MID_DAY).unwrap_or(next)
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Add a number of months to a date, clamping the day to the month's max.
/// Saturates at `NaiveDate::MAX` past the end of the calendar.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total_months = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let Ok(new_year) = i32::try_from(total_months.div_euclid(12)) else {
        return NaiveDate::MAX;
    };
    let new_month = total_months.rem_euclid(12) as u32 + 1;
    let max_day = days_in_month(new_year, new_month);
    let day = date.day().min(max_day);
    NaiveDate::from_ymd_opt(new_year, new_month, day).unwrap_or(NaiveDate::MAX)
}

/// The last calendar day of `date`'s month.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let max_day = days_in_month(date.year(), date.month());
    date.with_day(max_day).unwrap_or(date)
}

pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

/// Number of days in a given month/year.
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekly_and_biweekly() {
        let start = d(2024, 12, 28);
        assert_eq!(InstallmentCadence::Weekly.advance(start, 1), d(2025, 1, 4));
        assert_eq!(InstallmentCadence::Biweekly.advance(start, 2), d(2025, 1, 25));
        assert_eq!(InstallmentCadence::Weekly.advance(start, 0), start);
    }

    #[test]
    fn test_monthly_clamps_without_drift() {
        let start = d(2025, 1, 30);
        assert_eq!(InstallmentCadence::Monthly.advance(start, 1), d(2025, 2, 28));
        // Measured from the start date, so March returns to the 30th
        assert_eq!(InstallmentCadence::Monthly.advance(start, 2), d(2025, 3, 30));
        assert_eq!(InstallmentCadence::Monthly.advance(start, 12), d(2026, 1, 30));
    }

    #[test]
    fn test_monthly_end_of_month_sticks() {
        let start = d(2024, 1, 31);
        assert_eq!(InstallmentCadence::Monthly.advance(start, 1), d(2024, 2, 29));
        assert_eq!(InstallmentCadence::Monthly.advance(start, 2), d(2024, 3, 31));
        assert_eq!(InstallmentCadence::Monthly.advance(start, 3), d(2024, 4, 30));

        // Feb 28 in a non-leap year is a month end too
        let feb = d(2025, 2, 28);
        assert_eq!(InstallmentCadence::Monthly.advance(feb, 1), d(2025, 3, 31));
    }

    #[test]
    fn test_semimonthly_alternates_mid_and_end() {
        let start = d(2025, 1, 3);
        let c = InstallmentCadence::Semimonthly;
        assert_eq!(c.advance(start, 1), d(2025, 1, 31));
        assert_eq!(c.advance(start, 2), d(2025, 2, 15));
        assert_eq!(c.advance(start, 3), d(2025, 2, 28));
        assert_eq!(c.advance(start, 4), d(2025, 3, 15));

        // The 15th itself moves to the month end
        assert_eq!(c.advance(d(2025, 4, 15), 1), d(2025, 4, 30));
        // December rolls into the next year
        assert_eq!(c.advance(d(2025, 12, 20), 1), d(2026, 1, 15));
    }

    #[test]
    fn test_dates_match_advance() {
        let start = d(2025, 1, 31);
        for cadence in [
            InstallmentCadence::Weekly,
            InstallmentCadence::Biweekly,
            InstallmentCadence::Semimonthly,
            InstallmentCadence::Monthly,
        ] {
            let chained: Vec<NaiveDate> = cadence.dates(start).take(30).collect();
            let stepped: Vec<NaiveDate> = (0..30).map(|k| cadence.advance(start, k)).collect();
            assert_eq!(chained, stepped, "{cadence}");
        }
    }

    #[test]
    fn test_add_months_saturates_at_calendar_end() {
        assert_eq!(add_months(d(2025, 1, 31), u32::MAX), NaiveDate::MAX);
        assert_eq!(InstallmentCadence::Monthly.advance(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn test_cadence_from_str() {
        assert_eq!("bi-weekly".parse::<InstallmentCadence>(), Ok(InstallmentCadence::Biweekly));
        assert_eq!("Semi_Monthly".parse::<InstallmentCadence>(), Ok(InstallmentCadence::Semimonthly));
        assert!("yearly".parse::<InstallmentCadence>().is_err());
    }

    #[test]
    fn test_last_day_helpers() {
        assert!(is_last_day_of_month(d(2024, 2, 29)));
        assert!(!is_last_day_of_month(d(2024, 2, 28)));
        assert_eq!(last_day_of_month(d(2100, 2, 3)), d(2100, 2, 28));
    }
}
