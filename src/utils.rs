use crate::schema::UNKNOWN_LABEL;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Accepted open-date layouts, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDateFormat {
    /// `YYYY-MM-DD`
    YearMonthDay,
    /// `MM/YYYY`, day taken as the 1st
    MonthSlashYear,
    /// `YYYY-MM`, day taken as the 1st
    YearMonth,
    /// `MM-DD-YYYY`
    MonthDayYear,
}

pub const OPEN_DATE_FORMATS: [OpenDateFormat; 4] = [
    OpenDateFormat::YearMonthDay,
    OpenDateFormat::MonthSlashYear,
    OpenDateFormat::YearMonth,
    OpenDateFormat::MonthDayYear,
];

impl OpenDateFormat {
    /// Strict whole-string parse. Years need exactly four digits, months and days one or two.
    pub fn parse(self, input: &str) -> Option<NaiveDate> {
        match self {
            Self::YearMonthDay => {
                let [year, month, day] = split_fields::<3>(input, '-')?;
                build_date(year, month, Some(day))
            }
            Self::MonthSlashYear => {
                let [month, year] = split_fields::<2>(input, '/')?;
                build_date(year, month, None)
            }
            Self::YearMonth => {
                let [year, month] = split_fields::<2>(input, '-')?;
                build_date(year, month, None)
            }
            Self::MonthDayYear => {
                let [month, day, year] = split_fields::<3>(input, '-')?;
                build_date(year, month, Some(day))
            }
        }
    }
}

/// Normalizes a free-text open date.
///
/// Empty strings and the literal `"Unknown"` mean "no date". Otherwise each entry of
/// [`OPEN_DATE_FORMATS`] is tried in order and the first match wins. A string no format
/// accepts also yields `None`; callers leave such records out of date-based figures.
pub fn parse_open_date(input: &str) -> Option<NaiveDate> {
    if input.is_empty() || input == UNKNOWN_LABEL {
        return None;
    }

    OPEN_DATE_FORMATS
        .iter()
        .find_map(|format| format.parse(input))
}

fn split_fields<const N: usize>(input: &str, separator: char) -> Option<[&str; N]> {
    let mut fields = [""; N];
    let mut parts = input.split(separator);
    for field in fields.iter_mut() {
        *field = parts.next()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(fields)
}

fn build_date(year: &str, month: &str, day: Option<&str>) -> Option<NaiveDate> {
    let year = parse_digits(year, 4, 4).filter(|year| *year >= 1)?;
    let month = parse_digits(month, 1, 2)?;
    let day = match day {
        Some(day) => parse_digits(day, 1, 2)?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn parse_digits(field: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if field.len() < min_len || field.len() > max_len {
        return None;
    }
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// Whole days elapsed from midnight of `date` to `now`, floored.
pub fn days_since(date: NaiveDate, now: NaiveDateTime) -> i64 {
    (now - start_of_day(date)).num_seconds().div_euclid(86_400)
}

/// Rounds to one decimal place using the exact binary value, ties to even.
pub fn round_to_tenth(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Percentage of `part` over `whole`, rounded to one decimal place.
pub fn percentage(part: f64, whole: f64) -> f64 {
    round_to_tenth(part / whole * 100.0)
}
