//! Time sources and the 12-hour formatting used for reminder display strings

use chrono::{DateTime, Local, NaiveTime, Timelike};
use thiserror::Error;

/// Errors that happen when turning a user-provided time into a display string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("{hour:02}:{minute:02} is not a valid time of day")]
    OutOfRange { hour: u32, minute: u32 },
    #[error("unable to parse {0:?} as a time of day (expected HH:MM or h:MM AM/PM)")]
    Unparsable(String),
}

/// Something that can tell the current local time.
///
/// The reminder scheduler computes its fire delays from this, so that tests can pin "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The device clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that always returns the same instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    instant: DateTime<Local>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Local>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.instant
    }
}

/// Format a point in time as a 12-hour clock string, e.g. `"1:05 PM"`.
pub fn format_12_hour<T: Timelike>(time: &T) -> String {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{}:{:02} {}", hour, time.minute(), suffix)
}

/// Same as [`format_12_hour`], for raw components that may be out of range
pub fn format_hour_minute(hour: u32, minute: u32) -> Result<String, FormatError> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or(FormatError::OutOfRange { hour, minute })?;
    Ok(format_12_hour(&time))
}

/// Parse a time of day, either `HH:MM` (24-hour) or `h:MM AM`/`h:MM PM`
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, FormatError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    let parsed = if upper.ends_with("AM") || upper.ends_with("PM") {
        NaiveTime::parse_from_str(&upper, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(&upper, "%I:%M%p"))
    } else {
        NaiveTime::parse_from_str(trimmed, "%H:%M")
    };

    parsed.map_err(|_| FormatError::Unparsable(input.to_string()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hour_format() {
        assert_eq!(format_hour_minute(0, 0).unwrap(), "12:00 AM");
        assert_eq!(format_hour_minute(13, 5).unwrap(), "1:05 PM");
        assert_eq!(format_hour_minute(23, 59).unwrap(), "11:59 PM");
        assert_eq!(format_hour_minute(12, 0).unwrap(), "12:00 PM");
        assert_eq!(format_hour_minute(9, 30).unwrap(), "9:30 AM");
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        assert_eq!(format_hour_minute(24, 0), Err(FormatError::OutOfRange{ hour: 24, minute: 0 }));
        assert!(format_hour_minute(10, 60).is_err());
    }

    #[test]
    fn parse_both_notations() {
        assert_eq!(parse_time_of_day("15:00").unwrap(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(parse_time_of_day("3:00 PM").unwrap(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(parse_time_of_day("12:15am").unwrap(), NaiveTime::from_hms_opt(0, 15, 0).unwrap());
        assert!(parse_time_of_day("quarter past three").is_err());
        assert!(parse_time_of_day("25:00").is_err());
    }
}
