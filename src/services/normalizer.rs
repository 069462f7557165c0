// src/services/normalizer.rs

//! Date and time normalization.
//!
//! Turns the free-form date and time text published on the listing pages
//! into timezone-aware start and end instants.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::CalendarConfig;

/// Two-digit years further than this behind the reference year roll into the next century.
const YEAR_THRESHOLD: i32 = 50;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[\s,.]+([a-z]{3,9})[\s,.]+(\d{4}|\d{2})\b")
        .unwrap()
});

static CLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(\d{1,2})(?:[:.](\d{2}))?\s*(?:(am|pm|noon)|hrs?)?|(noon|midday))(?:$|[\s,;(])",
    )
    .unwrap()
});

static RANGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:[-–—]|\bto\b|\buntil\b)\s*").unwrap());

/// Converts raw date/time text into localized start/end instants.
#[derive(Debug, Clone)]
pub struct DateTimeNormalizer {
    timezone: Tz,
    default_duration: Duration,
    default_start: NaiveTime,
    reference_year: i32,
}

impl DateTimeNormalizer {
    pub fn new(
        timezone: Tz,
        default_duration: Duration,
        default_start: NaiveTime,
        reference_year: i32,
    ) -> Self {
        Self {
            timezone,
            default_duration,
            default_start,
            reference_year,
        }
    }

    /// Build a normalizer from calendar settings; two-digit years resolve around `reference_year`.
    pub fn from_config(config: &CalendarConfig, reference_year: i32) -> Result<Self> {
        Ok(Self::new(
            config.timezone()?,
            config.default_duration(),
            config.default_start_time()?,
            reference_year,
        ))
    }

    /// Resolve a record's date and time text into `(start, end)`.
    ///
    /// An empty time falls back to the default start time. A start-only time,
    /// an unparseable end, or an end not after the start all fall back to the
    /// default duration.
    pub fn normalize(
        &self,
        date_text: &str,
        time_text: &str,
    ) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
        let date = self.parse_date(date_text)?;

        let (start_time, end_time) = if time_text.trim().is_empty() {
            (self.default_start, None)
        } else {
            parse_time_range(time_text).ok_or_else(|| {
                AppError::parse(date_text, format!("unrecognised time '{time_text}'"))
            })?
        };

        let start = self.localize(date.and_time(start_time))?;
        let default_end = start + self.default_duration;

        let end = match end_time {
            Some(end_time) => match self.localize(date.and_time(end_time)) {
                Ok(end) if end > start => end,
                Ok(_) => {
                    log::debug!(
                        "End time in '{time_text}' is not after start, using default duration"
                    );
                    default_end
                }
                Err(_) => default_end,
            },
            None => default_end,
        };

        Ok((start, end))
    }

    /// Parse a published date such as `12 March 2025`, `Wed 12th Mar 2025` or `8 Jan 25`.
    pub fn parse_date(&self, text: &str) -> Result<NaiveDate> {
        let caps = DATE_PATTERN
            .captures(text)
            .ok_or_else(|| AppError::parse(text, "unrecognised date"))?;

        let day: u32 = caps[1]
            .parse()
            .map_err(|e| AppError::parse(text, format!("bad day: {e}")))?;
        let month = month_number(&caps[2])
            .ok_or_else(|| AppError::parse(text, format!("unknown month '{}'", &caps[2])))?;
        let year = match &caps[3] {
            digits if digits.len() == 2 => {
                let two_digit: i32 = digits
                    .parse()
                    .map_err(|e| AppError::parse(text, format!("bad year: {e}")))?;
                expand_year(two_digit, self.reference_year)
            }
            digits => digits
                .parse()
                .map_err(|e| AppError::parse(text, format!("bad year: {e}")))?,
        };

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            AppError::parse(text, format!("no such date {year}-{month:02}-{day:02}"))
        })
    }

    /// Attach the configured timezone to a wall-clock time.
    fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest),
            // Skipped by a spring-forward transition; the wall clock reads an hour later.
            LocalResult::None => self
                .timezone
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .ok_or_else(|| AppError::parse(naive.to_string(), "time does not exist locally")),
        }
    }
}

/// Expand a two-digit year to the century closest to `reference_year`.
pub fn expand_year(two_digit: i32, reference_year: i32) -> i32 {
    let century = reference_year.div_euclid(100) * 100;
    let current = reference_year.rem_euclid(100);
    if two_digit < current - YEAR_THRESHOLD {
        century + 100 + two_digit
    } else {
        century + two_digit
    }
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };

    // Reject words that merely start like a month ("marathon").
    let full = NaiveDate::from_ymd_opt(2000, month, 1)?
        .format("%B")
        .to_string()
        .to_lowercase();
    full.starts_with(&lower).then_some(month)
}

/// Split time text into a start and an optional end.
///
/// Returns `None` when the start cannot be read. An unreadable end is
/// dropped, leaving the caller to apply the default duration.
pub fn parse_time_range(text: &str) -> Option<(NaiveTime, Option<NaiveTime>)> {
    let text = text.trim().trim_end_matches('.');
    let mut parts = RANGE_SEPARATOR.splitn(text, 2);
    let start_text = parts.next()?;
    let end_text = parts.next();

    let end = end_text.and_then(|t| parse_clock(t, None));
    // "7 - 9pm": the start borrows the end's meridiem.
    let end_meridiem = end_text.and_then(clock_meridiem);
    let mut start = parse_clock(start_text, end_meridiem.as_deref())?;

    // "11 - 1pm": a borrowed meridiem must not push the start past the end.
    if end.is_some_and(|end| start > end)
        && end_meridiem.is_some()
        && clock_meridiem(start_text).is_none()
    {
        start = parse_clock(start_text, Some("am"))?;
    }

    Some((start, end))
}

/// The am/pm suffix of a clock time, if it has one.
fn clock_meridiem(text: &str) -> Option<String> {
    let caps = CLOCK_PATTERN.captures(text.trim())?;
    caps.get(3)
        .map(|m| m.as_str().to_lowercase())
        .filter(|m| m != "noon")
}

/// Parse one clock time: `19:00`, `19.00`, `7pm`, `7:30 pm`, `noon`.
fn parse_clock(text: &str, default_meridiem: Option<&str>) -> Option<NaiveTime> {
    let text = text.trim();
    let caps = CLOCK_PATTERN.captures(text)?;

    if caps.get(4).is_some() {
        return NaiveTime::from_hms_opt(12, 0, 0);
    }

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let suffix = caps.get(3).map(|m| m.as_str().to_lowercase());

    let hour = match (suffix.as_deref(), default_meridiem) {
        (Some("noon"), _) if hour == 12 => 12,
        (Some("noon"), _) => return None,
        (Some(meridiem), _) => to_24_hour(hour, meridiem)?,
        (None, Some(meridiem)) if (1..=12).contains(&hour) => to_24_hour(hour, meridiem)?,
        // A bare hour like "19" is too ambiguous to trust.
        (None, _) if caps.get(2).is_none() => return None,
        (None, _) => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn to_24_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    match meridiem {
        "am" => Some(hour % 12),
        _ => Some(hour % 12 + 12),
    }
}

/// Year to use for two-digit year expansion, taken from the generation time in the source timezone.
pub fn reference_year(now: DateTime<chrono::Utc>, timezone: Tz) -> i32 {
    now.with_timezone(&timezone).year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Europe::London;

    fn normalizer() -> DateTimeNormalizer {
        DateTimeNormalizer::new(
            London,
            Duration::hours(1),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            2025,
        )
    }

    fn hm(dt: &DateTime<Tz>) -> (u32, u32) {
        (dt.hour(), dt.minute())
    }

    #[test]
    fn test_single_time_uses_default_duration() {
        let (start, end) = normalizer().normalize("12 March 2025", "19:00").unwrap();
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        assert_eq!(hm(&start), (19, 0));
        assert_eq!(hm(&end), (20, 0));
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_range_is_parsed_exactly() {
        let (start, end) = normalizer().normalize("12 March 2025", "18:30-20:00").unwrap();
        assert_eq!(hm(&start), (18, 30));
        assert_eq!(hm(&end), (20, 0));
    }

    #[test]
    fn test_range_separators() {
        let n = normalizer();
        for time in ["19:00 to 21:00", "19:00 – 21:00", "19.00—21.00", "7pm - 9pm", "7 - 9pm"] {
            let (start, end) = n.normalize("1 May 2025", time).unwrap();
            assert_eq!(hm(&start), (19, 0), "start of {time}");
            assert_eq!(hm(&end), (21, 0), "end of {time}");
        }
    }

    #[test]
    fn test_borrowed_meridiem_keeps_start_before_end() {
        let n = normalizer();
        let (start, end) = n.normalize("12 March 2025", "10:30 - 12:30pm").unwrap();
        assert_eq!((hm(&start), hm(&end)), ((10, 30), (12, 30)));

        let (start, end) = n.normalize("12 March 2025", "11 - 1pm").unwrap();
        assert_eq!((hm(&start), hm(&end)), ((11, 0), (13, 0)));

        let (start, end) = n.normalize("12 March 2025", "12 - 2pm").unwrap();
        assert_eq!((hm(&start), hm(&end)), ((12, 0), (14, 0)));
    }

    #[test]
    fn test_inverted_range_falls_back_to_default_duration() {
        let (start, end) = normalizer().normalize("12 March 2025", "20:00-18:00").unwrap();
        assert_eq!(hm(&start), (20, 0));
        assert_eq!(end - start, Duration::hours(1));

        let (start, end) = normalizer().normalize("12 March 2025", "19:00-19:00").unwrap();
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_unreadable_end_falls_back_to_default_duration() {
        let (start, end) = normalizer().normalize("12 March 2025", "19:00 to late").unwrap();
        assert_eq!(hm(&start), (19, 0));
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_missing_time_uses_default_start() {
        let (start, end) = normalizer().normalize("12 March 2025", "  ").unwrap();
        assert_eq!(hm(&start), (9, 0));
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn test_unparseable_time_is_error() {
        assert!(normalizer().normalize("12 March 2025", "TBC").is_err());
        assert!(normalizer().normalize("12 March 2025", "19").is_err());
    }

    #[test]
    fn test_malformed_date_is_error_even_with_valid_time() {
        assert!(normalizer().normalize("TBC", "19:00").is_err());
        assert!(normalizer().normalize("31 February 2025", "19:00").is_err());
        assert!(normalizer().normalize("12 Marathon 2025", "19:00").is_err());
    }

    #[test]
    fn test_date_formats() {
        let n = normalizer();
        let expected = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        for text in [
            "12 March 2025",
            "12 Mar 2025",
            "12 Mar 25",
            "Wednesday 12th March 2025",
            "Wed, 12 March, 2025",
            "12 mar. 2025",
        ] {
            assert_eq!(n.parse_date(text).unwrap(), expected, "{text}");
        }
        assert_eq!(
            n.parse_date("3 Sept 2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 3).unwrap()
        );
    }

    #[test]
    fn test_two_digit_year_rollover() {
        assert_eq!(expand_year(25, 2025), 2025);
        assert_eq!(expand_year(74, 2025), 2074);
        assert_eq!(expand_year(75, 2025), 2075);
        assert_eq!(expand_year(1, 2099), 2101);
        assert_eq!(expand_year(98, 2099), 2098);
    }

    #[test]
    fn test_times_are_localized_across_dst() {
        let n = normalizer();
        let (winter, _) = n.normalize("12 March 2025", "19:00").unwrap();
        let (summer, _) = n.normalize("12 July 2025", "19:00").unwrap();
        assert_eq!(winter.with_timezone(&chrono::Utc).hour(), 19);
        assert_eq!(summer.with_timezone(&chrono::Utc).hour(), 18);
    }

    #[test]
    fn test_spring_forward_gap_moves_forward() {
        // 30 March 2025 01:30 does not exist in London.
        let (start, _) = normalizer().normalize("30 March 2025", "01:30").unwrap();
        assert_eq!(hm(&start), (2, 30));
    }

    #[test]
    fn test_ambiguous_time_takes_earliest() {
        // 26 October 2025 01:30 occurs twice in London; the BST one comes first.
        let (start, _) = normalizer().normalize("26 October 2025", "01:30").unwrap();
        assert_eq!(start.with_timezone(&chrono::Utc).hour(), 0);
    }

    #[test]
    fn test_clock_formats() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(parse_time_range("7.30pm"), Some((t(19, 30), None)));
        assert_eq!(parse_time_range("7:30 PM."), Some((t(19, 30), None)));
        assert_eq!(parse_time_range("12noon"), Some((t(12, 0), None)));
        assert_eq!(parse_time_range("noon"), Some((t(12, 0), None)));
        assert_eq!(parse_time_range("12am"), Some((t(0, 0), None)));
        assert_eq!(parse_time_range("13pm"), None);
    }

    #[test]
    fn test_reference_year_uses_source_timezone() {
        let now = chrono::Utc.with_ymd_and_hms(2025, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(reference_year(now, London), 2025);
        assert_eq!(reference_year(now, chrono_tz::Asia::Tokyo), 2026);
    }
}
