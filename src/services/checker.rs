// src/services/checker.rs

//! Structural check of a rendered calendar document.

use std::io::BufReader;

use ical::{IcalParser, PropertyParser};

use crate::error::{AppError, Result};

const REQUIRED_EVENT_PROPERTIES: [&str; 5] = ["UID", "DTSTAMP", "DTSTART", "DTEND", "SUMMARY"];

/// Verify the document is well formed and return its event count.
pub fn check_calendar(text: &str) -> Result<usize> {
    check_nesting(text)?;

    let mut calendars = IcalParser::new(BufReader::new(text.as_bytes()));
    let calendar = match calendars.next() {
        Some(Ok(calendar)) => calendar,
        Some(Err(e)) => return Err(AppError::malformed(format!("ICS parse error: {e}"))),
        None => return Err(AppError::malformed("document is empty")),
    };
    if calendars.next().is_some() {
        return Err(AppError::malformed("more than one VCALENDAR"));
    }

    for (idx, event) in calendar.events.iter().enumerate() {
        if let Some(missing) = REQUIRED_EVENT_PROPERTIES
            .iter()
            .find(|required| !event.properties.iter().any(|p| p.name == **required))
        {
            return Err(AppError::malformed(format!(
                "event {} is missing {missing}",
                idx + 1
            )));
        }
    }

    Ok(calendar.events.len())
}

/// Every `END` must close the innermost open `BEGIN`, inside a single VCALENDAR.
fn check_nesting(text: &str) -> Result<()> {
    let mut stack: Vec<String> = Vec::new();
    let mut closed = false;

    for (idx, property) in PropertyParser::from_reader(BufReader::new(text.as_bytes())).enumerate()
    {
        let property = property
            .map_err(|e| AppError::malformed(format!("content line {}: {e}", idx + 1)))?;
        if closed {
            return Err(AppError::malformed("content after END:VCALENDAR"));
        }

        let value = property.value.unwrap_or_default().to_uppercase();
        match property.name.to_uppercase().as_str() {
            "BEGIN" => {
                if stack.is_empty() != (value == "VCALENDAR") {
                    return Err(AppError::malformed(format!(
                        "BEGIN:{value} at nesting depth {}",
                        stack.len()
                    )));
                }
                stack.push(value);
            }
            "END" => match stack.pop() {
                Some(open) if open == value => closed = stack.is_empty(),
                Some(open) => {
                    return Err(AppError::malformed(format!(
                        "END:{value} closes BEGIN:{open}"
                    )));
                }
                None => return Err(AppError::malformed(format!("END:{value} without BEGIN"))),
            },
            name if stack.is_empty() => {
                return Err(AppError::malformed(format!("{name} outside VCALENDAR")));
            }
            _ => {}
        }
    }

    match stack.last() {
        Some(open) => Err(AppError::malformed(format!("BEGIN:{open} is never closed"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        PRODID:-//Test//EN\r\n\
        BEGIN:VEVENT\r\n\
        UID:a@x\r\n\
        DTSTAMP:20250301T080000Z\r\n\
        DTSTART:20250312T190000Z\r\n\
        DTEND:20250312T200000Z\r\n\
        SUMMARY:Full Council\r\n \
        Meeting\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    #[test]
    fn test_valid_document() {
        assert_eq!(check_calendar(VALID).unwrap(), 1);
    }

    #[test]
    fn test_folded_required_property_is_found() {
        let text = VALID.replace("UID:a@x\r\n", "UI\r\n D:a@x\r\n");
        assert_eq!(check_calendar(&text).unwrap(), 1);
    }

    #[test]
    fn test_empty_calendar_is_valid() {
        let text = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";
        assert_eq!(check_calendar(text).unwrap(), 0);
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(
            check_calendar(""),
            Err(AppError::MalformedCalendar(_))
        ));
    }

    #[test]
    fn test_missing_required_property() {
        let text = VALID.replace("DTSTAMP:20250301T080000Z\r\n", "");
        let err = check_calendar(&text).unwrap_err();
        assert!(err.to_string().contains("DTSTAMP"));
    }

    #[test]
    fn test_mismatched_nesting() {
        let text = VALID.replace("END:VEVENT", "END:VTODO");
        assert!(matches!(
            check_calendar(&text),
            Err(AppError::MalformedCalendar(_))
        ));
    }

    #[test]
    fn test_unclosed_event() {
        let text = VALID.replace("END:VEVENT\r\n", "");
        assert!(matches!(
            check_calendar(&text),
            Err(AppError::MalformedCalendar(_))
        ));
    }

    #[test]
    fn test_truncated_document() {
        let text = VALID.replace("END:VCALENDAR\r\n", "");
        assert!(check_calendar(&text).is_err());
    }

    #[test]
    fn test_second_calendar_is_rejected() {
        let text = format!("{VALID}{VALID}");
        assert!(matches!(
            check_calendar(&text),
            Err(AppError::MalformedCalendar(_))
        ));
    }

    #[test]
    fn test_line_without_separator() {
        let text = VALID.replace("SUMMARY:Full Council", "SUMMARY Full Council");
        assert!(check_calendar(&text).is_err());
    }
}
