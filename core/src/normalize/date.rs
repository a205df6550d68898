//! Upstream date formats.
//!
//! The portal uses a different textual template depending on which field a
//! date comes from, always as wall-clock time in Turin. The caller names the
//! template; nothing here guesses.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use super::EpochMillis;
use crate::error::ParseError;

/// Zone of every wall-clock time the portal emits.
pub const UPSTREAM_TZ: Tz = chrono_tz::Europe::Rome;

/// One upstream date template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `DD/MM/YYYY`
    DayMonthYear,
    /// `DD/MM/YYYY hh:mm`
    DayMonthYearTime,
    /// `DD/MM/YYYY hh:mm:ss`
    DayMonthYearTimeSeconds,
    /// `YYYY/MM/DD hh:mm:ss`
    YearMonthDayTimeSeconds,
    /// `DD-MM-YYYY`
    DashedDayMonthYear,
}

impl DateFormat {
    pub fn template(self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "DD/MM/YYYY",
            DateFormat::DayMonthYearTime => "DD/MM/YYYY hh:mm",
            DateFormat::DayMonthYearTimeSeconds => "DD/MM/YYYY hh:mm:ss",
            DateFormat::YearMonthDayTimeSeconds => "YYYY/MM/DD hh:mm:ss",
            DateFormat::DashedDayMonthYear => "DD-MM-YYYY",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::DayMonthYearTime => "%d/%m/%Y %H:%M",
            DateFormat::DayMonthYearTimeSeconds => "%d/%m/%Y %H:%M:%S",
            DateFormat::YearMonthDayTimeSeconds => "%Y/%m/%d %H:%M:%S",
            DateFormat::DashedDayMonthYear => "%d-%m-%Y",
        }
    }

    fn has_time(self) -> bool {
        !matches!(self, DateFormat::DayMonthYear | DateFormat::DashedDayMonthYear)
    }
}

/// Parse `text` with `format` and return the instant it denotes.
pub fn parse_date(text: &str, format: DateFormat) -> Result<EpochMillis, ParseError> {
    let text = text.trim();
    let naive = if format.has_time() {
        NaiveDateTime::parse_from_str(text, format.pattern())
    } else {
        NaiveDate::parse_from_str(text, format.pattern()).map(|d| d.and_time(NaiveTime::MIN))
    }
    .map_err(|e| {
        ParseError::new(
            "date",
            format!("{text:?} does not match {}: {e}", format.template()),
        )
    })?;

    UPSTREAM_TZ
        .from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.timestamp_millis())
        .ok_or_else(|| ParseError::new("date", format!("{text:?} does not exist in {UPSTREAM_TZ}")))
}

/// Like `parse_date`, treating an empty string as "no date".
pub fn parse_optional_date(text: Option<&str>, format: DateFormat) -> Result<Option<EpochMillis>, ParseError> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text, format).map(Some),
    }
}

/// Render a day the way request parameters expect it (`DD/MM/YYYY`).
pub fn format_day(day: NaiveDate) -> String {
    day.format(DateFormat::DayMonthYear.pattern()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rome(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> EpochMillis {
        UPSTREAM_TZ
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn day_month_year_is_local_midnight() {
        let ms = parse_date("21/12/2021", DateFormat::DayMonthYear).unwrap();
        assert_eq!(ms, 1_640_041_200_000);
        assert_eq!(ms, rome(2021, 12, 21, 0, 0, 0));
    }

    #[test]
    fn day_month_year_with_time() {
        let ms = parse_date("21/12/2021 12:03", DateFormat::DayMonthYearTime).unwrap();
        assert_eq!(ms, 1_640_084_580_000);
    }

    #[test]
    fn each_template_parses_its_own_shape() {
        let cases = [
            ("05/01/2022", DateFormat::DayMonthYear, rome(2022, 1, 5, 0, 0, 0)),
            ("05-01-2022", DateFormat::DashedDayMonthYear, rome(2022, 1, 5, 0, 0, 0)),
            ("01/07/2022 09:30:15", DateFormat::DayMonthYearTimeSeconds, rome(2022, 7, 1, 9, 30, 15)),
            ("2022/07/01 09:30:15", DateFormat::YearMonthDayTimeSeconds, rome(2022, 7, 1, 9, 30, 15)),
        ];
        for (text, format, expected) in cases {
            assert_eq!(parse_date(text, format).unwrap(), expected, "{text}");
        }
    }

    #[test]
    fn summer_dates_use_daylight_offset() {
        assert_eq!(
            parse_date("2022/07/01 09:30:15", DateFormat::YearMonthDayTimeSeconds).unwrap(),
            1_656_660_615_000
        );
    }

    #[test]
    fn wrong_template_is_rejected() {
        let mismatches = [
            ("2021/12/21 10:00:00", DateFormat::DayMonthYearTime),
            ("21/12/2021", DateFormat::DayMonthYearTime),
            ("21-12-2021", DateFormat::DayMonthYear),
            ("21/12/2021", DateFormat::DashedDayMonthYear),
            ("", DateFormat::DayMonthYear),
            ("32/01/2022", DateFormat::DayMonthYear),
        ];
        for (text, format) in mismatches {
            let err = parse_date(text, format).unwrap_err();
            assert_eq!(err.what, "date", "{text}");
        }
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        // Clocks jump from 02:00 to 03:00 on 2021-03-28.
        assert!(parse_date("28/03/2021 02:30", DateFormat::DayMonthYearTime).is_err());
    }

    #[test]
    fn optional_dates() {
        assert_eq!(parse_optional_date(None, DateFormat::DayMonthYear).unwrap(), None);
        assert_eq!(parse_optional_date(Some(" "), DateFormat::DayMonthYear).unwrap(), None);
        assert_eq!(
            parse_optional_date(Some("21/12/2021"), DateFormat::DayMonthYear).unwrap(),
            Some(1_640_041_200_000)
        );
    }

    #[test]
    fn format_day_pads_fields() {
        let day = NaiveDate::from_ymd_opt(2022, 3, 7).unwrap();
        assert_eq!(format_day(day), "07/03/2022");
    }
}
