//! Date numbers, time tick placement and the extended date format.
//!
//! Date-time coordinates are `f64` day numbers counted from
//! 1970-01-01T00:00:00, without time zone.

use std::fmt::Write;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use varplot_core::coded_enum;

use crate::properties::TickProperties;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Ticks aimed for on a time axis when the interval is chosen automatically.
const PREFERRED_TICK_COUNT: f64 = 8.0;
/// Upper limit on the number of ticks, whatever the configured interval.
const MAX_TICK_COUNT: f64 = 100.0;

fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

pub fn date_to_num(date: NaiveDateTime) -> f64 {
    date.signed_duration_since(epoch()).num_milliseconds() as f64 / MS_PER_DAY
}

/// `None` for non-finite day numbers or ones outside chrono's range.
pub fn num_to_date(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() || days.abs() > 1.0e8 {
        return None;
    }
    epoch().checked_add_signed(Duration::milliseconds((days * MS_PER_DAY).round() as i64))
}

coded_enum! {
    /// Unit in which time ticks are placed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TimeLocation: "tick location" {
        Year = 0,
        Month = 1,
        Day = 2,
        Hour = 3,
        Minute = 4,
    }
}

impl TimeLocation {
    /// Nominal length of one unit in days.
    pub fn unit_days(self) -> f64 {
        match self {
            TimeLocation::Year => 365.0,
            TimeLocation::Month => 30.5,
            TimeLocation::Day => 1.0,
            TimeLocation::Hour => 1.0 / 24.0,
            TimeLocation::Minute => 1.0 / 1440.0,
        }
    }
}

coded_enum! {
    /// Date formats for tick labels. See [`TickFormat::pattern`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TickFormat: "tick format" {
        /// `01-Mar-2000 15:45:17`
        DayMonthNameYearTime = 0,
        /// `01-Mar-2000`
        DayMonthNameYear = 1,
        /// `03/01/00`
        MonthDayYearShort = 2,
        /// `Mar`
        MonthName = 3,
        /// `M`
        MonthLetter = 4,
        /// `03`
        MonthNumber = 5,
        /// `03/01`
        MonthDay = 6,
        /// `01`
        Day = 7,
        /// `Wed`
        WeekdayName = 8,
        /// `W`
        WeekdayLetter = 9,
        /// `2000`
        Year = 10,
        /// `00`
        YearShort = 11,
        /// `Mar00`
        MonthNameYearShort = 12,
        /// `15:45:17`
        Time = 13,
        /// `03:45:17 PM`
        Time12 = 14,
        /// `15:45`
        HourMinute = 15,
        /// `03:45 PM`
        HourMinute12 = 16,
        /// `Q1-01`
        QuarterYearShort = 17,
        /// `Q1`
        Quarter = 18,
        /// `01/03`
        DayMonth = 19,
        /// `01/03/00`
        DayMonthYearShort = 20,
        /// `Mar.01,2000 15:45:17`
        MonthNameDayYearTime = 21,
        /// `Mar.01,2000`
        MonthNameDayYear = 22,
        /// `03/01/2000`
        MonthDayYear = 23,
        /// `01/03/2000`
        DayMonthYear = 24,
        /// `00/03/01`
        YearMonthDayShort = 25,
        /// `2000/03/01`
        YearMonthDay = 26,
        /// `Q1-2000`
        QuarterYear = 27,
        /// `Mar2000`
        MonthNameYear = 28,
    }
}

impl TickFormat {
    /// Pattern for [`CustomDateFormatter`].
    pub fn pattern(self) -> &'static str {
        match self {
            TickFormat::DayMonthNameYearTime => "%d-%b-%Y %H:%M:%S",
            TickFormat::DayMonthNameYear => "%d-%b-%Y",
            TickFormat::MonthDayYearShort => "%m/%d/%y",
            TickFormat::MonthName => "%b",
            TickFormat::MonthLetter => "%n",
            TickFormat::MonthNumber => "%m",
            TickFormat::MonthDay => "%m/%d",
            TickFormat::Day => "%d",
            TickFormat::WeekdayName => "%a",
            TickFormat::WeekdayLetter => "%e",
            TickFormat::Year => "%Y",
            TickFormat::YearShort => "%y",
            TickFormat::MonthNameYearShort => "%b%y",
            TickFormat::Time => "%H:%M:%S",
            TickFormat::Time12 => "%I:%M:%S %p",
            TickFormat::HourMinute => "%H:%M",
            TickFormat::HourMinute12 => "%I:%M %p",
            TickFormat::QuarterYearShort => "%Q-%y",
            TickFormat::Quarter => "%Q",
            TickFormat::DayMonth => "%d/%m",
            TickFormat::DayMonthYearShort => "%d/%m/%y",
            TickFormat::MonthNameDayYearTime => "%b.%d,%Y %H:%M:%S",
            TickFormat::MonthNameDayYear => "%b.%d,%Y",
            TickFormat::MonthDayYear => "%m/%d/%Y",
            TickFormat::DayMonthYear => "%d/%m/%Y",
            TickFormat::YearMonthDayShort => "%y/%m/%d",
            TickFormat::YearMonthDay => "%Y/%m/%d",
            TickFormat::QuarterYear => "%Q-%Y",
            TickFormat::MonthNameYear => "%b%Y",
        }
    }

    pub fn formatter(self) -> CustomDateFormatter {
        CustomDateFormatter::new(self.pattern())
    }
}

/// strftime-style formatter with three extra tokens: `%e` gives the first
/// letter of the weekday name, `%n` the first letter of the month name and
/// `%Q` the calendar quarter (`Q1` to `Q4`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDateFormatter {
    pattern: String,
}

impl CustomDateFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, date: NaiveDateTime) -> String {
        let mut out = String::with_capacity(self.pattern.len() * 2);
        let mut chars = self.pattern.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('e') => out.extend(date.format("%A").to_string().chars().take(1)),
                Some('n') => out.extend(date.format("%b").to_string().chars().take(1)),
                Some('Q') => {
                    let _ = write!(out, "Q{}", (date.month() + 2) / 3);
                }
                Some(spec) => {
                    let token = format!("%{spec}");
                    // chrono reports unknown specifiers as a formatting error
                    if write!(out, "{}", date.format(&token)).is_err() {
                        out.push_str(&token);
                    }
                }
                None => out.push('%'),
            }
        }
        out
    }

    /// Formats a day number; out-of-range numbers give an empty label.
    pub fn format_num(&self, days: f64) -> String {
        num_to_date(days).map(|d| self.format(d)).unwrap_or_default()
    }
}

/// Places ticks every `interval` units of `location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLocator {
    pub location: TimeLocation,
    pub interval: u32,
}

impl TimeLocator {
    const MAX_TICKS: usize = 1000;

    pub fn new(location: TimeLocation, interval: u32) -> Self {
        Self {
            location,
            interval: interval.max(1),
        }
    }

    /// Tick positions (day numbers) within `[min, max]`.
    pub fn ticks(&self, min: f64, max: f64) -> Vec<f64> {
        let (Some(start), Some(end)) = (num_to_date(min.min(max)), num_to_date(min.max(max))) else {
            return Vec::new();
        };
        let step = i64::from(self.interval);
        let mut ticks = Vec::new();
        let mut current = self.first_candidate(start);
        while let Some(date) = current {
            if date > end || ticks.len() >= Self::MAX_TICKS {
                break;
            }
            if date >= start {
                ticks.push(date_to_num(date));
            }
            current = self.advance(date, step);
        }
        ticks
    }

    /// Aligned start at or before `start`.
    fn first_candidate(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let interval = i64::from(self.interval);
        match self.location {
            TimeLocation::Year => {
                let year = i64::from(start.year()).div_euclid(interval) * interval;
                NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)?.and_hms_opt(0, 0, 0)
            }
            TimeLocation::Month => {
                let month0 = i64::from(start.month0()).div_euclid(interval) * interval;
                NaiveDate::from_ymd_opt(start.year(), u32::try_from(month0).ok()? + 1, 1)?
                    .and_hms_opt(0, 0, 0)
            }
            TimeLocation::Day => start.date().and_hms_opt(0, 0, 0),
            TimeLocation::Hour => start.date().and_hms_opt(start.hour(), 0, 0),
            TimeLocation::Minute => start.date().and_hms_opt(start.hour(), start.minute(), 0),
        }
    }

    fn advance(&self, date: NaiveDateTime, step: i64) -> Option<NaiveDateTime> {
        match self.location {
            TimeLocation::Year => {
                let year = i32::try_from(i64::from(date.year()) + step).ok()?;
                date.with_year(year)
            }
            TimeLocation::Month => {
                let months = i64::from(date.year()) * 12 + i64::from(date.month0()) + step;
                let year = i32::try_from(months.div_euclid(12)).ok()?;
                let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
                NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
            }
            TimeLocation::Day => date.checked_add_signed(Duration::days(step)),
            TimeLocation::Hour => date.checked_add_signed(Duration::hours(step)),
            TimeLocation::Minute => date.checked_add_signed(Duration::minutes(step)),
        }
    }
}

/// Effective tick settings for one time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeTicks {
    pub locator: TimeLocator,
    pub format: TickFormat,
    /// Days between two ticks.
    pub span: f64,
}

/// Chooses tick unit, format and interval for an axis covering `dayspan`
/// days. The automatic choice is written to `defaults`, values set in
/// `forced` take precedence.
pub fn time_tick_settings(
    dayspan: f64,
    forced: &TickProperties,
    defaults: &mut TickProperties,
) -> TimeTicks {
    let (location, format) = if dayspan / 365.0 >= 2.0 {
        (TimeLocation::Year, TickFormat::Year)
    } else if dayspan >= 61.0 {
        (TimeLocation::Month, TickFormat::MonthLetter)
    } else if dayspan >= 2.0 {
        (TimeLocation::Day, TickFormat::DayMonth)
    } else if 24.0 * dayspan >= 2.0 {
        (TimeLocation::Hour, TickFormat::HourMinute)
    } else {
        (TimeLocation::Minute, TickFormat::HourMinute)
    };
    defaults.location_time = Some(location);
    defaults.format_time = Some(format);
    let location = forced.location_time.unwrap_or(location);
    let format = forced.format_time.unwrap_or(format);

    let tickcount = dayspan / location.unit_days();
    let interval = (tickcount / PREFERRED_TICK_COUNT).ceil().max(1.0);
    defaults.interval_time = Some(interval as u32);
    let mut interval = f64::from(forced.interval_time.unwrap_or(interval as u32).max(1));

    if tickcount / interval > MAX_TICK_COUNT {
        interval = (tickcount / MAX_TICK_COUNT).ceil();
    }

    let interval = interval as u32;
    TimeTicks {
        locator: TimeLocator::new(location, interval),
        format,
        span: f64::from(interval) * location.unit_days(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn day_numbers() {
        assert_eq!(date_to_num(date(1970, 1, 1, 0, 0)), 0.0);
        assert_eq!(date_to_num(date(1970, 1, 2, 12, 0)), 1.5);
        assert_eq!(num_to_date(1.5), Some(date(1970, 1, 2, 12, 0)));
        assert_eq!(num_to_date(f64::NAN), None);
        let d = date(2000, 3, 1, 15, 45);
        assert_eq!(num_to_date(date_to_num(d)), Some(d));
    }

    #[test]
    fn custom_tokens() {
        // 2000-03-01 was a Wednesday
        let d = NaiveDate::from_ymd_opt(2000, 3, 1)
            .unwrap()
            .and_hms_opt(15, 45, 17)
            .unwrap();
        assert_eq!(TickFormat::WeekdayLetter.formatter().format(d), "W");
        assert_eq!(TickFormat::MonthLetter.formatter().format(d), "M");
        assert_eq!(TickFormat::Quarter.formatter().format(d), "Q1");
        assert_eq!(TickFormat::QuarterYear.formatter().format(d), "Q1-2000");
        assert_eq!(TickFormat::DayMonthNameYearTime.formatter().format(d), "01-Mar-2000 15:45:17");
        assert_eq!(TickFormat::MonthNameDayYear.formatter().format(d), "Mar.01,2000");
        assert_eq!(TickFormat::HourMinute12.formatter().format(d), "03:45 PM");
        assert_eq!(
            CustomDateFormatter::new("%Q").format(date(2000, 12, 31, 0, 0)),
            "Q4"
        );
        assert_eq!(CustomDateFormatter::new("100%").format(d), "100%");
    }

    #[test]
    fn every_format_has_a_pattern() {
        assert_eq!(TickFormat::ALL.len(), 29);
        let d = date(2021, 7, 4, 9, 5);
        for format in TickFormat::ALL {
            assert!(!format.formatter().format(d).is_empty(), "{format:?}");
        }
    }

    #[test]
    fn automatic_tick_units() {
        let cases = [
            (3.0 * 365.0, TimeLocation::Year, TickFormat::Year),
            (90.0, TimeLocation::Month, TickFormat::MonthLetter),
            (10.0, TimeLocation::Day, TickFormat::DayMonth),
            (0.5, TimeLocation::Hour, TickFormat::HourMinute),
            (0.01, TimeLocation::Minute, TickFormat::HourMinute),
        ];
        for (span, location, format) in cases {
            let mut defaults = TickProperties::default();
            let ticks = time_tick_settings(span, &TickProperties::default(), &mut defaults);
            assert_eq!(ticks.locator.location, location, "span {span}");
            assert_eq!(ticks.format, format);
            assert_eq!(defaults.location_time, Some(location));
            assert_eq!(defaults.format_time, Some(format));
        }
    }

    #[test]
    fn interval_aims_for_eight_ticks() {
        let mut defaults = TickProperties::default();
        let ticks = time_tick_settings(40.0, &TickProperties::default(), &mut defaults);
        assert_eq!(ticks.locator.interval, 5);
        assert_eq!(defaults.interval_time, Some(5));
        assert_relative_eq!(ticks.span, 5.0);
    }

    #[test]
    fn forced_interval_is_capped_at_hundred_ticks() {
        let forced = TickProperties {
            location_time: Some(TimeLocation::Minute),
            interval_time: Some(1),
            ..Default::default()
        };
        let mut defaults = TickProperties::default();
        let ticks = time_tick_settings(1.0, &forced, &mut defaults);
        // 1440 minutes in a day
        assert_eq!(ticks.locator.interval, 15);
        assert_eq!(ticks.locator.location, TimeLocation::Minute);
        assert_eq!(defaults.location_time, Some(TimeLocation::Hour));
    }

    #[test]
    fn locator_positions() {
        let start = date_to_num(date(2000, 1, 1, 0, 0));
        let end = date_to_num(date(2000, 1, 3, 12, 0));
        let days = TimeLocator::new(TimeLocation::Day, 1).ticks(start, end);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], start);

        let months = TimeLocator::new(TimeLocation::Month, 2)
            .ticks(date_to_num(date(2000, 2, 10, 0, 0)), date_to_num(date(2000, 9, 1, 0, 0)));
        let labels: Vec<_> = months
            .iter()
            .map(|&m| TickFormat::MonthName.formatter().format_num(m))
            .collect();
        assert_eq!(labels, ["Mar", "May", "Jul", "Sep"]);

        let years = TimeLocator::new(TimeLocation::Year, 5)
            .ticks(date_to_num(date(1999, 6, 1, 0, 0)), date_to_num(date(2012, 1, 1, 0, 0)));
        let labels: Vec<_> = years
            .iter()
            .map(|&y| TickFormat::Year.formatter().format_num(y))
            .collect();
        assert_eq!(labels, ["2000", "2005", "2010"]);
    }
}
