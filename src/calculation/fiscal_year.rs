//! Fiscal year arithmetic and request splitting.
//!
//! Allowance balances are kept per fiscal year, so every request is cut into
//! one segment per fiscal year before its working time is calculated.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    EndAt, LEDGER_YEARS, StartAt, is_ledger_year, validate_fiscal_year_start_month,
};

/// The part of a request that falls into a single fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearSegment {
    /// First moment of the segment.
    pub start: NaiveDateTime,
    /// Last moment of the segment.
    pub end: NaiveDateTime,
    /// Boundary marker for the segment's first day.
    pub start_at: Option<StartAt>,
    /// Boundary marker for the segment's last day.
    pub end_at: Option<EndAt>,
    /// The fiscal year the segment belongs to.
    pub fiscal_year: i32,
}

/// Returns the fiscal year a date belongs to.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::fiscal_year_of;
/// use chrono::NaiveDate;
///
/// // Fiscal year starting in April (month 3)
/// let march = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
/// let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
/// assert_eq!(fiscal_year_of(march, 3), 2024);
/// assert_eq!(fiscal_year_of(april, 3), 2025);
/// ```
pub fn fiscal_year_of(date: NaiveDate, fiscal_year_start_month: u32) -> i32 {
    if date.month0() >= fiscal_year_start_month {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Returns the first and last day of a fiscal year.
///
/// # Errors
///
/// Returns `InvalidWorkspace` if `fiscal_year_start_month` is outside
/// `0..=11`, and `CalculationError` if the fiscal year does not end within
/// the representable date range.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::fiscal_year_window;
/// use chrono::NaiveDate;
///
/// let (first, last) = fiscal_year_window(2024, 6).unwrap();
/// assert_eq!(first, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
/// assert_eq!(last, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
/// ```
pub fn fiscal_year_window(
    fiscal_year: i32,
    fiscal_year_start_month: u32,
) -> EngineResult<(NaiveDate, NaiveDate)> {
    validate_fiscal_year_start_month(fiscal_year_start_month)?;
    let out_of_range = || EngineError::CalculationError {
        message: format!("fiscal year {} is outside the supported date range", fiscal_year),
    };

    let first = first_day(fiscal_year, fiscal_year_start_month).ok_or_else(out_of_range)?;
    let last = fiscal_year
        .checked_add(1)
        .and_then(|next| first_day(next, fiscal_year_start_month))
        .and_then(|next_first| next_first.pred_opt())
        .ok_or_else(out_of_range)?;
    Ok((first, last))
}

fn first_day(year: i32, month0: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("Valid end of day time")
}

/// Splits a request interval into one segment per fiscal year.
///
/// Segments cover `[start, end]` without gaps or overlaps and are ordered
/// chronologically. A segment keeps the caller's `start_at` only if it
/// starts at the request start (otherwise `Morning`), and keeps `end_at`
/// only if it ends at the request end (otherwise `EndOfDay`). Segments
/// after the first begin on the first day of their fiscal year at the
/// request start's time of day.
///
/// # Errors
///
/// Returns `InvalidRequest` if `end` is before `start` or either lies
/// outside [`LEDGER_YEARS`](crate::models::LEDGER_YEARS), and
/// `InvalidWorkspace` if the fiscal start month is outside `0..=11`.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::split_by_fiscal_year;
/// use leave_ledger::models::{EndAt, StartAt};
/// use chrono::NaiveDateTime;
///
/// let start = NaiveDateTime::parse_from_str("2024-12-30 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2025-01-02 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let segments = split_by_fiscal_year(
///     start,
///     end,
///     Some(StartAt::Afternoon),
///     Some(EndAt::Lunchtime),
///     0,
/// )
/// .unwrap();
///
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0].fiscal_year, 2024);
/// assert_eq!(segments[0].start_at, Some(StartAt::Afternoon));
/// assert_eq!(segments[0].end_at, Some(EndAt::EndOfDay));
/// assert_eq!(segments[1].fiscal_year, 2025);
/// assert_eq!(segments[1].start_at, Some(StartAt::Morning));
/// assert_eq!(segments[1].end_at, Some(EndAt::Lunchtime));
/// ```
pub fn split_by_fiscal_year(
    start: NaiveDateTime,
    end: NaiveDateTime,
    start_at: Option<StartAt>,
    end_at: Option<EndAt>,
    fiscal_year_start_month: u32,
) -> EngineResult<Vec<FiscalYearSegment>> {
    validate_fiscal_year_start_month(fiscal_year_start_month)?;
    if end < start {
        return Err(EngineError::InvalidRequest {
            message: format!("end {} is before start {}", end, start),
        });
    }
    if let Some(outside) = [start, end].into_iter().find(|t| !is_ledger_year(t.year())) {
        return Err(EngineError::InvalidRequest {
            message: format!(
                "{} is outside the supported years {}..={}",
                outside,
                LEDGER_YEARS.start(),
                LEDGER_YEARS.end()
            ),
        });
    }

    let time_of_day = start.time();
    let mut segments = Vec::new();
    let mut current_start = start;

    while current_start <= end {
        let fiscal_year = fiscal_year_of(current_start.date(), fiscal_year_start_month);
        let (_, last_day) = fiscal_year_window(fiscal_year, fiscal_year_start_month)?;
        let segment_end = end.min(last_day.and_time(end_of_day()));

        segments.push(FiscalYearSegment {
            start: current_start,
            end: segment_end,
            start_at: if current_start == start {
                start_at
            } else {
                Some(StartAt::Morning)
            },
            end_at: if segment_end == end {
                end_at
            } else {
                Some(EndAt::EndOfDay)
            },
            fiscal_year,
        });

        current_start = match last_day.succ_opt() {
            Some(next) => next.and_time(time_of_day),
            None => break,
        };
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_fiscal_year_of_calendar_year() {
        assert_eq!(fiscal_year_of(make_date("2024-01-01"), 0), 2024);
        assert_eq!(fiscal_year_of(make_date("2024-12-31"), 0), 2024);
    }

    #[test]
    fn test_fiscal_year_of_july_start() {
        assert_eq!(fiscal_year_of(make_date("2024-06-30"), 6), 2023);
        assert_eq!(fiscal_year_of(make_date("2024-07-01"), 6), 2024);
    }

    #[test]
    fn test_fiscal_year_window_handles_leap_february() {
        // Fiscal year starting in March ends on the last day of February
        let (first, last) = fiscal_year_window(2023, 2).unwrap();
        assert_eq!(first, make_date("2023-03-01"));
        assert_eq!(last, make_date("2024-02-29"));
    }

    #[test]
    fn test_single_year_request_is_one_segment() {
        let start = make_datetime("2024-02-01", "00:00:00");
        let end = make_datetime("2024-02-02", "00:00:00");
        let segments =
            split_by_fiscal_year(start, end, Some(StartAt::Morning), Some(EndAt::EndOfDay), 0)
                .unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, start);
        assert_eq!(segments[0].end, end);
        assert_eq!(segments[0].fiscal_year, 2024);
    }

    #[test]
    fn test_segments_are_contiguous_and_preserve_time_of_day() {
        let start = make_datetime("2024-03-30", "09:30:00");
        let end = make_datetime("2024-04-02", "11:00:00");
        let segments = split_by_fiscal_year(start, end, None, None, 3).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].fiscal_year, 2023);
        assert_eq!(segments[0].end, make_datetime("2024-03-31", "23:59:59"));
        assert_eq!(segments[0].start_at, None);
        assert_eq!(segments[0].end_at, Some(EndAt::EndOfDay));

        assert_eq!(segments[1].fiscal_year, 2024);
        assert_eq!(segments[1].start, make_datetime("2024-04-01", "09:30:00"));
        assert_eq!(segments[1].start_at, Some(StartAt::Morning));
        assert_eq!(segments[1].end_at, None);
    }

    #[test]
    fn test_multi_year_request_has_segment_per_year() {
        let start = make_datetime("2023-12-31", "00:00:00");
        let end = make_datetime("2025-01-01", "00:00:00");
        let segments = split_by_fiscal_year(start, end, None, None, 0).unwrap();

        let years: Vec<i32> = segments.iter().map(|s| s.fiscal_year).collect();
        assert_eq!(years, vec![2023, 2024, 2025]);
        assert_eq!(segments[1].start.date(), make_date("2024-01-01"));
        assert_eq!(segments[1].end.date(), make_date("2024-12-31"));
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let start = make_datetime("2024-02-02", "00:00:00");
        let end = make_datetime("2024-02-01", "00:00:00");
        let result = split_by_fiscal_year(start, end, None, None, 0);
        assert!(matches!(result, Err(EngineError::InvalidRequest { .. })));
    }

    #[test]
    fn test_invalid_start_month_is_rejected() {
        let start = make_datetime("2024-02-01", "00:00:00");
        let result = split_by_fiscal_year(start, start, None, None, 12);
        assert!(matches!(result, Err(EngineError::InvalidWorkspace { .. })));
    }

    #[test]
    fn test_window_at_end_of_date_range_is_an_error() {
        // The last representable fiscal year has no following year start
        let result = fiscal_year_window(262142, 0);
        assert!(matches!(result, Err(EngineError::CalculationError { .. })));
        assert!(fiscal_year_window(i32::MAX, 0).is_err());
    }

    #[test]
    fn test_request_outside_supported_years_is_rejected() {
        let far = NaiveDate::from_ymd_opt(262142, 6, 3)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let result = split_by_fiscal_year(far, far, None, None, 6);
        assert!(matches!(result, Err(EngineError::InvalidRequest { .. })));

        let ancient = make_datetime("0001-01-01", "00:00:00");
        let recent = make_datetime("2024-01-01", "00:00:00");
        let result = split_by_fiscal_year(ancient, recent, None, None, 0);
        assert!(matches!(result, Err(EngineError::InvalidRequest { .. })));
    }
}
