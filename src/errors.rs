use chrono::NaiveDate;
use thiserror::Error;

/// Configuration-time problems, raised eagerly before any evaluation
/// work begins. Per-record anomalies never surface here; they are
/// absorbed as skips or defined neutral values inside the evaluator.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },
}

pub fn parse_date(input: &str) -> Result<NaiveDate, UsageError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| UsageError::InvalidDate {
        input: input.to_string(),
    })
}

/// Reject an inverted range before the core ever runs.
pub fn validate_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), UsageError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(UsageError::InvertedDateRange { start, end });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date("01/15/2024").is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(validate_range(Some(start), Some(end)).is_err());
        assert!(validate_range(Some(end), Some(start)).is_ok());
        assert!(validate_range(None, Some(end)).is_ok());
        assert!(validate_range(None, None).is_ok());
    }
}
